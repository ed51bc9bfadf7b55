//! The data types that script values, object properties and Parameters can have.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The data type of a value, property, Parameter, or wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    /// A signed integer.
    Integer,
    /// An unsigned integer.
    UnsignedInt,
    /// A real number.
    Real,
    /// A text value.
    String,
    /// A list of text values, e.g. `{a, b, c}`.
    StringArray,
    /// `true` or `false`.
    Boolean,
    /// `On` or `Off`.
    OnOff,
    /// A reference to a configured object by name.
    Object,
    /// A list of object references.
    ObjectArray,
    /// A row or column vector of reals.
    Rvector,
    /// A two dimensional matrix of reals.
    Matrix,
    /// A text value restricted to a fixed set of choices.
    Enumeration,
    /// A file path.
    Filename,
    /// The type is not known, e.g. for an unbound wrapper.
    Unknown,
}

impl ParameterType {
    /// The name used for this type in scripts and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ParameterType::Integer => "Integer",
            ParameterType::UnsignedInt => "UnsignedInt",
            ParameterType::Real => "Real",
            ParameterType::String => "String",
            ParameterType::StringArray => "StringArray",
            ParameterType::Boolean => "Boolean",
            ParameterType::OnOff => "OnOff",
            ParameterType::Object => "Object",
            ParameterType::ObjectArray => "ObjectArray",
            ParameterType::Rvector => "Rvector",
            ParameterType::Matrix => "Matrix",
            ParameterType::Enumeration => "Enumeration",
            ParameterType::Filename => "Filename",
            ParameterType::Unknown => "Unknown",
        }
    }

    /// Return true for types that can be read as a real number.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ParameterType::Integer | ParameterType::UnsignedInt | ParameterType::Real
        )
    }

    /// Return true for types that can be read as text.
    ///
    /// Object references are included since they are stored by name.
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            ParameterType::String
                | ParameterType::Enumeration
                | ParameterType::OnOff
                | ParameterType::Filename
                | ParameterType::Object
        )
    }

    /// Return true for vector and matrix types.
    pub fn is_matrix(self) -> bool {
        matches!(self, ParameterType::Rvector | ParameterType::Matrix)
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_classes() {
        assert!(ParameterType::Integer.is_numeric());
        assert!(!ParameterType::String.is_numeric());
        assert!(ParameterType::Filename.is_string_like());
        assert!(!ParameterType::Real.is_string_like());
        assert_eq!(ParameterType::Matrix.to_string(), "Matrix");
    }
}
