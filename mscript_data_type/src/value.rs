//! Dynamically typed value read from or written to script objects.

use std::fmt;

use crate::{error::ValueTypeError, ParameterType, Rmatrix};

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Represents the lack of a value, e.g. an unset property.
    None,
    /// An integer value.
    Integer(i64),
    /// A real value.
    Real(f64),
    /// A text value.
    String(String),
    /// A list of text values.
    StringArray(Vec<String>),
    /// A boolean value.
    Boolean(bool),
    /// An on/off flag, `true` meaning `On`.
    OnOff(bool),
    /// A vector or matrix of reals.
    Matrix(Rmatrix),
    /// A reference to a configured object, stored by name.
    Object(String),
}

impl Value {
    /// The data type that best describes this value.
    pub fn data_type(&self) -> ParameterType {
        match self {
            Value::None => ParameterType::Unknown,
            Value::Integer(_) => ParameterType::Integer,
            Value::Real(_) => ParameterType::Real,
            Value::String(_) => ParameterType::String,
            Value::StringArray(_) => ParameterType::StringArray,
            Value::Boolean(_) => ParameterType::Boolean,
            Value::OnOff(_) => ParameterType::OnOff,
            Value::Matrix(_) => ParameterType::Matrix,
            Value::Object(_) => ParameterType::Object,
        }
    }

    /// Return true if the value is `Value::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Convert the value to a real, panicking if it is not numeric.
    #[track_caller]
    pub fn as_real(&self) -> f64 {
        match self.try_as_real() {
            Ok(r) => r,
            Err(error) => panic!("{}", error),
        }
    }

    /// Convert the value to a real, accepting integers and 1x1 matrices.
    pub fn try_as_real(&self) -> Result<f64, ValueTypeError> {
        match self {
            Value::Real(r) => Ok(*r),
            Value::Integer(n) => Ok(*n as f64),
            Value::Matrix(m) if m.is_scalar() => Ok(m.data()[0]),
            _ => Err(self.type_error("Real")),
        }
    }

    /// Convert the value to an integer, allowing reals that are integers.
    pub fn try_as_integer(&self) -> Result<i64, ValueTypeError> {
        match self {
            Value::Integer(n) => Ok(*n),
            Value::Real(r) if r.fract() == 0.0 && r.abs() < i64::MAX as f64 => Ok(*r as i64),
            _ => Err(self.type_error("Integer")),
        }
    }

    /// Convert the value to a string slice, panicking if it is not text.
    #[track_caller]
    pub fn as_str(&self) -> &str {
        match self.try_as_str() {
            Ok(s) => s,
            Err(error) => panic!("{}", error),
        }
    }

    /// Borrow the text of a string or object-name value.
    pub fn try_as_str(&self) -> Result<&str, ValueTypeError> {
        match self {
            Value::String(s) | Value::Object(s) => Ok(s),
            _ => Err(self.type_error("String")),
        }
    }

    /// Convert the value to a boolean.
    pub fn try_as_boolean(&self) -> Result<bool, ValueTypeError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(self.type_error("Boolean")),
        }
    }

    /// Convert the value to an on/off flag, accepting the text `On` or `Off`.
    pub fn try_as_on_off(&self) -> Result<bool, ValueTypeError> {
        match self {
            Value::OnOff(b) => Ok(*b),
            Value::String(s) if s.eq_ignore_ascii_case("on") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("off") => Ok(false),
            _ => Err(self.type_error("OnOff")),
        }
    }

    /// Borrow the value as a matrix.
    pub fn try_as_matrix(&self) -> Result<&Rmatrix, ValueTypeError> {
        match self {
            Value::Matrix(m) => Ok(m),
            _ => Err(self.type_error("Matrix")),
        }
    }

    /// Borrow the value as a list of strings.
    pub fn try_as_string_array(&self) -> Result<&[String], ValueTypeError> {
        match self {
            Value::StringArray(v) => Ok(v),
            _ => Err(self.type_error("StringArray")),
        }
    }

    fn type_error(&self, expected: &'static str) -> ValueTypeError {
        ValueTypeError {
            expected: expected.into(),
            actual: self.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(r) => write!(f, "{}", r),
            Value::String(s) => write!(f, "{}", s),
            Value::StringArray(items) => write!(f, "{{{}}}", items.join(", ")),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::OnOff(true) => write!(f, "On"),
            Value::OnOff(false) => write!(f, "Off"),
            Value::Matrix(m) => write!(f, "{}", m),
            Value::Object(name) => write!(f, "{}", name),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Rmatrix> for Value {
    fn from(v: Rmatrix) -> Self {
        Self::Matrix(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_conversions() {
        assert_eq!(Value::Integer(3).as_real(), 3.0);
        assert_eq!(Value::Real(4.0).try_as_integer().unwrap(), 4);
        assert!(Value::Real(4.5).try_as_integer().is_err());
        assert_eq!(Value::Matrix(Rmatrix::scalar(2.5)).as_real(), 2.5);
        assert!(Value::Matrix(Rmatrix::new(2, 1)).try_as_real().is_err());
        assert!(Value::from("off").try_as_on_off().is_ok_and(|on| !on));
    }

    #[test]
    fn test_type_error_message() {
        let error = Value::from("abc").try_as_real().unwrap_err();
        assert_eq!(
            error.to_string(),
            "expected value of type Real, found abc (String)"
        );
    }
}
