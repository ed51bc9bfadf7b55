#![allow(missing_docs)]

use std::{error::Error, fmt};

use mscript_data_type::{DimensionError, ParameterType};
use mscript_object::ObjectError;
use mscript_wrapper::WrapperError;

#[derive(Debug, Clone)]
pub enum MathError {
    Context {
        context: String,
        error: Box<MathError>,
    },
    ParseError(String),
    MissingStartQuote,
    NotConstructed(String),
    MissingWrapper(String),
    TypeMismatch {
        return_type: ParameterType,
        lhs_type: ParameterType,
    },
    InvalidOperand {
        operation: String,
        data_type: ParameterType,
    },
    ArgumentCount {
        function: &'static str,
        expected: usize,
        actual: usize,
    },
    UnsupportedLeaf {
        name: String,
        data_type: ParameterType,
    },
    DimensionError(DimensionError),
    WrapperError(WrapperError),
    ObjectError(ObjectError),
}

impl MathError {
    /// Return true for errors that mean validation let through an incomplete equation.
    pub fn is_fatal(&self) -> bool {
        match self {
            MathError::Context { error, .. } => error.is_fatal(),
            MathError::NotConstructed(_) | MathError::MissingWrapper(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathError::Context { context, error } => write!(f, "{}:\n  {}", context, error),
            MathError::ParseError(message) => write!(f, "syntax error: {}", message),
            MathError::MissingStartQuote => write!(
                f,
                "Found missing start quote on the right-hand side of an Assignment command or \
                 equation"
            ),
            MathError::NotConstructed(text) => {
                write!(f, "The equation \"{}\" has not yet been constructed", text)
            }
            MathError::MissingWrapper(name) => write!(
                f,
                "The math element \"{}\" has no wrapper; the equation was not validated",
                name
            ),
            MathError::TypeMismatch {
                return_type,
                lhs_type,
            } => write!(
                f,
                "Cannot set type \"{}\" to type \"{}\"",
                return_type, lhs_type
            ),
            MathError::InvalidOperand {
                operation,
                data_type,
            } => write!(
                f,
                "The operation \"{}\" is not defined for an input of type {}",
                operation, data_type
            ),
            MathError::ArgumentCount {
                function,
                expected,
                actual,
            } => write!(
                f,
                "The function \"{}\" expects {} input(s), but {} were given",
                function, expected, actual
            ),
            MathError::UnsupportedLeaf { name, data_type } => write!(
                f,
                "\"{}\" of type {} cannot be used in a math equation",
                name, data_type
            ),
            MathError::DimensionError(error) => write!(f, "{}", error),
            MathError::WrapperError(error) => write!(f, "{}", error),
            MathError::ObjectError(error) => write!(f, "{}", error),
        }
    }
}

impl Error for MathError {}

impl From<DimensionError> for MathError {
    fn from(v: DimensionError) -> Self {
        Self::DimensionError(v)
    }
}

impl From<WrapperError> for MathError {
    fn from(v: WrapperError) -> Self {
        Self::WrapperError(v)
    }
}

impl From<ObjectError> for MathError {
    fn from(v: ObjectError) -> Self {
        Self::ObjectError(v)
    }
}
