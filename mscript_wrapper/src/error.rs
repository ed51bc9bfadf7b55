#![allow(missing_docs)]

use std::{error::Error, fmt};

use mscript_data_type::ValueTypeError;
use mscript_object::{ObjectError, ObjectType};

use crate::WrapperType;

/// A failure to turn a description into a bound wrapper.
#[derive(Debug, Clone)]
pub enum ClassifyError {
    Context {
        context: String,
        error: Box<ClassifyError>,
    },
    ParseError(String),
    ArrayNotFound(String),
    NotAnArray(String),
    BodyNotFound(String),
    UndefinedObject(String),
    NoValidField {
        description: String,
    },
    OwnedFieldNotFound {
        description: String,
        owner: String,
        owner_type: ObjectType,
    },
    Parameter {
        description: String,
        error: ObjectError,
    },
    ObjectError(ObjectError),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Context { context, error } => write!(f, "{}:\n  {}", context, error),
            ClassifyError::ParseError(message) => write!(f, "syntax error: {}", message),
            ClassifyError::ArrayNotFound(name) => {
                write!(f, "The Array \"{}\" does not exist", name)
            }
            ClassifyError::NotAnArray(name) => write!(f, "\"{}\" is not an Array", name),
            ClassifyError::BodyNotFound(name) => {
                write!(f, "The body named \"{}\" not found in the SolarSystem", name)
            }
            ClassifyError::UndefinedObject(name) => write!(f, "Nonexistent object \"{}\"", name),
            ClassifyError::NoValidField { description } => write!(
                f,
                "\"{}\" does not have a valid field of object or owned object",
                description
            ),
            ClassifyError::OwnedFieldNotFound {
                description,
                owner,
                owner_type,
            } => write!(
                f,
                "\"{}\" is not a field of the {} \"{}\" or of any object it owns",
                description, owner_type, owner
            ),
            ClassifyError::Parameter { description, error } => {
                write!(f, "Cannot create the Parameter \"{}\": {}", description, error)
            }
            ClassifyError::ObjectError(error) => write!(f, "{}", error),
        }
    }
}

impl Error for ClassifyError {}

impl From<ObjectError> for ClassifyError {
    fn from(v: ObjectError) -> Self {
        Self::ObjectError(v)
    }
}

/// A failure to evaluate or set a value through a wrapper.
#[derive(Debug, Clone)]
pub enum WrapperError {
    Context {
        context: String,
        error: Box<WrapperError>,
    },
    NotBound(String),
    InvalidOperation {
        operation: &'static str,
        description: String,
        wrapper_type: WrapperType,
    },
    InvalidIndex {
        description: String,
        value: f64,
    },
    ObjectTypeMismatch {
        description: String,
        expected: String,
        actual: String,
    },
    ObjectError(ObjectError),
    ValueTypeError(ValueTypeError),
}

impl fmt::Display for WrapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrapperError::Context { context, error } => write!(f, "{}:\n  {}", context, error),
            WrapperError::NotBound(description) => write!(
                f,
                "The wrapper for \"{}\" has not been bound to an object",
                description
            ),
            WrapperError::InvalidOperation {
                operation,
                description,
                wrapper_type,
            } => write!(
                f,
                "{} is not valid for the {} wrapper \"{}\"",
                operation, wrapper_type, description
            ),
            WrapperError::InvalidIndex { description, value } => write!(
                f,
                "The array index {} in \"{}\" is not a positive integer",
                value, description
            ),
            WrapperError::ObjectTypeMismatch {
                description,
                expected,
                actual,
            } => write!(
                f,
                "Cannot set an object of type {} to \"{}\" of type {}",
                actual, description, expected
            ),
            WrapperError::ObjectError(error) => write!(f, "{}", error),
            WrapperError::ValueTypeError(error) => write!(f, "{}", error),
        }
    }
}

impl Error for WrapperError {}

impl From<ObjectError> for WrapperError {
    fn from(v: ObjectError) -> Self {
        Self::ObjectError(v)
    }
}

impl From<ValueTypeError> for WrapperError {
    fn from(v: ValueTypeError) -> Self {
        Self::ValueTypeError(v)
    }
}
