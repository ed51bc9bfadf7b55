#![allow(missing_docs)]

use std::{error::Error, fmt};

use mscript_data_type::{DimensionError, Value, ValueTypeError};

use crate::ObjectType;

#[derive(Debug, Clone)]
pub enum ObjectError {
    UndefinedObject(String),
    UndefinedProperty {
        object: String,
        property: String,
    },
    ReadOnlyProperty {
        object: String,
        property: String,
    },
    InvalidPropertyValue {
        object: String,
        property: String,
        value: Value,
        accepted: String,
    },
    ValueTypeError(ValueTypeError),
    DimensionError(DimensionError),
    IndexOutOfBounds {
        array: String,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    ArraySizeNotSet(String),
    ArraySizeAlreadySet(String),
    InvalidArraySize {
        array: String,
        rows: usize,
        cols: usize,
    },
    UnknownParameterType(String),
    ParameterOwnerMissing {
        parameter: String,
        owner: String,
    },
    WrongOwnerType {
        parameter: String,
        owner: String,
        expected: ObjectType,
    },
    ParameterNotSettable(String),
    NotAParameter(String),
    DuplicateName(String),
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectError::UndefinedObject(name) => write!(f, "Nonexistent object \"{}\"", name),
            ObjectError::UndefinedProperty { object, property } => {
                write!(f, "\"{}\" is not a valid field of \"{}\"", property, object)
            }
            ObjectError::ReadOnlyProperty { object, property } => {
                write!(f, "The field \"{}\" on \"{}\" is read-only", property, object)
            }
            ObjectError::InvalidPropertyValue {
                object,
                property,
                value,
                accepted,
            } => write!(
                f,
                "The value of \"{}\" for field \"{}\" on object \"{}\" is not an allowed value.\n\
                 The allowed values are: [{}]",
                value, property, object, accepted
            ),
            ObjectError::ValueTypeError(error) => write!(f, "{}", error),
            ObjectError::DimensionError(error) => write!(f, "{}", error),
            ObjectError::IndexOutOfBounds {
                array,
                row,
                col,
                rows,
                cols,
            } => write!(
                f,
                "Index ({}, {}) is out of bounds for the Array \"{}\"; \
                 valid rows are 1 to {} and valid columns are 1 to {}",
                row, col, array, rows, cols
            ),
            ObjectError::ArraySizeNotSet(name) => {
                write!(f, "The size of the Array \"{}\" has not been set", name)
            }
            ObjectError::ArraySizeAlreadySet(name) => {
                write!(f, "The size of the Array \"{}\" has already been set", name)
            }
            ObjectError::InvalidArraySize { array, rows, cols } => write!(
                f,
                "Invalid size {}x{} for the Array \"{}\"; both dimensions must be at least 1",
                rows, cols, array
            ),
            ObjectError::UnknownParameterType(type_name) => {
                write!(f, "\"{}\" is not a valid Parameter Type", type_name)
            }
            ObjectError::ParameterOwnerMissing { parameter, owner } => write!(
                f,
                "Nonexistent object \"{}\" referenced in \"{}\"",
                owner, parameter
            ),
            ObjectError::WrongOwnerType {
                parameter,
                owner,
                expected,
            } => write!(
                f,
                "The Parameter \"{}\" requires an owner of type {}, but \"{}\" is not one",
                parameter, expected, owner
            ),
            ObjectError::ParameterNotSettable(name) => {
                write!(f, "The Parameter \"{}\" is read-only", name)
            }
            ObjectError::NotAParameter(name) => write!(f, "\"{}\" is not a Parameter", name),
            ObjectError::DuplicateName(name) => {
                write!(f, "An object named \"{}\" already exists", name)
            }
        }
    }
}

impl Error for ObjectError {}

impl From<ValueTypeError> for ObjectError {
    fn from(v: ValueTypeError) -> Self {
        Self::ValueTypeError(v)
    }
}

impl From<DimensionError> for ObjectError {
    fn from(v: DimensionError) -> Self {
        Self::DimensionError(v)
    }
}
