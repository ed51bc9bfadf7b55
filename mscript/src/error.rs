#![allow(missing_docs)]

use std::{error, fmt, sync::Arc};

use mscript_command::ValidationError;
use mscript_object::ObjectError;
use mscript_wrapper::{ClassifyError, WrapperError};

#[derive(Debug, Clone)]
pub enum Error {
    ConfigError(Arc<serde_json::Error>),
    ObjectError(ObjectError),
    ClassifyError(ClassifyError),
    WrapperError(WrapperError),
    ValidationError(ValidationError),
    ScriptErrors(Vec<ValidationError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigError(error) => write!(f, "invalid config: {}", error),
            Error::ObjectError(error) => write!(f, "{}", error),
            Error::ClassifyError(error) => write!(f, "{}", error),
            Error::WrapperError(error) => write!(f, "{}", error),
            Error::ValidationError(error) => write!(f, "{}", error),
            Error::ScriptErrors(errors) => {
                write!(f, "script has {} error(s):", errors.len())?;
                for error in errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
        }
    }
}

impl error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(v: serde_json::Error) -> Self {
        Self::ConfigError(Arc::new(v))
    }
}

impl From<ObjectError> for Error {
    fn from(v: ObjectError) -> Self {
        Self::ObjectError(v)
    }
}

impl From<ClassifyError> for Error {
    fn from(v: ClassifyError) -> Self {
        Self::ClassifyError(v)
    }
}

impl From<WrapperError> for Error {
    fn from(v: WrapperError) -> Self {
        Self::WrapperError(v)
    }
}

impl From<ValidationError> for Error {
    fn from(v: ValidationError) -> Self {
        Self::ValidationError(v)
    }
}
