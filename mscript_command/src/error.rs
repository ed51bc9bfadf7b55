#![allow(missing_docs)]

use std::{error::Error, fmt};

use mscript_math::MathError;
use mscript_object::{ObjectError, ObjectType};
use mscript_wrapper::{ClassifyError, WrapperError};

use crate::{LogicalOperator, RelationalOperator};

/// Whether an error can be collected and reported later, or must stop interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// A problem in the script, such as an unknown name.
    Recoverable,
    /// A broken invariant that validation should have prevented.
    Fatal,
}

#[derive(Debug, Clone)]
pub enum CommandError {
    Context {
        context: String,
        error: Box<CommandError>,
    },
    InFunction {
        function: String,
        error: Box<CommandError>,
    },
    ClassifyError(ClassifyError),
    WrapperError(WrapperError),
    MathError(MathError),
    ObjectError(ObjectError),
    InvalidRelationalOperator(String),
    InvalidLogicalOperator(String),
    ConditionIndex {
        index: usize,
        count: usize,
    },
    LogicalOperatorCount {
        conditions: usize,
        operators: usize,
    },
    MissingWrapper {
        command: &'static str,
        name: String,
    },
    UnknownWrapperName {
        command: &'static str,
        name: String,
    },
    SetWrapperFailed {
        side: &'static str,
        name: String,
    },
    MissingEndQuote {
        generating_string: String,
    },
    UndefinedObject {
        name: String,
        referenced_in: String,
    },
    UndefinedReference {
        object_type: ObjectType,
        name: String,
        referenced_in: String,
    },
    WrongReferenceType {
        object_type: ObjectType,
        name: String,
        referenced_in: String,
    },
    IdenticalBodies {
        name: String,
        body: String,
    },
    UndefinedFunction(String),
    FunctionArgumentCount {
        function: String,
        direction: &'static str,
        expected: usize,
        actual: usize,
    },
    RecursiveCall(String),
    ElseInLoop,
    IterationLimit {
        limit: usize,
        generating_string: String,
    },
}

impl CommandError {
    /// The class of the error.
    ///
    /// Evaluation failures and broken command invariants are fatal; everything else is a
    /// recoverable script error.
    pub fn class(&self) -> ErrorClass {
        match self {
            CommandError::Context { error, .. } | CommandError::InFunction { error, .. } => {
                error.class()
            }
            CommandError::LogicalOperatorCount { .. }
            | CommandError::MissingWrapper { .. }
            | CommandError::WrapperError(_) => ErrorClass::Fatal,
            CommandError::MathError(error) if error.is_fatal() => ErrorClass::Fatal,
            _ => ErrorClass::Recoverable,
        }
    }

    /// Return true if the error is [ErrorClass::Fatal].
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Context { context, error } => write!(f, "{}:\n  {}", context, error),
            CommandError::InFunction { function, error } => {
                write!(f, "{}\n(In Function \"{}\")\n", error, function)
            }
            CommandError::ClassifyError(error) => write!(f, "{}", error),
            CommandError::WrapperError(error) => write!(f, "{}", error),
            CommandError::MathError(error) => write!(f, "{}", error),
            CommandError::ObjectError(error) => write!(f, "{}", error),
            CommandError::InvalidRelationalOperator(operator) => write!(
                f,
                "The relational operator \"{}\" is not valid. The valid operators are: {}",
                operator,
                RelationalOperator::ALL
                    .iter()
                    .map(|op| op.symbol())
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            CommandError::InvalidLogicalOperator(operator) => write!(
                f,
                "The logical operator \"{}\" is not valid. The valid operators are: {}",
                operator,
                LogicalOperator::ALL
                    .iter()
                    .map(|op| op.symbol())
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            CommandError::ConditionIndex { index, count } => write!(
                f,
                "The index {} is out of range; there are {} condition(s)",
                index, count
            ),
            CommandError::LogicalOperatorCount {
                conditions,
                operators,
            } => write!(
                f,
                "Found too few or too many logical operators: {} condition(s) need {} \
                 logical operator(s), but {} were given",
                conditions,
                conditions.saturating_sub(1),
                operators
            ),
            CommandError::MissingWrapper { command, name } => write!(
                f,
                "The {} command has no wrapper for \"{}\"; the command was not validated",
                command, name
            ),
            CommandError::UnknownWrapperName { command, name } => write!(
                f,
                "Undefined object \"{}\" found in command \"{}\"",
                name, command
            ),
            CommandError::SetWrapperFailed { side, name } => write!(
                f,
                "Failed to set ElementWrapper for {} object \"{}\" in Assignment",
                side, name
            ),
            CommandError::MissingEndQuote { generating_string } => write!(
                f,
                "Assignment command has missing end quote on the right-hand-side\n   \"{}\"",
                generating_string
            ),
            CommandError::UndefinedObject {
                name,
                referenced_in,
            } => write!(
                f,
                "Nonexistent object \"{}\" referenced in \"{}\"",
                name, referenced_in
            ),
            CommandError::UndefinedReference {
                object_type,
                name,
                referenced_in,
            } => write!(
                f,
                "Nonexistent {} \"{}\" referenced in the {}",
                object_type, name, referenced_in
            ),
            CommandError::WrongReferenceType {
                object_type,
                name,
                referenced_in,
            } => write!(
                f,
                "\"{}\" referenced in the {} is not an object of {}",
                name, referenced_in, object_type
            ),
            CommandError::IdenticalBodies { name, body } => write!(
                f,
                "The Primary and Secondary bodies of the LibrationPoint \"{}\" are both \"{}\"",
                name, body
            ),
            CommandError::UndefinedFunction(name) => {
                write!(f, "CallFunction command cannot find Function \"{}\"", name)
            }
            CommandError::FunctionArgumentCount {
                function,
                direction,
                expected,
                actual,
            } => write!(
                f,
                "The function \"{}\" expects {} {} argument(s), but {} were given",
                function, expected, direction, actual
            ),
            CommandError::RecursiveCall(name) => {
                write!(f, "The function \"{}\" cannot call itself", name)
            }
            CommandError::ElseInLoop => write!(f, "A While command cannot have an Else branch"),
            CommandError::IterationLimit {
                limit,
                generating_string,
            } => write!(
                f,
                "The loop \"{}\" did not finish within {} iterations",
                generating_string, limit
            ),
        }
    }
}

impl Error for CommandError {}

impl From<ClassifyError> for CommandError {
    fn from(v: ClassifyError) -> Self {
        Self::ClassifyError(v)
    }
}

impl From<WrapperError> for CommandError {
    fn from(v: WrapperError) -> Self {
        Self::WrapperError(v)
    }
}

impl From<MathError> for CommandError {
    fn from(v: MathError) -> Self {
        Self::MathError(v)
    }
}

impl From<ObjectError> for CommandError {
    fn from(v: ObjectError) -> Self {
        Self::ObjectError(v)
    }
}

/// An error reported by the validator, with the script text it came from.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
    pub generating_string: String,
    pub line: Option<usize>,
    pub class: ErrorClass,
}

impl ValidationError {
    /// Attach the command text and line to a command error.
    pub fn new(error: &CommandError, generating_string: &str, line: Option<usize>) -> Self {
        Self {
            message: error.to_string(),
            generating_string: generating_string.to_string(),
            line,
            class: error.class(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.generating_string.is_empty(), self.line) {
            (true, _) => write!(f, "{}", self.message),
            (false, Some(line)) => write!(
                f,
                "in \"{}\" at line {}:\n  {}",
                self.generating_string, line, self.message
            ),
            (false, None) => write!(f, "in \"{}\":\n  {}", self.generating_string, self.message),
        }
    }
}

impl Error for ValidationError {}
