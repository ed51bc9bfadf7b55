//! An interpreter core for mission-sequence scripts.
//!
//! A [Session] holds the configured objects of a script (spacecraft, variables, arrays,
//! coordinate systems, report files, ...), its user functions and its command sequence.
//! Commands are validated against the objects, then executed:
//!
//! ```
//! use mscript::*;
//!
//! let mut session = Session::new();
//! session.add_object(Object::spacecraft("sat1"));
//! session.add_object(Object::variable("x", 0.0));
//! session.add_object(Object::report_file("rf"));
//!
//! session.push(Assignment::new("x", "sat1.X + 100"));
//! session.push(Report::new("rf", &["x"]));
//!
//! let output = session.run();
//! assert_eq!(output[0].text, "7200");
//! ```
//!
//! # Identifiers
//!
//! Every name a command uses is classified by naming convention into an [ElementWrapper]:
//! - `'text'` and `{a, b}` are string literals, and `3.5` or `-1e3` are numbers
//! - `A(i, 2)` is an element of the Array `A`, with both indices classified the same way
//! - `sat1.X` is a property of `sat1`, or the system Parameter `X` owned by `sat1`
//! - `sat1.EarthMJ2000Eq.X` is a system Parameter with a dependency
//! - anything else is an object, `true`/`false`, `On`/`Off`, or a string
//!
//! Whether `owner.name` is a property or a Parameter depends on the command. The right-hand
//! side of an assignment is a Parameter only if `name` is a known Parameter type.
//!
//! # Errors
//!
//! Validation collects recoverable errors when
//! [continue_on_error](ValidatorConfig::continue_on_error) is set, and reports them all
//! together. Methods that can fail come in pairs: a panicking version and a `try_` version
//! that returns an [Error].

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use error::*;
pub use mscript_command::{
    Assignment, BranchKind, Command, CommandError, CommandKind, Condition, ConditionChain,
    ConditionalBranch, ErrorClass, FunctionCall, LogicalOperator, Manage, Propagate,
    RelationalOperator, Report, ReportLine, ScriptFunction, ValidationError, ValidatorConfig,
};
pub use mscript_data_type::{ParameterType, Rmatrix, Value};
pub use mscript_math::{is_equation, MathError, MathTree, RhsEquation};
pub use mscript_object::{Object, ObjectError, ObjectRef, ObjectStore, ObjectType};
pub use mscript_wrapper::{
    ClassifyError, ClassifyOptions, ElementAccess, ElementWrapper, WrapperError, WrapperKind,
    WrapperType,
};
pub use session::*;

mod error;
mod session;
