//! Mission sequence commands, their validation, and their execution.
//!
//! Commands are built from already-split script text, e.g. `Assignment::new("sat1.X", "7000")`.
//! A [Validator] binds every name a command uses to an
//! [ElementWrapper](mscript_wrapper::ElementWrapper), checks that the objects it refers to
//! exist, and after the whole script has been validated runs a [final pass](Validator::final_pass)
//! over the configured objects. A [Runtime] then executes the validated commands.
//!
//! Recoverable script errors are collected by the validator (see
//! [ValidatorConfig::continue_on_error]); errors that mean a command was executed without
//! being validated are always returned immediately.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use assignment::*;
pub use branch::*;
pub use command::*;
pub use condition::*;
pub use config::*;
pub use error::*;
pub use function::*;
pub use runtime::*;
pub use validator::*;

mod assignment;
mod branch;
mod command;
mod condition;
mod config;
mod error;
mod function;
mod runtime;
mod validator;
