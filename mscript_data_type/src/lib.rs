//! Data types and dynamically typed values shared by the mission-script interpreter.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use data_type::*;
pub use error::*;
pub use matrix::*;
pub use value::*;

mod data_type;
mod error;
mod matrix;
mod value;
