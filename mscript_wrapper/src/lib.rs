//! Typed accessors for the identifiers and literals that appear in mission scripts.
//!
//! An [ElementWrapper] is created from a description such as `sat1.X`, `A(i, 2)`, `'text'` or
//! `3.14` by the [Classifier], which decides what the text refers to using only naming
//! conventions and the objects in an [ObjectScope](mscript_object::ObjectScope):
//!
//! - `'text'` and `{a, b}` are string literals
//! - numbers are number literals
//! - `A(r, c)` is an element of the Array `A`, with `r` and `c` classified recursively
//! - `owner.name` and `owner.dependency.name` are object properties or system Parameters
//! - anything else is a configured object, a boolean, an on/off flag, or a string
//!
//! Once bound, a wrapper reads and writes through to its object using the [ElementAccess]
//! operations.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use classify::*;
pub use error::*;
pub use parse::*;
pub use wrapper::*;

mod classify;
mod error;
mod parse;
mod wrapper;
