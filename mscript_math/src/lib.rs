//! Math expressions on the right-hand side of assignments.
//!
//! An expression such as `sqrt(sat1.X^2 + sat1.Y^2) / A(i, 2)` is parsed into a [MathTree]
//! whose leaves are identifier descriptions. An [RhsEquation] owns the tree together with a
//! [WrapperMap] holding one bound [ElementWrapper](mscript_wrapper::ElementWrapper) per leaf.
//! Running the equation evaluates the tree and returns its result in a wrapper of the matching
//! kind: a number, an array, a string or an object.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use equation::*;
pub use error::*;
pub use parse::*;
pub use tree::*;

mod equation;
mod error;
mod parse;
mod tree;
