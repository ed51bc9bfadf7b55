#![allow(missing_docs)]

use std::{borrow::Cow, error::Error, fmt};

use crate::Value;

#[derive(Debug, Clone)]
pub struct ValueTypeError {
    pub expected: Cow<'static, str>,
    pub actual: Value,
}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected value of type {}, found {} ({})",
            self.expected,
            self.actual,
            self.actual.data_type()
        )
    }
}

impl Error for ValueTypeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionError {
    pub operation: &'static str,
    pub left: (usize, usize),
    pub right: (usize, usize),
}

impl fmt::Display for DimensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix dimensions do not agree for {}: {}x{} and {}x{}",
            self.operation, self.left.0, self.left.1, self.right.0, self.right.1
        )
    }
}

impl Error for DimensionError {}
