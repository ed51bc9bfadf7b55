//! Dense matrices of reals.

use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::DimensionError;

/// A dense `rows x cols` matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rmatrix(DMatrix<f64>);

impl Rmatrix {
    /// Create a zero-filled matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self(DMatrix::zeros(rows, cols))
    }

    /// Create a 1x1 matrix.
    pub fn scalar(value: f64) -> Self {
        Self(DMatrix::from_element(1, 1, value))
    }

    /// Build a matrix from a list of equal-length rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, DimensionError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(row) = rows.iter().find(|row| row.len() != cols) {
            return Err(DimensionError {
                operation: "row construction",
                left: (1, cols),
                right: (1, row.len()),
            });
        }
        let data: Vec<f64> = rows.concat();
        Ok(Self(DMatrix::from_row_slice(rows.len(), cols, &data)))
    }

    /// The number of rows.
    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    /// The number of columns.
    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    /// The `(rows, cols)` pair.
    pub fn dims(&self) -> (usize, usize) {
        self.0.shape()
    }

    /// Return true if the matrix is 1x1.
    pub fn is_scalar(&self) -> bool {
        self.dims() == (1, 1)
    }

    /// Return true if the matrix has a single row or a single column.
    pub fn is_vector(&self) -> bool {
        self.rows() == 1 || self.cols() == 1
    }

    /// The elements in row-major order.
    pub fn data(&self) -> Vec<f64> {
        self.0.transpose().iter().copied().collect()
    }

    /// Read an element using 0-based indices.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.0.get((row, col)).copied()
    }

    /// Mutable access to an element using 0-based indices.
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut f64> {
        self.0.get_mut((row, col))
    }

    /// The transpose of the matrix.
    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    /// Apply `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }

    /// Combine two equal-sized matrices elementwise.
    pub fn zip_with(
        &self,
        other: &Rmatrix,
        operation: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, DimensionError> {
        if self.dims() != other.dims() {
            return Err(DimensionError {
                operation,
                left: self.dims(),
                right: other.dims(),
            });
        }
        Ok(Self(self.0.zip_map(&other.0, f)))
    }

    /// The matrix product `self * other`.
    pub fn mul(&self, other: &Rmatrix) -> Result<Self, DimensionError> {
        if self.cols() != other.rows() {
            return Err(DimensionError {
                operation: "multiplication",
                left: self.dims(),
                right: other.dims(),
            });
        }
        Ok(Self(&self.0 * &other.0))
    }

    /// The Frobenius norm, which is the Euclidean norm for vectors.
    pub fn norm(&self) -> f64 {
        self.0.norm()
    }
}

impl fmt::Display for Rmatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.0.row_iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for (c, value) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", value)?;
            }
        }
        Ok(())
    }
}
