//! Shape, orientation, density and kind tags
//!
//! Every operand and every expression node is described by a
//! [`ResultType`]: these tags are all the engine needs to pick a kernel
//! and to check dimensions without touching any element.

use serde::{Deserialize, Serialize};
use std::fmt;

/// (rows, columns) extent; vectors are n×1 (column) or 1×n (row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Shape of a vector of `len` elements in the given orientation
    pub const fn vector(len: usize, orientation: Orientation) -> Self {
        match orientation {
            Orientation::ColumnMajor => Self::new(len, 1),
            Orientation::RowMajor => Self::new(1, len),
        }
    }

    /// Number of elements, `None` on overflow
    pub fn checked_len(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn transposed(&self) -> Self {
        Self::new(self.cols, self.rows)
    }

    /// Number of lines when traversed in `order` (rows for row-major)
    pub fn majors(&self, order: Orientation) -> usize {
        match order {
            Orientation::RowMajor => self.rows,
            Orientation::ColumnMajor => self.cols,
        }
    }

    /// Length of each line when traversed in `order`
    pub fn minors(&self, order: Orientation) -> usize {
        match order {
            Orientation::RowMajor => self.cols,
            Orientation::ColumnMajor => self.rows,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.rows, self.cols)
    }
}

/// Storage order of a matrix; for vectors, column- or row-vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    RowMajor,
    ColumnMajor,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::RowMajor => Orientation::ColumnMajor,
            Orientation::ColumnMajor => Orientation::RowMajor,
        }
    }

    /// (row, col) of the element at `minor` within line `major`
    #[inline]
    pub fn coords(self, major: usize, minor: usize) -> (usize, usize) {
        match self {
            Orientation::RowMajor => (major, minor),
            Orientation::ColumnMajor => (minor, major),
        }
    }

    /// (major, minor) of the element at (row, col)
    #[inline]
    pub fn split(self, row: usize, col: usize) -> (usize, usize) {
        match self {
            Orientation::RowMajor => (row, col),
            Orientation::ColumnMajor => (col, row),
        }
    }

    /// Name used in messages for vectors of this orientation
    pub fn vector_name(self) -> &'static str {
        match self {
            Orientation::RowMajor => "row",
            Orientation::ColumnMajor => "column",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::RowMajor => write!(f, "row-major"),
            Orientation::ColumnMajor => write!(f, "column-major"),
        }
    }
}

/// Whether every element is stored or only the non-zero ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Density {
    Dense,
    Sparse,
}

impl Density {
    /// Dense if either side is dense
    pub fn either_dense(a: Density, b: Density) -> Density {
        if a == Density::Sparse && b == Density::Sparse {
            Density::Sparse
        } else {
            Density::Dense
        }
    }

    /// Sparse if either side is sparse
    pub fn either_sparse(a: Density, b: Density) -> Density {
        if a == Density::Sparse || b == Density::Sparse {
            Density::Sparse
        } else {
            Density::Dense
        }
    }
}

/// Category of a value: the category decides which operations apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Scalar,
    Vector,
    Matrix,
}

/// Everything known about a value before it is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultType {
    pub kind: Kind,
    pub shape: Shape,
    pub orientation: Orientation,
    pub density: Density,
}

impl ResultType {
    pub fn scalar() -> Self {
        Self {
            kind: Kind::Scalar,
            shape: Shape::new(1, 1),
            orientation: Orientation::RowMajor,
            density: Density::Dense,
        }
    }

    pub fn vector(len: usize, orientation: Orientation, density: Density) -> Self {
        Self {
            kind: Kind::Vector,
            shape: Shape::vector(len, orientation),
            orientation,
            density,
        }
    }

    pub fn matrix(shape: Shape, orientation: Orientation, density: Density) -> Self {
        Self { kind: Kind::Matrix, shape, orientation, density }
    }

    /// Length of a vector (the non-unit dimension)
    pub fn len(&self) -> usize {
        match self.orientation {
            Orientation::ColumnMajor => self.shape.rows,
            Orientation::RowMajor => self.shape.cols,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn is_column_vector(&self) -> bool {
        self.kind == Kind::Vector && self.orientation == Orientation::ColumnMajor
    }

    pub fn is_row_vector(&self) -> bool {
        self.kind == Kind::Vector && self.orientation == Orientation::RowMajor
    }

    /// Short description used in error messages, e.g. "sparse column vector"
    pub fn describe(&self) -> String {
        let density = match self.density {
            Density::Dense => "dense",
            Density::Sparse => "sparse",
        };
        match self.kind {
            Kind::Scalar => "scalar".to_string(),
            Kind::Vector => format!("{} {} vector", density, self.orientation.vector_name()),
            Kind::Matrix => format!("{} {} matrix", density, self.orientation),
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.shape, self.describe())
    }
}
