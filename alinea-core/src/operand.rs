//! The read and write contracts between the engine and storage
//!
//! [`Operand`] is the uniform read view over any vector or matrix, dense or
//! sparse, in either orientation. [`Target`] adds the mutating half and is
//! only ever required of an assignment destination or a temporary.

use crate::element::Element;
use crate::error::{AlineaError, StorageError};
use crate::shape::{Density, Kind, Orientation, ResultType, Shape};
use std::fmt;

/// Identity of a storage object, compared by address, never by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageId(usize);

impl StorageId {
    /// Identity of the value behind `ptr`
    pub fn of<T: ?Sized>(ptr: *const T) -> Self {
        StorageId(ptr as *const () as usize)
    }
}

/// Read access to a vector or matrix
///
/// Indices passed to [`Operand::get`] must lie inside [`Operand::shape`];
/// implementations are free to panic or return garbage otherwise.
pub trait Operand {
    type Elem: Element;

    fn shape(&self) -> Shape;

    /// Storage order; column vectors are column-major, row vectors row-major
    fn orientation(&self) -> Orientation;

    fn density(&self) -> Density;

    /// `Vector` or `Matrix`
    fn kind(&self) -> Kind;

    /// Element at (row, col); zero for entries a sparse operand does not store
    fn get(&self, row: usize, col: usize) -> Self::Elem;

    /// Clear `out`, then fill it with the stored entries of line `major`
    /// traversed in `order`, as (minor index, value) pairs in strictly
    /// increasing minor index. Dense operands report every element.
    fn line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, Self::Elem)>);

    /// Number of stored entries
    fn nnz(&self) -> usize;

    /// Identity for aliasing checks; `None` for values nothing else can reach
    fn storage_id(&self) -> Option<StorageId> {
        None
    }

    fn result_type(&self) -> ResultType {
        ResultType {
            kind: self.kind(),
            shape: self.shape(),
            orientation: self.orientation(),
            density: self.density(),
        }
    }

    fn is_dense(&self) -> bool {
        self.density() == Density::Dense
    }

    /// All elements, row by row
    fn to_rows(&self) -> Vec<Vec<Self::Elem>> {
        let shape = self.shape();
        (0..shape.rows)
            .map(|r| (0..shape.cols).map(|c| self.get(r, c)).collect())
            .collect()
    }
}

/// Write access, required of destinations only
pub trait Target: Operand {
    /// Fixed-extent storage reports `false` and rejects any shape change
    fn is_resizable(&self) -> bool;

    /// Change the extent; without `preserve` the contents become unspecified
    /// (dense) or empty (sparse)
    fn resize(&mut self, shape: Shape, preserve: bool) -> Result<(), StorageError>;

    /// Zero every dense element, drop every sparse entry
    fn reset(&mut self);

    /// Capacity hint for the number of stored entries
    fn reserve(&mut self, nonzeros: usize) -> Result<(), StorageError>;

    /// Overwrite (or insert, for sparse storage) a single element
    fn set(&mut self, row: usize, col: usize, value: Self::Elem);

    /// Append after the last entry of the line; the minor index must be
    /// strictly greater than the line's last stored index
    fn append(&mut self, row: usize, col: usize, value: Self::Elem) -> Result<(), StorageError>;

    /// Whether this storage can take `shape` through [`Target::resize`]
    fn accepts_shape(&self, shape: Shape) -> bool {
        if shape == self.shape() {
            return true;
        }
        if !self.is_resizable() {
            return false;
        }
        match (self.kind(), self.orientation()) {
            (Kind::Vector, Orientation::ColumnMajor) => shape.cols == 1,
            (Kind::Vector, Orientation::RowMajor) => shape.rows == 1,
            _ => true,
        }
    }
}

/// Error for a destination that cannot take `required`
pub fn shape_error<D: Target + ?Sized>(dst: &D, required: Shape) -> AlineaError {
    if dst.kind() == Kind::Vector && dst.is_resizable() {
        AlineaError::from(StorageError::NotAVectorShape {
            orientation: dst.orientation().vector_name(),
            requested: required,
        })
    } else {
        AlineaError::destination_shape(dst.shape(), required)
    }
}

/// Whether two operands hold the same values at the same shape, regardless
/// of density or orientation
pub fn same_values<T: Element>(
    a: &dyn Operand<Elem = T>,
    b: &dyn Operand<Elem = T>,
) -> bool {
    let shape = a.shape();
    if shape != b.shape() {
        return false;
    }
    (0..shape.rows).all(|r| (0..shape.cols).all(|c| a.get(r, c) == b.get(r, c)))
}

/// Shared `Display` body: `[[a, b], [c, d]]` for matrices, `[a, b]` for vectors
pub fn write_operand<T: Element>(
    f: &mut fmt::Formatter<'_>,
    op: &dyn Operand<Elem = T>,
) -> fmt::Result {
    let shape = op.shape();
    if op.kind() == Kind::Vector {
        let len = shape.rows.max(shape.cols).min(shape.rows * shape.cols);
        write!(f, "[")?;
        for i in 0..len {
            if i > 0 {
                write!(f, ", ")?;
            }
            let (r, c) = if shape.cols == 1 { (i, 0) } else { (0, i) };
            write!(f, "{}", op.get(r, c))?;
        }
        return write!(f, "]");
    }
    write!(f, "[")?;
    for r in 0..shape.rows {
        if r > 0 {
            write!(f, ", ")?;
        }
        write!(f, "[")?;
        for c in 0..shape.cols {
            if c > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", op.get(r, c))?;
        }
        write!(f, "]")?;
    }
    write!(f, "]")
}
