//! Owned storage of any category, and moving results into a destination

use crate::dense::{DenseMatrix, DenseVector};
use crate::sparse::{SparseMatrix, SparseVector};
use alinea_core::{
    write_operand, AlineaError, Density, Element, Kind, Operand, Orientation, ResultType, Shape,
    StorageError, Target,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Any of the four storage types, picked at runtime from a [`ResultType`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Container<T> {
    DenseVector(DenseVector<T>),
    DenseMatrix(DenseMatrix<T>),
    SparseVector(SparseVector<T>),
    SparseMatrix(SparseMatrix<T>),
}

macro_rules! each {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            Container::DenseVector($v) => $body,
            Container::DenseMatrix($v) => $body,
            Container::SparseVector($v) => $body,
            Container::SparseMatrix($v) => $body,
        }
    };
}

impl<T: Element> Container<T> {
    /// Zero-initialized storage able to hold a value of type `ty`
    pub fn for_result(ty: ResultType) -> Result<Self, AlineaError> {
        let mut c = match (ty.kind, ty.density, ty.orientation) {
            (Kind::Scalar, _, _) => {
                return Err(AlineaError::invalid_argument(
                    "a scalar expression has no vector or matrix storage",
                ))
            }
            (Kind::Vector, Density::Dense, Orientation::ColumnMajor) => {
                Container::DenseVector(DenseVector::from_vec(Vec::new()))
            }
            (Kind::Vector, Density::Dense, Orientation::RowMajor) => {
                Container::DenseVector(DenseVector::row_from_vec(Vec::new()))
            }
            (Kind::Vector, Density::Sparse, Orientation::ColumnMajor) => {
                Container::SparseVector(SparseVector::new(0))
            }
            (Kind::Vector, Density::Sparse, Orientation::RowMajor) => {
                Container::SparseVector(SparseVector::new_row(0))
            }
            (Kind::Matrix, Density::Dense, order) => {
                Container::DenseMatrix(DenseMatrix::zeros_with(0, 0, order))
            }
            (Kind::Matrix, Density::Sparse, order) => {
                Container::SparseMatrix(SparseMatrix::new_with(0, 0, order))
            }
        };
        c.resize(ty.shape, false)?;
        Ok(c)
    }

    pub fn as_operand(&self) -> &dyn Operand<Elem = T> {
        match self {
            Container::DenseVector(v) => v,
            Container::DenseMatrix(v) => v,
            Container::SparseVector(v) => v,
            Container::SparseMatrix(v) => v,
        }
    }
}

impl<T: Element> Operand for Container<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        each!(self, v => v.shape())
    }

    fn orientation(&self) -> Orientation {
        each!(self, v => v.orientation())
    }

    fn density(&self) -> Density {
        each!(self, v => v.density())
    }

    fn kind(&self) -> Kind {
        each!(self, v => v.kind())
    }

    fn get(&self, row: usize, col: usize) -> T {
        each!(self, v => v.get(row, col))
    }

    fn line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, T)>) {
        each!(self, v => v.line(major, order, out))
    }

    fn nnz(&self) -> usize {
        each!(self, v => v.nnz())
    }
}

impl<T: Element> Target for Container<T> {
    fn is_resizable(&self) -> bool {
        each!(self, v => v.is_resizable())
    }

    fn resize(&mut self, shape: Shape, preserve: bool) -> Result<(), StorageError> {
        each!(self, v => v.resize(shape, preserve))
    }

    fn reset(&mut self) {
        each!(self, v => v.reset())
    }

    fn reserve(&mut self, nonzeros: usize) -> Result<(), StorageError> {
        each!(self, v => v.reserve(nonzeros))
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        each!(self, v => v.set(row, col, value))
    }

    fn append(&mut self, row: usize, col: usize, value: T) -> Result<(), StorageError> {
        each!(self, v => v.append(row, col, value))
    }
}

impl<T: Element> fmt::Display for Container<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_operand(f, self)
    }
}

macro_rules! impl_from {
    ($($ty:ident),*) => {
        $(impl<T> From<$ty<T>> for Container<T> {
            fn from(v: $ty<T>) -> Self {
                Container::$ty(v)
            }
        })*
    };
}

impl_from!(DenseVector, DenseMatrix, SparseVector, SparseMatrix);

/// Storage usable as an assignment destination
///
/// `absorb` replaces the contents with a computed temporary. When the
/// temporary already has the destination's layout its buffer is moved in;
/// otherwise it is copied element by element in the destination's order.
pub trait Store: Target {
    fn absorb(&mut self, source: Container<Self::Elem>) -> Result<(), AlineaError>;
}

macro_rules! impl_store {
    ($ty:ident) => {
        impl<T: Element> Store for $ty<T> {
            fn absorb(&mut self, source: Container<T>) -> Result<(), AlineaError> {
                match source {
                    Container::$ty(v)
                        if v.orientation() == self.orientation()
                            && (self.is_resizable() || v.shape() == self.shape()) =>
                    {
                        *self = if self.is_resizable() { v } else { v.with_fixed_extent() };
                        Ok(())
                    }
                    other => transfer(self, other.as_operand()).map_err(AlineaError::from),
                }
            }
        }
    };
}

impl_store!(DenseVector);
impl_store!(DenseMatrix);
impl_store!(SparseVector);
impl_store!(SparseMatrix);

impl<T: Element> Store for Container<T> {
    fn absorb(&mut self, source: Container<T>) -> Result<(), AlineaError> {
        match self {
            Container::DenseVector(v) => v.absorb(source),
            Container::DenseMatrix(v) => v.absorb(source),
            Container::SparseVector(v) => v.absorb(source),
            Container::SparseMatrix(v) => v.absorb(source),
        }
    }
}

/// Copy `src` into `dst`, resizing `dst` to `src`'s shape first
///
/// Lines are walked in the destination's order, so sparse destinations
/// only ever see in-order appends.
pub fn transfer<D: Target + ?Sized>(
    dst: &mut D,
    src: &dyn Operand<Elem = D::Elem>,
) -> Result<(), StorageError> {
    let shape = src.shape();
    dst.resize(shape, false)?;
    dst.reset();
    dst.reserve(src.nnz())?;
    let order = dst.orientation();
    let mut buf = Vec::new();
    for major in 0..shape.majors(order) {
        src.line(major, order, &mut buf);
        for &(minor, value) in &buf {
            let (r, c) = order.coords(major, minor);
            dst.append(r, c, value)?;
        }
    }
    Ok(())
}
