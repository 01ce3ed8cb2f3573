//! Dense vector and matrix storage

use alinea_core::{
    try_reserve, write_operand, AlineaError, Density, Element, Kind, Operand, Orientation,
    Shape, StorageError, Target,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

// ============ DenseVector ============

/// Contiguous vector; column vector unless built with a `row` constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseVector<T> {
    data: Vec<T>,
    orientation: Orientation,
    fixed: bool,
}

impl<T: Element> DenseVector<T> {
    /// Column vector of `len` zeros
    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![T::zero(); len])
    }

    /// Row vector of `len` zeros
    pub fn zeros_row(len: usize) -> Self {
        Self::row_from_vec(vec![T::zero(); len])
    }

    /// Column vector owning `data`
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data, orientation: Orientation::ColumnMajor, fixed: false }
    }

    /// Row vector owning `data`
    pub fn row_from_vec(data: Vec<T>) -> Self {
        Self { data, orientation: Orientation::RowMajor, fixed: false }
    }

    /// Builder: refuse any later change of length
    pub fn with_fixed_extent(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Index<usize> for DenseVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for DenseVector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T: Element> Operand for DenseVector<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        Shape::vector(self.data.len(), self.orientation)
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn density(&self) -> Density {
        Density::Dense
    }

    fn kind(&self) -> Kind {
        Kind::Vector
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> T {
        // one of the two is always zero
        self.data[row + col]
    }

    fn line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, T)>) {
        out.clear();
        if order == self.orientation {
            if major == 0 {
                out.extend(self.data.iter().copied().enumerate());
            }
        } else {
            out.push((0, self.data[major]));
        }
    }

    fn nnz(&self) -> usize {
        self.data.len()
    }
}

impl<T: Element> Target for DenseVector<T> {
    fn is_resizable(&self) -> bool {
        !self.fixed
    }

    fn resize(&mut self, shape: Shape, _preserve: bool) -> Result<(), StorageError> {
        let current = self.shape();
        if shape == current {
            return Ok(());
        }
        if self.fixed {
            return Err(StorageError::FixedExtent { current, requested: shape });
        }
        let len = vector_len(self.orientation, shape)?;
        if len > self.data.len() {
            let extra = len - self.data.len();
            try_reserve(&mut self.data, extra)?;
        }
        // leading elements survive either way
        self.data.resize(len, T::zero());
        Ok(())
    }

    fn reset(&mut self) {
        self.data.iter_mut().for_each(|x| *x = T::zero());
    }

    fn reserve(&mut self, _nonzeros: usize) -> Result<(), StorageError> {
        Ok(())
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row + col] = value;
    }

    fn append(&mut self, row: usize, col: usize, value: T) -> Result<(), StorageError> {
        self.data[row + col] = value;
        Ok(())
    }
}

impl<T: Element> fmt::Display for DenseVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_operand(f, self)
    }
}

/// Length a vector of `orientation` takes for `shape`
pub(crate) fn vector_len(orientation: Orientation, shape: Shape) -> Result<usize, StorageError> {
    match orientation {
        Orientation::ColumnMajor if shape.cols == 1 => Ok(shape.rows),
        Orientation::RowMajor if shape.rows == 1 => Ok(shape.cols),
        _ => Err(StorageError::NotAVectorShape {
            orientation: orientation.vector_name(),
            requested: shape,
        }),
    }
}

// ============ DenseMatrix ============

/// Contiguous matrix in row- or column-major order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix<T> {
    rows: usize,
    cols: usize,
    order: Orientation,
    data: Vec<T>,
    fixed: bool,
}

impl<T: Element> DenseMatrix<T> {
    /// Row-major matrix of zeros
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::zeros_with(rows, cols, Orientation::RowMajor)
    }

    /// Matrix of zeros in the given storage order
    pub fn zeros_with(rows: usize, cols: usize, order: Orientation) -> Self {
        Self { rows, cols, order, data: vec![T::zero(); rows * cols], fixed: false }
    }

    /// Row-major matrix from nested rows; all rows must have the same length
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, AlineaError> {
        Self::from_rows_in(rows, Orientation::RowMajor)
    }

    /// Matrix from nested rows, stored in `order`
    pub fn from_rows_in(rows: Vec<Vec<T>>, order: Orientation) -> Result<Self, AlineaError> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != ncols {
                return Err(AlineaError::dimension_mismatch(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    ncols
                )));
            }
        }
        let mut m = Self::zeros_with(nrows, ncols, order);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                let at = m.offset(r, c);
                m.data[at] = value;
            }
        }
        Ok(m)
    }

    /// Matrix over an existing buffer laid out in `order`
    pub fn from_vec(
        rows: usize,
        cols: usize,
        order: Orientation,
        data: Vec<T>,
    ) -> Result<Self, AlineaError> {
        let shape = Shape::new(rows, cols);
        if shape.checked_len() != Some(data.len()) {
            return Err(AlineaError::dimension_mismatch(format!(
                "{} matrix needs {} elements, got {}",
                shape,
                rows.saturating_mul(cols),
                data.len()
            )));
        }
        Ok(Self { rows, cols, order, data, fixed: false })
    }

    /// Caller guarantees `data.len() == rows * cols`
    pub(crate) fn from_raw(rows: usize, cols: usize, order: Orientation, data: Vec<T>) -> Self {
        Self { rows, cols, order, data, fixed: false }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            let at = m.offset(i, i);
            m.data[at] = T::one();
        }
        m
    }

    /// Builder: refuse any later change of shape
    pub fn with_fixed_extent(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn order(&self) -> Orientation {
        self.order
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        match self.order {
            Orientation::RowMajor => row * self.cols + col,
            Orientation::ColumnMajor => col * self.rows + row,
        }
    }
}

impl<T: Element> Index<(usize, usize)> for DenseMatrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[self.offset(row, col)]
    }
}

impl<T: Element> IndexMut<(usize, usize)> for DenseMatrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        let at = self.offset(row, col);
        &mut self.data[at]
    }
}

impl<T: Element> Operand for DenseMatrix<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    fn orientation(&self) -> Orientation {
        self.order
    }

    fn density(&self) -> Density {
        Density::Dense
    }

    fn kind(&self) -> Kind {
        Kind::Matrix
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> T {
        self.data[self.offset(row, col)]
    }

    fn line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, T)>) {
        out.clear();
        let minors = self.shape().minors(order);
        if order == self.order {
            let start = major * minors;
            out.extend(self.data[start..start + minors].iter().copied().enumerate());
        } else {
            out.extend((0..minors).map(|minor| {
                let (r, c) = order.coords(major, minor);
                (minor, self.get(r, c))
            }));
        }
    }

    fn nnz(&self) -> usize {
        self.data.len()
    }
}

impl<T: Element> Target for DenseMatrix<T> {
    fn is_resizable(&self) -> bool {
        !self.fixed
    }

    fn resize(&mut self, shape: Shape, preserve: bool) -> Result<(), StorageError> {
        let current = self.shape();
        if shape == current {
            return Ok(());
        }
        if self.fixed {
            return Err(StorageError::FixedExtent { current, requested: shape });
        }
        let len = shape.checked_len().ok_or(StorageError::CapacityOverflow { shape })?;
        let mut data = Vec::new();
        try_reserve(&mut data, len)?;
        data.resize(len, T::zero());
        if preserve {
            for r in 0..self.rows.min(shape.rows) {
                for c in 0..self.cols.min(shape.cols) {
                    let at = match self.order {
                        Orientation::RowMajor => r * shape.cols + c,
                        Orientation::ColumnMajor => c * shape.rows + r,
                    };
                    data[at] = self.get(r, c);
                }
            }
        }
        self.rows = shape.rows;
        self.cols = shape.cols;
        self.data = data;
        Ok(())
    }

    fn reset(&mut self) {
        self.data.iter_mut().for_each(|x| *x = T::zero());
    }

    fn reserve(&mut self, _nonzeros: usize) -> Result<(), StorageError> {
        Ok(())
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: T) {
        let at = self.offset(row, col);
        self.data[at] = value;
    }

    fn append(&mut self, row: usize, col: usize, value: T) -> Result<(), StorageError> {
        self.set(row, col, value);
        Ok(())
    }
}

impl<T: Element> fmt::Display for DenseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_operand(f, self)
    }
}
