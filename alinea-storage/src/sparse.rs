//! Compressed sparse vector and matrix storage
//!
//! Entries are kept sorted by index within each line. A stored entry may
//! hold an explicit zero; nothing here ever drops entries by value.

use crate::dense::vector_len;
use alinea_core::{
    try_reserve, write_operand, AlineaError, Density, Element, Kind, Operand, Orientation,
    Shape, StorageError, Target,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Insert or overwrite `(index, value)` in a line sorted by index
fn put<T>(line: &mut Vec<(usize, T)>, index: usize, value: T) {
    match line.binary_search_by_key(&index, |e| e.0) {
        Ok(pos) => line[pos].1 = value,
        Err(pos) => line.insert(pos, (index, value)),
    }
}

fn find<T: Element>(line: &[(usize, T)], index: usize) -> T {
    match line.binary_search_by_key(&index, |e| e.0) {
        Ok(pos) => line[pos].1,
        Err(_) => T::zero(),
    }
}

// ============ SparseVector ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector<T> {
    len: usize,
    orientation: Orientation,
    entries: Vec<(usize, T)>,
    fixed: bool,
}

impl<T: Element> SparseVector<T> {
    /// Empty column vector of length `len`
    pub fn new(len: usize) -> Self {
        Self { len, orientation: Orientation::ColumnMajor, entries: Vec::new(), fixed: false }
    }

    /// Empty row vector of length `len`
    pub fn new_row(len: usize) -> Self {
        Self { len, orientation: Orientation::RowMajor, entries: Vec::new(), fixed: false }
    }

    /// Column vector from `(index, value)` pairs in any order
    pub fn from_entries(len: usize, entries: Vec<(usize, T)>) -> Result<Self, AlineaError> {
        let mut v = Self::new(len);
        for (index, value) in entries {
            v.insert(index, value)?;
        }
        Ok(v)
    }

    /// Column vector storing the non-zero elements of `values`
    pub fn from_dense(values: &[T]) -> Self {
        let entries = values
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, x)| !x.is_zero())
            .collect();
        Self { len: values.len(), orientation: Orientation::ColumnMajor, entries, fixed: false }
    }

    /// Same vector, transposed in place (column becomes row)
    pub fn into_row(mut self) -> Self {
        self.orientation = Orientation::RowMajor;
        self
    }

    /// Builder: refuse any later change of length
    pub fn with_fixed_extent(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Store `value` at `index`, overwriting any existing entry
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), StorageError> {
        if index >= self.len {
            let (row, col) = self.coords(index);
            return Err(StorageError::IndexOutOfBounds { row, col, shape: self.shape() });
        }
        put(&mut self.entries, index, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stored entries in increasing index order
    pub fn entries(&self) -> &[(usize, T)] {
        &self.entries
    }

    fn coords(&self, index: usize) -> (usize, usize) {
        match self.orientation {
            Orientation::ColumnMajor => (index, 0),
            Orientation::RowMajor => (0, index),
        }
    }
}

impl<T: Element> Operand for SparseVector<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        Shape::vector(self.len, self.orientation)
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn density(&self) -> Density {
        Density::Sparse
    }

    fn kind(&self) -> Kind {
        Kind::Vector
    }

    fn get(&self, row: usize, col: usize) -> T {
        find(&self.entries, row + col)
    }

    fn line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, T)>) {
        out.clear();
        if order == self.orientation {
            if major == 0 {
                out.extend_from_slice(&self.entries);
            }
        } else if let Ok(pos) = self.entries.binary_search_by_key(&major, |e| e.0) {
            out.push((0, self.entries[pos].1));
        }
    }

    fn nnz(&self) -> usize {
        self.entries.len()
    }
}

impl<T: Element> Target for SparseVector<T> {
    fn is_resizable(&self) -> bool {
        !self.fixed
    }

    fn resize(&mut self, shape: Shape, preserve: bool) -> Result<(), StorageError> {
        let current = self.shape();
        if shape == current {
            if !preserve {
                self.entries.clear();
            }
            return Ok(());
        }
        if self.fixed {
            return Err(StorageError::FixedExtent { current, requested: shape });
        }
        let len = vector_len(self.orientation, shape)?;
        if preserve {
            self.entries.retain(|e| e.0 < len);
        } else {
            self.entries.clear();
        }
        self.len = len;
        Ok(())
    }

    fn reset(&mut self) {
        self.entries.clear();
    }

    fn reserve(&mut self, nonzeros: usize) -> Result<(), StorageError> {
        let extra = nonzeros.saturating_sub(self.entries.len());
        try_reserve(&mut self.entries, extra)
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        put(&mut self.entries, row + col, value);
    }

    fn append(&mut self, row: usize, col: usize, value: T) -> Result<(), StorageError> {
        let index = row + col;
        if let Some(&(last, _)) = self.entries.last() {
            if last >= index {
                return Err(StorageError::OutOfOrderAppend { row, col, last });
            }
        }
        self.entries.push((index, value));
        Ok(())
    }
}

impl<T: Element> fmt::Display for SparseVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_operand(f, self)
    }
}

// ============ SparseMatrix ============

/// Compressed sparse matrix: one sorted entry list per row (row-major)
/// or per column (column-major)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix<T> {
    rows: usize,
    cols: usize,
    order: Orientation,
    lines: Vec<Vec<(usize, T)>>,
    fixed: bool,
}

impl<T: Element> SparseMatrix<T> {
    /// Empty row-major matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::new_with(rows, cols, Orientation::RowMajor)
    }

    /// Empty matrix in the given storage order
    pub fn new_with(rows: usize, cols: usize, order: Orientation) -> Self {
        let majors = Shape::new(rows, cols).majors(order);
        Self { rows, cols, order, lines: vec![Vec::new(); majors], fixed: false }
    }

    /// Matrix from `(row, col, value)` triplets; a later duplicate
    /// overwrites an earlier one
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        order: Orientation,
        triplets: Vec<(usize, usize, T)>,
    ) -> Result<Self, AlineaError> {
        let mut m = Self::new_with(rows, cols, order);
        for (r, c, value) in triplets {
            m.insert(r, c, value)?;
        }
        Ok(m)
    }

    /// Matrix storing the non-zero elements of any operand
    pub fn from_operand(src: &dyn Operand<Elem = T>, order: Orientation) -> Self {
        let shape = src.shape();
        let mut m = Self::new_with(shape.rows, shape.cols, order);
        let mut buf = Vec::new();
        for (major, line) in m.lines.iter_mut().enumerate() {
            src.line(major, order, &mut buf);
            line.extend(buf.iter().copied().filter(|(_, x)| !x.is_zero()));
        }
        m
    }

    /// Builder: refuse any later change of shape
    pub fn with_fixed_extent(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Store `value` at (row, col), overwriting any existing entry
    pub fn insert(&mut self, row: usize, col: usize, value: T) -> Result<(), StorageError> {
        if row >= self.rows || col >= self.cols {
            return Err(StorageError::IndexOutOfBounds { row, col, shape: self.shape() });
        }
        self.set(row, col, value);
        Ok(())
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

    /// All stored entries as (row, col, value), line by line
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.lines.iter().enumerate().flat_map(move |(major, line)| {
            line.iter().map(move |&(minor, value)| {
                let (r, c) = self.order.coords(major, minor);
                (r, c, value)
            })
        })
    }
}

impl<T: Element> Operand for SparseMatrix<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    fn orientation(&self) -> Orientation {
        self.order
    }

    fn density(&self) -> Density {
        Density::Sparse
    }

    fn kind(&self) -> Kind {
        Kind::Matrix
    }

    fn get(&self, row: usize, col: usize) -> T {
        let (major, minor) = self.order.split(row, col);
        find(&self.lines[major], minor)
    }

    fn line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, T)>) {
        out.clear();
        if order == self.order {
            out.extend_from_slice(&self.lines[major]);
            return;
        }
        // cross-order line: one lookup per stored line
        for (m, line) in self.lines.iter().enumerate() {
            if let Ok(pos) = line.binary_search_by_key(&major, |e| e.0) {
                out.push((m, line[pos].1));
            }
        }
    }

    fn nnz(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }
}

impl<T: Element> Target for SparseMatrix<T> {
    fn is_resizable(&self) -> bool {
        !self.fixed
    }

    fn resize(&mut self, shape: Shape, preserve: bool) -> Result<(), StorageError> {
        let current = self.shape();
        if shape != current && self.fixed {
            return Err(StorageError::FixedExtent { current, requested: shape });
        }
        let majors = shape.majors(self.order);
        let minors = shape.minors(self.order);
        if majors > self.lines.len() {
            let extra = majors - self.lines.len();
            try_reserve(&mut self.lines, extra)?;
        }
        if !preserve {
            self.reset();
        }
        self.lines.resize_with(majors, Vec::new);
        if preserve {
            for line in &mut self.lines {
                line.retain(|e| e.0 < minors);
            }
        }
        self.rows = shape.rows;
        self.cols = shape.cols;
        Ok(())
    }

    fn reset(&mut self) {
        self.lines.iter_mut().for_each(Vec::clear);
    }

    fn reserve(&mut self, nonzeros: usize) -> Result<(), StorageError> {
        if self.lines.is_empty() {
            return Ok(());
        }
        let per_line = nonzeros.div_ceil(self.lines.len());
        for line in &mut self.lines {
            let extra = per_line.saturating_sub(line.len());
            try_reserve(line, extra)?;
        }
        Ok(())
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        let (major, minor) = self.order.split(row, col);
        put(&mut self.lines[major], minor, value);
    }

    fn append(&mut self, row: usize, col: usize, value: T) -> Result<(), StorageError> {
        let (major, minor) = self.order.split(row, col);
        let line = &mut self.lines[major];
        if let Some(&(last, _)) = line.last() {
            if last >= minor {
                return Err(StorageError::OutOfOrderAppend { row, col, last });
            }
        }
        line.push((minor, value));
        Ok(())
    }
}

impl<T: Element> fmt::Display for SparseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_operand(f, self)
    }
}
