//! Conversions to and from nalgebra

use crate::dense::{DenseMatrix, DenseVector};
use alinea_core::{Element, Operand, Orientation};
use nalgebra::{DMatrix, DVector, Scalar};

impl<T: Element + Scalar> From<&DMatrix<T>> for DenseMatrix<T> {
    fn from(m: &DMatrix<T>) -> Self {
        let (rows, cols) = m.shape();
        // nalgebra stores column-major, so the buffer can be taken as is
        DenseMatrix::from_raw(rows, cols, Orientation::ColumnMajor, m.as_slice().to_vec())
    }
}

impl<T: Element + Scalar> From<&DVector<T>> for DenseVector<T> {
    fn from(v: &DVector<T>) -> Self {
        DenseVector::from_vec(v.as_slice().to_vec())
    }
}

impl<T: Element + Scalar> From<&DenseVector<T>> for DVector<T> {
    fn from(v: &DenseVector<T>) -> Self {
        DVector::from_column_slice(v.as_slice())
    }
}

/// Copy any operand into an nalgebra matrix
pub fn to_dmatrix<T: Element + Scalar>(op: &dyn Operand<Elem = T>) -> DMatrix<T> {
    let shape = op.shape();
    DMatrix::from_fn(shape.rows, shape.cols, |r, c| op.get(r, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseMatrix;

    #[test]
    fn test_dmatrix_round_trip() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let dense = DenseMatrix::from(&m);
        assert_eq!(dense.order(), Orientation::ColumnMajor);
        assert_eq!(dense[(1, 0)], 4.0);
        assert_eq!(to_dmatrix(&dense), m);
    }

    #[test]
    fn test_sparse_to_dmatrix() {
        let s = SparseMatrix::from_triplets(2, 2, Orientation::RowMajor, vec![(0, 1, 3), (1, 0, 4)])
            .unwrap();
        let m = to_dmatrix(&s);
        assert_eq!(m, DMatrix::from_row_slice(2, 2, &[0, 3, 4, 0]));
    }

    #[test]
    fn test_dvector() {
        let v = DVector::from_vec(vec![1, 2, 3]);
        let dense = DenseVector::from(&v);
        assert_eq!(dense.len(), 3);
        assert_eq!(DVector::from(&dense), v);
    }
}
