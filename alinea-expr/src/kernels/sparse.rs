//! Sparse destination kernel

use super::Kernel;
use crate::node::Node;
use alinea_core::{StorageError, Target};

/// Rebuild `dst` from `node` by appending line after line in the
/// destination's order; `dst` already has the node's shape
pub fn assign<D: Target + ?Sized>(
    dst: &mut D,
    node: &Node<'_, D::Elem>,
    reserve: bool,
) -> Result<Kernel, StorageError> {
    if reserve {
        dst.reserve(node.nnz_estimate())?;
    }
    dst.reset();
    let order = dst.orientation();
    let shape = node.result_type().shape;
    let mut buf = Vec::new();
    for major in 0..shape.majors(order) {
        node.line(major, order, &mut buf);
        for &(minor, value) in &buf {
            let (r, c) = order.coords(major, minor);
            dst.append(r, c, value)?;
        }
    }
    Ok(Kernel::SparseAppend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alinea_core::{OpKind, Operand, Orientation};
    use alinea_storage::{DenseMatrix, SparseMatrix, SparseVector};

    #[test]
    fn test_rebuild_in_destination_order() {
        let a = SparseMatrix::from_triplets(
            2,
            3,
            Orientation::RowMajor,
            vec![(0, 2, 1), (1, 0, 2), (1, 2, 3)],
        )
        .unwrap();
        let mut dst = SparseMatrix::new_with(2, 3, Orientation::ColumnMajor);
        dst.insert(0, 0, 42).unwrap();
        assign(&mut dst, &Node::borrowed(&a), true).unwrap();
        assert_eq!(dst.to_rows(), a.to_rows());
        assert_eq!(dst.nnz(), 3);
    }

    #[test]
    fn test_dense_source_stores_everything() {
        let d = DenseMatrix::from_rows(vec![vec![0, 1]]).unwrap();
        let mut dst = SparseMatrix::new(1, 2);
        assign(&mut dst, &Node::borrowed(&d), false).unwrap();
        assert_eq!(dst.nnz(), 2);
    }

    #[test]
    fn test_transposed_vector() {
        let v = SparseVector::from_entries(3, vec![(1, 5)]).unwrap();
        let t = Node::unary(OpKind::Trans, Node::borrowed(&v)).unwrap();
        let mut dst = SparseVector::new_row(3);
        assign(&mut dst, &t, true).unwrap();
        assert_eq!(dst.entries(), &[(1, 5)]);
    }
}
