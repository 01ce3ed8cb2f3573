//! Fused evaluation
//!
//! `get` computes a single element by walking the tree; `line` produces the
//! stored entries of one row or column of a sparse result. Neither caches
//! anything: a product inside a sum is recomputed for every element it
//! contributes to, which is why product operands that are products
//! themselves get an `Eval` boundary at construction.
//!
//! Products always accumulate in increasing inner index, whichever operand
//! drives the iteration, so dense and sparse kernels agree bit for bit.

use crate::kernels;
use crate::node::{Factor, Leaf, Node, Op};
use alinea_core::{AlineaError, Density, Element, OpKind, Orientation, Result};
use std::collections::BTreeMap;
use tracing::trace;

impl<'a, T: Element> Node<'a, T> {
    /// Element (row, col) of the result
    pub fn get(&self, row: usize, col: usize) -> T {
        match &self.op {
            Op::Leaf(leaf) => leaf.operand().get(row, col),
            Op::Unary(OpKind::Neg, x) => x.get(row, col).negate(),
            Op::Unary(OpKind::Trans, x) => x.get(col, row),
            Op::Unary(_, x) => x.get(row, col),
            Op::Scale(x, factor) => x.get(row, col) * factor.value(),
            Op::Binary(k, l, r) => match k {
                OpKind::Add => l.get(row, col) + r.get(row, col),
                OpKind::Sub => l.get(row, col) - r.get(row, col),
                OpKind::ElemMul => l.get(row, col) * r.get(row, col),
                OpKind::Cross => cross_at(l, r, row + col),
                OpKind::Inner => inner(l, r),
                _ => product_at(l, r, row, col),
            },
        }
    }

    /// Clear `out` and fill it with the entries of line `major` in `order`
    ///
    /// Sparse results report their structural entries; dense results report
    /// every element.
    pub fn line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, T)>) {
        out.clear();
        if self.ty.density == Density::Dense {
            self.dense_line(major, order, out);
            return;
        }
        match &self.op {
            Op::Leaf(leaf) => leaf.operand().line(major, order, out),
            Op::Unary(OpKind::Trans, x) => x.line(major, order.flip(), out),
            Op::Unary(OpKind::Neg, x) => {
                x.line(major, order, out);
                out.iter_mut().for_each(|e| e.1 = e.1.negate());
            }
            Op::Unary(_, x) => x.line(major, order, out),
            Op::Scale(x, factor) => {
                let s = factor.value();
                x.line(major, order, out);
                out.iter_mut().for_each(|e| e.1 = e.1 * s);
            }
            Op::Binary(k, l, r) => match k {
                OpKind::Add | OpKind::Sub => merge_line(*k, l, r, major, order, out),
                OpKind::ElemMul => elem_mul_line(l, r, major, order, out),
                OpKind::MatVec | OpKind::VecMat | OpKind::MatMat | OpKind::Outer => {
                    product_line(l, r, major, order, out)
                }
                _ => self.dense_line(major, order, out),
            },
        }
    }

    fn dense_line(&self, major: usize, order: Orientation, out: &mut Vec<(usize, T)>) {
        let minors = self.ty.shape.minors(order);
        out.extend((0..minors).map(|minor| {
            let (r, c) = order.coords(major, minor);
            (minor, self.get(r, c))
        }));
    }

    /// Value of a scalar-kind node
    pub fn scalar(&self) -> Result<T> {
        match &self.op {
            Op::Binary(OpKind::Inner, l, r) => Ok(inner(l, r)),
            _ => Err(AlineaError::invalid_argument(format!(
                "{} is not a scalar expression",
                self.ty.describe()
            ))),
        }
    }

    /// Element `i` of a vector-kind node
    fn at(&self, i: usize) -> T {
        match self.ty.orientation {
            Orientation::ColumnMajor => self.get(i, 0),
            Orientation::RowMajor => self.get(0, i),
        }
    }

    /// Stored entries of a vector-kind node as (position, value)
    fn entries(&self, out: &mut Vec<(usize, T)>) {
        self.line(0, self.ty.orientation, out);
    }
}

impl<T: Element> Factor<'_, T> {
    fn value(&self) -> T {
        match self {
            Factor::Value(v) => *v,
            Factor::Inner(l, r) => inner(l, r),
        }
    }
}

/// sum_k L(row, k) * R(k, col), k increasing
fn product_at<T: Element>(l: &Node<'_, T>, r: &Node<'_, T>, row: usize, col: usize) -> T {
    let mut acc = T::zero();
    if l.ty.density == Density::Sparse {
        let mut buf = Vec::new();
        l.line(row, Orientation::RowMajor, &mut buf);
        for (k, lv) in buf {
            acc = acc + lv * r.get(k, col);
        }
    } else if r.ty.density == Density::Sparse {
        let mut buf = Vec::new();
        r.line(col, Orientation::ColumnMajor, &mut buf);
        for (k, rv) in buf {
            acc = acc + l.get(row, k) * rv;
        }
    } else {
        for k in 0..l.ty.shape.cols {
            acc = acc + l.get(row, k) * r.get(k, col);
        }
    }
    acc
}

/// Line of a sparse product, accumulated per output index
fn product_line<T: Element>(
    l: &Node<'_, T>,
    r: &Node<'_, T>,
    major: usize,
    order: Orientation,
    out: &mut Vec<(usize, T)>,
) {
    let mut acc: BTreeMap<usize, T> = BTreeMap::new();
    let mut outer = Vec::new();
    let mut inner = Vec::new();
    match order {
        Orientation::RowMajor => {
            l.line(major, Orientation::RowMajor, &mut outer);
            for &(k, lv) in &outer {
                r.line(k, Orientation::RowMajor, &mut inner);
                for &(j, rv) in &inner {
                    let slot = acc.entry(j).or_insert_with(T::zero);
                    *slot = *slot + lv * rv;
                }
            }
        }
        Orientation::ColumnMajor => {
            r.line(major, Orientation::ColumnMajor, &mut outer);
            for &(k, rv) in &outer {
                l.line(k, Orientation::ColumnMajor, &mut inner);
                for &(i, lv) in &inner {
                    let slot = acc.entry(i).or_insert_with(T::zero);
                    *slot = *slot + lv * rv;
                }
            }
        }
    }
    out.extend(acc);
}

/// Union of two sparse lines
fn merge_line<T: Element>(
    op: OpKind,
    l: &Node<'_, T>,
    r: &Node<'_, T>,
    major: usize,
    order: Orientation,
    out: &mut Vec<(usize, T)>,
) {
    let mut a = Vec::new();
    let mut b = Vec::new();
    l.line(major, order, &mut a);
    r.line(major, order, &mut b);
    let rhs = |x: T| if op == OpKind::Sub { x.negate() } else { x };
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (ia, va) = a[i];
        let (ib, vb) = b[j];
        if ia == ib {
            let v = if op == OpKind::Sub { va - vb } else { va + vb };
            out.push((ia, v));
            i += 1;
            j += 1;
        } else if ia < ib {
            out.push((ia, va));
            i += 1;
        } else {
            out.push((ib, rhs(vb)));
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend(b[j..].iter().map(|&(ib, vb)| (ib, rhs(vb))));
}

/// Component-wise product line: intersection when both sides are sparse,
/// otherwise the sparse side's structure
fn elem_mul_line<T: Element>(
    l: &Node<'_, T>,
    r: &Node<'_, T>,
    major: usize,
    order: Orientation,
    out: &mut Vec<(usize, T)>,
) {
    let (sparse, other, sparse_left) = if l.ty.density == Density::Sparse {
        (l, r, true)
    } else {
        (r, l, false)
    };
    sparse.line(major, order, out);
    if other.ty.density == Density::Sparse {
        let mut b = Vec::new();
        other.line(major, order, &mut b);
        let mut j = 0;
        out.retain_mut(|e| {
            while j < b.len() && b[j].0 < e.0 {
                j += 1;
            }
            if j < b.len() && b[j].0 == e.0 {
                e.1 = e.1 * b[j].1;
                true
            } else {
                false
            }
        });
        return;
    }
    for e in out.iter_mut() {
        let (row, col) = order.coords(major, e.0);
        let v = other.get(row, col);
        e.1 = if sparse_left { e.1 * v } else { v * e.1 };
    }
}

/// Inner product of two vectors, position by position
fn inner<T: Element>(l: &Node<'_, T>, r: &Node<'_, T>) -> T {
    let mut acc = T::zero();
    if l.ty.density == Density::Sparse {
        let mut buf = Vec::new();
        l.entries(&mut buf);
        for (i, lv) in buf {
            acc = acc + lv * r.at(i);
        }
    } else if r.ty.density == Density::Sparse {
        let mut buf = Vec::new();
        r.entries(&mut buf);
        for (i, rv) in buf {
            acc = acc + l.at(i) * rv;
        }
    } else {
        for i in 0..l.ty.len() {
            acc = acc + l.at(i) * r.at(i);
        }
    }
    acc
}

fn cross_at<T: Element>(a: &Node<'_, T>, b: &Node<'_, T>, i: usize) -> T {
    match i {
        0 => a.at(1) * b.at(2) - a.at(2) * b.at(1),
        1 => a.at(2) * b.at(0) - a.at(0) * b.at(2),
        _ => a.at(0) * b.at(1) - a.at(1) * b.at(0),
    }
}

/// Replace every `Eval` subtree by its computed value and every scalar
/// factor by a number, innermost first. Runs before anything is written
/// to the destination.
pub fn materialize<'a, T: Element>(node: Node<'a, T>, reserve: bool) -> Result<Node<'a, T>> {
    let ty = node.ty;
    let op = match node.op {
        Op::Leaf(leaf) => Op::Leaf(leaf),
        Op::Unary(OpKind::Eval, x) => {
            let x = materialize(*x, reserve)?;
            trace!(result = %ty, "materializing evaluation boundary");
            let (value, _) = kernels::evaluate(&x, reserve)?;
            Op::Leaf(Leaf::Owned(value))
        }
        Op::Unary(k, x) => Op::Unary(k, Box::new(materialize(*x, reserve)?)),
        Op::Binary(k, l, r) => Op::Binary(
            k,
            Box::new(materialize(*l, reserve)?),
            Box::new(materialize(*r, reserve)?),
        ),
        Op::Scale(x, factor) => {
            let factor = match factor {
                Factor::Value(v) => Factor::Value(v),
                Factor::Inner(l, r) => {
                    let l = materialize(*l, reserve)?;
                    let r = materialize(*r, reserve)?;
                    Factor::Value(inner(&l, &r))
                }
            };
            Op::Scale(Box::new(materialize(*x, reserve)?), factor)
        }
    };
    Ok(Node { op, ty })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alinea_core::Operand;
    use alinea_storage::{DenseMatrix, DenseVector, SparseMatrix, SparseVector};

    fn dense(rows: Vec<Vec<i64>>) -> DenseMatrix<i64> {
        DenseMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_fused_sum_of_product() {
        let a = dense(vec![vec![1, 2], vec![3, 4]]);
        let b = dense(vec![vec![5, 6], vec![7, 8]]);
        let ab = Node::binary(OpKind::MatMat, Node::borrowed(&a), Node::borrowed(&b)).unwrap();
        let sum = Node::binary(OpKind::Add, ab, Node::borrowed(&a)).unwrap();
        assert_eq!(sum.get(0, 0), 1 * 5 + 2 * 7 + 1);
        assert_eq!(sum.get(1, 1), 3 * 6 + 4 * 8 + 4);
    }

    #[test]
    fn test_sparse_product_line_matches_get() {
        let a = SparseMatrix::from_triplets(
            2,
            3,
            Orientation::RowMajor,
            vec![(0, 0, 2), (0, 2, -1), (1, 1, 3)],
        )
        .unwrap();
        let b = SparseMatrix::from_triplets(
            3,
            2,
            Orientation::ColumnMajor,
            vec![(0, 1, 4), (2, 0, 5), (2, 1, 1)],
        )
        .unwrap();
        let ab = Node::binary(OpKind::MatMat, Node::borrowed(&a), Node::borrowed(&b)).unwrap();
        assert_eq!(ab.result_type().density, Density::Sparse);

        let mut buf = Vec::new();
        for order in [Orientation::RowMajor, Orientation::ColumnMajor] {
            for major in 0..ab.result_type().shape.majors(order) {
                ab.line(major, order, &mut buf);
                for &(minor, v) in &buf {
                    let (r, c) = order.coords(major, minor);
                    assert_eq!(v, ab.get(r, c));
                }
            }
        }
        ab.line(0, Orientation::RowMajor, &mut buf);
        assert_eq!(buf, vec![(0, -5), (1, 7)]);
    }

    #[test]
    fn test_sparse_sum_keeps_union() {
        let a = SparseVector::from_entries(4, vec![(0, 1), (2, 5)]).unwrap();
        let b = SparseVector::from_entries(4, vec![(2, 5), (3, 2)]).unwrap();
        let d = Node::binary(OpKind::Sub, Node::borrowed(&a), Node::borrowed(&b)).unwrap();
        let mut buf = Vec::new();
        d.line(0, Orientation::ColumnMajor, &mut buf);
        // the cancelled entry stays as an explicit zero
        assert_eq!(buf, vec![(0, 1), (2, 0), (3, -2)]);
    }

    #[test]
    fn test_elem_mul_intersection() {
        let a = SparseVector::from_entries(4, vec![(0, 2), (2, 5)]).unwrap();
        let b = SparseVector::from_entries(4, vec![(2, 3), (3, 2)]).unwrap();
        let p = Node::binary(OpKind::ElemMul, Node::borrowed(&a), Node::borrowed(&b)).unwrap();
        let mut buf = Vec::new();
        p.line(0, Orientation::ColumnMajor, &mut buf);
        assert_eq!(buf, vec![(2, 15)]);

        let d = DenseVector::from_vec(vec![1, 1, 4, 1]);
        let p = Node::binary(OpKind::ElemMul, Node::borrowed(&d), Node::borrowed(&a)).unwrap();
        p.line(0, Orientation::ColumnMajor, &mut buf);
        assert_eq!(buf, vec![(0, 2), (2, 20)]);
    }

    #[test]
    fn test_transpose_line() {
        let a = SparseMatrix::from_triplets(2, 3, Orientation::RowMajor, vec![(0, 2, 9), (1, 2, 8)])
            .unwrap();
        let t = Node::unary(OpKind::Trans, Node::borrowed(&a)).unwrap();
        let mut buf = Vec::new();
        t.line(2, Orientation::RowMajor, &mut buf);
        assert_eq!(buf, vec![(0, 9), (1, 8)]);
        assert_eq!(t.get(2, 1), 8);
    }

    #[test]
    fn test_inner_and_cross() {
        let row = DenseVector::row_from_vec(vec![1, 2, 3]);
        let col = SparseVector::from_entries(3, vec![(0, 4), (2, 6)]).unwrap();
        let dot = Node::binary(OpKind::Inner, Node::borrowed(&row), Node::borrowed(&col)).unwrap();
        assert_eq!(dot.scalar().unwrap(), 22);

        let a = DenseVector::from_vec(vec![1, 0, 0]);
        let b = DenseVector::from_vec(vec![0, 1, 0]);
        let c = Node::binary(OpKind::Cross, Node::borrowed(&a), Node::borrowed(&b)).unwrap();
        assert_eq!((c.get(0, 0), c.get(1, 0), c.get(2, 0)), (0, 0, 1));
    }

    #[test]
    fn test_materialize_replaces_eval() {
        let a = dense(vec![vec![1, 1], vec![0, 1]]);
        let ab = Node::binary(OpKind::MatMat, Node::borrowed(&a), Node::borrowed(&a)).unwrap();
        let abc = Node::binary(OpKind::MatMat, ab, Node::borrowed(&a)).unwrap();
        let m = materialize(abc, true).unwrap();
        assert!(m.children()[0].is_leaf());
        // [[1,1],[0,1]]^3 = [[1,3],[0,1]]
        assert_eq!(m.get(0, 1), 3);
        assert_eq!(a.get(0, 1), 1);
    }

    #[test]
    fn test_materialize_scalar_factor() {
        let row = DenseVector::row_from_vec(vec![1, 2]);
        let col = DenseVector::from_vec(vec![3, 4]);
        let dot = Node::binary(OpKind::Inner, Node::borrowed(&row), Node::borrowed(&col)).unwrap();
        let scaled = Node::scale(Node::borrowed(&col), Factor::inner(dot).unwrap()).unwrap();
        let m = materialize(scaled, true).unwrap();
        assert!(matches!(m.op, Op::Scale(_, Factor::Value(11))));
        assert_eq!(m.get(1, 0), 44);
    }
}
