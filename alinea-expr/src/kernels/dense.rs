//! Dense destination kernels

use super::Kernel;
use crate::context::AssignOp;
use crate::node::Node;
use alinea_core::{Density, Target};

/// `dst = node`; `dst` already has the node's shape
pub fn assign<D: Target + ?Sized>(dst: &mut D, node: &Node<'_, D::Elem>) -> Kernel {
    let ty = node.result_type();
    if ty.density == Density::Sparse {
        dst.reset();
        scatter(dst, node, |_, x| x);
        return Kernel::DenseScatter;
    }
    traverse(dst, node, |_, x| x);
    Kernel::DenseTraverse
}

/// `dst op= node` over equally shaped storage
pub fn compound<D: Target + ?Sized>(dst: &mut D, node: &Node<'_, D::Elem>, op: AssignOp) -> Kernel {
    let sparse = node.result_type().density == Density::Sparse;
    match op {
        AssignOp::AddAssign if sparse => {
            scatter(dst, node, |old, x| old + x);
            Kernel::DenseScatter
        }
        AssignOp::SubAssign if sparse => {
            scatter(dst, node, |old, x| old - x);
            Kernel::DenseScatter
        }
        _ => {
            traverse(dst, node, |old, x| op.combine(old, x));
            Kernel::DenseTraverse
        }
    }
}

/// Visit every element in the destination's storage order
fn traverse<D, F>(dst: &mut D, node: &Node<'_, D::Elem>, combine: F)
where
    D: Target + ?Sized,
    F: Fn(D::Elem, D::Elem) -> D::Elem,
{
    let order = dst.orientation();
    let shape = dst.shape();
    for major in 0..shape.majors(order) {
        for minor in 0..shape.minors(order) {
            let (r, c) = order.coords(major, minor);
            let value = combine(dst.get(r, c), node.get(r, c));
            dst.set(r, c, value);
        }
    }
}

/// Visit only the stored entries of a sparse node, in the node's order
fn scatter<D, F>(dst: &mut D, node: &Node<'_, D::Elem>, combine: F)
where
    D: Target + ?Sized,
    F: Fn(D::Elem, D::Elem) -> D::Elem,
{
    let ty = node.result_type();
    let order = ty.orientation;
    let mut buf = Vec::new();
    for major in 0..ty.shape.majors(order) {
        node.line(major, order, &mut buf);
        for &(minor, x) in &buf {
            let (r, c) = order.coords(major, minor);
            let value = combine(dst.get(r, c), x);
            dst.set(r, c, value);
        }
    }
}
