//! Read-then-write kernel for destinations the expression also reads
//!
//! Each element is computed from the current contents, then written, one
//! index at a time in the destination's storage order. This is only
//! correct when element (i, j) of the expression reads nothing but element
//! (i, j) of the destination, which the aliasing oracle establishes.

use super::Kernel;
use crate::context::AssignOp;
use crate::node::Node;
use crate::var::Var;
use alinea_core::{Operand, Result, Target};

pub fn run<C: Target>(dst: &Var<C>, node: &Node<'_, C::Elem>, op: AssignOp) -> Result<Kernel> {
    let order = dst.orientation();
    let shape = dst.shape();
    for major in 0..shape.majors(order) {
        for minor in 0..shape.minors(order) {
            let (r, c) = order.coords(major, minor);
            let x = node.get(r, c);
            let value = match op {
                AssignOp::Assign => x,
                _ => op.combine(dst.get(r, c), x),
            };
            dst.try_borrow_mut()?.set(r, c, value);
        }
    }
    Ok(Kernel::ElementwiseInPlace)
}
