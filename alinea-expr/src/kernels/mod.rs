//! Evaluation kernels
//!
//! - [`dense`]: traversal and scatter into dense storage
//! - [`sparse`]: in-order append into sparse storage
//! - [`inplace`]: element-by-element read-then-write on a shared destination

pub mod dense;
pub mod inplace;
pub mod sparse;

use crate::context::AssignOp;
use crate::node::Node;
use alinea_core::{AlineaError, Density, Element, Result, Target};
use alinea_storage::Container;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Which loop wrote the destination (or the temporary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kernel {
    /// Every element, walked in the destination's storage order
    DenseTraverse,
    /// Stored entries of a sparse result scattered into dense storage
    DenseScatter,
    /// Sparse destination cleared and rebuilt by in-order append
    SparseAppend,
    /// Per-element read-then-write on a destination the expression reads
    ElementwiseInPlace,
}

/// Write `node` into a destination nothing in `node` reads
///
/// Plain assignment resizes the destination first; compound operators
/// require the shapes to match already.
pub fn write<D: Target + ?Sized>(
    dst: &mut D,
    node: &Node<'_, D::Elem>,
    op: AssignOp,
    reserve: bool,
) -> Result<Kernel> {
    let shape = node.result_type().shape;
    match (op, dst.density()) {
        (AssignOp::Assign, Density::Dense) => {
            dst.resize(shape, false)?;
            Ok(dense::assign(dst, node))
        }
        (AssignOp::Assign, Density::Sparse) => {
            // reserve before anything is cleared
            if reserve {
                dst.reserve(node.nnz_estimate())?;
            }
            dst.resize(shape, false)?;
            Ok(sparse::assign(dst, node, reserve)?)
        }
        (_, Density::Dense) => {
            if dst.shape() != shape {
                return Err(AlineaError::shape_mismatch(op.name(), dst.shape(), shape));
            }
            Ok(dense::compound(dst, node, op))
        }
        (_, Density::Sparse) => Err(AlineaError::invalid_argument(format!(
            "{} into sparse storage needs a rebuilt destination",
            op.name()
        ))),
    }
}

/// Compute `node` into fresh storage of its own result type
pub fn evaluate<T: Element>(node: &Node<'_, T>, reserve: bool) -> Result<(Container<T>, Kernel)> {
    let ty = node.result_type();
    trace!(result = %ty, "allocating temporary");
    let mut temp = Container::for_result(ty)?;
    let kernel = write(&mut temp, node, AssignOp::Assign, reserve)?;
    Ok((temp, kernel))
}
