//! Assignment engine
//!
//! Every statement `dst op= expr` runs the same pipeline: resolve and check
//! shapes, ask the aliasing oracle for a strategy, materialize evaluation
//! boundaries and scalar factors, then hand the tree to one kernel. The
//! destination is only touched in the last step, so any error leaves it as
//! it was.

use crate::alias::{classify, is_aliased, AliasRule, Strategy, Verdict};
use crate::context::{AssignOp, EvalContext};
use crate::eval::materialize;
use crate::expr::IntoExpr;
use crate::kernels::{self, Kernel};
use crate::node::{Factor, Node};
use crate::var::Var;
use alinea_core::resolve::{multiply_kind, resolve_binary};
use alinea_core::{shape_error, AlineaError, Density, Kind, Operand, Result};
use alinea_storage::Store;
use tracing::{debug, trace, warn};

impl EvalContext {
    /// `dst = expr`
    pub fn assign<'a, C: Store + 'a>(
        &mut self,
        dst: &Var<C>,
        expr: impl IntoExpr<'a, C::Elem>,
    ) -> Result<()> {
        self.run(dst, expr, AssignOp::Assign)
    }

    /// `dst += expr`
    pub fn add_assign<'a, C: Store + 'a>(
        &mut self,
        dst: &Var<C>,
        expr: impl IntoExpr<'a, C::Elem>,
    ) -> Result<()> {
        self.run(dst, expr, AssignOp::AddAssign)
    }

    /// `dst -= expr`
    pub fn sub_assign<'a, C: Store + 'a>(
        &mut self,
        dst: &Var<C>,
        expr: impl IntoExpr<'a, C::Elem>,
    ) -> Result<()> {
        self.run(dst, expr, AssignOp::SubAssign)
    }

    /// `dst *= expr`
    ///
    /// Two vectors multiply component-wise and a scalar expression scales.
    /// Anything else is the product `dst * expr`, which must have the shape
    /// of `dst` and is always computed into a temporary.
    pub fn mul_assign<'a, C: Store + 'a>(
        &mut self,
        dst: &Var<C>,
        expr: impl IntoExpr<'a, C::Elem>,
    ) -> Result<()> {
        self.run(dst, expr, AssignOp::MulAssign)
    }

    /// `dst *= s`
    pub fn scale_assign<C: Store>(&mut self, dst: &Var<C>, s: C::Elem) -> Result<()> {
        let node = Node::scale(Node::borrowed(dst), Factor::Value(s))?;
        self.execute(dst, node, AssignOp::Assign, None, AssignOp::MulAssign)
    }

    fn run<'a, C: Store>(
        &mut self,
        dst: &Var<C>,
        expr: impl IntoExpr<'a, C::Elem>,
        op: AssignOp,
    ) -> Result<()> {
        let node = expr
            .into_expr()
            .into_node()
            .map_err(|e| e.with_note(format!("in {}", op.name())))?;

        if node.result_type().kind == Kind::Scalar {
            if op != AssignOp::MulAssign {
                return Err(AlineaError::invalid_argument(format!(
                    "{} of a scalar expression to a {}",
                    op.name(),
                    dst.result_type().describe()
                ))
                .with_suggestion("Use *= to scale by a scalar expression"));
            }
            let s = materialize(node, self.sparse_reserve)?.scalar()?;
            return self.scale_assign(dst, s);
        }

        if op != AssignOp::MulAssign {
            return self.execute(dst, node, op, None, op);
        }

        let dst_ty = dst.result_type();
        let rhs_ty = node.result_type();
        if dst_ty.kind == Kind::Vector && rhs_ty.kind == Kind::Vector {
            return self.execute(dst, node, op, None, op);
        }
        let product = Node::binary(multiply_kind(&dst_ty, &rhs_ty)?, Node::borrowed(dst), node)?;
        if product.result_type().shape != dst_ty.shape {
            return Err(AlineaError::shape_mismatch(
                op.name(),
                dst_ty.shape,
                product.result_type().shape,
            ));
        }
        let forced = Verdict::temporary(AliasRule::ReductionRequiresTemporary);
        self.execute(dst, product, AssignOp::Assign, Some(forced), op)
    }

    /// Check, classify, materialize and write; `label` is the operator the
    /// caller wrote, `op` the one the kernels carry out
    fn execute<C: Store>(
        &mut self,
        dst: &Var<C>,
        node: Node<'_, C::Elem>,
        op: AssignOp,
        forced: Option<Verdict>,
        label: AssignOp,
    ) -> Result<()> {
        let ty = node.result_type();
        let dst_ty = dst.result_type();
        match op.elementwise_kind() {
            None => {
                let target = dst.borrow();
                if !target.accepts_shape(ty.shape) {
                    return Err(shape_error(&*target, ty.shape));
                }
            }
            Some(kind) => {
                resolve_binary(kind, &dst_ty, &ty)?;
            }
        }

        let base = forced.unwrap_or_else(|| classify(&node, dst.id()));
        let mut unchecked = false;
        let verdict = match self.strategy_override {
            None => base,
            Some(s) if s == base.strategy => base,
            Some(Strategy::Temporary) => Verdict { strategy: Strategy::Temporary, rule: base.rule },
            Some(s) if !is_aliased(&node, dst.id()) => Verdict { strategy: s, rule: None },
            Some(s) => {
                if !self.allow_unsafe_override {
                    return Err(AlineaError::invalid_argument(format!(
                        "{:?} write of an expression that reads its destination, which needs {}",
                        s, base
                    ))
                    .with_suggestion("Remove the strategy override or allow unsafe overrides"));
                }
                warn!(op = %label, requested = ?s, required = %base, "unsafe strategy override");
                unchecked = true;
                Verdict { strategy: s, rule: base.rule }
            }
        };

        let reserve = self.sparse_reserve;
        let node = materialize(node, reserve)?;

        let kernel = if unchecked {
            if dst_ty.density == Density::Sparse || ty.shape != dst_ty.shape {
                return Err(AlineaError::invalid_argument(
                    "forced in-place write needs a dense destination of the expression's shape",
                ));
            }
            kernels::inplace::run(dst, &node, op)?
        } else {
            let strategy = match verdict {
                // nothing in the tree reads `dst`
                Verdict { strategy: Strategy::InPlace, rule: None } => Strategy::Direct,
                v => v.strategy,
            };
            match (strategy, dst_ty.density) {
                (Strategy::Direct, Density::Dense) => {
                    kernels::write(&mut *dst.try_borrow_mut()?, &node, op, reserve)?
                }
                (Strategy::Direct, Density::Sparse) if op == AssignOp::Assign => {
                    kernels::write(&mut *dst.try_borrow_mut()?, &node, op, reserve)?
                }
                (Strategy::InPlace, Density::Dense) => {
                    if ty.shape != dst_ty.shape {
                        return Err(AlineaError::shape_mismatch(op.name(), dst_ty.shape, ty.shape));
                    }
                    kernels::inplace::run(dst, &node, op)?
                }
                (Strategy::Temporary, _) if op == AssignOp::Assign => {
                    let (temp, kernel) = kernels::evaluate(&node, reserve)?;
                    dst.try_borrow_mut()?.absorb(temp)?;
                    kernel
                }
                (Strategy::Temporary, Density::Dense) => {
                    let (temp, _) = kernels::evaluate(&node, reserve)?;
                    let temp = Node::owned(temp);
                    kernels::write(&mut *dst.try_borrow_mut()?, &temp, op, reserve)?
                }
                // sparse storage cannot be updated element by element
                _ => rebuild(dst, node, op, reserve)?,
            }
        };

        debug!(op = %label, result = %ty, verdict = %verdict, kernel = ?kernel, "assignment");
        self.record_trace(label, ty, verdict, kernel);
        Ok(())
    }
}

/// Evaluate `dst op expr` into a temporary and move it into `dst`
fn rebuild<C: Store>(
    dst: &Var<C>,
    node: Node<'_, C::Elem>,
    op: AssignOp,
    reserve: bool,
) -> Result<Kernel> {
    trace!(op = %op, "rebuilding sparse destination");
    let combined = match op.elementwise_kind() {
        None => node,
        Some(kind) => Node::binary(kind, Node::borrowed(dst), node)?,
    };
    let (temp, kernel) = kernels::evaluate(&combined, reserve)?;
    dst.try_borrow_mut()?.absorb(temp)?;
    Ok(kernel)
}
