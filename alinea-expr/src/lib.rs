//! Alinea Expr - Lazy expressions and assignment
//!
//! Builds unevaluated expression trees over Alinea storage and writes them
//! into destinations:
//! - `Expr`, `Node`: operator trees with resolved result types
//! - `Var`: a destination that may also appear in its own expression
//! - `alias`: the oracle deciding direct, in-place or temporary writes
//! - `kernels`: dense traversal, sparse append and in-place loops
//! - `EvalContext`: the assignment entry points, overrides and trace

mod alias;
mod assign;
mod context;
mod eval;
mod expr;
pub mod kernels;
mod node;
mod var;

pub use alias::{can_alias, classify, is_aliased, AliasRule, Strategy, Verdict};
pub use context::{AssignOp, EvalContext, TraceStep};
pub use eval::materialize;
pub use expr::{cross, eval, expr, hadamard, inner, outer, trans, Expr, IntoExpr};
pub use kernels::Kernel;
pub use node::{Factor, Leaf, Node, Op};
pub use var::Var;

/// Everything needed to write expressions
pub mod prelude {
    pub use crate::{
        cross, eval, expr, hadamard, inner, outer, trans, AssignOp, EvalContext, Expr, IntoExpr,
        Strategy, Var, Verdict,
    };
    pub use alinea_core::prelude::*;
    pub use alinea_storage::{Container, DenseMatrix, DenseVector, SparseMatrix, SparseVector};
}
