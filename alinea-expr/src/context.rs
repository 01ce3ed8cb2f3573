//! Evaluation context

use crate::alias::{Strategy, Verdict};
use crate::kernels::Kernel;
use alinea_core::{Element, OpKind, ResultType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Assignment operator of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AssignOp::Assign => "assignment",
            AssignOp::AddAssign => "addition assignment",
            AssignOp::SubAssign => "subtraction assignment",
            AssignOp::MulAssign => "multiplication assignment",
        }
    }

    /// Element-wise operation `dst op= x` performs; `None` for plain assignment
    pub fn elementwise_kind(self) -> Option<OpKind> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(OpKind::Add),
            AssignOp::SubAssign => Some(OpKind::Sub),
            AssignOp::MulAssign => Some(OpKind::ElemMul),
        }
    }

    #[inline]
    pub(crate) fn combine<T: Element>(self, old: T, x: T) -> T {
        match self {
            AssignOp::Assign => x,
            AssignOp::AddAssign => old + x,
            AssignOp::SubAssign => old - x,
            AssignOp::MulAssign => old * x,
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Evaluation context passed to assignments
pub struct EvalContext {
    pub tracing: bool,
    pub trace: Vec<TraceStep>,
    /// Reserve sparse destinations from a non-zero estimate before appending
    pub sparse_reserve: bool,
    /// Diagnostic override of the oracle's strategy
    pub strategy_override: Option<Strategy>,
    /// Permit an override that reads the destination after overwriting it
    pub allow_unsafe_override: bool,
}

/// Single assignment in the trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStep {
    pub op: AssignOp,
    pub result: ResultType,
    pub verdict: Verdict,
    pub kernel: Kernel,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    pub fn new() -> Self {
        Self {
            tracing: false,
            trace: Vec::new(),
            sparse_reserve: true,
            strategy_override: None,
            allow_unsafe_override: false,
        }
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing = enabled;
        self
    }

    pub fn with_sparse_reserve(mut self, enabled: bool) -> Self {
        self.sparse_reserve = enabled;
        self
    }

    pub fn with_strategy_override(mut self, strategy: Option<Strategy>) -> Self {
        self.strategy_override = strategy;
        self
    }

    pub fn allow_unsafe_override(mut self, allowed: bool) -> Self {
        self.allow_unsafe_override = allowed;
        self
    }

    pub fn record_trace(&mut self, op: AssignOp, result: ResultType, verdict: Verdict, kernel: Kernel) {
        if self.tracing {
            self.trace.push(TraceStep { op, result, verdict, kernel });
        }
    }

    /// Most recent trace step
    pub fn last_step(&self) -> Option<&TraceStep> {
        self.trace.last()
    }
}
