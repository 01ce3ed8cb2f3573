//! Expression nodes
//!
//! A node is an unevaluated operation together with its resolved
//! [`ResultType`]. Building a node runs the resolution table, so every
//! node that exists has operands of compatible shapes; nothing is
//! computed until an assignment (or [`crate::Expr::evaluate`]) walks the
//! tree.

use alinea_core::resolve::{resolve_binary, resolve_unary};
use alinea_core::{AlineaError, Element, OpKind, Operand, Result, ResultType};
use alinea_storage::Container;
use std::fmt;

/// Where a leaf's data lives
pub enum Leaf<'a, T: Element> {
    /// Operand that outlives the expression
    Borrowed(&'a dyn Operand<Elem = T>),
    /// Value moved into the expression, e.g. a materialized sub-expression
    Owned(Container<T>),
}

impl<'a, T: Element> Leaf<'a, T> {
    pub fn operand(&self) -> &dyn Operand<Elem = T> {
        match self {
            Leaf::Borrowed(op) => *op,
            Leaf::Owned(c) => c.as_operand(),
        }
    }
}

/// Multiplier of a scaling node
pub enum Factor<'a, T: Element> {
    Value(T),
    /// Operands of an inner product, computed once before the write phase
    Inner(Box<Node<'a, T>>, Box<Node<'a, T>>),
}

impl<'a, T: Element> Factor<'a, T> {
    /// Factor from a scalar-kind node
    pub fn inner(node: Node<'a, T>) -> Result<Self> {
        match node.op {
            Op::Binary(OpKind::Inner, l, r) => Ok(Factor::Inner(l, r)),
            _ => Err(AlineaError::invalid_argument(format!(
                "scaling factor is a {}",
                node.ty.describe()
            ))),
        }
    }
}

pub enum Op<'a, T: Element> {
    Leaf(Leaf<'a, T>),
    /// `Neg`, `Trans` or `Eval`
    Unary(OpKind, Box<Node<'a, T>>),
    Binary(OpKind, Box<Node<'a, T>>, Box<Node<'a, T>>),
    Scale(Box<Node<'a, T>>, Factor<'a, T>),
}

pub struct Node<'a, T: Element> {
    pub(crate) op: Op<'a, T>,
    pub(crate) ty: ResultType,
}

impl<'a, T: Element> Node<'a, T> {
    pub fn borrowed(operand: &'a dyn Operand<Elem = T>) -> Self {
        Self { ty: operand.result_type(), op: Op::Leaf(Leaf::Borrowed(operand)) }
    }

    pub fn owned(value: Container<T>) -> Self {
        Self { ty: value.result_type(), op: Op::Leaf(Leaf::Owned(value)) }
    }

    pub fn unary(op: OpKind, x: Node<'a, T>) -> Result<Self> {
        let ty = resolve_unary(op, &x.ty)?;
        Ok(Self { op: Op::Unary(op, Box::new(x)), ty })
    }

    /// Two-operand node; operands of a product that still contain an
    /// unevaluated product are wrapped in `Eval`
    pub fn binary(op: OpKind, lhs: Node<'a, T>, rhs: Node<'a, T>) -> Result<Self> {
        let ty = resolve_binary(op, &lhs.ty, &rhs.ty)?;
        let (lhs, rhs) = if op.is_reduction() {
            (lhs.boundary()?, rhs.boundary()?)
        } else {
            (lhs, rhs)
        };
        Ok(Self { op: Op::Binary(op, Box::new(lhs), Box::new(rhs)), ty })
    }

    pub fn scale(x: Node<'a, T>, factor: Factor<'a, T>) -> Result<Self> {
        let ty = resolve_unary(OpKind::ScalarMul, &x.ty)?;
        Ok(Self { op: Op::Scale(Box::new(x), factor), ty })
    }

    pub fn result_type(&self) -> ResultType {
        self.ty
    }

    /// Operation tag; `None` for a leaf
    pub fn kind(&self) -> Option<OpKind> {
        match &self.op {
            Op::Leaf(_) => None,
            Op::Unary(k, _) | Op::Binary(k, _, _) => Some(*k),
            Op::Scale(_, _) => Some(OpKind::ScalarMul),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.op, Op::Leaf(_))
    }

    /// Direct operands (the scale factor is not an operand)
    pub fn children(&self) -> Vec<&Node<'a, T>> {
        match &self.op {
            Op::Leaf(_) => Vec::new(),
            Op::Unary(_, x) | Op::Scale(x, _) => vec![x.as_ref()],
            Op::Binary(_, l, r) => vec![l.as_ref(), r.as_ref()],
        }
    }

    /// Whether a product is reachable without crossing an `Eval`
    pub fn has_open_reduction(&self) -> bool {
        match &self.op {
            Op::Leaf(_) | Op::Unary(OpKind::Eval, _) => false,
            Op::Binary(k, _, _) if k.is_reduction() => true,
            _ => self.children().into_iter().any(Node::has_open_reduction),
        }
    }

    fn boundary(self) -> Result<Self> {
        if self.has_open_reduction() {
            Node::unary(OpKind::Eval, self)
        } else {
            Ok(self)
        }
    }

    /// Rough count of stored entries in the result, used for reserve hints
    pub fn nnz_estimate(&self) -> usize {
        let full = self.ty.shape.checked_len().unwrap_or(usize::MAX);
        if self.ty.density == alinea_core::Density::Dense {
            return full;
        }
        let estimate = match &self.op {
            Op::Leaf(leaf) => leaf.operand().nnz(),
            Op::Unary(_, x) | Op::Scale(x, _) => x.nnz_estimate(),
            Op::Binary(OpKind::ElemMul, l, r) => l.nnz_estimate().min(r.nnz_estimate()),
            Op::Binary(_, l, r) => l.nnz_estimate().saturating_add(r.nnz_estimate()),
        };
        estimate.min(full)
    }

    /// Depth-first visit of every leaf, factors included
    pub fn for_each_leaf(&self, f: &mut dyn FnMut(&Leaf<'a, T>)) {
        match &self.op {
            Op::Leaf(leaf) => f(leaf),
            Op::Unary(_, x) => x.for_each_leaf(f),
            Op::Binary(_, l, r) => {
                l.for_each_leaf(f);
                r.for_each_leaf(f);
            }
            Op::Scale(x, factor) => {
                x.for_each_leaf(f);
                if let Factor::Inner(l, r) = factor {
                    l.for_each_leaf(f);
                    r.for_each_leaf(f);
                }
            }
        }
    }
}

impl<T: Element> fmt::Debug for Node<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            Op::Leaf(Leaf::Borrowed(_)) => write!(f, "&{}", self.ty.describe()),
            Op::Leaf(Leaf::Owned(_)) => write!(f, "{}", self.ty.describe()),
            Op::Unary(k, x) => write!(f, "{:?}({:?})", k, x),
            Op::Binary(k, l, r) => write!(f, "{:?}({:?}, {:?})", k, l, r),
            Op::Scale(x, Factor::Value(v)) => write!(f, "ScalarMul({:?}, {})", x, v),
            Op::Scale(x, Factor::Inner(l, r)) => {
                write!(f, "ScalarMul({:?}, Inner({:?}, {:?}))", x, l, r)
            }
        }
    }
}
