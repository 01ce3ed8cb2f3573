//! User-facing expressions and operator overloads
//!
//! An [`Expr`] is a node tree that may have failed to build. Errors are
//! values here: combining a failed expression with anything yields a failed
//! expression carrying the first error, annotated with each operation it
//! passed through, and the error surfaces when the expression is assigned
//! or evaluated.

use crate::eval::materialize;
use crate::kernels;
use crate::node::{Factor, Node};
use crate::var::Var;
use alinea_core::resolve::multiply_kind;
use alinea_core::{AlineaError, Element, Kind, OpKind, Operand, Result, ResultType, Shape};
use alinea_storage::{Container, DenseMatrix, DenseVector, SparseMatrix, SparseVector};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

pub struct Expr<'a, T: Element> {
    node: Result<Node<'a, T>>,
}

impl<'a, T: Element> Expr<'a, T> {
    pub fn from_node(node: Node<'a, T>) -> Self {
        Self { node: Ok(node) }
    }

    /// An expression that failed to build
    pub fn error(err: AlineaError) -> Self {
        Self { node: Err(err) }
    }

    pub fn is_error(&self) -> bool {
        self.node.is_err()
    }

    pub fn result_type(&self) -> Result<ResultType> {
        self.node.as_ref().map(Node::result_type).map_err(Clone::clone)
    }

    pub fn shape(&self) -> Result<Shape> {
        self.result_type().map(|t| t.shape)
    }

    pub fn node(&self) -> Result<&Node<'a, T>> {
        self.node.as_ref().map_err(Clone::clone)
    }

    pub fn into_node(self) -> Result<Node<'a, T>> {
        self.node
    }

    /// Compute the expression into fresh storage of its result type
    pub fn evaluate(self) -> Result<Container<T>> {
        let node = materialize(self.node?, true)?;
        Ok(kernels::evaluate(&node, true)?.0)
    }

    /// Value of a scalar expression (an inner product)
    pub fn scalar(self) -> Result<T> {
        materialize(self.node?, true)?.scalar()
    }

    /// Multiply every element by `s`
    pub fn scale(self, s: T) -> Self {
        self.unary("scaling", |n| Node::scale(n, Factor::Value(s)))
    }

    pub fn trans(self) -> Self {
        self.unary("transpose", |n| Node::unary(OpKind::Trans, n))
    }

    /// Compute this sub-expression once, before the enclosing expression
    pub fn eval(self) -> Self {
        self.unary("evaluation", |n| Node::unary(OpKind::Eval, n))
    }

    fn unary(self, what: &str, f: impl FnOnce(Node<'a, T>) -> Result<Node<'a, T>>) -> Self {
        let node = match self.node {
            Ok(n) => f(n),
            Err(e) => Err(e.with_note(format!("in {}", what))),
        };
        Self { node }
    }

    fn combine(
        what: &str,
        lhs: Self,
        rhs: Self,
        f: impl FnOnce(Node<'a, T>, Node<'a, T>) -> Result<Node<'a, T>>,
    ) -> Self {
        let node = match (lhs.node, rhs.node) {
            (Ok(l), Ok(r)) => f(l, r),
            (Err(e), _) | (_, Err(e)) => Err(e.with_note(format!("in {}", what))),
        };
        Self { node }
    }

    pub fn sum(lhs: Self, rhs: Self) -> Self {
        Self::combine("addition", lhs, rhs, |l, r| Node::binary(OpKind::Add, l, r))
    }

    pub fn difference(lhs: Self, rhs: Self) -> Self {
        Self::combine("subtraction", lhs, rhs, |l, r| Node::binary(OpKind::Sub, l, r))
    }

    /// `lhs * rhs`, dispatched on the operands' kinds and orientations
    pub fn product(lhs: Self, rhs: Self) -> Self {
        Self::combine("multiplication", lhs, rhs, |l, r| {
            match multiply_kind(&l.result_type(), &r.result_type())? {
                OpKind::ScalarMul if l.result_type().kind == Kind::Scalar => {
                    Node::scale(r, Factor::inner(l)?)
                }
                OpKind::ScalarMul => Node::scale(l, Factor::inner(r)?),
                kind => Node::binary(kind, l, r),
            }
        })
    }
}

impl<T: Element> fmt::Debug for Expr<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Ok(node) => write!(f, "Expr({:?})", node),
            Err(e) => write!(f, "Expr(error: {})", e),
        }
    }
}

/// Anything that can stand as an operand of an expression
pub trait IntoExpr<'a, T: Element> {
    fn into_expr(self) -> Expr<'a, T>;
}

impl<'a, T: Element> IntoExpr<'a, T> for Expr<'a, T> {
    fn into_expr(self) -> Expr<'a, T> {
        self
    }
}

impl<'a, C: Operand> IntoExpr<'a, C::Elem> for &'a Var<C> {
    fn into_expr(self) -> Expr<'a, C::Elem> {
        Expr::from_node(Node::borrowed(self))
    }
}

macro_rules! container_operands {
    ($($ty:ident),*) => {
        $(
            impl<'a, T: Element> IntoExpr<'a, T> for &'a $ty<T> {
                fn into_expr(self) -> Expr<'a, T> {
                    Expr::from_node(Node::borrowed(self))
                }
            }

            impl<'a, T: Element> IntoExpr<'a, T> for $ty<T> {
                fn into_expr(self) -> Expr<'a, T> {
                    Expr::from_node(Node::owned(self.into()))
                }
            }
        )*
    };
}

container_operands!(DenseVector, DenseMatrix, SparseVector, SparseMatrix, Container);

// ============ Functions ============

/// Lift any operand into an expression, e.g. `expr(&matrix) + &v`
pub fn expr<'a, T: Element>(x: impl IntoExpr<'a, T>) -> Expr<'a, T> {
    x.into_expr()
}

pub fn trans<'a, T: Element>(x: impl IntoExpr<'a, T>) -> Expr<'a, T> {
    x.into_expr().trans()
}

/// Evaluation boundary: `x` is computed once, before anything is written
pub fn eval<'a, T: Element>(x: impl IntoExpr<'a, T>) -> Expr<'a, T> {
    x.into_expr().eval()
}

/// Cross product of two 3-vectors of the same orientation
pub fn cross<'a, T: Element>(a: impl IntoExpr<'a, T>, b: impl IntoExpr<'a, T>) -> Expr<'a, T> {
    Expr::combine("cross product", a.into_expr(), b.into_expr(), |l, r| {
        Node::binary(OpKind::Cross, l, r)
    })
}

/// Inner product of two vectors of equal length, whatever their orientation
pub fn inner<'a, T: Element>(a: impl IntoExpr<'a, T>, b: impl IntoExpr<'a, T>) -> Expr<'a, T> {
    Expr::combine("inner product", a.into_expr(), b.into_expr(), |l, r| {
        Node::binary(OpKind::Inner, l, r)
    })
}

/// Outer product `a * trans(b)`; `a` is taken as a column and `b` as a row
pub fn outer<'a, T: Element>(a: impl IntoExpr<'a, T>, b: impl IntoExpr<'a, T>) -> Expr<'a, T> {
    Expr::combine("outer product", a.into_expr(), b.into_expr(), |l, r| {
        let l = if l.result_type().is_row_vector() { Node::unary(OpKind::Trans, l)? } else { l };
        let r = if r.result_type().is_column_vector() { Node::unary(OpKind::Trans, r)? } else { r };
        Node::binary(OpKind::Outer, l, r)
    })
}

/// Component-wise product of equally shaped operands
pub fn hadamard<'a, T: Element>(a: impl IntoExpr<'a, T>, b: impl IntoExpr<'a, T>) -> Expr<'a, T> {
    Expr::combine("component-wise product", a.into_expr(), b.into_expr(), |l, r| {
        Node::binary(OpKind::ElemMul, l, r)
    })
}

// ============ Operators ============

macro_rules! binary_operators {
    ($($trait:ident :: $method:ident => $build:path;)*) => {
        $(
            impl<'a, T: Element> $trait<Expr<'a, T>> for Expr<'a, T> {
                type Output = Expr<'a, T>;

                fn $method(self, rhs: Expr<'a, T>) -> Expr<'a, T> {
                    $build(self, rhs)
                }
            }

            impl<'a, T: Element, C: Operand<Elem = T>> $trait<&'a Var<C>> for Expr<'a, T> {
                type Output = Expr<'a, T>;

                fn $method(self, rhs: &'a Var<C>) -> Expr<'a, T> {
                    $build(self, rhs.into_expr())
                }
            }

            impl<'a, T: Element, C: Operand<Elem = T>> $trait<Expr<'a, T>> for &'a Var<C> {
                type Output = Expr<'a, T>;

                fn $method(self, rhs: Expr<'a, T>) -> Expr<'a, T> {
                    $build(self.into_expr(), rhs)
                }
            }

            impl<'a, C1: Operand, C2: Operand<Elem = C1::Elem>> $trait<&'a Var<C2>> for &'a Var<C1> {
                type Output = Expr<'a, C1::Elem>;

                fn $method(self, rhs: &'a Var<C2>) -> Expr<'a, C1::Elem> {
                    $build(self.into_expr(), rhs.into_expr())
                }
            }
        )*
    };
}

binary_operators! {
    Add::add => Expr::sum;
    Sub::sub => Expr::difference;
    Mul::mul => Expr::product;
}

impl<'a, T: Element> Neg for Expr<'a, T> {
    type Output = Expr<'a, T>;

    fn neg(self) -> Expr<'a, T> {
        self.unary("negation", |n| Node::unary(OpKind::Neg, n))
    }
}

impl<'a, C: Operand> Neg for &'a Var<C> {
    type Output = Expr<'a, C::Elem>;

    fn neg(self) -> Expr<'a, C::Elem> {
        -self.into_expr()
    }
}

macro_rules! scalar_operators {
    ($($t:ty),*) => {
        $(
            impl<'a> Mul<$t> for Expr<'a, $t> {
                type Output = Expr<'a, $t>;

                fn mul(self, s: $t) -> Expr<'a, $t> {
                    self.scale(s)
                }
            }

            impl<'a> Mul<Expr<'a, $t>> for $t {
                type Output = Expr<'a, $t>;

                fn mul(self, e: Expr<'a, $t>) -> Expr<'a, $t> {
                    e.scale(self)
                }
            }

            impl<'a, C: Operand<Elem = $t>> Mul<$t> for &'a Var<C> {
                type Output = Expr<'a, $t>;

                fn mul(self, s: $t) -> Expr<'a, $t> {
                    self.into_expr().scale(s)
                }
            }

            impl<'a, C: Operand<Elem = $t>> Mul<&'a Var<C>> for $t {
                type Output = Expr<'a, $t>;

                fn mul(self, v: &'a Var<C>) -> Expr<'a, $t> {
                    v.into_expr().scale(self)
                }
            }
        )*
    };
}

scalar_operators!(f32, f64, i32, i64);
