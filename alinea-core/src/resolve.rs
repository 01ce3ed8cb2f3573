//! Result-type resolution
//!
//! A pure dispatch table from (operation, operand types) to the result
//! type. It runs once per node when the node is built, so dimension and
//! category errors surface before anything is evaluated, and it is the
//! single place where the density and orientation rules live:
//!
//! | operation          | density                      | orientation                        |
//! |--------------------|------------------------------|------------------------------------|
//! | add, sub           | sparse iff both sparse       | first dense operand, else left     |
//! | component product  | sparse iff either sparse     | first sparse operand, else left    |
//! | mat×vec, vec×mat   | sparse iff both sparse       | column / row vector                |
//! | mat×mat            | sparse iff both sparse       | column-major iff both column-major |
//! | outer product      | sparse iff both sparse       | row-major                          |
//! | cross product      | always dense                 | operands' orientation              |
//! | scale, neg, eval   | operand's                    | operand's                          |
//! | transpose          | operand's                    | flipped                            |

use crate::error::AlineaError;
use crate::shape::{Density, Kind, Orientation, ResultType, Shape};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation tag of an expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Add,
    Sub,
    Neg,
    ScalarMul,
    /// Component-wise product of equally shaped operands
    ElemMul,
    MatVec,
    VecMat,
    MatMat,
    Outer,
    Inner,
    Cross,
    Trans,
    Eval,
}

impl OpKind {
    /// Element (i, j) of the result reads only element (i, j) of each operand
    pub fn is_elementwise(self) -> bool {
        matches!(
            self,
            OpKind::Add | OpKind::Sub | OpKind::Neg | OpKind::ScalarMul | OpKind::ElemMul
        )
    }

    /// Each result element accumulates over many operand elements
    pub fn is_reduction(self) -> bool {
        matches!(
            self,
            OpKind::MatVec
                | OpKind::VecMat
                | OpKind::MatMat
                | OpKind::Outer
                | OpKind::Inner
                | OpKind::Cross
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            OpKind::Add => "addition",
            OpKind::Sub => "subtraction",
            OpKind::Neg => "negation",
            OpKind::ScalarMul => "scaling",
            OpKind::ElemMul => "component-wise product",
            OpKind::MatVec => "matrix/vector product",
            OpKind::VecMat => "vector/matrix product",
            OpKind::MatMat => "matrix product",
            OpKind::Outer => "outer product",
            OpKind::Inner => "inner product",
            OpKind::Cross => "cross product",
            OpKind::Trans => "transpose",
            OpKind::Eval => "evaluation",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn unsupported(op: OpKind, lhs: &ResultType, rhs: &ResultType) -> AlineaError {
    AlineaError::unsupported(op.name(), &lhs.describe(), &rhs.describe())
}

/// Which product `lhs * rhs` denotes
pub fn multiply_kind(lhs: &ResultType, rhs: &ResultType) -> Result<OpKind, AlineaError> {
    use Orientation::*;
    match (lhs.kind, rhs.kind) {
        (Kind::Scalar, Kind::Scalar) => Err(AlineaError::unsupported(
            "multiplication",
            "scalar expression",
            "scalar expression",
        )
        .with_suggestion("Evaluate one factor with scalar() first")),
        (Kind::Scalar, _) | (_, Kind::Scalar) => Ok(OpKind::ScalarMul),
        (Kind::Matrix, Kind::Matrix) => Ok(OpKind::MatMat),
        (Kind::Matrix, Kind::Vector) => Ok(OpKind::MatVec),
        (Kind::Vector, Kind::Matrix) => Ok(OpKind::VecMat),
        (Kind::Vector, Kind::Vector) => match (lhs.orientation, rhs.orientation) {
            (ColumnMajor, RowMajor) => Ok(OpKind::Outer),
            (RowMajor, ColumnMajor) => Ok(OpKind::Inner),
            _ => Ok(OpKind::ElemMul),
        },
    }
}

/// Result type of a single-operand node
pub fn resolve_unary(op: OpKind, x: &ResultType) -> Result<ResultType, AlineaError> {
    match op {
        OpKind::Neg | OpKind::ScalarMul | OpKind::Eval => {
            if x.kind == Kind::Scalar {
                return Err(AlineaError::invalid_argument(format!(
                    "{} of a scalar expression",
                    op
                ))
                .with_suggestion("Evaluate it with scalar() and use the value"));
            }
            Ok(*x)
        }
        OpKind::Trans => match x.kind {
            Kind::Scalar => Err(AlineaError::invalid_argument("transpose of a scalar expression")),
            Kind::Vector | Kind::Matrix => Ok(ResultType {
                shape: x.shape.transposed(),
                orientation: x.orientation.flip(),
                ..*x
            }),
        },
        _ => Err(AlineaError::invalid_argument(format!("{} needs two operands", op))),
    }
}

/// Result type of a two-operand node
pub fn resolve_binary(
    op: OpKind,
    lhs: &ResultType,
    rhs: &ResultType,
) -> Result<ResultType, AlineaError> {
    match op {
        OpKind::Add | OpKind::Sub => resolve_sum(op, lhs, rhs),
        OpKind::ElemMul => resolve_componentwise(lhs, rhs),
        OpKind::MatVec => {
            if lhs.kind != Kind::Matrix || !rhs.is_column_vector() {
                return Err(unsupported(op, lhs, rhs));
            }
            if lhs.shape.cols != rhs.len() {
                return Err(AlineaError::shape_mismatch(op.name(), lhs.shape, rhs.shape));
            }
            Ok(ResultType::vector(
                lhs.shape.rows,
                Orientation::ColumnMajor,
                Density::either_dense(lhs.density, rhs.density),
            ))
        }
        OpKind::VecMat => {
            if !lhs.is_row_vector() || rhs.kind != Kind::Matrix {
                return Err(unsupported(op, lhs, rhs));
            }
            if lhs.len() != rhs.shape.rows {
                return Err(AlineaError::shape_mismatch(op.name(), lhs.shape, rhs.shape));
            }
            Ok(ResultType::vector(
                rhs.shape.cols,
                Orientation::RowMajor,
                Density::either_dense(lhs.density, rhs.density),
            ))
        }
        OpKind::MatMat => {
            if lhs.kind != Kind::Matrix || rhs.kind != Kind::Matrix {
                return Err(unsupported(op, lhs, rhs));
            }
            if lhs.shape.cols != rhs.shape.rows {
                return Err(AlineaError::shape_mismatch(op.name(), lhs.shape, rhs.shape));
            }
            let orientation = if lhs.orientation == Orientation::ColumnMajor
                && rhs.orientation == Orientation::ColumnMajor
            {
                Orientation::ColumnMajor
            } else {
                Orientation::RowMajor
            };
            Ok(ResultType::matrix(
                Shape::new(lhs.shape.rows, rhs.shape.cols),
                orientation,
                Density::either_dense(lhs.density, rhs.density),
            ))
        }
        OpKind::Outer => {
            if !lhs.is_column_vector() || !rhs.is_row_vector() {
                return Err(unsupported(op, lhs, rhs));
            }
            Ok(ResultType::matrix(
                Shape::new(lhs.len(), rhs.len()),
                Orientation::RowMajor,
                Density::either_dense(lhs.density, rhs.density),
            ))
        }
        OpKind::Inner => {
            if lhs.kind != Kind::Vector || rhs.kind != Kind::Vector {
                return Err(unsupported(op, lhs, rhs));
            }
            if lhs.len() != rhs.len() {
                return Err(AlineaError::shape_mismatch(op.name(), lhs.shape, rhs.shape));
            }
            Ok(ResultType::scalar())
        }
        OpKind::Cross => {
            if lhs.kind != Kind::Vector
                || rhs.kind != Kind::Vector
                || lhs.orientation != rhs.orientation
            {
                return Err(unsupported(op, lhs, rhs));
            }
            if lhs.len() != 3 || rhs.len() != 3 {
                return Err(AlineaError::shape_mismatch(op.name(), lhs.shape, rhs.shape)
                    .with_suggestion("The cross product is defined for 3-vectors only"));
            }
            Ok(ResultType::vector(3, lhs.orientation, Density::Dense))
        }
        _ => Err(AlineaError::invalid_argument(format!("{} takes a single operand", op))),
    }
}

fn resolve_sum(op: OpKind, lhs: &ResultType, rhs: &ResultType) -> Result<ResultType, AlineaError> {
    let same_category = match (lhs.kind, rhs.kind) {
        (Kind::Matrix, Kind::Matrix) => true,
        (Kind::Vector, Kind::Vector) => lhs.orientation == rhs.orientation,
        _ => false,
    };
    if !same_category {
        return Err(unsupported(op, lhs, rhs));
    }
    if lhs.shape != rhs.shape {
        return Err(AlineaError::shape_mismatch(op.name(), lhs.shape, rhs.shape));
    }
    let density = Density::either_dense(lhs.density, rhs.density);
    let orientation = if density == Density::Dense && lhs.density == Density::Sparse {
        rhs.orientation
    } else {
        lhs.orientation
    };
    Ok(ResultType { kind: lhs.kind, shape: lhs.shape, orientation, density })
}

fn resolve_componentwise(lhs: &ResultType, rhs: &ResultType) -> Result<ResultType, AlineaError> {
    let same_category = match (lhs.kind, rhs.kind) {
        (Kind::Matrix, Kind::Matrix) => true,
        (Kind::Vector, Kind::Vector) => lhs.orientation == rhs.orientation,
        _ => false,
    };
    if !same_category {
        return Err(unsupported(OpKind::ElemMul, lhs, rhs));
    }
    if lhs.shape != rhs.shape {
        return Err(AlineaError::shape_mismatch(OpKind::ElemMul.name(), lhs.shape, rhs.shape));
    }
    let density = Density::either_sparse(lhs.density, rhs.density);
    let orientation = if density == Density::Sparse && lhs.density == Density::Dense {
        rhs.orientation
    } else {
        lhs.orientation
    };
    Ok(ResultType { kind: lhs.kind, shape: lhs.shape, orientation, density })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn dense_col(n: usize) -> ResultType {
        ResultType::vector(n, Orientation::ColumnMajor, Density::Dense)
    }

    fn sparse_row(n: usize) -> ResultType {
        ResultType::vector(n, Orientation::RowMajor, Density::Sparse)
    }

    fn mat(r: usize, c: usize, o: Orientation, d: Density) -> ResultType {
        ResultType::matrix(Shape::new(r, c), o, d)
    }

    #[test]
    fn test_sum_density_rules() {
        let dd = mat(2, 2, Orientation::RowMajor, Density::Dense);
        let ss = mat(2, 2, Orientation::ColumnMajor, Density::Sparse);
        assert_eq!(resolve_binary(OpKind::Add, &dd, &dd).unwrap().density, Density::Dense);
        assert_eq!(resolve_binary(OpKind::Add, &ss, &ss).unwrap().density, Density::Sparse);

        let mixed = resolve_binary(OpKind::Sub, &ss, &dd).unwrap();
        assert_eq!(mixed.density, Density::Dense);
        // follows the dense operand
        assert_eq!(mixed.orientation, Orientation::RowMajor);
    }

    #[test]
    fn test_product_density_rules() {
        let sr = mat(3, 4, Orientation::RowMajor, Density::Sparse);
        let dr = mat(4, 2, Orientation::RowMajor, Density::Dense);
        let sc = mat(4, 2, Orientation::ColumnMajor, Density::Sparse);

        let t = resolve_binary(OpKind::MatMat, &sr, &dr).unwrap();
        assert_eq!(t.density, Density::Dense);
        assert_eq!(t.shape, Shape::new(3, 2));

        let t = resolve_binary(OpKind::MatMat, &sr, &sc).unwrap();
        assert_eq!(t.density, Density::Sparse);
        assert_eq!(t.orientation, Orientation::RowMajor);

        let cc = mat(2, 2, Orientation::ColumnMajor, Density::Dense);
        let t = resolve_binary(OpKind::MatMat, &cc, &cc).unwrap();
        assert_eq!(t.orientation, Orientation::ColumnMajor);
    }

    #[test]
    fn test_inner_dimension_mismatch() {
        let a = mat(3, 4, Orientation::RowMajor, Density::Dense);
        let b = mat(3, 4, Orientation::RowMajor, Density::Dense);
        let err = resolve_binary(OpKind::MatMat, &a, &b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        assert!(err.message.contains("3×4"));
    }

    #[test]
    fn test_vector_plus_matrix_is_unsupported() {
        let v = dense_col(3);
        let m = mat(3, 1, Orientation::RowMajor, Density::Dense);
        let err = resolve_binary(OpKind::Add, &v, &m).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_multiply_dispatch_by_orientation() {
        let col = dense_col(3);
        let row = sparse_row(3);
        assert_eq!(multiply_kind(&col, &row).unwrap(), OpKind::Outer);
        assert_eq!(multiply_kind(&row, &col).unwrap(), OpKind::Inner);
        assert_eq!(multiply_kind(&col, &col).unwrap(), OpKind::ElemMul);
        let m = mat(3, 3, Orientation::RowMajor, Density::Dense);
        assert_eq!(multiply_kind(&m, &col).unwrap(), OpKind::MatVec);
        assert_eq!(multiply_kind(&row, &m).unwrap(), OpKind::VecMat);
        assert_eq!(multiply_kind(&ResultType::scalar(), &m).unwrap(), OpKind::ScalarMul);
    }

    #[test]
    fn test_outer_and_inner() {
        let outer = resolve_binary(OpKind::Outer, &dense_col(3), &sparse_row(4)).unwrap();
        assert_eq!(outer.kind, Kind::Matrix);
        assert_eq!(outer.shape, Shape::new(3, 4));
        assert_eq!(outer.density, Density::Dense);

        let inner = resolve_binary(OpKind::Inner, &sparse_row(3), &dense_col(3)).unwrap();
        assert_eq!(inner.kind, Kind::Scalar);

        let err = resolve_binary(OpKind::Inner, &sparse_row(2), &dense_col(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_transpose_flips_vector() {
        let t = resolve_unary(OpKind::Trans, &dense_col(5)).unwrap();
        assert!(t.is_row_vector());
        assert_eq!(t.shape, Shape::new(1, 5));
    }

    #[test]
    fn test_cross_requires_three() {
        let err = resolve_binary(OpKind::Cross, &dense_col(4), &dense_col(4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        let ok = resolve_binary(
            OpKind::Cross,
            &ResultType::vector(3, Orientation::ColumnMajor, Density::Sparse),
            &ResultType::vector(3, Orientation::ColumnMajor, Density::Sparse),
        )
        .unwrap();
        assert_eq!(ok.density, Density::Dense);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let a = mat(4, 2, Orientation::ColumnMajor, Density::Sparse);
        let b = mat(2, 5, Orientation::RowMajor, Density::Dense);
        let first = resolve_binary(OpKind::MatMat, &a, &b).unwrap();
        let second = resolve_binary(OpKind::MatMat, &a, &b).unwrap();
        assert_eq!(first, second);
    }
}
