//! Alinea Storage - Vectors and matrices
//!
//! Concrete storage behind the `Operand`/`Target` contracts:
//! - `DenseVector`, `DenseMatrix`: contiguous buffers, row- or column-major
//! - `SparseVector`, `SparseMatrix`: sorted entry lists per line
//! - `Container`: any of the four, chosen from a `ResultType` at runtime
//! - `Store`: destinations that can take over a computed temporary
//!
//! Every type may be built with a fixed extent, in which case any change of
//! shape is refused.

mod container;
mod convert;
mod dense;
mod sparse;

pub use container::{transfer, Container, Store};
pub use convert::to_dmatrix;
pub use dense::{DenseMatrix, DenseVector};
pub use sparse::{SparseMatrix, SparseVector};
