//! Alinea Core - Fundamental types
//!
//! This crate provides the types every other Alinea crate builds on:
//! - `Element`: the numeric element trait
//! - `Shape`, `Orientation`, `Density`, `Kind`, `ResultType`: value descriptors
//! - `Operand` / `Target`: the read and write contracts storage implements
//! - `resolve`: the result-type table for every operation
//! - `AlineaError`: structured errors

mod element;
mod error;
mod operand;
mod shape;
pub mod resolve;

pub use element::Element;
pub use error::{codes, try_reserve, AlineaError, ErrorKind, StorageError};
pub use operand::{same_values, shape_error, write_operand, Operand, StorageId, Target};
pub use resolve::OpKind;
pub use shape::{Density, Kind, Orientation, ResultType, Shape};

/// Result type used across the workspace
pub type Result<T> = std::result::Result<T, AlineaError>;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AlineaError, Density, Element, ErrorKind, Kind, Operand, Orientation, ResultType, Shape,
        Target,
    };
}
