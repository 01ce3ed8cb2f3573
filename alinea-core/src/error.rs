//! Structured errors for expression construction and assignment
//!
//! Errors are values: a failed expression carries its error until the
//! assignment that consumes it, and every assignment returns `Result`.
//! Nothing in the engine panics on bad input.

use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const DIMENSION_MISMATCH: &str = "DIMENSION_MISMATCH";
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const ALLOCATION_FAILURE: &str = "ALLOCATION_FAILURE";
}

/// The three failure classes an assignment can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Operand shapes incompatible, or a fixed-extent destination has the wrong shape
    DimensionMismatch,
    /// Out-of-order sparse append, or an operand combination that cannot be evaluated
    InvalidArgument,
    /// Storage for a temporary or a resize could not be obtained
    AllocationFailure,
}

/// Structured engine error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlineaError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Propagation notes, innermost first
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

impl AlineaError {
    /// Create a new error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            notes: Vec::new(),
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: add propagation note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Map the code back to its kind
    pub fn kind(&self) -> ErrorKind {
        match self.code.as_str() {
            codes::DIMENSION_MISMATCH => ErrorKind::DimensionMismatch,
            codes::ALLOCATION_FAILURE => ErrorKind::AllocationFailure,
            _ => ErrorKind::InvalidArgument,
        }
    }

    // ========== Common Error Constructors ==========

    pub fn dimension_mismatch(details: impl Into<String>) -> Self {
        Self::new(codes::DIMENSION_MISMATCH, format!("Dimension mismatch: {}", details.into()))
    }

    /// Two operands whose shapes do not fit the operation
    pub fn shape_mismatch(op: &str, lhs: Shape, rhs: Shape) -> Self {
        Self::dimension_mismatch(format!("{} of {} and {}", op, lhs, rhs))
            .with_suggestion("Check operand dimensions or transpose one operand")
    }

    /// A destination that cannot take the shape of the expression
    pub fn destination_shape(current: Shape, required: Shape) -> Self {
        Self::dimension_mismatch(format!(
            "destination is {} but the expression is {}",
            current, required
        ))
        .with_suggestion("Use a resizable destination or an expression of the destination's shape")
    }

    pub fn invalid_argument(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_ARGUMENT, format!("Invalid argument: {}", details.into()))
    }

    /// Operand categories the operation is not defined for
    pub fn unsupported(op: &str, lhs: &str, rhs: &str) -> Self {
        Self::invalid_argument(format!("{} is not defined for {} and {}", op, lhs, rhs))
    }

    pub fn allocation_failure(details: impl Into<String>) -> Self {
        Self::new(codes::ALLOCATION_FAILURE, format!("Allocation failure: {}", details.into()))
    }
}

impl std::fmt::Display for AlineaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        for note in &self.notes {
            write!(f, "; {}", note)?;
        }
        Ok(())
    }
}

impl std::error::Error for AlineaError {}

/// Failures raised by the storage write contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("append at ({row}, {col}) is not after the last entry of its line (index {last})")]
    OutOfOrderAppend { row: usize, col: usize, last: usize },

    #[error("fixed-extent storage of shape {current} cannot become {requested}")]
    FixedExtent { current: Shape, requested: Shape },

    #[error("a {orientation} vector cannot take shape {requested}")]
    NotAVectorShape { orientation: &'static str, requested: Shape },

    #[error("index ({row}, {col}) is outside {shape}")]
    IndexOutOfBounds { row: usize, col: usize, shape: Shape },

    #[error("element count of {shape} overflows usize")]
    CapacityOverflow { shape: Shape },

    #[error("could not reserve {elements} elements")]
    ReserveFailed { elements: usize },
}

impl From<StorageError> for AlineaError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::OutOfOrderAppend { .. } => Self::invalid_argument(err.to_string())
                .with_suggestion("Append entries of a line in strictly increasing index order"),
            StorageError::IndexOutOfBounds { .. } => Self::invalid_argument(err.to_string()),
            StorageError::FixedExtent { current, requested } => {
                Self::destination_shape(current, requested)
            }
            StorageError::NotAVectorShape { .. } => Self::dimension_mismatch(err.to_string()),
            StorageError::CapacityOverflow { .. } | StorageError::ReserveFailed { .. } => {
                Self::allocation_failure(err.to_string())
            }
        }
    }
}

/// Reserve `additional` slots in `buf`, mapping failure to `StorageError`
pub fn try_reserve<T>(buf: &mut Vec<T>, additional: usize) -> Result<(), StorageError> {
    buf.try_reserve(additional)
        .map_err(|_| StorageError::ReserveFailed { elements: additional })
}
