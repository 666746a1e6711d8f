// src/error.rs
//
// Error taxonomy for field evaluation. Every variant aborts the whole call;
// there is no partial-result mode.

use thiserror::Error;

use crate::source::Family;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// Inconsistent pixel shapes, path lengths that are neither 1 nor the
    /// common length, empty inputs, or malformed paths/grids.
    #[error("bad input shape: {0}")]
    BadInputShape(String),

    /// A source family the active evaluator has no formula for.
    #[error("unrecognized source type: {0}")]
    UnrecognizedSourceType(String),

    /// Raised by a field formula for degenerate parameters.
    #[error("{family} formula domain error: {reason}")]
    FormulaDomain { family: Family, reason: String },

    #[error("unknown {kind} handle #{index}")]
    InvalidHandle { kind: &'static str, index: usize },

    #[error("collection #{0} would contain itself")]
    CollectionCycle(usize),

    #[error("invalid motion: {0}")]
    InvalidMotion(String),
}

pub type Result<T> = std::result::Result<T, FieldError>;

impl FieldError {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Self::BadInputShape(msg.into())
    }

    pub(crate) fn motion(msg: impl Into<String>) -> Self {
        Self::InvalidMotion(msg.into())
    }

    pub(crate) fn domain(family: Family, reason: impl Into<String>) -> Self {
        Self::FormulaDomain {
            family,
            reason: reason.into(),
        }
    }
}
