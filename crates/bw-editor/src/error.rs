//! The editor-wide error type.

use crate::batch::BatchError;
use crate::canvas::CanvasStateError;
use bw_core::{BlockError, RelationshipError, ValidationError};

/// Any failure an editor operation can report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
    #[error(transparent)]
    Canvas(#[from] CanvasStateError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    /// Raised by a caller-supplied operation closure.
    #[error("{0}")]
    Action(String),
}

impl From<BlockError> for EditorError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::Validation(e) => e.into(),
            BlockError::Relationship(e) => e.into(),
        }
    }
}

impl EditorError {
    pub fn action(message: impl Into<String>) -> Self {
        EditorError::Action(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            EditorError::Validation(e) => e.code(),
            EditorError::Relationship(e) => e.code(),
            EditorError::Canvas(e) => e.code(),
            EditorError::Batch(e) => e.code(),
            EditorError::Action(_) => "ACTION_FAILED",
        }
    }

    pub fn context(&self) -> serde_json::Value {
        match self {
            EditorError::Validation(e) => e.context(),
            EditorError::Relationship(e) => e.context(),
            EditorError::Canvas(e) => e.context(),
            EditorError::Batch(e) => e.context(),
            EditorError::Action(message) => serde_json::json!({
                "code": "ACTION_FAILED",
                "message": message,
            }),
        }
    }
}
