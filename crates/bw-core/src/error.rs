//! Structured errors raised by the block store.
//!
//! Every variant serializes to `{ "code": "...", ...context }` so the UI
//! layer can translate it without parsing messages.

use crate::id::BlockId;
use serde::Serialize;

/// Bad or missing fields on create / update / restore.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationError {
    #[error("block name is required")]
    MissingName,
    #[error("block name '{name}' contains invalid characters")]
    InvalidName { name: String },
    #[error("block name '{name}' is longer than {max} characters")]
    NameTooLong { name: String, max: usize },
    #[error("block {id} does not exist")]
    UnknownBlock { id: BlockId },
    #[error("block {id} already exists")]
    DuplicateId { id: BlockId },
    #[error("content item id '{item_id}' appears more than once")]
    DuplicateContentId { item_id: String },
    #[error("content item id is empty")]
    EmptyContentId,
    #[error("selector '{item_id}' has value '{selected}' which is not one of its options")]
    InvalidSelection { item_id: String, selected: String },
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("size must be positive, got {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("block {id} is not a loop but has loop children")]
    LoopFieldsOnNonLoop { id: BlockId },
}

/// Illegal connect / disconnect / bind topology.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipError {
    #[error("block {id} does not exist")]
    MissingBlock { id: BlockId },
    #[error("block {id} cannot be connected to itself")]
    SelfConnection { id: BlockId },
    #[error("connecting {parent} -> {child} would create a cycle")]
    Cycle { parent: BlockId, child: BlockId },
    #[error("block {target} is a {kind} block, only value blocks can be bound")]
    NotAValueBlock { target: BlockId, kind: &'static str },
}

impl ValidationError {
    /// Stable machine-readable code (e.g. `MISSING_NAME`).
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingName => "MISSING_NAME",
            ValidationError::InvalidName { .. } => "INVALID_NAME",
            ValidationError::NameTooLong { .. } => "NAME_TOO_LONG",
            ValidationError::UnknownBlock { .. } => "UNKNOWN_BLOCK",
            ValidationError::DuplicateId { .. } => "DUPLICATE_ID",
            ValidationError::DuplicateContentId { .. } => "DUPLICATE_CONTENT_ID",
            ValidationError::EmptyContentId => "EMPTY_CONTENT_ID",
            ValidationError::InvalidSelection { .. } => "INVALID_SELECTION",
            ValidationError::NonFinite { .. } => "NON_FINITE",
            ValidationError::InvalidSize { .. } => "INVALID_SIZE",
            ValidationError::LoopFieldsOnNonLoop { .. } => "LOOP_FIELDS_ON_NON_LOOP",
        }
    }

    /// Machine-readable payload including the code.
    pub fn context(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl RelationshipError {
    pub fn code(&self) -> &'static str {
        match self {
            RelationshipError::MissingBlock { .. } => "MISSING_BLOCK",
            RelationshipError::SelfConnection { .. } => "SELF_CONNECTION",
            RelationshipError::Cycle { .. } => "CYCLE",
            RelationshipError::NotAValueBlock { .. } => "NOT_A_VALUE_BLOCK",
        }
    }

    pub fn context(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Either store error, for callers that handle both the same way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlockError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
}

impl BlockError {
    pub fn code(&self) -> &'static str {
        match self {
            BlockError::Validation(e) => e.code(),
            BlockError::Relationship(e) => e.code(),
        }
    }

    pub fn context(&self) -> serde_json::Value {
        match self {
            BlockError::Validation(e) => e.context(),
            BlockError::Relationship(e) => e.context(),
        }
    }
}
