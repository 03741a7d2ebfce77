//! Core data model for block programs.
//!
//! A program is a set of placed `Block`s linked into chains. The primary
//! spine is a doubly-linked list (`parent_id` / `child_id`), not a tree:
//! every block has at most one parent and at most one child. Loop blocks
//! additionally own a nested sub-chain addressed by `loop_first_child_id` /
//! `loop_last_child_id`. Value bindings (`value_target_id`) are a separate
//! edge kind and never take part in the spine.

use crate::id::BlockId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Kinds ───────────────────────────────────────────────────────────────

/// The closed set of block shapes. Determines connection legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Hat block that starts a program.
    Flag,
    Works,
    Move,
    Composition,
    /// Container owning a nested loop chain.
    Loop,
    /// Reporter bound into another block's content slot.
    Value,
}

impl BlockKind {
    pub fn is_loop(self) -> bool {
        matches!(self, BlockKind::Loop)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Flag => "flag",
            BlockKind::Works => "works",
            BlockKind::Move => "move",
            BlockKind::Composition => "composition",
            BlockKind::Loop => "loop",
            BlockKind::Value => "value",
        }
    }

    /// Parse a lowercase kind name (as written in forms and files).
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "flag" => BlockKind::Flag,
            "works" => BlockKind::Works,
            "move" => BlockKind::Move,
            "composition" => BlockKind::Composition,
            "loop" => BlockKind::Loop,
            "value" => BlockKind::Value,
            _ => return None,
        })
    }
}

/// Which sides of a block accept spine connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connection {
    Input,
    Output,
    #[default]
    Both,
    None,
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Canvas-space position of a block's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// ─── Content ─────────────────────────────────────────────────────────────

/// One item of a block's visible content, e.g. `move` `(10)` `steps`.
/// `id` is unique within its block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub data: ContentData,
}

/// Discriminated payload of a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentData {
    /// Free text label.
    Text { text: String },
    /// Editable value field. A Value block may be bound into it through the
    /// owning block's `value_target_id`.
    Value {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    /// Enumerated selector; `selected` must be one of `options`.
    Selector { options: Vec<String>, selected: String },
    Separator,
}

impl ContentItem {
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: ContentData::Text { text: text.into() },
        }
    }

    pub fn value(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: ContentData::Value {
                value: value.into(),
                placeholder: None,
            },
        }
    }

    pub fn selector(id: impl Into<String>, options: Vec<String>) -> Self {
        let selected = options.first().cloned().unwrap_or_default();
        Self {
            id: id.into(),
            data: ContentData::Selector { options, selected },
        }
    }

    pub fn separator(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: ContentData::Separator,
        }
    }

    /// Whether this item is a user-editable field (value or selector).
    pub fn is_field(&self) -> bool {
        matches!(
            self.data,
            ContentData::Value { .. } | ContentData::Selector { .. }
        )
    }
}

pub type Content = SmallVec<[ContentItem; 4]>;

fn default_true() -> bool {
    true
}

// ─── Blocks ──────────────────────────────────────────────────────────────

/// A placed block instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    /// Palette identity; unique per project (advisory).
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,

    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(default)]
    pub connection: Connection,
    #[serde(default = "default_true")]
    pub draggable: bool,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default = "default_true")]
    pub deletable: bool,

    #[serde(default)]
    pub content: Content,
    /// Code template emitted for this block; may contain `{field}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_first_child_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_last_child_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_target_id: Option<BlockId>,
}

impl Block {
    /// Stamp a new unlinked block from a template.
    pub fn from_type(id: BlockId, block_type: &BlockType, position: Position) -> Self {
        Self {
            id,
            name: block_type.name.clone(),
            kind: block_type.kind,
            position,
            size: block_type.size,
            z_index: 0,
            visible: true,
            connection: block_type.connection,
            draggable: block_type.draggable,
            editable: block_type.editable,
            deletable: block_type.deletable,
            content: block_type.content.clone(),
            output: block_type.output.clone(),
            parent_id: None,
            child_id: None,
            loop_first_child_id: None,
            loop_last_child_id: None,
            value_target_id: None,
        }
    }

    pub fn is_loop(&self) -> bool {
        self.kind.is_loop()
    }

    /// Look up a content item by its in-block id.
    pub fn content_item(&self, item_id: &str) -> Option<&ContentItem> {
        self.content.iter().find(|c| c.id == item_id)
    }
}

/// An unplaced template used to stamp new blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub connection: Connection,
    #[serde(default = "default_true")]
    pub draggable: bool,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default = "default_true")]
    pub deletable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl BlockType {
    pub fn new(id: impl Into<BlockId>, name: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            content: Content::new(),
            connection: Connection::default(),
            draggable: true,
            editable: true,
            deletable: true,
            size: None,
            output: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl IntoIterator<Item = ContentItem>) -> Self {
        self.content = content.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }
}

/// A named palette entry pairing a label with a template block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockList {
    pub name: String,
    pub block: Block,
}

/// Partial update for `BlockStore::update_block`.
///
/// Relationship fields are deliberately absent: links are only changed
/// through connect / disconnect / bind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPatch {
    pub name: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Option<Size>>,
    pub z_index: Option<i32>,
    pub visible: Option<bool>,
    pub connection: Option<Connection>,
    pub draggable: Option<bool>,
    pub editable: Option<bool>,
    pub deletable: Option<bool>,
    pub content: Option<Content>,
    pub output: Option<Option<String>>,
}

impl BlockPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            position: Some(Position::new(x, y)),
            ..Default::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Merge `Some` fields into `block`.
    pub fn apply_to(&self, block: &mut Block) {
        if let Some(name) = &self.name {
            block.name = name.clone();
        }
        if let Some(position) = self.position {
            block.position = position;
        }
        if let Some(size) = self.size {
            block.size = size;
        }
        if let Some(z) = self.z_index {
            block.z_index = z;
        }
        if let Some(visible) = self.visible {
            block.visible = visible;
        }
        if let Some(connection) = self.connection {
            block.connection = connection;
        }
        if let Some(draggable) = self.draggable {
            block.draggable = draggable;
        }
        if let Some(editable) = self.editable {
            block.editable = editable;
        }
        if let Some(deletable) = self.deletable {
            block.deletable = deletable;
        }
        if let Some(content) = &self.content {
            block.content = content.clone();
        }
        if let Some(output) = &self.output {
            block.output = output.clone();
        }
    }
}
