//! Project and template files.
//!
//! A project file is a JSON document carrying every placed block (with its
//! links), the palette lists and free-form editor config. A template file
//! only carries palette lists. Both can also be written as MessagePack for
//! compact autosave snapshots.

use crate::error::ValidationError;
use crate::model::{Block, BlockList};
use crate::store::{BlockStore, IntegrityIssue};
use serde::{Deserialize, Serialize};

/// Current file format version.
pub const FILE_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid project snapshot: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("could not encode project snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("block rejected while loading: {0}")]
    Block(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub version: String,
    pub name: String,
    pub blocks: Vec<Block>,
    pub block_lists: Vec<BlockList>,
    #[serde(default)]
    pub config: serde_json::Value,
    /// ISO-8601 timestamp supplied by the host.
    pub last_modified: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFile {
    pub version: String,
    pub name: String,
    pub block_lists: Vec<BlockList>,
    pub last_modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

macro_rules! file_codecs {
    ($ty:ty) => {
        impl $ty {
            pub fn to_json_string(&self) -> Result<String, ProjectError> {
                Ok(serde_json::to_string_pretty(self)?)
            }

            pub fn from_json_str(s: &str) -> Result<Self, ProjectError> {
                Ok(serde_json::from_str(s)?)
            }

            /// Compact binary form (named fields, so optional fields stay optional).
            pub fn to_msgpack(&self) -> Result<Vec<u8>, ProjectError> {
                Ok(rmp_serde::to_vec_named(self)?)
            }

            pub fn from_msgpack(bytes: &[u8]) -> Result<Self, ProjectError> {
                Ok(rmp_serde::from_slice(bytes)?)
            }
        }
    };
}

file_codecs!(ProjectFile);
file_codecs!(TemplateFile);

impl BlockStore {
    /// Capture the store as a project file.
    pub fn export_project(
        &self,
        name: impl Into<String>,
        last_modified: impl Into<String>,
    ) -> ProjectFile {
        ProjectFile {
            version: FILE_VERSION.to_string(),
            name: name.into(),
            blocks: self.get_all_blocks(),
            block_lists: self.get_all_block_lists(),
            config: serde_json::Value::Object(Default::default()),
            last_modified: last_modified.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn export_template(
        &self,
        name: impl Into<String>,
        last_modified: impl Into<String>,
    ) -> TemplateFile {
        TemplateFile {
            version: FILE_VERSION.to_string(),
            name: name.into(),
            block_lists: self.get_all_block_lists(),
            last_modified: last_modified.into(),
            metadata: None,
        }
    }

    /// Replace the blocks and lists with the project's content.
    ///
    /// Block ids and links are kept as written. Block types are left alone.
    /// All-or-nothing: if any block is rejected the store is unchanged.
    /// Returns the link inconsistencies found after loading.
    pub fn import_project(
        &mut self,
        project: &ProjectFile,
    ) -> Result<Vec<IntegrityIssue>, ProjectError> {
        if project.version != FILE_VERSION {
            log::warn!(
                "loading project '{}' written with version {} (current {FILE_VERSION})",
                project.name,
                project.version
            );
        }

        let mut staged = BlockStore::new();
        for block in &project.blocks {
            staged.restore_block(block.clone())?;
        }

        let mut data = self.snapshot();
        data.0.blocks = staged.data.blocks;
        data.0.ids = staged.data.ids;
        data.0.lists = project
            .block_lists
            .iter()
            .map(|l| (l.name.clone(), l.clone()))
            .collect();
        self.restore(data);

        let issues = self.check_integrity();
        for issue in &issues {
            log::warn!("{} [{}]: {}", issue.block, issue.rule, issue.message);
        }
        log::debug!(
            "imported project '{}': {} blocks, {} lists",
            project.name,
            self.block_count(),
            project.block_lists.len()
        );
        Ok(issues)
    }

    /// Add a template file's lists to the palette.
    pub fn import_template(&mut self, template: &TemplateFile) {
        for list in &template.block_lists {
            self.add_block_list(list.clone());
        }
    }
}
