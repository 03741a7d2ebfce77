//! Block type and block list catalogs held by the store.

use crate::event::BlockEvent;
use crate::id::BlockId;
use crate::model::{BlockList, BlockType};
use crate::store::BlockStore;

impl BlockStore {
    // ─── Block types ─────────────────────────────────────────────────────

    /// Register a template. A type with the same id is replaced.
    pub fn register_block_type(&mut self, block_type: BlockType) {
        if self.data.types.contains_key(&block_type.id) {
            log::debug!("replacing block type {}", block_type.id);
        }
        self.data.types.insert(block_type.id, block_type);
        self.emit(BlockEvent::TypesChanged);
    }

    pub fn get_block_type(&self, id: BlockId) -> Option<&BlockType> {
        self.data.types.get(&id)
    }

    pub fn get_all_block_types(&self) -> Vec<BlockType> {
        self.data.types.values().cloned().collect()
    }

    pub fn clear_all_block_types(&mut self) {
        self.data.types.clear();
        self.emit(BlockEvent::TypesChanged);
    }

    // ─── Block lists ─────────────────────────────────────────────────────

    /// Add a palette entry, replacing any entry with the same name.
    pub fn add_block_list(&mut self, list: BlockList) {
        self.data.lists.insert(list.name.clone(), list);
        self.emit(BlockEvent::ListsChanged);
    }

    pub fn get_block_list(&self, name: &str) -> Option<&BlockList> {
        self.data.lists.get(name)
    }

    pub fn remove_block_list(&mut self, name: &str) -> Option<BlockList> {
        let removed = self.data.lists.shift_remove(name);
        if removed.is_some() {
            self.emit(BlockEvent::ListsChanged);
        }
        removed
    }

    pub fn get_all_block_lists(&self) -> Vec<BlockList> {
        self.data.lists.values().cloned().collect()
    }

    pub fn clear_all_block_lists(&mut self) {
        self.data.lists.clear();
        self.emit(BlockEvent::ListsChanged);
    }
}
