//! The block graph store.
//!
//! Sole authority for block CRUD and relationship mutation. Every public
//! mutator validates first and only then touches state, so a failing call
//! leaves the store exactly as it was.
//!
//! Link layout:
//!
//! - Spine: `a.child_id == b` ⇔ `b.parent_id == a`.
//! - Loop body: a chain from `L.loop_first_child_id` to `L.loop_last_child_id`
//!   linked through `child_id`; the tail's `child_id` is empty. The head's
//!   `parent_id` is `L`. Every later member points either at `L` (appended
//!   to the loop) or at its predecessor (connected to that member).
//!
//! Membership is decided by walking the body from its head, never by
//! `parent_id` alone.

use crate::error::{RelationshipError, ValidationError};
use crate::event::{BlockEvent, SubscriptionId, Subscribers};
use crate::id::{BlockId, IdAllocator};
use crate::model::*;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Maximum length of a block name, in characters.
pub const MAX_NAME_LEN: usize = 64;

/// The raw catalogs. Cloned wholesale for snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StoreData {
    pub(crate) blocks: IndexMap<BlockId, Block>,
    pub(crate) types: IndexMap<BlockId, BlockType>,
    pub(crate) lists: IndexMap<String, BlockList>,
    pub(crate) ids: IdAllocator,
}

/// A value copy of the whole store, taken with `BlockStore::snapshot`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot(pub(crate) StoreData);

/// A link inconsistency found by `BlockStore::check_integrity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityIssue {
    pub block: BlockId,
    /// Short rule identifier (e.g. "dangling-child").
    pub rule: &'static str,
    pub message: String,
}

#[derive(Debug, Default, Clone)]
pub struct BlockStore {
    pub(crate) data: StoreData,
    subscribers: Subscribers<BlockEvent>,
}

// ─── Validation ──────────────────────────────────────────────────────────

/// Check a block name for required-ness and character format.
///
/// Allowed: letters, digits, `_`, `-` and inner spaces.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            name: name.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    let valid_chars = name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ' '));
    if !valid_chars || name.trim() != name {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field, value })
    }
}

/// Validate a content list: non-empty unique ids, selections within options.
pub fn validate_content(content: &[ContentItem]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(content.len());
    for item in content {
        if item.id.is_empty() {
            return Err(ValidationError::EmptyContentId);
        }
        if !seen.insert(item.id.as_str()) {
            return Err(ValidationError::DuplicateContentId {
                item_id: item.id.clone(),
            });
        }
        if let ContentData::Selector { options, selected } = &item.data
            && !options.contains(selected)
        {
            return Err(ValidationError::InvalidSelection {
                item_id: item.id.clone(),
                selected: selected.clone(),
            });
        }
    }
    Ok(())
}

/// Validate the non-relational fields of a block.
pub fn validate_block(block: &Block) -> Result<(), ValidationError> {
    validate_name(&block.name)?;
    finite("position.x", block.position.x)?;
    finite("position.y", block.position.y)?;
    if let Some(size) = block.size {
        finite("size.width", size.width)?;
        finite("size.height", size.height)?;
        if size.width <= 0.0 || size.height <= 0.0 {
            return Err(ValidationError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
    }
    validate_content(&block.content)?;
    if !block.is_loop()
        && (block.loop_first_child_id.is_some() || block.loop_last_child_id.is_some())
    {
        return Err(ValidationError::LoopFieldsOnNonLoop { id: block.id });
    }
    Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Notifications ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl Fn(&BlockEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub(crate) fn emit(&self, event: BlockEvent) {
        self.subscribers.emit(&event);
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    pub fn get_block(&self, id: BlockId) -> Option<&Block> {
        self.data.blocks.get(&id)
    }

    /// All blocks in insertion order.
    pub fn get_all_blocks(&self) -> Vec<Block> {
        self.data.blocks.values().cloned().collect()
    }

    /// Borrowing iterator over all blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.data.blocks.values()
    }

    pub fn block_count(&self) -> usize {
        self.data.blocks.len()
    }

    pub fn has_block(&self, id: BlockId) -> bool {
        self.data.blocks.contains_key(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Block> {
        self.data.blocks.values().find(|b| b.name == name)
    }

    /// Whether another block (other than `except`) already uses `name`.
    pub fn is_name_taken(&self, name: &str, except: Option<BlockId>) -> bool {
        self.data
            .blocks
            .values()
            .any(|b| b.name == name && Some(b.id) != except)
    }

    fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.data.blocks.get_mut(&id)
    }

    fn fresh_id(&mut self) -> BlockId {
        let blocks = &self.data.blocks;
        self.data.ids.next_free(|id| blocks.contains_key(&id))
    }

    // ─── CRUD ────────────────────────────────────────────────────────────

    /// Stamp a new block from `block_type`. Position defaults to the origin.
    pub fn create_block(
        &mut self,
        block_type: &BlockType,
        position: Option<Position>,
    ) -> Result<BlockId, ValidationError> {
        validate_name(&block_type.name)?;
        let mut block =
            Block::from_type(block_type.id, block_type, position.unwrap_or(Position::ORIGIN));
        validate_block(&block)?;
        let id = self.fresh_id();
        block.id = id;

        log::debug!("create block {id} from type {}", block_type.id);
        self.data.blocks.insert(id, block);
        self.emit(BlockEvent::Created(id));
        Ok(id)
    }

    /// Insert a complete block with its caller-supplied id and link fields.
    ///
    /// Used by project loading; links are not checked here because the
    /// blocks they point at may be restored later. Run `check_integrity`
    /// once everything is in.
    pub fn restore_block(&mut self, block: Block) -> Result<(), ValidationError> {
        if self.data.blocks.contains_key(&block.id) {
            return Err(ValidationError::DuplicateId { id: block.id });
        }
        validate_block(&block)?;
        let id = block.id;
        self.data.ids.observe(id);
        self.data.blocks.insert(id, block);
        self.emit(BlockEvent::Created(id));
        Ok(())
    }

    /// Merge `patch` into block `id`, validating the merged result.
    pub fn update_block(&mut self, id: BlockId, patch: &BlockPatch) -> Result<(), ValidationError> {
        let mut updated = self
            .get_block(id)
            .cloned()
            .ok_or(ValidationError::UnknownBlock { id })?;
        patch.apply_to(&mut updated);
        validate_block(&updated)?;

        self.data.blocks.insert(id, updated);
        self.emit(BlockEvent::Updated(id));
        Ok(())
    }

    /// Remove a block, repairing its neighbors' links first.
    ///
    /// A loop member is spliced out of its loop body. On a spine the former
    /// parent and former child are both left unlinked; the chain is not
    /// spliced through. A deleted loop hands its body over as a free chain.
    /// Missing ids are a no-op.
    pub fn delete_block(&mut self, id: BlockId) -> Option<Block> {
        let block = self.get_block(id)?.clone();

        if let Some(owner) = self.loop_owner(id) {
            self.remove_from_loop(owner, id);
        } else {
            if let Some(parent_id) = block.parent_id
                && let Some(parent) = self.block_mut(parent_id)
                && parent.child_id == Some(id)
            {
                parent.child_id = None;
            }
            if let Some(child_id) = block.child_id
                && let Some(child) = self.block_mut(child_id)
                && child.parent_id == Some(id)
            {
                child.parent_id = None;
            }
        }

        if block.is_loop() {
            let members = self.loop_children(id);
            let mut prev: Option<BlockId> = None;
            for member in members {
                if let Some(m) = self.block_mut(member) {
                    m.parent_id = prev;
                }
                prev = Some(member);
            }
        }

        for other in self.data.blocks.values_mut() {
            if other.value_target_id == Some(id) {
                other.value_target_id = None;
            }
        }

        let removed = self.data.blocks.shift_remove(&id);
        log::debug!("delete block {id}");
        self.emit(BlockEvent::Deleted(id));
        removed
    }

    // ─── Relationships ───────────────────────────────────────────────────

    /// Pre-flight legality check used by `connect_blocks`.
    pub fn validate_block_connection(
        &self,
        parent_id: BlockId,
        child_id: BlockId,
    ) -> Result<(), RelationshipError> {
        if !self.has_block(parent_id) {
            return Err(RelationshipError::MissingBlock { id: parent_id });
        }
        if !self.has_block(child_id) {
            return Err(RelationshipError::MissingBlock { id: child_id });
        }
        if parent_id == child_id {
            return Err(RelationshipError::SelfConnection { id: parent_id });
        }
        if self.reaches(child_id, parent_id) {
            return Err(RelationshipError::Cycle {
                parent: parent_id,
                child: child_id,
            });
        }
        Ok(())
    }

    /// Link `child_id` under `parent_id`.
    ///
    /// The child brings its spine tail along, unless it currently sits in a
    /// loop body, in which case it moves alone.
    ///
    /// - An existing parent edge of the child is severed first.
    /// - Loop parent: the child's chain is appended to the loop body.
    /// - Parent inside a loop body: the child's chain is inserted right
    ///   after it, and the child's `parent_id` is the parent.
    /// - Otherwise a spine edge; a previous child of the parent is orphaned.
    pub fn connect_blocks(
        &mut self,
        parent_id: BlockId,
        child_id: BlockId,
    ) -> Result<(), RelationshipError> {
        self.validate_block_connection(parent_id, child_id)?;

        self.sever_parent(child_id);

        let parent_is_loop = self.get_block(parent_id).is_some_and(Block::is_loop);
        let enclosing_loop = self.loop_owner(parent_id);

        if parent_is_loop {
            self.append_to_loop(parent_id, child_id);
        } else if let Some(loop_id) = enclosing_loop {
            self.insert_into_loop_after(loop_id, parent_id, child_id);
        } else {
            let old_child = self.get_block(parent_id).and_then(|p| p.child_id);
            if let Some(old) = old_child
                && let Some(b) = self.block_mut(old)
                && b.parent_id == Some(parent_id)
            {
                b.parent_id = None;
            }
            if let Some(p) = self.block_mut(parent_id) {
                p.child_id = Some(child_id);
            }
            if let Some(c) = self.block_mut(child_id) {
                c.parent_id = Some(parent_id);
            }
        }

        log::debug!("connect {parent_id} -> {child_id}");
        self.emit(BlockEvent::Connected {
            parent: parent_id,
            child: child_id,
        });
        Ok(())
    }

    /// Unlink `child_id` from `parent_id`. Missing or unrelated blocks are a
    /// no-op.
    ///
    /// The child loses both its parent and its child link; a former spine
    /// child of the child is orphaned.
    pub fn disconnect_blocks(&mut self, parent_id: BlockId, child_id: BlockId) {
        if !self.has_block(parent_id) {
            return;
        }
        let Some(child) = self.get_block(child_id) else {
            return;
        };
        if child.parent_id != Some(parent_id) {
            log::debug!("disconnect {parent_id} -> {child_id}: not linked");
            return;
        }

        if let Some(owner) = self.loop_owner(child_id) {
            self.remove_from_loop(owner, child_id);
        } else {
            if let Some(p) = self.block_mut(parent_id)
                && p.child_id == Some(child_id)
            {
                p.child_id = None;
            }
            let tail = self.get_block(child_id).and_then(|c| c.child_id);
            if let Some(t) = tail
                && let Some(b) = self.block_mut(t)
                && b.parent_id == Some(child_id)
            {
                b.parent_id = None;
            }
        }
        if let Some(c) = self.block_mut(child_id) {
            c.parent_id = None;
            c.child_id = None;
        }

        log::debug!("disconnect {parent_id} -> {child_id}");
        self.emit(BlockEvent::Disconnected {
            parent: parent_id,
            child: child_id,
        });
    }

    /// Bind Value block `target` into `block`'s value slot.
    pub fn bind_value(&mut self, block: BlockId, target: BlockId) -> Result<(), RelationshipError> {
        if !self.has_block(block) {
            return Err(RelationshipError::MissingBlock { id: block });
        }
        let kind = self
            .get_block(target)
            .map(|b| b.kind)
            .ok_or(RelationshipError::MissingBlock { id: target })?;
        if block == target {
            return Err(RelationshipError::SelfConnection { id: block });
        }
        if kind != BlockKind::Value {
            return Err(RelationshipError::NotAValueBlock {
                target,
                kind: kind.as_str(),
            });
        }
        // Value blocks may themselves bind values; refuse binding loops.
        let mut visited = HashSet::new();
        let mut cursor = Some(target);
        while let Some(id) = cursor {
            if id == block {
                return Err(RelationshipError::Cycle {
                    parent: block,
                    child: target,
                });
            }
            if !visited.insert(id) {
                break;
            }
            cursor = self.get_block(id).and_then(|b| b.value_target_id);
        }

        if let Some(b) = self.block_mut(block) {
            b.value_target_id = Some(target);
        }
        self.emit(BlockEvent::ValueBound { block, target });
        Ok(())
    }

    /// Remove `block`'s value binding. Returns false if there was none.
    pub fn unbind_value(&mut self, block: BlockId) -> bool {
        let Some(b) = self.block_mut(block) else {
            return false;
        };
        if b.value_target_id.take().is_none() {
            return false;
        }
        self.emit(BlockEvent::ValueUnbound { block });
        true
    }

    // ─── Traversal ───────────────────────────────────────────────────────

    /// The chain starting at `id`, following `child_id` links.
    pub fn chain_from(&self, id: BlockId) -> Vec<BlockId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = self.get_block(id).map(|b| b.id);
        while let Some(current) = cursor {
            if !visited.insert(current) {
                break;
            }
            chain.push(current);
            cursor = self.get_block(current).and_then(|b| b.child_id);
        }
        chain
    }

    /// Members of a loop's body in order. Empty for non-loops.
    pub fn loop_children(&self, loop_id: BlockId) -> Vec<BlockId> {
        let Some(lp) = self.get_block(loop_id) else {
            return Vec::new();
        };
        let (Some(first), Some(last)) = (lp.loop_first_child_id, lp.loop_last_child_id) else {
            return Vec::new();
        };
        let mut members = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(first);
        while let Some(current) = cursor {
            if !visited.insert(current) || !self.has_block(current) {
                break;
            }
            members.push(current);
            if current == last {
                break;
            }
            cursor = self.get_block(current).and_then(|b| b.child_id);
        }
        members
    }

    /// The loop whose body contains `id`, if any.
    ///
    /// Climbs predecessor links until it meets a loop whose body holds the
    /// current block, then confirms `id` is in that body too.
    fn loop_owner(&self, id: BlockId) -> Option<BlockId> {
        let mut visited = HashSet::new();
        let mut cursor = id;
        while visited.insert(cursor) {
            let parent_id = self.get_block(cursor)?.parent_id?;
            let parent = self.get_block(parent_id)?;
            if parent.is_loop() {
                let body = self.loop_children(parent_id);
                if body.contains(&cursor) {
                    return body.contains(&id).then_some(parent_id);
                }
            }
            if parent.child_id != Some(cursor) {
                return None;
            }
            cursor = parent_id;
        }
        None
    }

    /// Last block of the chain starting at `id`.
    fn chain_tail(&self, id: BlockId) -> BlockId {
        self.chain_from(id).last().copied().unwrap_or(id)
    }

    /// Whether `target` is reachable from `from` walking downward through
    /// spine children and loop bodies.
    ///
    /// A loop member moves without the members after it, so its own
    /// `child_id` is not followed.
    fn reaches(&self, from: BlockId, target: BlockId) -> bool {
        let Some(start) = self.get_block(from) else {
            return false;
        };
        let mut stack: Vec<BlockId> = start.loop_first_child_id.into_iter().collect();
        if self.loop_owner(from).is_none() {
            stack.extend(start.child_id);
        }
        let mut visited = HashSet::from([from]);
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(b) = self.get_block(id) {
                stack.extend(b.child_id);
                stack.extend(b.loop_first_child_id);
            }
        }
        false
    }

    // ─── Link surgery (callers have validated) ───────────────────────────

    /// Cut the edge between `child_id` and whatever it hangs under.
    fn sever_parent(&mut self, child_id: BlockId) {
        let Some(old_parent) = self.get_block(child_id).and_then(|c| c.parent_id) else {
            return;
        };
        if let Some(owner) = self.loop_owner(child_id) {
            self.remove_from_loop(owner, child_id);
            if let Some(c) = self.block_mut(child_id) {
                c.child_id = None;
            }
        } else if let Some(p) = self.block_mut(old_parent)
            && p.child_id == Some(child_id)
        {
            p.child_id = None;
        }
        if let Some(c) = self.block_mut(child_id) {
            c.parent_id = None;
        }
        self.emit(BlockEvent::Disconnected {
            parent: old_parent,
            child: child_id,
        });
    }

    /// Restitch loop `loop_id`'s body without `member`. Does not touch
    /// `member`'s own fields.
    fn remove_from_loop(&mut self, loop_id: BlockId, member: BlockId) {
        let body = self.loop_children(loop_id);
        let Some(pos) = body.iter().position(|&m| m == member) else {
            return;
        };
        let prev = pos.checked_sub(1).and_then(|i| body.get(i).copied());
        let next = body.get(pos + 1).copied();

        if let Some(p) = prev
            && let Some(b) = self.block_mut(p)
        {
            b.child_id = next;
        }
        if let Some(n) = next
            && let Some(b) = self.block_mut(n)
            && b.parent_id == Some(member)
        {
            b.parent_id = Some(prev.unwrap_or(loop_id));
        }
        if let Some(lp) = self.block_mut(loop_id) {
            if lp.loop_first_child_id == Some(member) {
                lp.loop_first_child_id = next;
            }
            if lp.loop_last_child_id == Some(member) {
                lp.loop_last_child_id = prev;
            }
        }
    }

    /// Append the chain headed by `child_id` to the end of a loop body.
    fn append_to_loop(&mut self, loop_id: BlockId, child_id: BlockId) {
        let tail = self.chain_tail(child_id);
        let last = self.get_block(loop_id).and_then(|l| l.loop_last_child_id);
        match last {
            Some(last) => {
                if let Some(prev) = self.block_mut(last) {
                    prev.child_id = Some(child_id);
                }
            }
            None => {
                if let Some(lp) = self.block_mut(loop_id) {
                    lp.loop_first_child_id = Some(child_id);
                }
            }
        }
        if let Some(lp) = self.block_mut(loop_id) {
            lp.loop_last_child_id = Some(tail);
        }
        if let Some(c) = self.block_mut(child_id) {
            c.parent_id = Some(loop_id);
        }
    }

    /// Splice the chain headed by `child_id` into a loop body right after
    /// member `after`.
    fn insert_into_loop_after(&mut self, loop_id: BlockId, after: BlockId, child_id: BlockId) {
        let tail = self.chain_tail(child_id);
        let next = self.get_block(after).and_then(|b| b.child_id);
        if let Some(a) = self.block_mut(after) {
            a.child_id = Some(child_id);
        }
        if let Some(c) = self.block_mut(child_id) {
            c.parent_id = Some(after);
        }
        if let Some(t) = self.block_mut(tail) {
            t.child_id = next;
        }
        if let Some(n) = next
            && let Some(b) = self.block_mut(n)
            && b.parent_id == Some(after)
        {
            b.parent_id = Some(tail);
        }
        if let Some(lp) = self.block_mut(loop_id)
            && lp.loop_last_child_id == Some(after)
        {
            lp.loop_last_child_id = Some(tail);
        }
    }

    // ─── Integrity ───────────────────────────────────────────────────────

    /// Report every link that violates the store's invariants.
    pub fn check_integrity(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        let mut issue = |block: BlockId, rule: &'static str, message: String| {
            issues.push(IntegrityIssue {
                block,
                rule,
                message,
            });
        };

        for block in self.data.blocks.values() {
            let id = block.id;
            let owner = self.loop_owner(id);

            if let Some(parent_id) = block.parent_id {
                match self.get_block(parent_id) {
                    None => issue(id, "dangling-parent", format!("parent {parent_id} is missing")),
                    Some(parent) => {
                        if parent.child_id != Some(id) && owner != Some(parent_id) {
                            issue(
                                id,
                                "asymmetric-parent",
                                format!("parent {parent_id} does not point back"),
                            );
                        }
                    }
                }
            }

            if let Some(child_id) = block.child_id {
                match self.get_block(child_id) {
                    None => issue(id, "dangling-child", format!("child {child_id} is missing")),
                    Some(child) => {
                        let ok = child.parent_id == Some(id)
                            || owner.is_some_and(|l| {
                                child.parent_id == Some(l)
                                    && self.loop_children(l).contains(&child_id)
                            });
                        if !ok {
                            issue(
                                id,
                                "asymmetric-child",
                                format!("child {child_id} does not point back"),
                            );
                        }
                    }
                }
            }

            match (block.loop_first_child_id, block.loop_last_child_id) {
                (None, None) => {}
                (Some(first), Some(last)) if block.is_loop() => {
                    let members = self.loop_children(id);
                    if members.last() != Some(&last) {
                        issue(id, "broken-loop", "loop tail is not reachable from its head".into());
                    } else if self.get_block(last).is_some_and(|b| b.child_id.is_some()) {
                        issue(last, "open-loop-tail", format!("tail of {id} continues past the body"));
                    }
                    if self.get_block(first).and_then(|b| b.parent_id) != Some(id) {
                        issue(first, "loop-member-parent", format!("head of {id} has another parent"));
                    }
                    for pair in members.windows(2) {
                        let (prev, m) = (pair[0], pair[1]);
                        let parent = self.get_block(m).and_then(|b| b.parent_id);
                        if parent != Some(id) && parent != Some(prev) {
                            issue(m, "loop-member-parent", format!("member of {id} has another parent"));
                        }
                    }
                }
                _ if !block.is_loop() => {
                    issue(id, "loop-fields-on-non-loop", "non-loop block has loop children".into())
                }
                _ => issue(id, "half-open-loop", "loop has only one of head/tail".into()),
            }

            if let Some(target) = block.value_target_id {
                match self.get_block(target) {
                    None => issue(id, "dangling-value", format!("value target {target} is missing")),
                    Some(t) if t.kind != BlockKind::Value => issue(
                        id,
                        "non-value-binding",
                        format!("value target {target} is a {} block", t.kind.as_str()),
                    ),
                    Some(_) => {}
                }
            }
        }
        issues
    }

    // ─── Whole-store operations ──────────────────────────────────────────

    /// Reset blocks, types and lists.
    pub fn clear(&mut self) {
        self.data = StoreData::default();
        self.emit(BlockEvent::Cleared);
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot(self.data.clone())
    }

    /// Replace the whole store content. Subscribers are kept.
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        self.data = snapshot.0;
        self.emit(BlockEvent::Restored);
    }
}
