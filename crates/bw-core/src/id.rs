//! Block identifiers.
//!
//! Ids are strings on disk (`"block_12"`, or whatever a host wrote) and
//! interned `Spur`s in memory, so copies and map lookups never touch the
//! string. Numbering of new ids belongs to the store that hands them out.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Interned id of a block, block type or template. 4 bytes, `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(Spur);

impl BlockId {
    pub fn intern(s: &str) -> Self {
        BlockId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// `n` when this id reads `<prefix>_<n>`.
    pub fn numbered(&self, prefix: &str) -> Option<u64> {
        self.as_str()
            .strip_prefix(prefix)?
            .strip_prefix('_')?
            .parse()
            .ok()
    }
}

/// Hands out `<prefix>_<n>` ids for one store.
///
/// Restored ids are reported through `observe` so numbering continues past
/// them; `next_free` still skips any id the caller says is taken, since a
/// host may have written ids out of order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    prefix: &'static str,
    next: u64,
}

impl IdAllocator {
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 0 }
    }

    /// Bump the counter past `id` if it is one of ours.
    pub fn observe(&mut self, id: BlockId) {
        if let Some(n) = id.numbered(self.prefix) {
            self.next = self.next.max(n.saturating_add(1));
        }
    }

    pub fn next_free(&mut self, taken: impl Fn(BlockId) -> bool) -> BlockId {
        loop {
            let id = BlockId::intern(&format!("{}_{}", self.prefix, self.next));
            self.next += 1;
            if !taken(id) {
                return id;
            }
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new("block")
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(BlockId::intern(&s))
    }
}
