//! Change notifications.
//!
//! Stores emit one event after each successful mutation. Consumers (the
//! renderer, the culling pass, autosave) subscribe with a callback and keep
//! the returned `SubscriptionId` to unsubscribe later.

use crate::id::BlockId;
use std::fmt;
use std::rc::Rc;

/// Events emitted by `BlockStore`.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockEvent {
    Created(BlockId),
    Updated(BlockId),
    Deleted(BlockId),
    Connected { parent: BlockId, child: BlockId },
    Disconnected { parent: BlockId, child: BlockId },
    ValueBound { block: BlockId, target: BlockId },
    ValueUnbound { block: BlockId },
    TypesChanged,
    ListsChanged,
    Cleared,
    /// The whole store was replaced by a snapshot.
    Restored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A list of listeners for events of type `E`.
///
/// Single-threaded by design: listeners are `Rc`, so cloning a store shares
/// its listeners.
pub struct Subscribers<E> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Rc<dyn Fn(&E)>)>,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Subscribers<E> {
    fn clone(&self) -> Self {
        Self {
            next_id: self.next_id,
            listeners: self.listeners.clone(),
        }
    }
}

impl<E> fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn subscribe_emit_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Subscribers::<BlockEvent>::new();
        let sink = Rc::clone(&seen);
        let id = subs.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        subs.emit(&BlockEvent::Cleared);
        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id));
        subs.emit(&BlockEvent::TypesChanged);

        assert_eq!(*seen.borrow(), vec![BlockEvent::Cleared]);
        assert!(subs.is_empty());
    }
}
