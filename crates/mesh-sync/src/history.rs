//! Cross-mesh undo/redo ordering.
//!
//! Every mesh keeps its own edit history inside the engine. This history
//! only remembers *which* mesh was edited, in order, so that a global undo or
//! redo can be routed to the right one.

use std::collections::VecDeque;

pub use mesh_sync_config::DEFAULT_MAX_HISTORY;

/// Ordered, capacity-bounded list of edited mesh keys with a cursor.
#[derive(Debug, Clone)]
pub struct UndoRedoHistory<K> {
    entries: VecDeque<K>,
    cursor: usize,
    capacity: usize,
}

impl<K> Default for UndoRedoHistory<K> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }
}

impl<K: Copy + PartialEq> UndoRedoHistory<K> {
    /// Create a history with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K> UndoRedoHistory<K> {
    /// Create a history holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the entry the next undo applies to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> impl Iterator<Item = &K> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl<K: Copy + PartialEq> UndoRedoHistory<K> {
    /// Record that `key` was just edited.
    ///
    /// Entries after the cursor (the redo branch) are discarded first. At
    /// capacity the oldest entry is dropped.
    pub fn add_entry(&mut self, key: K) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
        }
        self.entries.push_back(key);
        self.cursor = self.entries.len() - 1;
    }

    /// Key whose mesh should undo next, moving the cursor back when possible.
    pub fn undo(&mut self) -> Option<K> {
        let key = *self.entries.get(self.cursor)?;
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        Some(key)
    }

    /// Key whose mesh should redo next.
    ///
    /// The cursor moves forward only while a later entry exists; otherwise
    /// the entry under the cursor is redone again.
    pub fn redo(&mut self) -> Option<K> {
        if self.entries.is_empty() {
            return None;
        }
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
        self.entries.get(self.cursor).copied()
    }

    /// Drop every entry for `key`, keeping the cursor on the same surviving
    /// entry where possible.
    pub fn forget(&mut self, key: K) {
        let removed_before = self
            .entries
            .iter()
            .take(self.cursor)
            .filter(|k| **k == key)
            .count();
        self.entries.retain(|k| *k != key);
        self.cursor = self.cursor.saturating_sub(removed_before);
        if self.cursor >= self.entries.len() {
            self.cursor = self.entries.len().saturating_sub(1);
        }
    }
}
