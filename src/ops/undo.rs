use std::path::Path;

use crate::model::history::{HistoryItem, HistoryKind};

const UNDO_STACK_LIMIT: usize = 500;

/// LIFO history of pre-mutation snapshots. Memory only; oldest entries
/// fall off once the limit is reached.
#[derive(Debug, Default)]
pub struct UndoStack {
    items: Vec<HistoryItem>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: HistoryItem) {
        self.items.push(item);
        if self.items.len() > UNDO_STACK_LIMIT {
            self.items.remove(0);
        }
    }

    pub fn pop(&mut self) -> Option<HistoryItem> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&HistoryItem> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// A line in `path` was rewritten from `old` to `new` outside the
    /// history (snooze sweep). Edit entries that expected `old` on disk now
    /// expect `new`, so undoing them still finds the line.
    pub fn retarget(&mut self, path: &Path, old: &str, new: &str) {
        for item in &mut self.items {
            if let HistoryKind::Edit { written } = &mut item.kind
                && item.snapshot.path == path
                && *written == old
            {
                *written = new.to_string();
            }
        }
    }
}
