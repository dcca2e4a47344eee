use serde::{Deserialize, Serialize};

use crate::model::task::TaskLine;

/// What the recorded mutation did to the line on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HistoryKind {
    /// The line was rewritten; `written` is the text that went to disk,
    /// used to find the line again when undoing.
    Edit { written: String },
    /// The line was removed from its file.
    Delete,
}

/// An undo record: the task as it was before the mutation, including the
/// file and line it lived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub snapshot: TaskLine,
    #[serde(flatten)]
    pub kind: HistoryKind,
}

impl HistoryItem {
    pub fn edit(snapshot: TaskLine, written: impl Into<String>) -> Self {
        HistoryItem {
            snapshot,
            kind: HistoryKind::Edit {
                written: written.into(),
            },
        }
    }

    pub fn delete(snapshot: TaskLine) -> Self {
        HistoryItem {
            snapshot,
            kind: HistoryKind::Delete,
        }
    }
}
