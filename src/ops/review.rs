//! The review session: one loaded collection of task lines, the filtered
//! view over it, the current selection, and the undo history.
//!
//! Every mutation follows the same path: compute the new text, write the
//! line back to its file, update the in-memory record, push the prior
//! state onto the undo stack, reload, and restore the cursor.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::io::line_store::{self, LineWrite, StoreError};
use crate::io::notes_io::{self, LoadOutcome};
use crate::model::filter::FilterState;
use crate::model::history::{HistoryItem, HistoryKind};
use crate::model::task::{Priority, TaskKey, TaskLine};
use crate::ops::filter::filtered_positions;
use crate::ops::mutate::Mutation;
use crate::ops::sweep::clear_expired;
use crate::ops::undo::UndoStack;
use crate::parse::markers::{compose_task, has_priority, set_priority};
use crate::util::dates::{Clock, SystemClock};

pub const DEFAULT_INBOX: &str = "New Tasks.md";

/// Receives conditions the front-end should surface to the user.
pub trait Notifier {
    /// The directory is missing, not a directory, or has no markdown
    /// files. The front-end is expected to offer a new directory and call
    /// `Reviewer::set_directory`.
    fn no_files_found(&mut self, dir: &Path);

    /// A file whose name marks it as a sync conflict. Reported once per
    /// file per session; loading continues.
    fn conflict_detected(&mut self, file: &Path);
}

/// Notifier that only logs.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn no_files_found(&mut self, dir: &Path) {
        log::warn!("no markdown files found in {}", dir.display());
    }

    fn conflict_detected(&mut self, file: &Path) {
        log::warn!("conflict file detected: {}", file.display());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why an operation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSelection,
    MissingFile,
    /// The line is no longer where (or what) it was at load time
    StaleLine,
    NothingToUndo,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::NoSelection => "no task selected",
            SkipReason::MissingFile => "file no longer exists",
            SkipReason::StaleLine => "line changed on disk",
            SkipReason::NothingToUndo => "nothing to undo",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
}

impl Outcome {
    pub fn applied(self) -> bool {
        self == Outcome::Applied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded {
        tasks: usize,
        /// Lines whose spent snooze marker was cleared during this load
        swept: usize,
    },
    NoFiles,
}

pub struct Reviewer {
    dir: PathBuf,
    inbox: String,
    tasks: Vec<TaskLine>,
    /// Positions in `tasks`, in display order
    visible: Vec<usize>,
    filter: FilterState,
    selected: Option<TaskKey>,
    history: UndoStack,
    conflicts: Vec<PathBuf>,
    reported_conflicts: HashSet<PathBuf>,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
}

impl Reviewer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Reviewer {
            dir: dir.into(),
            inbox: DEFAULT_INBOX.to_string(),
            tasks: Vec::new(),
            visible: Vec::new(),
            filter: FilterState::default(),
            selected: None,
            history: UndoStack::new(),
            conflicts: Vec::new(),
            reported_conflicts: HashSet::new(),
            clock: Box::new(SystemClock),
            notifier: Box::new(LogNotifier),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self
    }

    /// Inbox file name; empty picks the alphabetically-first markdown file.
    pub fn with_inbox(mut self, inbox: impl Into<String>) -> Self {
        self.inbox = inbox.into();
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn tasks(&self) -> &[TaskLine] {
        &self.tasks
    }

    /// The filtered, priority-sorted view.
    pub fn visible(&self) -> Vec<&TaskLine> {
        self.visible.iter().map(|&i| &self.tasks[i]).collect()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn conflicts(&self) -> &[PathBuf] {
        &self.conflicts
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn find(&self, key: &TaskKey) -> Option<&TaskLine> {
        self.tasks.iter().find(|t| t.is(key))
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Re-read the directory, clear spent snooze markers, and recompute
    /// the visible list. The selection is kept when still visible.
    ///
    /// The view is rebuilt even when loading fails part way, so it never
    /// points past the end of a partly loaded collection.
    pub fn refresh(&mut self) -> Result<LoadStatus, ReviewError> {
        let loaded = self.reload();
        self.recompute_visible();
        let keep = self.selected.clone();
        self.restore_selection(None, keep);
        loaded
    }

    fn reload(&mut self) -> Result<LoadStatus, ReviewError> {
        self.tasks.clear();
        self.conflicts.clear();

        match notes_io::load_directory(&self.dir)? {
            LoadOutcome::NoFiles => {
                self.notifier.no_files_found(&self.dir);
                Ok(LoadStatus::NoFiles)
            }
            LoadOutcome::Loaded(scan) => {
                for file in &scan.conflicts {
                    if self.reported_conflicts.insert(file.clone()) {
                        self.notifier.conflict_detected(file);
                    }
                }
                self.conflicts = scan.conflicts;
                self.tasks = scan.tasks;
                let swept = self.sweep_snoozes()?;
                Ok(LoadStatus::Loaded {
                    tasks: self.tasks.len(),
                    swept,
                })
            }
        }
    }

    /// Point the session at another directory. History from the old
    /// directory is dropped.
    pub fn set_directory(&mut self, dir: impl Into<PathBuf>) -> Result<LoadStatus, ReviewError> {
        self.dir = dir.into();
        self.history.clear();
        self.selected = None;
        self.reported_conflicts.clear();
        self.refresh()
    }

    /// Strip spent hourly snoozes and persist each change. Not undoable
    /// itself; history entries that expected the old text are retargeted.
    fn sweep_snoozes(&mut self) -> Result<usize, ReviewError> {
        let now = self.clock.now();
        let mut swept = 0;
        for task in &mut self.tasks {
            let Some(cleared) = clear_expired(&task.text, now) else {
                continue;
            };
            match line_store::overwrite_line(&task.path, task.line_index, Some(&task.text), &cleared)? {
                LineWrite::Written { index } => {
                    log::debug!("cleared spent snooze at {}", task.key());
                    self.history.retarget(&task.path, &task.text, &cleared);
                    task.text = cleared;
                    task.line_index = index;
                    swept += 1;
                }
                other => log::warn!("could not clear snooze at {}: {:?}", task.key(), other),
            }
        }
        Ok(swept)
    }

    // -----------------------------------------------------------------------
    // Filtering and selection
    // -----------------------------------------------------------------------

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.recompute_visible();
        let keep = self.selected.clone();
        self.restore_selection(None, keep);
    }

    fn recompute_visible(&mut self) {
        let now = self.clock.now();
        self.visible = filtered_positions(&self.tasks, &self.filter, now);
    }

    pub fn selected(&self) -> Option<&TaskLine> {
        self.selected.as_ref().and_then(|k| self.find(k))
    }

    pub fn selected_key(&self) -> Option<&TaskKey> {
        self.selected.as_ref()
    }

    /// Row of the selection in the visible list.
    pub fn selected_row(&self) -> Option<usize> {
        let key = self.selected.as_ref()?;
        self.visible.iter().position(|&i| self.tasks[i].is(key))
    }

    /// Select any loaded task, visible or not. Returns false when no task
    /// has that key.
    pub fn select(&mut self, key: &TaskKey) -> bool {
        if self.find(key).is_some() {
            self.selected = Some(key.clone());
            true
        } else {
            false
        }
    }

    /// Select the task on a visible row.
    pub fn select_row(&mut self, row: usize) -> bool {
        match self.visible.get(row) {
            Some(&i) => {
                self.selected = Some(self.tasks[i].key());
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) -> bool {
        let row = self.selected_row().map_or(0, |r| r + 1);
        self.select_row(row)
    }

    pub fn select_prev(&mut self) -> bool {
        match self.selected_row() {
            Some(r) if r > 0 => self.select_row(r - 1),
            _ => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Put the cursor back after the visible list changed.
    ///
    /// With `follow`, a task that is still visible stays selected.
    /// Otherwise the cursor goes to the remembered row, the last row if the
    /// list shrank below it, or the first row if there was no valid row.
    fn restore_selection(&mut self, row: Option<usize>, follow: Option<TaskKey>) {
        if let Some(key) = follow
            && self.visible.iter().any(|&i| self.tasks[i].is(&key))
        {
            self.selected = Some(key);
            return;
        }
        if self.visible.is_empty() {
            self.selected = None;
            return;
        }
        let target = match row {
            Some(r) if r < self.visible.len() => r,
            Some(_) => self.visible.len() - 1,
            None => 0,
        };
        self.select_row(target);
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    fn selected_position(&self) -> Option<usize> {
        let key = self.selected.as_ref()?;
        self.tasks.iter().position(|t| t.is(key))
    }

    fn skipped(&self, write: LineWrite, task: &TaskLine) -> Outcome {
        let reason = match write {
            LineWrite::MissingFile => SkipReason::MissingFile,
            _ => SkipReason::StaleLine,
        };
        log::warn!("skipped change to {}: {:?}", task.key(), reason);
        Outcome::Skipped(reason)
    }

    /// Apply a text mutation to the selected task.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<Outcome, ReviewError> {
        let Some(pos) = self.selected_position() else {
            return Ok(Outcome::Skipped(SkipReason::NoSelection));
        };
        let row = self.selected_row();
        let before = self.tasks[pos].clone();
        let new_text = mutation.apply(&before.text, self.clock.now());

        let write =
            line_store::overwrite_line(&before.path, before.line_index, Some(&before.text), &new_text)?;
        let LineWrite::Written { index } = write else {
            return Ok(self.skipped(write, &before));
        };

        let task = &mut self.tasks[pos];
        task.text = new_text.clone();
        task.line_index = index;
        let key = task.key();
        log::info!("{} {}: {}", mutation.label(), key, new_text);
        self.history.push(HistoryItem::edit(before, new_text));

        self.refresh()?;
        if mutation.keeps_row() {
            self.restore_selection(row, None);
        } else {
            self.restore_selection(row, Some(key));
        }
        Ok(Outcome::Applied)
    }

    /// Remove the selected task's line from its file.
    pub fn delete(&mut self) -> Result<Outcome, ReviewError> {
        let Some(pos) = self.selected_position() else {
            return Ok(Outcome::Skipped(SkipReason::NoSelection));
        };
        let row = self.selected_row();
        let before = self.tasks[pos].clone();

        let write = line_store::delete_line(&before.path, before.line_index, Some(&before.text))?;
        let LineWrite::Written { index } = write else {
            return Ok(self.skipped(write, &before));
        };

        self.tasks.remove(pos);
        let snapshot = TaskLine {
            line_index: index,
            ..before
        };
        log::info!("deleted {}: {}", snapshot.key(), snapshot.text);
        self.history.push(HistoryItem::delete(snapshot));

        self.refresh()?;
        self.restore_selection(row, None);
        Ok(Outcome::Applied)
    }

    /// Strip priority glyphs from every loaded task, one history entry per
    /// changed line. Returns how many lines changed.
    pub fn clear_priorities(&mut self) -> Result<usize, ReviewError> {
        let mut changed = 0;
        for pos in 0..self.tasks.len() {
            if !has_priority(&self.tasks[pos].text) {
                continue;
            }
            let before = self.tasks[pos].clone();
            let new_text = set_priority(&before.text, Priority::Normal);
            let write = line_store::overwrite_line(
                &before.path,
                before.line_index,
                Some(&before.text),
                &new_text,
            )?;
            let LineWrite::Written { index } = write else {
                self.skipped(write, &before);
                continue;
            };
            let task = &mut self.tasks[pos];
            task.text = new_text.clone();
            task.line_index = index;
            self.history.push(HistoryItem::edit(before, new_text));
            changed += 1;
        }
        if changed > 0 {
            log::info!("cleared priority on {} tasks", changed);
            let keep = self.selected.clone();
            self.refresh()?;
            self.restore_selection(None, keep);
        }
        Ok(changed)
    }

    /// Revert the most recent mutation.
    ///
    /// Edits are written back over the line that holds the mutated text;
    /// deletions re-insert the line at its old index (or at end of file).
    /// The collection is then reloaded, so the restored task takes its
    /// place in file order. An undo that cannot be written stays on the
    /// stack.
    pub fn undo(&mut self) -> Result<Outcome, ReviewError> {
        let Some(item) = self.history.pop() else {
            return Ok(Outcome::Skipped(SkipReason::NothingToUndo));
        };
        let snapshot = &item.snapshot;

        let write = match &item.kind {
            HistoryKind::Edit { written } => line_store::overwrite_line(
                &snapshot.path,
                snapshot.line_index,
                Some(written),
                &snapshot.text,
            ),
            HistoryKind::Delete => {
                line_store::insert_line(&snapshot.path, snapshot.line_index, &snapshot.text)
            }
        };
        let write = match write {
            Ok(write) => write,
            Err(e) => {
                self.history.push(item);
                return Err(e.into());
            }
        };
        let LineWrite::Written { index } = write else {
            let outcome = self.skipped(write, snapshot);
            self.history.push(item);
            return Ok(outcome);
        };

        let key = TaskKey::new(snapshot.path.clone(), index);
        log::info!("undo {}", key);

        self.refresh()?;
        self.restore_selection(None, Some(key));
        Ok(Outcome::Applied)
    }

    /// Prepend a new open task dated today to the inbox file. Returns the
    /// key of the new line, or `None` for a blank description.
    pub fn add_task(
        &mut self,
        description: &str,
        priority: Priority,
    ) -> Result<Option<TaskKey>, ReviewError> {
        if description.trim().is_empty() {
            return Ok(None);
        }
        let line = compose_task(description, priority, self.clock.today());
        let target = notes_io::resolve_inbox(&self.dir, &self.inbox, DEFAULT_INBOX)?;
        line_store::prepend_line(&target, &line)?;
        log::info!("added to {}: {}", target.display(), line);

        let key = TaskKey::new(target, 0);
        self.refresh()?;
        self.restore_selection(None, Some(key.clone()));
        Ok(Some(key))
    }
}
