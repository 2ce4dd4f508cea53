//! History sink: receives one scene snapshot per committed mutation.
//!
//! The engine never calls a sink directly; it returns
//! [`Action::Commit`](crate::engine::Action::Commit) and the host forwards
//! those to whatever sink it uses. [`HistoryLog`] is an in-memory undo/redo
//! stack that hosts can use as that sink.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::doc::Shape;
use crate::engine::Action;

/// Default number of snapshots kept by [`HistoryLog`].
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Receiver of committed scene states.
pub trait HistorySink {
    fn commit(&mut self, shapes: &[Shape]);
}

/// Forward every `Action::Commit` in `actions` to `sink`. Returns how many were forwarded.
pub fn forward_commits<S>(actions: &[Action], sink: &mut S) -> usize
where
    S: HistorySink + ?Sized,
{
    let mut count = 0;
    for action in actions {
        if let Action::Commit { shapes } = action {
            sink.commit(shapes);
            count += 1;
        }
    }
    count
}

/// Bounded undo/redo stack of scene snapshots.
///
/// `entries[cursor - 1]` is the current state. Committing after an undo
/// discards the redo tail.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Vec<Vec<Shape>>,
    cursor: usize,
    limit: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryLog {
    /// Empty log keeping at most `limit` snapshots (at least one).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { entries: Vec::new(), cursor: 0, limit: limit.max(1) }
    }

    /// Log whose first entry is `baseline`, so the first commit can be undone.
    #[must_use]
    pub fn with_baseline(limit: usize, baseline: Vec<Shape>) -> Self {
        let mut log = Self::new(limit);
        log.entries.push(baseline);
        log.cursor = 1;
        log
    }

    /// Step back one commit and return the state to restore.
    pub fn undo(&mut self) -> Option<&[Shape]> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor - 1).map(Vec::as_slice)
    }

    /// Re-apply the commit most recently undone.
    pub fn redo(&mut self) -> Option<&[Shape]> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor - 1).map(Vec::as_slice)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 1
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// The current state, if anything has been recorded.
    #[must_use]
    pub fn current(&self) -> Option<&[Shape]> {
        self.cursor.checked_sub(1).and_then(|i| self.entries.get(i)).map(Vec::as_slice)
    }

    /// Number of stored snapshots, including the redo tail.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistorySink for HistoryLog {
    fn commit(&mut self, shapes: &[Shape]) {
        self.entries.truncate(self.cursor);
        self.entries.push(shapes.to_vec());
        if self.entries.len() > self.limit {
            let overflow = self.entries.len() - self.limit;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len();
        tracing::debug!(entries = self.entries.len(), "history commit");
    }
}
