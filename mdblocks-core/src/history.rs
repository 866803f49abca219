//! Undo/redo history over whole-document snapshots
//!
//! Content changes are observed as they happen but only committed once the
//! document has been quiet for the debounce window, so a burst of typing
//! becomes a single entry.

use std::time::{Duration, Instant};

use log::debug;

/// A captured (content, focus, cursor) snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub content: String,
    pub editing_index: Option<usize>,
    pub cursor: Option<usize>,
}

/// Linear undo stack with a cursor. Entries after the cursor are discarded as
/// soon as a new edit is committed.
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
    limit: usize,
    debounce: Duration,
    pending: Option<(String, Instant)>,
    is_undo_redo: bool,
}

impl History {
    pub fn new(initial: &str, limit: usize, debounce: Duration) -> Self {
        Self {
            entries: vec![HistoryEntry {
                content: initial.to_string(),
                editing_index: None,
                cursor: None,
            }],
            index: 0,
            limit: limit.max(1),
            debounce,
            pending: None,
            is_undo_redo: false,
        }
    }

    /// Forget everything and start over from `content`
    pub fn reset(&mut self, content: &str) {
        *self = Self::new(content, self.limit, self.debounce);
    }

    /// Record that the document changed. Replays from undo/redo are skipped.
    pub fn observe_at(&mut self, content: &str, now: Instant) {
        if self.is_undo_redo {
            self.is_undo_redo = false;
            self.pending = None;
            return;
        }
        self.pending = Some((content.to_string(), now));
    }

    pub fn observe(&mut self, content: &str) {
        self.observe_at(content, Instant::now());
    }

    /// Commit the pending change once the debounce window has elapsed.
    /// Returns true when a new entry was stored.
    pub fn poll_at(
        &mut self,
        now: Instant,
        editing_index: Option<usize>,
        cursor: Option<usize>,
    ) -> bool {
        match &self.pending {
            Some((_, since)) if now.saturating_duration_since(*since) >= self.debounce => {
                self.flush(editing_index, cursor)
            }
            _ => false,
        }
    }

    /// Commit the pending change right away
    pub fn flush(&mut self, editing_index: Option<usize>, cursor: Option<usize>) -> bool {
        match self.pending.take() {
            Some((content, _)) => self.commit(content, editing_index, cursor),
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn commit(&mut self, content: String, editing_index: Option<usize>, cursor: Option<usize>) -> bool {
        if self.entries[self.index].content == content {
            return false;
        }

        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry {
            content,
            editing_index,
            cursor,
        });
        self.index = self.entries.len() - 1;

        if self.entries.len() > self.limit {
            self.entries.remove(0);
            self.index -= 1;
        }

        debug!("history: {} entries, at {}", self.entries.len(), self.index);
        true
    }

    /// Step back one entry. The caller re-emits the returned content; the
    /// observation that causes is ignored.
    pub fn undo(
        &mut self,
        editing_index: Option<usize>,
        cursor: Option<usize>,
    ) -> Option<HistoryEntry> {
        self.flush(editing_index, cursor);
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.is_undo_redo = true;
        Some(self.entries[self.index].clone())
    }

    /// Step forward one entry after an undo
    pub fn redo(
        &mut self,
        editing_index: Option<usize>,
        cursor: Option<usize>,
    ) -> Option<HistoryEntry> {
        self.flush(editing_index, cursor);
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.is_undo_redo = true;
        Some(self.entries[self.index].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0 || self.pending.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn commit_now(history: &mut History, content: &str, t: &mut Instant) {
        history.observe_at(content, *t);
        *t += DEBOUNCE;
        assert!(history.poll_at(*t, None, None));
    }

    /// Replay an undo/redo the way the editor does: the entry's content is
    /// emitted and observed again
    fn replay(history: &mut History, entry: Option<HistoryEntry>, t: Instant) -> Option<String> {
        let entry = entry?;
        history.observe_at(&entry.content, t);
        Some(entry.content)
    }

    #[test]
    fn test_initial_entry() {
        let history = History::new("start", 100, DEBOUNCE);
        assert_eq!(history.len(), 1);
        assert_eq!(history.entries()[0].content, "start");
        assert_eq!(history.entries()[0].editing_index, None);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_debounce_collapses_bursts() {
        let mut history = History::new("", 100, DEBOUNCE);
        let t0 = Instant::now();
        history.observe_at("a", t0);
        history.observe_at("ab", t0 + Duration::from_millis(100));
        history.observe_at("abc", t0 + Duration::from_millis(200));

        assert!(!history.poll_at(t0 + Duration::from_millis(600), Some(0), Some(3)));
        assert!(history.poll_at(t0 + Duration::from_millis(700), Some(0), Some(3)));

        assert_eq!(history.len(), 2);
        assert_eq!(
            history.entries()[1],
            HistoryEntry {
                content: "abc".to_string(),
                editing_index: Some(0),
                cursor: Some(3),
            }
        );
    }

    #[test]
    fn test_undo_returns_to_first_state_and_redo_replays() {
        let mut history = History::new("s0", 100, DEBOUNCE);
        let mut t = Instant::now();
        for content in ["s1", "s2", "s3"] {
            commit_now(&mut history, content, &mut t);
        }

        let mut seen = Vec::new();
        for _ in 0..3 {
            let entry = history.undo(None, None);
            seen.push(replay(&mut history, entry, t));
        }
        assert_eq!(
            seen,
            vec![Some("s2".to_string()), Some("s1".to_string()), Some("s0".to_string())]
        );
        assert_eq!(history.undo(None, None), None);

        let mut forward = Vec::new();
        for _ in 0..3 {
            let entry = history.redo(None, None);
            forward.push(replay(&mut history, entry, t));
        }
        assert_eq!(
            forward,
            vec![Some("s1".to_string()), Some("s2".to_string()), Some("s3".to_string())]
        );
        assert_eq!(history.redo(None, None), None);
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_replay_is_not_recorded() {
        let mut history = History::new("a", 100, DEBOUNCE);
        let mut t = Instant::now();
        commit_now(&mut history, "b", &mut t);

        let entry = history.undo(None, None);
        replay(&mut history, entry, t);
        assert!(!history.has_pending());
        assert_eq!(history.len(), 2);
        assert!(history.can_redo());
    }

    #[test]
    fn test_new_edit_discards_redo_branch() {
        let mut history = History::new("a", 100, DEBOUNCE);
        let mut t = Instant::now();
        commit_now(&mut history, "b", &mut t);
        commit_now(&mut history, "c", &mut t);

        let entry = history.undo(None, None);
        replay(&mut history, entry, t);
        commit_now(&mut history, "x", &mut t);

        let contents: Vec<&str> = history.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "x"]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_identical_content_not_stored_twice() {
        let mut history = History::new("a", 100, DEBOUNCE);
        let mut t = Instant::now();
        commit_now(&mut history, "b", &mut t);
        history.observe_at("b", t);
        t += DEBOUNCE;
        assert!(!history.poll_at(t, None, None));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new("0", 3, DEBOUNCE);
        let mut t = Instant::now();
        for content in ["1", "2", "3", "4"] {
            commit_now(&mut history, content, &mut t);
        }
        let contents: Vec<&str> = history.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["2", "3", "4"]);
        assert_eq!(history.index(), 2);
    }

    #[test]
    fn test_undo_flushes_pending_edit() {
        let mut history = History::new("a", 100, DEBOUNCE);
        history.observe_at("ab", Instant::now());

        let entry = history.undo(Some(0), Some(2));
        assert_eq!(entry.map(|e| e.content), Some("a".to_string()));
        assert_eq!(history.entries()[1].content, "ab");
        assert_eq!(history.entries()[1].cursor, Some(2));
    }

    #[test]
    fn test_reset() {
        let mut history = History::new("a", 100, DEBOUNCE);
        let mut t = Instant::now();
        commit_now(&mut history, "b", &mut t);
        history.reset("fresh");
        assert_eq!(history.len(), 1);
        assert_eq!(history.entries()[0].content, "fresh");
    }
}
