//! Linear undo/redo over immutable snapshots.
//!
//! Entry 0 is the initial state and can never be undone past. Pushing a new
//! snapshot discards everything after the pointer.

#[derive(Debug, Clone)]
pub struct History<S> {
    entries: Vec<S>,
    pointer: usize,
    limit: Option<usize>,
}

impl<S> History<S> {
    pub fn new(initial: S) -> Self {
        Self {
            entries: vec![initial],
            pointer: 0,
            limit: None,
        }
    }

    /// Keeps at most `limit` entries; older ones fall off the bottom and the
    /// oldest kept entry becomes the new base. `0` means unbounded.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit.max(2));
        self.enforce_limit();
        self
    }

    pub fn push_state(&mut self, snapshot: S) {
        self.entries.truncate(self.pointer + 1);
        self.entries.push(snapshot);
        self.pointer = self.entries.len() - 1;
        self.enforce_limit();
    }

    pub fn undo(&mut self, apply: impl FnOnce(&S)) -> bool {
        if self.pointer == 0 {
            return false;
        }
        self.pointer -= 1;
        apply(&self.entries[self.pointer]);
        true
    }

    pub fn redo(&mut self, apply: impl FnOnce(&S)) -> bool {
        if self.pointer + 1 >= self.entries.len() {
            return false;
        }
        self.pointer += 1;
        apply(&self.entries[self.pointer]);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.entries.len()
    }

    pub fn current(&self) -> &S {
        &self.entries[self.pointer]
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries and starts over from `initial`.
    pub fn reset(&mut self, initial: S) {
        self.entries.clear();
        self.entries.push(initial);
        self.pointer = 0;
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        if self.entries.len() > limit {
            let excess = self.entries.len() - limit;
            let excess = excess.min(self.pointer);
            self.entries.drain(..excess);
            self.pointer -= excess;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::History;

    #[test]
    fn undo_and_redo_are_inverses() {
        let mut history = History::new("S0");
        history.push_state("S1");
        history.push_state("S2");

        let mut seen = "";
        assert!(history.undo(|s| seen = *s));
        assert!(history.undo(|s| seen = *s));
        assert_eq!(seen, "S0");
        assert!(!history.can_undo());
        assert!(!history.undo(|s| seen = *s));

        assert!(history.redo(|s| seen = *s));
        assert!(history.redo(|s| seen = *s));
        assert_eq!(seen, "S2");
        assert!(!history.can_redo());
        assert!(!history.redo(|s| seen = *s));
    }

    #[test]
    fn push_discards_the_redo_branch() {
        let mut history = History::new(0);
        history.push_state(1);
        history.push_state(2);
        history.undo(|_| {});
        history.push_state(3);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(*history.current(), 3);
        let mut seen = 0;
        history.undo(|s| seen = *s);
        assert_eq!(seen, 1);
    }

    #[test]
    fn flags_track_pointer() {
        let mut history = History::new(0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        history.push_state(1);
        assert!(history.can_undo());
        assert!(!history.can_redo());
        history.undo(|_| {});
        assert!(history.can_redo());
    }

    #[test]
    fn limit_drops_oldest_entries() {
        let mut history = History::new(0).with_limit(3);
        for n in 1..=5 {
            history.push_state(n);
        }
        assert_eq!(history.len(), 3);
        let mut seen = 0;
        while history.undo(|s| seen = *s) {}
        assert_eq!(seen, 3);
    }
}
