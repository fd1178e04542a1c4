//! Discard pile of completed questions.
//!
//! Storage order is oldest-first append. Every browsing operation addresses
//! the pile newest-first: position 0 is the most recently discarded card,
//! `newest_first[i] == ids[len - 1 - i]`. That conversion lives here and
//! nowhere else.

use crate::catalog::QuestionCatalog;
use crate::model::{Question, QuestionId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscardHistory {
    ids: Vec<QuestionId>,
    cursor: usize,
}

impl DiscardHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from persisted ids (oldest first) and a newest-first cursor.
    ///
    /// An out-of-range cursor is clamped.
    #[must_use]
    pub fn from_persisted(ids: Vec<QuestionId>, cursor: usize) -> Self {
        let mut history = Self { ids, cursor };
        history.clamp_cursor();
        history
    }

    /// Ids in storage order, oldest first.
    #[must_use]
    pub fn ids(&self) -> &[QuestionId] {
        &self.ids
    }

    /// Newest-first cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Id at a newest-first position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<QuestionId> {
        let index = self.ids.len().checked_sub(position.checked_add(1)?)?;
        self.ids.get(index).copied()
    }

    /// Id under the cursor, or `None` when the pile is empty.
    #[must_use]
    pub fn current_id(&self) -> Option<QuestionId> {
        self.get(self.cursor)
    }

    /// Question under the cursor, resolved against the catalog.
    #[must_use]
    pub fn current<'a>(&self, catalog: &'a QuestionCatalog) -> Option<&'a Question> {
        self.current_id().and_then(|id| catalog.get(id))
    }

    /// Ids newest first, as the pile is rendered.
    pub fn newest_first(&self) -> impl DoubleEndedIterator<Item = QuestionId> + '_ {
        self.ids.iter().rev().copied()
    }

    /// One-based "n of m" label for the card under the cursor, newest first.
    #[must_use]
    pub fn position(&self) -> Option<(usize, usize)> {
        if self.ids.is_empty() {
            None
        } else {
            Some((self.cursor + 1, self.ids.len()))
        }
    }

    /// Discard a completed question; the cursor snaps to it.
    pub fn push(&mut self, id: QuestionId) {
        self.ids.push(id);
        self.cursor = 0;
    }

    #[must_use]
    pub fn can_go_older(&self) -> bool {
        self.cursor + 1 < self.ids.len()
    }

    #[must_use]
    pub fn can_go_newer(&self) -> bool {
        self.cursor > 0
    }

    /// Step toward older cards. Returns whether the cursor moved.
    pub fn go_older(&mut self) -> bool {
        if self.can_go_older() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Step toward newer cards. Returns whether the cursor moved.
    pub fn go_newer(&mut self) -> bool {
        if self.can_go_newer() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Move to a newest-first position; out-of-range positions are ignored.
    pub fn jump_to(&mut self, position: usize) -> bool {
        if position < self.ids.len() {
            self.cursor = position;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.cursor = 0;
    }

    /// Drop ids the catalog no longer knows. Returns the number removed.
    pub fn retain_known(&mut self, catalog: &QuestionCatalog) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| catalog.contains(*id));
        self.clamp_cursor();
        before - self.ids.len()
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.ids.len().saturating_sub(1));
    }
}
