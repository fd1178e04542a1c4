use chrono::{DateTime, Utc};

use trivia_core::model::{ChooseMode, FlowStep, Question, SessionId, TopicId};

use super::progress::TopicStatus;

/// Discard pile as the UI browses it, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscardView {
    pub len: usize,
    /// Newest-first position; 0 is the most recently discarded card.
    pub cursor: usize,
    /// One-based `(n, m)` label of the card under the cursor; `None` when empty.
    pub position: Option<(usize, usize)>,
    pub current: Option<Question>,
    pub can_go_older: bool,
    pub can_go_newer: bool,
}

/// Read-only picture of the engine after a mutation.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineView {
    pub session_id: SessionId,
    pub created_at: Option<DateTime<Utc>>,
    pub flow_step: FlowStep,
    pub selected_topic: Option<TopicId>,
    pub current_question: Option<Question>,
    pub is_flipped: bool,
    pub has_revealed_answer: bool,
    pub pending_choice_mode: Option<ChooseMode>,
    pub pending_result_topic: Option<TopicId>,
    pub topics: Vec<TopicStatus>,
    pub deck_exhausted: bool,
    pub discard: DiscardView,
}

impl EngineView {
    #[must_use]
    pub fn topic(&self, topic: TopicId) -> Option<&TopicStatus> {
        self.topics.iter().find(|status| status.topic == topic)
    }

    /// Topics that should show a low-cards warning.
    #[must_use]
    pub fn low_topics(&self) -> Vec<TopicId> {
        self.topics
            .iter()
            .filter(|status| status.is_low)
            .map(|status| status.topic)
            .collect()
    }
}
