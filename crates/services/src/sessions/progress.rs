use trivia_core::model::TopicId;
use trivia_core::{QuestionCatalog, TopicProgress};

/// Aggregated view of one topic's rotation, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicStatus {
    pub topic: TopicId,
    pub total: usize,
    pub consumed: usize,
    pub remaining: usize,
    pub is_exhausted: bool,
    pub is_low: bool,
}

impl TopicStatus {
    /// Recompute every topic's status; nothing here is cached.
    #[must_use]
    pub fn all(
        progress: &TopicProgress,
        catalog: &QuestionCatalog,
        low_threshold: usize,
    ) -> Vec<Self> {
        TopicId::ALL
            .into_iter()
            .map(|topic| {
                let remaining = progress.remaining_count(catalog, topic);
                Self {
                    topic,
                    total: catalog.total(topic),
                    consumed: progress.consumed_count(topic),
                    remaining,
                    is_exhausted: remaining == 0,
                    is_low: remaining < low_threshold,
                }
            })
            .collect()
    }
}
