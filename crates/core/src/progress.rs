use std::collections::{HashMap, HashSet};

use crate::catalog::QuestionCatalog;
use crate::model::{Question, QuestionId, TopicId};

/// Consumed question ids per topic for the current rotation.
///
/// Ids leave a set only through a reshuffle (`reset_topic` / `reset_all`),
/// an end of game, or load-time repair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicProgress {
    consumed: HashMap<TopicId, HashSet<QuestionId>>,
}

impl TopicProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from persisted per-topic id lists. Duplicates collapse.
    #[must_use]
    pub fn from_persisted(
        consumed: impl IntoIterator<Item = (TopicId, Vec<QuestionId>)>,
    ) -> Self {
        let mut progress = Self::new();
        for (topic, ids) in consumed {
            progress.consumed.entry(topic).or_default().extend(ids);
        }
        progress
    }

    #[must_use]
    pub fn consumed(&self, topic: TopicId) -> Option<&HashSet<QuestionId>> {
        self.consumed.get(&topic)
    }

    #[must_use]
    pub fn consumed_count(&self, topic: TopicId) -> usize {
        self.consumed.get(&topic).map_or(0, HashSet::len)
    }

    #[must_use]
    pub fn is_consumed(&self, question: &Question) -> bool {
        self.consumed
            .get(&question.topic())
            .is_some_and(|ids| ids.contains(&question.id()))
    }

    #[must_use]
    pub fn remaining_count(&self, catalog: &QuestionCatalog, topic: TopicId) -> usize {
        catalog
            .total(topic)
            .saturating_sub(self.consumed_count(topic))
    }

    #[must_use]
    pub fn is_exhausted(&self, catalog: &QuestionCatalog, topic: TopicId) -> bool {
        self.remaining_count(catalog, topic) == 0
    }

    /// Unconsumed questions of a topic, in catalog order.
    pub fn available<'c>(
        &self,
        catalog: &'c QuestionCatalog,
        topic: TopicId,
    ) -> impl Iterator<Item = &'c Question> + Clone {
        catalog
            .questions_of(topic)
            .filter(move |q| !self.is_consumed(q))
    }

    /// Record a completed question. Re-adding a known id is a no-op.
    pub fn mark_consumed(&mut self, question: &Question) {
        self.consumed
            .entry(question.topic())
            .or_default()
            .insert(question.id());
    }

    pub fn reset_topic(&mut self, topic: TopicId) {
        self.consumed.remove(&topic);
    }

    pub fn reset_all(&mut self) {
        self.consumed.clear();
    }

    /// Topics whose remaining count is below `threshold`, computed fresh.
    #[must_use]
    pub fn low_card_topics(&self, catalog: &QuestionCatalog, threshold: usize) -> Vec<TopicId> {
        TopicId::ALL
            .into_iter()
            .filter(|topic| self.remaining_count(catalog, *topic) < threshold)
            .collect()
    }

    /// Drop ids the catalog no longer knows or files under another topic.
    ///
    /// Returns the number of ids removed.
    pub fn retain_known(&mut self, catalog: &QuestionCatalog) -> usize {
        let mut removed = 0;
        for (topic, ids) in &mut self.consumed {
            let before = ids.len();
            ids.retain(|id| catalog.topic_of(*id) == Some(*topic));
            removed += before - ids.len();
        }
        self.consumed.retain(|_, ids| !ids.is_empty());
        removed
    }

    /// Sorted id lists per topic, for stable serialization.
    #[must_use]
    pub fn to_sorted_lists(&self) -> Vec<(TopicId, Vec<QuestionId>)> {
        TopicId::ALL
            .into_iter()
            .filter_map(|topic| {
                let ids = self.consumed.get(&topic)?;
                if ids.is_empty() {
                    return None;
                }
                let mut ids: Vec<_> = ids.iter().copied().collect();
                ids.sort_unstable();
                Some((topic, ids))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;
    use proptest::prelude::*;

    fn draft(id: u64, topic: TopicId) -> QuestionDraft {
        QuestionDraft {
            id,
            topic,
            prompt: format!("Q{id}"),
            date_label: String::new(),
            answer_label: format!("A{id}"),
        }
    }

    fn build_catalog() -> QuestionCatalog {
        QuestionCatalog::from_drafts(vec![
            draft(1, TopicId::History),
            draft(2, TopicId::History),
            draft(3, TopicId::History),
            draft(10, TopicId::Science),
        ])
        .unwrap()
    }

    fn question(catalog: &QuestionCatalog, id: u64) -> Question {
        catalog.get(QuestionId::new(id)).unwrap().clone()
    }

    #[test]
    fn mark_consumed_is_idempotent() {
        let catalog = build_catalog();
        let mut progress = TopicProgress::new();
        let q1 = question(&catalog, 1);

        progress.mark_consumed(&q1);
        progress.mark_consumed(&q1);

        assert_eq!(progress.consumed_count(TopicId::History), 1);
        assert_eq!(progress.remaining_count(&catalog, TopicId::History), 2);
    }

    #[test]
    fn exhaustion_and_reset_topic() {
        let catalog = build_catalog();
        let mut progress = TopicProgress::new();
        progress.mark_consumed(&question(&catalog, 10));
        progress.mark_consumed(&question(&catalog, 1));

        assert!(progress.is_exhausted(&catalog, TopicId::Science));
        assert!(!progress.is_exhausted(&catalog, TopicId::History));
        assert!(progress.is_exhausted(&catalog, TopicId::Geography));

        progress.reset_topic(TopicId::Science);
        assert!(!progress.is_exhausted(&catalog, TopicId::Science));
        assert_eq!(progress.consumed_count(TopicId::History), 1);

        progress.reset_all();
        assert_eq!(progress.consumed_count(TopicId::History), 0);
    }

    #[test]
    fn available_skips_consumed() {
        let catalog = build_catalog();
        let mut progress = TopicProgress::new();
        progress.mark_consumed(&question(&catalog, 2));

        let ids: Vec<_> = progress
            .available(&catalog, TopicId::History)
            .map(Question::id)
            .collect();
        assert_eq!(ids, vec![QuestionId::new(1), QuestionId::new(3)]);
    }

    #[test]
    fn low_card_topics_are_recomputed() {
        let catalog = build_catalog();
        let mut progress = TopicProgress::new();

        let low = progress.low_card_topics(&catalog, 3);
        assert_eq!(
            low,
            vec![TopicId::Science, TopicId::Culture, TopicId::Geography]
        );

        progress.mark_consumed(&question(&catalog, 1));
        let low = progress.low_card_topics(&catalog, 3);
        assert!(low.contains(&TopicId::History));
    }

    #[test]
    fn retain_known_drops_stale_and_misfiled_ids() {
        let catalog = build_catalog();
        let mut progress = TopicProgress::from_persisted(vec![
            (
                TopicId::History,
                vec![QuestionId::new(1), QuestionId::new(99), QuestionId::new(10)],
            ),
            (TopicId::Culture, vec![QuestionId::new(500)]),
        ]);

        let removed = progress.retain_known(&catalog);

        assert_eq!(removed, 3);
        assert_eq!(
            progress.to_sorted_lists(),
            vec![(TopicId::History, vec![QuestionId::new(1)])]
        );
    }

    proptest! {
        #[test]
        fn remaining_plus_consumed_is_total(picks in proptest::collection::vec(0usize..4, 0..20)) {
            let catalog = build_catalog();
            let all: Vec<Question> = catalog.iter().cloned().collect();
            let mut progress = TopicProgress::new();
            for pick in picks {
                progress.mark_consumed(&all[pick]);
                for topic in TopicId::ALL {
                    prop_assert_eq!(
                        progress.remaining_count(&catalog, topic) + progress.consumed_count(topic),
                        catalog.total(topic)
                    );
                }
            }
        }
    }
}
