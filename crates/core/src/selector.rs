use rand::Rng;
use rand::seq::IndexedRandom;

use crate::catalog::QuestionCatalog;
use crate::model::{ChooseMode, Outcome, Question, TopicId};
use crate::progress::TopicProgress;
use crate::settings::EngineSettings;

/// Discrete roll over the non-exhausted topics plus both choose modes.
///
/// Exhausted topics drop out of the roll instead of redistributing their
/// weight to the remaining topics, so the choose faces gain mass as the deck
/// depletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeSelector {
    category_weight: u32,
    choose_weight: u32,
}

impl Default for OutcomeSelector {
    fn default() -> Self {
        Self {
            category_weight: 1,
            choose_weight: 1,
        }
    }
}

impl OutcomeSelector {
    #[must_use]
    pub(crate) fn new(category_weight: u32, choose_weight: u32) -> Self {
        Self {
            category_weight,
            choose_weight,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.category_weight(), settings.choose_weight())
    }

    /// Weighted faces currently on the die, categories first.
    #[must_use]
    pub fn eligible(
        &self,
        progress: &TopicProgress,
        catalog: &QuestionCatalog,
    ) -> Vec<(Outcome, u64)> {
        let categories = TopicId::ALL
            .into_iter()
            .filter(|topic| !progress.is_exhausted(catalog, *topic))
            .map(|topic| (Outcome::Category(topic), u64::from(self.category_weight)));
        let choices = ChooseMode::ALL
            .into_iter()
            .map(|mode| (Outcome::Choose(mode), u64::from(self.choose_weight)));
        categories
            .chain(choices)
            .filter(|(_, weight)| *weight > 0)
            .collect()
    }

    /// Probability of each eligible face. Empty when the deck is exhausted.
    #[must_use]
    pub fn odds(&self, progress: &TopicProgress, catalog: &QuestionCatalog) -> Vec<(Outcome, f64)> {
        let eligible = self.eligible(progress, catalog);
        if !has_category(&eligible) {
            return Vec::new();
        }
        let total: u64 = eligible.iter().map(|(_, weight)| *weight).sum();
        eligible
            .into_iter()
            .map(|(outcome, weight)| (outcome, weight as f64 / total as f64))
            .collect()
    }

    /// Roll the die.
    ///
    /// Returns `None` once every topic is exhausted; the caller must then
    /// offer a reshuffle or the end of the game.
    pub fn draw_outcome<R: Rng + ?Sized>(
        &self,
        progress: &TopicProgress,
        catalog: &QuestionCatalog,
        rng: &mut R,
    ) -> Option<Outcome> {
        let eligible = self.eligible(progress, catalog);
        if !has_category(&eligible) {
            return None;
        }
        eligible
            .choose_weighted(rng, |(_, weight)| *weight)
            .ok()
            .map(|(outcome, _)| *outcome)
    }
}

fn has_category(eligible: &[(Outcome, u64)]) -> bool {
    eligible
        .iter()
        .any(|(outcome, _)| matches!(outcome, Outcome::Category(_)))
}

/// Pick an unconsumed question of `topic` uniformly at random.
///
/// Returns `None` when the topic has nothing left. The question is not marked
/// consumed; that only happens on completion.
pub fn draw_question<'a, R: Rng + ?Sized>(
    catalog: &'a QuestionCatalog,
    progress: &TopicProgress,
    topic: TopicId,
    rng: &mut R,
) -> Option<&'a Question> {
    let available: Vec<&Question> = progress.available(catalog, topic).collect();
    available.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionDraft, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn draft(id: u64, topic: TopicId) -> QuestionDraft {
        QuestionDraft {
            id,
            topic,
            prompt: format!("Q{id}"),
            date_label: String::new(),
            answer_label: format!("A{id}"),
        }
    }

    /// A(2: a1, a2), B(1: b1); the other topics start empty.
    fn small_catalog() -> QuestionCatalog {
        QuestionCatalog::from_drafts(vec![
            draft(1, TopicId::History),
            draft(2, TopicId::History),
            draft(10, TopicId::Science),
        ])
        .unwrap()
    }

    fn full_catalog() -> QuestionCatalog {
        let drafts = TopicId::ALL
            .into_iter()
            .enumerate()
            .flat_map(|(t, topic)| (0..3).map(move |i| draft((t * 10 + i) as u64, topic)));
        QuestionCatalog::from_drafts(drafts).unwrap()
    }

    #[test]
    fn fresh_deck_has_six_equal_faces() {
        let catalog = full_catalog();
        let odds = OutcomeSelector::default().odds(&TopicProgress::new(), &catalog);
        assert_eq!(odds.len(), 6);
        for (_, p) in odds {
            assert!((p - 1.0 / 6.0).abs() < 1e-9);
        }
    }

    #[test]
    fn exhausted_topics_shift_mass_to_choose_faces() {
        let catalog = small_catalog();
        let mut progress = TopicProgress::new();
        let odds = OutcomeSelector::default().odds(&progress, &catalog);
        // History and Science remain; Culture and Geography have no questions.
        assert_eq!(odds.len(), 4);

        for q in catalog.questions_of(TopicId::History) {
            progress.mark_consumed(q);
        }
        let odds = OutcomeSelector::default().odds(&progress, &catalog);
        assert_eq!(odds.len(), 3);
        let choose_mass: f64 = odds
            .iter()
            .filter(|(o, _)| matches!(o, Outcome::Choose(_)))
            .map(|(_, p)| p)
            .sum();
        assert!((choose_mass - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn exhausted_topic_is_never_rolled() {
        let catalog = small_catalog();
        let mut progress = TopicProgress::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..2 {
            let q = draw_question(&catalog, &progress, TopicId::History, &mut rng)
                .unwrap()
                .clone();
            progress.mark_consumed(&q);
        }

        assert!(progress.is_exhausted(&catalog, TopicId::History));
        assert!(draw_question(&catalog, &progress, TopicId::History, &mut rng).is_none());

        let selector = OutcomeSelector::default();
        for _ in 0..500 {
            let outcome = selector.draw_outcome(&progress, &catalog, &mut rng).unwrap();
            assert_ne!(outcome, Outcome::Category(TopicId::History));
        }

        progress.reset_topic(TopicId::History);
        let rolled_history = (0..500).any(|_| {
            selector.draw_outcome(&progress, &catalog, &mut rng)
                == Some(Outcome::Category(TopicId::History))
        });
        assert!(rolled_history);
    }

    #[test]
    fn fully_exhausted_deck_returns_none() {
        let catalog = small_catalog();
        let mut progress = TopicProgress::new();
        for q in catalog.iter() {
            progress.mark_consumed(q);
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            OutcomeSelector::default().draw_outcome(&progress, &catalog, &mut rng),
            None
        );
        assert!(OutcomeSelector::default().odds(&progress, &catalog).is_empty());
    }

    #[test]
    fn zero_choose_weight_only_rolls_categories() {
        let catalog = full_catalog();
        let selector = OutcomeSelector::new(1, 0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let outcome = selector
                .draw_outcome(&TopicProgress::new(), &catalog, &mut rng)
                .unwrap();
            assert!(matches!(outcome, Outcome::Category(_)));
        }
    }

    #[test]
    fn heaviest_weights_still_roll() {
        use crate::settings::MAX_ROLL_WEIGHT;

        let catalog = full_catalog();
        let settings =
            EngineSettings::new(5, 300, MAX_ROLL_WEIGHT, MAX_ROLL_WEIGHT, "k").unwrap();
        let selector = OutcomeSelector::from_settings(&settings);
        let progress = TopicProgress::new();

        let odds = selector.odds(&progress, &catalog);
        assert_eq!(odds.len(), 6);
        let mass: f64 = odds.iter().map(|(_, p)| p).sum();
        assert!((mass - 1.0).abs() < 1e-9);

        let mut rng = StdRng::seed_from_u64(5);
        assert!(selector.draw_outcome(&progress, &catalog, &mut rng).is_some());
    }

    #[test]
    fn drawn_question_comes_from_the_unconsumed_pool() {
        let catalog = small_catalog();
        let mut progress = TopicProgress::new();
        progress.mark_consumed(catalog.get(QuestionId::new(1)).unwrap());
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..50 {
            let q = draw_question(&catalog, &progress, TopicId::History, &mut rng).unwrap();
            assert_eq!(q.id(), QuestionId::new(2));
        }
    }

    #[test]
    fn draws_never_repeat_within_a_rotation() {
        let catalog = full_catalog();
        let mut progress = TopicProgress::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen: HashSet<QuestionId> = HashSet::new();

        while let Some(q) = draw_question(&catalog, &progress, TopicId::Culture, &mut rng) {
            assert!(seen.insert(q.id()), "question {} drawn twice", q.id());
            let q = q.clone();
            progress.mark_consumed(&q);
        }
        assert_eq!(seen.len(), catalog.total(TopicId::Culture));
    }
}
