use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::KeyValueStore;
use tokio::runtime::Handle;
use tokio::sync::watch;
use trivia_core::model::{FlowStep, Outcome, Question, SessionId, SessionState, TopicId};
use trivia_core::{
    Clock, DiscardHistory, EngineSettings, OutcomeSelector, QuestionCatalog, TopicProgress,
    draw_question,
};

use super::progress::TopicStatus;
use super::view::{DiscardView, EngineView};
use crate::error::EngineError;
use crate::persistence::{PersistedSnapshot, PersistenceGateway, SessionRecord};

//
// ─── ROLL RESULT ───────────────────────────────────────────────────────────────
//

/// What a roll of the die produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollResult {
    Rolled(Outcome),
    /// Every topic is exhausted; offer a full reshuffle or the end of the game.
    Exhausted,
}

//
// ─── MANAGER ───────────────────────────────────────────────────────────────────
//

/// Owns one game session and is the only writer of its state.
///
/// Every operation is a synchronous `&mut self` call. Mutations that change
/// state schedule a debounced snapshot write and publish a fresh
/// [`EngineView`] to subscribers.
pub struct SessionManager {
    catalog: Arc<QuestionCatalog>,
    settings: EngineSettings,
    selector: OutcomeSelector,
    clock: Clock,
    rng: StdRng,
    record: SessionRecord,
    gateway: PersistenceGateway,
    view_tx: watch::Sender<EngineView>,
}

impl SessionManager {
    /// Load the persisted session, or start a fresh one, and build the manager.
    ///
    /// Must be awaited inside a tokio runtime; the debounce timer is spawned
    /// on it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Runtime` when called outside a tokio runtime.
    /// Storage failures are not errors: the session starts fresh.
    pub async fn hydrate(
        catalog: Arc<QuestionCatalog>,
        store: Arc<dyn KeyValueStore>,
        settings: EngineSettings,
        clock: Clock,
    ) -> Result<Self, EngineError> {
        let runtime = Handle::try_current()?;
        let mut gateway = PersistenceGateway::new(store, &settings, runtime);

        let record = match gateway.load(&catalog).await {
            Some(loaded) => {
                tracing::info!(
                    session_id = %loaded.record.session_id,
                    discarded = loaded.record.history.len(),
                    repaired = loaded.repair.changed(),
                    "resumed persisted session"
                );
                loaded.record
            }
            None => {
                tracing::info!("no saved session; starting fresh");
                SessionRecord::fresh(clock.now_millis())
            }
        };

        let view = render(&catalog, &settings, &record);
        let (view_tx, _) = watch::channel(view);
        Ok(Self {
            selector: OutcomeSelector::from_settings(&settings),
            catalog,
            settings,
            clock,
            rng: StdRng::from_os_rng(),
            record,
            gateway,
            view_tx,
        })
    }

    /// Replace the random source with a seeded one, for reproducible games.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ─── Read side ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.record.session_id
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.record.state
    }

    #[must_use]
    pub fn progress(&self) -> &TopicProgress {
        &self.record.progress
    }

    #[must_use]
    pub fn history(&self) -> &DiscardHistory {
        &self.record.history
    }

    /// The drawn card, if one is on the table.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.record
            .state
            .current_question_id()
            .and_then(|id| self.catalog.get(id))
    }

    /// The discard-pile card under the cursor.
    #[must_use]
    pub fn current_discard(&self) -> Option<&Question> {
        self.record.history.current(&self.catalog)
    }

    #[must_use]
    pub fn remaining_count(&self, topic: TopicId) -> usize {
        self.record.progress.remaining_count(&self.catalog, topic)
    }

    #[must_use]
    pub fn is_exhausted(&self, topic: TopicId) -> bool {
        self.record.progress.is_exhausted(&self.catalog, topic)
    }

    /// True once no topic has a card left to draw.
    #[must_use]
    pub fn is_deck_exhausted(&self) -> bool {
        TopicId::ALL.into_iter().all(|topic| self.is_exhausted(topic))
    }

    #[must_use]
    pub fn low_card_topics(&self) -> Vec<TopicId> {
        self.record
            .progress
            .low_card_topics(&self.catalog, self.settings.low_cards_threshold())
    }

    /// Probability of each roll face given the current progress.
    #[must_use]
    pub fn odds(&self) -> Vec<(Outcome, f64)> {
        self.selector.odds(&self.record.progress, &self.catalog)
    }

    #[must_use]
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot::capture_record(&self.record)
    }

    #[must_use]
    pub fn view(&self) -> EngineView {
        render(&self.catalog, &self.settings, &self.record)
    }

    /// Receive a fresh [`EngineView`] after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EngineView> {
        self.view_tx.subscribe()
    }

    #[must_use]
    pub fn has_pending_write(&self) -> bool {
        self.gateway.has_pending_write()
    }

    // ─── Game flow ─────────────────────────────────────────────────────────

    /// Start over with a new session id and an untouched deck.
    pub fn new_game(&mut self) {
        self.record = SessionRecord::fresh(self.clock.now_millis());
        self.record.state.set_flow_step(FlowStep::Dice);
        tracing::info!(session_id = %self.record.session_id, "new game");
        self.commit();
    }

    /// Roll the die. A card still on the table is abandoned, not consumed.
    pub fn roll(&mut self) -> RollResult {
        let outcome =
            self.selector
                .draw_outcome(&self.record.progress, &self.catalog, &mut self.rng);
        match outcome {
            Some(outcome) => {
                self.record.state.clear_card();
                self.record.state.record_outcome(outcome);
                tracing::debug!(%outcome, "rolled");
                self.commit();
                RollResult::Rolled(outcome)
            }
            None => {
                tracing::info!("every topic is exhausted");
                self.set_flow_step(FlowStep::Dice);
                RollResult::Exhausted
            }
        }
    }

    /// Draw from the topic the die landed on.
    ///
    /// Returns `None` when no category result is pending or the topic ran dry.
    pub fn accept_result(&mut self) -> Option<Question> {
        let topic = self.record.state.pending_result_topic()?;
        self.draw_question(topic)
    }

    /// Resolve a manual-choice roll by drawing from `topic`.
    pub fn choose_topic(&mut self, topic: TopicId) -> Option<Question> {
        self.draw_question(topic)
    }

    /// Put an unconsumed card of `topic` on the table.
    ///
    /// The card is not consumed until it is completed. Returns `None` and
    /// leaves the state untouched when the topic is exhausted; the caller
    /// should offer a reshuffle of that topic.
    pub fn draw_question(&mut self, topic: TopicId) -> Option<Question> {
        let Some(question) =
            draw_question(&self.catalog, &self.record.progress, topic, &mut self.rng).cloned()
        else {
            tracing::debug!(%topic, "topic exhausted; nothing to draw");
            return None;
        };

        self.record.state.begin_question(&question);
        tracing::debug!(%topic, question_id = %question.id(), "question drawn");
        self.commit();
        Some(question)
    }

    /// Toggle the card face. Returns the new flipped state.
    pub fn flip(&mut self) -> bool {
        if self.record.state.current_question_id().is_none() {
            return false;
        }
        let flipped = self.record.state.flip();
        self.commit();
        flipped
    }

    /// Show the answer. Returns whether a card was on the table.
    pub fn reveal_answer(&mut self) -> bool {
        if self.record.state.current_question_id().is_none() {
            return false;
        }
        self.record.state.reveal_answer();
        self.commit();
        true
    }

    /// Consume the card on the table and move it onto the discard pile.
    ///
    /// No-op returning `None` when no card is on the table.
    pub fn complete_current_question(&mut self) -> Option<Question> {
        let id = self.record.state.current_question_id()?;
        let question = self.catalog.get(id)?.clone();

        self.record.progress.mark_consumed(&question);
        self.record.history.push(id);
        self.record.state.clear_card();
        self.record.state.set_flow_step(FlowStep::Dice);
        tracing::debug!(question_id = %id, topic = %question.topic(), "question completed");
        self.commit();
        Some(question)
    }

    /// Drop the card on the table without consuming it.
    pub fn abandon_current(&mut self) -> bool {
        if self.record.state.current_question_id().is_none() {
            return false;
        }
        self.record.state.clear_card();
        self.record.state.set_flow_step(FlowStep::Dice);
        self.commit();
        true
    }

    /// Move to any screen. Persisted so a restart resumes the same screen.
    pub fn set_flow_step(&mut self, step: FlowStep) {
        if self.record.state.flow_step() == step {
            return;
        }
        self.record.state.set_flow_step(step);
        self.commit();
    }

    // ─── Discard pile ──────────────────────────────────────────────────────

    pub fn open_discard_pile(&mut self) {
        self.set_flow_step(FlowStep::DiscardPile);
    }

    /// Leave the pile for the card on the table, or the die when there is none.
    pub fn close_discard_pile(&mut self) {
        let step = if self.record.state.current_question_id().is_some() {
            FlowStep::Question
        } else {
            FlowStep::Dice
        };
        self.set_flow_step(step);
    }

    pub fn go_older(&mut self) -> bool {
        let moved = self.record.history.go_older();
        if moved {
            self.commit();
        }
        moved
    }

    pub fn go_newer(&mut self) -> bool {
        let moved = self.record.history.go_newer();
        if moved {
            self.commit();
        }
        moved
    }

    /// Jump to a newest-first position. Out-of-range positions are ignored.
    pub fn jump_to(&mut self, position: usize) -> bool {
        let moved = self.record.history.jump_to(position);
        if moved {
            self.commit();
        }
        moved
    }

    // ─── Reshuffle and reset ───────────────────────────────────────────────

    /// Return every card of `topic` to rotation. The discard pile is kept.
    pub fn reset_topic(&mut self, topic: TopicId) {
        self.record.progress.reset_topic(topic);
        tracing::info!(%topic, "topic reshuffled");
        self.commit();
    }

    /// Return every card to rotation. The discard pile is kept.
    pub fn reset_all(&mut self) {
        self.record.progress.reset_all();
        tracing::info!("all topics reshuffled");
        self.commit();
    }

    /// Hard reset to the home screen and delete the saved session.
    pub async fn end_game(&mut self) {
        self.record = SessionRecord::fresh(self.clock.now_millis());
        self.gateway.clear().await;
        tracing::info!("game ended; saved session cleared");
        self.publish();
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────

    /// Write the current state right away. Returns whether the write succeeded.
    pub async fn flush(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.gateway.save_now(&snapshot).await
    }

    /// Cancel any pending write without persisting it.
    pub fn shutdown(&mut self) {
        self.gateway.shutdown();
    }

    fn commit(&mut self) {
        let snapshot = self.snapshot();
        self.gateway.save(snapshot);
        self.publish();
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("session_id", &self.record.session_id)
            .field("flow_step", &self.record.state.flow_step())
            .field("current_question_id", &self.record.state.current_question_id())
            .field("history_len", &self.record.history.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn render(catalog: &QuestionCatalog, settings: &EngineSettings, record: &SessionRecord) -> EngineView {
    let state = &record.state;
    let history = &record.history;
    let topics = TopicStatus::all(&record.progress, catalog, settings.low_cards_threshold());
    let deck_exhausted = topics.iter().all(|status| status.is_exhausted);

    EngineView {
        session_id: record.session_id.clone(),
        created_at: DateTime::from_timestamp_millis(record.created_at),
        flow_step: state.flow_step(),
        selected_topic: state.selected_topic(),
        current_question: state
            .current_question_id()
            .and_then(|id| catalog.get(id))
            .cloned(),
        is_flipped: state.is_flipped(),
        has_revealed_answer: state.has_revealed_answer(),
        pending_choice_mode: state.pending_choice_mode(),
        pending_result_topic: state.pending_result_topic(),
        topics,
        deck_exhausted,
        discard: DiscardView {
            len: history.len(),
            cursor: history.cursor(),
            position: history.position(),
            current: history.current(catalog).cloned(),
            can_go_older: history.can_go_older(),
            can_go_newer: history.can_go_newer(),
        },
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryStore;
    use trivia_core::model::QuestionDraft;
    use trivia_core::time::fixed_clock;

    fn draft(id: u64, topic: TopicId) -> QuestionDraft {
        QuestionDraft {
            id,
            topic,
            prompt: format!("Q{id}"),
            date_label: String::new(),
            answer_label: format!("A{id}"),
        }
    }

    fn small_catalog() -> Arc<QuestionCatalog> {
        Arc::new(
            QuestionCatalog::from_drafts(vec![
                draft(1, TopicId::History),
                draft(2, TopicId::History),
                draft(10, TopicId::Science),
            ])
            .unwrap(),
        )
    }

    async fn manager(catalog: Arc<QuestionCatalog>) -> SessionManager {
        SessionManager::hydrate(
            catalog,
            Arc::new(InMemoryStore::new()),
            EngineSettings::default(),
            fixed_clock(),
        )
        .await
        .unwrap()
        .with_seed(7)
    }

    #[tokio::test]
    async fn fresh_session_starts_home() {
        let manager = manager(small_catalog()).await;
        assert_eq!(manager.state().flow_step(), FlowStep::Home);
        assert!(manager.history().is_empty());
        assert_eq!(manager.view().created_at, Some(trivia_core::time::fixed_now()));
    }

    #[tokio::test]
    async fn completion_consumes_and_discards() {
        let mut manager = manager(small_catalog()).await;
        manager.new_game();

        let drawn = manager.draw_question(TopicId::History).unwrap();
        assert_eq!(manager.state().flow_step(), FlowStep::Question);
        assert_eq!(manager.state().selected_topic(), Some(TopicId::History));

        let completed = manager.complete_current_question().unwrap();
        assert_eq!(completed, drawn);
        assert!(manager.progress().is_consumed(&drawn));
        assert_eq!(manager.history().ids().last(), Some(&drawn.id()));
        assert_eq!(manager.history().cursor(), 0);
        assert_eq!(manager.state().current_question_id(), None);
        assert_eq!(manager.state().flow_step(), FlowStep::Dice);
        assert_eq!(manager.remaining_count(TopicId::History), 1);
    }

    #[tokio::test]
    async fn complete_without_card_is_noop() {
        let mut manager = manager(small_catalog()).await;
        let before = manager.snapshot();
        assert!(manager.complete_current_question().is_none());
        assert_eq!(manager.snapshot(), before);
    }

    #[tokio::test]
    async fn abandoned_card_is_not_consumed() {
        let mut manager = manager(small_catalog()).await;
        manager.draw_question(TopicId::Science).unwrap();
        assert!(manager.abandon_current());

        assert_eq!(manager.remaining_count(TopicId::Science), 1);
        assert!(manager.history().is_empty());
        assert_eq!(manager.state().flow_step(), FlowStep::Dice);
    }

    #[tokio::test]
    async fn exhausted_topic_draws_nothing() {
        let mut manager = manager(small_catalog()).await;
        manager.draw_question(TopicId::Science).unwrap();
        manager.complete_current_question().unwrap();

        let before = manager.snapshot();
        assert!(manager.draw_question(TopicId::Science).is_none());
        assert_eq!(manager.snapshot(), before);

        manager.reset_topic(TopicId::Science);
        assert!(manager.draw_question(TopicId::Science).is_some());
        assert_eq!(manager.history().len(), 1);
    }

    #[tokio::test]
    async fn roll_records_pending_outcome() {
        let mut manager = manager(small_catalog()).await;
        manager.new_game();

        for _ in 0..20 {
            match manager.roll() {
                RollResult::Rolled(Outcome::Category(topic)) => {
                    assert!(topic == TopicId::History || topic == TopicId::Science);
                    assert_eq!(manager.state().pending_result_topic(), Some(topic));
                    assert_eq!(manager.state().flow_step(), FlowStep::CategoryResult);
                    let question = manager.accept_result().unwrap();
                    assert_eq!(question.topic(), topic);
                    assert_eq!(manager.state().pending_result_topic(), None);
                    manager.abandon_current();
                }
                RollResult::Rolled(Outcome::Choose(mode)) => {
                    assert_eq!(manager.state().pending_choice_mode(), Some(mode));
                    assert_eq!(manager.state().flow_step(), FlowStep::ChooseCategory);
                    manager.choose_topic(TopicId::History).unwrap();
                    assert_eq!(manager.state().pending_choice_mode(), None);
                    manager.abandon_current();
                }
                RollResult::Exhausted => panic!("deck is not exhausted"),
            }
        }
    }

    #[tokio::test]
    async fn exhausted_deck_reports_exhausted_roll() {
        let mut manager = manager(small_catalog()).await;
        for topic in [TopicId::History, TopicId::History, TopicId::Science] {
            manager.draw_question(topic).unwrap();
            manager.complete_current_question().unwrap();
        }
        assert!(manager.is_deck_exhausted());

        let before = manager.progress().clone();
        assert_eq!(manager.roll(), RollResult::Exhausted);
        assert_eq!(manager.state().flow_step(), FlowStep::Dice);
        assert_eq!(manager.progress(), &before);
        assert!(manager.odds().is_empty());

        manager.reset_all();
        assert!(matches!(manager.roll(), RollResult::Rolled(_)));
        assert_eq!(manager.history().len(), 3);
    }

    #[tokio::test]
    async fn flip_and_reveal_need_a_card() {
        let mut manager = manager(small_catalog()).await;
        assert!(!manager.flip());
        assert!(!manager.reveal_answer());

        manager.draw_question(TopicId::History).unwrap();
        assert!(manager.flip());
        assert!(!manager.flip());
        assert!(manager.reveal_answer());
        assert!(manager.state().is_flipped());
        assert!(manager.state().has_revealed_answer());
    }

    #[tokio::test]
    async fn discard_navigation_persists_cursor() {
        let mut manager = manager(small_catalog()).await;
        for topic in [TopicId::History, TopicId::Science] {
            manager.draw_question(topic).unwrap();
            manager.complete_current_question().unwrap();
        }

        manager.open_discard_pile();
        assert_eq!(manager.state().flow_step(), FlowStep::DiscardPile);
        assert!(manager.go_older());
        assert!(!manager.go_older());
        assert_eq!(manager.snapshot().cursor, 1);
        assert_eq!(manager.current_discard().map(Question::topic), Some(TopicId::History));
        assert_eq!(manager.view().discard.position, Some((2, 2)));

        assert!(manager.jump_to(0));
        assert!(!manager.jump_to(5));
        assert_eq!(manager.current_discard().map(Question::topic), Some(TopicId::Science));

        manager.close_discard_pile();
        assert_eq!(manager.state().flow_step(), FlowStep::Dice);
    }

    #[tokio::test]
    async fn subscribers_see_each_change() {
        let mut manager = manager(small_catalog()).await;
        let mut views = manager.subscribe();

        manager.draw_question(TopicId::Science).unwrap();
        assert!(views.has_changed().unwrap());
        let view = views.borrow_and_update().clone();
        assert_eq!(view.flow_step, FlowStep::Question);
        assert_eq!(view.current_question.as_ref().map(|q| q.id()), manager.state().current_question_id());
        assert!(view.topic(TopicId::Science).unwrap().is_low);
    }

    #[tokio::test]
    async fn low_card_topics_follow_threshold() {
        let mut manager = manager(small_catalog()).await;
        assert_eq!(manager.low_card_topics(), TopicId::ALL.to_vec());

        let settings = EngineSettings::default().with_low_cards_threshold(2).unwrap();
        manager.settings = settings;
        assert_eq!(
            manager.low_card_topics(),
            vec![TopicId::Science, TopicId::Culture, TopicId::Geography]
        );

        manager.draw_question(TopicId::History).unwrap();
        manager.complete_current_question().unwrap();
        assert!(manager.low_card_topics().contains(&TopicId::History));
    }

    #[tokio::test]
    async fn end_game_is_a_hard_reset() {
        let mut manager = manager(small_catalog()).await;
        let first = manager.session_id().clone();
        manager.draw_question(TopicId::History).unwrap();
        manager.complete_current_question().unwrap();

        manager.end_game().await;

        assert_ne!(manager.session_id(), &first);
        assert_eq!(manager.state(), &SessionState::new());
        assert!(manager.history().is_empty());
        assert_eq!(manager.remaining_count(TopicId::History), 2);
        assert!(!manager.has_pending_write());
    }
}
