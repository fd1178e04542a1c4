use serde::{Deserialize, Serialize};

use crate::model::{ChooseMode, Outcome, Question, QuestionId, TopicId};

/// Which conceptual screen owns control.
///
/// Routing is advisory: any step may follow any other. It is persisted so a
/// restart resumes on the same screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowStep {
    #[default]
    Home,
    Dice,
    CategoryResult,
    ChooseCategory,
    Question,
    DiscardPile,
}

/// Flow step plus the card currently on the table.
///
/// `current_question_id`, when set, refers to a drawn but not yet consumed
/// question; consumption happens on completion, not on draw.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    flow_step: FlowStep,
    selected_topic: Option<TopicId>,
    current_question_id: Option<QuestionId>,
    is_flipped: bool,
    has_revealed_answer: bool,
    pending_choice_mode: Option<ChooseMode>,
    pending_result_topic: Option<TopicId>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate session state from a persisted snapshot.
    #[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
    #[must_use]
    pub fn from_persisted(
        flow_step: FlowStep,
        selected_topic: Option<TopicId>,
        current_question_id: Option<QuestionId>,
        is_flipped: bool,
        has_revealed_answer: bool,
        pending_choice_mode: Option<ChooseMode>,
        pending_result_topic: Option<TopicId>,
    ) -> Self {
        Self {
            flow_step,
            selected_topic,
            current_question_id,
            is_flipped,
            has_revealed_answer,
            pending_choice_mode,
            pending_result_topic,
        }
    }

    #[must_use]
    pub fn flow_step(&self) -> FlowStep {
        self.flow_step
    }

    #[must_use]
    pub fn selected_topic(&self) -> Option<TopicId> {
        self.selected_topic
    }

    #[must_use]
    pub fn current_question_id(&self) -> Option<QuestionId> {
        self.current_question_id
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.is_flipped
    }

    #[must_use]
    pub fn has_revealed_answer(&self) -> bool {
        self.has_revealed_answer
    }

    #[must_use]
    pub fn pending_choice_mode(&self) -> Option<ChooseMode> {
        self.pending_choice_mode
    }

    #[must_use]
    pub fn pending_result_topic(&self) -> Option<TopicId> {
        self.pending_result_topic
    }

    pub fn set_flow_step(&mut self, step: FlowStep) {
        self.flow_step = step;
    }

    /// Record a roll and route to the screen that resolves it.
    pub fn record_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Category(topic) => {
                self.pending_result_topic = Some(topic);
                self.pending_choice_mode = None;
                self.flow_step = FlowStep::CategoryResult;
            }
            Outcome::Choose(mode) => {
                self.pending_choice_mode = Some(mode);
                self.pending_result_topic = None;
                self.flow_step = FlowStep::ChooseCategory;
            }
        }
    }

    /// Put a freshly drawn question on the table, face down.
    pub fn begin_question(&mut self, question: &Question) {
        self.selected_topic = Some(question.topic());
        self.current_question_id = Some(question.id());
        self.is_flipped = false;
        self.has_revealed_answer = false;
        self.pending_choice_mode = None;
        self.pending_result_topic = None;
        self.flow_step = FlowStep::Question;
    }

    /// Toggle the card face. Returns the new value.
    pub fn flip(&mut self) -> bool {
        self.is_flipped = !self.is_flipped;
        self.is_flipped
    }

    /// Mark the answer as revealed; revealing always shows the back face.
    pub fn reveal_answer(&mut self) {
        self.is_flipped = true;
        self.has_revealed_answer = true;
    }

    /// Drop the current card and any pending roll.
    pub fn clear_card(&mut self) {
        self.selected_topic = None;
        self.current_question_id = None;
        self.is_flipped = false;
        self.has_revealed_answer = false;
        self.pending_choice_mode = None;
        self.pending_result_topic = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;

    fn question(id: u64, topic: TopicId) -> Question {
        QuestionDraft {
            id,
            topic,
            prompt: "Q".into(),
            date_label: String::new(),
            answer_label: "A".into(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn new_state_starts_home_without_card() {
        let state = SessionState::new();
        assert_eq!(state.flow_step(), FlowStep::Home);
        assert_eq!(state.current_question_id(), None);
        assert!(!state.is_flipped());
    }

    #[test]
    fn outcome_routes_to_resolving_screen() {
        let mut state = SessionState::new();
        state.record_outcome(Outcome::Category(TopicId::Science));
        assert_eq!(state.flow_step(), FlowStep::CategoryResult);
        assert_eq!(state.pending_result_topic(), Some(TopicId::Science));

        state.record_outcome(Outcome::Choose(ChooseMode::Opponent));
        assert_eq!(state.flow_step(), FlowStep::ChooseCategory);
        assert_eq!(state.pending_choice_mode(), Some(ChooseMode::Opponent));
        assert_eq!(state.pending_result_topic(), None);
    }

    #[test]
    fn begin_question_resets_flags_and_pending() {
        let mut state = SessionState::new();
        state.record_outcome(Outcome::Choose(ChooseMode::SelfPick));
        state.reveal_answer();

        state.begin_question(&question(9, TopicId::Culture));

        assert_eq!(state.flow_step(), FlowStep::Question);
        assert_eq!(state.current_question_id(), Some(QuestionId::new(9)));
        assert_eq!(state.selected_topic(), Some(TopicId::Culture));
        assert!(!state.is_flipped());
        assert!(!state.has_revealed_answer());
        assert_eq!(state.pending_choice_mode(), None);
    }

    #[test]
    fn flip_toggles_and_reveal_sticks() {
        let mut state = SessionState::new();
        assert!(state.flip());
        assert!(!state.flip());
        state.reveal_answer();
        assert!(state.is_flipped());
        assert!(state.has_revealed_answer());
        state.clear_card();
        assert!(!state.has_revealed_answer());
    }

    #[test]
    fn flow_step_serializes_kebab_case() {
        let json = serde_json::to_string(&FlowStep::CategoryResult).unwrap();
        assert_eq!(json, "\"category-result\"");
        let step: FlowStep = serde_json::from_str("\"discard-pile\"").unwrap();
        assert_eq!(step, FlowStep::DiscardPile);
    }
}
