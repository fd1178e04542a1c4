use serde::Deserialize;
use thiserror::Error;

use crate::model::{QuestionId, TopicId};

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Raw catalog record as bundled with the app.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: u64,
    pub topic: TopicId,
    pub prompt: String,
    #[serde(default)]
    pub date_label: String,
    pub answer_label: String,
}

impl QuestionDraft {
    /// Validate and trim the record.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or answer label is blank.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt { id: self.id });
        }
        let answer_label = self.answer_label.trim();
        if answer_label.is_empty() {
            return Err(QuestionError::EmptyAnswer { id: self.id });
        }

        Ok(Question {
            id: QuestionId::new(self.id),
            topic: self.topic,
            prompt: prompt.to_owned(),
            date_label: self.date_label.trim().to_owned(),
            answer_label: answer_label.to_owned(),
        })
    }
}

/// An immutable trivia card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    topic: TopicId,
    prompt: String,
    date_label: String,
    answer_label: String,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn topic(&self) -> TopicId {
        self.topic
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn date_label(&self) -> &str {
        &self.date_label
    }

    #[must_use]
    pub fn answer_label(&self) -> &str {
        &self.answer_label
    }
}

//
// ─── QUESTION VALIDATION ERRORS ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: u64 },

    #[error("question {id} has an empty answer")]
    EmptyAnswer { id: u64 },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
