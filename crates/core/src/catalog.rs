use std::collections::HashMap;

use thiserror::Error;

use crate::model::{Question, QuestionDraft, QuestionError, QuestionId, TopicId};

const BUNDLED_QUESTIONS: &str = include_str!("../data/questions.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog contains no questions")]
    Empty,

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable index of every question shipped with the app.
///
/// Built once at startup and never mutated; progress and history refer to its
/// entries by `QuestionId` only.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionCatalog {
    /// Build a catalog from validated questions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` for an empty list and
    /// `CatalogError::DuplicateId` if two questions share an id.
    pub fn from_questions(
        questions: impl IntoIterator<Item = Question>,
    ) -> Result<Self, CatalogError> {
        let questions: Vec<Question> = questions.into_iter().collect();
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(questions.len());
        for (pos, question) in questions.iter().enumerate() {
            if index.insert(question.id(), pos).is_some() {
                return Err(CatalogError::DuplicateId(question.id()));
            }
        }

        Ok(Self { questions, index })
    }

    /// Validate raw records and build a catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if any record is invalid or ids collide.
    pub fn from_drafts(
        drafts: impl IntoIterator<Item = QuestionDraft>,
    ) -> Result<Self, CatalogError> {
        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_questions(questions)
    }

    /// Parse a JSON array of question records.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Json` for malformed input, or any validation error.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(json)?;
        Self::from_drafts(drafts)
    }

    /// Load the question set bundled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled data is invalid.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_QUESTIONS)
    }

    /// Questions of one topic, in catalog order. Lazy and restartable.
    pub fn questions_of(&self, topic: TopicId) -> impl Iterator<Item = &Question> + Clone + '_ {
        self.questions.iter().filter(move |q| q.topic() == topic)
    }

    #[must_use]
    pub fn total(&self, topic: TopicId) -> usize {
        self.questions_of(topic).count()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.index.get(&id).map(|&pos| &self.questions[pos])
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.index.contains_key(&id)
    }

    #[must_use]
    pub fn topic_of(&self, id: QuestionId) -> Option<TopicId> {
        self.get(id).map(Question::topic)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}
