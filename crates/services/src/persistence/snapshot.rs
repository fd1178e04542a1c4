use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use trivia_core::model::{ChooseMode, FlowStep, QuestionId, SessionId, SessionState, TopicId};
use trivia_core::{DiscardHistory, TopicProgress};

use crate::error::SnapshotError;

pub const SCHEMA_VERSION: u32 = 1;

const VERSION_FIELD: &str = "schemaVersion";

/// Wire shape of the persisted session, one JSON document under one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub schema_version: u32,
    pub session_id: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub selected_topic: Option<TopicId>,
    pub current_question_id: Option<QuestionId>,
    pub is_flipped: bool,
    pub has_revealed_answer: bool,
    pub consumed_by_topic: BTreeMap<TopicId, Vec<QuestionId>>,
    pub history_ids: Vec<QuestionId>,
    pub cursor: usize,
    pub flow_step: FlowStep,
    pub pending_choice_mode: Option<ChooseMode>,
    pub pending_result_topic: Option<TopicId>,
}

/// Domain objects of one session, as persisted and as held live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub created_at: i64,
    pub state: SessionState,
    pub progress: TopicProgress,
    pub history: DiscardHistory,
}

impl SessionRecord {
    /// An empty session parked on the home screen.
    #[must_use]
    pub fn fresh(created_at: i64) -> Self {
        Self {
            session_id: SessionId::generate(),
            created_at,
            state: SessionState::new(),
            progress: TopicProgress::new(),
            history: DiscardHistory::new(),
        }
    }
}

impl PersistedSnapshot {
    /// Capture the engine state in wire form.
    #[must_use]
    pub fn capture(
        session_id: &SessionId,
        created_at: i64,
        state: &SessionState,
        progress: &TopicProgress,
        history: &DiscardHistory,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            session_id: session_id.as_str().to_owned(),
            created_at,
            selected_topic: state.selected_topic(),
            current_question_id: state.current_question_id(),
            is_flipped: state.is_flipped(),
            has_revealed_answer: state.has_revealed_answer(),
            consumed_by_topic: progress.to_sorted_lists().into_iter().collect(),
            history_ids: history.ids().to_vec(),
            cursor: history.cursor(),
            flow_step: state.flow_step(),
            pending_choice_mode: state.pending_choice_mode(),
            pending_result_topic: state.pending_result_topic(),
        }
    }

    #[must_use]
    pub fn capture_record(record: &SessionRecord) -> Self {
        Self::capture(
            &record.session_id,
            record.created_at,
            &record.state,
            &record.progress,
            &record.history,
        )
    }

    /// Decode and validate stored bytes.
    ///
    /// The schema version is checked before any other field is trusted.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` for malformed JSON, a missing or mismatched
    /// version, missing or wrong-shaped fields, or a blank session id.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(SnapshotError::Json)?;

        let version = value.get(VERSION_FIELD).ok_or(SnapshotError::MissingVersion)?;
        if version.as_u64() != Some(u64::from(SCHEMA_VERSION)) {
            return Err(SnapshotError::VersionMismatch {
                found: version.to_string(),
                expected: SCHEMA_VERSION,
            });
        }

        let snapshot: Self = serde_json::from_value(value).map_err(SnapshotError::Shape)?;
        SessionId::from_persisted(snapshot.session_id.as_str())?;
        Ok(snapshot)
    }

    /// # Errors
    ///
    /// Returns `SnapshotError::Encode` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec(self).map_err(SnapshotError::Encode)
    }

    /// Rebuild domain objects. Cursor is clamped, duplicate ids collapse.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::SessionId` if the session id is blank.
    pub fn restore(&self) -> Result<SessionRecord, SnapshotError> {
        let session_id = SessionId::from_persisted(self.session_id.as_str())?;
        let state = SessionState::from_persisted(
            self.flow_step,
            self.selected_topic,
            self.current_question_id,
            self.is_flipped,
            self.has_revealed_answer,
            self.pending_choice_mode,
            self.pending_result_topic,
        );
        let progress = TopicProgress::from_persisted(
            self.consumed_by_topic
                .iter()
                .map(|(topic, ids)| (*topic, ids.clone())),
        );
        let history = DiscardHistory::from_persisted(self.history_ids.clone(), self.cursor);

        Ok(SessionRecord {
            session_id,
            created_at: self.created_at,
            state,
            progress,
            history,
        })
    }
}
