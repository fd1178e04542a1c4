use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::TopicId;

/// Who picks the topic when a roll lands on a manual-choice face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChooseMode {
    #[serde(rename = "self")]
    SelfPick,
    #[serde(rename = "opponent")]
    Opponent,
}

impl ChooseMode {
    pub const ALL: [ChooseMode; 2] = [ChooseMode::SelfPick, ChooseMode::Opponent];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChooseMode::SelfPick => "self",
            ChooseMode::Opponent => "opponent",
        }
    }
}

impl fmt::Display for ChooseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a roll: either a topic straight away or a manual choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Category(TopicId),
    Choose(ChooseMode),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Category(topic) => write!(f, "category:{topic}"),
            Outcome::Choose(mode) => write!(f, "choose:{mode}"),
        }
    }
}
