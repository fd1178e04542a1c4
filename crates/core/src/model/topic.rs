use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of question groupings a card can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicId {
    History,
    Science,
    Culture,
    Geography,
}

impl TopicId {
    /// Every topic, in the fixed order used for iteration and display.
    pub const ALL: [TopicId; 4] = [
        TopicId::History,
        TopicId::Science,
        TopicId::Culture,
        TopicId::Geography,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TopicId::History => "history",
            TopicId::Science => "science",
            TopicId::Culture => "culture",
            TopicId::Geography => "geography",
        }
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for TopicId {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        TopicId::ALL
            .into_iter()
            .find(|topic| topic.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownTopic(needle.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Science".parse::<TopicId>().unwrap(), TopicId::Science);
        assert!("sports".parse::<TopicId>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        for topic in TopicId::ALL {
            let json = serde_json::to_string(&topic).unwrap();
            assert_eq!(json, format!("\"{}\"", topic.as_str()));
        }
    }
}
