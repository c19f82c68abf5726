use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty tag shared by suggested topics and the assessment configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    #[serde(alias = "beginner", alias = "BEGINNER")]
    Beginner,
    #[serde(alias = "intermediate", alias = "INTERMEDIATE")]
    Intermediate,
    #[serde(alias = "advanced", alias = "ADVANCED")]
    Advanced,
}

impl Level {
    /// Whether a topic tagged with this level starts out selected.
    ///
    /// Beginner and Intermediate topics are pre-checked; Advanced ones are opt-in.
    #[must_use]
    pub fn included_by_default(self) -> bool {
        !matches!(self, Level::Advanced)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        };
        f.write_str(label)
    }
}

/// A topic as suggested by the remote topic generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedTopic {
    pub topic: String,
    pub level: Level,
}

impl SuggestedTopic {
    #[must_use]
    pub fn new(topic: impl Into<String>, level: Level) -> Self {
        Self {
            topic: topic.into(),
            level,
        }
    }
}

/// A suggested topic together with the learner's include/exclude choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSelection {
    name: String,
    level: Level,
    included: bool,
}

impl TopicSelection {
    /// Seed a selection from a suggestion using the default inclusion policy.
    #[must_use]
    pub fn from_suggestion(suggestion: SuggestedTopic) -> Self {
        let included = suggestion.level.included_by_default();
        Self {
            name: suggestion.topic.trim().to_owned(),
            level: suggestion.level,
            included,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn included(&self) -> bool {
        self.included
    }

    /// Flip the selection and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.included = !self.included;
        self.included
    }
}
