use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::topic::{Level, SuggestedTopic, TopicSelection};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Configuration problems caught locally, before anything reaches the remote service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("topic suggestions are still loading")]
    TopicsLoading,

    #[error("select at least one topic")]
    NoTopicsSelected,

    #[error("select at least one question type")]
    NoQuestionTypes,

    #[error("language cannot be empty")]
    EmptyLanguage,

    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
}

//
// ─── PREFERENCE TYPES ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[serde(alias = "multiple_choice", alias = "mcq")]
    MultipleChoice,
    Coding,
    Practical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Video,
    Article,
    Course,
    Documentation,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pricing {
    Free,
    Paid,
}

/// How fast the learner wants to move through the roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pace {
    Relaxed,
    #[default]
    Steady,
    Intensive,
}

/// Mix of free and paid resources implied by the selected platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceMix {
    Free,
    Paid,
    Mixed,
}

impl ResourceMix {
    /// Derive the mix from the pricing of every selected platform.
    ///
    /// Mixed needs at least one free and one paid platform, Free needs at least one
    /// free platform and no paid ones; anything else (including no selection) is Paid.
    #[must_use]
    pub fn from_pricing(pricing: impl IntoIterator<Item = Pricing>) -> Self {
        let (mut free, mut paid) = (false, false);
        for p in pricing {
            match p {
                Pricing::Free => free = true,
                Pricing::Paid => paid = true,
            }
        }
        match (free, paid) {
            (true, true) => ResourceMix::Mixed,
            (true, false) => ResourceMix::Free,
            _ => ResourceMix::Paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub pricing: Pricing,
}

impl Platform {
    #[must_use]
    pub fn new(name: impl Into<String>, pricing: Pricing) -> Self {
        Self {
            name: name.into(),
            pricing,
        }
    }

    /// Platforms offered when the learner has not customised the list.
    #[must_use]
    pub fn default_catalogue() -> Vec<Platform> {
        vec![
            Platform::new("YouTube", Pricing::Free),
            Platform::new("freeCodeCamp", Pricing::Free),
            Platform::new("MDN", Pricing::Free),
            Platform::new("Coursera", Pricing::Paid),
            Platform::new("Udemy", Pricing::Paid),
            Platform::new("Pluralsight", Pricing::Paid),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PlatformChoice {
    platform: Platform,
    selected: bool,
}

//
// ─── CONFIGURATION ─────────────────────────────────────────────────────────────
//

/// A validated, submittable assessment configuration.
///
/// Has no mutators: a different configuration means a new builder and a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentConfiguration {
    prompt: String,
    topics: Vec<String>,
    difficulty: Level,
    question_types: BTreeSet<QuestionType>,
    resource_types: BTreeSet<ResourceType>,
    platforms: Vec<Platform>,
    language: String,
    pace: Pace,
    estimated_weeks: u32,
    resource_mix: ResourceMix,
}

impl AssessmentConfiguration {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn difficulty(&self) -> Level {
        self.difficulty
    }

    #[must_use]
    pub fn question_types(&self) -> &BTreeSet<QuestionType> {
        &self.question_types
    }

    #[must_use]
    pub fn resource_types(&self) -> &BTreeSet<ResourceType> {
        &self.resource_types
    }

    #[must_use]
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn pace(&self) -> Pace {
        self.pace
    }

    #[must_use]
    pub fn estimated_weeks(&self) -> u32 {
        self.estimated_weeks
    }

    #[must_use]
    pub fn resource_mix(&self) -> ResourceMix {
        self.resource_mix
    }
}

//
// ─── BUILDER ───────────────────────────────────────────────────────────────────
//

/// Collects the learner's goal, topic picks and preferences into an
/// [`AssessmentConfiguration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationBuilder {
    prompt: String,
    topics: Vec<TopicSelection>,
    topics_loading: bool,
    difficulty: Level,
    question_types: BTreeSet<QuestionType>,
    resource_types: BTreeSet<ResourceType>,
    platforms: Vec<PlatformChoice>,
    language: String,
    pace: Pace,
}

impl ConfigurationBuilder {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        let platforms = Platform::default_catalogue()
            .into_iter()
            .map(|platform| PlatformChoice {
                selected: platform.pricing == Pricing::Free,
                platform,
            })
            .collect();

        Self {
            prompt: prompt.into().trim().to_owned(),
            topics: Vec::new(),
            topics_loading: false,
            difficulty: Level::Beginner,
            question_types: BTreeSet::from([QuestionType::MultipleChoice]),
            resource_types: BTreeSet::from([ResourceType::Video, ResourceType::Article]),
            platforms,
            language: "English".to_owned(),
            pace: Pace::default(),
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Mark topic suggestions as in flight; any previous list is discarded.
    pub fn begin_loading(&mut self) {
        self.topics.clear();
        self.topics_loading = true;
    }

    /// Stop the loading state without topics (the suggestion request failed).
    pub fn loading_failed(&mut self) {
        self.topics_loading = false;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.topics_loading
    }

    /// Replace the topic list with remote suggestions, applying the default selection.
    ///
    /// Duplicate topic names keep their first occurrence.
    pub fn apply_suggestions(&mut self, suggestions: impl IntoIterator<Item = SuggestedTopic>) {
        self.topics.clear();
        for suggestion in suggestions {
            let selection = TopicSelection::from_suggestion(suggestion);
            if selection.name().is_empty()
                || self.topics.iter().any(|t| t.name() == selection.name())
            {
                continue;
            }
            self.topics.push(selection);
        }
        self.topics_loading = false;
    }

    #[must_use]
    pub fn topics(&self) -> &[TopicSelection] {
        &self.topics
    }

    pub fn selected_topics(&self) -> impl Iterator<Item = &TopicSelection> {
        self.topics.iter().filter(|t| t.included())
    }

    #[must_use]
    pub fn selected_topic_count(&self) -> usize {
        self.selected_topics().count()
    }

    /// Toggle a topic by name and return its new inclusion state.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::UnknownTopic` if no topic has that name.
    pub fn toggle_topic(&mut self, name: &str) -> Result<bool, ConfigurationError> {
        self.topics
            .iter_mut()
            .find(|t| t.name() == name)
            .map(TopicSelection::toggle)
            .ok_or_else(|| ConfigurationError::UnknownTopic(name.to_owned()))
    }

    pub fn set_difficulty(&mut self, difficulty: Level) {
        self.difficulty = difficulty;
    }

    /// Toggle a question type and return whether it is now selected.
    pub fn toggle_question_type(&mut self, kind: QuestionType) -> bool {
        toggle_in(&mut self.question_types, kind)
    }

    pub fn toggle_resource_type(&mut self, kind: ResourceType) -> bool {
        toggle_in(&mut self.resource_types, kind)
    }

    /// Toggle a platform by name and return whether it is now selected.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::UnknownPlatform` if the platform is not offered.
    pub fn toggle_platform(&mut self, name: &str) -> Result<bool, ConfigurationError> {
        let choice = self
            .platforms
            .iter_mut()
            .find(|c| c.platform.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigurationError::UnknownPlatform(name.to_owned()))?;
        choice.selected = !choice.selected;
        Ok(choice.selected)
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into().trim().to_owned();
    }

    pub fn set_pace(&mut self, pace: Pace) {
        self.pace = pace;
    }

    pub fn selected_platforms(&self) -> impl Iterator<Item = &Platform> {
        self.platforms
            .iter()
            .filter(|c| c.selected)
            .map(|c| &c.platform)
    }

    /// Two weeks per selected topic.
    #[must_use]
    pub fn estimated_weeks(&self) -> u32 {
        let count = u32::try_from(self.selected_topic_count()).unwrap_or(u32::MAX);
        count.saturating_mul(2)
    }

    #[must_use]
    pub fn resource_mix(&self) -> ResourceMix {
        ResourceMix::from_pricing(self.selected_platforms().map(|p| p.pricing))
    }

    /// Whether the "proceed" action is enabled.
    #[must_use]
    pub fn can_proceed(&self) -> bool {
        !self.topics_loading && self.selected_topic_count() > 0
    }

    /// Validate the current choices into a submittable configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` while topics are loading, when no topic or no
    /// question type is selected, or when the language is blank.
    pub fn build(&self) -> Result<AssessmentConfiguration, ConfigurationError> {
        if self.topics_loading {
            return Err(ConfigurationError::TopicsLoading);
        }
        if self.selected_topic_count() == 0 {
            return Err(ConfigurationError::NoTopicsSelected);
        }
        if self.question_types.is_empty() {
            return Err(ConfigurationError::NoQuestionTypes);
        }
        if self.language.is_empty() {
            return Err(ConfigurationError::EmptyLanguage);
        }

        Ok(AssessmentConfiguration {
            prompt: self.prompt.clone(),
            topics: self.selected_topics().map(|t| t.name().to_owned()).collect(),
            difficulty: self.difficulty,
            question_types: self.question_types.clone(),
            resource_types: self.resource_types.clone(),
            platforms: self.selected_platforms().cloned().collect(),
            language: self.language.clone(),
            pace: self.pace,
            estimated_weeks: self.estimated_weeks(),
            resource_mix: self.resource_mix(),
        })
    }
}

fn toggle_in<T: Ord>(set: &mut BTreeSet<T>, value: T) -> bool {
    if set.remove(&value) {
        false
    } else {
        set.insert(value);
        true
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_with(topics: &[(&str, Level)]) -> ConfigurationBuilder {
        let mut builder = ConfigurationBuilder::new("learn rust");
        builder.begin_loading();
        builder.apply_suggestions(
            topics
                .iter()
                .map(|(name, level)| SuggestedTopic::new(*name, *level)),
        );
        builder
    }

    #[test]
    fn advanced_topic_is_left_out_of_estimate() {
        let builder = builder_with(&[
            ("Ownership", Level::Beginner),
            ("Borrowing", Level::Beginner),
            ("Unsafe", Level::Advanced),
        ]);

        assert_eq!(builder.topics().len(), 3);
        assert_eq!(builder.selected_topic_count(), 2);
        assert_eq!(builder.estimated_weeks(), 4);

        let config = builder.build().unwrap();
        assert_eq!(config.estimated_weeks(), 4);
        assert_eq!(config.topics(), ["Ownership", "Borrowing"]);
    }

    #[test]
    fn proceed_is_guarded_while_loading_or_empty() {
        let mut builder = ConfigurationBuilder::new("learn rust");
        assert!(!builder.can_proceed());

        builder.begin_loading();
        assert!(!builder.can_proceed());
        assert_eq!(builder.build().unwrap_err(), ConfigurationError::TopicsLoading);

        builder.apply_suggestions(vec![SuggestedTopic::new("Unsafe", Level::Advanced)]);
        assert!(!builder.can_proceed());
        assert_eq!(
            builder.build().unwrap_err(),
            ConfigurationError::NoTopicsSelected
        );

        assert!(builder.toggle_topic("Unsafe").unwrap());
        assert!(builder.can_proceed());
    }

    #[test]
    fn build_requires_a_question_type() {
        let mut builder = builder_with(&[("Traits", Level::Intermediate)]);
        assert!(!builder.toggle_question_type(QuestionType::MultipleChoice));
        assert_eq!(
            builder.build().unwrap_err(),
            ConfigurationError::NoQuestionTypes
        );
        assert!(builder.toggle_question_type(QuestionType::Coding));
        assert!(builder.build().is_ok());
    }

    #[test]
    fn resource_mix_follows_platform_pricing() {
        let mut builder = builder_with(&[("Traits", Level::Intermediate)]);
        assert_eq!(builder.resource_mix(), ResourceMix::Free);

        builder.toggle_platform("udemy").unwrap();
        assert_eq!(builder.resource_mix(), ResourceMix::Mixed);

        for name in ["YouTube", "freeCodeCamp", "MDN"] {
            builder.toggle_platform(name).unwrap();
        }
        assert_eq!(builder.resource_mix(), ResourceMix::Paid);

        builder.toggle_platform("Udemy").unwrap();
        assert_eq!(builder.selected_platforms().count(), 0);
        assert_eq!(builder.resource_mix(), ResourceMix::Paid);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut builder = builder_with(&[("Traits", Level::Intermediate)]);
        assert!(matches!(
            builder.toggle_topic("Nope"),
            Err(ConfigurationError::UnknownTopic(_))
        ));
        assert!(matches!(
            builder.toggle_platform("Nope"),
            Err(ConfigurationError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn duplicate_suggestions_are_collapsed() {
        let builder = builder_with(&[
            ("Traits", Level::Intermediate),
            ("Traits", Level::Advanced),
            ("  ", Level::Beginner),
        ]);
        assert_eq!(builder.topics().len(), 1);
        assert_eq!(builder.topics()[0].level(), Level::Intermediate);
    }

    #[test]
    fn configuration_serializes_camel_case() {
        let config = builder_with(&[("Traits", Level::Intermediate)])
            .build()
            .unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["estimatedWeeks"], 2);
        assert_eq!(json["questionTypes"][0], "multiple-choice");
        assert_eq!(json["resourceMix"], "Free");
    }
}
