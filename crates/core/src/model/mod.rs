mod answer;
pub mod configuration;
mod ids;
mod question;
mod result;
mod topic;

pub use answer::{AnswerSheet, UserAnswer};
pub use configuration::{
    AssessmentConfiguration, ConfigurationBuilder, ConfigurationError, Pace, Platform, Pricing,
    QuestionType, ResourceMix, ResourceType,
};
pub use ids::{AssessmentId, ParseIdError, PersonalizationId, QuestionId};
pub use question::{Question, QuestionError, QuestionPayload};
pub use result::{AssessmentResult, ScoredAssessment};
pub use topic::{Level, SuggestedTopic, TopicSelection};
