//! Request/response contract with the remote assessment service.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use skillpath_core::model::{
    AssessmentConfiguration, AssessmentId, AssessmentResult, PersonalizationId, QuestionPayload,
    SuggestedTopic,
};
use skillpath_core::reconcile::SubmissionPayload;

use crate::error::ApiError;

pub use http::{ApiConfig, HttpAssessmentApi};

/// Response of "generate assessment" and "fetch assessment".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAssessment {
    pub assessment_id: AssessmentId,
    pub questions: Vec<QuestionPayload>,
}

/// What the roadmap generator is asked to build from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RoadmapRequest {
    #[serde(rename_all = "camelCase")]
    Assessed {
        assessment_id: AssessmentId,
        personalization_id: PersonalizationId,
    },
    /// The learner skipped the assessment; only the configuration is known.
    Unassessed {
        configuration: AssessmentConfiguration,
    },
}

impl RoadmapRequest {
    #[must_use]
    pub fn from_result(result: &AssessmentResult) -> Self {
        Self::Assessed {
            assessment_id: result.assessment_id.clone(),
            personalization_id: result.personalization_id.clone(),
        }
    }
}

/// Remote operations the assessment flow depends on.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    /// Suggest topics for the learner's stated goal.
    async fn generate_topics(&self, prompt: &str) -> Result<Vec<SuggestedTopic>, ApiError>;

    /// Generate a fresh assessment for a submitted configuration.
    async fn generate_assessment(
        &self,
        configuration: &AssessmentConfiguration,
    ) -> Result<GeneratedAssessment, ApiError>;

    /// Fetch an existing assessment by id (resume path).
    async fn fetch_assessment(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<GeneratedAssessment, ApiError>;

    /// Score the reconciled answers.
    async fn submit_assessment(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<AssessmentResult, ApiError>;

    /// Hand off to roadmap generation. The response body is not interpreted.
    async fn generate_roadmap(&self, request: &RoadmapRequest) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roadmap_request_uses_wire_names() {
        let request = RoadmapRequest::Assessed {
            assessment_id: AssessmentId::new("a1"),
            personalization_id: PersonalizationId::new("p1"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["assessmentId"], "a1");
        assert_eq!(json["personalizationId"], "p1");
    }

    #[test]
    fn generated_assessment_deserializes() {
        let json = r#"{
            "assessmentId": "a7",
            "questions": [{
                "type": "multiple-choice",
                "question": "Q",
                "options": ["x", "y"],
                "correctAnswer": "x",
                "explanation": "E"
            }]
        }"#;
        let generated: GeneratedAssessment = serde_json::from_str(json).unwrap();
        assert_eq!(generated.assessment_id.as_str(), "a7");
        assert_eq!(generated.questions.len(), 1);
    }
}
