use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AssessmentId, PersonalizationId};

/// Outcome of the remote scoring call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub score: u32,
    pub max_score: u32,
    pub assessment_id: AssessmentId,
    #[serde(rename = "playlistPersonalizationId", alias = "personalizationId")]
    pub personalization_id: PersonalizationId,
}

impl AssessmentResult {
    /// Score as a percentage of `max_score`; zero when nothing was scorable.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.max_score == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.max_score)
    }

    /// Percentage with two decimals, e.g. `60.00%`.
    #[must_use]
    pub fn percentage_label(&self) -> String {
        format!("{:.2}%", self.percentage())
    }
}

/// A scoring result stamped with the local completion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredAssessment {
    pub result: AssessmentResult,
    pub completed_at: DateTime<Utc>,
}

impl ScoredAssessment {
    #[must_use]
    pub fn new(result: AssessmentResult, completed_at: DateTime<Utc>) -> Self {
        Self {
            result,
            completed_at,
        }
    }
}
