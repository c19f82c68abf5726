use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a generated assessment, issued by the remote service.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentId(String);

impl AssessmentId {
    /// Creates a new `AssessmentId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as issued by the service
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of the downstream personalization (playlist) built from a scored assessment.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalizationId(String);

impl PersonalizationId {
    /// Creates a new `PersonalizationId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stable identifier of a question within an assessment.
///
/// Derived from the assessment id and the question's position, so answers can be
/// matched back to their question no matter in which order they were captured.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Derive the id of the question at `index` in `assessment`.
    #[must_use]
    pub fn derive(assessment: &AssessmentId, index: usize) -> Self {
        Self(format!("{}-q{index}", assessment.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssessmentId({})", self.0)
    }
}

impl fmt::Debug for PersonalizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PersonalizationId({})", self.0)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PersonalizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an ID from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot be blank", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

fn parse_non_blank(s: &str, kind: &'static str) -> Result<String, ParseIdError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseIdError { kind });
    }
    Ok(trimmed.to_owned())
}

impl FromStr for AssessmentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_non_blank(s, "AssessmentId").map(Self)
    }
}

impl FromStr for PersonalizationId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_non_blank(s, "PersonalizationId").map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_id_is_deterministic() {
        let assessment = AssessmentId::new("a-42");
        assert_eq!(QuestionId::derive(&assessment, 0).as_str(), "a-42-q0");
        assert_eq!(
            QuestionId::derive(&assessment, 3),
            QuestionId::derive(&assessment, 3)
        );
        assert_ne!(
            QuestionId::derive(&assessment, 1),
            QuestionId::derive(&assessment, 2)
        );
    }

    #[test]
    fn parse_rejects_blank_ids() {
        assert!("   ".parse::<AssessmentId>().is_err());
        let id: AssessmentId = " abc ".parse().unwrap();
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = AssessmentId::new("xyz");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"xyz\"");
    }
}
