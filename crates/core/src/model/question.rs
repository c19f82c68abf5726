use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::configuration::QuestionType;
use crate::model::ids::{AssessmentId, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {index} has an empty prompt")]
    EmptyPrompt { index: usize },

    #[error("question {index} has no correct answer")]
    MissingCorrectAnswer { index: usize },

    #[error("multiple-choice question {index} has no options")]
    NoOptions { index: usize },

    #[error("assessment contains no questions")]
    NoQuestions,
}

/// Question as delivered by the generation and fetch endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    #[serde(rename = "type", default = "default_question_type")]
    pub kind: QuestionType,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

fn default_question_type() -> QuestionType {
    QuestionType::MultipleChoice
}

/// A read-only assessment question with a stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    kind: QuestionType,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
}

impl Question {
    /// Validate a wire question and assign it the id for its position.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for a blank prompt, a blank correct answer, or a
    /// multiple-choice question without options.
    pub fn from_payload(
        assessment: &AssessmentId,
        index: usize,
        payload: QuestionPayload,
    ) -> Result<Self, QuestionError> {
        let prompt = payload.question.trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt { index });
        }
        let correct_answer = payload.correct_answer.trim().to_owned();
        if correct_answer.is_empty() {
            return Err(QuestionError::MissingCorrectAnswer { index });
        }
        let options: Vec<String> = payload
            .options
            .into_iter()
            .map(|o| o.trim().to_owned())
            .filter(|o| !o.is_empty())
            .collect();
        if payload.kind == QuestionType::MultipleChoice && options.is_empty() {
            return Err(QuestionError::NoOptions { index });
        }

        Ok(Self {
            id: QuestionId::derive(assessment, index),
            kind: payload.kind,
            prompt,
            options,
            correct_answer,
            explanation: payload.explanation.trim().to_owned(),
        })
    }

    /// Validate a whole question list in delivery order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoQuestions` for an empty list, or the first
    /// per-question validation failure.
    pub fn list_from_payloads(
        assessment: &AssessmentId,
        payloads: Vec<QuestionPayload>,
    ) -> Result<Vec<Self>, QuestionError> {
        if payloads.is_empty() {
            return Err(QuestionError::NoQuestions);
        }
        payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| Self::from_payload(assessment, index, payload))
            .collect()
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Exact-match correctness; no partial credit.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }

    /// Whether `answer` is an acceptable selection for this question.
    ///
    /// Questions without options (coding, practical) accept any non-blank answer.
    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        if self.options.is_empty() {
            !answer.trim().is_empty()
        } else {
            self.options.iter().any(|o| o == answer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(question: &str, options: &[&str], correct: &str) -> QuestionPayload {
        QuestionPayload {
            kind: QuestionType::MultipleChoice,
            question: question.to_owned(),
            options: options.iter().map(|o| (*o).to_owned()).collect(),
            correct_answer: correct.to_owned(),
            explanation: "because".to_owned(),
        }
    }

    #[test]
    fn ids_follow_position() {
        let assessment = AssessmentId::new("a1");
        let questions = Question::list_from_payloads(
            &assessment,
            vec![payload("Q1", &["x", "y"], "x"), payload("Q2", &["x", "y"], "y")],
        )
        .unwrap();
        assert_eq!(questions[0].id().as_str(), "a1-q0");
        assert_eq!(questions[1].id().as_str(), "a1-q1");
    }

    #[test]
    fn invalid_payloads_are_rejected() {
        let assessment = AssessmentId::new("a1");
        assert_eq!(
            Question::list_from_payloads(&assessment, Vec::new()).unwrap_err(),
            QuestionError::NoQuestions
        );
        assert_eq!(
            Question::from_payload(&assessment, 2, payload(" ", &["x"], "x")).unwrap_err(),
            QuestionError::EmptyPrompt { index: 2 }
        );
        assert_eq!(
            Question::from_payload(&assessment, 0, payload("Q", &[], "x")).unwrap_err(),
            QuestionError::NoOptions { index: 0 }
        );
        assert_eq!(
            Question::from_payload(&assessment, 0, payload("Q", &["x"], "")).unwrap_err(),
            QuestionError::MissingCorrectAnswer { index: 0 }
        );
    }

    #[test]
    fn wire_shape_deserializes() {
        let json = r#"{
            "type": "multiple-choice",
            "question": "What does `?` do?",
            "options": ["Propagates errors", "Panics"],
            "correctAnswer": "Propagates errors",
            "explanation": "It returns early with the error."
        }"#;
        let payload: QuestionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.kind, QuestionType::MultipleChoice);
        assert_eq!(payload.correct_answer, "Propagates errors");
    }

    #[test]
    fn open_questions_accept_free_text() {
        let assessment = AssessmentId::new("a1");
        let question = Question::from_payload(
            &assessment,
            0,
            QuestionPayload {
                kind: QuestionType::Coding,
                question: "Write a function".into(),
                options: Vec::new(),
                correct_answer: "fn f() {}".into(),
                explanation: String::new(),
            },
        )
        .unwrap();
        assert!(question.accepts("fn g() {}"));
        assert!(!question.accepts("  "));
        assert!(question.is_correct("fn f() {}"));
    }
}
