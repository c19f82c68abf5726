//! Maps captured answers back onto the original question order for scoring.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnswerSheet, AssessmentId, Question, QuestionId};
use crate::session::{AssessmentSession, SessionPhase};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReconcileError {
    #[error("answered {answered} of {expected} questions; complete all questions before submitting")]
    CountMismatch {
        expected: usize,
        answered: usize,
        missing: Vec<QuestionId>,
    },

    #[error("only a completed session can be submitted (phase: {phase})")]
    NotComplete { phase: SessionPhase },
}

/// Body of the remote "submit assessment" call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub assessment_id: AssessmentId,
    pub user_answers: Vec<String>,
}

/// One answer per question, in question order.
///
/// Any question without an answer, or any answer that matches no question, fails
/// the whole reconciliation; nothing partial is ever produced.
///
/// # Errors
///
/// Returns `ReconcileError::CountMismatch` listing the unanswered questions.
pub fn reconcile_answers(
    questions: &[Question],
    answers: &AnswerSheet,
) -> Result<Vec<String>, ReconcileError> {
    let mut ordered = Vec::with_capacity(questions.len());
    let mut missing = Vec::new();
    for question in questions {
        match answers.get(question.id()) {
            Some(answer) => ordered.push(answer.selected_answer.clone()),
            None => missing.push(question.id().clone()),
        }
    }

    if !missing.is_empty() || answers.len() != questions.len() {
        return Err(ReconcileError::CountMismatch {
            expected: questions.len(),
            answered: answers.len(),
            missing,
        });
    }

    Ok(ordered)
}

impl AssessmentSession {
    /// Build the scoring payload from a completed session.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::NotComplete` before completion, or
    /// `ReconcileError::CountMismatch` if the answers do not cover the questions.
    pub fn submission(&self) -> Result<SubmissionPayload, ReconcileError> {
        if self.phase() != SessionPhase::Complete {
            return Err(ReconcileError::NotComplete {
                phase: self.phase(),
            });
        }
        Ok(SubmissionPayload {
            assessment_id: self.assessment_id().clone(),
            user_answers: reconcile_answers(self.questions(), self.answers())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserAnswer;
    use crate::session::tests::session;
    use crate::time::fixed_now;

    #[test]
    fn out_of_order_answers_are_emitted_in_question_order() {
        let session = session(3);
        let q = session.questions();
        let answers: AnswerSheet = [
            UserAnswer::new(q[2].id().clone(), "c"),
            UserAnswer::new(q[0].id().clone(), "a"),
            UserAnswer::new(q[1].id().clone(), "b"),
        ]
        .into_iter()
        .collect();

        let ordered = reconcile_answers(q, &answers).unwrap();
        assert_eq!(ordered, ["a", "b", "c"]);
    }

    #[test]
    fn missing_answer_is_a_count_mismatch() {
        let session = session(3);
        let q = session.questions();
        let answers: AnswerSheet = [
            UserAnswer::new(q[0].id().clone(), "a"),
            UserAnswer::new(q[2].id().clone(), "c"),
        ]
        .into_iter()
        .collect();

        let err = reconcile_answers(q, &answers).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::CountMismatch {
                expected: 3,
                answered: 2,
                missing: vec![q[1].id().clone()],
            }
        );
    }

    #[test]
    fn stray_answer_is_a_count_mismatch() {
        let session = session(1);
        let q = session.questions();
        let answers: AnswerSheet = [
            UserAnswer::new(q[0].id().clone(), "a"),
            UserAnswer::new(QuestionId::derive(&AssessmentId::new("zzz"), 0), "x"),
        ]
        .into_iter()
        .collect();

        assert!(matches!(
            reconcile_answers(q, &answers),
            Err(ReconcileError::CountMismatch { answered: 2, .. })
        ));
    }

    #[test]
    fn submission_requires_completion() {
        let mut session = session(2);
        assert!(matches!(
            session.submission(),
            Err(ReconcileError::NotComplete { .. })
        ));

        session.select_answer("wrong-0").unwrap();
        session.advance(fixed_now()).unwrap();
        session.select_answer("right-1").unwrap();
        session.advance(fixed_now()).unwrap();

        let payload = session.submission().unwrap();
        assert_eq!(payload.user_answers, ["wrong-0", "right-1"]);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["assessmentId"], "a1");
        assert_eq!(json["userAnswers"][1], "right-1");
    }
}
