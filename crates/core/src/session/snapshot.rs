use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AnswerPolicy, AssessmentSession, SessionCompletion, SessionFailure, SessionPhase};
use crate::model::{AnswerSheet, AssessmentId, Question, QuestionId, UserAnswer};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot answers unknown question {0}")]
    UnknownQuestion(QuestionId),

    #[error("snapshot has duplicate answers for question {0}")]
    DuplicateAnswer(QuestionId),

    #[error("current index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("running score {stored} does not match {computed} correct answers")]
    ScoreMismatch { stored: u32, computed: u32 },

    #[error("phase {phase} is inconsistent with the snapshot contents")]
    InconsistentPhase { phase: SessionPhase },
}

/// Serializable form of an [`AssessmentSession`], used at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub assessment_id: AssessmentId,
    pub attempt: u32,
    pub policy: AnswerPolicy,
    pub phase: SessionPhase,
    pub questions: Vec<Question>,
    /// Ordered like `questions`.
    pub answers: Vec<UserAnswer>,
    pub current_index: usize,
    pub running_score: u32,
    pub explanation_shown: bool,
    pub completion: Option<SessionCompletion>,
    pub failure: Option<SessionFailure>,
    pub started_at: DateTime<Utc>,
}

impl AssessmentSession {
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let answers = self
            .questions
            .iter()
            .filter_map(|q| self.answers.get(q.id()).cloned())
            .collect();

        SessionSnapshot {
            assessment_id: self.assessment_id.clone(),
            attempt: self.attempt,
            policy: self.policy,
            phase: self.phase,
            questions: self.questions.clone(),
            answers,
            current_index: self.current,
            running_score: self.running_score,
            explanation_shown: self.explanation_shown,
            completion: self.completion.clone(),
            failure: self.failure.clone(),
            started_at: self.started_at,
        }
    }

    /// Rebuild a session from a snapshot, re-checking the session invariants.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if answers reference unknown or duplicate questions,
    /// the index is out of range, the score disagrees with the answers, or the
    /// phase does not fit the contents.
    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, SnapshotError> {
        let SessionSnapshot {
            assessment_id,
            attempt,
            policy,
            phase,
            questions,
            answers,
            current_index,
            running_score,
            explanation_shown,
            completion,
            failure,
            started_at,
        } = snapshot;

        let mut sheet = AnswerSheet::new();
        let mut computed = 0_u32;
        for answer in answers {
            let question = questions
                .iter()
                .find(|q| *q.id() == answer.question_id)
                .ok_or_else(|| SnapshotError::UnknownQuestion(answer.question_id.clone()))?;
            if question.is_correct(&answer.selected_answer) {
                computed += 1;
            }
            let id = answer.question_id.clone();
            if sheet.upsert(answer).is_some() {
                return Err(SnapshotError::DuplicateAnswer(id));
            }
        }
        if computed != running_score {
            return Err(SnapshotError::ScoreMismatch {
                stored: running_score,
                computed,
            });
        }

        let len = questions.len();
        if len > 0 && current_index >= len {
            return Err(SnapshotError::IndexOutOfRange {
                index: current_index,
                len,
            });
        }

        let consistent = match phase {
            SessionPhase::Loading => len == 0 && sheet.is_empty(),
            SessionPhase::InProgress => {
                len > 0
                    && completion.is_none()
                    && (!explanation_shown || sheet.contains(questions[current_index].id()))
            }
            SessionPhase::Complete => {
                len > 0
                    && sheet.len() == len
                    && completion.as_ref().is_some_and(|c| {
                        c.score == running_score && usize::try_from(c.total).ok() == Some(len)
                    })
            }
            SessionPhase::Error => failure.is_some(),
        };
        if !consistent {
            return Err(SnapshotError::InconsistentPhase { phase });
        }

        Ok(Self {
            assessment_id,
            attempt,
            policy,
            questions,
            answers: sheet,
            current: current_index,
            running_score,
            explanation_shown,
            phase,
            completion,
            failure,
            started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::session;
    use crate::time::fixed_now;

    #[test]
    fn restore_preserves_mid_session_state() {
        let mut original = session(3);
        original.select_answer("right-0").unwrap();
        original.advance(fixed_now()).unwrap();
        original.select_answer("wrong-1").unwrap();

        let json = serde_json::to_string(&original.snapshot()).unwrap();
        let snapshot: SessionSnapshot = serde_json::from_str(&json).unwrap();
        let mut restored = AssessmentSession::restore(snapshot).unwrap();

        assert_eq!(restored.current_index(), 1);
        assert_eq!(restored.running_score(), 1);
        assert!(restored.explanation_shown());
        assert_eq!(
            restored.select_answer("right-1").unwrap_err(),
            crate::session::SessionError::AnswerLocked
        );
        restored.advance(fixed_now()).unwrap();
        assert_eq!(restored.current_index(), 2);
    }

    #[test]
    fn restore_rejects_tampered_score() {
        let mut original = session(2);
        original.select_answer("wrong-0").unwrap();
        let mut snapshot = original.snapshot();
        snapshot.running_score = 1;

        assert_eq!(
            AssessmentSession::restore(snapshot).unwrap_err(),
            SnapshotError::ScoreMismatch {
                stored: 1,
                computed: 0
            }
        );
    }

    #[test]
    fn restore_rejects_duplicate_and_unknown_answers() {
        let mut original = session(2);
        original.select_answer("right-0").unwrap();
        let mut snapshot = original.snapshot();
        snapshot.answers.push(snapshot.answers[0].clone());
        snapshot.running_score = 2;
        assert!(matches!(
            AssessmentSession::restore(snapshot),
            Err(SnapshotError::DuplicateAnswer(_))
        ));

        let mut snapshot = original.snapshot();
        snapshot.answers[0].question_id = QuestionId::derive(&AssessmentId::new("other"), 0);
        assert!(matches!(
            AssessmentSession::restore(snapshot),
            Err(SnapshotError::UnknownQuestion(_))
        ));
    }

    #[test]
    fn restore_rejects_completion_score_that_disagrees_with_answers() {
        let mut original = session(1);
        original.select_answer("wrong-0").unwrap();
        original.advance(fixed_now()).unwrap();
        let mut snapshot = original.snapshot();
        assert!(AssessmentSession::restore(snapshot.clone()).is_ok());

        if let Some(completion) = snapshot.completion.as_mut() {
            completion.score = 1;
        }
        assert_eq!(
            AssessmentSession::restore(snapshot).unwrap_err(),
            SnapshotError::InconsistentPhase {
                phase: SessionPhase::Complete
            }
        );
    }

    #[test]
    fn restore_rejects_revealed_explanation_without_an_answer() {
        let mut original = session(2);
        original.select_answer("right-0").unwrap();
        original.advance(fixed_now()).unwrap();
        let mut snapshot = original.snapshot();
        snapshot.explanation_shown = true;

        assert_eq!(
            AssessmentSession::restore(snapshot).unwrap_err(),
            SnapshotError::InconsistentPhase {
                phase: SessionPhase::InProgress
            }
        );
    }

    #[test]
    fn restore_rejects_complete_without_all_answers() {
        let mut original = session(2);
        original.select_answer("right-0").unwrap();
        let mut snapshot = original.snapshot();
        snapshot.phase = SessionPhase::Complete;
        snapshot.completion = Some(SessionCompletion {
            score: 1,
            total: 2,
            completed_at: fixed_now(),
        });
        assert_eq!(
            AssessmentSession::restore(snapshot).unwrap_err(),
            SnapshotError::InconsistentPhase {
                phase: SessionPhase::Complete
            }
        );
    }
}
