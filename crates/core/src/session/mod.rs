mod progress;
mod snapshot;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{
    AnswerSheet, AssessmentId, Question, QuestionError, QuestionId, QuestionPayload, UserAnswer,
};

pub use progress::SessionProgress;
pub use snapshot::{SessionSnapshot, SnapshotError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("questions can only be loaded while the session is loading")]
    NotLoading,

    #[error("session is not in progress (phase: {phase})")]
    NotInProgress { phase: SessionPhase },

    #[error("answer is locked once the explanation is shown")]
    AnswerLocked,

    #[error("'{0}' is not an option for the current question")]
    InvalidOption(String),

    #[error("answer the current question before moving on")]
    Unanswered,

    #[error("answered {answered} of {total} questions; finish the remaining ones")]
    Incomplete { answered: usize, total: usize },

    #[error("retry is only available after completion or an error (phase: {phase})")]
    RetryUnavailable { phase: SessionPhase },

    #[error("the session has no questions to retry")]
    NoQuestions,

    #[error("the session is not waiting on unanswered questions")]
    NothingToResume,

    #[error(transparent)]
    Question(#[from] QuestionError),
}

//
// ─── STATE TYPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Loading,
    InProgress,
    Complete,
    Error,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionPhase::Loading => "loading",
            SessionPhase::InProgress => "in progress",
            SessionPhase::Complete => "complete",
            SessionPhase::Error => "error",
        };
        f.write_str(label)
    }
}

/// Whether an answer may be changed after its explanation has been revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnswerPolicy {
    /// Selecting an answer reveals the explanation and locks the question.
    #[default]
    LockOnReveal,
    /// The answer may be replaced until `advance()`; credit follows the latest answer.
    Revisable,
}

/// Why a session ended up in the `Error` phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionFailure {
    /// Generating or fetching the questions failed.
    Fetch(String),
    /// The delivered questions were malformed.
    Validation(String),
    /// The last question was left with unanswered questions behind it.
    Incomplete {
        answered: usize,
        total: usize,
        first_unanswered: usize,
    },
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFailure::Fetch(msg) => write!(f, "could not load the assessment: {msg}"),
            SessionFailure::Validation(msg) => write!(f, "the assessment is invalid: {msg}"),
            SessionFailure::Incomplete {
                answered, total, ..
            } => write!(
                f,
                "incomplete: answered {answered} of {total} questions"
            ),
        }
    }
}

/// Final tally captured when the session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCompletion {
    pub score: u32,
    pub total: u32,
    pub completed_at: DateTime<Utc>,
}

impl SessionCompletion {
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.total)
    }
}

/// Result of `select_answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub correct: bool,
    pub replaced: bool,
    pub running_score: u32,
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Completed(SessionCompletion),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through a generated assessment.
///
/// Owns the question set, the captured answers, the current position and the
/// running score. Every operation either applies fully or leaves the state untouched,
/// apart from the explicit transitions into `Error`.
#[derive(Clone)]
pub struct AssessmentSession {
    assessment_id: AssessmentId,
    attempt: u32,
    policy: AnswerPolicy,
    questions: Vec<Question>,
    answers: AnswerSheet,
    current: usize,
    running_score: u32,
    explanation_shown: bool,
    phase: SessionPhase,
    completion: Option<SessionCompletion>,
    failure: Option<SessionFailure>,
    started_at: DateTime<Utc>,
}

impl AssessmentSession {
    /// A session waiting for its questions.
    #[must_use]
    pub fn loading(assessment_id: AssessmentId, started_at: DateTime<Utc>) -> Self {
        Self {
            assessment_id,
            attempt: 0,
            policy: AnswerPolicy::default(),
            questions: Vec::new(),
            answers: AnswerSheet::new(),
            current: 0,
            running_score: 0,
            explanation_shown: false,
            phase: SessionPhase::Loading,
            completion: None,
            failure: None,
            started_at,
        }
    }

    /// A session built from questions that are already in hand.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Question` if the payloads are empty or malformed.
    pub fn from_payloads(
        assessment_id: AssessmentId,
        payloads: Vec<QuestionPayload>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let mut session = Self::loading(assessment_id, started_at);
        session.load_questions(payloads)?;
        Ok(session)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AnswerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deliver the question set and enter `InProgress` at the first question.
    ///
    /// Malformed or empty payloads move the session to `Error` with the reason retained.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotLoading` outside the `Loading` phase, or
    /// `SessionError::Question` if validation fails.
    pub fn load_questions(&mut self, payloads: Vec<QuestionPayload>) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Loading {
            return Err(SessionError::NotLoading);
        }

        match Question::list_from_payloads(&self.assessment_id, payloads) {
            Ok(questions) => {
                debug!(
                    assessment = %self.assessment_id,
                    count = questions.len(),
                    "questions loaded"
                );
                self.questions = questions;
                self.current = 0;
                self.phase = SessionPhase::InProgress;
                Ok(())
            }
            Err(err) => {
                self.fail(SessionFailure::Validation(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Enter `Error` from any phase, keeping the reason for display.
    pub fn fail(&mut self, failure: SessionFailure) {
        debug!(assessment = %self.assessment_id, %failure, "session failed");
        self.failure = Some(failure);
        self.explanation_shown = false;
        self.phase = SessionPhase::Error;
    }

    /// Record an answer for the current question.
    ///
    /// Adds one point iff the option matches the correct answer and reveals the
    /// explanation. Under `AnswerPolicy::Revisable` a second selection replaces the
    /// first and the credit follows the new answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`,
    /// `SessionError::AnswerLocked` once the explanation is shown under the lock
    /// policy, or `SessionError::InvalidOption` for an option the question does not offer.
    pub fn select_answer(&mut self, option: &str) -> Result<AnswerOutcome, SessionError> {
        self.ensure_in_progress()?;
        if self.explanation_shown && self.policy == AnswerPolicy::LockOnReveal {
            return Err(SessionError::AnswerLocked);
        }

        let question = &self.questions[self.current];
        if !question.accepts(option) {
            return Err(SessionError::InvalidOption(option.to_owned()));
        }

        let question_id = question.id().clone();
        let correct = question.is_correct(option);
        let previously_correct = self
            .answers
            .get(&question_id)
            .is_some_and(|prev| question.is_correct(&prev.selected_answer));

        let replaced = self
            .answers
            .upsert(UserAnswer::new(question_id.clone(), option))
            .is_some();
        if previously_correct {
            self.running_score = self.running_score.saturating_sub(1);
        }
        if correct {
            self.running_score += 1;
        }
        self.explanation_shown = true;

        Ok(AnswerOutcome {
            question_id,
            correct,
            replaced,
            running_score: self.running_score,
        })
    }

    /// Move past the current question.
    ///
    /// On the last question the session completes only if every question has an
    /// answer; otherwise it enters `Error` with an incomplete diagnostic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress`, `SessionError::Unanswered` when the
    /// current question has no answer, or `SessionError::Incomplete`.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        self.ensure_in_progress()?;
        if !self.answers.contains(self.questions[self.current].id()) {
            return Err(SessionError::Unanswered);
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.explanation_shown = false;
            return Ok(Advance::Next {
                index: self.current,
            });
        }

        let total = self.questions.len();
        let answered = self.answered_count();
        if let Some(first_unanswered) = self.first_unanswered() {
            self.fail(SessionFailure::Incomplete {
                answered,
                total,
                first_unanswered,
            });
            return Err(SessionError::Incomplete { answered, total });
        }

        let completion = SessionCompletion {
            score: self.running_score,
            total: u32::try_from(total).unwrap_or(u32::MAX),
            completed_at: now,
        };
        debug!(
            assessment = %self.assessment_id,
            score = completion.score,
            total = completion.total,
            "session complete"
        );
        self.completion = Some(completion.clone());
        self.phase = SessionPhase::Complete;
        Ok(Advance::Completed(completion))
    }

    /// Start over on the same question set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RetryUnavailable` outside `Complete`/`Error`, or
    /// `SessionError::NoQuestions` if the questions never arrived.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, SessionPhase::Complete | SessionPhase::Error) {
            return Err(SessionError::RetryUnavailable { phase: self.phase });
        }
        if self.questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        self.answers.clear();
        self.current = 0;
        self.running_score = 0;
        self.explanation_shown = false;
        self.completion = None;
        self.failure = None;
        self.attempt += 1;
        self.phase = SessionPhase::InProgress;
        debug!(assessment = %self.assessment_id, attempt = self.attempt, "session retried");
        Ok(())
    }

    /// Leave an incomplete-error state and jump to the first unanswered question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NothingToResume` unless the session failed as incomplete.
    pub fn resume_unanswered(&mut self) -> Result<usize, SessionError> {
        if self.phase != SessionPhase::Error
            || !matches!(self.failure, Some(SessionFailure::Incomplete { .. }))
        {
            return Err(SessionError::NothingToResume);
        }
        let index = self.first_unanswered().ok_or(SessionError::NothingToResume)?;

        self.current = index;
        self.explanation_shown = false;
        self.failure = None;
        self.phase = SessionPhase::InProgress;
        Ok(index)
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::InProgress {
            Ok(())
        } else {
            Err(SessionError::NotInProgress { phase: self.phase })
        }
    }

    fn first_unanswered(&self) -> Option<usize> {
        self.questions
            .iter()
            .position(|q| !self.answers.contains(q.id()))
    }

    fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answers.contains(q.id()))
            .count()
    }

    #[must_use]
    pub fn assessment_id(&self) -> &AssessmentId {
        &self.assessment_id
    }

    /// Number of times the session has been retried.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[must_use]
    pub fn policy(&self) -> AnswerPolicy {
        self.policy
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::InProgress => self.questions.get(self.current),
            _ => None,
        }
    }

    /// The answer recorded for the current question, if any.
    #[must_use]
    pub fn current_answer(&self) -> Option<&UserAnswer> {
        self.questions
            .get(self.current)
            .and_then(|q| self.answers.get(q.id()))
    }

    #[must_use]
    pub fn running_score(&self) -> u32 {
        self.running_score
    }

    #[must_use]
    pub fn explanation_shown(&self) -> bool {
        self.explanation_shown
    }

    #[must_use]
    pub fn completion(&self) -> Option<&SessionCompletion> {
        self.completion.as_ref()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        SessionProgress {
            position: if total == 0 { 0 } else { self.current + 1 },
            total,
            answered: self.answered_count(),
            running_score: self.running_score,
        }
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("assessment_id", &self.assessment_id)
            .field("attempt", &self.attempt)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("answers_len", &self.answers.len())
            .field("current", &self.current)
            .field("running_score", &self.running_score)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::QuestionType;
    use crate::time::fixed_now;

    pub(crate) fn payloads(n: usize) -> Vec<QuestionPayload> {
        (0..n)
            .map(|i| QuestionPayload {
                kind: QuestionType::MultipleChoice,
                question: format!("Question {}", i + 1),
                options: vec![format!("right-{i}"), format!("wrong-{i}")],
                correct_answer: format!("right-{i}"),
                explanation: format!("Explanation {}", i + 1),
            })
            .collect()
    }

    pub(crate) fn session(n: usize) -> AssessmentSession {
        AssessmentSession::from_payloads(AssessmentId::new("a1"), payloads(n), fixed_now())
            .unwrap()
    }

    fn answer_all(session: &mut AssessmentSession, correct: &[bool]) {
        for (i, is_right) in correct.iter().enumerate() {
            let option = if *is_right {
                format!("right-{i}")
            } else {
                format!("wrong-{i}")
            };
            session.select_answer(&option).unwrap();
            session.advance(fixed_now()).unwrap();
        }
    }

    #[test]
    fn starts_in_progress_at_first_question() {
        let session = session(3);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.current_question().unwrap().prompt(), "Question 1");
    }

    #[test]
    fn empty_question_set_enters_error() {
        let mut session = AssessmentSession::loading(AssessmentId::new("a1"), fixed_now());
        let err = session.load_questions(Vec::new()).unwrap_err();
        assert_eq!(err, SessionError::Question(QuestionError::NoQuestions));
        assert_eq!(session.phase(), SessionPhase::Error);
        assert!(matches!(session.failure(), Some(SessionFailure::Validation(_))));
        assert_eq!(session.retry().unwrap_err(), SessionError::NoQuestions);
    }

    #[test]
    fn correct_answers_add_one_point_each() {
        let mut session = session(3);
        for i in 0..3 {
            let outcome = session.select_answer(&format!("right-{i}")).unwrap();
            assert!(outcome.correct);
            assert_eq!(outcome.running_score, u32::try_from(i + 1).unwrap());
            session.advance(fixed_now()).unwrap();
        }
        assert_eq!(session.running_score(), 3);
    }

    #[test]
    fn incorrect_answer_does_not_score() {
        let mut session = session(2);
        let outcome = session.select_answer("wrong-0").unwrap();
        assert!(!outcome.correct);
        assert_eq!(session.running_score(), 0);
    }

    #[test]
    fn answer_is_locked_after_reveal() {
        let mut session = session(2);
        session.select_answer("wrong-0").unwrap();
        assert!(session.explanation_shown());
        assert_eq!(
            session.select_answer("right-0").unwrap_err(),
            SessionError::AnswerLocked
        );
        assert_eq!(session.running_score(), 0);
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.current_answer().unwrap().selected_answer, "wrong-0");
    }

    #[test]
    fn revisable_policy_upserts_and_moves_credit() {
        let mut session = session(2).with_policy(AnswerPolicy::Revisable);

        session.select_answer("right-0").unwrap();
        assert_eq!(session.running_score(), 1);

        let outcome = session.select_answer("wrong-0").unwrap();
        assert!(outcome.replaced);
        assert_eq!(session.running_score(), 0);
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.current_answer().unwrap().selected_answer, "wrong-0");

        session.select_answer("right-0").unwrap();
        assert_eq!(session.running_score(), 1);
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn unknown_option_is_rejected_without_mutation() {
        let mut session = session(2);
        assert_eq!(
            session.select_answer("maybe").unwrap_err(),
            SessionError::InvalidOption("maybe".into())
        );
        assert!(session.answers().is_empty());
        assert!(!session.explanation_shown());
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut session = session(2);
        assert_eq!(
            session.advance(fixed_now()).unwrap_err(),
            SessionError::Unanswered
        );
        session.select_answer("right-0").unwrap();
        assert_eq!(
            session.advance(fixed_now()).unwrap(),
            Advance::Next { index: 1 }
        );
        assert!(!session.explanation_shown());
    }

    #[test]
    fn final_advance_completes_with_tally() {
        let mut session = session(5);
        answer_all(&mut session, &[true, true, false, true, false]);

        assert_eq!(session.phase(), SessionPhase::Complete);
        let completion = session.completion().unwrap();
        assert_eq!(completion.score, 3);
        assert_eq!(completion.total, 5);
        assert_eq!(completion.completed_at, fixed_now());
        assert!((completion.percentage() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn final_advance_with_gaps_never_completes() {
        let mut session = session(3);
        session.select_answer("right-0").unwrap();
        session.advance(fixed_now()).unwrap();
        session.select_answer("right-1").unwrap();
        session.advance(fixed_now()).unwrap();
        session.select_answer("right-2").unwrap();
        // An answer disappearing behind the cursor (e.g. a stale restore).
        let second = session.questions()[1].id().clone();
        session.answers.remove(&second);

        let err = session.advance(fixed_now()).unwrap_err();
        assert_eq!(
            err,
            SessionError::Incomplete {
                answered: 2,
                total: 3
            }
        );
        assert_ne!(session.phase(), SessionPhase::Complete);
        assert_eq!(session.phase(), SessionPhase::Error);
        assert!(session.completion().is_none());

        assert_eq!(session.resume_unanswered().unwrap(), 1);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn retry_resets_but_keeps_questions() {
        let mut session = session(4);
        session.select_answer("right-0").unwrap();
        session.advance(fixed_now()).unwrap();
        session.select_answer("right-1").unwrap();

        assert!(matches!(
            session.retry(),
            Err(SessionError::RetryUnavailable { .. })
        ));

        session.fail(SessionFailure::Fetch("timeout".into()));
        let questions_before = session.questions().to_vec();
        session.retry().unwrap();

        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.running_score(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.questions(), questions_before.as_slice());
        assert_eq!(session.attempt(), 1);
    }

    #[test]
    fn retry_then_same_answers_reproduces_score() {
        let pattern = [true, false, true, true];
        let mut session = session(4);
        answer_all(&mut session, &pattern);
        let first = session.running_score();

        session.retry().unwrap();
        answer_all(&mut session, &pattern);

        assert_eq!(session.running_score(), first);
        assert_eq!(session.completion().unwrap().score, first);
    }

    #[test]
    fn progress_reports_against_attempted_questions() {
        let mut session = session(4);
        session.select_answer("right-0").unwrap();
        session.advance(fixed_now()).unwrap();
        session.select_answer("wrong-1").unwrap();

        let progress = session.progress();
        assert_eq!(progress.position, 2);
        assert_eq!(progress.total, 4);
        assert!((progress.fraction() - 0.5).abs() < f64::EPSILON);
        assert!((progress.score_ratio() - 0.5).abs() < f64::EPSILON);
        assert_eq!(progress.score_label(), "Score: 1/2");
    }

    #[test]
    fn operations_outside_progress_are_rejected() {
        let mut session = AssessmentSession::loading(AssessmentId::new("a1"), fixed_now());
        assert!(matches!(
            session.select_answer("x"),
            Err(SessionError::NotInProgress {
                phase: SessionPhase::Loading
            })
        ));
        assert!(matches!(
            session.advance(fixed_now()),
            Err(SessionError::NotInProgress { .. })
        ));
    }
}
