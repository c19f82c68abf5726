use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: QuestionId,
    pub selected_answer: String,
}

impl UserAnswer {
    #[must_use]
    pub fn new(question_id: QuestionId, selected_answer: impl Into<String>) -> Self {
        Self {
            question_id,
            selected_answer: selected_answer.into(),
        }
    }
}

/// Captured answers keyed by question id; at most one answer per question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    answers: HashMap<QuestionId, UserAnswer>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the answer for its question, returning the replaced one.
    pub fn upsert(&mut self, answer: UserAnswer) -> Option<UserAnswer> {
        self.answers.insert(answer.question_id.clone(), answer)
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<&UserAnswer> {
        self.answers.get(question_id)
    }

    #[must_use]
    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn remove(&mut self, question_id: &QuestionId) -> Option<UserAnswer> {
        self.answers.remove(question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Answers in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &UserAnswer> {
        self.answers.values()
    }
}

impl FromIterator<UserAnswer> for AnswerSheet {
    fn from_iter<I: IntoIterator<Item = UserAnswer>>(iter: I) -> Self {
        let mut sheet = Self::new();
        for answer in iter {
            sheet.upsert(answer);
        }
        sheet
    }
}
