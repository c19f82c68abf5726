/// Progress of an assessment session, as shown next to the current question.
///
/// The score ratio is measured against questions attempted so far, never the whole set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based position of the current question; 0 when no questions are loaded.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub running_score: u32,
}

impl SessionProgress {
    /// `position / total`, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.position as f64 / self.total as f64
    }

    /// `running_score / position`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score_ratio(&self) -> f64 {
        if self.position == 0 {
            return 0.0;
        }
        f64::from(self.running_score) / self.position as f64
    }

    #[must_use]
    pub fn position_label(&self) -> String {
        format!("Question {} of {}", self.position, self.total)
    }

    #[must_use]
    pub fn score_label(&self) -> String {
        format!("Score: {}/{}", self.running_score, self.position)
    }
}
