use std::collections::HashMap;

use crate::model::{OptionKey, Question, QuestionId};

//
// ─── SCORE REPORT ──────────────────────────────────────────────────────────────
//

/// Outcome of grading a submitted exam.
///
/// `percentage` is kept unrounded; rounding belongs to whoever displays it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    percentage: f64,
    correct: Vec<Question>,
    incorrect: Vec<Question>,
}

impl ScoreReport {
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn correct(&self) -> &[Question] {
        &self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> &[Question] {
        &self.incorrect
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct.len()
    }

    #[must_use]
    pub fn incorrect_count(&self) -> usize {
        self.incorrect.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.correct.len() + self.incorrect.len()
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_percentage(self.percentage)
    }
}

/// Grade every question; a missing answer counts as incorrect.
///
/// Questions keep their original order inside each partition.
#[must_use]
pub fn score_answers(
    questions: &[Question],
    answers: &HashMap<QuestionId, OptionKey>,
) -> ScoreReport {
    let (correct, incorrect): (Vec<Question>, Vec<Question>) = questions
        .iter()
        .cloned()
        .partition(|q| q.is_answered_by(answers.get(&q.id())));

    let percentage = if questions.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = correct.len() as f64 / questions.len() as f64;
        100.0 * ratio
    };

    ScoreReport {
        percentage,
        correct,
        incorrect,
    }
}

//
// ─── SCORE BAND ────────────────────────────────────────────────────────────────
//

/// Coarse feedback bucket shown next to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// 70% and above.
    Excellent,
    /// 50% up to 70%.
    Good,
    /// Below 50%.
    KeepPracticing,
}

impl ScoreBand {
    #[must_use]
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= 70.0 {
            ScoreBand::Excellent
        } else if percentage >= 50.0 {
            ScoreBand::Good
        } else {
            ScoreBand::KeepPracticing
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent! You've mastered this subject.",
            ScoreBand::Good => "Good job! You're on the right track.",
            ScoreBand::KeepPracticing => "Keep practicing! You'll improve with more studying.",
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
