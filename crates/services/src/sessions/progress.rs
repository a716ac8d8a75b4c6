use exam_core::model::{ExamSession, Question};

/// Aggregated view of exam progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub is_complete: bool,
}

impl ExamProgress {
    #[must_use]
    pub fn of(session: &ExamSession) -> Self {
        let total = session.questions().len();
        let answered = session.answered_count();
        Self {
            total,
            answered,
            unanswered: total.saturating_sub(answered),
            is_complete: session.is_completed(),
        }
    }
}

/// Position of the question currently on screen. Never leaves `0..len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionCursor {
    index: usize,
    len: usize,
}

impl QuestionCursor {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    #[must_use]
    pub fn for_session(session: &ExamSession) -> Self {
        Self::new(session.questions().len())
    }

    /// Zero-based index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based position, as shown to the learner.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index + 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.len
    }

    /// Returns false when already on the last question.
    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Returns false when already on the first question.
    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Jump to a one-based position. Out-of-range positions are ignored.
    pub fn jump(&mut self, position: usize) -> bool {
        if position == 0 || position > self.len {
            return false;
        }
        self.index = position - 1;
        true
    }

    #[must_use]
    pub fn current<'s>(&self, session: &'s ExamSession) -> Option<&'s Question> {
        session.questions().questions().get(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_stays_in_bounds() {
        let mut cursor = QuestionCursor::new(3);
        assert!(cursor.is_first());
        assert!(!cursor.previous());

        assert!(cursor.next());
        assert!(cursor.next());
        assert!(cursor.is_last());
        assert!(!cursor.next());
        assert_eq!(cursor.position(), 3);

        assert!(cursor.jump(1));
        assert_eq!(cursor.index(), 0);
        assert!(!cursor.jump(0));
        assert!(!cursor.jump(4));
        assert_eq!(cursor.index(), 0);
    }
}
