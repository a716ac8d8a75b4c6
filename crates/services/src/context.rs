use exam_core::Clock;
use exam_core::model::{ExamSettings, Learner};

/// Everything a session needs from its surroundings, passed explicitly.
#[derive(Debug, Clone)]
pub struct ExamContext {
    pub learner: Learner,
    pub clock: Clock,
    pub settings: ExamSettings,
}

impl ExamContext {
    #[must_use]
    pub fn new(learner: Learner, clock: Clock, settings: ExamSettings) -> Self {
        Self {
            learner,
            clock,
            settings,
        }
    }
}
