mod manager;
mod plan;
mod progress;
mod timer;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use manager::SessionManager;
pub use plan::{QuestionSampler, SamplePlan};
pub use progress::{ExamProgress, QuestionCursor};
pub use timer::{TimedExam, TimerStatus};
pub use view::{ExamResultView, MISSED_PREVIEW, MissedQuestion, format_countdown};
pub use workflow::ExamService;
