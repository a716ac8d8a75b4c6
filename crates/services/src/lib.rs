#![forbid(unsafe_code)]

pub mod catalog;
pub mod context;
pub mod error;
pub mod notify;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use catalog::{CatalogService, CourseFilter, CourseListItem};
pub use context::ExamContext;
pub use error::{CatalogError, SessionError};
pub use notify::{MemoryNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};

pub use sessions::{
    ExamProgress, ExamResultView, ExamService, MissedQuestion, QuestionCursor, QuestionSampler,
    SessionManager, TimedExam, TimerStatus, format_countdown,
};
