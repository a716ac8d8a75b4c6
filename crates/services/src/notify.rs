//! User-facing notifications (toasts in a UI, log lines in the terminal app).

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Info, title, description)
    }

    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Success, title, description)
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Error, title, description)
    }

    fn with_level(
        level: NoticeLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Message shown to the learner for a failed session action.
    #[must_use]
    pub fn for_error(err: &SessionError) -> Self {
        match err {
            SessionError::EmptyPool => Notice::error(
                "No Questions",
                "There are no questions available for this course yet.",
            ),
            SessionError::CourseNotFound(_) => {
                Notice::error("Course Required", "Please select a course to start the CBT")
            }
            SessionError::DailyLimitReached { limit } => Notice::error(
                "Daily Limit Reached",
                format!(
                    "You can take up to {limit} CBT exams per day. Upgrade to Premium for unlimited practice tests."
                ),
            ),
            SessionError::InvalidState => Notice::info(
                "Exam Already Submitted",
                "This exam has already been submitted. Start a new exam to try again.",
            ),
            SessionError::UnknownOption { key, .. } => Notice::error(
                "Invalid Answer",
                format!("Option {} is not available for this question.", key.as_str().to_uppercase()),
            ),
            other => Notice::error("Something Went Wrong", other.to_string()),
        }
    }
}

/// Sink for user-facing notices. Pure output; nothing is returned to the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => {
                tracing::warn!(title = %notice.title, "{}", notice.description);
            }
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(title = %notice.title, "{}", notice.description);
            }
        }
    }
}

/// Keeps every notice in memory; used by tests and by front ends that poll.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.title).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_notifier_keeps_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notice::info("one", "first"));
        notifier.notify(Notice::error("two", "second"));
        assert_eq!(notifier.titles(), vec!["one", "two"]);
        assert_eq!(notifier.notices()[1].level, NoticeLevel::Error);
    }

    #[test]
    fn daily_limit_notice_mentions_limit() {
        let notice = Notice::for_error(&SessionError::DailyLimitReached { limit: 3 });
        assert_eq!(notice.title, "Daily Limit Reached");
        assert!(notice.description.contains("up to 3 CBT exams"));
    }
}
