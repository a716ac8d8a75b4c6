use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use exam_core::countdown::{Countdown, Tick};
use exam_core::model::{ExamSession, OptionKey, QuestionId};
use exam_core::scoring::ScoreReport;

use super::manager::SessionManager;
use crate::error::SessionError;
use crate::notify::{Notice, Notifier};

/// Observable timer state. `Expired` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Running { remaining_secs: u32 },
    /// The countdown reached zero and submitted the exam.
    Expired,
    /// The exam was submitted before the countdown ran out.
    Cancelled,
}

impl TimerStatus {
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, TimerStatus::Running { .. })
    }

    #[must_use]
    pub fn remaining_secs(self) -> u32 {
        match self {
            TimerStatus::Running { remaining_secs } => remaining_secs,
            TimerStatus::Expired | TimerStatus::Cancelled => 0,
        }
    }
}

/// Outcome of the expiry path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expiry {
    Submitted,
    AlreadyCompleted,
}

/// Shared state between the exam handle and its countdown task.
struct Shared {
    manager: Arc<SessionManager>,
    session: Mutex<ExamSession>,
    notifier: Arc<dyn Notifier>,
    status: watch::Sender<TimerStatus>,
}

impl Shared {
    /// Move a running timer into a terminal status. Terminal states never change.
    fn finish(&self, status: TimerStatus) {
        self.status.send_if_modified(|current| {
            if current.is_running() {
                *current = status;
                true
            } else {
                false
            }
        });
    }

    fn report_completion(&self, report: &ScoreReport, forced: bool) {
        let score = report.percentage().round();
        let notice = if forced {
            Notice::info(
                "Time's Up",
                format!("Your exam was submitted automatically. Score: {score:.0}%"),
            )
        } else {
            Notice::success("Exam Submitted", format!("You scored {score:.0}%"))
        };
        self.notifier.notify(notice);
    }

    fn reported<T>(&self, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if let Err(err) = &result {
            self.notifier.notify(Notice::for_error(err));
        }
        result
    }

    async fn expire(&self) -> Expiry {
        let mut session = self.session.lock().await;
        let id = session.id();
        match self.manager.submit(&mut session, true) {
            Ok(report) => {
                self.report_completion(report, true);
                self.finish(TimerStatus::Expired);
                Expiry::Submitted
            }
            Err(err) => {
                tracing::debug!(session = %id, error = %err, "expiry after completion ignored");
                Expiry::AlreadyCompleted
            }
        }
    }
}

async fn run_countdown(shared: Arc<Shared>, total_secs: u32) {
    let mut countdown = Countdown::new(total_secs);
    let period = Duration::from_secs(1);
    let mut ticks = interval_at(Instant::now() + period, period);

    loop {
        ticks.tick().await;
        match countdown.tick() {
            Tick::Running { remaining_secs } => {
                shared.status.send_if_modified(|current| {
                    if current.is_running() {
                        *current = TimerStatus::Running { remaining_secs };
                        true
                    } else {
                        false
                    }
                });
            }
            Tick::Expired => {
                shared.expire().await;
                return;
            }
            Tick::Stopped => return,
        }
    }
}

/// A session paired with its countdown task.
///
/// Dropping the handle stops the countdown; the session is discarded with it.
pub struct TimedExam {
    shared: Arc<Shared>,
    timer: JoinHandle<()>,
}

impl TimedExam {
    /// Spawn the countdown for `session` on the current tokio runtime.
    #[must_use]
    pub fn spawn(
        manager: Arc<SessionManager>,
        session: ExamSession,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let total_secs = manager.context().settings.duration_secs();
        let (status, _) = watch::channel(TimerStatus::Running {
            remaining_secs: total_secs,
        });
        let shared = Arc::new(Shared {
            manager,
            session: Mutex::new(session),
            notifier,
            status,
        });
        let timer = tokio::spawn(run_countdown(Arc::clone(&shared), total_secs));
        Self { shared, timer }
    }

    /// # Errors
    ///
    /// See [`SessionManager::select_answer`].
    pub async fn select_answer(
        &self,
        question: QuestionId,
        key: OptionKey,
    ) -> Result<(), SessionError> {
        let mut session = self.shared.session.lock().await;
        let result = self
            .shared
            .manager
            .select_answer(&mut session, question, key);
        self.shared.reported(result)
    }

    /// Submit manually and stop the countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the exam was already submitted,
    /// including by the countdown.
    pub async fn submit(&self) -> Result<ScoreReport, SessionError> {
        let mut session = self.shared.session.lock().await;
        let submitted = self
            .shared
            .manager
            .submit(&mut session, false)
            .map(ScoreReport::clone);
        let report = self.shared.reported(submitted)?;
        self.shared.report_completion(&report, false);
        self.shared.finish(TimerStatus::Cancelled);
        drop(session);

        self.timer.abort();
        Ok(report)
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        *self.shared.status.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.shared.status.subscribe()
    }

    /// Resolve once the timer reaches a terminal status.
    pub async fn wait_finished(&self) -> TimerStatus {
        let mut status = self.subscribe();
        match status.wait_for(|s| !s.is_running()).await {
            Ok(done) => *done,
            Err(_) => TimerStatus::Cancelled,
        }
    }

    /// Copy of the session as it stands now.
    pub async fn snapshot(&self) -> ExamSession {
        self.shared.session.lock().await.clone()
    }

    #[cfg(test)]
    pub(crate) async fn force_expiry(&self) -> Expiry {
        self.shared.expire().await
    }
}

impl Drop for TimedExam {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExamContext;
    use crate::notify::MemoryNotifier;
    use crate::sessions::plan::QuestionSampler;
    use exam_core::model::{
        Course, CourseId, ExamSettings, Learner, OptionPolicy, Plan, Question, QuestionDraft,
        QuestionPool, Semester, Submission, UserId,
    };
    use exam_core::time::fixed_clock;

    fn course() -> Course {
        Course::new(CourseId::new(7), "GSS102", "Philosophy and Logic", 100, Semester::Second)
            .unwrap()
    }

    fn pool(n: u64) -> QuestionPool {
        let questions = (1..=n)
            .map(|id| {
                QuestionDraft {
                    course_id: CourseId::new(7),
                    year: 2023,
                    prompt: format!("Premise {id}"),
                    options: vec![("a".into(), "True".into()), ("b".into(), "False".into())],
                    correct: "a".into(),
                    explanation: None,
                }
                .validate(QuestionId::new(id))
                .unwrap()
            })
            .collect();
        QuestionPool::new(questions).unwrap()
    }

    fn timed(duration_secs: u32, notifier: &MemoryNotifier) -> TimedExam {
        let settings = ExamSettings::new(duration_secs, 20, 3, OptionPolicy::Permissive).unwrap();
        let context = ExamContext::new(
            Learner::new(UserId::new(1), "Ada", Plan::Free),
            fixed_clock(),
            settings,
        );
        let manager = Arc::new(SessionManager::new(context, QuestionSampler::seeded(1)));
        let session = manager.start_default(&course(), &pool(20)).unwrap();
        TimedExam::spawn(manager, session, Arc::new(notifier.clone()))
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_publishes_remaining_seconds() {
        let notifier = MemoryNotifier::new();
        let exam = timed(10, &notifier);
        assert_eq!(exam.status(), TimerStatus::Running { remaining_secs: 10 });

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(exam.status(), TimerStatus::Running { remaining_secs: 7 });
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_after_manual_submit_is_a_no_op() {
        let notifier = MemoryNotifier::new();
        let exam = timed(60, &notifier);

        exam.submit().await.unwrap();
        assert_eq!(exam.force_expiry().await, Expiry::AlreadyCompleted);

        let snapshot = exam.snapshot().await;
        assert_eq!(snapshot.submission(), Some(Submission::Manual));
        assert_eq!(exam.status(), TimerStatus::Cancelled);
        assert_eq!(notifier.titles(), vec!["Exam Submitted"]);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_path_submits_once() {
        let notifier = MemoryNotifier::new();
        let exam = timed(60, &notifier);

        assert_eq!(exam.force_expiry().await, Expiry::Submitted);
        assert_eq!(exam.force_expiry().await, Expiry::AlreadyCompleted);
        assert_eq!(exam.status(), TimerStatus::Expired);

        let err = exam.submit().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState));
        assert_eq!(notifier.titles(), vec!["Time's Up", "Exam Already Submitted"]);

        let snapshot = exam.snapshot().await;
        let report = snapshot.report().unwrap();
        assert_eq!(report.incorrect_count(), 20);
        assert!(report.incorrect().iter().all(|q: &Question| snapshot.answer_for(q.id()).is_none()));
    }
}
