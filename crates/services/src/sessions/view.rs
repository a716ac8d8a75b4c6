use chrono::Duration;

use exam_core::model::{ExamSession, Learner, OptionKey, QuestionId, SessionId, Submission};
use exam_core::scoring::ScoreBand;

/// Missed questions listed on the results screen.
pub const MISSED_PREVIEW: usize = 3;

/// A question the learner got wrong or skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissedQuestion {
    pub question_id: QuestionId,
    pub prompt: String,
    pub selected: Option<OptionKey>,
    pub correct: OptionKey,
    pub options: Vec<(OptionKey, String)>,
    /// Only filled in for subscribed learners.
    pub explanation: Option<String>,
}

/// Presentation-agnostic summary of a completed exam.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamResultView {
    pub session_id: SessionId,
    pub course_name: String,
    pub percentage: f64,
    pub rounded_score: u32,
    pub band: ScoreBand,
    pub correct: usize,
    pub incorrect: usize,
    pub total: usize,
    pub correct_share: u32,
    pub incorrect_share: u32,
    pub time_taken: Option<Duration>,
    pub forced: bool,
    pub missed: Vec<MissedQuestion>,
    pub more_missed: usize,
}

fn rounded_share(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let share = (part as f64 * 100.0 / total as f64).round() as u32;
    share
}

impl ExamResultView {
    /// Build the results view; `None` while the exam is still active.
    #[must_use]
    pub fn build(session: &ExamSession, learner: &Learner) -> Option<Self> {
        let report = session.report()?;
        let show_explanations = learner.is_subscribed();

        let missed = report
            .incorrect()
            .iter()
            .take(MISSED_PREVIEW)
            .map(|question| MissedQuestion {
                question_id: question.id(),
                prompt: question.prompt().to_owned(),
                selected: session.answer_for(question.id()).cloned(),
                correct: question.correct_key().clone(),
                options: question
                    .options()
                    .iter()
                    .map(|(key, text)| (key.clone(), text.clone()))
                    .collect(),
                explanation: question
                    .explanation()
                    .filter(|_| show_explanations)
                    .map(str::to_owned),
            })
            .collect::<Vec<_>>();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded_score = report.percentage().round() as u32;

        Some(Self {
            session_id: session.id(),
            course_name: session.course_name().to_owned(),
            percentage: report.percentage(),
            rounded_score,
            band: report.band(),
            correct: report.correct_count(),
            incorrect: report.incorrect_count(),
            total: report.total(),
            correct_share: rounded_share(report.correct_count(), report.total()),
            incorrect_share: rounded_share(report.incorrect_count(), report.total()),
            time_taken: session.time_taken(),
            forced: session.submission() == Some(Submission::Forced),
            more_missed: report.incorrect_count().saturating_sub(missed.len()),
            missed,
        })
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        self.band.message()
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.incorrect == 0
    }
}

/// Render seconds as `mm:ss`; minutes are not wrapped at an hour.
#[must_use]
pub fn format_countdown(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        Course, CourseId, OptionPolicy, Plan, QuestionDraft, QuestionPool, Semester, UserId,
    };
    use exam_core::time::fixed_now;

    fn session(n: u64) -> ExamSession {
        let course =
            Course::new(CourseId::new(3), "CSC201", "Data Structures", 200, Semester::First)
                .unwrap();
        let questions = (1..=n)
            .map(|id| {
                QuestionDraft {
                    course_id: course.id(),
                    year: 2020,
                    prompt: format!("Structure {id}"),
                    options: vec![
                        ("a".into(), "Stack".into()),
                        ("b".into(), "Queue".into()),
                    ],
                    correct: "a".into(),
                    explanation: Some("LIFO".into()),
                }
                .validate(QuestionId::new(id))
                .unwrap()
            })
            .collect();
        ExamSession::new(
            SessionId::random(),
            UserId::new(1),
            &course,
            QuestionPool::new(questions).unwrap(),
            fixed_now(),
        )
        .unwrap()
    }

    fn answer(session: &mut ExamSession, id: u64, key: &str) {
        session
            .select_answer(
                QuestionId::new(id),
                OptionKey::new(key).unwrap(),
                OptionPolicy::Permissive,
            )
            .unwrap();
    }

    #[test]
    fn active_session_has_no_view() {
        let learner = Learner::new(UserId::new(1), "Ada", Plan::Free);
        assert!(ExamResultView::build(&session(2), &learner).is_none());
    }

    #[test]
    fn previews_three_missed_and_hides_explanations_on_free_plan() {
        let mut exam = session(6);
        answer(&mut exam, 1, "a");
        answer(&mut exam, 2, "b");
        exam.complete(fixed_now() + Duration::seconds(754), Submission::Manual)
            .unwrap();

        let free = Learner::new(UserId::new(1), "Ada", Plan::Free);
        let view = ExamResultView::build(&exam, &free).unwrap();
        assert_eq!(view.rounded_score, 17);
        assert_eq!(view.band, ScoreBand::KeepPracticing);
        assert_eq!((view.correct, view.incorrect, view.total), (1, 5, 6));
        assert_eq!((view.correct_share, view.incorrect_share), (17, 83));
        assert_eq!(view.missed.len(), 3);
        assert_eq!(view.more_missed, 2);
        assert_eq!(view.missed[0].selected, Some(OptionKey::new("b").unwrap()));
        assert!(view.missed.iter().all(|m| m.explanation.is_none()));
        assert_eq!(view.time_taken, Some(Duration::seconds(754)));
        assert!(!view.forced);

        let premium = Learner::new(UserId::new(1), "Ada", Plan::Premium);
        let view = ExamResultView::build(&exam, &premium).unwrap();
        assert_eq!(view.missed[0].explanation.as_deref(), Some("LIFO"));
    }

    #[test]
    fn perfect_exam_has_nothing_missed() {
        let mut exam = session(2);
        answer(&mut exam, 1, "a");
        answer(&mut exam, 2, "a");
        exam.complete(fixed_now(), Submission::Forced).unwrap();

        let learner = Learner::new(UserId::new(1), "Ada", Plan::Free);
        let view = ExamResultView::build(&exam, &learner).unwrap();
        assert!(view.is_perfect());
        assert!(view.forced);
        assert_eq!(view.rounded_score, 100);
        assert_eq!(view.message(), ScoreBand::Excellent.message());
    }

    #[test]
    fn countdown_format() {
        assert_eq!(format_countdown(1800), "30:00");
        assert_eq!(format_countdown(65), "01:05");
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(3_725), "62:05");
    }
}
