use std::sync::Arc;
use std::time::Duration;

use exam_core::model::{
    Course, CourseId, ExamSettings, Learner, OptionKey, OptionPolicy, Plan, Question,
    QuestionDraft, QuestionId, Semester, Submission, UserId,
};
use exam_core::time::fixed_clock;
use services::{
    ExamContext, ExamService, MemoryNotifier, QuestionSampler, SessionError, SessionManager,
    TimedExam, TimerStatus,
};
use storage::repository::Storage;

const COURSE: CourseId = CourseId::new(8);

async fn storage_with_questions(n: u64) -> Storage {
    let storage = Storage::in_memory();
    let course = Course::new(
        COURSE,
        "GSS201",
        "Peace Studies and Conflict Resolution",
        200,
        Semester::First,
    )
    .unwrap();
    storage.courses.upsert_course(&course).await.unwrap();

    for id in 1..=n {
        let question = QuestionDraft {
            course_id: COURSE,
            year: 2021,
            prompt: format!("Conflict scenario {id}"),
            options: vec![
                ("a".into(), "Mediation".into()),
                ("b".into(), "Arbitration".into()),
                ("c".into(), "Litigation".into()),
                ("d".into(), "Negotiation".into()),
            ],
            correct: "a".into(),
            explanation: None,
        }
        .validate(QuestionId::new(id))
        .unwrap();
        storage.questions.upsert_question(&question).await.unwrap();
    }
    storage
}

async fn start(duration_secs: u32, notifier: &MemoryNotifier) -> TimedExam {
    let storage = storage_with_questions(25).await;
    let settings = ExamSettings::new(duration_secs, 20, 3, OptionPolicy::Permissive).unwrap();
    let context = ExamContext::new(
        Learner::new(UserId::new(9), "Bola", Plan::Free),
        fixed_clock(),
        settings,
    );
    let manager = Arc::new(SessionManager::new(context, QuestionSampler::seeded(5)));
    let service = ExamService::from_storage(manager, &storage, Arc::new(notifier.clone()));
    service.start_timed(COURSE).await.unwrap()
}

fn key(raw: &str) -> OptionKey {
    OptionKey::new(raw).unwrap()
}

#[tokio::test(start_paused = true)]
async fn expiry_submits_once_and_scores_unanswered_as_incorrect() {
    let notifier = MemoryNotifier::new();
    let exam = start(5, &notifier).await;

    let ids: Vec<QuestionId> = exam
        .snapshot()
        .await
        .questions()
        .questions()
        .iter()
        .map(Question::id)
        .collect();
    assert_eq!(ids.len(), 20);
    for id in ids.iter().take(7) {
        exam.select_answer(*id, key("a")).await.unwrap();
    }

    assert_eq!(exam.wait_finished().await, TimerStatus::Expired);
    tokio::time::sleep(Duration::from_secs(30)).await;

    let session = exam.snapshot().await;
    assert_eq!(session.submission(), Some(Submission::Forced));
    let report = session.report().unwrap();
    assert_eq!(report.correct_count(), 7);
    assert_eq!(report.incorrect_count(), 13);
    assert!((report.percentage() - 35.0).abs() < f64::EPSILON);
    assert_eq!(notifier.titles(), vec!["Time's Up"]);
}

#[tokio::test(start_paused = true)]
async fn manual_submit_cancels_the_countdown() {
    let notifier = MemoryNotifier::new();
    let exam = start(60, &notifier).await;

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(exam.status(), TimerStatus::Running { remaining_secs: 58 });

    let report = exam.submit().await.unwrap();
    assert_eq!(report.incorrect_count(), 20);
    assert_eq!(exam.wait_finished().await, TimerStatus::Cancelled);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(exam.status(), TimerStatus::Cancelled);
    assert_eq!(exam.snapshot().await.submission(), Some(Submission::Manual));
    assert_eq!(notifier.titles(), vec!["Exam Submitted"]);
}

#[tokio::test(start_paused = true)]
async fn answers_after_expiry_are_rejected() {
    let notifier = MemoryNotifier::new();
    let exam = start(1, &notifier).await;
    let first = exam.snapshot().await.questions().questions()[0].id();

    exam.wait_finished().await;
    let err = exam.select_answer(first, key("b")).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidState));
    assert!(exam.snapshot().await.answer_for(first).is_none());
}
