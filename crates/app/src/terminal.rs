//! Line-oriented exam screen on stdin/stdout.

use exam_core::model::{ExamSession, Learner, OptionKey, Question};
use services::{
    ExamProgress, ExamResultView, QuestionCursor, SessionError, TimedExam, TimerStatus,
    format_countdown,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(OptionKey),
    Next,
    Previous,
    Jump(usize),
    Submit,
    Time,
    Help,
    Unknown(String),
}

impl Input {
    /// Single letters select an option when the question offers that key,
    /// otherwise they are navigation commands.
    fn parse(line: &str, current: Option<&Question>) -> Self {
        let trimmed = line.trim().to_lowercase();
        let offered = OptionKey::new(trimmed.as_str())
            .ok()
            .filter(|key| current.is_some_and(|question| question.has_option(key)));
        if let Some(key) = offered {
            return Input::Answer(key);
        }

        let mut parts = trimmed.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("n"), None) => Input::Next,
            (Some("p"), None) => Input::Previous,
            (Some("s"), None) => Input::Submit,
            (Some("t"), None) => Input::Time,
            (Some("h" | "?"), None) => Input::Help,
            (Some("g"), Some(position)) => position
                .parse()
                .map_or_else(|_| Input::Unknown(trimmed.clone()), Input::Jump),
            (Some(letter), None) if letter.len() == 1 => match OptionKey::new(letter) {
                Ok(key) => Input::Answer(key),
                Err(_) => Input::Unknown(trimmed.clone()),
            },
            _ => Input::Unknown(trimmed.clone()),
        }
    }
}

/// Text shown before a manual submit.
fn submit_prompt(progress: &ExamProgress) -> String {
    let mut prompt = String::from("Are you sure you want to submit your exam?");
    if progress.unanswered > 0 {
        prompt.push_str(&format!(
            "\nYou haven't answered {} of {} questions. Unanswered questions will be marked as incorrect.",
            progress.unanswered, progress.total
        ));
    }
    prompt.push_str("\nSubmit now? (y/n)");
    prompt
}

fn is_confirmation(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_help() {
    println!("Commands: <letter> answer, n next, p previous, g <n> jump, t time left, s submit");
}

fn render(session: &ExamSession, cursor: &QuestionCursor, status: TimerStatus) {
    let Some(question) = cursor.current(session) else {
        return;
    };
    let progress = ExamProgress::of(session);
    let selected = session.answer_for(question.id());

    println!();
    println!(
        "{}   Question {}/{}   Time left {}   Answered {}/{}",
        session.course_name(),
        cursor.position(),
        cursor.len(),
        format_countdown(status.remaining_secs()),
        progress.answered,
        progress.total
    );
    println!("[{}] {}", question.year(), question.prompt());
    for (key, text) in question.options() {
        let marker = if selected == Some(key) { '*' } else { ' ' };
        println!(" {marker}({key}) {text}");
    }
}

fn print_results(view: &ExamResultView) {
    println!();
    println!("{} results", view.course_name);
    if view.forced {
        println!("Time ran out; the exam was submitted automatically.");
    }
    println!("Score: {}%  {}", view.rounded_score, view.message());
    println!(
        "Correct {} ({}%)  Incorrect {} ({}%)  Total {}",
        view.correct, view.correct_share, view.incorrect, view.incorrect_share, view.total
    );
    if let Some(taken) = view.time_taken {
        let secs = u32::try_from(taken.num_seconds().max(0)).unwrap_or(u32::MAX);
        println!("Time taken: {}", format_countdown(secs));
    }

    if view.is_perfect() {
        println!("Perfect score. No missed questions.");
        return;
    }

    println!();
    println!("Review missed questions:");
    for (n, missed) in view.missed.iter().enumerate() {
        println!("{}. {}", n + 1, missed.prompt);
        let yours = missed
            .selected
            .as_ref()
            .map_or_else(|| "not answered".to_string(), |key| key.as_str().to_uppercase());
        println!(
            "   Your answer: {yours}   Correct: {}",
            missed.correct.as_str().to_uppercase()
        );
        if let Some(explanation) = &missed.explanation {
            println!("   Explanation: {explanation}");
        }
    }
    if view.more_missed > 0 {
        println!("...and {} more", view.more_missed);
    }
}

/// Drive one exam until it is submitted, by the learner or by the clock.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run_exam(
    exam: &TimedExam,
    learner: &Learner,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = exam.snapshot().await;
    let mut cursor = QuestionCursor::for_session(&session);
    let mut confirming = false;

    print_help();
    render(&session, &cursor, exam.status());

    loop {
        let line = tokio::select! {
            _ = exam.wait_finished() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            // stdin closed: hand in what we have.
            match exam.submit().await {
                Ok(_) => {}
                Err(SessionError::InvalidState) => {
                    tracing::debug!("input closed after the exam was already submitted");
                }
                Err(err) => tracing::warn!(error = %err, "submit on closed input failed"),
            }
            break;
        };

        if confirming {
            confirming = false;
            if is_confirmation(&line) {
                if exam.submit().await.is_ok() {
                    break;
                }
            } else {
                println!("Continuing exam.");
            }
            session = exam.snapshot().await;
            if session.is_completed() {
                break;
            }
            render(&session, &cursor, exam.status());
            continue;
        }

        match Input::parse(&line, cursor.current(&session)) {
            Input::Answer(key) => {
                if let Some(question) = cursor.current(&session).map(Question::id) {
                    if exam.select_answer(question, key).await.is_ok() {
                        cursor.next();
                    }
                }
            }
            Input::Next => {
                if !cursor.next() {
                    println!("This is the last question.");
                }
            }
            Input::Previous => {
                if !cursor.previous() {
                    println!("This is the first question.");
                }
            }
            Input::Jump(position) => {
                if !cursor.jump(position) {
                    println!("No question {position}.");
                }
            }
            Input::Submit => {
                session = exam.snapshot().await;
                println!("{}", submit_prompt(&ExamProgress::of(&session)));
                confirming = true;
                continue;
            }
            Input::Time => {
                println!("Time left {}", format_countdown(exam.status().remaining_secs()));
                continue;
            }
            Input::Help => {
                print_help();
                continue;
            }
            Input::Unknown(raw) => {
                println!("Unknown command: {raw}");
                print_help();
                continue;
            }
        }

        session = exam.snapshot().await;
        if session.is_completed() {
            break;
        }
        render(&session, &cursor, exam.status());
    }

    let session = exam.snapshot().await;
    match ExamResultView::build(&session, learner) {
        Some(view) => print_results(&view),
        None => println!("The exam was not submitted."),
    }
    Ok(())
}
