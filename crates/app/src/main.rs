use std::fmt;
use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::{ExamSettings, Learner, OptionPolicy, Plan, Semester, UserId};
use services::{
    CatalogService, CourseFilter, ExamContext, ExamService, Notifier, QuestionSampler,
    SessionManager, TracingNotifier,
};
use storage::fixtures::{demo_catalog, load_catalog};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingCourse,
    InvalidNumber { flag: &'static str, raw: String },
    InvalidSemester { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingCourse => write!(f, "exam requires --course <code|id>"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidSemester { raw } => {
                write!(f, "invalid --semester value: {raw} (expected first or second)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(raw: String, flag: &'static str) -> Result<u32, ArgsError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ArgsError::InvalidNumber { flag, raw }),
    }
}

fn env_number(key: &str) -> Option<u32> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- courses [--db <sqlite_url>] [--all] [filters]");
    eprintln!("  cargo run -p app -- exam --course <code|id> [options]");
    eprintln!();
    eprintln!("Course filters:");
    eprintln!("  --level <n>           Course level, e.g. 100");
    eprintln!("  --semester <s>        first | second");
    eprintln!("  --query <text>        Match against course code or title");
    eprintln!();
    eprintln!("Exam options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: in-memory demo catalogue)");
    eprintln!("  --seed <n>            Seed the question sampler for repeatable exams");
    eprintln!("  --minutes <n>         Exam duration (default: 30)");
    eprintln!("  --questions <n>       Questions per exam (default: 20)");
    eprintln!("  --strict              Reject answers that are not one of the options");
    eprintln!("  --premium             Premium plan: no daily limit, explanations shown");
    eprintln!("  --name <text>         Learner name");
    eprintln!();
    eprintln!("Environment (flags take precedence):");
    eprintln!("  CBT_DB_URL, CBT_EXAM_MINUTES, CBT_SAMPLE_SIZE, CBT_SEED, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Courses,
    Exam,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "courses" => Some(Self::Courses),
            "exam" => Some(Self::Exam),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CoursesArgs {
    db_url: Option<String>,
    all: bool,
    level: Option<u16>,
    semester: Option<Semester>,
    query: Option<String>,
}

#[derive(Debug, Clone)]
struct ExamArgs {
    db_url: Option<String>,
    course: String,
    seed: Option<u64>,
    minutes: u32,
    questions: u32,
    strict: bool,
    premium: bool,
    name: String,
}

fn default_db_url() -> Option<String> {
    std::env::var("CBT_DB_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(normalize_sqlite_url)
}

fn parse_db(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let value = require_value(args, "--db")?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: value });
    }
    Ok(normalize_sqlite_url(value))
}

impl CoursesArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: default_db_url(),
            all: false,
            level: None,
            semester: None,
            query: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => parsed.db_url = Some(parse_db(args)?),
                "--all" => parsed.all = true,
                "--level" => {
                    let value = require_value(args, "--level")?;
                    let level = value.trim().parse::<u16>().map_err(|_| {
                        ArgsError::InvalidNumber {
                            flag: "--level",
                            raw: value.clone(),
                        }
                    })?;
                    parsed.level = Some(level);
                }
                "--semester" => {
                    let value = require_value(args, "--semester")?;
                    let semester = Semester::parse(&value)
                        .map_err(|_| ArgsError::InvalidSemester { raw: value.clone() })?;
                    parsed.semester = Some(semester);
                }
                "--query" => parsed.query = Some(require_value(args, "--query")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    /// General-studies courses unless `--all` is set, narrowed by the other flags.
    fn filter(&self) -> CourseFilter {
        let base = if self.all {
            CourseFilter::default()
        } else {
            CourseFilter::general_studies()
        };
        CourseFilter {
            level: self.level,
            semester: self.semester,
            query: self.query.clone(),
            ..base
        }
    }
}

impl ExamArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut course = None;
        let mut db_url = default_db_url();
        let mut seed = std::env::var("CBT_SEED")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok());
        let mut minutes = env_number("CBT_EXAM_MINUTES").unwrap_or(30);
        let mut questions =
            env_number("CBT_SAMPLE_SIZE").unwrap_or(ExamSettings::DEFAULT_SAMPLE_SIZE);
        let mut strict = false;
        let mut premium = false;
        let mut name = "Guest".to_string();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--course" => course = Some(require_value(args, "--course")?),
                "--db" => db_url = Some(parse_db(args)?),
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed = value.trim().parse::<u64>().map_err(|_| {
                        ArgsError::InvalidNumber {
                            flag: "--seed",
                            raw: value.clone(),
                        }
                    })?;
                    seed = Some(parsed);
                }
                "--minutes" => {
                    minutes = parse_number(require_value(args, "--minutes")?, "--minutes")?;
                }
                "--questions" => {
                    questions = parse_number(require_value(args, "--questions")?, "--questions")?;
                }
                "--strict" => strict = true,
                "--premium" => premium = true,
                "--name" => name = require_value(args, "--name")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            course: course.ok_or(ArgsError::MissingCourse)?,
            seed,
            minutes,
            questions,
            strict,
            premium,
            name,
        })
    }

    fn settings(&self) -> Result<ExamSettings, exam_core::Error> {
        let policy = if self.strict {
            OptionPolicy::Strict
        } else {
            OptionPolicy::Permissive
        };
        Ok(ExamSettings::new(
            self.minutes.saturating_mul(60),
            self.questions,
            ExamSettings::DEFAULT_FREE_DAILY_LIMIT,
            policy,
        )?)
    }

    fn learner(&self) -> Learner {
        let plan = if self.premium { Plan::Premium } else { Plan::Free };
        Learner::new(UserId::new(1), self.name.clone(), plan)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// SQLite when a URL is configured, otherwise an in-memory copy of the demo catalogue.
/// An empty database gets the demo catalogue too.
async fn open_storage(db_url: Option<&str>) -> Result<Storage, Box<dyn std::error::Error>> {
    let storage = match db_url {
        Some(url) => {
            prepare_sqlite_file(url)?;
            Storage::sqlite(url).await?
        }
        None => Storage::in_memory(),
    };

    if storage.courses.list_courses().await?.is_empty() {
        tracing::info!("no courses found; loading the demo catalogue");
        load_catalog(&storage, &demo_catalog()?).await?;
    }
    Ok(storage)
}

async fn list_courses(args: CoursesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(args.db_url.as_deref()).await?;
    let catalog = CatalogService::from_storage(&storage);
    let filter = args.filter();

    let items = catalog.list_with_counts(&filter).await?;
    if items.is_empty() {
        println!("No courses available.");
        return Ok(());
    }
    for item in items {
        let course = &item.course;
        println!(
            "{:>3}  {:<8} {:<40} {}L  {:<6} {:>3} questions",
            course.id().value(),
            course.code(),
            course.title(),
            course.level(),
            course.semester().as_str(),
            item.question_count
        );
    }
    Ok(())
}

async fn take_exam(args: ExamArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(args.db_url.as_deref()).await?;
    let catalog = CatalogService::from_storage(&storage);
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    let Some(course) = catalog.find_course(&args.course).await? else {
        eprintln!("Course Required: no course matches {:?}", args.course);
        eprintln!("Run `app courses --all` to see what is available.");
        return Ok(());
    };

    let learner = args.learner();
    let context = ExamContext::new(learner.clone(), Clock::default_clock(), args.settings()?);
    let sampler = args
        .seed
        .map_or_else(QuestionSampler::from_entropy, QuestionSampler::seeded);
    let manager = Arc::new(SessionManager::new(context, sampler));
    let service = ExamService::from_storage(manager, &storage, notifier);

    if let Some(left) = service.remaining_attempts().await? {
        println!("Free plan: {left} exam(s) left today.");
    }

    let exam = match service.start_timed(course.id()).await {
        Ok(exam) => exam,
        Err(err) => {
            eprintln!("{err}");
            return Ok(());
        }
    };

    terminal::run_exam(&exam, &learner).await
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };

    match cmd {
        Command::Courses => list_courses(CoursesArgs::parse(&mut argv).map_err(report)?).await,
        Command::Exam => take_exam(ExamArgs::parse(&mut argv).map_err(report)?).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_courses(args: &[&str]) -> Result<CoursesArgs, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        CoursesArgs::parse(&mut iter)
    }

    #[test]
    fn course_flags_feed_the_filter() {
        let args = parse_courses(&[
            "--all",
            "--level",
            "100",
            "--semester",
            "second",
            "--query",
            "logic",
        ])
        .unwrap();
        let filter = args.filter();

        assert_eq!(filter.code_prefix, None);
        assert_eq!(filter.level, Some(100));
        assert_eq!(filter.semester, Some(Semester::Second));
        assert_eq!(filter.query.as_deref(), Some("logic"));
    }

    #[test]
    fn courses_default_to_general_studies() {
        let filter = parse_courses(&["--level", "200"]).unwrap().filter();
        assert_eq!(filter.code_prefix, CourseFilter::general_studies().code_prefix);
        assert_eq!(filter.level, Some(200));
    }

    #[test]
    fn bad_course_flags_are_rejected() {
        assert!(matches!(
            parse_courses(&["--semester", "third"]),
            Err(ArgsError::InvalidSemester { .. })
        ));
        assert!(matches!(
            parse_courses(&["--level", "abc"]),
            Err(ArgsError::InvalidNumber { flag: "--level", .. })
        ));
        assert!(matches!(
            parse_courses(&["--query"]),
            Err(ArgsError::MissingValue { flag: "--query" })
        ));
    }
}
