mod course;
mod ids;
mod learner;
mod question;
mod session;
mod settings;

pub use ids::{CourseId, ParseIdError, QuestionId, SessionId, UserId};

pub use course::{Course, CourseError, GENERAL_STUDIES_PREFIX, Semester};
pub use learner::{Learner, Plan};
pub use question::{OptionKey, PoolError, Question, QuestionDraft, QuestionError, QuestionPool};
pub use session::{ExamSession, SessionPhase, SessionStateError, Submission};
pub use settings::{ExamSettings, OptionPolicy, SettingsError};
