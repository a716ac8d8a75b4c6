use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CourseId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must have at least one option")]
    NoOptions,

    #[error("invalid option key: {raw:?}")]
    InvalidOptionKey { raw: String },

    #[error("duplicate option key: {key}")]
    DuplicateOption { key: OptionKey },

    #[error("option {key} has no text")]
    EmptyOptionText { key: OptionKey },

    #[error("correct option {key} is not one of the question's options")]
    CorrectKeyMissing { key: OptionKey },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolError {
    #[error("question {0} appears more than once in the pool")]
    DuplicateQuestion(QuestionId),
}

//
// ─── OPTION KEY ────────────────────────────────────────────────────────────────
//

/// Key of a multiple-choice option ("a", "b", ...). Stored trimmed and lowercase.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OptionKey(String);

impl OptionKey {
    /// Parse and normalize an option key.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidOptionKey` if the key is blank or contains whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, QuestionError> {
        let raw = raw.into();
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(QuestionError::InvalidOptionKey { raw });
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OptionKey {
    type Error = QuestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OptionKey> for String {
    fn from(value: OptionKey) -> Self {
        value.0
    }
}

impl fmt::Debug for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionKey({})", self.0)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it arrives from a question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub course_id: CourseId,
    pub year: u16,
    pub prompt: String,
    pub options: Vec<(String, String)>,
    pub correct: String,
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft and assign its identifier.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, options are missing or
    /// duplicated, or the correct key is not among the options.
    pub fn validate(self, id: QuestionId) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }

        let mut options = BTreeMap::new();
        for (raw_key, text) in self.options {
            let key = OptionKey::new(raw_key)?;
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(QuestionError::EmptyOptionText { key });
            }
            if options.contains_key(&key) {
                return Err(QuestionError::DuplicateOption { key });
            }
            options.insert(key, text);
        }

        let correct = OptionKey::new(self.correct)?;
        if !options.contains_key(&correct) {
            return Err(QuestionError::CorrectKeyMissing { key: correct });
        }

        let explanation = self
            .explanation
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(Question {
            id,
            course_id: self.course_id,
            year: self.year,
            prompt,
            options,
            correct,
            explanation,
        })
    }
}

/// A multiple-choice past-exam question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    course_id: CourseId,
    year: u16,
    prompt: String,
    options: BTreeMap<OptionKey, String>,
    correct: OptionKey,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options ordered by key.
    #[must_use]
    pub fn options(&self) -> &BTreeMap<OptionKey, String> {
        &self.options
    }

    #[must_use]
    pub fn has_option(&self, key: &OptionKey) -> bool {
        self.options.contains_key(key)
    }

    #[must_use]
    pub fn correct_key(&self) -> &OptionKey {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Returns true when `selected` is the correct option. `None` is never correct.
    #[must_use]
    pub fn is_answered_by(&self, selected: Option<&OptionKey>) -> bool {
        selected == Some(&self.correct)
    }
}

//
// ─── POOL ──────────────────────────────────────────────────────────────────────
//

/// Ordered set of questions with unique ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionPool {
    questions: Vec<Question>,
}

impl QuestionPool {
    /// Build a pool, rejecting repeated question ids.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::DuplicateQuestion` for the first repeated id.
    pub fn new(questions: Vec<Question>) -> Result<Self, PoolError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(PoolError::DuplicateQuestion(question.id()));
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.get(id).is_some()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            course_id: CourseId::new(6),
            year: 2022,
            prompt: "Which of these is a noun?".into(),
            options: vec![
                ("a".into(), "run".into()),
                ("b".into(), "table".into()),
                ("c".into(), "quickly".into()),
                ("d".into(), "blue".into()),
            ],
            correct: "b".into(),
            explanation: Some("A table is a thing.".into()),
        }
    }

    #[test]
    fn validates_and_normalizes_keys() {
        let mut d = draft();
        d.options[0].0 = " A ".into();
        d.correct = "B".into();
        let q = d.validate(QuestionId::new(1)).unwrap();
        assert_eq!(q.correct_key().as_str(), "b");
        assert!(q.has_option(&OptionKey::new("a").unwrap()));
        assert_eq!(q.options().len(), 4);
    }

    #[test]
    fn rejects_blank_prompt() {
        let mut d = draft();
        d.prompt = "   ".into();
        assert_eq!(
            d.validate(QuestionId::new(1)).unwrap_err(),
            QuestionError::EmptyPrompt
        );
    }

    #[test]
    fn rejects_correct_key_outside_options() {
        let mut d = draft();
        d.correct = "e".into();
        let err = d.validate(QuestionId::new(1)).unwrap_err();
        assert!(matches!(err, QuestionError::CorrectKeyMissing { .. }));
    }

    #[test]
    fn rejects_duplicate_option_keys() {
        let mut d = draft();
        d.options[1].0 = "a".into();
        d.correct = "a".into();
        let err = d.validate(QuestionId::new(1)).unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateOption { .. }));
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let mut d = draft();
        d.explanation = Some("  ".into());
        let q = d.validate(QuestionId::new(1)).unwrap();
        assert_eq!(q.explanation(), None);
    }

    #[test]
    fn unanswered_is_never_correct() {
        let q = draft().validate(QuestionId::new(1)).unwrap();
        assert!(!q.is_answered_by(None));
        assert!(q.is_answered_by(Some(&OptionKey::new("b").unwrap())));
    }

    #[test]
    fn pool_rejects_duplicate_ids() {
        let q = draft().validate(QuestionId::new(1)).unwrap();
        let err = QuestionPool::new(vec![q.clone(), q]).unwrap_err();
        assert_eq!(err, PoolError::DuplicateQuestion(QuestionId::new(1)));
    }
}
