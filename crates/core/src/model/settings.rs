use thiserror::Error;

/// How strictly selected option keys are checked against a question's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionPolicy {
    /// Any key is recorded; unknown keys simply score as incorrect.
    #[default]
    Permissive,
    /// Keys that are not options of the question are rejected.
    Strict,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("exam duration must be at least one second")]
    ZeroDuration,

    #[error("sample size must be at least one question")]
    ZeroSampleSize,
}

/// Tunables for a timed practice exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSettings {
    duration_secs: u32,
    sample_size: u32,
    free_daily_limit: u32,
    option_policy: OptionPolicy,
}

impl ExamSettings {
    pub const DEFAULT_DURATION_SECS: u32 = 30 * 60;
    pub const DEFAULT_SAMPLE_SIZE: u32 = 20;
    pub const DEFAULT_FREE_DAILY_LIMIT: u32 = 3;

    /// # Errors
    ///
    /// Returns `SettingsError` if the duration or sample size is zero.
    pub fn new(
        duration_secs: u32,
        sample_size: u32,
        free_daily_limit: u32,
        option_policy: OptionPolicy,
    ) -> Result<Self, SettingsError> {
        if duration_secs == 0 {
            return Err(SettingsError::ZeroDuration);
        }
        if sample_size == 0 {
            return Err(SettingsError::ZeroSampleSize);
        }
        Ok(Self {
            duration_secs,
            sample_size,
            free_daily_limit,
            option_policy,
        })
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    #[must_use]
    pub fn free_daily_limit(&self) -> u32 {
        self.free_daily_limit
    }

    #[must_use]
    pub fn option_policy(&self) -> OptionPolicy {
        self.option_policy
    }

    #[must_use]
    pub fn with_option_policy(mut self, policy: OptionPolicy) -> Self {
        self.option_policy = policy;
        self
    }
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            duration_secs: Self::DEFAULT_DURATION_SECS,
            sample_size: Self::DEFAULT_SAMPLE_SIZE,
            free_daily_limit: Self::DEFAULT_FREE_DAILY_LIMIT,
            option_policy: OptionPolicy::Permissive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_thirty_minute_twenty_question_exam() {
        let settings = ExamSettings::default();
        assert_eq!(settings.duration_secs(), 1800);
        assert_eq!(settings.sample_size(), 20);
        assert_eq!(settings.free_daily_limit(), 3);
        assert_eq!(settings.option_policy(), OptionPolicy::Permissive);
    }

    #[test]
    fn rejects_zero_values() {
        assert_eq!(
            ExamSettings::new(0, 20, 3, OptionPolicy::Permissive).unwrap_err(),
            SettingsError::ZeroDuration
        );
        assert_eq!(
            ExamSettings::new(60, 0, 3, OptionPolicy::Permissive).unwrap_err(),
            SettingsError::ZeroSampleSize
        );
    }
}
