use std::time::Duration;

use crate::error::SettingsError;

const FEEDBACK_DELAY_VAR: &str = "FEEDBACK_DELAY_MS";
const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct Settings {
    /// How long the right/wrong feedback stays before the next question.
    pub feedback_delay: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let feedback_delay = match lookup(FEEDBACK_DELAY_VAR) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| SettingsError::InvalidDuration {
                    name: FEEDBACK_DELAY_VAR,
                    value,
                })?,
            None => DEFAULT_FEEDBACK_DELAY,
        };
        Ok(Self { feedback_delay })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.feedback_delay, Duration::from_secs(1));
    }

    #[test]
    fn reads_delay() {
        let settings = Settings::from_lookup(|_| Some(" 250 ".to_string())).unwrap();
        assert_eq!(settings.feedback_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_garbage() {
        let err = Settings::from_lookup(|_| Some("soon".to_string())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "FEEDBACK_DELAY_MS must be a number of milliseconds, got \"soon\""
        );
    }
}
