use thiserror::Error;

use crate::quiz::Difficulty;

/// Reasons a quiz configuration can't be used to start a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("difficulty {0} needs a table number")]
    MissingTable(Difficulty),

    #[error("table {0} is outside of {min}..={max}", min = crate::quiz::MIN_FACTOR, max = crate::quiz::MAX_FACTOR)]
    TableOutOfRange(u32),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{name} must be a number of milliseconds, got {value:?}")]
    InvalidDuration { name: &'static str, value: String },
}
