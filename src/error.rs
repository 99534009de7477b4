use thiserror::Error;

use crate::workout::WorkoutId;

/// Errors raised while building, editing or storing workouts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkoutError {
    /// A numeric input (or coordinate) fell outside its accepted range
    #[error("{field} must be {requirement}, got {value}")]
    Validation {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
    #[error("no workout with id {0}")]
    NotFound(WorkoutId),
    #[error("a workout with id {0} already exists")]
    DuplicateId(WorkoutId),
    /// Submit arrived while the form was hidden
    #[error("the workout form is not open")]
    FormClosed,
}

impl WorkoutError {
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkoutError::Validation { .. })
    }
}

/// Failures of the underlying blob store. Never surfaced to the user.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("blob store sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("blob store encoding: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocateError {
    #[error("Could not get your location")]
    Unavailable,
}
