use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the starroute library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Routing failures themselves (no path, no feasible tour) are reported as
/// result data on [`crate::PathResult`] and [`crate::TourOutcome`]; this type
/// covers loading, option validation and task plumbing.
#[derive(Debug, Error)]
pub enum Error {
    /// Dataset could not be located at the resolved path.
    #[error("dataset not found at {path}")]
    DatasetNotFound { path: PathBuf },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for the dataset")]
    ProjectDirsUnavailable,

    /// Raised when a dataset file is not a JSON array of location records.
    #[error("unsupported dataset format in {path}: {message}")]
    UnsupportedFormat { path: PathBuf, message: String },

    /// Raised when a location record fails validation.
    #[error("invalid location record '{name}': {message}")]
    InvalidLocation { name: String, message: String },

    /// Raised when a location name could not be found in the catalog.
    #[error("unknown location name: {name}{}", format_suggestions(.suggestions))]
    UnknownLocation {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a planner option is outside its valid range.
    #[error("invalid planner option {option}: {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },

    /// Raised when the background tour task panicked or was cancelled.
    #[error("tour planning task failed: {message}")]
    TaskFailed { message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskFailed {
            message: err.to_string(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
