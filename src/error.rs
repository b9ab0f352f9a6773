//! Centralized error handling for parkstats.
//!
//! Every stage of the pipeline reports failures through [`ParkStatsError`].
//! The variants mirror the places an analysis run can go wrong:
//!
//! - [`ParkStatsError::Load`]: a source table is missing, unreadable or empty
//! - [`ParkStatsError::Schema`]: an expected column (such as the join key) is absent
//! - [`ParkStatsError::InsufficientData`]: a routine has too few observations
//! - [`ParkStatsError::DegenerateInput`]: a grouping factor has fewer than two levels
//! - [`ParkStatsError::Numeric`]: a computation produced non-finite values
//!
//! ```
//! use parkstats::error::ParkStatsError;
//!
//! fn describe(err: &ParkStatsError) -> &'static str {
//!     match err {
//!         ParkStatsError::DegenerateInput(_) => "need at least two groups",
//!         ParkStatsError::InsufficientData(_) => "need more rows",
//!         _ => "other failure",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`ParkStatsError`], keeping the original error kind while prefixing the
//! message:
//!
//! ```no_run
//! use parkstats::error::ResultExt as _;
//!
//! fn read_config() -> parkstats::error::Result<String> {
//!     std::fs::read_to_string("analysis.json").context("Failed to read config")
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for parkstats operations.
#[derive(Debug)]
pub enum ParkStatsError {
    /// I/O errors outside of table loading
    Io(std::io::Error),

    /// A source table is missing, unreadable, of unknown format or has zero rows
    Load(String),

    /// An expected column is absent from a table
    Schema(String),

    /// A routine's numeric input has too few observations
    InsufficientData(String),

    /// A required categorical factor has fewer than two levels
    DegenerateInput(String),

    /// A computation yielded non-finite values or a singular system
    Numeric(String),

    /// Polars failures while transforming a table
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

/// Serializable discriminant of [`ParkStatsError`], used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Io,
    Load,
    Schema,
    InsufficientData,
    DegenerateInput,
    Numeric,
    DataProcessing,
    Config,
    Other,
}

impl ParkStatsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Load(_) => ErrorKind::Load,
            Self::Schema(_) => ErrorKind::Schema,
            Self::InsufficientData(_) => ErrorKind::InsufficientData,
            Self::DegenerateInput(_) => ErrorKind::DegenerateInput,
            Self::Numeric(_) => ErrorKind::Numeric,
            Self::DataProcessing(_) => ErrorKind::DataProcessing,
            Self::Config(_) => ErrorKind::Config,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    fn with_prefix(self, prefix: &str) -> Self {
        match self {
            Self::Io(e) => Self::Other(format!("{prefix}: {e}")),
            Self::Load(msg) => Self::Load(format!("{prefix}: {msg}")),
            Self::Schema(msg) => Self::Schema(format!("{prefix}: {msg}")),
            Self::InsufficientData(msg) => Self::InsufficientData(format!("{prefix}: {msg}")),
            Self::DegenerateInput(msg) => Self::DegenerateInput(format!("{prefix}: {msg}")),
            Self::Numeric(msg) => Self::Numeric(format!("{prefix}: {msg}")),
            Self::DataProcessing(msg) => Self::DataProcessing(format!("{prefix}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{prefix}: {msg}")),
            Self::Other(msg) => Self::Other(format!("{prefix}: {msg}")),
        }
    }
}

impl fmt::Display for ParkStatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Load(msg) => write!(f, "Load error: {msg}"),
            Self::Schema(msg) => write!(f, "Schema error: {msg}"),
            Self::InsufficientData(msg) => write!(f, "Insufficient data: {msg}"),
            Self::DegenerateInput(msg) => write!(f, "Degenerate input: {msg}"),
            Self::Numeric(msg) => write!(f, "Numeric error: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ParkStatsError {}

impl From<std::io::Error> for ParkStatsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ParkStatsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for ParkStatsError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Result type alias for parkstats operations.
pub type Result<T> = std::result::Result<T, ParkStatsError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    /// Add context to an error, keeping its kind.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ParkStatsError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_prefix(&msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_prefix(&f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParkStatsError::Schema("column 'Park Name' not found".to_owned());
        assert_eq!(err.to_string(), "Schema error: column 'Park Name' not found");
    }

    #[test]
    fn test_error_kind() {
        let err = ParkStatsError::DegenerateInput("Category has 1 level".to_owned());
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
        assert_eq!(
            serde_json::to_string(&err.kind()).unwrap_or_default(),
            "\"degenerate_input\""
        );
    }

    #[test]
    fn test_result_context_keeps_kind() {
        let result: Result<()> = Err(ParkStatsError::Load("parks.csv has zero rows".to_owned()));
        let result = result.context("Failed to load parks");

        let err = result.expect_err("context must keep the error");
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(err.to_string().contains("Failed to load parks"));
    }

    #[test]
    fn test_io_context_becomes_other() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.json",
        ));

        let result: Result<()> = result.context("Failed to read file");
        assert!(
            result
                .expect_err("io error")
                .to_string()
                .contains("Failed to read file")
        );
    }
}
