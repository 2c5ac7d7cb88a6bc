//! Error types for the vendor-compliance library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the ingestion and search pipeline.

use std::fmt;

use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading and splitting an uploaded sheet
    Read,
    /// Classifying rows and tracking vendor context
    Classify,
    /// Collating certificates into vendor records
    Collate,
    /// Writing results to the store
    Persist,
    /// Querying and merging stored records
    Search,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Classify => "classify",
            Self::Collate => "collate",
            Self::Persist => "persist",
            Self::Search => "search",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in the vendor-compliance application.
#[derive(Error, Debug)]
pub enum VendorError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Malformed CSV input
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sheet layout could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// Caller supplied an unusable value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Any other error, tagged with the stage that produced it
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Stage that failed
        stage: Stage,
        /// Underlying cause
        #[source]
        source: Box<VendorError>,
    },
}

impl VendorError {
    /// Wrap this error with the pipeline stage it occurred in.
    ///
    /// Errors that already carry a stage are returned unchanged so the
    /// innermost stage wins.
    #[must_use]
    pub fn at(self, stage: Stage) -> Self {
        match self {
            Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The pipeline stage this error was tagged with, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Convenience type alias for Result with `VendorError`
pub type Result<T> = std::result::Result<T, VendorError>;

/// Extension for tagging a `Result` with the stage it belongs to.
pub trait StageContext<T> {
    /// Tag the error side of this result with `stage`.
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T, E> StageContext<T> for std::result::Result<T, E>
where
    E: Into<VendorError>,
{
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| e.into().at(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wraps_once() {
        let err = VendorError::Parse("bad header".to_string())
            .at(Stage::Read)
            .at(Stage::Persist);
        assert_eq!(err.stage(), Some(Stage::Read));
        assert_eq!(err.to_string(), "read stage failed: Parse error: bad header");
    }

    #[test]
    fn test_stage_context_on_result() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let err = result.stage(Stage::Read).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Read));
    }
}
