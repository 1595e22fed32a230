//! Unified error hierarchy for PulseTrack
//!
//! The scoring engines are total and never fail; everything here belongs to
//! the layers around them: payload ingestion, file import, configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all PulseTrack operations
#[derive(Debug, Error)]
pub enum PulseError {
    /// Ingestion payload rejected
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Input file could not be read
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Daily biometric payload errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Date missing, malformed, or not a real calendar day
    #[error("`date` is required (YYYY-MM-DD), got {value:?}")]
    InvalidDate { value: String },

    /// A reading outside its plausible range
    #[error("{field} out of range: {value} (expected {expected})")]
    OutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// Body was not valid JSON for the payload shape
    #[error("Invalid JSON: {reason}")]
    InvalidJson { reason: String },
}

/// Input file errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// Unsupported file extension
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Required column not found in a CSV header
    #[error("Missing column `{column}` in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// Row-level parse failure
    #[error("Parse error in {path} at row {row}: {reason}")]
    ParseError {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

impl PulseError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PulseError::Ingest(IngestError::OutOfRange { .. }) => ErrorSeverity::Warning,
            PulseError::Ingest(_) => ErrorSeverity::Error,
            PulseError::Import(ImportError::ParseError { .. }) => ErrorSeverity::Warning,
            PulseError::Import(_) => ErrorSeverity::Error,
            PulseError::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PulseError::Ingest(IngestError::InvalidDate { .. }) => {
                "Every upload needs a `date` field in YYYY-MM-DD format.".to_string()
            }
            PulseError::Import(ImportError::MissingColumn { column, path }) => {
                format!(
                    "Could not find a `{}` column in {}. Check the CSV header.",
                    column,
                    path.display()
                )
            }
            PulseError::Import(ImportError::UnsupportedFormat { format }) => {
                format!("Files of type `{}` are not supported; use .csv or .json.", format)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Cannot continue
    Critical,
    /// Operation failed
    Error,
    /// Input was rejected, the user can correct it
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = PulseError::Ingest(IngestError::OutOfRange {
            field: "bpm".to_string(),
            value: "400".to_string(),
            expected: "20-250".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = PulseError::Configuration("bad".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_messages() {
        let err = PulseError::Ingest(IngestError::InvalidDate {
            value: "19-02-2025".to_string(),
        });
        assert!(err.user_message().contains("YYYY-MM-DD"));

        let err = PulseError::Import(ImportError::MissingColumn {
            column: "bpm".to_string(),
            path: PathBuf::from("samples.csv"),
        });
        assert!(err.user_message().contains("samples.csv"));
    }

    #[test]
    fn test_error_display() {
        let err = IngestError::InvalidDate {
            value: "tomorrow".to_string(),
        };
        assert_eq!(err.to_string(), "`date` is required (YYYY-MM-DD), got \"tomorrow\"");
    }
}
