// Library interface for PulseTrack modules
// This allows integration tests and benchmarks to access the engines

pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod history;
pub mod import;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod recovery;
pub mod strain;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::AppConfig;
pub use error::{ErrorSeverity, ImportError, IngestError, PulseError};
pub use history::HistoryAnalyzer;
pub use ingest::{IngestPayload, IngestRecord};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use recovery::{
    calculate_baseline, get_recovery_label, get_recovery_recommendation, RecoveryCalculator,
    RecoveryConfig,
};
pub use strain::{
    get_strain_label, get_strain_percentage, StrainCalculator, StrainConfig, StrainProfile,
};
pub use zones::ZoneCalculator;
