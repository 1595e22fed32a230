use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ImportError, PulseError};
use crate::models::{DailySummary, HeartRateSample, RecoveryInputs, WorkoutSet};

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Detect format from the file extension
    pub fn detect(path: &Path) -> Result<Self, ImportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            _ => Err(ImportError::UnsupportedFormat { format: extension }),
        }
    }
}

/// CSV reader with flexible column naming
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(
            &mut column_mapping,
            "timestamp",
            &["timestamp", "time", "datetime", "date_time", "recorded_at"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "bpm",
            &["bpm", "heart_rate", "hr", "heartrate"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "exercise",
            &["exercise", "movement", "name"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "sets_count",
            &["sets_count", "sets", "set_count"],
        );
        Self::add_mapping(&mut column_mapping, "reps", &["reps", "repetitions"]);
        Self::add_mapping(
            &mut column_mapping,
            "weight_lbs",
            &["weight_lbs", "weight", "lbs", "load"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    /// Map standard column names to their index in this file's header
    fn resolve_columns(&self, headers: &StringRecord) -> HashMap<String, usize> {
        headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                self.column_mapping
                    .get(&header.trim().to_lowercase())
                    .map(|standard| (standard.clone(), index))
            })
            .collect()
    }

    /// Read heart rate samples from a CSV with timestamp and bpm columns
    pub fn import_samples(&self, path: &Path) -> Result<Vec<HeartRateSample>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let columns = self.resolve_columns(reader.headers()?);
        let timestamp_col = require_column(&columns, "timestamp", path)?;
        let bpm_col = require_column(&columns, "bpm", path)?;

        let mut samples = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let row = row + 2; // 1-based, after header

            let timestamp = parse_timestamp(record.get(timestamp_col).unwrap_or_default())
                .ok_or_else(|| parse_error(path, row, "invalid timestamp"))?;
            let bpm = record
                .get(bpm_col)
                .and_then(|v| v.trim().parse::<u16>().ok())
                .ok_or_else(|| parse_error(path, row, "invalid bpm"))?;

            samples.push(HeartRateSample::new(timestamp, bpm));
        }

        debug!(count = samples.len(), file = %path.display(), "Imported heart rate samples");
        Ok(samples)
    }

    /// Read resistance sets from a CSV; empty reps/weight cells are absent
    pub fn import_sets(&self, path: &Path) -> Result<Vec<WorkoutSet>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let columns = self.resolve_columns(reader.headers()?);
        let sets_col = require_column(&columns, "sets_count", path)?;
        let exercise_col = columns.get("exercise").copied();
        let reps_col = columns.get("reps").copied();
        let weight_col = columns.get("weight_lbs").copied();

        let cell = |record: &StringRecord, col: Option<usize>| -> Option<String> {
            col.and_then(|c| record.get(c))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut sets = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let row = row + 2;

            let sets_count = cell(&record, Some(sets_col))
                .and_then(|v| v.parse::<u32>().ok())
                .ok_or_else(|| parse_error(path, row, "invalid sets count"))?;
            let reps = cell(&record, reps_col)
                .map(|v| v.parse::<u32>())
                .transpose()
                .map_err(|_| parse_error(path, row, "invalid reps"))?;
            let weight_lbs = cell(&record, weight_col)
                .map(|v| v.parse::<f64>())
                .transpose()
                .ok()
                .filter(|weight| weight.map_or(true, f64::is_finite))
                .ok_or_else(|| parse_error(path, row, "invalid weight"))?;

            sets.push(WorkoutSet {
                exercise: cell(&record, exercise_col),
                sets_count,
                reps,
                weight_lbs,
            });
        }

        debug!(count = sets.len(), file = %path.display(), "Imported workout sets");
        Ok(sets)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Load heart rate samples from a CSV or JSON file
pub fn load_samples(path: &Path) -> Result<Vec<HeartRateSample>> {
    let samples = match InputFormat::detect(path).map_err(PulseError::from)? {
        InputFormat::Csv => CsvImporter::new().import_samples(path)?,
        InputFormat::Json => load_json(path)?,
    };
    info!(count = samples.len(), "Loaded heart rate samples");
    Ok(samples)
}

/// Load workout sets from a CSV or JSON file
pub fn load_sets(path: &Path) -> Result<Vec<WorkoutSet>> {
    match InputFormat::detect(path).map_err(PulseError::from)? {
        InputFormat::Csv => CsvImporter::new().import_sets(path),
        InputFormat::Json => load_json(path),
    }
}

/// Load recovery inputs from a JSON file
pub fn load_recovery_inputs(path: &Path) -> Result<RecoveryInputs> {
    load_json(path)
}

/// Load daily summaries from a JSON array or a CSV with one row per day
pub fn load_summaries(path: &Path) -> Result<Vec<DailySummary>> {
    match InputFormat::detect(path).map_err(PulseError::from)? {
        InputFormat::Json => {
            let summaries: Vec<DailySummary> = load_json(path)?;
            for (index, summary) in summaries.iter().enumerate() {
                check_finite(summary, path, index + 1)?;
            }
            Ok(summaries)
        }
        InputFormat::Csv => {
            let mut reader = ReaderBuilder::new()
                .has_headers(true)
                .from_path(path)
                .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

            let mut summaries = Vec::new();
            for (row, record) in reader.deserialize::<DailySummary>().enumerate() {
                let summary = record.with_context(|| {
                    format!("Failed to parse daily summaries: {}", path.display())
                })?;
                check_finite(&summary, path, row + 2)?;
                summaries.push(summary);
            }
            Ok(summaries)
        }
    }
}

/// Reject NaN and infinite readings; `row` is reported as-is
fn check_finite(summary: &DailySummary, path: &Path, row: usize) -> Result<(), PulseError> {
    let fields = [
        ("strain_score", summary.strain_score),
        ("hrv_ms", summary.hrv_ms),
        ("rhr_bpm", summary.rhr_bpm),
        ("sleep_hours", summary.sleep_hours),
        ("sleep_quality", summary.sleep_quality),
        ("subjective_energy", summary.subjective_energy),
        ("subjective_soreness", summary.subjective_soreness),
        ("subjective_stress", summary.subjective_stress),
    ];

    match fields
        .iter()
        .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
    {
        Some((field, _)) => {
            let reason = format!("{} is not a finite number", field);
            Err(parse_error(path, row, &reason))
        }
        None => Ok(()),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS` taken as UTC
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn require_column(
    columns: &HashMap<String, usize>,
    column: &str,
    path: &Path,
) -> Result<usize, PulseError> {
    columns.get(column).copied().ok_or_else(|| {
        PulseError::Import(ImportError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        })
    })
}

fn parse_error(path: &Path, row: usize, reason: &str) -> PulseError {
    PulseError::Import(ImportError::ParseError {
        path: path.to_path_buf(),
        row,
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(InputFormat::detect(Path::new("hr.CSV")).unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::detect(Path::new("hr.json")).unwrap(), InputFormat::Json);
        assert!(InputFormat::detect(Path::new("hr.fit")).is_err());
    }

    #[test]
    fn test_import_samples_csv_with_aliases() {
        let file = write_temp(
            ".csv",
            "Time,Heart_Rate\n2025-02-19T06:00:00Z,120\n2025-02-19 06:01:00,125\n",
        );

        let samples = load_samples(file.path()).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].bpm, 125);
        assert_eq!(
            (samples[1].timestamp - samples[0].timestamp).num_seconds(),
            60
        );
    }

    #[test]
    fn test_import_samples_missing_column() {
        let file = write_temp(".csv", "time,power\n2025-02-19T06:00:00Z,200\n");

        let err = load_samples(file.path()).unwrap_err();
        let pulse_err = err.downcast_ref::<PulseError>().unwrap();
        assert!(matches!(
            pulse_err,
            PulseError::Import(ImportError::MissingColumn { column, .. }) if column == "bpm"
        ));
        assert!(pulse_err
            .user_message()
            .starts_with("Could not find a `bpm` column"));
    }

    #[test]
    fn test_import_samples_bad_row() {
        let file = write_temp(".csv", "timestamp,bpm\n2025-02-19T06:00:00Z,fast\n");

        let err = load_samples(file.path()).unwrap_err();
        let pulse_err = err.downcast_ref::<PulseError>().unwrap();
        assert!(matches!(
            pulse_err,
            PulseError::Import(ImportError::ParseError { row: 2, .. })
        ));
    }

    #[test]
    fn test_import_sets_csv() {
        let file = write_temp(
            ".csv",
            "exercise,sets,reps,weight\nBench Press,3,10,135\nPlank,3,,\n",
        );

        let sets = load_sets(file.path()).unwrap();

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].volume(), 4050.0);
        assert_eq!(sets[1].reps, None);
        assert_eq!(sets[1].weight_lbs, None);
        assert_eq!(sets[1].exercise.as_deref(), Some("Plank"));
    }

    #[test]
    fn test_import_json_inputs() {
        let file = write_temp(
            ".json",
            r#"[{"timestamp":"2025-02-19T06:00:00Z","bpm":58}]"#,
        );
        let samples = load_samples(file.path()).unwrap();
        assert_eq!(samples[0].bpm, 58);

        let file = write_temp(".json", r#"{"sleepHours": 7.5, "hrvBaseline": [60, 62]}"#);
        let inputs = load_recovery_inputs(file.path()).unwrap();
        assert_eq!(inputs.sleep_hours, Some(7.5));
        assert_eq!(inputs.hrv_baseline.len(), 2);
    }

    #[test]
    fn test_import_summaries_csv() {
        let file = write_temp(
            ".csv",
            "date,strain_score,hrv_ms,rhr_bpm,sleep_hours\n2025-02-18,12.4,61,54,7.5\n2025-02-19,,64,53,\n",
        );

        let summaries = load_summaries(file.path()).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].strain_score, Some(12.4));
        assert_eq!(summaries[1].strain_score, None);
        assert_eq!(summaries[1].sleep_hours, None);
    }

    #[test]
    fn test_unsupported_format_message() {
        let file = write_temp(".fit", "");

        let err = load_samples(file.path()).unwrap_err();
        let pulse_err = err.downcast_ref::<PulseError>().unwrap();
        assert!(pulse_err.user_message().contains("use .csv or .json"));
    }

    #[test]
    fn test_import_summaries_rejects_nan() {
        let file = write_temp(
            ".csv",
            "date,hrv_ms,rhr_bpm,sleep_hours\n2025-02-17,60,55,7\n2025-02-18,NaN,56,\n",
        );

        let err = load_summaries(file.path()).unwrap_err();
        let pulse_err = err.downcast_ref::<PulseError>().unwrap();
        assert!(matches!(
            pulse_err,
            PulseError::Import(ImportError::ParseError { row: 3, reason, .. })
                if reason.contains("hrv_ms")
        ));
    }

    #[test]
    fn test_import_sets_rejects_infinite_weight() {
        let file = write_temp(".csv", "sets,reps,weight\n3,10,inf\n");

        let err = load_sets(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PulseError>(),
            Some(PulseError::Import(ImportError::ParseError { row: 2, .. }))
        ));
    }
}
