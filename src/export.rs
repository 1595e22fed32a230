use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::history::DailyRecovery;
use crate::models::{HeartRateZones, RecoveryBreakdown, RecoveryComponent, StrainResult};
use crate::recovery::RecoveryLevel;
use crate::strain::{get_strain_label, get_strain_percentage};

/// Export any serializable data structure to pretty JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let json_data = serde_json::to_string_pretty(data)
        .with_context(|| "Failed to serialize result to JSON")?;

    fs::write(&output_path, json_data).with_context(|| {
        format!("Failed to write output file: {}", output_path.as_ref().display())
    })?;

    Ok(())
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Min bpm")]
    min: u16,
    #[tabled(rename = "Max bpm")]
    max: u16,
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Factor")]
    factor: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Weight")]
    weight: String,
}

#[derive(Tabled)]
struct StrainRow {
    #[tabled(rename = "Zone")]
    zone: &'static str,
    #[tabled(rename = "Minutes")]
    minutes: u32,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Recovery")]
    score: u8,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Data")]
    completeness: String,
}

/// Zone bounds as a table
pub fn zones_table(zones: &HeartRateZones) -> String {
    let rows = zones.ranges().into_iter().map(|(zone, range)| ZoneRow {
        zone: zone.to_string(),
        min: range.min,
        max: range.max,
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Strain score with its components and zone minutes
pub fn strain_report(result: &StrainResult) -> String {
    let minutes = &result.zone_minutes;
    let rows = [
        StrainRow { zone: "Zone 1", minutes: minutes.zone1 },
        StrainRow { zone: "Zone 2", minutes: minutes.zone2 },
        StrainRow { zone: "Zone 3", minutes: minutes.zone3 },
        StrainRow { zone: "Zone 4", minutes: minutes.zone4 },
        StrainRow { zone: "Zone 5", minutes: minutes.zone5 },
        StrainRow { zone: "Below", minutes: minutes.below },
    ];

    let mut report = String::new();
    report.push_str(&format!(
        "Strain: {:.1} / 21 ({}, {}%)\n",
        result.score,
        get_strain_label(result.score),
        get_strain_percentage(result.score)
    ));
    report.push_str(&format!(
        "Cardiovascular: {:.1}  Mechanical: {:.1}  Raw load: {:.1}\n",
        result.cardiovascular_strain, result.mechanical_strain, result.raw_strain
    ));
    report.push_str(&format!("Active minutes: {}\n", result.total_active_minutes));
    report.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    report
}

/// Per-factor breakdown; factors without data show a dash
pub fn breakdown_table(breakdown: &RecoveryBreakdown) -> String {
    let rows = RecoveryComponent::ALL.iter().map(|component| {
        let entry = breakdown.get(*component);
        let (score, weight) = if entry.available {
            (
                format!("{:.0}", entry.score),
                format!("{:.0}%", entry.weight * 100.0),
            )
        } else {
            ("-".to_string(), "-".to_string())
        };
        ComponentRow {
            factor: component.to_string(),
            score,
            weight,
        }
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

/// One row per scored day
pub fn history_table(days: &[DailyRecovery]) -> String {
    let rows = days.iter().map(|day| HistoryRow {
        date: day.date.format("%Y-%m-%d").to_string(),
        score: day.recovery.score,
        band: RecoveryLevel::from_score(day.recovery.score).to_string(),
        completeness: format!("{}%", day.recovery.data_completeness),
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecoveryInputs;
    use crate::recovery::RecoveryCalculator;
    use crate::zones::ZoneCalculator;
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    #[test]
    fn test_export_json_generic() {
        let zones = ZoneCalculator::calculate_hr_zones(186, 60);
        let temp_file = NamedTempFile::new().unwrap();

        export_json(&zones, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let parsed: HeartRateZones = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, zones);
    }

    #[test]
    fn test_export_json_bad_path() {
        let zones = ZoneCalculator::calculate_hr_zones(186, 60);
        let result = export_json(&zones, "/nonexistent-dir/zones.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_zones_table() {
        let table = zones_table(&ZoneCalculator::calculate_hr_zones(186, 60));

        assert!(table.contains("Zone 1"));
        assert!(table.contains("Zone 5"));
        assert!(table.contains("173"));
        assert!(table.contains("186"));
    }

    #[test]
    fn test_breakdown_table_marks_missing_factors() {
        let inputs = RecoveryInputs {
            sleep_hours: Some(8.0),
            ..RecoveryInputs::default()
        };
        let result = RecoveryCalculator::new().calculate_recovery(&inputs);

        let table = breakdown_table(&result.breakdown);
        assert!(table.contains("sleep"));
        assert!(table.contains("100%"));
        assert!(table.contains('-'));
    }

    #[test]
    fn test_history_table_shows_band_once() {
        let calculator = RecoveryCalculator::new();
        let day = |d, sleep_hours| DailyRecovery {
            date: NaiveDate::from_ymd_opt(2025, 2, d).unwrap(),
            recovery: calculator.calculate_recovery(&RecoveryInputs {
                sleep_hours: Some(sleep_hours),
                ..RecoveryInputs::default()
            }),
        };
        let days = vec![day(18, 8.0), day(19, 2.0)];
        assert_eq!(days[0].recovery.score, 80);

        let table = history_table(&days);
        assert!(table.contains("2025-02-18"));
        assert!(table.contains("Green"));
        assert!(table.contains("Red"));
        assert!(!table.contains("Green (Green)"));
        assert!(!table.contains("("));
    }
}
