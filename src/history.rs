//! Building recovery inputs from a run of daily summaries
//!
//! The recovery engine takes baselines as plain value lists. Given the daily
//! summaries the data layer already holds, this module slices out the
//! preceding window for HRV and resting HR, picks up yesterday's strain, and
//! scores whole date ranges at once. Days are independent, so batch scoring
//! runs them in parallel.

use crate::constants::recovery::{DEFAULT_BASELINE_DAYS, DEFAULT_SLEEP_TARGET_HOURS};
use crate::models::{DailySummary, RecoveryInputs, RecoveryResult};
use crate::recovery::{RecoveryCalculator, RecoveryConfig};
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Daily summaries keyed by date
pub type SummaryIndex = BTreeMap<NaiveDate, DailySummary>;

/// HRV and resting HR values from the days before a target date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    /// Oldest first
    pub hrv: Vec<f64>,
    /// Oldest first
    pub rhr: Vec<f64>,
}

/// Recovery scored for one day of history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecovery {
    pub date: NaiveDate,
    pub recovery: RecoveryResult,
}

/// Scores recovery across stored history
#[derive(Debug, Clone)]
pub struct HistoryAnalyzer {
    calculator: RecoveryCalculator,
    baseline_days: u16,
    sleep_target: f64,
}

impl HistoryAnalyzer {
    /// Analyzer with default weights, a 7-day window and an 8 h sleep target
    pub fn new() -> Self {
        HistoryAnalyzer {
            calculator: RecoveryCalculator::new(),
            baseline_days: DEFAULT_BASELINE_DAYS,
            sleep_target: DEFAULT_SLEEP_TARGET_HOURS,
        }
    }

    pub fn with_config(config: RecoveryConfig, baseline_days: u16, sleep_target: f64) -> Self {
        HistoryAnalyzer {
            calculator: RecoveryCalculator::with_config(config),
            baseline_days,
            sleep_target,
        }
    }

    /// Index summaries by date; a later entry for the same date replaces an earlier one
    pub fn index(summaries: &[DailySummary]) -> SummaryIndex {
        summaries
            .iter()
            .map(|summary| (summary.date, summary.clone()))
            .collect()
    }

    /// Baseline values from the `baseline_days` days strictly before `date`
    pub fn baselines_for(&self, date: NaiveDate, history: &SummaryIndex) -> Baselines {
        let start = date - Duration::days(i64::from(self.baseline_days));
        let window = history.range(start..date).map(|(_, summary)| summary);

        let (hrv, rhr) = window.fold(
            (Vec::new(), Vec::new()),
            |(mut hrv, mut rhr), summary| {
                hrv.extend(summary.hrv_ms);
                rhr.extend(summary.rhr_bpm);
                (hrv, rhr)
            },
        );

        Baselines { hrv, rhr }
    }

    /// Everything the recovery engine needs for `date`. Missing days simply
    /// leave their inputs absent.
    pub fn recovery_inputs_for(&self, date: NaiveDate, history: &SummaryIndex) -> RecoveryInputs {
        let baselines = self.baselines_for(date, history);
        let previous_day_strain = date
            .pred_opt()
            .and_then(|yesterday| history.get(&yesterday))
            .and_then(|summary| summary.strain_score);

        let today = history.get(&date);
        let field = |f: fn(&DailySummary) -> Option<f64>| today.and_then(f);

        RecoveryInputs {
            current_hrv: field(|s| s.hrv_ms),
            hrv_baseline: baselines.hrv,
            current_rhr: field(|s| s.rhr_bpm),
            rhr_baseline: baselines.rhr,
            sleep_hours: field(|s| s.sleep_hours),
            sleep_target: self.sleep_target,
            sleep_quality: field(|s| s.sleep_quality),
            previous_day_strain,
            subjective_energy: field(|s| s.subjective_energy),
            subjective_soreness: field(|s| s.subjective_soreness),
            subjective_stress: field(|s| s.subjective_stress),
        }
    }

    /// Score a single day against its history
    pub fn score_day(&self, date: NaiveDate, history: &SummaryIndex) -> DailyRecovery {
        let inputs = self.recovery_inputs_for(date, history);
        DailyRecovery {
            date,
            recovery: self.calculator.calculate_recovery(&inputs),
        }
    }

    /// Score every day that has a summary, oldest first
    pub fn score_all(&self, summaries: &[DailySummary]) -> Vec<DailyRecovery> {
        let history = Self::index(summaries);
        let dates: Vec<NaiveDate> = history.keys().copied().collect();

        let scored: Vec<DailyRecovery> = dates
            .par_iter()
            .map(|&date| self.score_day(date, &history))
            .collect();

        debug!(days = scored.len(), "Scored recovery history");
        scored
    }
}

impl Default for HistoryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
