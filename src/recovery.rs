//! Recovery scoring
//!
//! Recovery is a 0-100% readiness score built from six factors, each mapped
//! onto a 1-99 scale and combined with fixed base weights:
//!
//! | Factor        | Weight | Input                                   |
//! |---------------|--------|-----------------------------------------|
//! | HRV           | 30%    | today's HRV vs. median of recent days   |
//! | Resting HR    | 25%    | today's RHR vs. lowest recent day       |
//! | Sleep         | 20%    | hours slept vs. target                  |
//! | Sleep quality | 10%    | 1-5 rating                              |
//! | Prior strain  | 10%    | yesterday's 0-21 strain                 |
//! | Subjective    | 5%     | energy / soreness / stress, 1-5 each    |
//!
//! # Missing data
//!
//! A factor without data is dropped and the remaining weights are rescaled to
//! sum to 1, so a day with only sleep logged is scored purely on sleep.
//! `data_completeness` reports how much of the full weight was backed by
//! data before rescaling.
//!
//! Factor and composite scores stay inside 1-99. A day with no data at all
//! scores a neutral 50 with 0% completeness.

use crate::constants::recovery::{
    HRV_SATURATION, HRV_WEIGHT, MAX_SCORE, MIN_SCORE, NEUTRAL_SCORE, RHR_SATURATION, RHR_WEIGHT,
    SLEEP_QUALITY_WEIGHT, SLEEP_WEIGHT, STRAIN_IMPACT_INTERCEPT, STRAIN_IMPACT_SLOPE,
    STRAIN_WEIGHT, SUBJECTIVE_WEIGHT,
};
use crate::models::{
    ComponentScore, RecoveryBreakdown, RecoveryComponent, RecoveryInputs, RecoveryResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Base weight of each recovery factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
    pub hrv: f64,
    pub rhr: f64,
    pub sleep: f64,
    pub sleep_quality: f64,
    pub strain: f64,
    pub subjective: f64,
}

impl ComponentWeights {
    pub fn get(&self, component: RecoveryComponent) -> f64 {
        match component {
            RecoveryComponent::Hrv => self.hrv,
            RecoveryComponent::Rhr => self.rhr,
            RecoveryComponent::Sleep => self.sleep,
            RecoveryComponent::SleepQuality => self.sleep_quality,
            RecoveryComponent::Strain => self.strain,
            RecoveryComponent::Subjective => self.subjective,
        }
    }
}

impl Default for ComponentWeights {
    fn default() -> Self {
        ComponentWeights {
            hrv: HRV_WEIGHT,
            rhr: RHR_WEIGHT,
            sleep: SLEEP_WEIGHT,
            sleep_quality: SLEEP_QUALITY_WEIGHT,
            strain: STRAIN_WEIGHT,
            subjective: SUBJECTIVE_WEIGHT,
        }
    }
}

/// Recovery calibration, defaulting to the values in `constants::recovery`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub weights: ComponentWeights,

    /// Relative HRV deviation that pins the HRV factor at 1 or 99
    pub hrv_saturation: f64,

    /// Relative RHR deviation that pins the RHR factor at 1 or 99
    pub rhr_saturation: f64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            weights: ComponentWeights::default(),
            hrv_saturation: HRV_SATURATION,
            rhr_saturation: RHR_SATURATION,
        }
    }
}

/// Traffic-light recovery band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryLevel {
    Red,    // 0-33
    Yellow, // 34-66
    Green,  // 67-100
}

impl RecoveryLevel {
    pub fn from_score(score: u8) -> Self {
        if score <= 33 {
            RecoveryLevel::Red
        } else if score <= 66 {
            RecoveryLevel::Yellow
        } else {
            RecoveryLevel::Green
        }
    }
}

impl fmt::Display for RecoveryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryLevel::Red => write!(f, "Red"),
            RecoveryLevel::Yellow => write!(f, "Yellow"),
            RecoveryLevel::Green => write!(f, "Green"),
        }
    }
}

/// A factor that had data, before weights are rescaled
#[derive(Debug, Clone, Copy)]
struct ComponentReading {
    component: RecoveryComponent,
    score: f64,
    base_weight: f64,
}

/// Core recovery calculation engine
#[derive(Debug, Clone, Default)]
pub struct RecoveryCalculator {
    config: RecoveryConfig,
}

impl RecoveryCalculator {
    /// Create a calculator with the default weights
    pub fn new() -> Self {
        RecoveryCalculator {
            config: RecoveryConfig::default(),
        }
    }

    /// Create a calculator with custom weights and saturation points
    pub fn with_config(config: RecoveryConfig) -> Self {
        RecoveryCalculator { config }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Calculate recovery, redistributing weight away from missing factors
    pub fn calculate_recovery(&self, inputs: &RecoveryInputs) -> RecoveryResult {
        let readings = self.component_readings(inputs);
        let total_available_weight: f64 = readings.iter().map(|r| r.base_weight).sum();

        let usable = total_available_weight.is_finite() && total_available_weight > 0.0;
        if readings.is_empty() || !usable {
            debug!("No recovery inputs available, returning neutral score");
            return RecoveryResult {
                score: NEUTRAL_SCORE as u8,
                breakdown: RecoveryBreakdown::default(),
                data_completeness: 0,
            };
        }

        let weighted: Vec<(RecoveryComponent, ComponentScore)> = readings
            .iter()
            .map(|reading| {
                (
                    reading.component,
                    ComponentScore {
                        score: reading.score,
                        weight: reading.base_weight / total_available_weight,
                        available: true,
                    },
                )
            })
            .collect();

        let composite: f64 = weighted
            .iter()
            .map(|(_, component)| component.score * component.weight)
            .sum();

        let score = composite.round().clamp(MIN_SCORE, MAX_SCORE) as u8;
        let data_completeness = (total_available_weight * 100.0).round().clamp(0.0, 100.0) as u8;

        debug!(
            available = weighted.len(),
            total_available_weight,
            composite,
            score,
            "Recovery score calculated"
        );

        RecoveryResult {
            score,
            breakdown: RecoveryBreakdown::from_scores(weighted),
            data_completeness,
        }
    }

    /// Score every factor that has data. A reading that scores as NaN or
    /// infinite counts as missing.
    fn component_readings(&self, inputs: &RecoveryInputs) -> Vec<ComponentReading> {
        RecoveryComponent::ALL
            .iter()
            .filter_map(|&component| {
                self.score_component(component, inputs)
                    .filter(|score| score.is_finite())
                    .map(|score| ComponentReading {
                        component,
                        score,
                        base_weight: self.config.weights.get(component),
                    })
            })
            .collect()
    }

    fn score_component(&self, component: RecoveryComponent, inputs: &RecoveryInputs) -> Option<f64> {
        match component {
            RecoveryComponent::Hrv => match inputs.current_hrv {
                Some(current) if !inputs.hrv_baseline.is_empty() => {
                    Some(self.score_hrv(current, &inputs.hrv_baseline))
                }
                _ => None,
            },
            RecoveryComponent::Rhr => match inputs.current_rhr {
                Some(current) if !inputs.rhr_baseline.is_empty() => {
                    Some(self.score_rhr(current, &inputs.rhr_baseline))
                }
                _ => None,
            },
            RecoveryComponent::Sleep => inputs
                .sleep_hours
                .map(|hours| score_sleep(hours, inputs.sleep_target)),
            RecoveryComponent::SleepQuality => inputs.sleep_quality.map(score_sleep_quality),
            RecoveryComponent::Strain => inputs.previous_day_strain.map(score_strain_impact),
            RecoveryComponent::Subjective => {
                let present = [
                    inputs.subjective_energy,
                    inputs.subjective_soreness,
                    inputs.subjective_stress,
                ];
                present.iter().any(Option::is_some).then(|| {
                    score_subjective(
                        inputs.subjective_energy,
                        inputs.subjective_soreness,
                        inputs.subjective_stress,
                    )
                })
            }
        }
    }

    /// HRV against the median of recent days; higher is better.
    /// ±`hrv_saturation` from the median reaches 99 / 1.
    pub fn score_hrv(&self, current: f64, baseline: &[f64]) -> f64 {
        if baseline.is_empty() {
            return NEUTRAL_SCORE;
        }

        let median = calculate_baseline(baseline);
        if median == 0.0 {
            return NEUTRAL_SCORE;
        }

        let deviation = (current - median) / median;
        clamp_score(NEUTRAL_SCORE + deviation / self.config.hrv_saturation * 50.0)
    }

    /// Resting HR against the lowest recent day; lower is better.
    /// `rhr_saturation` below/above the best day reaches 99 / 1.
    pub fn score_rhr(&self, current: f64, baseline: &[f64]) -> f64 {
        let lowest = match baseline.iter().copied().reduce(f64::min) {
            Some(lowest) => lowest,
            None => return NEUTRAL_SCORE,
        };

        if lowest == 0.0 {
            return NEUTRAL_SCORE;
        }

        let deviation = (lowest - current) / lowest;
        clamp_score(NEUTRAL_SCORE + deviation / self.config.rhr_saturation * 50.0)
    }
}

/// Sleep duration against target
///
/// Piecewise on `ratio = hours / target`:
/// - ≥ 1.0: 80, plus a bonus for extra sleep
/// - 0.875-1.0 (7-8 h on an 8 h target): from 70
/// - 0.75-0.875 (6-7 h): 40-70
/// - below: proportional, floor of 1
pub fn score_sleep(hours: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return NEUTRAL_SCORE;
    }

    let ratio = hours / target;

    let score = if ratio >= 1.0 {
        (80.0 + (ratio - 1.0) * 100.0).min(MAX_SCORE)
    } else if ratio >= 0.875 {
        70.0 + (ratio - 0.875) * 800.0
    } else if ratio >= 0.75 {
        40.0 + (ratio - 0.75) * 240.0
    } else {
        (ratio * 53.0).max(MIN_SCORE)
    };

    clamp_score(score)
}

/// 1-5 sleep rating, linear: 1 → 1, 3 → 50, 5 → 99
pub fn score_sleep_quality(quality: f64) -> f64 {
    clamp_score((quality - 1.0) * 25.0)
}

/// Yesterday's strain: a rest day scores 70, each strain point costs 3.3
pub fn score_strain_impact(strain: f64) -> f64 {
    clamp_score(STRAIN_IMPACT_INTERCEPT - strain * STRAIN_IMPACT_SLOPE)
}

/// Average of whichever subjective ratings were given, mapped like sleep quality.
/// Missing ratings are left out of the average, not defaulted.
pub fn score_subjective(energy: Option<f64>, soreness: Option<f64>, stress: Option<f64>) -> f64 {
    let values: Vec<f64> = [energy, soreness, stress].into_iter().flatten().collect();
    if values.is_empty() {
        return NEUTRAL_SCORE;
    }

    let avg = values.iter().sum::<f64>() / values.len() as f64;
    clamp_score((avg - 1.0) * 25.0)
}

/// Traffic-light label for a recovery score
pub fn get_recovery_label(score: u8) -> &'static str {
    match RecoveryLevel::from_score(score) {
        RecoveryLevel::Red => "Red",
        RecoveryLevel::Yellow => "Yellow",
        RecoveryLevel::Green => "Green",
    }
}

/// Training guidance for a recovery score
pub fn get_recovery_recommendation(score: u8) -> &'static str {
    match score {
        0..=20 => "Rest day recommended. Focus on sleep and nutrition.",
        21..=33 => "Light activity only. Active recovery, stretching, or walking.",
        34..=50 => "Moderate activity OK. Avoid high intensity.",
        51..=66 => "Good to train. Monitor how you feel during the session.",
        67..=80 => "Great recovery. You're ready for a solid session.",
        _ => "Peak recovery! You're optimally recovered for a hard effort.",
    }
}

/// Baseline of a series of daily values: the element at `len / 2` after
/// sorting (upper median for even lengths), 0 for no data
pub fn calculate_baseline(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted[sorted.len() / 2]
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}
