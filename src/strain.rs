//! Daily strain scoring
//!
//! Strain combines two raw loads and compresses the sum onto a 0-21 scale:
//!
//! - **Cardiovascular load**: a TRIMP-style sum of minutes spent in each heart
//!   rate reserve zone, weighted 1/2/3/5/8 so that time near max HR counts far
//!   more than easy aerobic time.
//! - **Mechanical load**: resistance training volume (sets × reps × lbs),
//!   scaled by how hard the heart was working during the session.
//!
//! The raw total maps through `21 × (1 - e^(-k × raw))`. The curve is linear
//! near zero and flattens toward 21, so every extra point costs more work than
//! the last, the way perceived exertion saturates.

use crate::constants::strain::{
    DEFAULT_PERSONAL_FACTOR, HR_INTENSITY_BASE, MAX_SAMPLE_GAP_MINUTES, MAX_STRAIN,
    MECHANICAL_K, STRAIN_K, ZONE_WEIGHTS,
};
use crate::constants::profile::{DEFAULT_AGE, DEFAULT_RESTING_HR};
use crate::models::{HeartRateSample, HeartRateZones, StrainResult, WorkoutSet, ZoneTime};
use crate::zones::ZoneCalculator;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Strain calibration, defaulting to the values in `constants::strain`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrainConfig {
    /// Saturation rate of the 0-21 curve
    pub strain_k: f64,

    /// Raw load per lb of resistance volume
    pub mechanical_k: f64,

    /// Raw load per minute in zones 1-5
    pub zone_weights: [f64; 5],

    /// Longest gap between samples still counted, in minutes
    pub max_gap_minutes: f64,
}

impl Default for StrainConfig {
    fn default() -> Self {
        StrainConfig {
            strain_k: STRAIN_K,
            mechanical_k: MECHANICAL_K,
            zone_weights: ZONE_WEIGHTS,
            max_gap_minutes: MAX_SAMPLE_GAP_MINUTES,
        }
    }
}

/// Personal parameters a strain calculation depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainProfile {
    /// Age in years, used for the max HR estimate
    pub age: u8,

    /// Resting heart rate
    pub resting_hr: u16,

    /// Highest measured heart rate, if known
    pub actual_max_hr: Option<u16>,

    /// Learned intensity factor (1.0 = population average)
    pub personal_factor: f64,
}

impl StrainProfile {
    pub fn new(age: u8, resting_hr: u16) -> Self {
        StrainProfile {
            age,
            resting_hr,
            actual_max_hr: None,
            personal_factor: DEFAULT_PERSONAL_FACTOR,
        }
    }

    pub fn with_max_hr(mut self, max_hr: u16) -> Self {
        self.actual_max_hr = Some(max_hr);
        self
    }

    pub fn with_personal_factor(mut self, factor: f64) -> Self {
        self.personal_factor = factor;
        self
    }

    /// Max HR used for zones: measured value if higher than the estimate
    pub fn max_hr(&self) -> u16 {
        ZoneCalculator::effective_max_hr(self.age, self.actual_max_hr)
    }
}

impl Default for StrainProfile {
    fn default() -> Self {
        StrainProfile::new(DEFAULT_AGE, DEFAULT_RESTING_HR)
    }
}

/// Raw heart-rate load and the time behind it
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CardioLoad {
    pub raw_strain: f64,
    pub zone_time: ZoneTime,
}

/// Descriptive band for a strain score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrainLevel {
    Light,  // 0-4
    Low,    // 4-8
    Medium, // 8-13
    High,   // 13-17
    AllOut, // 17-21
}

impl StrainLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= 4.0 {
            StrainLevel::Light
        } else if score <= 8.0 {
            StrainLevel::Low
        } else if score <= 13.0 {
            StrainLevel::Medium
        } else if score <= 17.0 {
            StrainLevel::High
        } else {
            StrainLevel::AllOut
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrainLevel::Light => "Light",
            StrainLevel::Low => "Low",
            StrainLevel::Medium => "Medium",
            StrainLevel::High => "High",
            StrainLevel::AllOut => "All Out",
        }
    }
}

/// Core strain calculation engine
#[derive(Debug, Clone, Default)]
pub struct StrainCalculator {
    config: StrainConfig,
}

impl StrainCalculator {
    /// Create a calculator with the default calibration
    pub fn new() -> Self {
        StrainCalculator {
            config: StrainConfig::default(),
        }
    }

    /// Create a calculator with custom calibration
    pub fn with_config(config: StrainConfig) -> Self {
        StrainCalculator { config }
    }

    pub fn config(&self) -> &StrainConfig {
        &self.config
    }

    /// Accumulate zone-weighted load from a heart rate stream
    ///
    /// Samples are sorted by time and walked pairwise. Each interval is
    /// credited to the zone of its later sample. Intervals longer than
    /// `max_gap_minutes` are treated as the sensor being off and add nothing.
    /// Below-zone time is tracked but carries no load.
    pub fn calculate_cardiovascular_strain(
        &self,
        samples: &[HeartRateSample],
        zones: &HeartRateZones,
    ) -> CardioLoad {
        if samples.len() < 2 {
            return CardioLoad::default();
        }

        let mut sorted: Vec<&HeartRateSample> = samples.iter().collect();
        sorted.sort_by_key(|sample| sample.timestamp);

        let mut load = CardioLoad::default();

        for pair in sorted.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let minutes = (curr.timestamp - prev.timestamp).num_milliseconds() as f64 / 60_000.0;

            if minutes > self.config.max_gap_minutes {
                trace!(
                    from = %prev.timestamp,
                    to = %curr.timestamp,
                    minutes,
                    "Skipping heart rate gap"
                );
                continue;
            }

            let zone = ZoneCalculator::classify_zone(curr.bpm, zones);
            load.zone_time.add(zone, minutes);

            if let Some(index) = zone.index() {
                load.raw_strain += minutes * self.config.zone_weights[index];
            }
        }

        debug!(
            samples = samples.len(),
            raw_strain = load.raw_strain,
            active_minutes = load.zone_time.active_minutes(),
            "Cardiovascular strain accumulated"
        );

        load
    }

    /// Raw load from resistance training
    ///
    /// `volume × mechanical_k × intensity`, where intensity starts at the
    /// personal factor and, when an average workout HR is known, is scaled by
    /// `0.5 + (avg - resting) / (max - resting)`: 0.5× at resting HR, 1.5× at
    /// max HR. With no heart rate reserve to divide by the HR scaling is left
    /// neutral.
    pub fn calculate_mechanical_strain(
        &self,
        sets: &[WorkoutSet],
        avg_hr: Option<f64>,
        max_hr: u16,
        resting_hr: u16,
        personal_factor: f64,
    ) -> f64 {
        if sets.is_empty() {
            return 0.0;
        }

        let total_volume: f64 = sets.iter().map(WorkoutSet::volume).sum();

        let mut intensity_factor = personal_factor;
        if let Some(avg) = avg_hr {
            let hrr = f64::from(max_hr) - f64::from(resting_hr);
            if hrr > 0.0 {
                intensity_factor *= HR_INTENSITY_BASE + (avg - f64::from(resting_hr)) / hrr;
            }
        }

        total_volume * self.config.mechanical_k * intensity_factor
    }

    /// Calculate the full daily strain result
    pub fn calculate_strain_score(
        &self,
        samples: &[HeartRateSample],
        sets: &[WorkoutSet],
        profile: &StrainProfile,
        avg_workout_hr: Option<f64>,
    ) -> StrainResult {
        let max_hr = profile.max_hr();
        let zones = ZoneCalculator::calculate_hr_zones(max_hr, profile.resting_hr);

        let cardio = self.calculate_cardiovascular_strain(samples, &zones);
        let mechanical = self.calculate_mechanical_strain(
            sets,
            avg_workout_hr,
            max_hr,
            profile.resting_hr,
            profile.personal_factor,
        );

        let total_raw = cardio.raw_strain + mechanical;
        let score = self.map_to_scale(total_raw);

        debug!(
            max_hr,
            cardio_raw = cardio.raw_strain,
            mechanical_raw = mechanical,
            score,
            "Strain score calculated"
        );

        let zone_minutes = cardio.zone_time.rounded();

        StrainResult {
            score: round_tenth(score),
            cardiovascular_strain: round_tenth(self.map_to_scale(cardio.raw_strain)),
            mechanical_strain: round_tenth(self.map_to_scale(mechanical)),
            raw_strain: total_raw,
            zone_minutes,
            total_active_minutes: cardio.zone_time.active_minutes().max(0.0).round() as u32,
        }
    }

    /// Saturating map from raw load onto 0-21
    pub fn map_to_scale(&self, raw: f64) -> f64 {
        (MAX_STRAIN * (1.0 - (-self.config.strain_k * raw).exp())).clamp(0.0, MAX_STRAIN)
    }
}

/// Descriptive label for a strain score
pub fn get_strain_label(score: f64) -> &'static str {
    StrainLevel::from_score(score).label()
}

/// Strain as a percentage of the 21-point scale, for gauges
pub fn get_strain_percentage(score: f64) -> u8 {
    (score / MAX_STRAIN * 100.0).round().clamp(0.0, 100.0) as u8
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn sample_at(minute: i64, bpm: u16) -> HeartRateSample {
        let start = Utc.with_ymd_and_hms(2025, 2, 19, 6, 0, 0).unwrap();
        HeartRateSample::new(start + Duration::minutes(minute), bpm)
    }

    fn bench_press() -> WorkoutSet {
        WorkoutSet {
            exercise: Some("Bench Press".to_string()),
            sets_count: 3,
            reps: Some(10),
            weight_lbs: Some(135.0),
        }
    }

    fn test_zones() -> HeartRateZones {
        // age 30, resting 60 -> max 186, zone 5 from 173
        ZoneCalculator::calculate_hr_zones(186, 60)
    }

    #[test]
    fn test_cardio_needs_two_samples() {
        let calculator = StrainCalculator::new();
        let zones = test_zones();

        let empty = calculator.calculate_cardiovascular_strain(&[], &zones);
        assert_eq!(empty.raw_strain, 0.0);
        assert_eq!(empty.zone_time, ZoneTime::default());

        let single = calculator.calculate_cardiovascular_strain(&[sample_at(0, 180)], &zones);
        assert_eq!(single.raw_strain, 0.0);
        assert_eq!(single.zone_time, ZoneTime::default());
    }

    #[test]
    fn test_cardio_skips_sensor_gap() {
        let calculator = StrainCalculator::new();
        let samples = vec![sample_at(0, 180), sample_at(11, 180)];

        let load = calculator.calculate_cardiovascular_strain(&samples, &test_zones());

        assert_eq!(load.raw_strain, 0.0);
        assert_eq!(load.zone_time.zone5, 0.0);
        assert_eq!(load.zone_time.below, 0.0);
    }

    #[test]
    fn test_cardio_counts_exactly_ten_minutes() {
        let calculator = StrainCalculator::new();
        let samples = vec![sample_at(0, 125), sample_at(10, 125)];

        let load = calculator.calculate_cardiovascular_strain(&samples, &test_zones());

        assert!((load.zone_time.zone1 - 10.0).abs() < 1e-9);
        assert!((load.raw_strain - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_cardio_zone5_weighting() {
        let calculator = StrainCalculator::new();
        let samples = vec![sample_at(0, 180), sample_at(5, 180)];

        let load = calculator.calculate_cardiovascular_strain(&samples, &test_zones());

        assert!((load.zone_time.zone5 - 5.0).abs() < 1e-9);
        assert!((load.raw_strain - 40.0).abs() < 1e-9); // 5 min × 8
    }

    #[test]
    fn test_cardio_uses_later_sample_and_sorts() {
        let calculator = StrainCalculator::new();
        // Out of order on purpose; after sorting: 0 @100, 2 @150, 4 @100
        let samples = vec![sample_at(4, 100), sample_at(0, 100), sample_at(2, 150)];

        let load = calculator.calculate_cardiovascular_strain(&samples, &test_zones());

        assert!((load.zone_time.zone3 - 2.0).abs() < 1e-9);
        assert!((load.zone_time.below - 2.0).abs() < 1e-9);
        assert!((load.raw_strain - 6.0).abs() < 1e-9); // 2 min × 3
    }

    #[test]
    fn test_mechanical_strain_without_hr() {
        let calculator = StrainCalculator::new();
        let raw = calculator.calculate_mechanical_strain(&[bench_press()], None, 186, 60, 1.0);

        assert!((raw - 4050.0 * 0.000015).abs() < 1e-12);

        let mapped = calculator.map_to_scale(raw);
        assert!(mapped > 0.0 && mapped < 0.01);
    }

    #[test]
    fn test_mechanical_intensity_scaling() {
        let calculator = StrainCalculator::new();
        let base = calculator.calculate_mechanical_strain(&[bench_press()], None, 186, 60, 1.0);

        let at_rest = calculator.calculate_mechanical_strain(&[bench_press()], Some(60.0), 186, 60, 1.0);
        let at_max = calculator.calculate_mechanical_strain(&[bench_press()], Some(186.0), 186, 60, 1.0);
        let doubled = calculator.calculate_mechanical_strain(&[bench_press()], None, 186, 60, 2.0);

        assert!((at_rest - base * 0.5).abs() < 1e-12);
        assert!((at_max - base * 1.5).abs() < 1e-12);
        assert!((doubled - base * 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mechanical_zero_reserve_is_neutral() {
        let calculator = StrainCalculator::new();
        let base = calculator.calculate_mechanical_strain(&[bench_press()], None, 60, 60, 1.0);
        let guarded = calculator.calculate_mechanical_strain(&[bench_press()], Some(120.0), 60, 60, 1.0);

        assert!(guarded.is_finite());
        assert_eq!(guarded, base);
    }

    #[test]
    fn test_mechanical_no_sets() {
        let calculator = StrainCalculator::new();
        assert_eq!(calculator.calculate_mechanical_strain(&[], Some(150.0), 186, 60, 3.0), 0.0);
    }

    #[test]
    fn test_strain_score_end_to_end() {
        let calculator = StrainCalculator::new();
        let profile = StrainProfile::new(30, 60);
        let samples = vec![sample_at(0, 180), sample_at(5, 180)];

        let result = calculator.calculate_strain_score(&samples, &[], &profile, None);

        // 21 × (1 - e^(-0.00035 × 40)) = 0.292
        assert_eq!(result.cardiovascular_strain, 0.3);
        assert_eq!(result.score, 0.3);
        assert_eq!(result.mechanical_strain, 0.0);
        assert!((result.raw_strain - 40.0).abs() < 1e-9);
        assert_eq!(result.zone_minutes.zone5, 5);
        assert_eq!(result.total_active_minutes, 5);
    }

    #[test]
    fn test_strain_uses_higher_measured_max() {
        let calculator = StrainCalculator::new();
        // Max 200 instead of 186: zone 5 now starts at 186, 180 bpm drops to zone 4
        let profile = StrainProfile::new(30, 60).with_max_hr(200);
        let samples = vec![sample_at(0, 180), sample_at(5, 180)];

        let result = calculator.calculate_strain_score(&samples, &[], &profile, None);

        assert_eq!(result.zone_minutes.zone5, 0);
        assert_eq!(result.zone_minutes.zone4, 5);
        assert!((result.raw_strain - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_sub_scores_do_not_sum_to_total() {
        let calculator = StrainCalculator::new();
        let profile = StrainProfile::new(30, 60);

        // Two hours in zone 5 (raw 960) plus a sled-push volume worth raw 600
        let samples: Vec<HeartRateSample> = (0..=120).map(|m| sample_at(m, 180)).collect();
        let sets = vec![WorkoutSet {
            exercise: Some("Sled Push".to_string()),
            sets_count: 10,
            reps: Some(10),
            weight_lbs: Some(400_000.0),
        }];

        let result = calculator.calculate_strain_score(&samples, &sets, &profile, None);

        // 6.0 + 4.0 vs 8.8
        assert_eq!(result.cardiovascular_strain, 6.0);
        assert_eq!(result.mechanical_strain, 4.0);
        assert_eq!(result.score, 8.8);
        assert!(result.cardiovascular_strain + result.mechanical_strain > result.score);
        assert!(result.score <= 21.0);
    }

    #[test]
    fn test_large_raw_strain_saturates() {
        let calculator = StrainCalculator::new();
        let score = calculator.map_to_scale(100_000.0);
        assert!(score > 20.9);
        assert!(score <= 21.0);
    }

    #[test]
    fn test_strain_labels() {
        assert_eq!(get_strain_label(0.0), "Light");
        assert_eq!(get_strain_label(4.0), "Light");
        assert_eq!(get_strain_label(4.1), "Low");
        assert_eq!(get_strain_label(8.0), "Low");
        assert_eq!(get_strain_label(10.5), "Medium");
        assert_eq!(get_strain_label(17.0), "High");
        assert_eq!(get_strain_label(17.1), "All Out");
    }

    #[test]
    fn test_strain_percentage() {
        assert_eq!(get_strain_percentage(0.0), 0);
        assert_eq!(get_strain_percentage(10.5), 50);
        assert_eq!(get_strain_percentage(21.0), 100);
    }

    #[test]
    fn test_custom_config() {
        let config = StrainConfig {
            zone_weights: [1.0, 1.0, 1.0, 1.0, 1.0],
            max_gap_minutes: 30.0,
            ..StrainConfig::default()
        };
        let calculator = StrainCalculator::with_config(config);
        let samples = vec![sample_at(0, 180), sample_at(20, 180)];

        let load = calculator.calculate_cardiovascular_strain(&samples, &test_zones());
        assert!((load.raw_strain - 20.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn test_map_to_scale_monotonic(a in 0.0f64..200_000.0, b in 0.0f64..200_000.0) {
            let calculator = StrainCalculator::new();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };

            let low_score = calculator.map_to_scale(low);
            let high_score = calculator.map_to_scale(high);

            prop_assert!(low_score <= high_score);
            prop_assert!((0.0..=21.0).contains(&low_score));
            prop_assert!((0.0..=21.0).contains(&high_score));
        }

        #[test]
        fn test_strain_result_bounds(
            bpms in proptest::collection::vec(40u16..220u16, 0..200),
            step in 1i64..15i64,
            age in 18u8..80u8,
            resting in 40u16..80u16,
        ) {
            let calculator = StrainCalculator::new();
            let profile = StrainProfile::new(age, resting);
            let samples: Vec<HeartRateSample> = bpms
                .iter()
                .enumerate()
                .map(|(i, &bpm)| sample_at(i as i64 * step, bpm))
                .collect();

            let result = calculator.calculate_strain_score(&samples, &[bench_press()], &profile, Some(140.0));

            prop_assert!((0.0..=21.0).contains(&result.score));
            prop_assert!((0.0..=21.0).contains(&result.cardiovascular_strain));
            prop_assert!((0.0..=21.0).contains(&result.mechanical_strain));
            prop_assert!(result.raw_strain >= 0.0);
        }
    }
}
