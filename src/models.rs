use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single instantaneous heart rate reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,

    /// Heart rate in beats per minute
    pub bpm: u16,
}

impl HeartRateSample {
    pub fn new(timestamp: DateTime<Utc>, bpm: u16) -> Self {
        HeartRateSample { timestamp, bpm }
    }
}

/// Inclusive BPM range of a single zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRange {
    pub min: u16,
    pub max: u16,
}

/// Heart rate reserve zones (5-zone model)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZones {
    pub zone1: ZoneRange, // 50-60% HRR
    pub zone2: ZoneRange, // 60-70% HRR
    pub zone3: ZoneRange, // 70-80% HRR
    pub zone4: ZoneRange, // 80-90% HRR
    pub zone5: ZoneRange, // 90-100% HRR
}

impl HeartRateZones {
    /// Zones in ascending order
    pub fn ranges(&self) -> [(HrZone, ZoneRange); 5] {
        [
            (HrZone::Zone1, self.zone1),
            (HrZone::Zone2, self.zone2),
            (HrZone::Zone3, self.zone3),
            (HrZone::Zone4, self.zone4),
            (HrZone::Zone5, self.zone5),
        ]
    }
}

/// Intensity band a heart rate falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HrZone {
    /// Below zone 1, contributes no strain
    Below,
    Zone1,
    Zone2,
    Zone3,
    Zone4,
    Zone5,
}

impl HrZone {
    /// Position in the zone weight table, `None` for below-zone time
    pub fn index(&self) -> Option<usize> {
        match self {
            HrZone::Below => None,
            HrZone::Zone1 => Some(0),
            HrZone::Zone2 => Some(1),
            HrZone::Zone3 => Some(2),
            HrZone::Zone4 => Some(3),
            HrZone::Zone5 => Some(4),
        }
    }
}

impl fmt::Display for HrZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HrZone::Below => write!(f, "Below Zone 1"),
            HrZone::Zone1 => write!(f, "Zone 1"),
            HrZone::Zone2 => write!(f, "Zone 2"),
            HrZone::Zone3 => write!(f, "Zone 3"),
            HrZone::Zone4 => write!(f, "Zone 4"),
            HrZone::Zone5 => write!(f, "Zone 5"),
        }
    }
}

/// One logged resistance-training entry, e.g. "3×10 @135lbs"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    /// Exercise name, informational only
    #[serde(default)]
    pub exercise: Option<String>,

    /// Number of sets performed
    pub sets_count: u32,

    /// Repetitions per set
    #[serde(default)]
    pub reps: Option<u32>,

    /// Load in pounds
    #[serde(default)]
    pub weight_lbs: Option<f64>,
}

impl WorkoutSet {
    /// Volume in lb (sets × reps × weight), absent reps/weight count as zero
    pub fn volume(&self) -> f64 {
        f64::from(self.sets_count)
            * f64::from(self.reps.unwrap_or(0))
            * self.weight_lbs.unwrap_or(0.0)
    }
}

/// Unrounded minutes spent per zone, as accumulated by the cardio walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneTime {
    pub zone1: f64,
    pub zone2: f64,
    pub zone3: f64,
    pub zone4: f64,
    pub zone5: f64,
    pub below: f64,
}

impl ZoneTime {
    /// Add minutes to the bucket for `zone`
    pub fn add(&mut self, zone: HrZone, minutes: f64) {
        match zone {
            HrZone::Below => self.below += minutes,
            HrZone::Zone1 => self.zone1 += minutes,
            HrZone::Zone2 => self.zone2 += minutes,
            HrZone::Zone3 => self.zone3 += minutes,
            HrZone::Zone4 => self.zone4 += minutes,
            HrZone::Zone5 => self.zone5 += minutes,
        }
    }

    /// Minutes in zones 1-5 (excludes below-zone time)
    pub fn active_minutes(&self) -> f64 {
        self.zone1 + self.zone2 + self.zone3 + self.zone4 + self.zone5
    }

    /// Round every bucket to whole minutes
    pub fn rounded(&self) -> ZoneMinutes {
        ZoneMinutes {
            zone1: round_minutes(self.zone1),
            zone2: round_minutes(self.zone2),
            zone3: round_minutes(self.zone3),
            zone4: round_minutes(self.zone4),
            zone5: round_minutes(self.zone5),
            below: round_minutes(self.below),
        }
    }
}

fn round_minutes(minutes: f64) -> u32 {
    minutes.max(0.0).round() as u32
}

/// Whole minutes per zone as reported in a strain result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMinutes {
    pub zone1: u32,
    pub zone2: u32,
    pub zone3: u32,
    pub zone4: u32,
    pub zone5: u32,
    pub below: u32,
}

/// Outcome of a daily strain calculation
///
/// `cardiovascular_strain` and `mechanical_strain` are each mapped through
/// the saturating curve on their own, so they do not add up to `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrainResult {
    /// Final 0-21 strain, one decimal
    pub score: f64,

    /// Heart-rate load alone on the 0-21 scale
    pub cardiovascular_strain: f64,

    /// Resistance load alone on the 0-21 scale
    pub mechanical_strain: f64,

    /// Combined raw load before compression
    pub raw_strain: f64,

    pub zone_minutes: ZoneMinutes,

    /// Sum of zone 1-5 minutes
    pub total_active_minutes: u32,
}

/// Today's readings plus personal baselines for a recovery calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryInputs {
    /// Today's HRV in ms
    #[serde(default)]
    pub current_hrv: Option<f64>,

    /// Recent daily HRV values
    #[serde(default)]
    pub hrv_baseline: Vec<f64>,

    /// Today's resting heart rate
    #[serde(default)]
    pub current_rhr: Option<f64>,

    /// Recent daily resting heart rates
    #[serde(default)]
    pub rhr_baseline: Vec<f64>,

    /// Hours slept last night
    #[serde(default)]
    pub sleep_hours: Option<f64>,

    /// Target hours of sleep
    #[serde(default = "default_sleep_target")]
    pub sleep_target: f64,

    /// Sleep quality 1-5
    #[serde(default)]
    pub sleep_quality: Option<f64>,

    /// Yesterday's strain score (0-21)
    #[serde(default)]
    pub previous_day_strain: Option<f64>,

    /// 1-5
    #[serde(default)]
    pub subjective_energy: Option<f64>,

    /// 1-5 (5 = not sore)
    #[serde(default)]
    pub subjective_soreness: Option<f64>,

    /// 1-5 (5 = not stressed)
    #[serde(default)]
    pub subjective_stress: Option<f64>,
}

fn default_sleep_target() -> f64 {
    crate::constants::recovery::DEFAULT_SLEEP_TARGET_HOURS
}

impl Default for RecoveryInputs {
    fn default() -> Self {
        RecoveryInputs {
            current_hrv: None,
            hrv_baseline: Vec::new(),
            current_rhr: None,
            rhr_baseline: Vec::new(),
            sleep_hours: None,
            sleep_target: default_sleep_target(),
            sleep_quality: None,
            previous_day_strain: None,
            subjective_energy: None,
            subjective_soreness: None,
            subjective_stress: None,
        }
    }
}

/// The six recovery factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecoveryComponent {
    Hrv,
    Rhr,
    Sleep,
    SleepQuality,
    Strain,
    Subjective,
}

impl RecoveryComponent {
    pub const ALL: [RecoveryComponent; 6] = [
        RecoveryComponent::Hrv,
        RecoveryComponent::Rhr,
        RecoveryComponent::Sleep,
        RecoveryComponent::SleepQuality,
        RecoveryComponent::Strain,
        RecoveryComponent::Subjective,
    ];

    /// Stable identifier used in breakdowns and reports
    pub fn key(&self) -> &'static str {
        match self {
            RecoveryComponent::Hrv => "hrv",
            RecoveryComponent::Rhr => "rhr",
            RecoveryComponent::Sleep => "sleep",
            RecoveryComponent::SleepQuality => "sleepQuality",
            RecoveryComponent::Strain => "strain",
            RecoveryComponent::Subjective => "subjective",
        }
    }
}

impl fmt::Display for RecoveryComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Score and effective weight of one recovery factor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    /// 0-100 (1-99 when available, 0 when not)
    pub score: f64,

    /// Normalized weight, 0 when unavailable
    pub weight: f64,

    pub available: bool,
}

/// Per-factor recovery breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryBreakdown {
    pub hrv: ComponentScore,
    pub rhr: ComponentScore,
    pub sleep: ComponentScore,
    pub sleep_quality: ComponentScore,
    pub strain: ComponentScore,
    pub subjective: ComponentScore,
}

impl RecoveryBreakdown {
    pub fn get(&self, component: RecoveryComponent) -> &ComponentScore {
        match component {
            RecoveryComponent::Hrv => &self.hrv,
            RecoveryComponent::Rhr => &self.rhr,
            RecoveryComponent::Sleep => &self.sleep,
            RecoveryComponent::SleepQuality => &self.sleep_quality,
            RecoveryComponent::Strain => &self.strain,
            RecoveryComponent::Subjective => &self.subjective,
        }
    }

    /// Build a breakdown from `(component, score)` pairs; missing
    /// components stay unavailable
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (RecoveryComponent, ComponentScore)>,
    {
        scores
            .into_iter()
            .fold(RecoveryBreakdown::default(), |breakdown, (component, score)| {
                breakdown.with(component, score)
            })
    }

    fn with(self, component: RecoveryComponent, score: ComponentScore) -> Self {
        match component {
            RecoveryComponent::Hrv => RecoveryBreakdown { hrv: score, ..self },
            RecoveryComponent::Rhr => RecoveryBreakdown { rhr: score, ..self },
            RecoveryComponent::Sleep => RecoveryBreakdown { sleep: score, ..self },
            RecoveryComponent::SleepQuality => RecoveryBreakdown {
                sleep_quality: score,
                ..self
            },
            RecoveryComponent::Strain => RecoveryBreakdown { strain: score, ..self },
            RecoveryComponent::Subjective => RecoveryBreakdown {
                subjective: score,
                ..self
            },
        }
    }
}

/// Outcome of a recovery calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryResult {
    /// Composite score, 1-99 (50 when no data at all)
    pub score: u8,

    pub breakdown: RecoveryBreakdown,

    /// Percentage of total factor weight that had data
    pub data_completeness: u8,
}

/// One day of stored metrics, as supplied by the data layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,

    #[serde(default)]
    pub strain_score: Option<f64>,

    #[serde(default)]
    pub recovery_score: Option<u8>,

    #[serde(default)]
    pub hrv_ms: Option<f64>,

    #[serde(default)]
    pub rhr_bpm: Option<f64>,

    #[serde(default)]
    pub sleep_hours: Option<f64>,

    #[serde(default)]
    pub sleep_quality: Option<f64>,

    #[serde(default)]
    pub subjective_energy: Option<f64>,

    #[serde(default)]
    pub subjective_soreness: Option<f64>,

    #[serde(default)]
    pub subjective_stress: Option<f64>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl DailySummary {
    /// Empty summary for a date
    pub fn new(date: NaiveDate) -> Self {
        DailySummary {
            date,
            strain_score: None,
            recovery_score: None,
            hrv_ms: None,
            rhr_bpm: None,
            sleep_hours: None,
            sleep_quality: None,
            subjective_energy: None,
            subjective_soreness: None,
            subjective_stress: None,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workout_set_volume() {
        let set = WorkoutSet {
            exercise: Some("Bench Press".to_string()),
            sets_count: 3,
            reps: Some(10),
            weight_lbs: Some(135.0),
        };
        assert_eq!(set.volume(), 4050.0);

        let bodyweight = WorkoutSet {
            exercise: Some("Pull-up".to_string()),
            sets_count: 3,
            reps: Some(8),
            weight_lbs: None,
        };
        assert_eq!(bodyweight.volume(), 0.0);
    }

    #[test]
    fn test_zone_time_rounding() {
        let mut time = ZoneTime::default();
        time.add(HrZone::Zone2, 4.6);
        time.add(HrZone::Zone5, 0.4);
        time.add(HrZone::Below, 12.5);

        let rounded = time.rounded();
        assert_eq!(rounded.zone2, 5);
        assert_eq!(rounded.zone5, 0);
        assert_eq!(rounded.below, 13);
        assert!((time.active_minutes() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_from_scores() {
        let breakdown = RecoveryBreakdown::from_scores([(
            RecoveryComponent::Sleep,
            ComponentScore {
                score: 80.0,
                weight: 1.0,
                available: true,
            },
        )]);

        assert!(breakdown.sleep.available);
        assert!(!breakdown.hrv.available);
        assert_eq!(breakdown.get(RecoveryComponent::Sleep).score, 80.0);
    }

    #[test]
    fn test_breakdown_serializes_component_keys() {
        let json = serde_json::to_value(RecoveryBreakdown::default()).unwrap();
        for component in RecoveryComponent::ALL {
            assert!(json.get(component.key()).is_some(), "missing {}", component);
        }
    }

    #[test]
    fn test_recovery_inputs_default_sleep_target() {
        let inputs: RecoveryInputs = serde_json::from_str("{}").unwrap();
        assert_eq!(inputs.sleep_target, 8.0);
        assert!(inputs.hrv_baseline.is_empty());
    }
}
