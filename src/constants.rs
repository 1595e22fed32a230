//! Calibration constants for the strain and recovery engines
//!
//! Every tunable number used by the scoring formulas lives here. The engine
//! configs (`StrainConfig`, `RecoveryConfig`) take their defaults from these
//! values, and the TOML config file can override them, so recalibrating never
//! touches the formula code.

/// Heart rate and zone constants
pub mod heart_rate {
    /// Gellish intercept: `max_hr = 207 - 0.7 × age`
    pub const GELLISH_INTERCEPT: f64 = 207.0;

    /// Gellish age coefficient
    pub const GELLISH_AGE_COEFFICIENT: f64 = 0.7;

    /// Lower bounds of zones 1-5 as fractions of heart rate reserve.
    /// Zone k spans `[ZONE_HRR_FRACTIONS[k], ZONE_HRR_FRACTIONS[k + 1])`,
    /// zone 5 runs to max HR inclusive.
    pub const ZONE_HRR_FRACTIONS: [f64; 5] = [0.50, 0.60, 0.70, 0.80, 0.90];
}

/// Strain engine calibration
pub mod strain {
    /// Upper bound of the strain scale
    pub const MAX_STRAIN: f64 = 21.0;

    /// Saturation rate of `21 × (1 - e^(-k × raw))`.
    /// Calibrated so a maximal-effort day lands around 18-20.
    pub const STRAIN_K: f64 = 0.00035;

    /// Raw load per lb of resistance volume. Tuned empirically.
    pub const MECHANICAL_K: f64 = 0.000015;

    /// Raw strain per minute spent in zones 1-5
    pub const ZONE_WEIGHTS: [f64; 5] = [1.0, 2.0, 3.0, 5.0, 8.0];

    /// Sample gaps longer than this (minutes) are treated as sensor dropouts
    pub const MAX_SAMPLE_GAP_MINUTES: f64 = 10.0;

    /// HR intensity multiplier when average HR equals resting HR.
    /// Scales linearly to `1.0 + base` at max HR.
    pub const HR_INTENSITY_BASE: f64 = 0.5;

    /// Population-average personal intensity factor
    pub const DEFAULT_PERSONAL_FACTOR: f64 = 1.0;
}

/// Recovery engine calibration
pub mod recovery {
    pub const HRV_WEIGHT: f64 = 0.30;
    pub const RHR_WEIGHT: f64 = 0.25;
    pub const SLEEP_WEIGHT: f64 = 0.20;
    pub const SLEEP_QUALITY_WEIGHT: f64 = 0.10;
    pub const STRAIN_WEIGHT: f64 = 0.10;
    pub const SUBJECTIVE_WEIGHT: f64 = 0.05;

    /// HRV deviation from baseline median that saturates the component (±20%)
    pub const HRV_SATURATION: f64 = 0.20;

    /// RHR deviation from lowest baseline that saturates the component (±15%)
    pub const RHR_SATURATION: f64 = 0.15;

    /// Component and composite scores never reach 0 or 100
    pub const MIN_SCORE: f64 = 1.0;
    pub const MAX_SCORE: f64 = 99.0;

    /// Score used when an input cannot be compared (no data, zero baseline)
    pub const NEUTRAL_SCORE: f64 = 50.0;

    /// Strain-impact component: `70 - strain × 3.3`
    pub const STRAIN_IMPACT_INTERCEPT: f64 = 70.0;
    pub const STRAIN_IMPACT_SLOPE: f64 = 3.3;

    /// Default nightly sleep target in hours
    pub const DEFAULT_SLEEP_TARGET_HOURS: f64 = 8.0;

    /// Days of history used for HRV/RHR baselines
    pub const DEFAULT_BASELINE_DAYS: u16 = 7;
}

/// Profile defaults used when nothing is configured
pub mod profile {
    pub const DEFAULT_AGE: u8 = 32;
    pub const DEFAULT_RESTING_HR: u16 = 60;
}
