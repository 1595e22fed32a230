use crate::constants::heart_rate::{
    GELLISH_AGE_COEFFICIENT, GELLISH_INTERCEPT, ZONE_HRR_FRACTIONS,
};
use crate::models::{HeartRateZones, HrZone, ZoneRange};

/// Zone calculation utilities and algorithms
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Estimate max heart rate from age with the Gellish formula
    /// (`207 - 0.7 × age`), which tracks measured values better than `220 - age`
    pub fn estimate_max_hr(age: u8) -> u16 {
        round_bpm(GELLISH_INTERCEPT - GELLISH_AGE_COEFFICIENT * f64::from(age))
    }

    /// Max HR to use for a day: the higher of the age estimate and the
    /// highest measured value, when one is known
    pub fn effective_max_hr(age: u8, actual_max_hr: Option<u16>) -> u16 {
        let estimated = Self::estimate_max_hr(age);
        match actual_max_hr {
            Some(actual) => estimated.max(actual),
            None => estimated,
        }
    }

    /// Calculate heart rate zones with the Heart Rate Reserve (Karvonen) method
    ///
    /// Zone threshold = resting HR + HRR × fraction, with HRR = max - resting:
    /// - Z1: 50-60% HRR
    /// - Z2: 60-70% HRR
    /// - Z3: 70-80% HRR
    /// - Z4: 80-90% HRR
    /// - Z5: 90-100% HRR (ends at max HR)
    ///
    /// Every bound is rounded on its own, so adjacent bounds can differ by a
    /// beat. Callers must pass `max_hr > resting_hr`; otherwise the zones
    /// collapse or invert.
    pub fn calculate_hr_zones(max_hr: u16, resting_hr: u16) -> HeartRateZones {
        let resting = f64::from(resting_hr);
        let hrr = f64::from(max_hr) - resting;
        let bound = |fraction: f64| round_bpm(resting + hrr * fraction);

        let [f1, f2, f3, f4, f5] = ZONE_HRR_FRACTIONS;

        HeartRateZones {
            zone1: ZoneRange { min: bound(f1), max: bound(f2) },
            zone2: ZoneRange { min: bound(f2), max: bound(f3) },
            zone3: ZoneRange { min: bound(f3), max: bound(f4) },
            zone4: ZoneRange { min: bound(f4), max: bound(f5) },
            zone5: ZoneRange { min: bound(f5), max: max_hr },
        }
    }

    /// Determine which zone a heart rate falls into, checking from the top down
    pub fn classify_zone(bpm: u16, zones: &HeartRateZones) -> HrZone {
        if bpm >= zones.zone5.min {
            HrZone::Zone5
        } else if bpm >= zones.zone4.min {
            HrZone::Zone4
        } else if bpm >= zones.zone3.min {
            HrZone::Zone3
        } else if bpm >= zones.zone2.min {
            HrZone::Zone2
        } else if bpm >= zones.zone1.min {
            HrZone::Zone1
        } else {
            HrZone::Below
        }
    }
}

fn round_bpm(value: f64) -> u16 {
    // float-to-int `as` saturates, negative or NaN become 0
    value.round() as u16
}
