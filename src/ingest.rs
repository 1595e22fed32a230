//! Daily biometric payload validation
//!
//! Health exports (phone shortcuts, watch sync jobs) post one JSON object per
//! calendar day. Only `date` is required:
//!
//! ```json
//! {
//!   "date": "2025-02-19",
//!   "hrv_ms": 65.2,
//!   "rhr_bpm": 52,
//!   "sleep_hours": 7.5,
//!   "sleep_quality": 4,
//!   "steps": 8500,
//!   "calories_burned": 2800,
//!   "hr_samples": [
//!     { "timestamp": "2025-02-19T06:00:00Z", "bpm": 58, "context": "resting" }
//!   ]
//! }
//! ```
//!
//! This module turns such a payload into an [`IngestRecord`]: the summary
//! fields that were present, an HRV reading row, and the heart rate samples.
//! Storing the record is up to the caller.

use crate::error::IngestError;
use crate::models::HeartRateSample;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Context assigned to samples that arrive without one
pub const DEFAULT_SAMPLE_CONTEXT: &str = "active";

/// HRV measurement kind reported by the exporters
pub const HRV_KIND_SDNN: &str = "sdnn";

const MIN_BPM: u16 = 20;
const MAX_BPM: u16 = 250;

/// Raw payload as posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestPayload {
    /// Calendar day, YYYY-MM-DD
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub hrv_ms: Option<f64>,

    #[serde(default)]
    pub rhr_bpm: Option<f64>,

    #[serde(default)]
    pub sleep_hours: Option<f64>,

    #[serde(default)]
    pub sleep_quality: Option<f64>,

    #[serde(default)]
    pub steps: Option<u32>,

    #[serde(default)]
    pub calories_burned: Option<f64>,

    #[serde(default)]
    pub hr_samples: Vec<IngestSample>,
}

/// Heart rate reading as posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSample {
    pub timestamp: DateTime<Utc>,
    pub bpm: u16,
    #[serde(default)]
    pub context: Option<String>,
}

/// Summary fields to upsert for the day; absent fields are left untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummaryPatch {
    pub date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_ms: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rhr_bpm: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
}

/// HRV reading row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvReading {
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub hrv_ms: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Heart rate sample row, tagged with the context it was recorded in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSample {
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub bpm: u16,
    pub context: String,
}

impl StoredSample {
    pub fn to_sample(&self) -> HeartRateSample {
        HeartRateSample::new(self.timestamp, self.bpm)
    }
}

/// Validated, normalized payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRecord {
    pub date: NaiveDate,
    pub summary: DailySummaryPatch,
    pub hrv_reading: Option<HrvReading>,
    pub samples: Vec<StoredSample>,
}

impl IngestRecord {
    /// Samples in the shape the strain engine takes
    pub fn heart_rate_samples(&self) -> Vec<HeartRateSample> {
        self.samples.iter().map(StoredSample::to_sample).collect()
    }
}

impl IngestPayload {
    /// Parse a payload from a JSON body
    pub fn from_json(body: &str) -> Result<Self, IngestError> {
        serde_json::from_str(body).map_err(|e| IngestError::InvalidJson {
            reason: e.to_string(),
        })
    }

    /// Validate the payload and normalize it into storable rows.
    /// `received_at` stamps the HRV reading.
    pub fn validate(&self, received_at: DateTime<Utc>) -> Result<IngestRecord, IngestError> {
        let date = parse_date(self.date.as_deref())?;

        if let Some(hrv) = self.hrv_ms {
            check_range("hrv_ms", hrv, hrv > 0.0, "> 0")?;
        }
        if let Some(rhr) = self.rhr_bpm {
            check_range(
                "rhr_bpm",
                rhr,
                (f64::from(MIN_BPM)..=f64::from(MAX_BPM)).contains(&rhr),
                "20-250",
            )?;
        }
        if let Some(hours) = self.sleep_hours {
            check_range("sleep_hours", hours, (0.0..=24.0).contains(&hours), "0-24")?;
        }
        if let Some(quality) = self.sleep_quality {
            check_range("sleep_quality", quality, (1.0..=5.0).contains(&quality), "1-5")?;
        }
        if let Some(calories) = self.calories_burned {
            check_range("calories_burned", calories, calories >= 0.0, ">= 0")?;
        }

        let samples = self
            .hr_samples
            .iter()
            .map(|sample| {
                if !(MIN_BPM..=MAX_BPM).contains(&sample.bpm) {
                    return Err(IngestError::OutOfRange {
                        field: "hr_samples.bpm".to_string(),
                        value: sample.bpm.to_string(),
                        expected: "20-250".to_string(),
                    });
                }
                Ok(StoredSample {
                    date,
                    timestamp: sample.timestamp,
                    bpm: sample.bpm,
                    context: sample
                        .context
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SAMPLE_CONTEXT.to_string()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let hrv_reading = self.hrv_ms.map(|hrv_ms| HrvReading {
            date,
            timestamp: received_at,
            hrv_ms,
            kind: HRV_KIND_SDNN.to_string(),
        });

        debug!(
            %date,
            samples = samples.len(),
            has_hrv = hrv_reading.is_some(),
            "Ingest payload validated"
        );

        Ok(IngestRecord {
            date,
            summary: DailySummaryPatch {
                date,
                hrv_ms: self.hrv_ms,
                rhr_bpm: self.rhr_bpm,
                sleep_hours: self.sleep_hours,
                sleep_quality: self.sleep_quality,
                steps: self.steps,
                calories_burned: self.calories_burned,
            },
            hrv_reading,
            samples,
        })
    }
}

/// Accept only the exact `dddd-dd-dd` shape, then require a real date
fn parse_date(value: Option<&str>) -> Result<NaiveDate, IngestError> {
    let invalid = || IngestError::InvalidDate {
        value: value.unwrap_or_default().to_string(),
    };

    let value = value.ok_or_else(invalid)?;
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

fn check_range(field: &str, value: f64, ok: bool, expected: &str) -> Result<(), IngestError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(IngestError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        })
    }
}
