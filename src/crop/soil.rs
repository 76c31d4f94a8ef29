//! Soil readings and autofill of missing values

use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};

/// Complete soil reading sent to the crop classifier
///
/// Wire names are upper-case, matching the classifier's feature names.
/// Whole values are written as JSON integers (`90`, not `90.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    #[serde(rename = "N", serialize_with = "whole_as_integer")]
    pub nitrogen: f64,
    #[serde(rename = "P", serialize_with = "whole_as_integer")]
    pub phosphorus: f64,
    #[serde(rename = "K", serialize_with = "whole_as_integer")]
    pub potassium: f64,
    #[serde(rename = "TEMP", serialize_with = "whole_as_integer")]
    pub temperature: f64,
    #[serde(rename = "PH", serialize_with = "whole_as_integer")]
    pub ph: f64,
    #[serde(rename = "RAINFALL", serialize_with = "whole_as_integer")]
    pub rainfall: f64,
}

/// Soil values supplied by the caller; any may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSoilReading {
    #[serde(rename = "N", default)]
    pub nitrogen: Option<f64>,
    #[serde(rename = "P", default)]
    pub phosphorus: Option<f64>,
    #[serde(rename = "K", default)]
    pub potassium: Option<f64>,
    #[serde(rename = "TEMP", default)]
    pub temperature: Option<f64>,
    #[serde(rename = "PH", default)]
    pub ph: Option<f64>,
    #[serde(rename = "RAINFALL", default)]
    pub rainfall: Option<f64>,
}

impl PartialSoilReading {
    /// The caller's temperature, treating zero as missing
    pub fn known_temperature(&self) -> Option<f64> {
        self.temperature.filter(|t| *t != 0.0)
    }

    /// Fill every missing value except temperature with a plausible random one
    ///
    /// Ranges: N 0..=140, P 5..=145, K 5..=205, RAINFALL 20..=298 (integers),
    /// PH 3.5..9.9 rounded to one decimal.
    pub fn complete<R: Rng + ?Sized>(&self, temperature: f64, rng: &mut R) -> SoilReading {
        SoilReading {
            nitrogen: self
                .nitrogen
                .unwrap_or_else(|| f64::from(rng.random_range(0..=140u32))),
            phosphorus: self
                .phosphorus
                .unwrap_or_else(|| f64::from(rng.random_range(5..=145u32))),
            potassium: self
                .potassium
                .unwrap_or_else(|| f64::from(rng.random_range(5..=205u32))),
            temperature,
            ph: self
                .ph
                .unwrap_or_else(|| round_one_decimal(rng.random_range(3.5..9.9))),
            rainfall: self
                .rainfall
                .unwrap_or_else(|| f64::from(rng.random_range(20..=298u32))),
        }
    }
}

/// Temperature used when neither the caller nor the weather service has one
pub fn random_temperature<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    f64::from(rng.random_range(15..=40u32))
}

/// Largest magnitude an `f64` holds without losing integer precision
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
