//! Soil/climate feature vector and validation of raw form input.

use std::collections::HashMap;
use std::num::IntErrorKind;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 7;

/// Accepted nitrogen content.
pub const NITROGEN_RANGE: RangeInclusive<i64> = 0..=100;

/// Accepted soil pH.
pub const PH_RANGE: RangeInclusive<f64> = 0.0..=14.0;

// ── Feature identity ──────────────────────────────────────────────────────────

/// One model input. Discriminants follow the order the artifacts were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Ph,
        Feature::Rainfall,
    ];

    /// Canonical name, used by the model artifact and in error reports.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Nitrogen => "nitrogen",
            Feature::Phosphorus => "phosphorus",
            Feature::Potassium => "potassium",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "ph",
            Feature::Rainfall => "rainfall",
        }
    }

    /// Key of the inbound form field carrying this feature.
    pub fn form_key(self) -> &'static str {
        match self {
            Feature::Nitrogen => "N",
            Feature::Phosphorus => "P",
            Feature::Potassium => "K",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "PH",
            Feature::Rainfall => "rainfall",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// ── Feature vector ────────────────────────────────────────────────────────────

/// Raw (un-normalized) measurements for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Nitrogen content, 0-100.
    pub nitrogen: i64,
    pub phosphorus: i64,
    pub potassium: i64,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Soil pH, 0-14.
    pub ph: f64,
    /// Millimetres.
    pub rainfall: f64,
}

impl FeatureVector {
    /// Values as reals, in `Feature::ALL` order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.nitrogen as f64,
            self.phosphorus as f64,
            self.potassium as f64,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }

    /// Render back into the inbound form-field shape.
    pub fn to_form(&self) -> HashMap<String, String> {
        let values = [
            self.nitrogen.to_string(),
            self.phosphorus.to_string(),
            self.potassium.to_string(),
            self.temperature.to_string(),
            self.humidity.to_string(),
            self.ph.to_string(),
            self.rainfall.to_string(),
        ];
        Feature::ALL
            .iter()
            .zip(values)
            .map(|(f, v)| (f.form_key().to_string(), v))
            .collect()
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Field missing or not parseable as its numeric type.
    #[error("missing or malformed value for {0}")]
    MalformedInput(&'static str),
    /// Field parsed but outside its accepted domain.
    #[error("value out of range for {0}")]
    OutOfRange(&'static str),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MalformedInput(f) | ValidationError::OutOfRange(f) => *f,
        }
    }
}

/// Parse and check the seven form fields.
///
/// Nitrogen is checked first, then pH; the remaining fields carry no range
/// check and are parsed in the order phosphorus, potassium, humidity,
/// rainfall, temperature. Surrounding whitespace is ignored.
pub fn validate(raw: &HashMap<String, String>) -> Result<FeatureVector, ValidationError> {
    // An integer too wide for i64 is still an integer, just far out of range.
    let nitrogen = field(raw, Feature::Nitrogen)?.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ValidationError::OutOfRange(Feature::Nitrogen.name())
        }
        _ => ValidationError::MalformedInput(Feature::Nitrogen.name()),
    })?;
    if !NITROGEN_RANGE.contains(&nitrogen) {
        return Err(ValidationError::OutOfRange(Feature::Nitrogen.name()));
    }

    // NaN and infinities fail the range check and are reported as out of range.
    let ph = field(raw, Feature::Ph)?
        .parse::<f64>()
        .map_err(|_| ValidationError::MalformedInput(Feature::Ph.name()))?;
    if !PH_RANGE.contains(&ph) {
        return Err(ValidationError::OutOfRange(Feature::Ph.name()));
    }

    let phosphorus = parse_int(raw, Feature::Phosphorus)?;
    let potassium = parse_int(raw, Feature::Potassium)?;
    let humidity = parse_real(raw, Feature::Humidity)?;
    let rainfall = parse_real(raw, Feature::Rainfall)?;
    let temperature = parse_real(raw, Feature::Temperature)?;

    Ok(FeatureVector {
        nitrogen,
        phosphorus,
        potassium,
        temperature,
        humidity,
        ph,
        rainfall,
    })
}

fn field(raw: &HashMap<String, String>, feature: Feature) -> Result<&str, ValidationError> {
    raw.get(feature.form_key())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MalformedInput(feature.name()))
}

fn parse_int(raw: &HashMap<String, String>, feature: Feature) -> Result<i64, ValidationError> {
    field(raw, feature)?
        .parse::<i64>()
        .map_err(|_| ValidationError::MalformedInput(feature.name()))
}

fn parse_real(raw: &HashMap<String, String>, feature: Feature) -> Result<f64, ValidationError> {
    field(raw, feature)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::MalformedInput(feature.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn rice_like() -> HashMap<String, String> {
        form(&[
            ("N", "90"),
            ("P", "42"),
            ("K", "43"),
            ("temperature", "20.9"),
            ("humidity", "82.0"),
            ("PH", "6.5"),
            ("rainfall", "202.9"),
        ])
    }

    #[test]
    fn accepts_rice_like_profile() {
        let v = validate(&rice_like()).unwrap();
        assert_eq!(v.nitrogen, 90);
        assert_eq!(v.phosphorus, 42);
        assert_eq!(v.potassium, 43);
        assert_eq!(v.temperature, 20.9);
        assert_eq!(v.humidity, 82.0);
        assert_eq!(v.ph, 6.5);
        assert_eq!(v.rainfall, 202.9);
    }

    #[test]
    fn nitrogen_out_of_range_wins_over_other_errors() {
        for n in ["150", "101", "-1", "-500", "100000000000000000000", "-99999999999999999999"] {
            let mut raw = form(&[("N", n), ("PH", "99"), ("P", "x")]);
            assert_eq!(validate(&raw), Err(ValidationError::OutOfRange("nitrogen")), "N={n}");
            raw.extend(rice_like().into_iter().filter(|(k, _)| k != "N"));
            assert_eq!(validate(&raw), Err(ValidationError::OutOfRange("nitrogen")), "N={n}");
        }
    }

    #[test]
    fn ph_out_of_range() {
        for ph in ["15", "14.0001", "-0.1", "NaN", "inf"] {
            let mut raw = rice_like();
            raw.insert("PH".into(), ph.into());
            assert_eq!(validate(&raw), Err(ValidationError::OutOfRange("ph")), "PH={ph}");
        }
    }

    #[test]
    fn range_boundaries_are_inclusive() {
        let mut raw = rice_like();
        raw.insert("N".into(), "0".into());
        raw.insert("PH".into(), "14".into());
        assert!(validate(&raw).is_ok());
        raw.insert("N".into(), "100".into());
        raw.insert("PH".into(), "0".into());
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn unchecked_fields_accept_any_finite_value() {
        let mut raw = rice_like();
        raw.insert("P".into(), "-40".into());
        raw.insert("K".into(), "9000".into());
        raw.insert("humidity".into(), "250.5".into());
        raw.insert("temperature".into(), "-60".into());
        let v = validate(&raw).unwrap();
        assert_eq!(v.phosphorus, -40);
        assert_eq!(v.potassium, 9000);
        assert_eq!(v.temperature, -60.0);
    }

    #[test]
    fn missing_or_unparseable_fields_are_malformed() {
        let mut raw = rice_like();
        raw.remove("K");
        assert_eq!(validate(&raw), Err(ValidationError::MalformedInput("potassium")));

        let mut raw = rice_like();
        raw.insert("N".into(), "12.5".into());
        assert_eq!(validate(&raw), Err(ValidationError::MalformedInput("nitrogen")));

        let mut raw = rice_like();
        raw.insert("PH".into(), "acidic".into());
        assert_eq!(validate(&raw), Err(ValidationError::MalformedInput("ph")));

        let mut raw = rice_like();
        raw.insert("rainfall".into(), "inf".into());
        assert_eq!(validate(&raw), Err(ValidationError::MalformedInput("rainfall")));

        let mut raw = rice_like();
        raw.insert("temperature".into(), "   ".into());
        assert_eq!(validate(&raw), Err(ValidationError::MalformedInput("temperature")));
    }

    #[test]
    fn nitrogen_checked_before_ph() {
        let mut raw = rice_like();
        raw.insert("N".into(), "abc".into());
        raw.insert("PH".into(), "20".into());
        assert_eq!(validate(&raw), Err(ValidationError::MalformedInput("nitrogen")));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let mut raw = rice_like();
        raw.insert("N".into(), " 90 ".into());
        raw.insert("rainfall".into(), "\t202.9\n".into());
        assert_eq!(validate(&raw).unwrap(), validate(&rice_like()).unwrap());
    }

    #[test]
    fn to_form_validates_back_to_same_vector() {
        let v = validate(&rice_like()).unwrap();
        assert_eq!(validate(&v.to_form()).unwrap(), v);
    }
}
