//! Fixed per-feature standardization: `(x - mean) / scale`.

use serde::{Deserialize, Serialize};

use crate::features::{Feature, FeatureVector, FEATURE_COUNT};
use crate::model::ModelError;

/// Mean and standard deviation learned for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureScale {
    pub mean: f64,
    pub scale: f64,
}

/// A feature vector in normalized space, `Feature::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedVector(pub [f64; FEATURE_COUNT]);

/// Per-feature scaling parameters. Every mean is finite and every scale is
/// finite and non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationParameters {
    scales: [FeatureScale; FEATURE_COUNT],
}

impl NormalizationParameters {
    pub fn new(scales: [FeatureScale; FEATURE_COUNT]) -> Result<Self, ModelError> {
        for (feature, s) in Feature::ALL.iter().zip(&scales) {
            if !s.mean.is_finite() {
                return Err(ModelError::NonFiniteMean(feature.name()));
            }
            if !s.scale.is_finite() || s.scale == 0.0 {
                return Err(ModelError::InvalidScale(feature.name()));
            }
        }
        Ok(Self { scales })
    }

    /// Mean 0, scale 1 for every feature.
    #[cfg(test)]
    pub fn identity() -> Self {
        Self {
            scales: [FeatureScale { mean: 0.0, scale: 1.0 }; FEATURE_COUNT],
        }
    }

    #[inline]
    pub fn get(&self, feature: Feature) -> FeatureScale {
        self.scales[feature.index()]
    }

    /// Map a normalized point back to raw feature space.
    pub fn denormalize(&self, nv: &NormalizedVector) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, s) in self.scales.iter().enumerate() {
            out[i] = nv.0[i] * s.scale + s.mean;
        }
        out
    }
}

/// Standardize `v` with the loaded parameters.
pub fn normalize(v: &FeatureVector, params: &NormalizationParameters) -> NormalizedVector {
    let raw = v.to_array();
    let mut out = [0.0; FEATURE_COUNT];
    for (i, s) in params.scales.iter().enumerate() {
        out[i] = (raw[i] - s.mean) / s.scale;
    }
    NormalizedVector(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> FeatureVector {
        FeatureVector {
            nitrogen: 90,
            phosphorus: 42,
            potassium: 43,
            temperature: 20.9,
            humidity: 82.0,
            ph: 6.5,
            rainfall: 202.9,
        }
    }

    fn params() -> NormalizationParameters {
        let pairs = [
            (50.0, 10.0),
            (50.0, 20.0),
            (40.0, 5.0),
            (25.0, 5.0),
            (70.0, 20.0),
            (6.5, 0.5),
            (100.0, 50.0),
        ];
        NormalizationParameters::new(pairs.map(|(mean, scale)| FeatureScale { mean, scale })).unwrap()
    }

    #[test]
    fn applies_affine_transform_per_feature() {
        let nv = normalize(&sample(), &params());
        let expected = [4.0, -0.4, 0.6, -0.82, 0.6, 0.0, 2.058];
        for (got, want) in nv.0.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn normalize_is_bit_identical_across_calls() {
        let p = params();
        let a = normalize(&sample(), &p);
        let b = normalize(&sample(), &p.clone());
        for (x, y) in a.0.iter().zip(b.0.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn denormalize_inverts_normalize() {
        let p = params();
        let back = p.denormalize(&normalize(&sample(), &p));
        for (got, want) in back.iter().zip(sample().to_array()) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn identity_leaves_values_unchanged() {
        let nv = normalize(&sample(), &NormalizationParameters::identity());
        assert_eq!(nv.0, sample().to_array());
    }

    #[test]
    fn rejects_zero_or_non_finite_scale() {
        let mut scales = [FeatureScale { mean: 0.0, scale: 1.0 }; FEATURE_COUNT];
        scales[3].scale = 0.0;
        assert!(matches!(
            NormalizationParameters::new(scales),
            Err(ModelError::InvalidScale("temperature"))
        ));
        scales[3].scale = f64::NAN;
        assert!(matches!(
            NormalizationParameters::new(scales),
            Err(ModelError::InvalidScale("temperature"))
        ));
        scales[3].scale = 1.0;
        scales[6].mean = f64::INFINITY;
        assert!(matches!(
            NormalizationParameters::new(scales),
            Err(ModelError::NonFiniteMean("rainfall"))
        ));
    }
}
