//! Loading and validation of the trained model artifact.
//!
//! The artifact is a single JSON document holding the normalization
//! parameters, the cluster centroids and the crop label table. It is read
//! once at startup; any inconsistency is a `ModelError` and the caller is
//! expected to refuse to serve.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::CropCatalog;
use crate::cluster::{Centroid, CentroidSet, ClusterId};
use crate::features::{Feature, FEATURE_COUNT};
use crate::normalize::{FeatureScale, NormalizationParameters, NormalizedVector};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected {expected} normalization entries, found {found}")]
    FeatureCount { expected: usize, found: usize },
    #[error("normalization entry {index} is `{found}`, expected `{expected}`")]
    FeatureOrder {
        index: usize,
        expected: &'static str,
        found: String,
    },
    #[error("normalization mean for {0} is not finite")]
    NonFiniteMean(&'static str),
    #[error("normalization scale for {0} must be finite and non-zero")]
    InvalidScale(&'static str),
    #[error("centroid set is empty")]
    NoCentroids,
    #[error("centroid {id} has {found} coordinates, expected {expected}")]
    CentroidDimension {
        id: ClusterId,
        expected: usize,
        found: usize,
    },
    #[error("centroid {0} has a non-finite coordinate")]
    NonFiniteCentroid(ClusterId),
    #[error("duplicate centroid for cluster {0}")]
    DuplicateCentroid(ClusterId),
    #[error("crop catalog is empty")]
    EmptyCatalog,
    #[error("blank crop label for cluster {0}")]
    BlankLabel(ClusterId),
}

// ── On-disk format ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub features: Vec<FeatureEntry>,
    pub centroids: Vec<CentroidEntry>,
    /// One row per labelled training sample; duplicates are expected.
    pub labels: Vec<LabelRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureEntry {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CentroidEntry {
    pub cluster: ClusterId,
    pub coords: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelRow {
    pub label: String,
    pub cluster_no: ClusterId,
}

// ── Loaded model ──────────────────────────────────────────────────────────────

/// Immutable, validated model shared by every prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub params: NormalizationParameters,
    pub centroids: CentroidSet,
    pub catalog: CropCatalog,
}

impl Model {
    pub fn new(params: NormalizationParameters, centroids: CentroidSet, catalog: CropCatalog) -> Self {
        Self { params, centroids, catalog }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            features = FEATURE_COUNT,
            centroids = model.centroids.len(),
            clusters_labelled = model.catalog.len(),
            labels = model.catalog.labels().len(),
            "model loaded"
        );
        Ok(model)
    }

    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(text)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let params = parse_params(&artifact.features)?;
        let centroids = parse_centroids(&artifact.centroids)?;
        let catalog = CropCatalog::from_rows(
            artifact.labels.iter().map(|row| (row.cluster_no, row.label.as_str())),
        )?;

        for id in centroids.ids() {
            if crate::catalog::crops_for(id, &catalog).is_empty() {
                warn!(cluster = %id, "centroid has no crop labels");
            }
        }
        for id in catalog.clusters() {
            if !centroids.contains(id) {
                warn!(cluster = %id, "crop labels reference a cluster with no centroid");
            }
        }

        Ok(Self::new(params, centroids, catalog))
    }
}

fn parse_params(entries: &[FeatureEntry]) -> Result<NormalizationParameters, ModelError> {
    if entries.len() != FEATURE_COUNT {
        return Err(ModelError::FeatureCount {
            expected: FEATURE_COUNT,
            found: entries.len(),
        });
    }
    let mut scales = [FeatureScale { mean: 0.0, scale: 1.0 }; FEATURE_COUNT];
    for (index, (feature, entry)) in Feature::ALL.iter().zip(entries).enumerate() {
        if entry.name != feature.name() {
            return Err(ModelError::FeatureOrder {
                index,
                expected: feature.name(),
                found: entry.name.clone(),
            });
        }
        scales[index] = FeatureScale { mean: entry.mean, scale: entry.scale };
    }
    NormalizationParameters::new(scales)
}

fn parse_centroids(entries: &[CentroidEntry]) -> Result<CentroidSet, ModelError> {
    let centroids = entries
        .iter()
        .map(|e| {
            let coords: [f64; FEATURE_COUNT] =
                e.coords.as_slice().try_into().map_err(|_| ModelError::CentroidDimension {
                    id: e.cluster,
                    expected: FEATURE_COUNT,
                    found: e.coords.len(),
                })?;
            Ok(Centroid { id: e.cluster, coords: NormalizedVector(coords) })
        })
        .collect::<Result<Vec<_>, ModelError>>()?;
    CentroidSet::new(centroids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> serde_json::Value {
        json!({
            "features": [
                { "name": "nitrogen", "mean": 50.0, "scale": 35.0 },
                { "name": "phosphorus", "mean": 53.0, "scale": 33.0 },
                { "name": "potassium", "mean": 48.0, "scale": 50.0 },
                { "name": "temperature", "mean": 25.6, "scale": 5.0 },
                { "name": "humidity", "mean": 71.5, "scale": 22.0 },
                { "name": "ph", "mean": 6.5, "scale": 0.8 },
                { "name": "rainfall", "mean": 103.0, "scale": 55.0 }
            ],
            "centroids": [
                { "cluster": 1, "coords": [1, 1, 1, 1, 1, 1, 1] },
                { "cluster": 0, "coords": [0, 0, 0, 0, 0, 0, 0] }
            ],
            "labels": [
                { "label": "rice", "cluster_no": 0 },
                { "label": "rice", "cluster_no": 0 },
                { "label": "maize", "cluster_no": 1 }
            ]
        })
    }

    fn load(v: serde_json::Value) -> Result<Model, ModelError> {
        Model::from_json(&v.to_string())
    }

    #[test]
    fn loads_valid_artifact() {
        let m = load(valid()).unwrap();
        assert_eq!(m.centroids.len(), 2);
        assert_eq!(m.centroids.as_slice()[0].id, ClusterId(0));
        assert_eq!(m.params.get(Feature::Ph).scale, 0.8);
        assert_eq!(m.catalog.labels().len(), 2);
    }

    #[test]
    fn shipped_artifact_is_valid() {
        let m = Model::from_json(include_str!("../../../data/model.json")).unwrap();
        assert!(!m.centroids.is_empty());
        for id in m.centroids.ids() {
            assert!(!crate::catalog::crops_for(id, &m.catalog).is_empty());
        }
    }

    #[test]
    fn rejects_zero_scale() {
        let mut v = valid();
        v["features"][5]["scale"] = json!(0.0);
        assert!(matches!(load(v), Err(ModelError::InvalidScale("ph"))));
    }

    #[test]
    fn rejects_misordered_or_missing_features() {
        let mut v = valid();
        v["features"][0]["name"] = json!("N");
        assert!(matches!(load(v), Err(ModelError::FeatureOrder { index: 0, .. })));

        let mut v = valid();
        v["features"].as_array_mut().unwrap().pop();
        assert!(matches!(load(v), Err(ModelError::FeatureCount { expected: 7, found: 6 })));
    }

    #[test]
    fn rejects_bad_centroids() {
        let mut v = valid();
        v["centroids"] = json!([]);
        assert!(matches!(load(v), Err(ModelError::NoCentroids)));

        let mut v = valid();
        v["centroids"][0]["coords"] = json!([1, 2, 3]);
        assert!(matches!(
            load(v),
            Err(ModelError::CentroidDimension { found: 3, .. })
        ));

        let mut v = valid();
        v["centroids"][0]["cluster"] = json!(0);
        assert!(matches!(load(v), Err(ModelError::DuplicateCentroid(ClusterId(0)))));
    }

    #[test]
    fn rejects_empty_catalog() {
        let mut v = valid();
        v["labels"] = json!([]);
        assert!(matches!(load(v), Err(ModelError::EmptyCatalog)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Model::load("/nonexistent/crop-advisor/model.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(Model::from_json("{ not json"), Err(ModelError::Json(_))));
    }
}
