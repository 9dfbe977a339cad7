//! Prediction pipeline: validate → record → normalize → assign → lookup.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::catalog::crops_for;
use crate::cluster::{assign, ClusterId, NoCentroids};
use crate::features::{validate, FeatureVector, ValidationError};
use crate::model::Model;
use crate::normalize::normalize;
use crate::submission::{SubmissionId, SubmissionRecorder};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NoCentroids(#[from] NoCentroids),
}

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub cluster: ClusterId,
    /// Unique crop labels; empty when the cluster has none.
    pub crops: Vec<String>,
    /// `None` when no recorder is attached or recording failed.
    pub submission_id: Option<SubmissionId>,
}

/// Stateless predictor over an immutable model. Cheap to share across
/// threads behind an `Arc`.
pub struct Predictor {
    model: Arc<Model>,
    recorder: Option<Arc<dyn SubmissionRecorder>>,
}

impl Predictor {
    pub fn new(model: Arc<Model>) -> Self {
        Self { model, recorder: None }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn SubmissionRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Run the full pipeline on raw form fields.
    ///
    /// Every input that passes validation is handed to the recorder. A
    /// recorder failure is logged and does not affect the returned crops.
    pub fn predict(&self, raw: &HashMap<String, String>) -> Result<Prediction, PipelineError> {
        let features = validate(raw)?;
        let submission_id = self.record(&features);
        let cluster = self.classify(&features)?;
        let crops = crops_for(cluster, &self.model.catalog).to_vec();
        debug!(cluster = %cluster, crops = crops.len(), "prediction");
        Ok(Prediction { cluster, crops, submission_id })
    }

    /// Normalize and assign an already validated vector.
    pub fn classify(&self, features: &FeatureVector) -> Result<ClusterId, NoCentroids> {
        let nv = normalize(features, &self.model.params);
        assign(&nv, self.model.centroids.as_slice())
    }

    fn record(&self, features: &FeatureVector) -> Option<SubmissionId> {
        let recorder = self.recorder.as_ref()?;
        match recorder.record(features) {
            Ok(id) => {
                info!(id = %id, "submission recorded");
                Some(id)
            }
            Err(err) => {
                error!(event = "recorder_failure", error = %err, "submission not recorded");
                None
            }
        }
    }
}
