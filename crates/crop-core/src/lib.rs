//! Crop suggestions from soil and climate measurements.
//!
//! Raw form fields are validated into a [`FeatureVector`], standardized with
//! fixed [`NormalizationParameters`], assigned to the nearest centroid and
//! mapped to crop labels through a [`CropCatalog`]. All model data is loaded
//! once into an immutable [`Model`] and shared read-only.

pub mod catalog;
pub mod cluster;
pub mod features;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod submission;

pub use catalog::{crops_for, CropCatalog};
pub use cluster::{assign, Centroid, CentroidSet, ClusterId, NoCentroids};
pub use features::{validate, Feature, FeatureVector, ValidationError, FEATURE_COUNT};
pub use model::{Model, ModelArtifact, ModelError};
pub use normalize::{normalize, FeatureScale, NormalizationParameters, NormalizedVector};
pub use pipeline::{PipelineError, Prediction, Predictor};
pub use submission::{MemoryRecorder, RecorderError, Submission, SubmissionId, SubmissionRecorder};
