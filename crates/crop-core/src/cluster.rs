//! Nearest-centroid cluster assignment in normalized feature space.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ModelError;
use crate::normalize::NormalizedVector;

/// Identifier of a cluster discovered at training time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u32);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub id: ClusterId,
    pub coords: NormalizedVector,
}

/// Non-empty set of centroids with unique ids and finite coordinates, held
/// in ascending id order.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidSet {
    centroids: Vec<Centroid>,
}

impl CentroidSet {
    pub fn new(mut centroids: Vec<Centroid>) -> Result<Self, ModelError> {
        if centroids.is_empty() {
            return Err(ModelError::NoCentroids);
        }
        centroids.sort_by_key(|c| c.id);
        for pair in centroids.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(ModelError::DuplicateCentroid(pair[0].id));
            }
        }
        if let Some(c) = centroids.iter().find(|c| c.coords.0.iter().any(|v| !v.is_finite())) {
            return Err(ModelError::NonFiniteCentroid(c.id));
        }
        Ok(Self { centroids })
    }

    pub fn as_slice(&self) -> &[Centroid] {
        &self.centroids
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn contains(&self, id: ClusterId) -> bool {
        self.centroids.binary_search_by_key(&id, |c| c.id).is_ok()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.centroids.iter().map(|c| c.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no centroids loaded")]
pub struct NoCentroids;

/// Return the id of the centroid nearest to `nv` (Euclidean).
///
/// Equidistant centroids resolve to the one enumerated first; for a
/// `CentroidSet` that is the lowest id.
pub fn assign(nv: &NormalizedVector, centroids: &[Centroid]) -> Result<ClusterId, NoCentroids> {
    let (first, rest) = centroids.split_first().ok_or(NoCentroids)?;

    // Squared distance preserves the ordering.
    let mut best = first.id;
    let mut best_d2 = squared_distance(nv, &first.coords);
    for c in rest {
        let d2 = squared_distance(nv, &c.coords);
        if d2 < best_d2 {
            best = c.id;
            best_d2 = d2;
        }
    }
    Ok(best)
}

#[inline]
fn squared_distance(a: &NormalizedVector, b: &NormalizedVector) -> f64 {
    a.0.iter().zip(b.0.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
