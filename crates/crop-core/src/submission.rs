//! Audit records of validated submissions and the recorder seam.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::FeatureVector;

/// Store-assigned identifier; increases with creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted submission: the raw measurements as entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    #[serde(flatten)]
    pub features: FeatureVector,
}

#[derive(Debug, Error)]
#[error("submission could not be recorded: {source}")]
pub struct RecorderError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl RecorderError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self { source: source.into() }
    }
}

/// Append-only sink for validated submissions.
///
/// Implementations must tolerate concurrent calls from many threads.
pub trait SubmissionRecorder: Send + Sync {
    fn record(&self, features: &FeatureVector) -> Result<SubmissionId, RecorderError>;
}

/// In-process recorder, ids starting at 1.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    rows: Mutex<Vec<FeatureVector>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        let rows = match self.rows.lock() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.iter()
            .enumerate()
            .map(|(i, f)| Submission { id: SubmissionId(i as i64 + 1), features: *f })
            .collect()
    }
}

impl SubmissionRecorder for MemoryRecorder {
    fn record(&self, features: &FeatureVector) -> Result<SubmissionId, RecorderError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| RecorderError::new("memory recorder lock poisoned"))?;
        rows.push(*features);
        Ok(SubmissionId(rows.len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample(n: i64) -> FeatureVector {
        FeatureVector {
            nitrogen: n,
            phosphorus: 40,
            potassium: 40,
            temperature: 25.0,
            humidity: 70.0,
            ph: 6.0,
            rainfall: 100.0,
        }
    }

    #[test]
    fn memory_recorder_assigns_sequential_ids() {
        let r = MemoryRecorder::new();
        assert_eq!(r.record(&sample(1)).unwrap(), SubmissionId(1));
        assert_eq!(r.record(&sample(2)).unwrap(), SubmissionId(2));
        let subs = r.submissions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].features.nitrogen, 2);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let r = Arc::new(MemoryRecorder::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let r = Arc::clone(&r);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        r.record(&sample(t * 50 + i)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(r.submissions().len(), 400);
    }

    #[test]
    fn submission_serializes_flat() {
        let s = Submission { id: SubmissionId(3), features: sample(90) };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["id"], 3);
        assert_eq!(v["nitrogen"], 90);
        assert_eq!(v["rainfall"], 100.0);
    }
}
