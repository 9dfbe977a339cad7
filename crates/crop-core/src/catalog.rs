//! Static cluster → crop label table.

use std::collections::{BTreeMap, BTreeSet};

use crate::cluster::ClusterId;
use crate::model::ModelError;

/// Unique crop labels per cluster, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CropCatalog {
    by_cluster: BTreeMap<ClusterId, Vec<String>>,
}

impl CropCatalog {
    /// Fold label-table rows into the catalog. Labels are trimmed and
    /// duplicates within a cluster collapsed.
    pub fn from_rows<I, S>(rows: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (ClusterId, S)>,
        S: AsRef<str>,
    {
        let mut by_cluster: BTreeMap<ClusterId, Vec<String>> = BTreeMap::new();
        for (cluster, label) in rows {
            let label = label.as_ref().trim();
            if label.is_empty() {
                return Err(ModelError::BlankLabel(cluster));
            }
            let labels = by_cluster.entry(cluster).or_default();
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        }
        if by_cluster.is_empty() {
            return Err(ModelError::EmptyCatalog);
        }
        Ok(Self { by_cluster })
    }

    pub fn clusters(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.by_cluster.keys().copied()
    }

    /// Every label across all clusters.
    pub fn labels(&self) -> BTreeSet<&str> {
        self.by_cluster.values().flatten().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.by_cluster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cluster.is_empty()
    }
}

/// Crops associated with `cluster`; empty when the cluster has no rows.
pub fn crops_for(cluster: ClusterId, catalog: &CropCatalog) -> &[String] {
    catalog.by_cluster.get(&cluster).map(Vec::as_slice).unwrap_or(&[])
}
