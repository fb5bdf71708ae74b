use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use canopy_types::cartesian::Rect;
use parking_lot::RwLock;

use crate::error::QueryError;
use crate::feature::{AttributeValue, FeatureRecord};
use crate::predicate::Predicate;
use crate::query::{FeatureQuery, FeatureSource, SpatialFilter, SpatialRelation};

/// Feature source that keeps all features in memory and evaluates queries locally.
///
/// Answers queries the same way the feature service does: attribute keys of the result are
/// lower-cased, distinct queries drop identifiers that would make rows unique, and features
/// without geometry never match a spatial filter.
#[derive(Debug, Default)]
pub struct InMemoryFeatureSource {
    records: RwLock<Vec<FeatureRecord>>,
}

impl InMemoryFeatureSource {
    /// Creates a new source with the given features.
    pub fn new(records: Vec<FeatureRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Adds a feature to the source.
    pub fn insert(&self, record: FeatureRecord) {
        self.records.write().push(record);
    }

    /// Number of features in the source.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the source has no features.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn matches_spatial(record: &FeatureRecord, filter: Option<&SpatialFilter>) -> bool {
    let Some(filter) = filter else {
        return true;
    };

    match filter.relation {
        SpatialRelation::Intersects => record
            .geometry()
            .is_some_and(|g| g.intersects(&filter.geometry)),
    }
}

fn compare_values(a: Option<&AttributeValue>, b: Option<&AttributeValue>) -> Ordering {
    match (a, b) {
        (Some(AttributeValue::Number(a)), Some(AttributeValue::Number(b))) => a.total_cmp(b),
        (a, b) => {
            let text = |v: Option<&AttributeValue>| v.map(|v| v.to_string()).unwrap_or_default();
            text(a).cmp(&text(b))
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl FeatureSource for InMemoryFeatureSource {
    async fn query(&self, query: &FeatureQuery) -> Result<Vec<FeatureRecord>, QueryError> {
        let records = self.records.read();
        let mut result: Vec<FeatureRecord> = records
            .iter()
            .filter(|r| query.predicate.matches(r))
            .filter(|r| matches_spatial(r, query.spatial.as_ref()))
            .map(|r| r.project(&query.out_fields, query.return_geometry && !query.distinct))
            .collect();
        drop(records);

        if query.distinct {
            let mut seen = HashSet::new();
            result.retain(|r| {
                let key: Vec<(String, String)> = r
                    .attributes()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect();
                seen.insert(key)
            });
        }

        if !query.order_by.is_empty() {
            result.sort_by(|a, b| {
                query
                    .order_by
                    .iter()
                    .map(|field| {
                        compare_values(
                            a.attribute_ignore_case(field),
                            b.attribute_ignore_case(field),
                        )
                    })
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        log::trace!(
            "In-memory query '{}' matched {} features",
            query.predicate,
            result.len()
        );

        Ok(result)
    }

    async fn query_extent(&self, predicate: &Predicate) -> Result<Option<Rect>, QueryError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| predicate.matches(r))
            .filter_map(|r| r.geometry().and_then(|g| g.bounding_rect()))
            .reduce(|a, b| a.merge(b)))
    }
}
