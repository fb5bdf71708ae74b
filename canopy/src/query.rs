//! Queries sent to a feature source.

use async_trait::async_trait;
use canopy_types::cartesian::Rect;
use canopy_types::Geom;
use maybe_sync::{MaybeSend, MaybeSync};

use crate::error::QueryError;
use crate::feature::FeatureRecord;
use crate::predicate::Predicate;

/// Spatial relation between the query geometry and the features.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SpatialRelation {
    /// Features that have at least one common point with the geometry.
    #[default]
    Intersects,
}

/// Spatial constraint of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialFilter {
    /// Geometry to test the features against.
    pub geometry: Geom,
    /// Relation the features must be in.
    pub relation: SpatialRelation,
}

/// Attribute and spatial query.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    /// Attribute filter.
    pub predicate: Predicate,
    /// Fields to return. `*` returns all fields.
    pub out_fields: Vec<String>,
    /// Whether the geometry of the features is returned.
    pub return_geometry: bool,
    /// Whether only distinct combinations of the out fields are returned.
    pub distinct: bool,
    /// Fields the result is ordered by (ascending).
    pub order_by: Vec<String>,
    /// Optional spatial constraint.
    pub spatial: Option<SpatialFilter>,
}

impl FeatureQuery {
    /// Query returning all fields, without geometry, of the features matching the predicate.
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            out_fields: vec!["*".into()],
            return_geometry: false,
            distinct: false,
            order_by: vec![],
            spatial: None,
        }
    }

    /// Sets the fields to return.
    pub fn with_out_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.out_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether the geometry is returned.
    pub fn with_geometry(mut self, return_geometry: bool) -> Self {
        self.return_geometry = return_geometry;
        self
    }

    /// Sets whether only distinct values are returned.
    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Sets the ordering fields.
    pub fn with_order_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the query to features intersecting the geometry.
    pub fn intersecting(mut self, geometry: Geom) -> Self {
        self.spatial = Some(SpatialFilter {
            geometry,
            relation: SpatialRelation::Intersects,
        });
        self
    }
}

/// Remote (or local) source of features.
///
/// Attribute keys of the returned records are lower-cased, the way the feature service returns
/// them.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait FeatureSource: MaybeSend + MaybeSync {
    /// Returns the features matching the query.
    async fn query(&self, query: &FeatureQuery) -> Result<Vec<FeatureRecord>, QueryError>;

    /// Returns the extent of the features matching the predicate, or `None` if there are none.
    async fn query_extent(&self, predicate: &Predicate) -> Result<Option<Rect>, QueryError>;
}
