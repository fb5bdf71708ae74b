//! Feature service REST protocol: `query` request parameters and response decoding.

use std::collections::BTreeMap;

use canopy_types::cartesian::Rect;
use canopy_types::geo::{GeoPoint, GeoPoint2d};
use canopy_types::{Geom, Polygon};
use serde::Deserialize;
use serde_json::json;

use crate::error::QueryError;
use crate::feature::{AttributeValue, FeatureId, FeatureRecord};
use crate::predicate::Predicate;
use crate::query::{FeatureQuery, SpatialRelation};

const WGS84_WKID: u32 = 4326;

/// Request parameters of the layer `query` endpoint for the given query.
///
/// The predicate is serialized here, once, as the `where` parameter.
pub fn query_params(query: &FeatureQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("where", query.predicate.to_string()),
        ("outFields", query.out_fields.join(",")),
        ("returnGeometry", query.return_geometry.to_string()),
        ("outSR", WGS84_WKID.to_string()),
        ("f", "json".to_string()),
    ];

    if query.distinct {
        params.push(("returnDistinctValues", "true".into()));
    }

    if !query.order_by.is_empty() {
        params.push(("orderByFields", query.order_by.join(",")));
    }

    if let Some(filter) = &query.spatial {
        let (geometry_type, geometry) = encode_geometry(&filter.geometry);
        params.push(("geometry", geometry));
        params.push(("geometryType", geometry_type.into()));
        params.push(("inSR", WGS84_WKID.to_string()));
        params.push((
            "spatialRel",
            match filter.relation {
                SpatialRelation::Intersects => "esriSpatialRelIntersects".into(),
            },
        ));
    }

    params
}

fn extent_params(predicate: &Predicate) -> Vec<(&'static str, String)> {
    vec![
        ("where", predicate.to_string()),
        ("returnExtentOnly", "true".into()),
        ("outSR", WGS84_WKID.to_string()),
        ("f", "json".into()),
    ]
}

fn encode_geometry(geometry: &Geom) -> (&'static str, String) {
    match geometry {
        Geom::Point(p) => (
            "esriGeometryPoint",
            json!({"x": p.lon(), "y": p.lat(), "spatialReference": {"wkid": WGS84_WKID}})
                .to_string(),
        ),
        Geom::Polygon(polygon) => {
            let rings: Vec<Vec<[f64; 2]>> = std::iter::once(&polygon.outer_contour)
                .chain(polygon.inner_contours.iter())
                .map(|contour| {
                    let mut ring: Vec<[f64; 2]> =
                        contour.points().iter().map(|p| [p.lon(), p.lat()]).collect();
                    if let Some(first) = ring.first().copied() {
                        ring.push(first);
                    }
                    ring
                })
                .collect();

            (
                "esriGeometryPolygon",
                json!({"rings": rings, "spatialReference": {"wkid": WGS84_WKID}}).to_string(),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureSetResponse {
    error: Option<ServiceError>,
    object_id_field_name: Option<String>,
    #[serde(default)]
    features: Vec<ServiceFeature>,
}

#[derive(Debug, Deserialize)]
struct ServiceFeature {
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
    geometry: Option<ServiceGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServiceGeometry {
    Point { x: f64, y: f64 },
    Polygon { rings: Vec<Vec<Vec<f64>>> },
}

impl ServiceGeometry {
    fn into_geom(self) -> Result<Geom, QueryError> {
        match self {
            ServiceGeometry::Point { x, y } => Ok(Geom::Point(GeoPoint2d::lonlat(x, y))),
            ServiceGeometry::Polygon { rings } => {
                let rings = rings
                    .into_iter()
                    .map(|ring| {
                        ring.into_iter()
                            .map(|coords| match coords[..] {
                                [x, y, ..] => Ok(GeoPoint2d::lonlat(x, y)),
                                _ => Err(QueryError::Decoding(format!(
                                    "invalid coordinates: {coords:?}"
                                ))),
                            })
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Geom::Polygon(Polygon::from_rings(rings)?))
            }
        }
    }
}

fn object_id(
    attributes: &BTreeMap<String, AttributeValue>,
    id_field: Option<&str>,
) -> Option<FeatureId> {
    let id_field = id_field.unwrap_or("objectid");
    attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(id_field))
        .and_then(|(_, v)| match v {
            AttributeValue::Number(n) if n.fract() == 0.0 => Some(FeatureId(*n as i64)),
            _ => None,
        })
}

/// Decodes the JSON body of a `query` response into feature records.
///
/// Features without an object id (distinct value queries) are numbered by their position.
pub fn decode_feature_set(body: &str) -> Result<Vec<FeatureRecord>, QueryError> {
    let response: FeatureSetResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error {
        return Err(QueryError::Service {
            code: error.code,
            message: error.message,
        });
    }

    let id_field = response.object_id_field_name.as_deref();
    response
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let id = object_id(&feature.attributes, id_field).unwrap_or(FeatureId(index as i64));
            let geometry = feature.geometry.map(ServiceGeometry::into_geom).transpose()?;

            Ok(feature
                .attributes
                .into_iter()
                .fold(FeatureRecord::new(id, geometry), |record, (key, value)| {
                    record.with_attribute(key.to_lowercase(), value)
                }))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ServiceExtent {
    xmin: Option<f64>,
    ymin: Option<f64>,
    xmax: Option<f64>,
    ymax: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExtentResponse {
    error: Option<ServiceError>,
    extent: Option<ServiceExtent>,
}

/// Decodes the JSON body of a `returnExtentOnly` response.
///
/// The service reports an empty extent with null (or `NaN`) coordinates, which is returned as
/// `None`.
pub fn decode_extent(body: &str) -> Result<Option<Rect>, QueryError> {
    let response: ExtentResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error {
        return Err(QueryError::Service {
            code: error.code,
            message: error.message,
        });
    }

    let Some(extent) = response.extent else {
        return Ok(None);
    };

    match (extent.xmin, extent.ymin, extent.xmax, extent.ymax) {
        (Some(x_min), Some(y_min), Some(x_max), Some(y_max))
            if [x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite()) =>
        {
            Ok(Some(Rect::new(x_min, y_min, x_max, y_max)))
        }
        _ => Ok(None),
    }
}

#[cfg(all(feature = "http", not(target_arch = "wasm32")))]
pub use http::FeatureService;

#[cfg(all(feature = "http", not(target_arch = "wasm32")))]
mod http {
    use async_trait::async_trait;
    use canopy_types::cartesian::Rect;
    use log::{info, trace};

    use super::{decode_extent, decode_feature_set, extent_params, query_params};
    use crate::error::QueryError;
    use crate::feature::FeatureRecord;
    use crate::predicate::Predicate;
    use crate::query::{FeatureQuery, FeatureSource};

    /// Layer of a remote feature service, queried over HTTP.
    #[derive(Debug, Clone)]
    pub struct FeatureService {
        layer_url: String,
        http_client: reqwest::Client,
    }

    impl FeatureService {
        /// Creates a new service for the layer at `layer_url` (`.../FeatureServer/0`).
        pub fn new(layer_url: impl Into<String>) -> Result<Self, QueryError> {
            let http_client = reqwest::Client::builder()
                .user_agent("canopy/0.1")
                .build()?;

            Ok(Self {
                layer_url: layer_url.into().trim_end_matches('/').to_string(),
                http_client,
            })
        }

        /// URL of the layer.
        pub fn layer_url(&self) -> &str {
            &self.layer_url
        }

        async fn load(&self, params: &[(&'static str, String)]) -> Result<String, QueryError> {
            let url = format!("{}/query", self.layer_url);
            trace!("Querying {url} with {params:?}");

            let response = self.http_client.get(&url).query(params).send().await?;
            if !response.status().is_success() {
                let status = response.status();
                info!("Failed to load {url}: {status}, {:?}", response.text().await);
                return Err(QueryError::Network(format!("{url} returned {status}")));
            }

            Ok(response.text().await?)
        }
    }

    #[async_trait]
    impl FeatureSource for FeatureService {
        async fn query(&self, query: &FeatureQuery) -> Result<Vec<FeatureRecord>, QueryError> {
            let body = self.load(&query_params(query)).await?;
            let features = decode_feature_set(&body)?;
            info!(
                "Loaded {} features from {} for '{}'",
                features.len(),
                self.layer_url,
                query.predicate
            );

            Ok(features)
        }

        async fn query_extent(&self, predicate: &Predicate) -> Result<Option<Rect>, QueryError> {
            let body = self.load(&extent_params(predicate)).await?;
            decode_extent(&body)
        }
    }
}
