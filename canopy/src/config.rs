//! Application configuration.
//!
//! One configuration drives every variant of the application: the tree map and the heritage
//! site map differ only in the layer URL, the field names and the table columns.

use serde::{Deserialize, Serialize};

use crate::error::CanopyError;
use crate::table::Column;

const HUE_SERVICE_URL: &str = concat!(
    "https://gishue.hue.gov.vn/server/rest/services",
    "/BanDoDuLich_HueCIT/CayXanh_CQ_DuLich/FeatureServer"
);

/// Name of a feature attribute.
///
/// The service expects the original casing of the field in queries (`TenCay`) but answers with
/// lower-cased attribute keys (`tencay`). Both are kept separately and neither is derived from
/// the other at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Field name used in predicates, out fields and ordering.
    pub query: String,
    /// Attribute key used when reading query results.
    pub result: String,
}

impl FieldRef {
    /// Creates a field reference reading results from the lower-cased field name.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            result: query.to_lowercase(),
            query,
        }
    }

    /// Sets the attribute key used to read results.
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = result.into();
        self
    }
}

/// Fields used by the filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Name of the feature, searched by substring.
    pub name: FieldRef,
    /// Category of the feature, filtered by the category checkboxes.
    pub category: FieldRef,
    /// Road the feature is located at.
    pub road: FieldRef,
    /// Area the feature is located in.
    pub area: FieldRef,
}

impl FieldMapping {
    /// Field names of the search result query, in query casing.
    pub fn query_fields(&self) -> Vec<String> {
        [&self.name, &self.category, &self.road, &self.area]
            .into_iter()
            .map(|f| f.query.clone())
            .collect()
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            name: FieldRef::new("TenCay"),
            category: FieldRef::new("LoaiCay"),
            road: FieldRef::new("TenTuyenDu"),
            area: FieldRef::new("DiaChi"),
        }
    }
}

/// Configuration of a search session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    layer_url: String,
    fields: FieldMapping,
    columns: Vec<Column>,
    focus_scale: f64,
    extent_expand: f64,
    cluster_radius_px: u32,
    buffer_segments: usize,
    cluster_popup_title: String,
    cluster_caption: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::trees()
    }
}

impl AppConfig {
    /// Tree layer of the Hue city service.
    pub fn trees() -> Self {
        Self {
            layer_url: format!("{HUE_SERVICE_URL}/0"),
            fields: FieldMapping::default(),
            columns: vec![
                Column::new("Tên Cây", "tencay"),
                Column::new("Loại Cây", "loaicay"),
                Column::new("Tuyến Đường", "tentuyendu"),
                Column::new("Khu vực", "diachi"),
            ],
            focus_scale: 2000.0,
            extent_expand: 1.2,
            cluster_radius_px: 80,
            buffer_segments: 64,
            cluster_popup_title: "{cluster_count} trees".into(),
            cluster_caption: "Tree type distribution".into(),
        }
    }

    /// Heritage site layer of the Hue city service.
    pub fn heritage_sites() -> Self {
        Self {
            layer_url: format!("{HUE_SERVICE_URL}/1"),
            fields: FieldMapping {
                name: FieldRef::new("TenDiTich"),
                ..FieldMapping::default()
            },
            columns: vec![
                Column::new("Tên Di Tích", "tenditich"),
                Column::new("Diện Tích", "dientich"),
                Column::new("Khu vực", "diachi"),
            ],
            cluster_popup_title: "{cluster_count} sites".into(),
            cluster_caption: "Site type distribution".into(),
            ..Self::trees()
        }
    }

    /// Loads configuration from JSON. Missing keys take the values of [`AppConfig::trees`].
    pub fn from_json(json: &str) -> Result<Self, CanopyError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| CanopyError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CanopyError> {
        if self.columns.is_empty() {
            return Err(CanopyError::Config("no result columns".into()));
        }
        if self.focus_scale.is_nan() || self.focus_scale <= 0.0 {
            return Err(CanopyError::Config(format!(
                "focus scale must be positive, got {}",
                self.focus_scale
            )));
        }
        if self.extent_expand.is_nan() || self.extent_expand < 1.0 {
            return Err(CanopyError::Config(format!(
                "extent expansion must be at least 1, got {}",
                self.extent_expand
            )));
        }

        Ok(())
    }

    /// URL of the feature service layer.
    pub fn layer_url(&self) -> &str {
        &self.layer_url
    }

    /// Sets the URL of the feature service layer.
    pub fn with_layer_url(mut self, url: impl Into<String>) -> Self {
        self.layer_url = url.into();
        self
    }

    /// Fields used by the filters.
    pub fn fields(&self) -> &FieldMapping {
        &self.fields
    }

    /// Sets the fields used by the filters.
    pub fn with_fields(mut self, fields: FieldMapping) -> Self {
        self.fields = fields;
        self
    }

    /// Columns of the result table.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Sets the columns of the result table.
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Map scale used when focusing a point feature.
    pub fn focus_scale(&self) -> f64 {
        self.focus_scale
    }

    /// Sets map scale used when focusing a point feature.
    pub fn with_focus_scale(mut self, scale: f64) -> Self {
        self.focus_scale = scale;
        self
    }

    /// Sets map scale used when focusing a point feature.
    pub fn set_focus_scale(&mut self, scale: f64) {
        self.focus_scale = scale;
    }

    /// Factor the extents are expanded by before the map is fit to them.
    pub fn extent_expand(&self) -> f64 {
        self.extent_expand
    }

    /// Sets factor the extents are expanded by before the map is fit to them.
    pub fn with_extent_expand(mut self, factor: f64) -> Self {
        self.extent_expand = factor;
        self
    }

    /// Sets factor the extents are expanded by before the map is fit to them.
    pub fn set_extent_expand(&mut self, factor: f64) {
        self.extent_expand = factor;
    }

    /// Cluster radius in screen pixels.
    pub fn cluster_radius_px(&self) -> u32 {
        self.cluster_radius_px
    }

    /// Sets cluster radius in screen pixels.
    pub fn with_cluster_radius_px(mut self, radius: u32) -> Self {
        self.cluster_radius_px = radius;
        self
    }

    /// Number of segments of a buffer circle.
    pub fn buffer_segments(&self) -> usize {
        self.buffer_segments
    }

    /// Sets number of segments of a buffer circle.
    pub fn with_buffer_segments(mut self, segments: usize) -> Self {
        self.buffer_segments = segments;
        self
    }

    /// Title template of the cluster popup.
    pub fn cluster_popup_title(&self) -> &str {
        &self.cluster_popup_title
    }

    /// Caption of the category chart of the cluster popup.
    pub fn cluster_caption(&self) -> &str {
        &self.cluster_caption
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn field_casing() {
        let fields = FieldMapping::default();
        assert_eq!(fields.name.query, "TenCay");
        assert_eq!(fields.name.result, "tencay");
        assert_eq!(fields.road.result, "tentuyendu");
        assert_eq!(
            fields.query_fields(),
            vec!["TenCay", "LoaiCay", "TenTuyenDu", "DiaChi"]
        );
    }

    #[test]
    fn presets() {
        let trees = AppConfig::trees();
        assert!(trees.layer_url().ends_with("FeatureServer/0"));
        assert_eq!(trees.columns().len(), 4);
        assert_eq!(trees.focus_scale(), 2000.0);

        let sites = AppConfig::heritage_sites();
        assert!(sites.layer_url().ends_with("FeatureServer/1"));
        assert_eq!(sites.fields().name.query, "TenDiTich");
        assert_eq!(sites.fields().area, trees.fields().area);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(
            r#"{"layer_url": "http://localhost/FeatureServer/0", "focus_scale": 5000}"#,
        )
        .unwrap();

        assert_eq!(config.layer_url(), "http://localhost/FeatureServer/0");
        assert_eq!(config.focus_scale(), 5000.0);
        assert_eq!(config.extent_expand(), 1.2);
        assert_eq!(config.columns(), AppConfig::trees().columns());
    }

    #[test]
    fn invalid_json() {
        assert_matches!(AppConfig::from_json("{"), Err(CanopyError::Config(_)));
        assert_matches!(
            AppConfig::from_json(r#"{"columns": []}"#),
            Err(CanopyError::Config(_))
        );
        assert_matches!(
            AppConfig::from_json(r#"{"extent_expand": 0.5}"#),
            Err(CanopyError::Config(_))
        );
    }
}
