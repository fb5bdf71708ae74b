//! Features returned by the feature service.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use canopy_types::Geom;
use serde::{Deserialize, Serialize};

/// Stable identifier of a feature (the service's object id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub i64);

/// Value of a feature attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Missing value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl AttributeValue {
    /// Returns the text if the value is a text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true for the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Number(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// A single mapped entity (a tree or a heritage site).
///
/// Records are owned by the feature source. The search only keeps the records of the latest
/// result set and the selected feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    id: FeatureId,
    attributes: BTreeMap<String, AttributeValue>,
    geometry: Option<Geom>,
}

impl FeatureRecord {
    /// Creates a record without attributes.
    pub fn new(id: FeatureId, geometry: Option<Geom>) -> Self {
        Self {
            id,
            attributes: BTreeMap::new(),
            geometry,
        }
    }

    /// Adds an attribute to the record.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Identifier of the record.
    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Geometry of the record, if it was requested from the service.
    pub fn geometry(&self) -> Option<&Geom> {
        self.geometry.as_ref()
    }

    /// All attributes of the record.
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// Attribute with exactly the given key.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Attribute looked up ignoring ASCII case of the key.
    ///
    /// The service answers with lower-cased keys while queries use the original field casing,
    /// so anything that evaluates query field names against records goes through this method.
    pub fn attribute_ignore_case(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .get(key)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
    }

    /// Display text of the attribute. Empty for missing and null attributes.
    pub fn text(&self, key: &str) -> String {
        self.attribute(key).map(|v| v.to_string()).unwrap_or_default()
    }

    /// Keeps only the attributes named in `fields` (case-insensitively), storing them under
    /// lower-cased keys. `*` keeps everything.
    pub(crate) fn project(&self, fields: &[String], with_geometry: bool) -> Self {
        let keep_all = fields.iter().any(|f| f == "*");
        let attributes = self
            .attributes
            .iter()
            .filter(|(k, _)| keep_all || fields.iter().any(|f| f.eq_ignore_ascii_case(k)))
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();

        Self {
            id: self.id,
            attributes,
            geometry: if with_geometry {
                self.geometry.clone()
            } else {
                None
            },
        }
    }
}
