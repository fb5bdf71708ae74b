//! Cluster mode: a pie chart renderer prepared from the category distribution of the layer, and
//! the toggle that applies it.

use async_trait::async_trait;
use log::{debug, info};
use maybe_sync::{MaybeSend, MaybeSync};

use crate::color::Color;
use crate::config::FieldRef;
use crate::error::{QueryError, ValidationError};
use crate::layer::LayerDisplay;
use crate::predicate::Predicate;
use crate::query::{FeatureQuery, FeatureSource};

/// Shape of the cluster chart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ChartShape {
    /// Full pie.
    Pie,
    /// Pie with a hole in the middle.
    #[default]
    Donut,
}

/// Slice of the cluster chart: the share of one category in the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    /// Category value.
    pub category: String,
    /// Name of the aggregate field counting the features of the category in a cluster.
    pub field: String,
    /// Slice color.
    pub color: Color,
}

/// Cluster renderer drawing every cluster as a chart of its categories.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRenderer {
    /// Chart shape.
    pub shape: ChartShape,
    /// Field the features are categorized by.
    pub category_field: String,
    /// One slice per category.
    pub slices: Vec<PieSlice>,
    /// Color of features whose category has no slice.
    pub other_color: Color,
}

/// Renderer prepared by a [`ClusterRendererFactory`] with the aggregate fields it uses.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRenderer {
    /// The renderer.
    pub renderer: ClusterRenderer,
    /// Aggregate field names, used by the cluster popup chart.
    pub fields: Vec<String>,
}

/// Popup shown for a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPopup {
    /// Title template. `{cluster_count}` is replaced with the size of the cluster.
    pub title: String,
    /// Caption of the category chart.
    pub caption: String,
    /// Aggregate fields shown in the chart.
    pub fields: Vec<String>,
}

impl ClusterPopup {
    /// Title of the popup of a cluster with `count` features.
    pub fn title_for(&self, count: usize) -> String {
        self.title.replace("{cluster_count}", &count.to_string())
    }
}

/// Complete clustering configuration of the layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Radius in pixels within which points are aggregated.
    pub radius_px: u32,
    /// Renderer of the clusters.
    pub renderer: ClusterRenderer,
    /// Popup of a cluster.
    pub popup: ClusterPopup,
}

impl ClusterConfig {
    /// Assembles the configuration from a prepared renderer.
    pub fn new(
        prepared: PreparedRenderer,
        radius_px: u32,
        title: impl Into<String>,
        caption: impl Into<String>,
    ) -> Self {
        Self {
            radius_px,
            renderer: prepared.renderer,
            popup: ClusterPopup {
                title: title.into(),
                caption: caption.into(),
                fields: prepared.fields,
            },
        }
    }
}

/// Prepares cluster renderers from the data of a feature source.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ClusterRendererFactory: MaybeSend + MaybeSync {
    /// Prepares a renderer for the features of the source.
    async fn prepare(
        &self,
        source: &dyn FeatureSource,
        shape: ChartShape,
    ) -> Result<PreparedRenderer, QueryError>;
}

const PALETTE: [Color; 10] = [
    Color::rgb(0x1B, 0x9E, 0x77),
    Color::rgb(0xD9, 0x5F, 0x02),
    Color::rgb(0x75, 0x70, 0xB3),
    Color::rgb(0xE7, 0x29, 0x8A),
    Color::rgb(0x66, 0xA6, 0x1E),
    Color::rgb(0xE6, 0xAB, 0x02),
    Color::rgb(0xA6, 0x76, 0x1D),
    Color::rgb(0x1F, 0x78, 0xB4),
    Color::rgb(0xB2, 0xDF, 0x8A),
    Color::rgb(0xFB, 0x9A, 0x99),
];

/// Builds a chart renderer with one slice per distinct category of the source.
#[derive(Debug, Clone)]
pub struct PieChartRendererFactory {
    category_field: FieldRef,
    palette: Vec<Color>,
}

impl PieChartRendererFactory {
    /// Creates a factory for the category field.
    pub fn new(category_field: FieldRef) -> Self {
        Self {
            category_field,
            palette: PALETTE.to_vec(),
        }
    }

    /// Sets the slice colors. Colors are reused when there are more categories than colors.
    pub fn with_palette(mut self, palette: Vec<Color>) -> Self {
        if !palette.is_empty() {
            self.palette = palette;
        }
        self
    }

    fn renderer(&self, categories: Vec<String>, shape: ChartShape) -> PreparedRenderer {
        let slices: Vec<PieSlice> = categories
            .into_iter()
            .enumerate()
            .map(|(i, category)| PieSlice {
                field: format!("{}_{}", self.category_field.query, i + 1),
                color: self.palette[i % self.palette.len()],
                category,
            })
            .collect();
        let fields = slices.iter().map(|s| s.field.clone()).collect();

        PreparedRenderer {
            renderer: ClusterRenderer {
                shape,
                category_field: self.category_field.query.clone(),
                slices,
                other_color: Color::GRAY,
            },
            fields,
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ClusterRendererFactory for PieChartRendererFactory {
    async fn prepare(
        &self,
        source: &dyn FeatureSource,
        shape: ChartShape,
    ) -> Result<PreparedRenderer, QueryError> {
        let field = &self.category_field.query;
        let query = FeatureQuery::new(Predicate::match_all())
            .with_out_fields([field.as_str()])
            .with_distinct(true)
            .with_order_by([field.as_str()]);
        let records = source.query(&query).await?;

        let mut categories: Vec<String> = records
            .iter()
            .map(|r| r.text(&self.category_field.result))
            .filter(|c| !c.is_empty())
            .collect();
        categories.dedup();
        if categories.is_empty() {
            return Err(QueryError::Unsupported(format!(
                "no values of {field} to build a chart from"
            )));
        }

        info!("Prepared {shape:?} cluster renderer with {} categories", categories.len());
        Ok(self.renderer(categories, shape))
    }
}

/// State of the cluster mode toggle.
///
/// The toggle control stays disabled until the renderer is prepared, so clustering can never be
/// enabled with a missing renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClusterToggle {
    /// The renderer is being prepared.
    #[default]
    Preparing,
    /// The renderer could not be prepared. Clustering stays off.
    Unavailable(String),
    /// The renderer is ready.
    Ready {
        /// Configuration applied when clustering is on.
        config: ClusterConfig,
        /// Whether clustering is on.
        enabled: bool,
    },
}

impl ClusterToggle {
    /// Returns true if the toggle control can be used.
    pub fn is_control_enabled(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns true if clustering is on.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Ready { enabled: true, .. })
    }

    /// Configuration of the prepared renderer.
    pub fn config(&self) -> Option<&ClusterConfig> {
        match self {
            Self::Ready { config, .. } => Some(config),
            _ => None,
        }
    }

    /// Stores the prepared configuration and enables the control, with clustering off.
    pub fn prepared(&mut self, config: ClusterConfig) {
        *self = Self::Ready {
            config,
            enabled: false,
        };
    }

    /// Marks the renderer as unavailable.
    pub fn failed(&mut self, reason: impl Into<String>) {
        *self = Self::Unavailable(reason.into());
    }

    /// Turns clustering on or off, applying or removing the configuration on the layer and
    /// redrawing it.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        layer: &mut impl LayerDisplay,
    ) -> Result<(), ValidationError> {
        let Self::Ready {
            config,
            enabled: current,
        } = self
        else {
            return Err(ValidationError::ClusterNotReady);
        };

        debug!("Clustering turned {}", if enabled { "on" } else { "off" });
        *current = enabled;
        layer.set_feature_reduction(enabled.then_some(&*config));
        layer.refresh();

        Ok(())
    }
}
