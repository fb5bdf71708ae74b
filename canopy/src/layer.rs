//! Display settings of the feature layer.

use crate::cluster::ClusterConfig;
use crate::predicate::Predicate;

/// Display settings of the feature layer shown on the map.
pub trait LayerDisplay {
    /// Restricts the displayed features to the ones matching the predicate.
    fn set_definition_expression(&mut self, predicate: &Predicate);
    /// Enables clustering with the configuration, or disables it with `None`.
    fn set_feature_reduction(&mut self, reduction: Option<&ClusterConfig>);
    /// Redraws the layer.
    fn refresh(&mut self);
}

/// Layer display settings kept in memory.
#[derive(Debug, Clone, Default)]
pub struct LayerState {
    definition_expression: Option<Predicate>,
    feature_reduction: Option<ClusterConfig>,
    refresh_count: usize,
}

impl LayerState {
    /// Creates a layer displaying all features without clustering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current definition expression. `None` displays every feature.
    pub fn definition_expression(&self) -> Option<&Predicate> {
        self.definition_expression.as_ref()
    }

    /// Current cluster configuration.
    pub fn feature_reduction(&self) -> Option<&ClusterConfig> {
        self.feature_reduction.as_ref()
    }

    /// Number of times the layer was redrawn.
    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }
}

impl LayerDisplay for LayerState {
    fn set_definition_expression(&mut self, predicate: &Predicate) {
        self.definition_expression = Some(predicate.clone());
    }

    fn set_feature_reduction(&mut self, reduction: Option<&ClusterConfig>) {
        self.feature_reduction = reduction.cloned();
    }

    fn refresh(&mut self) {
        self.refresh_count += 1;
    }
}
