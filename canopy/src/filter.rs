//! Filter state: the name, area, road and category selections and the predicates derived from
//! them.

use log::debug;

use crate::config::FieldMapping;
use crate::error::ValidationError;
use crate::feature::FeatureRecord;
use crate::predicate::{Clause, Predicate};
use crate::query::FeatureQuery;

/// Placeholder of the area list, selecting every area.
pub const ALL_AREAS: &str = "All Areas";
/// Placeholder of the road list, selecting every road.
pub const ALL_ROADS: &str = "All Roads";

/// Options of a drop-down list: a placeholder standing for "no constraint" followed by sorted,
/// distinct, non-empty values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOptions {
    placeholder: String,
    values: Vec<String>,
}

impl SelectOptions {
    /// Creates a list with only the placeholder.
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            values: vec![],
        }
    }

    /// Text of the "no constraint" option.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Selectable values, without the placeholder.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns true if the value is one of the options.
    pub fn contains(&self, value: &str) -> bool {
        self.values.binary_search_by(|v| v.as_str().cmp(value)).is_ok()
    }

    /// Replaces the values. Empty values are skipped, the rest is sorted and de-duplicated.
    pub fn replace(&mut self, values: impl IntoIterator<Item = String>) {
        let mut values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        values.sort();
        values.dedup();
        self.values = values;
    }
}

/// Current filter selection. Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// Name substring, as typed.
    pub name: String,
    /// Selected area.
    pub area: String,
    /// Selected road.
    pub road: String,
    /// Checked categories, in checking order.
    pub categories: Vec<String>,
}

/// Owns the filter selection and the area/road option lists, and derives predicates and queries
/// from them.
#[derive(Debug, Clone)]
pub struct FilterController {
    fields: FieldMapping,
    selection: FilterSelection,
    areas: SelectOptions,
    roads: SelectOptions,
    category_filter: Option<Predicate>,
}

impl FilterController {
    /// Creates a controller with an empty selection.
    pub fn new(fields: FieldMapping) -> Self {
        Self {
            fields,
            selection: FilterSelection::default(),
            areas: SelectOptions::new(ALL_AREAS),
            roads: SelectOptions::new(ALL_ROADS),
            category_filter: None,
        }
    }

    /// Fields the predicates are built on.
    pub fn fields(&self) -> &FieldMapping {
        &self.fields
    }

    /// Current selection.
    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// Options of the area list.
    pub fn area_options(&self) -> &SelectOptions {
        &self.areas
    }

    /// Options of the road list.
    pub fn road_options(&self) -> &SelectOptions {
        &self.roads
    }

    /// Query for the distinct areas of the layer.
    pub fn area_options_query(&self) -> FeatureQuery {
        Self::distinct_values_query(Predicate::match_all(), &self.fields.area.query)
    }

    /// Query for the distinct roads of the selected area, or of the whole layer if no area is
    /// selected.
    pub fn road_options_query(&self) -> FeatureQuery {
        let predicate = if self.selection.area.is_empty() {
            Predicate::match_all()
        } else {
            Predicate::from(Clause::equals(
                self.fields.area.query.clone(),
                self.selection.area.clone(),
            ))
        };

        Self::distinct_values_query(predicate, &self.fields.road.query)
    }

    fn distinct_values_query(predicate: Predicate, field: &str) -> FeatureQuery {
        FeatureQuery::new(predicate)
            .with_out_fields([field])
            .with_distinct(true)
            .with_order_by([field])
    }

    /// Records the area constraint and clears the road selection. Returns the query refreshing
    /// the road list for the new area.
    pub fn set_area_filter(&mut self, area: &str) -> FeatureQuery {
        debug!("Area filter set to '{area}'");
        self.selection.area = area.to_string();
        self.selection.road.clear();
        self.road_options_query()
    }

    /// Records the road constraint.
    pub fn set_road_filter(&mut self, road: &str) {
        self.selection.road = road.to_string();
    }

    /// Records the name substring.
    pub fn set_name_filter(&mut self, name: &str) {
        self.selection.name = name.to_string();
    }

    /// Records the checked categories and returns the predicate of the displayed features.
    pub fn set_category_filters<I, S>(&mut self, categories: I) -> Predicate
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected: Vec<String> = vec![];
        for category in categories.into_iter().map(Into::into) {
            if !selected.contains(&category) {
                selected.push(category);
            }
        }

        self.selection.categories = selected;
        let predicate = self.build_category_predicate(&self.selection.categories);
        self.category_filter = Some(predicate.clone());
        predicate
    }

    /// Predicate of the checked categories. `None` until the checkboxes are first changed.
    pub fn category_filter(&self) -> Option<&Predicate> {
        self.category_filter.as_ref()
    }

    /// Restricts the predicate to the features of the checked categories, the ones displayed on
    /// the map.
    pub fn restrict_to_categories(&self, predicate: Predicate) -> Predicate {
        match &self.category_filter {
            Some(categories) => categories
                .clauses()
                .iter()
                .cloned()
                .fold(predicate, Predicate::and),
            None => predicate,
        }
    }

    /// Builds the search predicate: a case-insensitive substring clause for the trimmed name,
    /// then exact clauses for the road and the area, each only if set.
    ///
    /// Fails with [`ValidationError::NoCriteria`] if none of them is set.
    pub fn build_predicate(
        &self,
        name: &str,
        road: &str,
        area: &str,
    ) -> Result<Predicate, ValidationError> {
        let name = name.trim();
        let mut clauses = vec![];
        if !name.is_empty() {
            clauses.push(Clause::contains_ignore_case(
                self.fields.name.query.clone(),
                name,
            ));
        }
        if !road.is_empty() {
            clauses.push(Clause::equals(self.fields.road.query.clone(), road));
        }
        if !area.is_empty() {
            clauses.push(Clause::equals(self.fields.area.query.clone(), area));
        }

        if clauses.is_empty() {
            return Err(ValidationError::NoCriteria);
        }

        Ok(clauses.into_iter().collect())
    }

    /// Search predicate of the current selection.
    pub fn current_predicate(&self) -> Result<Predicate, ValidationError> {
        let FilterSelection {
            name, road, area, ..
        } = &self.selection;
        self.build_predicate(name, road, area)
    }

    /// Predicate of the features displayed for the checked categories. No checked category
    /// displays nothing.
    pub fn build_category_predicate(&self, categories: &[String]) -> Predicate {
        Predicate::from(Clause::in_list(
            self.fields.category.query.clone(),
            categories.iter().cloned(),
        ))
    }

    /// Search query for the predicate, returning the filter fields and the geometry. Only
    /// features of the checked categories are found.
    pub fn search_query(&self, predicate: Predicate) -> FeatureQuery {
        FeatureQuery::new(self.restrict_to_categories(predicate))
            .with_out_fields(self.fields.query_fields())
            .with_geometry(true)
    }

    /// Fills the area list from the result of [`FilterController::area_options_query`].
    ///
    /// A selected area that is not in the new list is cleared, together with the road. The road
    /// list then no longer matches the selection, so the query refreshing it is returned.
    pub fn apply_area_options(&mut self, records: &[FeatureRecord]) -> Option<FeatureQuery> {
        let key = &self.fields.area.result;
        self.areas.replace(records.iter().map(|r| r.text(key)));
        if self.selection.area.is_empty() || self.areas.contains(&self.selection.area) {
            return None;
        }

        debug!("Selected area '{}' is no longer listed", self.selection.area);
        Some(self.set_area_filter(""))
    }

    /// Fills the road list from the result of [`FilterController::road_options_query`]. A selected
    /// road that is not in the new list is cleared.
    pub fn apply_road_options(&mut self, records: &[FeatureRecord]) {
        let key = &self.fields.road.result;
        self.roads.replace(records.iter().map(|r| r.text(key)));
        if !self.selection.road.is_empty() && !self.roads.contains(&self.selection.road) {
            self.selection.road.clear();
        }
    }
}
