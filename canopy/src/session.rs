//! Search session: the state of one map page and the handlers of its controls.
//!
//! Handlers never wait for the feature service. A handler that needs remote data returns a
//! [`PendingRequest`]; whoever executes it feeds the outcome back through
//! [`Session::complete`]. Every request carries a [`Ticket`], and a completion is applied only if
//! no newer request of the same slot has been issued since.

use canopy_types::cartesian::{Point2d, Rect};
use log::{debug, error, warn};

use crate::buffer::{parse_buffer_distance, BufferService, GeodesicBufferService, LengthUnit};
use crate::cluster::{ChartShape, ClusterConfig, ClusterToggle, PreparedRenderer};
use crate::config::AppConfig;
use crate::error::{BufferError, CanopyError, QueryError, ValidationError};
use crate::feature::{FeatureId, FeatureRecord};
use crate::filter::FilterController;
use crate::focus::{
    FocusCoordinator, Graphic, GraphicsOverlay, HighlightSymbol, MapNavigator, ViewTarget,
};
use crate::layer::LayerDisplay;
use crate::notifier::Notifier;
use crate::predicate::Predicate;
use crate::query::FeatureQuery;
use crate::sequence::{RequestSlot, Sequencer, Ticket};
use crate::table::{ResultsPanel, SortState};

const SEARCH_FAILED: &str = "Search failed. Please try again.";
const BUFFER_FAILED: &str = "Could not build the buffer for the selected feature.";

/// Remote operation a handler needs.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    /// Distinct area list.
    AreaOptions(FeatureQuery),
    /// Distinct road list.
    RoadOptions(FeatureQuery),
    /// Search results.
    Search(FeatureQuery),
    /// Features intersecting the buffer.
    BufferIntersect(FeatureQuery),
    /// Extent of the features matching the predicate.
    HomeExtent(Predicate),
    /// Cluster renderer preparation.
    ClusterRenderer(ChartShape),
}

/// Request issued by a handler, to be executed against the feature source.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    /// Ticket to complete the request with.
    pub ticket: Ticket,
    /// What to execute.
    pub kind: RequestKind,
}

/// Outcome of an executed request.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResult {
    /// Result of a feature query.
    Features(Result<Vec<FeatureRecord>, QueryError>),
    /// Result of an extent query.
    Extent(Result<Option<Rect>, QueryError>),
    /// Result of a renderer preparation.
    Renderer(Result<PreparedRenderer, QueryError>),
}

/// Executed request.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Ticket of the request.
    pub ticket: Ticket,
    /// Outcome.
    pub result: CompletionResult,
}

/// What [`Session::complete`] did with a completion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The completion was applied.
    Applied,
    /// A newer request of the same slot was issued; the completion was dropped.
    Stale,
}

/// State of a search page and the handlers of its controls.
pub struct Session<V, G, L> {
    config: AppConfig,
    filter: FilterController,
    sequencer: Sequencer,
    results: ResultsPanel,
    selected: Option<FeatureRecord>,
    cluster: ClusterToggle,
    home: Option<Rect>,
    focus: FocusCoordinator,
    buffer_service: Box<dyn BufferService>,
    notifier: Option<Box<dyn Notifier>>,
    follow_ups: Vec<PendingRequest>,
    view: V,
    overlay: G,
    layer: L,
}

impl<V, G, L> Session<V, G, L>
where
    V: MapNavigator,
    G: GraphicsOverlay,
    L: LayerDisplay,
{
    /// Creates a session with an empty filter selection and no results.
    pub fn new(config: AppConfig, view: V, overlay: G, layer: L) -> Self {
        Self {
            filter: FilterController::new(config.fields().clone()),
            sequencer: Sequencer::new(),
            results: ResultsPanel::Empty,
            selected: None,
            cluster: ClusterToggle::Preparing,
            home: None,
            focus: FocusCoordinator::new(config.focus_scale(), config.extent_expand()),
            buffer_service: Box::new(GeodesicBufferService::new(config.buffer_segments())),
            notifier: None,
            follow_ups: vec![],
            config,
            view,
            overlay,
            layer,
        }
    }

    /// Sets the notifier showing validation errors and failures to the user.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// Replaces the geodesic buffer service.
    pub fn with_buffer_service(mut self, service: impl BufferService + 'static) -> Self {
        self.buffer_service = Box::new(service);
        self
    }

    /// Configuration of the session.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Filter selection and option lists.
    pub fn filter(&self) -> &FilterController {
        &self.filter
    }

    /// Content of the results panel.
    pub fn results(&self) -> &ResultsPanel {
        &self.results
    }

    /// Feature selected for the buffer tool.
    pub fn selected_feature(&self) -> Option<&FeatureRecord> {
        self.selected.as_ref()
    }

    /// State of the cluster toggle.
    pub fn cluster(&self) -> &ClusterToggle {
        &self.cluster
    }

    /// Extent the home button returns to, once known.
    pub fn home_extent(&self) -> Option<Rect> {
        self.home
    }

    /// Map view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Map view.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Highlight overlay.
    pub fn overlay(&self) -> &G {
        &self.overlay
    }

    /// Feature layer display.
    pub fn layer(&self) -> &L {
        &self.layer
    }

    fn issue(&mut self, slot: RequestSlot, kind: RequestKind) -> PendingRequest {
        let ticket = self.sequencer.issue(slot);
        debug!("Issued {slot:?} request #{}: {kind:?}", ticket.seq());

        PendingRequest { ticket, kind }
    }

    fn notify(&self, message: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(message);
        }
    }

    fn reject<T>(&self, error: ValidationError) -> Result<T, ValidationError> {
        debug!("Rejected user input: {error}");
        self.notify(&error.to_string());
        Err(error)
    }

    /// Takes the requests issued while applying completions. They are executed like the requests
    /// returned by the handlers.
    pub fn take_follow_ups(&mut self) -> Vec<PendingRequest> {
        std::mem::take(&mut self.follow_ups)
    }

    /// Requests the data the page needs on load: the area and road lists, the home extent and
    /// the cluster renderer.
    pub fn initialize(&mut self) -> Vec<PendingRequest> {
        vec![
            self.issue(
                RequestSlot::AreaOptions,
                RequestKind::AreaOptions(self.filter.area_options_query()),
            ),
            self.issue(
                RequestSlot::RoadOptions,
                RequestKind::RoadOptions(self.filter.road_options_query()),
            ),
            self.issue(
                RequestSlot::HomeExtent,
                RequestKind::HomeExtent(Predicate::match_all()),
            ),
            self.issue(
                RequestSlot::ClusterRenderer,
                RequestKind::ClusterRenderer(ChartShape::Donut),
            ),
        ]
    }

    /// Handles a change of the area list. Returns the request refreshing the road list.
    pub fn set_area_filter(&mut self, area: &str) -> PendingRequest {
        let query = self.filter.set_area_filter(area);
        self.issue(RequestSlot::RoadOptions, RequestKind::RoadOptions(query))
    }

    /// Handles a change of the road list.
    pub fn set_road_filter(&mut self, road: &str) {
        self.filter.set_road_filter(road);
    }

    /// Handles a change of the name input.
    pub fn set_name_filter(&mut self, name: &str) {
        self.filter.set_name_filter(name);
    }

    /// Handles a change of the category checkboxes: only features of the checked categories stay
    /// on the map. Returns the applied predicate.
    pub fn set_category_filters<I, S>(&mut self, categories: I) -> Predicate
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let predicate = self.filter.set_category_filters(categories);
        debug!("Layer definition expression set to '{predicate}'");
        self.layer.set_definition_expression(&predicate);
        predicate
    }

    /// Handles the search button.
    ///
    /// Fails with [`ValidationError::NoCriteria`] if no name, road or area is set.
    pub fn search(&mut self) -> Result<PendingRequest, ValidationError> {
        let predicate = match self.filter.current_predicate() {
            Ok(predicate) => predicate,
            Err(err) => return self.reject(err),
        };

        let query = self.filter.search_query(predicate);
        Ok(self.issue(RequestSlot::Search, RequestKind::Search(query)))
    }

    /// Handles a click on a column header of the result table.
    pub fn sort_results(&mut self, column: usize) -> Result<SortState, ValidationError> {
        match self.results.table_mut() {
            Some(table) => table.sort_by(column),
            None => Err(ValidationError::UnknownColumn(column)),
        }
    }

    /// Handles a click on a row of the result table: highlights the feature, moves the view to it
    /// and selects it for the buffer tool.
    pub fn activate_row(&mut self, row: usize) -> Result<(), ValidationError> {
        let Some(record) = self.results.table().and_then(|t| t.row_record(row)).cloned() else {
            return Err(ValidationError::UnknownRow(row));
        };

        if !self
            .focus
            .focus_record(&mut self.view, &mut self.overlay, &record)
        {
            warn!("Feature {:?} has no geometry to focus on", record.id());
        }
        self.set_selected(record);

        Ok(())
    }

    /// Handles a click on the map: the feature under the cursor, if any, is highlighted and
    /// selected for the buffer tool.
    pub fn map_clicked(&mut self, screen_position: Point2d) -> Option<FeatureId> {
        let hit = self.view.hit_test(screen_position)?;
        let id = hit.id();
        self.select_feature(hit);

        Some(id)
    }

    /// Highlights the feature with its own symbol and selects it for the buffer tool.
    pub fn select_feature(&mut self, record: FeatureRecord) {
        let graphics = record
            .geometry()
            .map(|g| Graphic::new(g.clone(), HighlightSymbol::HitFeature));
        self.focus.replace(&mut self.overlay, graphics);
        self.set_selected(record);
    }

    fn set_selected(&mut self, record: FeatureRecord) {
        debug!("Selected feature {:?}", record.id());
        self.selected = Some(record);
        // Markers of a previous buffer must not be drawn over the new highlight.
        self.sequencer.invalidate(RequestSlot::BufferIntersect);
    }

    /// Handles the cluster checkbox.
    ///
    /// Fails with [`ValidationError::ClusterNotReady`] until the renderer is prepared.
    pub fn set_cluster_enabled(&mut self, enabled: bool) -> Result<(), ValidationError> {
        self.cluster.set_enabled(enabled, &mut self.layer)
    }

    /// Handles the buffer button.
    ///
    /// Draws the buffer around the selected feature, moves the view to it and returns the query
    /// for the features inside. Nothing changes if there is no selected feature or the distance
    /// is not a positive number.
    pub fn request_buffer(&mut self, distance: &str) -> Result<PendingRequest, CanopyError> {
        let Some(selected) = &self.selected else {
            return self.reject(ValidationError::NoFeatureSelected).map_err(CanopyError::from);
        };
        let distance = match parse_buffer_distance(distance) {
            Ok(distance) => distance,
            Err(err) => return self.reject(err).map_err(CanopyError::from),
        };

        let Some(geometry) = selected.geometry().cloned() else {
            error!("Selected feature {:?} has no geometry", selected.id());
            self.notify(BUFFER_FAILED);
            return Err(BufferError::EmptyGeometry.into());
        };

        let buffer = match self
            .buffer_service
            .buffer(&geometry, distance, LengthUnit::Meters)
        {
            Ok(buffer) => buffer,
            Err(err) => {
                error!("Failed to buffer feature {:?}: {err}", selected.id());
                self.notify(BUFFER_FAILED);
                return Err(err.into());
            }
        };

        self.focus.replace(
            &mut self.overlay,
            [
                Graphic::new(buffer.clone(), HighlightSymbol::Buffer),
                Graphic::new(geometry, HighlightSymbol::HitFeature),
            ],
        );
        if let Some(extent) = buffer.bounding_rect() {
            self.view.go_to(self.focus.extent_target(extent));
        }

        // Features hidden by the category filter get no marker.
        let query = FeatureQuery::new(self.filter.restrict_to_categories(Predicate::match_all()))
            .with_geometry(true)
            .intersecting(buffer);
        Ok(self.issue(
            RequestSlot::BufferIntersect,
            RequestKind::BufferIntersect(query),
        ))
    }

    /// Handles the home button: moves the view back to the extent of the layer. Returns false if
    /// the extent is not known yet.
    pub fn go_home(&mut self) -> bool {
        match self.home {
            Some(home) => {
                self.view.go_to(ViewTarget::Extent(home));
                true
            }
            None => false,
        }
    }

    /// Applies the outcome of a request.
    ///
    /// Completions of superseded requests are dropped, whether they succeeded or failed. A failed
    /// request leaves the displayed state as it was and is returned as an error.
    pub fn complete(&mut self, completion: Completion) -> Result<CompletionOutcome, CanopyError> {
        let Completion { ticket, result } = completion;
        let slot = ticket.slot();
        if !self.sequencer.is_current(ticket) {
            debug!("Dropped stale {slot:?} completion #{}", ticket.seq());
            return Ok(CompletionOutcome::Stale);
        }

        match (slot, result) {
            (RequestSlot::AreaOptions, CompletionResult::Features(result)) => {
                let records = result.map_err(|err| {
                    error!("Failed to load the area list: {err}");
                    err
                })?;
                if let Some(query) = self.filter.apply_area_options(&records) {
                    let request =
                        self.issue(RequestSlot::RoadOptions, RequestKind::RoadOptions(query));
                    self.follow_ups.push(request);
                }
            }
            (RequestSlot::RoadOptions, CompletionResult::Features(result)) => {
                let records = result.map_err(|err| {
                    error!("Failed to load the road list: {err}");
                    err
                })?;
                self.filter.apply_road_options(&records);
            }
            (RequestSlot::Search, CompletionResult::Features(result)) => {
                let records = match result {
                    Ok(records) => records,
                    Err(err) => {
                        error!("Search failed: {err}");
                        self.notify(SEARCH_FAILED);
                        return Err(err.into());
                    }
                };
                debug!("Search returned {} features", records.len());
                self.results = ResultsPanel::render(records, self.config.columns());
            }
            (RequestSlot::BufferIntersect, CompletionResult::Features(result)) => {
                let records = result.map_err(|err| {
                    error!("Failed to query features inside the buffer: {err}");
                    err
                })?;
                for geometry in records.into_iter().filter_map(|r| r.geometry().cloned()) {
                    self.overlay
                        .add(Graphic::new(geometry, HighlightSymbol::IntersectingMarker));
                }
            }
            (RequestSlot::HomeExtent, CompletionResult::Extent(result)) => {
                let extent = result.map_err(|err| {
                    error!("Failed to load the layer extent: {err}");
                    err
                })?;
                match extent {
                    Some(extent) => {
                        let home = extent.magnify(self.config.extent_expand());
                        self.home = Some(home);
                        self.view.go_to(ViewTarget::Extent(home));
                    }
                    None => warn!("The layer has no features, home extent is not set"),
                }
            }
            (RequestSlot::ClusterRenderer, CompletionResult::Renderer(result)) => match result {
                Ok(prepared) => {
                    self.cluster.prepared(ClusterConfig::new(
                        prepared,
                        self.config.cluster_radius_px(),
                        self.config.cluster_popup_title(),
                        self.config.cluster_caption(),
                    ));
                }
                Err(err) => {
                    error!("Failed to create the cluster renderer: {err}");
                    self.cluster.failed(err.to_string());
                    return Err(err.into());
                }
            },
            (slot, result) => {
                warn!("Unexpected completion for {slot:?}: {result:?}");
                return Err(QueryError::Unsupported(format!(
                    "completion does not match the {slot:?} request"
                ))
                .into());
            }
        }

        Ok(CompletionOutcome::Applied)
    }
}
