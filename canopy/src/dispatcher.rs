//! Async event loop of a session.
//!
//! The dispatcher runs the handlers of a [`Session`] for incoming [`Command`]s, executes the
//! requests they return against the feature source concurrently, and feeds the completions back
//! into the session in the order they arrive. Out-of-order completions are handled by the
//! session's request sequencing.

use std::sync::Arc;

use canopy_types::cartesian::Point2d;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::debug;
use tokio::sync::mpsc;

use crate::cluster::ClusterRendererFactory;
use crate::error::CanopyError;
use crate::focus::{GraphicsOverlay, MapNavigator};
use crate::layer::LayerDisplay;
use crate::query::FeatureSource;
use crate::session::{
    Completion, CompletionOutcome, CompletionResult, PendingRequest, RequestKind, Session,
};

#[cfg(not(target_arch = "wasm32"))]
type CompletionFuture = futures::future::BoxFuture<'static, Completion>;
#[cfg(target_arch = "wasm32")]
type CompletionFuture = futures::future::LocalBoxFuture<'static, Completion>;

/// User action on the search page.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// The page is loaded.
    Initialize,
    /// The name input changed.
    SetName(String),
    /// An area was selected. Empty string selects all areas.
    SetArea(String),
    /// A road was selected. Empty string selects all roads.
    SetRoad(String),
    /// The checked categories changed.
    SetCategories(Vec<String>),
    /// The search button was clicked.
    Search,
    /// A column header of the result table was clicked.
    SortResults(usize),
    /// A row of the result table was clicked.
    ActivateRow(usize),
    /// The map was clicked at the screen position.
    MapClicked(Point2d),
    /// The cluster checkbox changed.
    SetClusterEnabled(bool),
    /// The buffer button was clicked with the typed distance.
    RequestBuffer(String),
    /// The home button was clicked.
    GoHome,
}

/// Drives a [`Session`] against a feature source.
pub struct Dispatcher<V, G, L> {
    session: Session<V, G, L>,
    source: Arc<dyn FeatureSource>,
    renderer_factory: Arc<dyn ClusterRendererFactory>,
    in_flight: FuturesUnordered<CompletionFuture>,
}

impl<V, G, L> Dispatcher<V, G, L>
where
    V: MapNavigator,
    G: GraphicsOverlay,
    L: LayerDisplay,
{
    /// Creates a new dispatcher.
    pub fn new(
        session: Session<V, G, L>,
        source: Arc<dyn FeatureSource>,
        renderer_factory: Arc<dyn ClusterRendererFactory>,
    ) -> Self {
        Self {
            session,
            source,
            renderer_factory,
            in_flight: FuturesUnordered::new(),
        }
    }

    /// The driven session.
    pub fn session(&self) -> &Session<V, G, L> {
        &self.session
    }

    /// The driven session.
    pub fn session_mut(&mut self) -> &mut Session<V, G, L> {
        &mut self.session
    }

    /// Number of requests that have not completed yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Runs the handler of the command and starts the requests it needs.
    ///
    /// Validation errors are returned after the session has reported them to the user.
    pub fn dispatch(&mut self, command: Command) -> Result<(), CanopyError> {
        debug!("Dispatching {command:?}");
        match command {
            Command::Initialize => {
                for request in self.session.initialize() {
                    self.execute(request);
                }
            }
            Command::SetName(name) => self.session.set_name_filter(&name),
            Command::SetArea(area) => {
                let request = self.session.set_area_filter(&area);
                self.execute(request);
            }
            Command::SetRoad(road) => self.session.set_road_filter(&road),
            Command::SetCategories(categories) => {
                self.session.set_category_filters(categories);
            }
            Command::Search => {
                let request = self.session.search()?;
                self.execute(request);
            }
            Command::SortResults(column) => {
                self.session.sort_results(column)?;
            }
            Command::ActivateRow(row) => self.session.activate_row(row)?,
            Command::MapClicked(position) => {
                self.session.map_clicked(position);
            }
            Command::SetClusterEnabled(enabled) => self.session.set_cluster_enabled(enabled)?,
            Command::RequestBuffer(distance) => {
                let request = self.session.request_buffer(&distance)?;
                self.execute(request);
            }
            Command::GoHome => {
                self.session.go_home();
            }
        }

        Ok(())
    }

    fn execute(&mut self, request: PendingRequest) {
        let PendingRequest { ticket, kind } = request;
        let source = self.source.clone();
        let renderer_factory = self.renderer_factory.clone();

        self.in_flight.push(Box::pin(async move {
            let result = match kind {
                RequestKind::AreaOptions(query)
                | RequestKind::RoadOptions(query)
                | RequestKind::Search(query)
                | RequestKind::BufferIntersect(query) => {
                    CompletionResult::Features(source.query(&query).await)
                }
                RequestKind::HomeExtent(predicate) => {
                    CompletionResult::Extent(source.query_extent(&predicate).await)
                }
                RequestKind::ClusterRenderer(shape) => CompletionResult::Renderer(
                    renderer_factory.prepare(source.as_ref(), shape).await,
                ),
            };

            Completion { ticket, result }
        }));
    }

    /// Waits for the next request to complete and applies it. Returns `None` if nothing is in
    /// flight.
    pub async fn next_completion(&mut self) -> Option<Result<CompletionOutcome, CanopyError>> {
        let completion = self.in_flight.next().await?;
        let outcome = self.session.complete(completion);
        self.execute_follow_ups();

        Some(outcome)
    }

    fn execute_follow_ups(&mut self) {
        for request in self.session.take_follow_ups() {
            self.execute(request);
        }
    }

    /// Waits until all requests in flight complete.
    pub async fn settle(&mut self) {
        while let Some(result) = self.next_completion().await {
            if let Err(err) = result {
                debug!("Request failed: {err}");
            }
        }
    }

    /// Processes commands from the channel until it is closed, then waits for the requests in
    /// flight and returns the session.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Session<V, G, L> {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Err(err) = self.dispatch(command) {
                            debug!("Command rejected: {err}");
                        }
                    }
                    None => break,
                },
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    if let Err(err) = self.session.complete(completion) {
                        debug!("Request failed: {err}");
                    }
                    self.execute_follow_ups();
                }
            }
        }

        self.settle().await;
        self.session
    }
}
