//! Canopy is the search part of a feature-service map page: cascading area and road filters, a
//! name search, category filters, a sortable result table, and map focus, clustering and buffer
//! tools working on the selected feature.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use canopy::{AppConfig, Command, Dispatcher, Session};
//! use canopy::cluster::PieChartRendererFactory;
//! use canopy::graphics::GraphicsLayer;
//! use canopy::layer::LayerState;
//! use canopy::service::FeatureService;
//! use canopy::view::MapView;
//! use canopy::canopy_types::latlon;
//!
//! # async fn run() -> Result<(), canopy::error::CanopyError> {
//! let config = AppConfig::trees();
//! let source = Arc::new(FeatureService::new(config.layer_url())?);
//! let factory = Arc::new(PieChartRendererFactory::new(config.fields().category.clone()));
//! let session = Session::new(
//!     config,
//!     MapView::new(latlon!(16.4637, 107.5909), 10.0),
//!     GraphicsLayer::new(),
//!     LayerState::new(),
//! );
//!
//! let mut dispatcher = Dispatcher::new(session, source, factory);
//! dispatcher.dispatch(Command::Initialize)?;
//! dispatcher.dispatch(Command::SetName("sao".into()))?;
//! dispatcher.dispatch(Command::Search)?;
//! dispatcher.settle().await;
//!
//! println!("{}", dispatcher.session().results().to_html());
//! # Ok(())
//! # }
//! ```
//!
//! # Main components
//!
//! * [`Session`] holds the state of one page: the [filter selection](filter), the
//!   [results panel](table), the selected feature and the [cluster toggle](cluster). Its methods
//!   are the handlers of the page controls.
//! * Handlers do not talk to the network. Those that need data return a
//!   [`PendingRequest`](session::PendingRequest), and the outcome is applied later with
//!   [`Session::complete`]. Requests are [sequenced](sequence), so a slow response never
//!   replaces the result of a newer request.
//! * The [`Dispatcher`] executes those requests against a [`FeatureSource`](query::FeatureSource)
//!   and feeds the completions back, either step by step or as an event loop over a channel of
//!   [`Command`]s.
//! * Predicates sent to the service are built from [structured clauses](predicate). User input is
//!   escaped in exactly one place when the predicate is serialized.
//! * The map itself is reached through small traits: [`MapNavigator`](focus::MapNavigator),
//!   [`GraphicsOverlay`](focus::GraphicsOverlay) and [`LayerDisplay`](layer::LayerDisplay).
//!   [`MapView`](view::MapView), [`GraphicsLayer`](graphics::GraphicsLayer) and
//!   [`LayerState`](layer::LayerState) implement them in memory.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod buffer;
pub mod cluster;
mod color;
mod config;
pub mod dispatcher;
pub mod error;
pub mod feature;
pub mod filter;
pub mod focus;
pub mod graphics;
pub mod layer;
mod notifier;
pub mod predicate;
pub mod query;
pub mod sequence;
pub mod service;
pub mod session;
pub mod table;
pub mod view;

pub use canopy_types;
pub use color::Color;
pub use config::{AppConfig, FieldMapping, FieldRef};
pub use dispatcher::{Command, Dispatcher};
pub use notifier::{NoticeLog, Notifier};
pub use session::Session;
