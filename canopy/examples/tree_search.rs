//! Searches the Hue street tree layer and prints the results.
//!
//! ```text
//! cargo run --example tree_search -- "sao đen" [config.json]
//! ```

use std::sync::Arc;

use anyhow::Context;
use canopy::canopy_types::latlon;
use canopy::cluster::PieChartRendererFactory;
use canopy::graphics::GraphicsLayer;
use canopy::layer::LayerState;
use canopy::service::FeatureService;
use canopy::view::MapView;
use canopy::{AppConfig, Command, Dispatcher, Notifier, Session};

struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "sao".to_string());
    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {path}"))?;
            AppConfig::from_json(&json)?
        }
        None => AppConfig::trees(),
    };

    let source = Arc::new(FeatureService::new(config.layer_url())?);
    let factory = Arc::new(PieChartRendererFactory::new(
        config.fields().category.clone(),
    ));
    let session = Session::new(
        config,
        MapView::new(latlon!(16.4637, 107.5909), 10.0),
        GraphicsLayer::new(),
        LayerState::new(),
    )
    .with_notifier(StderrNotifier);

    let mut dispatcher = Dispatcher::new(session, source, factory);
    dispatcher.dispatch(Command::Initialize)?;
    dispatcher.settle().await;

    let filter = dispatcher.session().filter();
    println!("Areas: {}", filter.area_options().values().join(", "));
    println!("Roads: {}", filter.road_options().values().len());

    dispatcher.dispatch(Command::SetName(name))?;
    dispatcher.dispatch(Command::Search)?;
    dispatcher.settle().await;

    let Some(table) = dispatcher.session().results().table() else {
        println!("No matches found");
        return Ok(());
    };

    println!("{}", table.headers().join(" | "));
    for row in table.rows() {
        println!("{}", row.join(" | "));
    }

    if table.row_count() > 0 {
        dispatcher.dispatch(Command::ActivateRow(0))?;
        dispatcher.dispatch(Command::RequestBuffer("100".into()))?;
        dispatcher.settle().await;
        let overlay = dispatcher.session().overlay();
        println!("Graphics on the map: {}", overlay.graphics().len());
    }

    Ok(())
}
