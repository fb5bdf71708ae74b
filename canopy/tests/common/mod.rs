#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use canopy::canopy_types::cartesian::{Rect, Size};
use canopy::canopy_types::geo::GeoPoint2d;
use canopy::canopy_types::{latlon, Geom};
use canopy::cluster::PieChartRendererFactory;
use canopy::error::QueryError;
use canopy::feature::{FeatureId, FeatureRecord};
use canopy::graphics::GraphicsLayer;
use canopy::layer::LayerState;
use canopy::predicate::Predicate;
use canopy::query::{FeatureQuery, FeatureSource};
use canopy::service::InMemoryFeatureSource;
use canopy::view::MapView;
use canopy::{AppConfig, Dispatcher, NoticeLog, Session};
use parking_lot::Mutex;
use tokio::sync::oneshot;

pub type TestSession = Session<MapView, GraphicsLayer, LayerState>;
pub type TestDispatcher = Dispatcher<MapView, GraphicsLayer, LayerState>;

pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

fn tree(
    id: i64,
    name: &str,
    category: &str,
    road: &str,
    area: &str,
    at: GeoPoint2d,
) -> FeatureRecord {
    FeatureRecord::new(FeatureId(id), Some(Geom::Point(at)))
        .with_attribute("OBJECTID", id as f64)
        .with_attribute("TenCay", name)
        .with_attribute("LoaiCay", category)
        .with_attribute("TenTuyenDu", road)
        .with_attribute("DiaChi", area)
}

/// Trees around the Hue citadel. Trees 1 to 3 stand within 60 meters of each other.
pub fn trees() -> Vec<FeatureRecord> {
    vec![
        tree(1, "Sao đen", "Cây bóng mát", "Lê Lợi", "Central", latlon!(16.4637, 107.5909)),
        tree(2, "Phượng vĩ", "Cây bóng mát", "Lê Lợi", "Central", latlon!(16.4640, 107.5911)),
        tree(3, "Bằng lăng", "Cây hoa", "Hùng Vương", "Central", latlon!(16.4634, 107.5913)),
        tree(4, "Sao đen", "Cây bóng mát", "Đống Đa", "North", latlon!(16.4750, 107.5800)),
        tree(5, "Muồng hoàng yến", "Cây hoa", "Kim Long", "North", latlon!(16.4760, 107.5700)),
        tree(6, "O'Brien's oak", "Cây cảnh", "Lê Lợi", "Central", latlon!(16.4620, 107.5950)),
    ]
}

pub fn session(notices: &NoticeLog) -> TestSession {
    Session::new(
        AppConfig::trees(),
        MapView::new(latlon!(16.46, 107.59), 10.0).with_size(Size::new(800.0, 600.0)),
        GraphicsLayer::new(),
        LayerState::new(),
    )
    .with_notifier(notices.clone())
}

pub fn renderer_factory() -> Arc<PieChartRendererFactory> {
    Arc::new(PieChartRendererFactory::new(
        AppConfig::trees().fields().category.clone(),
    ))
}

pub fn dispatcher(source: Arc<dyn FeatureSource>, notices: &NoticeLog) -> TestDispatcher {
    Dispatcher::new(session(notices), source, renderer_factory())
}

pub fn memory_source() -> Arc<InMemoryFeatureSource> {
    Arc::new(InMemoryFeatureSource::new(trees()))
}

/// Source holding back the queries with registered predicates until their gate is opened.
pub struct GatedSource {
    inner: InMemoryFeatureSource,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl GatedSource {
    pub fn new(records: Vec<FeatureRecord>) -> Self {
        Self {
            inner: InMemoryFeatureSource::new(records),
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn gate(&self, predicate: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(predicate.to_string(), rx);
        tx
    }
}

#[async_trait]
impl FeatureSource for GatedSource {
    async fn query(&self, query: &FeatureQuery) -> Result<Vec<FeatureRecord>, QueryError> {
        let gate = self.gates.lock().remove(&query.predicate.to_string());
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.inner.query(query).await
    }

    async fn query_extent(&self, predicate: &Predicate) -> Result<Option<Rect>, QueryError> {
        self.inner.query_extent(predicate).await
    }
}

/// Source failing every query that asks for the given out field.
pub struct FailingFieldSource {
    inner: InMemoryFeatureSource,
    field: String,
}

impl FailingFieldSource {
    pub fn new(records: Vec<FeatureRecord>, field: &str) -> Self {
        Self {
            inner: InMemoryFeatureSource::new(records),
            field: field.to_string(),
        }
    }
}

#[async_trait]
impl FeatureSource for FailingFieldSource {
    async fn query(&self, query: &FeatureQuery) -> Result<Vec<FeatureRecord>, QueryError> {
        if query.out_fields == [self.field.clone()] {
            return Err(QueryError::Service {
                code: 500,
                message: "Unable to complete operation.".into(),
            });
        }

        self.inner.query(query).await
    }

    async fn query_extent(&self, _predicate: &Predicate) -> Result<Option<Rect>, QueryError> {
        Err(QueryError::Network("connection reset".into()))
    }
}
