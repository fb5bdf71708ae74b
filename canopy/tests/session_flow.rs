mod common;

use approx::assert_abs_diff_eq;
use assert_matches::assert_matches;
use canopy::canopy_types::cartesian::{CartesianPoint2d, Point2d};
use canopy::canopy_types::geo::GeoPoint;
use canopy::canopy_types::latlon;
use canopy::error::{CanopyError, ValidationError};
use canopy::feature::FeatureId;
use canopy::focus::HighlightSymbol;
use canopy::sequence::RequestSlot;
use canopy::session::CompletionOutcome;
use canopy::table::ResultsPanel;
use canopy::{Command, NoticeLog};
use common::*;

const ALL_ROADS: [&str; 4] = ["Hùng Vương", "Kim Long", "Lê Lợi", "Đống Đa"];

#[tokio::test]
async fn area_selection_reloads_roads() {
    init_logger();
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::Initialize).unwrap();
    dispatcher.settle().await;

    let filter = dispatcher.session().filter();
    assert_eq!(filter.area_options().values(), ["Central", "North"]);
    assert_eq!(filter.road_options().values(), ALL_ROADS);

    dispatcher.dispatch(Command::SetArea("Central".into())).unwrap();
    dispatcher.settle().await;
    assert_eq!(
        dispatcher.session().filter().road_options().values(),
        ["Hùng Vương", "Lê Lợi"]
    );

    dispatcher.dispatch(Command::SetArea(String::new())).unwrap();
    dispatcher.settle().await;
    assert_eq!(
        dispatcher.session().filter().road_options().values(),
        ALL_ROADS
    );
}

#[tokio::test]
async fn search_renders_sortable_table() {
    init_logger();
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::SetArea("Central".into())).unwrap();
    dispatcher.dispatch(Command::SetRoad("Lê Lợi".into())).unwrap();
    dispatcher.settle().await;
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;

    let table = dispatcher.session().results().table().unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(
        table.headers(),
        vec!["Tên Cây", "Loại Cây", "Tuyến Đường", "Khu vực"]
    );

    dispatcher.dispatch(Command::SortResults(0)).unwrap();
    dispatcher.dispatch(Command::SortResults(0)).unwrap();
    let table = dispatcher.session().results().table().unwrap();
    let names: Vec<&str> = table.rows().map(|row| row[0].as_str()).collect();
    assert_eq!(names, vec!["Sao đen", "Phượng vĩ", "O'Brien's oak"]);
    assert_eq!(table.headers()[0], "Tên Cây ▼");

    // The activated row is the one displayed after sorting.
    dispatcher.dispatch(Command::ActivateRow(2)).unwrap();
    let session = dispatcher.session();
    assert_eq!(session.selected_feature().map(|f| f.id()), Some(FeatureId(6)));
    assert_eq!(session.overlay().graphics().len(), 1);
    assert_eq!(
        session.overlay().graphics()[0].symbol,
        HighlightSymbol::SelectedMarker
    );
    assert_abs_diff_eq!(session.view().scale(), 2000.0, epsilon = 1e-6);
    assert_abs_diff_eq!(session.view().center().lat(), 16.4620, epsilon = 1e-9);
}

#[tokio::test]
async fn quoted_name_is_searched_literally() {
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::SetName(" o'brien ".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;

    let table = dispatcher.session().results().table().unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.row_record(0).map(|r| r.id()), Some(FeatureId(6)));
}

#[tokio::test]
async fn empty_search_result() {
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::SetName("baobab".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;

    assert_eq!(dispatcher.session().results(), &ResultsPanel::NoMatches);
    assert_eq!(
        dispatcher.session().results().to_html(),
        "<p>No matches found</p>"
    );
}

#[tokio::test]
async fn search_without_criteria() {
    let notices = NoticeLog::new();
    let mut dispatcher = dispatcher(memory_source(), &notices);

    assert_matches!(
        dispatcher.dispatch(Command::Search),
        Err(CanopyError::Validation(ValidationError::NoCriteria))
    );
    assert_eq!(dispatcher.in_flight(), 0);
    assert_eq!(notices.messages().len(), 1);
}

#[test]
fn buffer_without_selection() {
    let notices = NoticeLog::new();
    let mut session = session(&notices);
    let center = session.view().center();
    let resolution = session.view().resolution();

    assert_matches!(
        session.request_buffer("100"),
        Err(CanopyError::Validation(ValidationError::NoFeatureSelected))
    );
    assert!(session.overlay().is_empty());
    assert_eq!(session.view().center(), center);
    assert_eq!(session.view().resolution(), resolution);
    assert_eq!(
        notices.last().as_deref(),
        Some("Please click a tree on the map first.")
    );
}

#[tokio::test]
async fn buffer_with_invalid_distance_changes_nothing() {
    let notices = NoticeLog::new();
    let mut dispatcher = dispatcher(memory_source(), &notices);
    dispatcher.dispatch(Command::SetName("sao".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;
    dispatcher.dispatch(Command::ActivateRow(0)).unwrap();
    let graphics = dispatcher.session().overlay().graphics().to_vec();

    for distance in ["", "abc", "0", "-20"] {
        assert_matches!(
            dispatcher.dispatch(Command::RequestBuffer(distance.into())),
            Err(CanopyError::Validation(_))
        );
    }
    assert_eq!(dispatcher.session().overlay().graphics(), graphics.as_slice());
    assert_eq!(dispatcher.in_flight(), 0);
    assert_eq!(notices.messages().len(), 4);
}

#[tokio::test]
async fn buffer_highlights_features_inside() {
    init_logger();
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::SetName("Sao đen".into())).unwrap();
    dispatcher.dispatch(Command::SetArea("Central".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;
    dispatcher.dispatch(Command::ActivateRow(0)).unwrap();
    assert_eq!(
        dispatcher.session().selected_feature().map(|f| f.id()),
        Some(FeatureId(1))
    );

    dispatcher.dispatch(Command::RequestBuffer("60".into())).unwrap();
    let overlay = dispatcher.session().overlay();
    assert_eq!(overlay.graphics().len(), 2);
    assert_eq!(overlay.graphics()[0].symbol, HighlightSymbol::Buffer);
    assert_eq!(overlay.graphics()[1].symbol, HighlightSymbol::HitFeature);

    let buffer_extent = overlay.graphics()[0].geometry.bounding_rect().unwrap();
    let view = dispatcher.session().view().extent().unwrap();
    assert!(view.width() > buffer_extent.width());
    assert!(view.height() > buffer_extent.height());

    dispatcher.settle().await;
    let markers = dispatcher
        .session()
        .overlay()
        .with_symbol(HighlightSymbol::IntersectingMarker)
        .count();
    assert_eq!(markers, 3);
}

#[tokio::test]
async fn new_selection_drops_pending_buffer_markers() {
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::SetArea("Central".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;
    dispatcher.dispatch(Command::ActivateRow(0)).unwrap();
    dispatcher.dispatch(Command::RequestBuffer("500".into())).unwrap();
    dispatcher.dispatch(Command::ActivateRow(1)).unwrap();

    assert_matches!(
        dispatcher.next_completion().await,
        Some(Ok(CompletionOutcome::Stale))
    );
    let overlay = dispatcher.session().overlay();
    assert_eq!(overlay.graphics().len(), 1);
    assert_eq!(overlay.graphics()[0].symbol, HighlightSymbol::SelectedMarker);
}

#[tokio::test]
async fn map_click_selects_feature() {
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    let session = dispatcher.session_mut();
    session.view_mut().set_displayed_features(trees());
    let position = session
        .view()
        .map_to_screen(&latlon!(16.4750, 107.5800))
        .unwrap();

    dispatcher
        .dispatch(Command::MapClicked(Point2d::new(position.x() + 2.0, position.y() - 1.0)))
        .unwrap();
    let session = dispatcher.session();
    assert_eq!(session.selected_feature().map(|f| f.id()), Some(FeatureId(4)));
    assert_eq!(
        session.overlay().graphics()[0].symbol,
        HighlightSymbol::HitFeature
    );

    // A click on an empty spot keeps the selection.
    dispatcher
        .dispatch(Command::MapClicked(Point2d::new(-500.0, -500.0)))
        .unwrap();
    assert_eq!(
        dispatcher.session().selected_feature().map(|f| f.id()),
        Some(FeatureId(4))
    );
}

#[tokio::test]
async fn home_extent() {
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    assert!(!dispatcher.session_mut().go_home());

    dispatcher.dispatch(Command::Initialize).unwrap();
    dispatcher.settle().await;
    let home = dispatcher.session().home_extent().unwrap();
    assert_abs_diff_eq!(home.width(), (107.5950 - 107.5700) * 1.2, epsilon = 1e-9);

    dispatcher.dispatch(Command::SetName("sao".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;
    dispatcher.dispatch(Command::ActivateRow(0)).unwrap();
    dispatcher.dispatch(Command::GoHome).unwrap();

    let visible = dispatcher.session().view().extent().unwrap();
    assert!(visible.x_min <= home.x_min + 1e-9 && visible.x_max >= home.x_max - 1e-9);
}

#[tokio::test]
async fn category_filter_sets_layer_expression() {
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::SetCategories(vec![])).unwrap();
    assert_eq!(
        dispatcher
            .session()
            .layer()
            .definition_expression()
            .map(|p| p.to_string()),
        Some("1=0".to_string())
    );

    dispatcher
        .dispatch(Command::SetCategories(vec!["Cây hoa".into(), "Cây cảnh".into()]))
        .unwrap();
    let expression = dispatcher.session().layer().definition_expression().unwrap().clone();
    assert_eq!(expression.to_string(), "LoaiCay IN ('Cây hoa','Cây cảnh')");

    let shown: Vec<FeatureId> = trees()
        .iter()
        .filter(|r| expression.matches(r))
        .map(|r| r.id())
        .collect();
    assert_eq!(shown, vec![FeatureId(3), FeatureId(5), FeatureId(6)]);
}

#[tokio::test]
async fn ticket_slots_are_issued_per_request() {
    let mut session = session(&NoticeLog::new());
    let roads = session.set_area_filter("Central");
    session.set_name_filter("sao");
    let search = session.search().unwrap();

    assert_eq!(roads.ticket.slot(), RequestSlot::RoadOptions);
    assert_eq!(search.ticket.slot(), RequestSlot::Search);
}

#[tokio::test]
async fn cluster_toggle_waits_for_renderer() {
    init_logger();
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    assert!(!dispatcher.session().cluster().is_control_enabled());
    assert_matches!(
        dispatcher.dispatch(Command::SetClusterEnabled(true)),
        Err(CanopyError::Validation(ValidationError::ClusterNotReady))
    );

    dispatcher.dispatch(Command::Initialize).unwrap();
    dispatcher.settle().await;
    let cluster = dispatcher.session().cluster();
    assert!(cluster.is_control_enabled());
    assert!(!cluster.is_enabled());
    let categories: Vec<&str> = cluster
        .config()
        .unwrap()
        .renderer
        .slices
        .iter()
        .map(|s| s.category.as_str())
        .collect();
    assert_eq!(categories, vec!["Cây bóng mát", "Cây cảnh", "Cây hoa"]);

    dispatcher.dispatch(Command::SetClusterEnabled(true)).unwrap();
    let layer = dispatcher.session().layer();
    assert_eq!(layer.feature_reduction().map(|c| c.radius_px), Some(80));
    assert_eq!(
        layer.feature_reduction().unwrap().popup.fields,
        vec!["LoaiCay_1", "LoaiCay_2", "LoaiCay_3"]
    );

    dispatcher.dispatch(Command::SetClusterEnabled(false)).unwrap();
    assert!(dispatcher.session().layer().feature_reduction().is_none());
    assert_eq!(dispatcher.session().layer().refresh_count(), 2);
}

#[tokio::test]
async fn hidden_categories_are_not_searched_or_marked() {
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::SetName("Sao đen".into())).unwrap();
    dispatcher.dispatch(Command::SetArea("Central".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;
    dispatcher.dispatch(Command::ActivateRow(0)).unwrap();

    dispatcher.dispatch(Command::SetCategories(vec![])).unwrap();
    dispatcher.dispatch(Command::RequestBuffer("60".into())).unwrap();
    dispatcher.settle().await;
    let overlay = dispatcher.session().overlay();
    assert_eq!(overlay.with_symbol(HighlightSymbol::Buffer).count(), 1);
    assert_eq!(
        overlay
            .with_symbol(HighlightSymbol::IntersectingMarker)
            .count(),
        0
    );

    dispatcher
        .dispatch(Command::SetCategories(vec!["Cây hoa".into()]))
        .unwrap();
    dispatcher.dispatch(Command::RequestBuffer("60".into())).unwrap();
    dispatcher.settle().await;
    let markers: Vec<_> = dispatcher
        .session()
        .overlay()
        .with_symbol(HighlightSymbol::IntersectingMarker)
        .map(|g| g.geometry.clone())
        .collect();
    assert_eq!(markers, vec![trees()[2].geometry().unwrap().clone()]);

    dispatcher.dispatch(Command::SetName(String::new())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;
    let table = dispatcher.session().results().table().unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.row_record(0).map(|r| r.id()), Some(FeatureId(3)));
}

#[tokio::test]
async fn unlisted_area_resets_road_list() {
    let mut dispatcher = dispatcher(memory_source(), &NoticeLog::new());
    dispatcher.dispatch(Command::Initialize).unwrap();
    dispatcher.dispatch(Command::SetArea("South".into())).unwrap();
    dispatcher.dispatch(Command::SetRoad("Lê Lợi".into())).unwrap();
    dispatcher.settle().await;

    let filter = dispatcher.session().filter();
    assert_eq!(filter.selection().area, "");
    assert_eq!(filter.selection().road, "");
    assert_eq!(filter.road_options().values(), ALL_ROADS);
}
