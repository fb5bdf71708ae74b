mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use canopy::feature::FeatureId;
use canopy::session::CompletionOutcome;
use canopy::table::ResultsPanel;
use canopy::{Command, NoticeLog};
use common::*;
use tokio::sync::mpsc;

const SAO: &str = "LOWER(TenCay) LIKE LOWER('%sao%')";
const PHUONG: &str = "LOWER(TenCay) LIKE LOWER('%phượng%')";

fn result_ids(results: &ResultsPanel) -> Vec<FeatureId> {
    let table = results.table().expect("results should be a table");
    (0..table.row_count())
        .filter_map(|row| table.row_record(row).map(|r| r.id()))
        .collect()
}

#[tokio::test]
async fn latest_search_wins() {
    init_logger();
    let source = Arc::new(GatedSource::new(trees()));
    let open_sao = source.gate(SAO);
    let open_phuong = source.gate(PHUONG);
    let mut dispatcher = dispatcher(source, &NoticeLog::new());

    dispatcher.dispatch(Command::SetName("sao".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.dispatch(Command::SetName("phượng".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    assert_eq!(dispatcher.in_flight(), 2);

    open_phuong.send(()).unwrap();
    assert_matches!(
        dispatcher.next_completion().await,
        Some(Ok(CompletionOutcome::Applied))
    );
    assert_eq!(result_ids(dispatcher.session().results()), vec![FeatureId(2)]);

    open_sao.send(()).unwrap();
    assert_matches!(
        dispatcher.next_completion().await,
        Some(Ok(CompletionOutcome::Stale))
    );
    assert_eq!(result_ids(dispatcher.session().results()), vec![FeatureId(2)]);
    assert_matches!(dispatcher.next_completion().await, None);
}

#[tokio::test]
async fn stale_search_applied_first_is_replaced() {
    let source = Arc::new(GatedSource::new(trees()));
    let open_sao = source.gate(SAO);
    let open_phuong = source.gate(PHUONG);
    let mut dispatcher = dispatcher(source, &NoticeLog::new());

    dispatcher.dispatch(Command::SetName("sao".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.dispatch(Command::SetName("phượng".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();

    // The earlier search arrives first and is dropped even though nothing newer has been shown.
    open_sao.send(()).unwrap();
    assert_matches!(
        dispatcher.next_completion().await,
        Some(Ok(CompletionOutcome::Stale))
    );
    assert_eq!(dispatcher.session().results(), &ResultsPanel::Empty);

    open_phuong.send(()).unwrap();
    dispatcher.settle().await;
    assert_eq!(result_ids(dispatcher.session().results()), vec![FeatureId(2)]);
}

#[tokio::test]
async fn failed_area_list_does_not_block_search() {
    init_logger();
    let notices = NoticeLog::new();
    let source = Arc::new(FailingFieldSource::new(trees(), "DiaChi"));
    let mut dispatcher = dispatcher(source, &notices);

    dispatcher.dispatch(Command::Initialize).unwrap();
    dispatcher.settle().await;
    let session = dispatcher.session();
    assert!(session.filter().area_options().values().is_empty());
    assert_eq!(session.filter().road_options().values().len(), 4);
    assert!(session.home_extent().is_none());
    assert!(session.cluster().is_control_enabled());
    assert!(notices.messages().is_empty());

    dispatcher.dispatch(Command::SetName("sao".into())).unwrap();
    dispatcher.dispatch(Command::Search).unwrap();
    dispatcher.settle().await;
    assert_eq!(
        result_ids(dispatcher.session().results()),
        vec![FeatureId(1), FeatureId(4)]
    );
}

#[tokio::test]
async fn failed_renderer_keeps_cluster_disabled() {
    let source = Arc::new(FailingFieldSource::new(trees(), "LoaiCay"));
    let mut dispatcher = dispatcher(source, &NoticeLog::new());

    dispatcher.dispatch(Command::Initialize).unwrap();
    dispatcher.settle().await;
    let cluster = dispatcher.session().cluster();
    assert!(!cluster.is_control_enabled());
    assert!(!cluster.is_enabled());
    assert!(dispatcher.session().layer().feature_reduction().is_none());
}

#[tokio::test]
async fn run_processes_channel() {
    init_logger();
    let (tx, rx) = mpsc::channel(16);
    for command in [
        Command::Initialize,
        Command::SetArea("North".into()),
        Command::Search,
        // Rejected: there is no such column. The loop keeps going.
        Command::SortResults(9),
        Command::SetClusterEnabled(true),
    ] {
        tx.send(command).await.unwrap();
    }
    drop(tx);

    let session = dispatcher(memory_source(), &NoticeLog::new()).run(rx).await;
    assert_eq!(session.filter().road_options().values(), ["Kim Long", "Đống Đa"]);
    assert_eq!(
        result_ids(session.results()),
        vec![FeatureId(4), FeatureId(5)]
    );
    assert!(session.cluster().is_control_enabled());
}
