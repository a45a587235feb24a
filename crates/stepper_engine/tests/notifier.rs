use std::sync::{mpsc, Arc};
use std::time::Duration;

use serde_json::json;
use stepper_engine::{
    notify, BackendSettings, ChannelEventSink, CompletionNotifier, EngineEvent, EngineHandle,
    ImportStatusQuery, MarkCompleteRequest, ReqwestBackend, WatchKind,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MARK_COMPLETE: &str = "/api/mark-import-export-complete";

fn init_logging() {
    stepper_logging::initialize_for_tests();
}

fn settings_for(server: &MockServer) -> BackendSettings {
    BackendSettings {
        poll_interval: Duration::from_millis(10),
        ..BackendSettings::with_base_url(server.uri())
    }
}

fn request() -> MarkCompleteRequest {
    MarkCompleteRequest {
        github_source_namespace: "acme".to_string(),
        github_source_repository: "widgets".to_string(),
        splitgraph_destination_namespace: "sg".to_string(),
        splitgraph_destination_repository: "widgets".to_string(),
    }
}

async fn recv_event(rx: &mpsc::Receiver<EngineEvent>) -> Option<EngineEvent> {
    for _ in 0..200 {
        if let Ok(event) = rx.try_recv() {
            return Some(event);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

#[tokio::test]
async fn reported_error_becomes_failure_event() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MARK_COMPLETE))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": true, "error": "dup" })),
        )
        .mount(&server)
        .await;
    let backend = ReqwestBackend::new(settings_for(&server)).expect("client builds");

    let event = notify(&backend, &request(), &CancellationToken::new()).await;

    assert_eq!(
        event,
        Some(EngineEvent::CompletionFailed {
            request: request(),
            message: "Failed to mark import/export complete: dup".to_string(),
        })
    );
}

#[tokio::test]
async fn cancelled_notification_yields_no_event() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MARK_COMPLETE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({ "status": true })),
        )
        .mount(&server)
        .await;
    let backend = Arc::new(ReqwestBackend::new(settings_for(&server)).expect("client builds"));
    let mut notifier = CompletionNotifier::new(backend);

    let pending = tokio::spawn(notifier.begin(request()));
    assert!(notifier.in_flight());
    tokio::time::sleep(Duration::from_millis(20)).await;
    notifier.cancel();

    let outcome = tokio::time::timeout(Duration::from_millis(200), pending)
        .await
        .expect("cancellation resolves before the slow response")
        .expect("task joins");
    assert_eq!(outcome, None);
    assert!(!notifier.in_flight());
}

#[tokio::test]
async fn new_notification_supersedes_previous() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MARK_COMPLETE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(100))
                .set_body_json(json!({ "status": true })),
        )
        .mount(&server)
        .await;
    let backend = Arc::new(ReqwestBackend::new(settings_for(&server)).expect("client builds"));
    let mut notifier = CompletionNotifier::new(backend);

    let first = tokio::spawn(notifier.begin(request()));
    let second = tokio::spawn(notifier.begin(request()));

    assert_eq!(first.await.expect("first joins"), None);
    assert_eq!(
        second.await.expect("second joins"),
        Some(EngineEvent::CompletionRecorded)
    );
    assert!(!notifier.in_flight());
}

#[tokio::test]
async fn engine_polls_import_until_completed() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/await-import-from-github"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "completed": false })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/await-import-from-github"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "completed": true })))
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();
    let engine = EngineHandle::new(settings_for(&server), Arc::new(ChannelEventSink::new(tx)))
        .expect("engine starts");
    engine.await_import(ImportStatusQuery {
        task_id: "t1".to_string(),
        splitgraph_namespace: "sg".to_string(),
        splitgraph_repository: "widgets".to_string(),
    });

    assert_eq!(
        recv_event(&rx).await,
        Some(EngineEvent::ImportCompleted {
            task_id: "t1".to_string()
        })
    );
}

#[tokio::test]
async fn engine_cancelled_export_watch_stays_silent() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/await-export-to-seafowl-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "completed": false })))
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();
    let engine = EngineHandle::new(settings_for(&server), Arc::new(ChannelEventSink::new(tx)))
        .expect("engine starts");
    engine.await_export_tasks(vec!["e1".to_string(), "e2".to_string()]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    engine.cancel(WatchKind::Export);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn engine_reports_completion_failure() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MARK_COMPLETE))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();
    let engine = EngineHandle::new(settings_for(&server), Arc::new(ChannelEventSink::new(tx)))
        .expect("engine starts");
    engine.notify_completion(request());

    assert_eq!(
        recv_event(&rx).await,
        Some(EngineEvent::CompletionFailed {
            request: request(),
            message: "Failed to mark import/export as complete".to_string(),
        })
    );
}
