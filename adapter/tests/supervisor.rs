//! End-to-end adapter tests: a real launcher child (a tiny `sh` script)
//! reporting readiness for a wiremock build tool.
#![cfg(unix)]

use plate_adapter::{Adapter, AdapterConfig, AdapterError, StartError};
use plate_types::PatternId;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A launcher that logs, reports `started` for `port`, then stays alive.
fn fake_launcher(port: u16) -> AdapterConfig {
    AdapterConfig::new("sh", std::env::temp_dir()).with_args(vec![
        "-c".to_string(),
        format!(
            "echo '{{\"type\":\"log\",\"args\":[\"booting\"]}}'; \
             echo '{{\"type\":\"started\",\"port\":{port}}}'; \
             sleep 30"
        ),
    ])
}

async fn started_adapter(server: &MockServer) -> Adapter {
    let port = server.address().port();
    let mut adapter = Adapter::new(fake_launcher(port));
    adapter.start().await.expect("adapter should start");
    adapter
}

#[tokio::test]
async fn test_start_discovers_base_address() {
    let server = MockServer::start().await;
    let mut adapter = started_adapter(&server).await;

    assert!(adapter.is_started());
    let base = adapter.base_url().unwrap();
    assert_eq!(base.port(), Some(server.address().port()));
    assert_eq!(base.host_str(), Some("localhost"));

    adapter.stop().await;
    assert!(!adapter.is_started());
    // Idempotent.
    adapter.stop().await;
    assert!(!adapter.is_started());
}

#[tokio::test]
async fn test_render_demo_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/demo/atoms/button"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head></head><body><button>ok</button></body></html>",
        ))
        .mount(&server)
        .await;

    let mut adapter = started_adapter(&server).await;
    let html = adapter
        .render_demo(&PatternId::new("atoms/button"))
        .await
        .expect("render should succeed");

    assert!(html.contains("<button>ok</button>"));
    assert!(html.contains("<base href="));
    adapter.stop().await;
}

#[tokio::test]
async fn test_metadata_queries_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"atoms":{"type":"folder","children":{
                "icon":{"type":"pattern","id":"atoms/icon"},
                "button":{"type":"pattern","id":"atoms/button",
                          "manifest":{"patterns":{"icon":"atoms/icon"}}}
            }}}"#,
        ))
        .mount(&server)
        .await;

    let mut adapter = started_adapter(&server).await;

    assert_eq!(
        adapter.get_pattern_ids().await,
        [PatternId::new("atoms/icon"), PatternId::new("atoms/button")]
    );
    assert_eq!(
        adapter
            .get_pattern_dependents(&PatternId::new("atoms/icon"))
            .await,
        [PatternId::new("atoms/button")]
    );
    assert!(
        adapter
            .get_pattern_dependents(&PatternId::new("atoms/button"))
            .await
            .is_empty()
    );
    adapter.stop().await;
}

#[tokio::test]
async fn test_launcher_error_message_fails_start() {
    let config = AdapterConfig::new("sh", std::env::temp_dir()).with_args(vec![
        "-c".to_string(),
        "echo '{\"type\":\"error\",\"error\":\"patternplate not installed\"}'; sleep 30".to_string(),
    ]);
    let mut adapter = Adapter::new(config);

    let error = adapter.start().await.unwrap_err();
    assert!(matches!(
        error,
        AdapterError::Start(StartError::Reported(reason)) if reason == "patternplate not installed"
    ));
    assert!(!adapter.is_started());
}

#[tokio::test]
async fn test_launcher_exit_before_started_fails_start() {
    let config = AdapterConfig::new("sh", std::env::temp_dir())
        .with_args(vec!["-c".to_string(), "exit 0".to_string()]);
    let mut adapter = Adapter::new(config);

    let error = adapter.start().await.unwrap_err();
    assert!(matches!(
        error,
        AdapterError::Start(StartError::Disconnected)
    ));
    assert!(!adapter.is_started());
}

#[tokio::test]
async fn test_restart_after_stop() {
    let server = MockServer::start().await;
    let port = server.address().port();

    let mut adapter = Adapter::new(fake_launcher(port));
    adapter.start().await.expect("first start");
    adapter.stop().await;
    assert!(!adapter.is_started());

    adapter.start().await.expect("restart after stop");
    assert!(adapter.is_started());
    adapter.stop().await;
}

#[tokio::test]
async fn test_port_reported_as_string_accepted() {
    let server = MockServer::start().await;
    let port = server.address().port();
    let config = AdapterConfig::new("sh", std::env::temp_dir()).with_args(vec![
        "-c".to_string(),
        format!("echo '{{\"type\":\"started\",\"port\":\"{port}\"}}'; sleep 30"),
    ]);

    let mut adapter = Adapter::new(config);
    adapter.start().await.expect("string port should work");
    assert_eq!(adapter.base_url().unwrap().port(), Some(port));
    adapter.stop().await;
}
