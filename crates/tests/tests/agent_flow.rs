//! Cross-crate integration and E2E tests
//!
//! These tests drive the full agent: lifecycle, enrichment, producers,
//! batching, and (in the E2E case) real beacon delivery over HTTP.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use heimdall::{
    AgentConfig, KEY_APP, KEY_INSTANCE_ID, KEY_LOCATION, KEY_SESSION_ID, KEY_VERSION,
    ManualSuspendSignal, RumAgent,
};
use heimdall_instrument::{HostEvent, InteractionEvent, NavigationTiming};
use heimdall_trace::{AttrMap, RecordingExporter, RecordingProcessor};

fn recording_config(exporter: Arc<RecordingExporter>) -> AgentConfig {
    let mut config = AgentConfig::new("", "shop");
    config.exporter = Some(exporter);
    config
}

fn navigation(url: &str) -> HostEvent {
    let now = Utc::now();
    HostEvent::Navigation(NavigationTiming {
        url: url.to_string(),
        started_at: now,
        dom_content_loaded_at: None,
        loaded_at: now,
    })
}

fn click(target: &str) -> HostEvent {
    HostEvent::Interaction(InteractionEvent {
        kind: "click".to_string(),
        target: target.to_string(),
        occurred_at: Utc::now(),
    })
}

async fn let_timer_run() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_fixed_attributes_and_global_precedence() {
    let recorder = Arc::new(RecordingProcessor::new());
    let mut config = recording_config(Arc::new(RecordingExporter::new()));
    config.span_processor = Some(recorder.clone());
    config.environment = Some("prod".to_string());
    config
        .global_attributes
        .insert(KEY_APP.to_string(), "global-wins".into());

    let agent = RumAgent::new(Arc::new(ManualSuspendSignal::new()));
    agent.init(config).unwrap();

    agent.observe(&navigation("https://app.test/cart"));
    agent.observe(&click("button#buy"));

    let started = recorder.started();
    assert_eq!(started.len(), 2);
    // Every span carries the five fixed attributes, visible at on_start.
    for span in &started {
        assert_eq!(span.attributes[KEY_LOCATION], "https://app.test/cart".into());
        assert_eq!(span.attributes[KEY_APP], "global-wins".into());
        assert_eq!(span.attributes[KEY_VERSION], heimdall::AGENT_VERSION.into());
        assert_eq!(
            span.attributes[KEY_INSTANCE_ID],
            agent.instance_id().unwrap().into()
        );
        assert_eq!(
            span.attributes[KEY_SESSION_ID],
            agent.session_id().unwrap().into()
        );
        assert_eq!(span.attributes["environment"], "prod".into());
    }

    agent.deinit();
}

#[tokio::test]
async fn test_global_attribute_updates_are_not_retroactive() {
    let recorder = Arc::new(RecordingProcessor::new());
    let mut config = recording_config(Arc::new(RecordingExporter::new()));
    config.span_processor = Some(recorder.clone());

    let agent = RumAgent::new(Arc::new(ManualSuspendSignal::new()));
    agent.init(config).unwrap();

    agent.observe(&click("a"));
    agent.set_global_attributes(AttrMap::from([("release".to_string(), 7i64.into())]));
    agent.observe(&click("b"));

    let ended = recorder.ended();
    assert!(!ended[0].attributes.contains_key("release"));
    assert_eq!(ended[1].attributes["release"], 7i64.into());

    agent.deinit();
}

#[tokio::test]
async fn test_reinit_changes_instance_id_on_spans() {
    let recorder = Arc::new(RecordingProcessor::new());
    let agent = RumAgent::new(Arc::new(ManualSuspendSignal::new()));

    let mut config = recording_config(Arc::new(RecordingExporter::new()));
    config.span_processor = Some(recorder.clone());
    agent.init(config).unwrap();
    let first = agent.instance_id().unwrap();
    agent.observe(&click("a"));
    agent.deinit();

    let mut config = recording_config(Arc::new(RecordingExporter::new()));
    config.span_processor = Some(recorder.clone());
    agent.init(config).unwrap();
    let second = agent.instance_id().unwrap();
    agent.observe(&click("b"));
    agent.deinit();

    assert_ne!(first, second);
    let ended = recorder.ended();
    assert_eq!(ended[0].attributes[KEY_INSTANCE_ID], first.into());
    assert_eq!(ended[1].attributes[KEY_INSTANCE_ID], second.into());
}

#[tokio::test]
async fn test_full_batch_exports_at_buffer_size() {
    let exporter = Arc::new(RecordingExporter::new());
    let agent = RumAgent::new(Arc::new(ManualSuspendSignal::new()));
    agent.init(recording_config(exporter.clone())).unwrap();

    for i in 0..25 {
        agent.observe(&click(&format!("button#{i}")));
    }
    let_timer_run().await;

    let batches = exporter.batches();
    assert!(!batches.is_empty(), "size trigger fired");
    assert_eq!(batches[0].len(), 20);

    assert_eq!(exporter.span_count(), 25, "no span lost across chunks");
    agent.deinit();
}

#[tokio::test(start_paused = true)]
async fn test_timeout_flushes_partial_batch() {
    let exporter = Arc::new(RecordingExporter::new());
    let agent = RumAgent::new(Arc::new(ManualSuspendSignal::new()));
    agent.init(recording_config(exporter.clone())).unwrap();

    for i in 0..3 {
        agent.observe(&click(&format!("button#{i}")));
    }
    assert_eq!(exporter.span_count(), 0);

    // Paused time auto-advances past the 5s buffer timeout.
    tokio::time::sleep(Duration::from_millis(5_100)).await;
    let_timer_run().await;

    let batches = exporter.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);

    agent.deinit();
}

#[tokio::test]
async fn test_suspend_flushes_synchronously() {
    let exporter = Arc::new(RecordingExporter::new());
    let signal = Arc::new(ManualSuspendSignal::new());
    let agent = RumAgent::new(signal.clone());
    agent.init(recording_config(exporter.clone())).unwrap();

    for i in 0..5 {
        agent.observe(&click(&format!("button#{i}")));
    }
    assert_eq!(exporter.span_count(), 0);

    // No awaits between firing the signal and the assertion: the flush
    // must complete inside the suspend call itself.
    signal.suspend();
    assert_eq!(exporter.span_count(), 5);

    agent.deinit();
}

#[tokio::test]
async fn test_deinit_severs_the_pipeline() {
    let exporter = Arc::new(RecordingExporter::new());
    let agent = RumAgent::new(Arc::new(ManualSuspendSignal::new()));
    agent.init(recording_config(exporter.clone())).unwrap();

    agent.observe(&click("before"));
    agent.deinit();
    assert_eq!(exporter.span_count(), 1);

    agent.observe(&click("after"));
    agent.force_flush();
    assert_eq!(exporter.span_count(), 1);
}

#[tokio::test]
async fn test_insecure_beacon_requires_opt_in() {
    let agent = RumAgent::new(Arc::new(ManualSuspendSignal::new()));

    let config = AgentConfig::new("http://collector.test/v1/rum", "shop");
    assert!(agent.init(config).is_err());
    assert!(!agent.is_initialized());

    let mut config = AgentConfig::new("http://collector.test/v1/rum", "shop");
    config.allow_insecure_beacon = true;
    agent.init(config).unwrap();
    assert!(agent.is_initialized());
    agent.deinit();
}

/// E2E: spans recorded through the agent arrive at a real HTTP collector
/// as a Zipkin-style JSON array with the auth token on the URL.
#[tokio::test(flavor = "multi_thread")]
async fn test_e2e_beacon_delivery() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (request_tx, mut request_rx) = tokio::sync::mpsc::channel::<String>(1);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length: "))
                    .or_else(|| {
                        text.lines().find_map(|l| l.strip_prefix("Content-Length: "))
                    })
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
            .await
            .unwrap();
        request_tx
            .send(String::from_utf8_lossy(&raw).to_string())
            .await
            .unwrap();
    });

    let mut config = AgentConfig::new(format!("http://127.0.0.1:{port}/v1/rum"), "shop")
        .with_auth("secret-token");
    config.allow_insecure_beacon = true;

    let signal = Arc::new(ManualSuspendSignal::new());
    let agent = RumAgent::new(signal.clone());
    agent.init(config).unwrap();

    agent.observe(&navigation("https://app.test/"));
    agent.observe(&click("button#buy"));
    signal.suspend();

    let raw = tokio::time::timeout(Duration::from_secs(5), request_rx.recv())
        .await
        .expect("collector saw the beacon")
        .unwrap();

    let request_line = raw.lines().next().unwrap();
    assert!(request_line.starts_with("POST /v1/rum?auth=secret-token "));

    let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
    let spans: serde_json::Value = serde_json::from_str(body).unwrap();
    let spans = spans.as_array().unwrap();
    assert_eq!(spans.len(), 2);
    for span in spans {
        assert_eq!(span["localEndpoint"]["serviceName"], "shop");
        assert_eq!(span["tags"]["app"], "shop");
        assert_eq!(span["tags"]["location.href"], "https://app.test/");
    }
    assert!(spans.iter().any(|s| s["name"] == "documentLoad"));
    assert!(spans.iter().any(|s| s["name"] == "click"));

    agent.deinit();
}
