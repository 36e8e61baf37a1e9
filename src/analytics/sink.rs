//! Destinations for analytics events
//!
//! Capturing is fire-and-forget: sinks never report failure to the caller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::AnalyticsEvent;

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that accepts analytics events
pub trait EventSink: Send + Sync {
    fn capture(&self, event: &AnalyticsEvent);

    /// Waits for events still in flight. Sinks that deliver inline have
    /// nothing to wait for.
    fn flush(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Writes each event as a structured log line
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn capture(&self, event: &AnalyticsEvent) {
        let properties = Value::Object(event.properties.clone());
        info!(
            event = %event.name,
            distinct_id = event.distinct_id.as_deref().unwrap_or_default(),
            properties = %properties,
            "analytics event"
        );
    }
}

/// Collects events in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything captured so far
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of captured events, in order
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }
}

impl EventSink for MemorySink {
    fn capture(&self, event: &AnalyticsEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sends events to a PostHog-compatible `/capture/` endpoint
///
/// Each event is posted on its own tokio task; without a running runtime the
/// event is dropped with a warning. Call [`flush`](Self::flush) before the
/// runtime shuts down or pending posts are cancelled.
#[derive(Debug, Clone)]
pub struct CaptureSink {
    http: Client,
    endpoint: String,
    api_key: String,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl CaptureSink {
    pub fn new(host: &str, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(CAPTURE_TIMEOUT)
                .build()
                .unwrap_or_default(),
            endpoint: format!("{}/capture/", host.trim_end_matches('/')),
            api_key: api_key.into(),
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body for one event
    pub fn body(&self, event: &AnalyticsEvent) -> Value {
        json!({
            "api_key": self.api_key,
            "event": event.name,
            "distinct_id": event.distinct_id,
            "properties": Value::Object(event.properties.clone()),
            "timestamp": event.timestamp.to_rfc3339(),
        })
    }
}

impl EventSink for CaptureSink {
    fn capture(&self, event: &AnalyticsEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(event = %event.name, "no async runtime, dropping analytics event");
            return;
        };

        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let body = self.body(event);
        let name = event.name.clone();
        let task = runtime.spawn(async move {
            match http.post(&endpoint).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(event = %name, "analytics event delivered");
                }
                Ok(response) => {
                    warn!(event = %name, status = response.status().as_u16(), "analytics capture rejected");
                }
                Err(e) => {
                    warn!(event = %name, error = %e, "analytics capture failed");
                }
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(task);
        }
    }

    fn flush(&self) -> BoxFuture<'_, ()> {
        Box::pin(CaptureSink::flush(self))
    }
}

impl CaptureSink {
    /// Waits until every event captured so far has been posted or has failed
    pub async fn flush(&self) {
        let tasks = self.take_pending();
        if tasks.is_empty() {
            return;
        }
        debug!(count = tasks.len(), "flushing analytics events");
        for result in join_all(tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "analytics delivery task failed");
            }
        }
    }

    fn take_pending(&self) -> Vec<JoinHandle<()>> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> AnalyticsEvent {
        let mut properties = Map::new();
        properties.insert("milestone".to_string(), json!(50));
        let mut event = AnalyticsEvent::new("scroll_depth", properties);
        event.distinct_id = Some("run-1".to_string());
        event
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        let handle = sink.clone();

        sink.capture(&AnalyticsEvent::new("a", Map::new()));
        sink.capture(&AnalyticsEvent::new("b", Map::new()));

        assert_eq!(handle.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_capture_endpoint_normalises_trailing_slash() {
        assert_eq!(
            CaptureSink::new("https://eu.posthog.com/", "phc_key").endpoint(),
            "https://eu.posthog.com/capture/"
        );
        assert_eq!(
            CaptureSink::new("https://eu.posthog.com", "phc_key").endpoint(),
            "https://eu.posthog.com/capture/"
        );
    }

    #[test]
    fn test_capture_body_shape() {
        let sink = CaptureSink::new("https://eu.posthog.com", "phc_key");

        let body = sink.body(&event());

        assert_eq!(body["api_key"], "phc_key");
        assert_eq!(body["event"], "scroll_depth");
        assert_eq!(body["distinct_id"], "run-1");
        assert_eq!(body["properties"]["milestone"], 50);
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_capture_without_runtime_is_dropped() {
        let sink = CaptureSink::new("http://127.0.0.1:9", "phc_key");
        // Must not panic outside a runtime
        sink.capture(&event());
    }

    #[test]
    fn test_tracing_sink_logs_properties() {
        // Must not panic with or without a subscriber installed
        TracingSink.capture(&event());
        TracingSink.capture(&AnalyticsEvent::new("empty", Map::new()));
    }

    #[tokio::test]
    async fn test_flush_on_sink_without_queue_returns() {
        let sink = MemorySink::new();
        sink.capture(&event());

        EventSink::flush(&sink).await;

        assert_eq!(sink.names(), vec!["scroll_depth"]);
    }

    #[tokio::test]
    async fn test_capture_posts_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/capture/"))
            .and(body_partial_json(json!({ "event": "scroll_depth", "api_key": "phc_key", "distinct_id": "run-1" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = CaptureSink::new(&server.uri(), "phc_key");
        sink.capture(&event());
        sink.flush().await;

        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_flush_waits_for_failed_delivery() {
        let sink = CaptureSink::new("http://127.0.0.1:9", "phc_key");
        sink.capture(&event());

        sink.flush().await;

        assert!(sink.take_pending().is_empty());
    }

    #[test]
    fn test_flush_delivers_before_runtime_shutdown() {
        let server_runtime = tokio::runtime::Runtime::new().unwrap();
        let server = server_runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/capture/"))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;
            server
        });

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let sink = CaptureSink::new(&server.uri(), "phc_key");
        runtime.block_on(async {
            sink.capture(&event());
            sink.flush().await;
        });
        drop(runtime);

        let received = server_runtime.block_on(server.received_requests()).unwrap_or_default();
        assert_eq!(received.len(), 1);
    }
}
