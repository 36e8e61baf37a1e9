//! Page analytics
//!
//! Tracks page views, link activations and scroll depth, and hands the
//! resulting events to an `EventSink`. Action ids are deterministic so the
//! same link produces the same id across sessions.

pub mod action_id;
pub mod click;
pub mod scroll;
pub mod sink;

pub use action_id::{action_id, hash_base36};
pub use click::{ClickTarget, UiClick};
pub use scroll::{scroll_percent, ScrollDepthTracker, SCROLL_MILESTONES};
pub use sink::{CaptureSink, EventSink, MemorySink, TracingSink};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub const EVENT_PAGEVIEW: &str = "$pageview";
pub const EVENT_UI_CLICK: &str = "ui_click";
pub const EVENT_SCROLL_DEPTH: &str = "scroll_depth";

/// A named event with JSON properties
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub name: String,
    pub properties: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    /// Set by [`Analytics`] when the event is tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_id: Option<String>,
}

impl AnalyticsEvent {
    pub fn new(name: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            properties,
            timestamp: Utc::now(),
            distinct_id: None,
        }
    }

    /// Builds an event whose properties are the fields of `properties`
    ///
    /// Values that do not serialise to a JSON object are stored under `value`.
    pub fn with_payload<P: Serialize>(name: impl Into<String>, properties: &P) -> Self {
        let properties = match serde_json::to_value(properties) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
            Err(_) => Map::new(),
        };
        Self::new(name, properties)
    }
}

/// Per-page tracker in front of a sink
///
/// Every event it tracks carries the same random distinct id, so one run
/// reads as one visitor.
pub struct Analytics {
    sink: Arc<dyn EventSink>,
    path: String,
    distinct_id: String,
    scroll: ScrollDepthTracker,
}

impl Analytics {
    pub fn new(sink: Arc<dyn EventSink>, path: impl Into<String>) -> Self {
        Self {
            sink,
            path: path.into(),
            distinct_id: Uuid::new_v4().to_string(),
            scroll: ScrollDepthTracker::new(),
        }
    }

    /// Page path attached to events
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn distinct_id(&self) -> &str {
        &self.distinct_id
    }

    pub fn track(&self, mut event: AnalyticsEvent) {
        event.distinct_id.get_or_insert_with(|| self.distinct_id.clone());
        self.sink.capture(&event);
    }

    /// Waits for the sink to finish delivering tracked events
    pub async fn flush(&self) {
        self.sink.flush().await;
    }

    pub fn track_pageview(&self, page: &str) {
        self.track(AnalyticsEvent::with_payload(
            EVENT_PAGEVIEW,
            &json!({ "page": page, "path": self.path }),
        ));
    }

    /// Tracks an activated link or button and returns the payload that was sent
    pub fn track_click(&self, target: &ClickTarget) -> UiClick {
        let click = UiClick::from_target(target, &self.path);
        self.track(AnalyticsEvent::with_payload(EVENT_UI_CLICK, &click));
        click
    }

    /// Records a scroll position, emitting one event per newly reached milestone
    pub fn track_scroll(&mut self, percent: u8) -> Vec<u8> {
        let reached = self.scroll.observe(percent);
        for milestone in &reached {
            self.track(AnalyticsEvent::with_payload(
                EVENT_SCROLL_DEPTH,
                &json!({ "milestone": milestone, "path": self.path }),
            ));
        }
        reached
    }
}

impl std::fmt::Debug for Analytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analytics")
            .field("path", &self.path)
            .field("distinct_id", &self.distinct_id)
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}
