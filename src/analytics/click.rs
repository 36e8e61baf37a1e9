//! Click payloads for activated links and buttons

use serde::Serialize;

use super::action_id::action_id;

/// Longest `action`/`text` value sent with a click
const MAX_LABEL_CHARS: usize = 120;

/// Attributes of the element a user activated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickTarget {
    /// Upper-case tag name, e.g. `A` or `BUTTON`
    pub tag: String,
    pub role: Option<String>,
    /// Explicit analytics id (`data-ph-id`)
    pub ph_id: Option<String>,
    /// Alternative analytics id (`data-analytics-id`)
    pub analytics_id: Option<String>,
    /// Element id
    pub dom_id: Option<String>,
    /// Explicit action label (`data-action`)
    pub action: Option<String>,
    pub aria_label: Option<String>,
    pub name: Option<String>,
    /// Visible text
    pub text: Option<String>,
    /// Form value, used when there is no text
    pub value: Option<String>,
    pub href: Option<String>,
    pub classes: Option<String>,
}

impl ClickTarget {
    /// An anchor with visible text
    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            tag: "A".to_string(),
            text: Some(text.into()),
            href: Some(href.into()),
            ..Self::default()
        }
    }

    pub fn with_ph_id(mut self, id: impl Into<String>) -> Self {
        self.ph_id = Some(id.into());
        self
    }

    pub fn with_dom_id(mut self, id: impl Into<String>) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    fn is_anchor(&self) -> bool {
        self.tag.eq_ignore_ascii_case("a")
    }

    /// Explicit analytics id, preferring `data-ph-id`
    fn explicit_id(&self) -> Option<&str> {
        non_empty(self.ph_id.as_deref()).or_else(|| non_empty(self.analytics_id.as_deref()))
    }

    /// Human-readable label, in order of how deliberately it was set
    fn label(&self) -> Option<String> {
        non_empty(self.action.as_deref())
            .or_else(|| non_empty(self.aria_label.as_deref()))
            .or_else(|| non_empty(self.name.as_deref()))
            .map(str::to_string)
            .or_else(|| {
                let raw = non_empty(self.text.as_deref()).or(self.value.as_deref())?;
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
    }
}

/// Properties of a `ui_click` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiClick {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub path: String,
}

impl UiClick {
    /// Builds the click payload for `target` activated on page `path`
    pub fn from_target(target: &ClickTarget, path: &str) -> Self {
        let ph_id = target.explicit_id();
        let dom_id = non_empty(target.dom_id.as_deref());
        let role = non_empty(target.role.as_deref());
        let label = target.label();
        let href = if target.is_anchor() {
            non_empty(target.href.as_deref())
        } else {
            None
        };

        let action_id = action_id([
            ph_id.unwrap_or(""),
            dom_id.unwrap_or(""),
            target.tag.as_str(),
            role.unwrap_or(""),
            href.unwrap_or(""),
            label.as_deref().unwrap_or(""),
            path,
        ]);

        Self {
            tag: target.tag.clone(),
            role: role.map(str::to_string),
            id: dom_id.map(str::to_string),
            ph_id: ph_id.map(str::to_string),
            action: label.as_deref().map(truncate),
            action_id,
            classes: non_empty(target.classes.as_deref()).map(str::to_string),
            text: truncate(target.text.as_deref().unwrap_or("").trim()),
            href: href.map(str::to_string),
            path: path.to_string(),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn truncate(s: &str) -> String {
    s.chars().take(MAX_LABEL_CHARS).collect()
}
