// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push delivery and notification click routing.
//!
//! A push payload is a JSON document:
//!
//! ```json
//! {"title": "New message", "body": "Ana: hey", "tag": "msg-c1",
//!  "data": {"type": "message", "conversationId": "c1"}}
//! ```
//!
//! Malformed payloads never fail delivery; they are replaced by a default
//! notification.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_ipc::ClientNotice;

pub const DEFAULT_TITLE: &str = "New notification";
pub const DEFAULT_BODY: &str = "You have a new notification";
pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/icons/badge-72x72.png";
pub const DEFAULT_TAG: &str = "default";

/// Action id that closes a notification without navigating.
pub const DISMISS_ACTION: &str = "dismiss";

/// Why a push payload could not be used as-is.
#[derive(Debug, thiserror::Error)]
pub enum PushDeliveryError {
    #[error("empty push payload")]
    Empty,

    #[error("malformed push payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

impl NotificationAction {
    pub fn new(action: &str, title: &str) -> Self {
        NotificationAction {
            action: action.to_string(),
            title: title.to_string(),
        }
    }
}

/// Everything needed to display one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub actions: Vec<NotificationAction>,
    pub data: Value,
    pub require_interaction: bool,
}

impl Default for NotificationDescriptor {
    fn default() -> Self {
        NotificationDescriptor {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_BADGE.to_string(),
            tag: DEFAULT_TAG.to_string(),
            actions: default_actions(),
            data: Value::Object(Default::default()),
            require_interaction: false,
        }
    }
}

fn default_actions() -> Vec<NotificationAction> {
    vec![
        NotificationAction::new("open", "Open"),
        NotificationAction::new(DISMISS_ACTION, "Dismiss"),
    ]
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload {
    title: Option<String>,
    body: Option<String>,
    icon: Option<String>,
    badge: Option<String>,
    tag: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    actions: Option<Vec<NotificationAction>>,
    data: Option<Value>,
    #[serde(default)]
    require_interaction: bool,
}

/// Parse a push payload into a notification.
pub fn parse_push(bytes: &[u8]) -> Result<NotificationDescriptor, PushDeliveryError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(PushDeliveryError::Empty);
    }
    let payload: PushPayload = serde_json::from_slice(bytes)?;
    let defaults = NotificationDescriptor::default();

    let mut data = match payload.data {
        Some(Value::Object(map)) => map,
        _ => Default::default(),
    };
    // A top-level type is accepted as shorthand for data.type
    if let Some(kind) = payload.kind {
        data.entry("type").or_insert(Value::String(kind));
    }

    Ok(NotificationDescriptor {
        title: payload.title.unwrap_or(defaults.title),
        body: payload.body.unwrap_or(defaults.body),
        icon: payload.icon.unwrap_or(defaults.icon),
        badge: payload.badge.unwrap_or(defaults.badge),
        tag: payload.tag.unwrap_or(defaults.tag),
        actions: payload.actions.unwrap_or(defaults.actions),
        data: Value::Object(data),
        require_interaction: payload.require_interaction,
    })
}

/// Parse a push payload, substituting the default notification on failure.
pub fn notification_for(bytes: &[u8]) -> NotificationDescriptor {
    match parse_push(bytes) {
        Ok(notification) => notification,
        Err(e) => {
            tracing::warn!(error = %e, "showing default notification");
            NotificationDescriptor::default()
        }
    }
}

/// In-app path a notification click navigates to.
pub fn click_target(data: &Value) -> String {
    let field = |name: &str| data.get(name).and_then(Value::as_str);

    let target = match field("type") {
        Some("message") => field("conversationId").map(|id| format!("/messages/{}", id)),
        Some("friend_request") => field("userId").map(|id| format!("/profile/{}", id)),
        Some("post_like" | "post_comment" | "post_share") => {
            field("postId").map(|id| format!("/posts/{}", id))
        }
        _ => None,
    };
    target.unwrap_or_else(|| "/".to_string())
}

/// Identifies an open client window.
pub type WindowId = u64;

/// Displays notifications to the user.
pub trait Notifier: Send {
    fn show(&mut self, notification: &NotificationDescriptor);
}

/// The set of open client windows the agent can reach.
pub trait ClientWindows: Send {
    fn list(&self) -> Vec<WindowId>;
    /// Bring a window to the foreground. Returns false if it is gone.
    fn focus(&mut self, id: WindowId) -> bool;
    fn post(&mut self, id: WindowId, notice: &ClientNotice);
    fn open(&mut self, url: &str);
}

/// Notifier for a headless daemon: notifications go to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&mut self, notification: &NotificationDescriptor) {
        tracing::info!(
            title = %notification.title,
            tag = %notification.tag,
            "notification: {}",
            notification.body
        );
    }
}

/// Window set for a headless daemon: there are never open windows.
#[derive(Debug, Default)]
pub struct NoWindows;

impl ClientWindows for NoWindows {
    fn list(&self) -> Vec<WindowId> {
        Vec::new()
    }

    fn focus(&mut self, _id: WindowId) -> bool {
        false
    }

    fn post(&mut self, _id: WindowId, _notice: &ClientNotice) {}

    fn open(&mut self, url: &str) {
        tracing::info!(url, "open window");
    }
}

/// Route a notification click. Returns the URL navigated to, or `None` for
/// the dismiss action.
pub fn route_click(
    windows: &mut dyn ClientWindows,
    data: &Value,
    action: Option<&str>,
) -> Option<String> {
    if action == Some(DISMISS_ACTION) {
        return None;
    }

    let url = click_target(data);
    let focused = windows
        .list()
        .into_iter()
        .find(|id| windows.focus(*id));

    match focused {
        Some(id) => windows.post(id, &ClientNotice::Navigate { url: url.clone() }),
        None => windows.open(&url),
    }
    Some(url)
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
