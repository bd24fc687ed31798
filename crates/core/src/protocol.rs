// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session protocol frames for client-server communication.
//!
//! Every frame on the persistent session is a named event:
//! `{"event": "<name>", "data": {...}}`. Outbound events are built from the
//! typed [`ClientEvent`] enum; inbound frames are kept as [`Envelope`]s so
//! listeners can subscribe by name, with typed accessors for the payloads the
//! core itself needs to understand (e.g. [`MessageSent`] for correlation).

use serde::{Deserialize, Serialize};

/// Outbound event names.
pub mod outbound {
    pub const SEND_MESSAGE: &str = "send_message";
    pub const TYPING_START: &str = "typing_start";
    pub const TYPING_STOP: &str = "typing_stop";
    pub const POST_LIKE: &str = "post_like";
    pub const STORY_VIEW: &str = "story_view";
    pub const CALL_USER: &str = "call_user";
}

/// Inbound event names.
pub mod inbound {
    pub const NEW_MESSAGE: &str = "new_message";
    pub const MESSAGE_SENT: &str = "message_sent";
    pub const MESSAGE_DELIVERED: &str = "message_delivered";
    pub const MESSAGE_READ: &str = "message_read";
    pub const NEW_NOTIFICATION: &str = "new_notification";
    pub const POST_LIKED: &str = "post_liked";
    pub const INCOMING_CALL: &str = "incoming_call";
    pub const USER_STATUS_CHANGED: &str = "user_status_changed";
}

/// Local status events emitted by the connection manager, never sent on the wire.
pub mod status {
    pub const SOCKET_CONNECTED: &str = "socket_connected";
    pub const SOCKET_DISCONNECTED: &str = "socket_disconnected";
    pub const SOCKET_ERROR: &str = "socket_error";
    pub const SOCKET_RECONNECTING: &str = "socket_reconnecting";
    pub const SOCKET_RECONNECT_FAILED: &str = "socket_reconnect_failed";
}

/// A named event frame as it travels on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Creates an envelope from a name and payload.
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Envelope {
            event: event.into(),
            data,
        }
    }

    /// Deserializes the payload into a typed value.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a frame from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Payload of `send_message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub recipient_id: String,
    pub content: String,
    /// Caller-chosen id used to reconcile optimistic UI with the server id.
    pub temp_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Payload of `typing_start` / `typing_stop`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Typing {
    pub conversation_id: String,
    pub recipient_id: String,
}

/// Payload of `post_like`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostLike {
    pub post_id: String,
    pub author_id: String,
}

/// Payload of `story_view`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    pub story_id: String,
    pub author_id: String,
}

/// Payload of `call_user`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallUser {
    pub recipient_id: String,
    pub call_type: CallType,
    /// Opaque session description forwarded to the callee.
    pub offer: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Audio,
    Video,
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SendMessage(SendMessage),
    TypingStart(Typing),
    TypingStop(Typing),
    PostLike(PostLike),
    StoryView(StoryView),
    CallUser(CallUser),
}

impl ClientEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SendMessage(_) => outbound::SEND_MESSAGE,
            ClientEvent::TypingStart(_) => outbound::TYPING_START,
            ClientEvent::TypingStop(_) => outbound::TYPING_STOP,
            ClientEvent::PostLike(_) => outbound::POST_LIKE,
            ClientEvent::StoryView(_) => outbound::STORY_VIEW,
            ClientEvent::CallUser(_) => outbound::CALL_USER,
        }
    }

    /// The correlation id carried by this event, if any.
    pub fn temp_id(&self) -> Option<&str> {
        match self {
            ClientEvent::SendMessage(msg) => Some(&msg.temp_id),
            _ => None,
        }
    }

    /// Converts to a generic wire envelope.
    pub fn into_envelope(self) -> Result<Envelope, serde_json::Error> {
        let value = serde_json::to_value(&self)?;
        serde_json::from_value(value)
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Payload of inbound `message_sent`: the server's id for a `tempId`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSent {
    pub temp_id: String,
    pub message_id: String,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
