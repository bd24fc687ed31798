// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::Value;
use tether_core::protocol::SendMessage;
use tether_core::{ActionKind, PendingAction, ReplayTarget, WriteError, WriteFuture};

use crate::api::ApiClient;
use crate::connection::ConnectionManager;
use crate::transport::Transport;

/// Replays every action over HTTP.
pub struct HttpReplay {
    api: ApiClient,
}

impl HttpReplay {
    pub fn new(api: ApiClient) -> Self {
        HttpReplay { api }
    }
}

impl ReplayTarget for HttpReplay {
    fn write<'a>(&'a mut self, action: &'a PendingAction) -> WriteFuture<'a> {
        Box::pin(async move {
            self.api
                .submit(action.kind, &action.payload)
                .await
                .map(|_| ())
                .map_err(|e| WriteError::new(e.to_string()))
        })
    }
}

/// Replays messages over the live session, everything else over HTTP.
///
/// A message's local id doubles as its `tempId`, so the server's
/// `message_sent` acknowledgment identifies exactly which record to drop.
pub struct SessionReplay<'m, T: Transport> {
    manager: &'m mut ConnectionManager<T>,
    http: HttpReplay,
}

impl<'m, T: Transport> SessionReplay<'m, T> {
    pub fn new(manager: &'m mut ConnectionManager<T>, api: ApiClient) -> Self {
        SessionReplay {
            manager,
            http: HttpReplay::new(api),
        }
    }
}

impl<T: Transport> ReplayTarget for SessionReplay<'_, T> {
    fn write<'a>(&'a mut self, action: &'a PendingAction) -> WriteFuture<'a> {
        Box::pin(async move {
            if action.kind != ActionKind::Message || !self.manager.is_connected() {
                return self.http.write(action).await;
            }

            let message = to_send_message(action)?;
            self.manager
                .send_message_confirmed(message)
                .await
                .map(|ack| {
                    tracing::debug!(
                        local_id = %action.local_id,
                        message_id = %ack.message_id,
                        "message acknowledged"
                    );
                })
                .map_err(|e| WriteError::new(e.to_string()))
        })
    }
}

fn to_send_message(action: &PendingAction) -> Result<SendMessage, WriteError> {
    let mut payload = action.payload.clone();
    let Some(fields) = payload.as_object_mut() else {
        return Err(WriteError::new("message payload is not an object"));
    };
    fields.insert("tempId".to_string(), Value::String(action.local_id.clone()));
    serde_json::from_value(payload).map_err(|e| WriteError::new(format!("invalid message: {}", e)))
}
