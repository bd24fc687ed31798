// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live session commands: `listen` and `send`.

use std::io::Write;

use serde_json::{json, Value};
use tether_core::protocol::SendMessage;
use tether_core::{id, ActionKind};
use tokio::sync::watch;

use super::{require_token, require_user, Context};
use crate::api::ApiClient;
use crate::cli::AuthArgs;
use crate::connection::{Activity, ConnectionManager, ConnectionState};
use crate::error::{Error, Result};
use crate::offline::SharedQueue;
use crate::status::StatusIndicator;
use crate::sync::{SessionReplay, SyncOrchestrator, SyncStatus};
use crate::transport::Transport;

/// How a `send` ended up being delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Acknowledged by the server with this message id.
    Sent(String),
    /// Queued locally under this id for the next replay.
    Queued(String),
}

/// True if `event` passes the `--event` filter (empty means everything).
pub fn wants(filter: &[String], event: &str) -> bool {
    filter.is_empty() || filter.iter().any(|f| f == event)
}

/// Queue payload for a direct message.
pub fn message_payload(to: &str, content: &str, conversation: Option<&str>) -> Value {
    let mut payload = json!({ "recipientId": to, "content": content });
    if let Some(conversation) = conversation {
        payload["conversationId"] = Value::String(conversation.to_string());
    }
    payload
}

/// Print inbound frames until the session stops.
///
/// The queue is replayed over the session when streaming starts and each
/// time the session reopens. Returns the number of frames written.
pub async fn stream<T, W>(
    manager: &mut ConnectionManager<T>,
    sync: &SyncOrchestrator,
    api: &ApiClient,
    filter: &[String],
    out: &mut W,
) -> Result<usize>
where
    T: Transport,
    W: Write,
{
    if manager.is_connected() {
        replay(manager, sync, api).await;
    }

    let mut written = 0;
    while let Some(activity) = manager.next_activity().await {
        let envelope = match activity {
            Activity::Frame(envelope) => envelope,
            Activity::Reopened => {
                replay(manager, sync, api).await;
                continue;
            }
        };
        if !wants(filter, &envelope.event) {
            continue;
        }
        writeln!(out, "{}", envelope.to_json()?)?;
        out.flush()?;
        written += 1;
    }
    Ok(written)
}

async fn replay<T: Transport>(
    manager: &mut ConnectionManager<T>,
    sync: &SyncOrchestrator,
    api: &ApiClient,
) {
    match sync.pending_count().await {
        Ok(0) => return,
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "could not read offline queue");
            return;
        }
    }
    let mut target = SessionReplay::new(manager, api.clone());
    if let Err(e) = sync.on_online(&mut target).await {
        tracing::warn!(error = %e, "replay failed");
    }
}

/// Temp id for a message sent straight over the session.
pub fn temp_id(payload: &Value) -> String {
    id::generate_local_id(ActionKind::Message, payload, &chrono::Utc::now())
}

/// Send one message, queueing it when the session cannot confirm it.
pub async fn deliver<T: Transport>(
    manager: &mut ConnectionManager<T>,
    queue: &SharedQueue,
    token: &str,
    user_id: &str,
    payload: Value,
    temp_id: String,
) -> Result<Delivery> {
    let attempt = async {
        manager.connect(token, user_id).await?;
        let mut fields = payload.clone();
        fields["tempId"] = Value::String(temp_id);
        let message: SendMessage = serde_json::from_value(fields)?;
        manager.send_message_confirmed(message).await
    };

    let outcome = attempt.await;
    manager.disconnect().await;
    match outcome {
        Ok(ack) => Ok(Delivery::Sent(ack.message_id)),
        Err(Error::NotConnected | Error::Transport(_) | Error::AckTimeout { .. }) => {
            let local_id = queue.lock().await.enqueue(ActionKind::Message, payload)?;
            tracing::info!(local_id = %local_id, "session unavailable, message queued");
            Ok(Delivery::Queued(local_id))
        }
        Err(e) => Err(e),
    }
}

pub async fn run_send(
    ctx: &Context,
    to: &str,
    content: &str,
    conversation: Option<&str>,
    auth: &AuthArgs,
) -> Result<()> {
    let queue = ctx.open_queue()?;
    let token = require_token(auth, &queue)?;
    let user_id = require_user(auth)?;
    let queue = queue.into_shared();

    let mut config = ctx.config.connection();
    config.max_attempts = 0;
    let mut manager = ConnectionManager::new(config);
    manager.attach_queue(queue.clone());

    let payload = message_payload(to, content, conversation);
    let temp_id = temp_id(&payload);
    match deliver(&mut manager, &queue, &token, &user_id, payload, temp_id).await? {
        Delivery::Sent(message_id) => println!("sent {}", message_id),
        Delivery::Queued(local_id) => println!("queued {}", local_id),
    }
    Ok(())
}

pub async fn run_listen(ctx: &Context, auth: &AuthArgs, filter: &[String]) -> Result<()> {
    let queue = ctx.open_queue()?;
    let token = require_token(auth, &queue)?;
    let user_id = require_user(auth)?;
    let queue = queue.into_shared();

    let mut manager = ConnectionManager::new(ctx.config.connection());
    manager.attach_queue(queue.clone());
    let sync = SyncOrchestrator::new(queue)
        .with_display_delay(ctx.config.sync_display_delay())
        .with_agent(Box::new(ctx.agent()));
    let api = ApiClient::new(&ctx.config.api_base).with_token(Some(token.clone()));

    tokio::spawn(show_indicator(manager.subscribe_state(), sync.subscribe()));
    manager.connect(&token, &user_id).await?;

    let cancel = manager.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let written = stream(&mut manager, &sync, &api, filter, &mut stdout).await?;
    tracing::debug!(written, "listen finished");

    let pending = sync.pending_count().await?;
    if pending > 0 {
        match sync.request_background_sync().await {
            Ok((synced, failed)) => {
                tracing::info!(synced, failed, "background agent replayed queue")
            }
            Err(e) => tracing::debug!(error = %e, "background sync not delegated"),
        }
    }
    Ok(())
}

/// Print the indicator to stderr whenever it changes.
async fn show_indicator(
    mut connection: watch::Receiver<ConnectionState>,
    mut sync: watch::Receiver<SyncStatus>,
) {
    let mut shown: Option<StatusIndicator> = None;
    loop {
        let current = StatusIndicator::from_states(*connection.borrow(), *sync.borrow());
        if current != shown {
            match current {
                Some(indicator) => eprintln!("[{}]", indicator),
                None => eprintln!("[online]"),
            }
            shown = current;
        }
        tokio::select! {
            changed = connection.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            changed = sync.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
