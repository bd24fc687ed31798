// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted collaborators shared by the agent's unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tether_ipc::ClientNotice;

use crate::network::{Network, NetworkError, NetworkFuture, Request, Response};
use crate::push::{ClientWindows, NotificationDescriptor, Notifier, WindowId};

#[derive(Default)]
struct NetworkState {
    responses: HashMap<String, Response>,
    offline: bool,
    requests: Vec<Request>,
}

/// Network answering from a path → response table.
///
/// Unknown paths answer 404. Clones share state.
#[derive(Clone, Default)]
pub struct MockNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, response: Response) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(path.to_string(), response);
    }

    pub fn respond_ok(&self, path: &str, body: &str) {
        self.respond(path, Response::new(200, body));
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

impl Network for MockNetwork {
    fn fetch<'a>(&'a self, request: &'a Request) -> NetworkFuture<'a> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut state = state.lock().unwrap();
            state.requests.push(request.clone());
            if state.offline {
                return Err(NetworkError::Unreachable("offline".into()));
            }
            Ok(state
                .responses
                .get(&request.path)
                .cloned()
                .unwrap_or_else(|| Response::new(404, "not found")))
        })
    }
}

/// Notifier recording every notification shown.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub shown: Arc<Mutex<Vec<NotificationDescriptor>>>,
}

impl Notifier for RecordingNotifier {
    fn show(&mut self, notification: &NotificationDescriptor) {
        self.shown.lock().unwrap().push(notification.clone());
    }
}

#[derive(Default)]
pub struct WindowsState {
    pub open: Vec<WindowId>,
    pub focused: Vec<WindowId>,
    pub posted: Vec<(WindowId, ClientNotice)>,
    pub opened: Vec<String>,
}

/// Window set with scripted open windows.
#[derive(Clone, Default)]
pub struct FakeWindows {
    pub state: Arc<Mutex<WindowsState>>,
}

impl FakeWindows {
    pub fn with_open(ids: &[WindowId]) -> Self {
        let windows = Self::default();
        windows.state.lock().unwrap().open = ids.to_vec();
        windows
    }
}

impl ClientWindows for FakeWindows {
    fn list(&self) -> Vec<WindowId> {
        self.state.lock().unwrap().open.clone()
    }

    fn focus(&mut self, id: WindowId) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.open.contains(&id) {
            state.focused.push(id);
            true
        } else {
            false
        }
    }

    fn post(&mut self, id: WindowId, notice: &ClientNotice) {
        self.state.lock().unwrap().posted.push((id, notice.clone()));
    }

    fn open(&mut self, url: &str) {
        self.state.lock().unwrap().opened.push(url.to_string());
    }
}
