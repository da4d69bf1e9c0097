// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Client Lifecycle Notifications
//!
//! This module provides the observer interface the client emits lifecycle
//! notifications through. Handlers are registered on the client and receive
//! connect/disconnect outcomes and connectivity transitions; they are consumed
//! by logging and telemetry collaborators and are not required for
//! correctness.

use std::time::Duration;

/// Outcome of a `connect` call, emitted on success and failure alike.
#[derive(Debug, Clone)]
pub struct ConnectCompleted {
    pub successful: bool,
    pub error: Option<String>,
    pub duration: Duration,
}

/// Outcome of a `disconnect` call, emitted only when teardown fully succeeds.
#[derive(Debug, Clone)]
pub struct DisconnectCompleted {
    pub successful: bool,
    pub error: Option<String>,
    pub duration: Duration,
}

/// Observer for client lifecycle notifications.
///
/// Every hook has an empty default body; implementors override only the
/// notifications they care about.
pub trait ClientEventHandler: Send + Sync {
    fn on_connect_completed(&self, _event: &ConnectCompleted) {}

    fn on_connection_state_changed(&self, _connected: bool) {}

    fn on_disconnect_completed(&self, _event: &DisconnectCompleted) {}
}
