// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # AMQP Client
//!
//! Client-side connection and message-exchange manager for an AMQP broker
//! endpoint. The [`client::AmqpClient`] owns the factory → connection →
//! channel lifecycle, rebuilds the transport when its settings change, and
//! guards every message operation behind a connectivity check, surfacing a
//! typed reason for each failure.

mod otel;

pub mod client;
pub mod errors;
pub mod events;
pub mod message;
pub mod settings;
pub mod transport;

pub use client::AmqpClient;
pub use errors::AmqpError;
pub use message::AmqpMessage;
pub use otel::extract_context;
pub use settings::AmqpSettings;
