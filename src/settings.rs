// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # AMQP Client Settings
//!
//! This module provides the configuration value object consumed by the client.
//! Every field is optional at construction; an unset field resolves to its
//! documented default each time it is read. Equality and hashing are defined
//! over the resolved values, so an empty settings value compares equal to one
//! that spells out every default explicitly.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5672;
pub const DEFAULT_USERNAME: &str = "guest";
pub const DEFAULT_PASSWORD: &str = "guest";
pub const DEFAULT_VIRTUAL_HOST: &str = "/";
pub const DEFAULT_EXCHANGE: &str = "amq.direct";
pub const DEFAULT_QUEUE: &str = "";

/// Connection and routing configuration for an AMQP client.
///
/// Fields left unset resolve to their defaults at read time through the
/// accessor methods. The value is read-only once handed to the client except
/// through the client's settings-replacement operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmqpSettings {
    hostname: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    virtual_host: Option<String>,
    exchange: Option<String>,
    queue: Option<String>,
}

impl AmqpSettings {
    /// Creates a settings value with every field unset, resolving to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_virtual_host(mut self, virtual_host: impl Into<String>) -> Self {
        self.virtual_host = Some(virtual_host.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or(DEFAULT_HOSTNAME)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(DEFAULT_USERNAME)
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or(DEFAULT_PASSWORD)
    }

    pub fn virtual_host(&self) -> &str {
        self.virtual_host.as_deref().unwrap_or(DEFAULT_VIRTUAL_HOST)
    }

    pub fn exchange(&self) -> &str {
        self.exchange.as_deref().unwrap_or(DEFAULT_EXCHANGE)
    }

    pub fn queue(&self) -> &str {
        self.queue.as_deref().unwrap_or(DEFAULT_QUEUE)
    }
}

impl PartialEq for AmqpSettings {
    fn eq(&self, other: &Self) -> bool {
        self.hostname() == other.hostname()
            && self.port() == other.port()
            && self.username() == other.username()
            && self.password() == other.password()
            && self.virtual_host() == other.virtual_host()
            && self.exchange() == other.exchange()
            && self.queue() == other.queue()
    }
}

impl Eq for AmqpSettings {}

impl Hash for AmqpSettings {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hostname().hash(state);
        self.port().hash(state);
        self.username().hash(state);
        self.password().hash(state);
        self.virtual_host().hash(state);
        self.exchange().hash(state);
        self.queue().hash(state);
    }
}
