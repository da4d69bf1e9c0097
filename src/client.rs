// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # AMQP Connection Lifecycle Manager
//!
//! This module provides the client that owns the factory, connection, and
//! channel handles, decides when the transport must be rebuilt, and guards
//! every message operation behind a connectivity check.
//!
//! The three handles obey a strict nesting: a channel only exists under an
//! open connection, a connection only under a factory, and a full teardown
//! clears the inner handles together. One client instance is meant for one
//! logical session at a time; nothing here is safe for concurrent callers.

use crate::{
    errors::AmqpError,
    events::{ClientEventHandler, ConnectCompleted, DisconnectCompleted},
    message::AmqpMessage,
    otel,
    settings::AmqpSettings,
    transport::{AmqpConnectionFactory, BrokerChannel, BrokerConnection, ConnectionFactory},
};
use lapin::types::{FieldTable, ShortString};
use opentelemetry::Context;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, error};
use uuid::Uuid;

/// Builds a connection factory from settings. The client invokes this on every
/// `init`, so replacing it swaps the whole transport stack underneath the
/// lifecycle logic.
pub type FactoryProvider = Box<dyn Fn(&AmqpSettings) -> Box<dyn ConnectionFactory> + Send + Sync>;

/// Client-side connection and message-exchange manager for one AMQP endpoint.
///
/// The client starts uninitialized: `init` builds the connection factory from
/// the current settings, `connect` opens the connection and channel through
/// it. Every message operation first evaluates `is_connected` and fails with
/// [`AmqpError::NotConnected`] without touching the channel when the check
/// does not hold. The instance is reusable across any number of
/// connect/disconnect cycles.
pub struct AmqpClient {
    settings: AmqpSettings,
    factory_provider: FactoryProvider,
    factory: Option<Box<dyn ConnectionFactory>>,
    connection: Option<Box<dyn BrokerConnection>>,
    channel: Option<Box<dyn BrokerChannel>>,
    handlers: Vec<Arc<dyn ClientEventHandler>>,
}

impl AmqpClient {
    /// Creates an uninitialized client over the lapin-backed transport.
    ///
    /// # Parameters
    /// * `settings` - Connection and routing configuration for the endpoint
    ///
    /// # Returns
    /// An uninitialized AmqpClient; call `init` then `connect` to open the
    /// transport
    pub fn new(settings: AmqpSettings) -> Self {
        Self::with_factory_provider(
            settings,
            Box::new(|settings| Box::new(AmqpConnectionFactory::from_settings(settings))),
        )
    }

    /// Creates an uninitialized client with a custom transport seam.
    ///
    /// # Parameters
    /// * `settings` - Connection and routing configuration for the endpoint
    /// * `factory_provider` - Builds the connection factory on every `init`
    pub fn with_factory_provider(
        settings: AmqpSettings,
        factory_provider: FactoryProvider,
    ) -> Self {
        AmqpClient {
            settings,
            factory_provider,
            factory: None,
            connection: None,
            channel: None,
            handlers: Vec::new(),
        }
    }

    /// Registers an observer for lifecycle notifications.
    ///
    /// # Parameters
    /// * `handler` - Observer invoked on connect, disconnect, and
    ///   connectivity transitions
    pub fn subscribe(&mut self, handler: Arc<dyn ClientEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn settings(&self) -> &AmqpSettings {
        &self.settings
    }

    /// Replaces the configuration, rebuilding the transport description.
    ///
    /// A structurally equal value is a no-op. Otherwise the client tears the
    /// transport down, stores the new settings, and rebuilds the factory. It
    /// does not reconnect.
    ///
    /// # Parameters
    /// * `settings` - The replacement configuration
    ///
    /// # Returns
    /// Ok(()) on success; a teardown error propagates and leaves the old
    /// settings in place
    pub async fn replace_settings(&mut self, settings: AmqpSettings) -> Result<(), AmqpError> {
        if settings == self.settings {
            return Ok(());
        }

        debug!("settings changed, rebuilding the connection factory");
        self.disconnect().await?;
        self.settings = settings;
        self.init();

        Ok(())
    }

    /// Builds a new connection factory from the current settings.
    ///
    /// Performs no I/O and always succeeds; any prior factory is overwritten.
    pub fn init(&mut self) {
        debug!("building connection factory from settings");
        self.factory = Some((self.factory_provider)(&self.settings));
    }

    /// Clears the factory. Connection and channel are left untouched.
    pub fn deinit(&mut self) {
        self.factory = None;
    }

    /// True iff the factory is set and both connection and channel are open.
    ///
    /// Checks run cheapest-first and short-circuit: when the factory is
    /// missing the connection is never probed, when the connection is not
    /// open the channel is never probed.
    pub fn is_connected(&self) -> bool {
        self.factory.is_some()
            && self.connection.as_ref().is_some_and(|conn| conn.is_open())
            && self.channel.as_ref().is_some_and(|chan| chan.is_open())
    }

    /// Opens the connection and channel through the factory.
    ///
    /// Fails with [`AmqpError::NoConnectionFactory`] before any connection
    /// attempt when `init` has not run. A failure past that point tears the
    /// half-built transport down before surfacing; when that implicit
    /// teardown itself fails, its error takes the original failure's place.
    /// Emits a connect-completed and a connection-state-changed notification
    /// on both outcomes.
    ///
    /// # Returns
    /// Ok(()) with all three handles populated, or the typed reason the
    /// transport could not be opened
    pub async fn connect(&mut self) -> Result<(), AmqpError> {
        let started = Instant::now();

        let result = if self.factory.is_none() {
            Err(AmqpError::NoConnectionFactory)
        } else {
            match self.open_transport().await {
                Ok(()) => Ok(()),
                Err(err) => {
                    error!(error = err.to_string(), "failure to connect");
                    match self.disconnect().await {
                        Ok(()) => Err(err),
                        Err(shutdown_err) => Err(shutdown_err),
                    }
                }
            }
        };

        let connected = result.is_ok();
        self.emit_connect_completed(&result, started.elapsed());
        self.emit_connection_state_changed(connected);

        result
    }

    async fn open_transport(&mut self) -> Result<(), AmqpError> {
        let factory = self.factory.as_ref().ok_or(AmqpError::NoConnectionFactory)?;

        let connection = factory
            .create_connection()
            .await?
            .ok_or(AmqpError::NoConnection)?;

        let channel = match connection.create_channel().await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                self.connection = Some(connection);
                return Err(AmqpError::NoChannel);
            }
            Err(err) => {
                self.connection = Some(connection);
                return Err(err);
            }
        };

        self.connection = Some(connection);
        self.channel = Some(channel);
        debug!("amqp client connected");

        Ok(())
    }

    /// Idempotent best-effort teardown of the channel and connection.
    ///
    /// Each handle is closed only when open, then disposed and cleared. A
    /// close error propagates immediately: when the channel close fails the
    /// channel handle stays in place and the connection step never runs; when
    /// the connection close fails the connection handle stays in place with
    /// the channel already cleared. The factory is never touched. Emits a
    /// disconnect-completed notification only when the whole teardown
    /// succeeds.
    ///
    /// # Returns
    /// Ok(()) once both handles are released, or the close error of the tier
    /// that failed
    pub async fn disconnect(&mut self) -> Result<(), AmqpError> {
        let started = Instant::now();

        if let Some(channel) = self.channel.as_ref() {
            if channel.is_open() {
                channel.close().await?;
            }
            if let Some(channel) = self.channel.take() {
                channel.dispose();
            }
        }

        if let Some(connection) = self.connection.as_ref() {
            if connection.is_open() {
                connection.close().await?;
            }
            if let Some(connection) = self.connection.take() {
                connection.dispose();
            }
        }

        debug!("amqp client disconnected");
        self.emit_disconnect_completed(started.elapsed());

        Ok(())
    }

    /// Publishes the message to the configured exchange under the message's
    /// routing key, stamping a message id and the current trace context.
    ///
    /// # Parameters
    /// * `message` - The message whose properties and body are published
    ///
    /// # Returns
    /// Ok(()) on publish, [`AmqpError::NotConnected`] when the client is not
    /// connected, or the underlying publish error
    pub async fn write_msg(&self, message: &AmqpMessage) -> Result<(), AmqpError> {
        let channel = self.guarded_channel("write_msg")?;

        let mut headers = message
            .properties()
            .headers()
            .clone()
            .unwrap_or_default()
            .inner()
            .clone();
        otel::inject_context(&Context::current(), &mut headers);

        let properties = message
            .properties()
            .clone()
            .with_message_id(ShortString::from(Uuid::new_v4().to_string()))
            .with_headers(FieldTable::from(headers));

        match channel
            .publish(
                self.settings.exchange(),
                message.routing_key(),
                &properties,
                message.body().unwrap_or_default(),
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(error = err.to_string(), "error publishing message");
                Err(err)
            }
        }
    }

    /// Non-blocking read of one message from the configured queue.
    ///
    /// # Parameters
    /// * `auto_ack` - Consume without requiring an explicit acknowledgment
    ///
    /// # Returns
    /// Ok(Some(message)) when one was waiting, Ok(None) for an empty queue
    /// (a normal outcome, not a failure), or the connectivity/transport error
    pub async fn read_msg(&self, auto_ack: bool) -> Result<Option<AmqpMessage>, AmqpError> {
        let channel = self.guarded_channel("read_msg")?;

        channel.get(self.settings.queue(), auto_ack).await
    }

    /// Acknowledges the message's delivery tag, single-message scope.
    pub async fn ack_msg(&self, message: &AmqpMessage) -> Result<(), AmqpError> {
        let channel = self.guarded_channel("ack_msg")?;

        channel.ack(message.delivery_tag()).await
    }

    /// Negative-acknowledges the message's delivery tag, single-message
    /// scope.
    ///
    /// # Parameters
    /// * `message` - The broker-delivered message to reject
    /// * `requeue` - Whether the broker should requeue the message
    pub async fn nack_msg(&self, message: &AmqpMessage, requeue: bool) -> Result<(), AmqpError> {
        let channel = self.guarded_channel("nack_msg")?;

        channel.nack(message.delivery_tag(), requeue).await
    }

    /// Blocks up to `timeout` for the broker's publisher confirms.
    ///
    /// # Parameters
    /// * `timeout` - How long to wait for the confirms to arrive
    ///
    /// # Returns
    /// Ok(true) when every publish was confirmed within the window, Ok(false)
    /// otherwise
    pub async fn wait_for_write_confirm(&self, timeout: Duration) -> Result<bool, AmqpError> {
        let channel = self.guarded_channel("wait_for_write_confirm")?;

        channel.wait_for_confirms(timeout).await
    }

    /// Current message count of the configured queue.
    ///
    /// # Returns
    /// The number of messages the broker reports waiting on the queue
    pub async fn queued_msgs(&self) -> Result<u32, AmqpError> {
        let channel = self.guarded_channel("queued_msgs")?;

        channel.message_count(self.settings.queue()).await
    }

    fn guarded_channel(&self, operation: &str) -> Result<&dyn BrokerChannel, AmqpError> {
        if !self.is_connected() {
            return Err(AmqpError::NotConnected(operation.to_owned()));
        }

        self.channel
            .as_deref()
            .ok_or_else(|| AmqpError::NotConnected(operation.to_owned()))
    }

    fn emit_connect_completed(&self, result: &Result<(), AmqpError>, duration: Duration) {
        let event = ConnectCompleted {
            successful: result.is_ok(),
            error: result.as_ref().err().map(|err| err.to_string()),
            duration,
        };

        for handler in &self.handlers {
            handler.on_connect_completed(&event);
        }
    }

    fn emit_connection_state_changed(&self, connected: bool) {
        for handler in &self.handlers {
            handler.on_connection_state_changed(connected);
        }
    }

    fn emit_disconnect_completed(&self, duration: Duration) {
        let event = DisconnectCompleted {
            successful: true,
            error: None,
            duration,
        };

        for handler in &self.handlers {
            handler.on_disconnect_completed(&event);
        }
    }
}
