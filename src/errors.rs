// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the AMQP Client
//!
//! This module provides the error taxonomy for the client. Precondition
//! failures (a missing transport tier, an operation attempted while not
//! connected) are distinguished variants with fixed messages; everything the
//! underlying transport library raises is passed through unwrapped.

use thiserror::Error;

/// Represents errors that can occur during AMQP client operations.
///
/// The first four variants signal which transport tier was missing or
/// uninitialized when an operation was attempted. `Transport` wraps any error
/// raised by the underlying broker library without reinterpreting it.
#[derive(Error, Debug)]
pub enum AmqpError {
    /// `connect` was called before `init` built a connection factory
    #[error("no connection factory available on AmqpClient, call init before connect")]
    NoConnectionFactory,

    /// The connection factory yielded no connection
    #[error("no connection available on AmqpClient, the factory produced no connection")]
    NoConnection,

    /// The connection yielded no channel
    #[error("no channel available on AmqpClient, the connection produced no channel")]
    NoChannel,

    /// A message operation was attempted while the client was not connected
    #[error("operation `{0}` requires an initialized and connected AmqpClient")]
    NotConnected(String),

    /// Error serializing or deserializing a message payload
    #[error("failure to handle message payload: {0}")]
    Payload(String),

    /// Error raised by the underlying transport library, passed through
    #[error(transparent)]
    Transport(#[from] lapin::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_messages_name_the_client_type() {
        assert!(AmqpError::NoConnectionFactory
            .to_string()
            .contains("AmqpClient"));
        assert!(AmqpError::NoConnection.to_string().contains("AmqpClient"));
        assert!(AmqpError::NoChannel.to_string().contains("AmqpClient"));
    }

    #[test]
    fn not_connected_carries_the_operation_name() {
        let err = AmqpError::NotConnected("write_msg".to_owned());
        assert!(err.to_string().contains("write_msg"));
    }

    #[test]
    fn transport_errors_pass_through_unwrapped() {
        let err = AmqpError::from(lapin::Error::InvalidChannelState(
            lapin::ChannelState::Closed,
        ));
        assert_eq!(
            err.to_string(),
            lapin::Error::InvalidChannelState(lapin::ChannelState::Closed).to_string()
        );
    }
}
