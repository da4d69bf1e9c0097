// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # AMQP Message Entity
//!
//! This module provides the message value object exchanged with the broker.
//! Delivery tag, redelivered flag, and exchange are only meaningful for
//! messages that came out of a broker read; messages built for publishing
//! carry tag 0, an empty exchange, and `redelivered == false`.

use crate::errors::AmqpError;
use lapin::{message::BasicGetMessage, types::ShortString, BasicProperties};
use serde::{de::DeserializeOwned, Serialize};
use std::time::SystemTime;

/// Content type stamped on messages built through the JSON body helpers
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One unit of payload exchanged with the broker.
///
/// Mutating the routing key, properties, or body re-derives the value as a
/// fresh, not-yet-delivered message: the receipt timestamp is cleared.
#[derive(Debug, Clone, Default)]
pub struct AmqpMessage {
    delivery_tag: u64,
    redelivered: bool,
    exchange: String,
    routing_key: String,
    properties: BasicProperties,
    body: Option<Vec<u8>>,
    received_at: Option<SystemTime>,
}

impl AmqpMessage {
    /// Creates a fresh publish-side message with an empty routing key and no body.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.set_routing_key(routing_key);
        self
    }

    pub fn with_properties(mut self, properties: BasicProperties) -> Self {
        self.set_properties(properties);
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.set_body(body);
        self
    }

    /// Serializes `value` as the JSON body and stamps the JSON content type.
    pub fn with_json_body<T: Serialize>(mut self, value: &T) -> Result<Self, AmqpError> {
        let body = serde_json::to_vec(value).map_err(|err| AmqpError::Payload(err.to_string()))?;
        self.properties = self
            .properties
            .clone()
            .with_content_type(ShortString::from(JSON_CONTENT_TYPE));
        self.set_body(body);
        Ok(self)
    }

    pub fn set_routing_key(&mut self, routing_key: impl Into<String>) {
        self.routing_key = routing_key.into();
        self.received_at = None;
    }

    pub fn set_properties(&mut self, properties: BasicProperties) {
        self.properties = properties;
        self.received_at = None;
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = Some(body);
        self.received_at = None;
    }

    /// Broker-delivered message stand-in for transport-less tests.
    #[cfg(test)]
    pub(crate) fn delivered(delivery_tag: u64, routing_key: &str, body: Vec<u8>) -> Self {
        AmqpMessage {
            delivery_tag,
            redelivered: false,
            exchange: "amq.direct".to_owned(),
            routing_key: routing_key.to_owned(),
            properties: BasicProperties::default(),
            body: Some(body),
            received_at: Some(SystemTime::now()),
        }
    }

    /// Deserializes the body as JSON.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, AmqpError> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| AmqpError::Payload("message has no body".to_owned()))?;
        serde_json::from_slice(body).map_err(|err| AmqpError::Payload(err.to_string()))
    }

    /// Per-channel identifier of a delivered message, 0 if never delivered.
    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn properties(&self) -> &BasicProperties {
        &self.properties
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// When the client wrapped this message out of a broker read, if ever.
    pub fn received_at(&self) -> Option<SystemTime> {
        self.received_at
    }
}

impl From<BasicGetMessage> for AmqpMessage {
    fn from(message: BasicGetMessage) -> Self {
        let delivery = message.delivery;

        AmqpMessage {
            delivery_tag: delivery.delivery_tag,
            redelivered: delivery.redelivered,
            exchange: delivery.exchange.to_string(),
            routing_key: delivery.routing_key.to_string(),
            properties: delivery.properties,
            body: Some(delivery.data),
            received_at: Some(SystemTime::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Order {
        id: u32,
        item: String,
    }

    #[test]
    fn publish_side_messages_are_fresh() {
        let message = AmqpMessage::new()
            .with_routing_key("orders.created")
            .with_body(vec![1, 2, 3]);

        assert_eq!(message.delivery_tag(), 0);
        assert!(!message.redelivered());
        assert_eq!(message.exchange(), "");
        assert_eq!(message.routing_key(), "orders.created");
        assert_eq!(message.body(), Some(&[1u8, 2, 3][..]));
        assert!(message.received_at().is_none());
    }

    #[test]
    fn json_body_round_trips_and_sets_content_type() {
        let order = Order {
            id: 7,
            item: "bolt".to_owned(),
        };

        let message = AmqpMessage::new()
            .with_json_body(&order)
            .expect("serializable order");

        assert_eq!(
            message.properties().content_type().as_ref().map(|c| c.as_str()),
            Some(JSON_CONTENT_TYPE)
        );
        assert_eq!(message.json_body::<Order>().expect("valid json body"), order);
    }

    #[test]
    fn json_body_without_body_is_a_payload_error() {
        let message = AmqpMessage::new();

        assert!(matches!(
            message.json_body::<Order>(),
            Err(AmqpError::Payload(_))
        ));
    }

    #[test]
    fn mutation_invalidates_the_receipt_timestamp() {
        let mut message = AmqpMessage {
            received_at: Some(SystemTime::now()),
            ..AmqpMessage::new()
        };
        message.set_routing_key("orders.updated");
        assert!(message.received_at().is_none());

        let mut message = AmqpMessage {
            received_at: Some(SystemTime::now()),
            ..AmqpMessage::new()
        };
        message.set_body(vec![0]);
        assert!(message.received_at().is_none());

        let mut message = AmqpMessage {
            received_at: Some(SystemTime::now()),
            ..AmqpMessage::new()
        };
        message.set_properties(BasicProperties::default());
        assert!(message.received_at().is_none());
    }
}
