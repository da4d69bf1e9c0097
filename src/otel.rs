// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # OpenTelemetry Propagation for AMQP Headers
//!
//! Adapts AMQP header tables to the OpenTelemetry `Injector`/`Extractor`
//! traits so trace context travels with published messages and can be
//! recovered from messages read off a queue.

use lapin::{
    types::{AMQPValue, ShortString},
    BasicProperties,
};
use opentelemetry::{
    global,
    propagation::{Extractor, Injector},
    Context,
};
use std::collections::BTreeMap;
use tracing::error;

/// Adapter carrying OpenTelemetry context through an AMQP header table.
pub(crate) struct AmqpTracePropagator<'a> {
    headers: &'a mut BTreeMap<ShortString, AMQPValue>,
}

impl<'a> AmqpTracePropagator<'a> {
    pub(crate) fn new(headers: &'a mut BTreeMap<ShortString, AMQPValue>) -> Self {
        Self { headers }
    }
}

impl Injector for AmqpTracePropagator<'_> {
    fn set(&mut self, key: &str, value: String) {
        self.headers.insert(
            key.to_lowercase().into(),
            AMQPValue::LongString(value.into()),
        );
    }
}

impl Extractor for AmqpTracePropagator<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|header_value| {
            if let AMQPValue::LongString(value) = header_value {
                std::str::from_utf8(value.as_bytes())
                    .map_err(|err| error!(error = err.to_string(), "non utf8 trace header"))
                    .ok()
            } else {
                None
            }
        })
    }

    fn keys(&self) -> Vec<&str> {
        self.headers.keys().map(|header| header.as_str()).collect()
    }
}

/// Injects `ctx` into a copy of the header table held by `headers`.
pub(crate) fn inject_context(
    ctx: &Context,
    headers: &mut BTreeMap<ShortString, AMQPValue>,
) {
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(ctx, &mut AmqpTracePropagator::new(headers))
    });
}

/// Recovers the trace context carried in the headers of a read message.
pub fn extract_context(properties: &BasicProperties) -> Context {
    let mut headers = properties
        .headers()
        .clone()
        .unwrap_or_default()
        .inner()
        .clone();

    global::get_text_map_propagator(|propagator| {
        propagator.extract(&AmqpTracePropagator::new(&mut headers))
    })
}
