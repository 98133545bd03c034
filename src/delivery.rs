// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Deliveries
//!
//! A delivery is one message handed to a consumer together with the broker
//! metadata and the handle used to settle it. The broker keeps the message
//! until it is acknowledged; rejected or abandoned deliveries are requeued.

use crate::{errors::AmqpError, otel};
use lapin::{
    options::{BasicAckOptions, BasicNackOptions, BasicRejectOptions},
    protocol::basic::AMQPProperties,
    types::FieldTable,
};
use opentelemetry::Context;
use serde::de::DeserializeOwned;
use tracing::error;

/// Header added by the broker each time a message is dead-lettered
pub const AMQP_HEADERS_X_DEATH: &str = "x-death";
/// Counter field inside each x-death entry
pub const AMQP_HEADERS_COUNT: &str = "count";

/// A received message awaiting acknowledgment.
#[derive(Debug)]
pub struct Delivery {
    inner: lapin::message::Delivery,
}

impl Delivery {
    pub(crate) fn new(inner: lapin::message::Delivery) -> Self {
        Delivery { inner }
    }

    /// Broker-assigned tag identifying this delivery on its channel.
    pub fn delivery_tag(&self) -> u64 {
        self.inner.delivery_tag
    }

    /// True when the broker already handed this message to a consumer that
    /// did not acknowledge it.
    pub fn redelivered(&self) -> bool {
        self.inner.redelivered
    }

    /// Routing key the message was published under.
    pub fn routing_key(&self) -> &str {
        self.inner.routing_key.as_str()
    }

    pub fn exchange(&self) -> &str {
        self.inner.exchange.as_str()
    }

    /// Raw message body, byte-for-byte as published.
    pub fn payload(&self) -> &[u8] {
        &self.inner.data
    }

    pub fn properties(&self) -> &AMQPProperties {
        &self.inner.properties
    }

    /// Content type set by the publisher, `application/json` for messages
    /// sent by this crate.
    pub fn content_type(&self) -> Option<&str> {
        self.inner
            .properties
            .content_type()
            .as_ref()
            .map(|ct| ct.as_str())
    }

    /// Decodes the JSON payload.
    ///
    /// # Returns
    /// The decoded value, or `AmqpError::ParsePayloadError` if the body is
    /// not valid JSON for `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AmqpError> {
        serde_json::from_slice(&self.inner.data).map_err(|err| {
            error!(error = err.to_string(), "failure to parse payload");
            AmqpError::ParsePayloadError(err.to_string())
        })
    }

    /// How many times the message went through dead-lettering.
    pub fn death_count(&self) -> i64 {
        death_count(&self.inner.properties)
    }

    /// Trace context propagated by the publisher.
    pub fn trace_context(&self) -> Context {
        otel::extract_context(&self.inner.properties)
    }

    /// Removes the message from the queue.
    pub async fn ack(&self) -> Result<(), AmqpError> {
        self.inner
            .ack(BasicAckOptions { multiple: false })
            .await
            .map_err(|err| {
                error!(error = err.to_string(), "error whiling ack msg");
                AmqpError::AckMessageError
            })
    }

    /// Negative-acknowledges the message; with `requeue` the broker
    /// redelivers it, otherwise it is dropped or dead-lettered.
    pub async fn nack(&self, requeue: bool) -> Result<(), AmqpError> {
        self.inner
            .nack(BasicNackOptions {
                multiple: false,
                requeue,
            })
            .await
            .map_err(|err| {
                error!(error = err.to_string(), "error whiling nack msg");
                AmqpError::NackMessageError
            })
    }

    /// Rejects the message.
    ///
    /// # Parameters
    /// * `requeue` - Put the message back on the queue instead of dropping it
    pub async fn reject(&self, requeue: bool) -> Result<(), AmqpError> {
        self.inner
            .reject(BasicRejectOptions { requeue })
            .await
            .map_err(|err| {
                error!(error = err.to_string(), "error whiling reject msg");
                AmqpError::RejectMessageError
            })
    }
}

fn death_count(props: &AMQPProperties) -> i64 {
    let headers = match props.headers() {
        Some(val) => val.to_owned(),
        None => FieldTable::default(),
    };

    headers
        .inner()
        .get(AMQP_HEADERS_X_DEATH)
        .and_then(|value| value.as_array())
        .and_then(|arr| arr.as_slice().first())
        .and_then(|value| value.as_field_table())
        .and_then(|table| table.inner().get(AMQP_HEADERS_COUNT))
        .and_then(|value| value.as_long_long_int())
        .unwrap_or_default()
}
