// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the Event Client
//!
//! This module provides the error type shared by every broker operation.
//! The `AmqpError` enum covers connection setup, topology declaration,
//! publishing, consuming and configuration failures. Nothing in this crate
//! retries on its own: each variant is surfaced to the immediate caller.

use std::time::Duration;
use thiserror::Error;

/// Represents errors that can occur during AMQP/RabbitMQ operations.
///
/// Variants are grouped by the phase that produced them: connection,
/// topology, publish and consume. The helper predicates classify an error
/// without matching on every variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmqpError {
    /// Error establishing a connection to the RabbitMQ server
    #[error("failure to connect: {0}")]
    ConnectionError(String),

    /// Error creating a channel from an established connection
    #[error("failure to create a channel: {0}")]
    ChannelError(String),

    /// Error declaring an exchange with the given name, with the broker reply
    #[error("failure to declare an exchange `{0}`: {1}")]
    DeclareExchangeError(String, String),

    /// Error declaring a queue with the given name, with the broker reply
    #[error("failure to declare a queue `{0}`: {1}")]
    DeclareQueueError(String, String),

    /// Error binding an exchange to a queue, with the broker reply
    #[error("failure to binding exchange `{0}` to queue `{1}`: {2}")]
    BindingExchangeToQueueError(String, String, String),

    /// A consumer was configured without any routing-key pattern
    #[error("at least one routing key pattern is required")]
    EmptyBindings,

    /// Error configuring Quality of Service parameters
    #[error("failure to configure qos `{0}`")]
    QoSDeclarationError(String),

    /// The routing key was empty
    #[error("routing key must not be empty")]
    InvalidRoutingKey,

    /// The message could not be encoded as JSON
    #[error("failure to serialize payload: {0}")]
    SerializePayloadError(String),

    /// Error publishing a message
    #[error("failure to publish: {0}")]
    PublishingError(String),

    /// The broker did not accept the message before the deadline
    #[error("publish timed out after {0:?}")]
    PublishTimeout(Duration),

    /// Error declaring a consumer
    #[error("consumer declaration error: {0}")]
    ConsumerDeclarationError(String),

    /// Error cancelling a consumer subscription
    #[error("failure to cancel consumer `{0}`")]
    CancelConsumerError(String),

    /// The channel feeding a delivery stream was closed
    #[error("delivery stream closed: {0}")]
    DeliveryStreamClosed(String),

    /// Error parsing a message payload
    #[error("failure to parse payload: {0}")]
    ParsePayloadError(String),

    /// Error acknowledging a message
    #[error("failure to ack message")]
    AckMessageError,

    /// Error negative-acknowledging a message
    #[error("failure to nack message")]
    NackMessageError,

    /// Error rejecting a message
    #[error("failure to reject message")]
    RejectMessageError,

    /// The shutdown token fired before the instance was built
    #[error("shutdown already in progress")]
    ShutdownInProgress,

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

impl AmqpError {
    /// Returns true when a publish call hit its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AmqpError::PublishTimeout(_))
    }

    /// Returns true for failures to dial the broker or open a channel.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            AmqpError::ConnectionError(_) | AmqpError::ChannelError(_)
        )
    }

    /// Returns true for failures raised while declaring exchanges, queues or bindings.
    pub fn is_topology(&self) -> bool {
        matches!(
            self,
            AmqpError::DeclareExchangeError(_, _)
                | AmqpError::DeclareQueueError(_, _)
                | AmqpError::BindingExchangeToQueueError(_, _, _)
                | AmqpError::EmptyBindings
                | AmqpError::QoSDeclarationError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert!(AmqpError::PublishTimeout(Duration::from_secs(5)).is_timeout());
        assert!(!AmqpError::PublishingError("nope".into()).is_timeout());

        assert!(AmqpError::ConnectionError("refused".into()).is_connection());
        assert!(AmqpError::ChannelError("closed".into()).is_connection());

        assert!(AmqpError::DeclareExchangeError("orders".into(), "406".into()).is_topology());
        assert!(AmqpError::BindingExchangeToQueueError(
            "orders".into(),
            "email".into(),
            "404".into()
        )
        .is_topology());
        assert!(!AmqpError::AckMessageError.is_topology());
    }

    #[test]
    fn binding_error_names_both_sides() {
        let err = AmqpError::BindingExchangeToQueueError(
            "orders".into(),
            "orders.email".into(),
            "NOT_FOUND".into(),
        );
        assert_eq!(
            err.to_string(),
            "failure to binding exchange `orders` to queue `orders.email`: NOT_FOUND"
        );
    }

    #[test]
    fn declare_errors_keep_the_broker_reply() {
        let err = AmqpError::DeclareExchangeError(
            "orders".into(),
            "PRECONDITION_FAILED - inequivalent arg 'durable'".into(),
        );
        assert!(err.to_string().contains("inequivalent arg 'durable'"));
        assert_ne!(
            AmqpError::RejectMessageError.to_string(),
            AmqpError::NackMessageError.to_string()
        );
    }
}
