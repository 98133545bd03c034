// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Outbound Messages
//!
//! A message is an application value encoded to JSON plus the routing key
//! it is published under. It only lives for the duration of one publish.

use crate::errors::AmqpError;
use serde::Serialize;
use std::{fmt, time::Duration};

/// Default content type for JSON messages
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Dot-segmented event name, e.g. `order.created`.
///
/// The only rule enforced is that the key is not empty; the segment
/// vocabulary is agreed between producers and bindings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingKey(String);

impl RoutingKey {
    /// Validates a routing key.
    ///
    /// # Returns
    /// `AmqpError::InvalidRoutingKey` for an empty key
    pub fn new(key: impl Into<String>) -> Result<Self, AmqpError> {
        let key = key.into();
        if key.is_empty() {
            return Err(AmqpError::InvalidRoutingKey);
        }

        Ok(RoutingKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for RoutingKey {
    type Error = AmqpError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        RoutingKey::new(value)
    }
}

impl TryFrom<String> for RoutingKey {
    type Error = AmqpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RoutingKey::new(value)
    }
}

/// An encoded message ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub(crate) routing_key: RoutingKey,
    pub(crate) payload: Vec<u8>,
    pub(crate) delay: Option<Duration>,
}

impl OutboundMessage {
    /// Encodes `message` as JSON under `routing_key`.
    pub fn json<M>(routing_key: RoutingKey, message: &M) -> Result<Self, AmqpError>
    where
        M: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(message)
            .map_err(|err| AmqpError::SerializePayloadError(err.to_string()))?;

        Ok(OutboundMessage {
            routing_key,
            payload,
            delay: None,
        })
    }

    /// Asks a delayed exchange to hold the message for `delay` before routing.
    ///
    /// Topic exchanges ignore the delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn routing_key(&self) -> &RoutingKey {
        &self.routing_key
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct OrderCreated {
        id: u64,
    }

    #[test]
    fn rejects_empty_routing_key() {
        assert_eq!(RoutingKey::new(""), Err(AmqpError::InvalidRoutingKey));
        assert_eq!(RoutingKey::new("order.created").unwrap().as_str(), "order.created");
    }

    #[test]
    fn encodes_json_payload() {
        let key = RoutingKey::new("order.created").unwrap();
        let msg = OutboundMessage::json(key, &OrderCreated { id: 42 }).unwrap();

        assert_eq!(msg.payload(), br#"{"id":42}"#);
        assert_eq!(msg.routing_key().as_str(), "order.created");
        assert_eq!(msg.delay(), None);

        let decoded: OrderCreated = serde_json::from_slice(msg.payload()).unwrap();
        assert_eq!(decoded, OrderCreated { id: 42 });
    }

    #[test]
    fn surfaces_serialization_failures() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);

        let key = RoutingKey::new("order.created").unwrap();
        assert!(matches!(
            OutboundMessage::json(key, &bad),
            Err(AmqpError::SerializePayloadError(_))
        ));
    }
}
