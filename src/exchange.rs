// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Exchange Management for RabbitMQ
//!
//! This module provides types for defining the exchanges events are
//! published to. Two variants are supported: plain topic routing and the
//! delayed-message exchange, which holds a message for a scheduled interval
//! and then routes it with direct semantics.

use crate::errors::AmqpError;
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use serde::Deserialize;
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Argument selecting the routing algorithm behind a delayed exchange
pub const AMQP_HEADERS_DELAYED_EXCHANGE_TYPE: &str = "x-delayed-type";
/// Broker type name of the delayed-message exchange (plugin required)
pub const AMQP_DELAYED_EXCHANGE_KIND: &str = "x-delayed-message";
/// Routing algorithm used by delayed exchanges
pub const AMQP_DELAYED_ROUTING: &str = "direct";

/// Represents the exchange variants available to publishers and consumers.
///
/// - Topic: Routes messages based on wildcard pattern matching of routing keys
/// - Delayed: Defers delivery, then routes by exact routing key match
///
/// Both sides of an exchange must agree on the variant; redeclaring an
/// existing exchange with a different variant is rejected by the broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ExchangeKind {
    #[default]
    Topic,
    Delayed,
}

impl From<ExchangeKind> for lapin::ExchangeKind {
    fn from(kind: ExchangeKind) -> Self {
        match kind {
            ExchangeKind::Topic => lapin::ExchangeKind::Topic,
            ExchangeKind::Delayed => {
                lapin::ExchangeKind::Custom(AMQP_DELAYED_EXCHANGE_KIND.to_owned())
            }
        }
    }
}

impl FromStr for ExchangeKind {
    type Err = AmqpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "topic" => Ok(ExchangeKind::Topic),
            "delayed" | AMQP_DELAYED_EXCHANGE_KIND => Ok(ExchangeKind::Delayed),
            other => Err(AmqpError::ConfigError(format!(
                "unsupported exchange type `{}`",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ExchangeKind {
    type Error = AmqpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeKind::Topic => f.write_str("topic"),
            ExchangeKind::Delayed => f.write_str(AMQP_DELAYED_EXCHANGE_KIND),
        }
    }
}

/// Definition of an exchange with its configuration parameters.
///
/// Exchanges built with [`ExchangeDefinition::new`] are durable, never
/// auto-deleted and not internal, which is what both publishers and
/// consumers declare.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeDefinition {
    pub(crate) name: String,
    pub(crate) kind: ExchangeKind,
    pub(crate) delete: bool,
    pub(crate) durable: bool,
    pub(crate) internal: bool,
    pub(crate) params: BTreeMap<ShortString, AMQPValue>,
}

impl ExchangeDefinition {
    /// Creates a durable topic exchange definition with the given name.
    pub fn new(name: &str) -> ExchangeDefinition {
        ExchangeDefinition {
            name: name.to_owned(),
            kind: ExchangeKind::Topic,
            delete: false,
            durable: true,
            internal: false,
            params: BTreeMap::default(),
        }
    }

    /// Sets the exchange variant.
    ///
    /// Choosing [`ExchangeKind::Delayed`] adds the `x-delayed-type` argument
    /// the broker requires for that exchange type.
    pub fn kind(mut self, kind: ExchangeKind) -> Self {
        self.kind = kind;
        match kind {
            ExchangeKind::Delayed => {
                self.params.insert(
                    ShortString::from(AMQP_HEADERS_DELAYED_EXCHANGE_TYPE),
                    AMQPValue::LongString(LongString::from(AMQP_DELAYED_ROUTING)),
                );
            }
            ExchangeKind::Topic => {
                self.params
                    .remove(&ShortString::from(AMQP_HEADERS_DELAYED_EXCHANGE_TYPE));
            }
        }
        self
    }

    /// Shortcut for `kind(ExchangeKind::Delayed)`.
    pub fn delayed(self) -> Self {
        self.kind(ExchangeKind::Delayed)
    }

    /// Makes the exchange transient, lost on broker restart.
    pub fn transient(mut self) -> Self {
        self.durable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant the exchange is declared with; see [`ExchangeKind`].
    pub fn exchange_kind(&self) -> ExchangeKind {
        self.kind
    }

    pub(crate) fn arguments(&self) -> FieldTable {
        FieldTable::from(self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_durable_topic() {
        let def = ExchangeDefinition::new("orders");
        assert_eq!(def.name(), "orders");
        assert_eq!(def.exchange_kind(), ExchangeKind::Topic);
        assert!(def.durable);
        assert!(!def.delete);
        assert!(!def.internal);
        assert!(def.params.is_empty());
    }

    #[test]
    fn delayed_exchange_routes_directly() {
        let def = ExchangeDefinition::new("reminders").delayed();
        assert_eq!(
            def.params
                .get(&ShortString::from(AMQP_HEADERS_DELAYED_EXCHANGE_TYPE)),
            Some(&AMQPValue::LongString(LongString::from("direct")))
        );
        assert!(matches!(
            lapin::ExchangeKind::from(def.exchange_kind()),
            lapin::ExchangeKind::Custom(ref kind) if kind == "x-delayed-message"
        ));
    }

    #[test]
    fn switching_back_to_topic_drops_delay_argument() {
        let def = ExchangeDefinition::new("orders")
            .delayed()
            .kind(ExchangeKind::Topic);
        assert!(def.params.is_empty());
    }

    #[test]
    fn parses_variant_names() {
        assert_eq!("topic".parse::<ExchangeKind>(), Ok(ExchangeKind::Topic));
        assert_eq!("".parse::<ExchangeKind>(), Ok(ExchangeKind::Topic));
        assert_eq!("delayed".parse::<ExchangeKind>(), Ok(ExchangeKind::Delayed));
        assert_eq!(
            "x-delayed-message".parse::<ExchangeKind>(),
            Ok(ExchangeKind::Delayed)
        );
        assert!("fanout".parse::<ExchangeKind>().is_err());
    }
}
