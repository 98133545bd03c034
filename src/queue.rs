// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Queue Management for RabbitMQ
//!
//! Queue definitions and the bindings that attach a queue to an exchange
//! under a routing-key pattern.

/// Definition of a queue with its configuration parameters.
///
/// Consumer queues are durable, shared and kept when unused, so that
/// unacknowledged deliveries survive consumer restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDefinition {
    pub(crate) name: String,
    pub(crate) durable: bool,
    pub(crate) delete: bool,
    pub(crate) exclusive: bool,
}

impl QueueDefinition {
    /// Creates a durable, non-exclusive, non-auto-deleted queue definition.
    pub fn new(name: &str) -> QueueDefinition {
        QueueDefinition {
            name: name.to_owned(),
            durable: true,
            delete: false,
            exclusive: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Configuration for binding a queue to an exchange.
///
/// The routing key may use the broker wildcards: `*` matches exactly one
/// dot-separated word and `#` matches zero or more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding {
    pub(crate) queue_name: String,
    pub(crate) exchange_name: String,
    pub(crate) routing_key: String,
}

impl QueueBinding {
    /// Creates a new queue binding for the given queue.
    ///
    /// The exchange name and routing key start empty and are set with
    /// [`QueueBinding::exchange`] and [`QueueBinding::routing_key`].
    pub fn new(queue: &str) -> QueueBinding {
        QueueBinding {
            queue_name: queue.to_owned(),
            exchange_name: String::new(),
            routing_key: String::new(),
        }
    }

    /// Exchange the queue is bound to.
    pub fn exchange(mut self, exchange: &str) -> Self {
        self.exchange_name = exchange.to_owned();
        self
    }

    /// Binding pattern; `*` matches one word and `#` zero or more.
    pub fn routing_key(mut self, key: &str) -> Self {
        self.routing_key = key.to_owned();
        self
    }

    /// Builds one binding per pattern, in input order.
    pub fn for_patterns<S: AsRef<str>>(
        queue: &str,
        exchange: &str,
        patterns: &[S],
    ) -> Vec<QueueBinding> {
        patterns
            .iter()
            .map(|p| QueueBinding::new(queue).exchange(exchange).routing_key(p.as_ref()))
            .collect()
    }
}
