// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Broker Configuration
//!
//! Connection parameters for the RabbitMQ endpoint. Values can be
//! deserialized from any serde source or read from the process environment.

use crate::errors::AmqpError;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::env;

pub const RABBITMQ_HOST_ENV_KEY: &str = "RABBITMQ_HOST";
pub const RABBITMQ_PORT_ENV_KEY: &str = "RABBITMQ_PORT";
pub const RABBITMQ_USER_ENV_KEY: &str = "RABBITMQ_USER";
pub const RABBITMQ_PASSWORD_ENV_KEY: &str = "RABBITMQ_PASSWORD";
pub const RABBITMQ_VHOST_ENV_KEY: &str = "RABBITMQ_VHOST";
pub const APP_NAME_ENV_KEY: &str = "APP_NAME";

/// Everything but the RFC 3986 unreserved characters is escaped, so that
/// `@`, `:`, `/` and `#` in credentials or vhost names stay inside their
/// URL component.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// RabbitMQ endpoint and the name this process announces to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RabbitMQConfigs {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
    pub app_name: String,
}

impl Default for RabbitMQConfigs {
    fn default() -> Self {
        RabbitMQConfigs {
            host: "localhost".to_owned(),
            port: 5672,
            user: "guest".to_owned(),
            password: "guest".to_owned(),
            vhost: "/".to_owned(),
            app_name: "ev-rabbitmq".to_owned(),
        }
    }
}

impl RabbitMQConfigs {
    /// Reads the configuration from environment variables, falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> Result<Self, AmqpError> {
        let mut cfg = RabbitMQConfigs::default();

        if let Ok(host) = env::var(RABBITMQ_HOST_ENV_KEY) {
            cfg.host = host;
        }

        if let Ok(port) = env::var(RABBITMQ_PORT_ENV_KEY) {
            cfg.port = port.parse().map_err(|_| {
                AmqpError::ConfigError(format!("{} must be a port number", RABBITMQ_PORT_ENV_KEY))
            })?;
        }

        if let Ok(user) = env::var(RABBITMQ_USER_ENV_KEY) {
            cfg.user = user;
        }

        if let Ok(password) = env::var(RABBITMQ_PASSWORD_ENV_KEY) {
            cfg.password = password;
        }

        if let Ok(vhost) = env::var(RABBITMQ_VHOST_ENV_KEY) {
            cfg.vhost = vhost;
        }

        if let Ok(name) = env::var(APP_NAME_ENV_KEY) {
            cfg.app_name = name;
        }

        Ok(cfg)
    }

    /// Builds the `amqp://` URL for this endpoint.
    ///
    /// User, password and vhost are percent-encoded; the default vhost `/`
    /// becomes `%2F`.
    ///
    /// # Returns
    /// A URL accepted by `lapin::Connection::connect`
    pub fn uri(&self) -> String {
        let vhost = if self.vhost.is_empty() {
            "/"
        } else {
            self.vhost.as_str()
        };

        format!(
            "amqp://{}:{}@{}:{}/{}",
            utf8_percent_encode(&self.user, URI_COMPONENT),
            utf8_percent_encode(&self.password, URI_COMPONENT),
            self.host,
            self.port,
            utf8_percent_encode(vhost, URI_COMPONENT)
        )
    }
}
