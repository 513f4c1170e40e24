//! Kafka connection configuration.

use std::env;

use crate::error::EventError;

/// Kafka connection configuration.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated list of broker addresses.
    pub bootstrap_servers: String,
    /// Client identifier.
    pub client_id: String,
    /// Consumer group for the report worker.
    pub group_id: String,
    /// Security protocol handed to rdkafka (PLAINTEXT, SSL, SASL_SSL...).
    pub security_protocol: String,
}

const KNOWN_PROTOCOLS: &[&str] = &["PLAINTEXT", "SSL", "SASL_PLAINTEXT", "SASL_SSL"];

impl KafkaConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `KAFKA_BOOTSTRAP_SERVERS`: comma-separated broker list
    ///
    /// Optional:
    /// - `KAFKA_CLIENT_ID` (default: "vulnsync-report")
    /// - `KAFKA_GROUP_ID` (default: "vulnsync-report")
    /// - `KAFKA_SECURITY_PROTOCOL` (default: "PLAINTEXT")
    pub fn from_env() -> Result<Self, EventError> {
        Self::from_reader(|key| env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Lets tests supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, EventError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let bootstrap_servers =
            reader("KAFKA_BOOTSTRAP_SERVERS").map_err(|_| EventError::ConfigMissing {
                var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
            })?;

        let client_id =
            reader("KAFKA_CLIENT_ID").unwrap_or_else(|_| "vulnsync-report".to_string());
        let group_id = reader("KAFKA_GROUP_ID").unwrap_or_else(|_| "vulnsync-report".to_string());

        let security_protocol = reader("KAFKA_SECURITY_PROTOCOL")
            .unwrap_or_else(|_| "PLAINTEXT".to_string())
            .to_uppercase();
        if !KNOWN_PROTOCOLS.contains(&security_protocol.as_str()) {
            return Err(EventError::ConfigInvalid {
                var: "KAFKA_SECURITY_PROTOCOL".to_string(),
                reason: format!("Unknown protocol: {security_protocol}"),
            });
        }

        Ok(Self {
            bootstrap_servers,
            client_id,
            group_id,
            security_protocol,
        })
    }
}
