//! Worker configuration.

use std::env;

/// Configuration for the report worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Database connection URL for the projection store.
    pub database_url: String,

    /// Maximum connections in the pool.
    pub max_connections: u32,

    /// Run the pending migrations at startup.
    pub run_migrations: bool,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Lets tests supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let database_url =
            reader("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL".into()))?;

        let max_connections = reader("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".into(), e.to_string())
            })?;

        let run_migrations = reader("RUN_MIGRATIONS")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        Ok(Self {
            database_url,
            max_connections,
            run_migrations,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
