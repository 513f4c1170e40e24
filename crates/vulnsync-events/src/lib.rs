//! # vulnsync-events
//!
//! Event bus library for the vulnerability report synchronization worker.
//!
//! Provides type-safe event definitions and envelope handling for the
//! domain events the report worker consumes, plus an optional Kafka
//! transport.
//!
//! ## Cargo Features
//!
//! - `kafka`: Enable the Kafka producer/consumer (requires librdkafka)

// Core modules (always available)
pub mod config;
pub mod envelope;
pub mod error;
pub mod event;
pub mod events;
pub mod handler;

// Kafka-dependent modules (require `kafka` feature)
#[cfg(feature = "kafka")]
pub mod consumer;
#[cfg(feature = "kafka")]
pub mod producer;

pub use config::KafkaConfig;
pub use envelope::{EventEnvelope, RawEnvelope};
pub use error::EventError;
pub use event::Event;
pub use handler::EnvelopeHandler;

#[cfg(feature = "kafka")]
pub use consumer::EventConsumer;
#[cfg(feature = "kafka")]
pub use producer::EventProducer;
