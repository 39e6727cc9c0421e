//! Autopatch bus
//!
//! Topic-based publish/subscribe used for all cross-agent coordination:
//! - An in-process broker modelling a topic exchange with ephemeral,
//!   exclusive, auto-ack queues (at-most-once delivery)
//! - A client that retries `connect` indefinitely with a fixed delay
//! - A local trace sink fed on every publish, so operability never
//!   depends on broker health
//!
//! No component holds a reference to call into another; each stage's
//! output is only a published event that the next stage's subscription
//! reacts to.

#![warn(unreachable_pub)]

pub mod broker;
pub mod client;

pub use broker::{Broker, Subscription};
pub use client::{BusClient, Connection, Connector, MemoryConnector};

/// Bus error type
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The broker refused or dropped the connection
    #[error("broker unreachable: {0}")]
    Unreachable(String),

    /// Publish attempted on a closed connection
    #[error("connection closed")]
    ConnectionClosed,
}
