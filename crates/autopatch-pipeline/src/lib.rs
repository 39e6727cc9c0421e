//! Autopatch pipeline
//!
//! Wires the probe, watcher, corrector, and applier agents over the bus
//! and drives the detect/diagnose/remediate loop against a configured
//! target. The library surface exists so integration tests can assemble
//! the same agents around fake oracles and targets.

#![warn(unreachable_pub)]

pub mod agents;
pub mod config;
pub mod orchestrator;

pub use config::{ConfigError, PipelineConfig};
pub use orchestrator::Pipeline;
