//! Autopatch shared types
//!
//! The data model every pipeline stage agrees on:
//! - Bus events and their payload shapes
//! - Structured audit evidence and breach reports
//! - The failure taxonomy carried in event form
//!
//! Stages never call each other; these types are the entire contract
//! between them.

#![warn(unreachable_pub)]

pub mod event;
pub mod record;
pub mod routing;

pub use event::{AgentKind, Event, EventId, PatchDisposition, Payload};
pub use record::{AuditRecord, BreachReport, PatchCandidate, UNKNOWN};

/// Failure taxonomy for stage-level errors carried on the bus.
///
/// Every stage failure is published as an event rather than propagated up a
/// call chain. `Anchor` is a benign steady state, not an operator-urgent
/// error: it is how the applier reports "nothing left to fix."
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Bus or language-model service unreachable.
    Transport,
    /// Structured extraction yielded unparsable or incomplete data.
    Parse,
    /// Patch markers absent from the source text.
    Anchor,
    /// Cleaned patch candidate was empty.
    Validation,
    /// Persisting the new source text failed.
    Write,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transport => "transport",
            Self::Parse => "parse",
            Self::Anchor => "anchor",
            Self::Validation => "validation",
            Self::Write => "write",
        };
        write!(f, "{s}")
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
