//! Bus event model
//!
//! Events are append-only facts. A later event may supersede an earlier
//! one's conclusion but never erases it. The routing key exists for
//! filtering and observability only; subscribers decide relevance by
//! pattern-matching on the payload shape, never on the key.

use crate::record::{AuditRecord, BreachReport, PatchCandidate};
use crate::FailureKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique event identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub Ulid);

impl EventId {
    /// Generate new event ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The agent that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Scripted attacker exercising the target's HTTP surface
    Probe,
    /// Turns raw audit lines into structured records via the oracle
    Extractor,
    /// Evaluates structured records against the rulebook
    RuleEngine,
    /// Asks the oracle for a replacement code block
    Synthesizer,
    /// Cleans and applies candidate patches to the source text
    Applier,
    /// Pipeline bootstrap and lifecycle events
    System,
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Probe => "probe",
            Self::Extractor => "extractor",
            Self::RuleEngine => "rule-engine",
            Self::Synthesizer => "synthesizer",
            Self::Applier => "applier",
            Self::System => "system",
        };
        write!(f, "{s}")
    }
}

/// Terminal states of a patch operation, as reported on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchDisposition {
    /// The source text was rewritten and persisted
    Patched,
    /// The delimited region already carried the fix
    AlreadySafe,
    /// The anchor markers were absent (nothing to do)
    TargetMissing,
    /// The patch could not be applied
    Failed,
}

impl std::fmt::Display for PatchDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Patched => "patched",
            Self::AlreadySafe => "already-safe",
            Self::TargetMissing => "patch-target-missing",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Agent-specific payload carried by an event.
///
/// One variant per stage output. Downstream stages subscribe to the whole
/// topic and react only to the shapes they own, which keeps stage count and
/// order independent of any central scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Free-text status line (informational, triggers nothing)
    Status {
        /// Producing agent
        agent: AgentKind,
        /// Human-readable message
        message: String,
    },
    /// Confirmed breach evidence: the raw audit line the target is
    /// expected to have emitted. Triggers the extractor.
    BreachEvidence {
        /// Raw audit-log line
        audit_line: String,
    },
    /// Structured record produced by the extractor (observability)
    RecordExtracted(AuditRecord),
    /// A rule fired; triggers the synthesizer.
    Breach(BreachReport),
    /// Raw oracle output proposed as a patch; triggers the applier.
    Candidate(PatchCandidate),
    /// Terminal outcome of a patch operation
    PatchOutcome {
        /// What happened to the source document
        disposition: PatchDisposition,
        /// Human-readable detail
        detail: String,
    },
    /// A stage run terminated on a failure (event-carried status)
    StageFailure {
        /// Failing agent
        agent: AgentKind,
        /// Failure taxonomy entry (serialized as `failure_kind` to avoid
        /// colliding with the internal `kind` tag)
        #[serde(rename = "failure_kind")]
        kind: FailureKind,
        /// Diagnostic text
        detail: String,
    },
}

impl Payload {
    /// Short shape label, used by the local trace sink
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::BreachEvidence { .. } => "breach-evidence",
            Self::RecordExtracted(_) => "record-extracted",
            Self::Breach(_) => "breach",
            Self::Candidate(_) => "candidate",
            Self::PatchOutcome { .. } => "patch-outcome",
            Self::StageFailure { .. } => "stage-failure",
        }
    }
}

/// The unit on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identity
    pub id: EventId,
    /// Producing agent
    pub agent: AgentKind,
    /// Dot-segmented routing key, e.g. `probe.success`
    pub routing_key: String,
    /// Publish time
    pub timestamp: DateTime<Utc>,
    /// Agent-specific content
    pub payload: Payload,
}

impl Event {
    /// Create a new event stamped with the current time
    #[must_use]
    pub fn new(agent: AgentKind, routing_key: impl Into<String>, payload: Payload) -> Self {
        Self {
            id: EventId::new(),
            agent,
            routing_key: routing_key.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Convenience constructor for informational status events
    #[must_use]
    pub fn status(agent: AgentKind, routing_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            agent,
            routing_key,
            Payload::Status {
                agent,
                message: message.into(),
            },
        )
    }

    /// Convenience constructor for stage-failure events
    #[must_use]
    pub fn failure(
        agent: AgentKind,
        routing_key: impl Into<String>,
        kind: FailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(
            agent,
            routing_key,
            Payload::StageFailure {
                agent,
                kind,
                detail: detail.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing;

    #[test]
    fn event_ids_are_unique() {
        let a = EventId::new();
        let b = EventId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn payload_serde_is_shape_tagged() {
        let event = Event::new(
            AgentKind::Probe,
            routing::PROBE_SUCCESS,
            Payload::BreachEvidence {
                audit_line: "[CRITICAL] ...".to_string(),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"breach_evidence\""));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn status_constructor_carries_agent() {
        let event = Event::status(AgentKind::System, routing::SYSTEM_START, "swarm online");
        match event.payload {
            Payload::Status { agent, ref message } => {
                assert_eq!(agent, AgentKind::System);
                assert_eq!(message, "swarm online");
            }
            _ => panic!("expected status payload"),
        }
    }

    #[test]
    fn disposition_display() {
        assert_eq!(PatchDisposition::Patched.to_string(), "patched");
        assert_eq!(
            PatchDisposition::TargetMissing.to_string(),
            "patch-target-missing"
        );
    }
}
