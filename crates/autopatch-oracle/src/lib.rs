//! Autopatch oracle
//!
//! Client and consumers for the external language-model service:
//! - `OracleClient`: OpenAI-compatible chat-completions transport
//! - `Extractor`: raw audit line -> structured [`AuditRecord`]
//! - `Synthesizer`: breach report + source text -> [`PatchCandidate`]
//!
//! The service is an untrusted oracle with a best-effort contract. Both
//! consumers validate reply shape before acting; an unreachable or erroring
//! service is a distinct failure mode, never "no breach" or "no patch".
//!
//! [`AuditRecord`]: autopatch_types::AuditRecord
//! [`PatchCandidate`]: autopatch_types::PatchCandidate

#![warn(unreachable_pub)]

pub mod client;
pub mod extract;
pub mod synth;

pub use client::{Oracle, OracleClient, OracleConfig};
pub use extract::Extractor;
pub use synth::{SynthesisTarget, Synthesizer};

/// Oracle failure modes
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Service unreachable or connection dropped mid-request
    #[error("oracle transport failure: {0}")]
    Transport(String),

    /// Service reachable but returned a non-success status
    #[error("oracle API returned {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body (truncated by the caller when logged)
        body: String,
    },

    /// Reply was present but not parseable into the expected shape
    #[error("oracle reply unparsable: {0}")]
    Parse(String),

    /// Reply carried no completion text at all
    #[error("oracle reply was empty")]
    EmptyReply,
}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
