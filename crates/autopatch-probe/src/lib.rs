//! Autopatch probe
//!
//! The scripted attacker. Models an external adversary: it never inspects
//! the target's internal role model, only HTTP-visible behavior. One run is
//! a linear state machine with no internal retries; any step failure aborts
//! the run with a typed cause and is reported, not retried.

#![warn(unreachable_pub)]

pub mod agent;
pub mod target;

pub use agent::{AttackOutcome, ProbeAgent, ProbeConfig, ProbeState};
pub use target::{ApiResponse, HttpTarget, TargetApi};

/// Probe run failures (each aborts the run)
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Target unreachable or connection dropped
    #[error("target transport failure: {0}")]
    Transport(String),

    /// Registration returned neither created nor already-exists
    #[error("registration failed: status {status}: {body}")]
    RegistrationFailed {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Login did not yield an authenticated-session indicator
    #[error("login failed: status {status}: {body}")]
    LoginFailed {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Content creation did not yield its success marker
    #[error("content creation failed: status {status}: {body}")]
    ContentCreationFailed {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
