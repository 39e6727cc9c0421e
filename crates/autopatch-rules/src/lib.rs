//! Autopatch rule engine
//!
//! Turns structured audit evidence into a breach verdict:
//! - A rulebook is an ordered list of named, all-must-match condition sets
//! - Conditions compare record fields against literals (equality or
//!   inequality) in order, short-circuiting on first failure
//! - Evaluation is first-match-wins across rules, so rulebook order is a
//!   designed property, not incidental
//!
//! The engine is pure and deterministic given `(record, rulebook)`.

#![warn(unreachable_pub)]

pub mod engine;
pub mod rulebook;

pub use engine::{evaluate, Verdict};
pub use rulebook::{Comparison, Condition, Rule, Rulebook};

/// Rulebook loading/validation errors
#[derive(Debug, thiserror::Error)]
pub enum RulebookError {
    /// Could not read the rulebook file
    #[error("failed to read rulebook at {path}: {source}")]
    Io {
        /// Offending path
        path: std::path::PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax error
    #[error("rulebook YAML parse error: {0}")]
    Syntax(#[from] serde_yaml::Error),

    /// A condition declares neither or both of `equals`/`not_equals`
    #[error("rule '{rule}': condition on '{field}' must have exactly one of equals/not_equals")]
    InvalidCondition {
        /// Rule name
        rule: String,
        /// Condition field name
        field: String,
    },

    /// Two rules share a name
    #[error("duplicate rule name '{0}'")]
    DuplicateRule(String),

    /// The rulebook contains no rules
    #[error("rulebook contains no rules")]
    Empty,
}
