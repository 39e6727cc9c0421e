//! Rulebook definition and YAML loading
//!
//! The on-disk format mirrors the original rulebook:
//!
//! ```yaml
//! Rules:
//!   - name: Admin_Access_Violation
//!     conditions:
//!       - field: log_level
//!         equals: CRITICAL
//!       - field: action
//!         equals: admin_delete
//!       - field: user_role
//!         not_equals: ADMIN
//! ```
//!
//! Field names are kept as strings at load time; a name the engine cannot
//! resolve causes the rule to be skipped with a diagnostic at evaluation,
//! never a load failure or a crash.

use crate::RulebookError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Comparison operator in a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Field must equal the literal
    Eq,
    /// Field must not equal the literal
    Ne,
}

/// A single predicate over one record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Record field name as written in the rulebook
    pub field: String,
    /// Operator
    pub comparison: Comparison,
    /// Literal to compare against
    pub value: String,
}

impl Condition {
    /// Equality condition
    #[inline]
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            comparison: Comparison::Eq,
            value: value.into(),
        }
    }

    /// Inequality condition
    #[inline]
    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            comparison: Comparison::Ne,
            value: value.into(),
        }
    }
}

/// A named, all-conditions-must-match rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Unique name within the rulebook
    pub name: String,
    /// Predicates, evaluated in order with short-circuit exit
    pub conditions: Vec<Condition>,
}

/// Ordered list of rules
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rulebook {
    /// Rules in evaluation order
    pub rules: Vec<Rule>,
}

// Raw serde shapes for the YAML layout.

#[derive(Debug, Deserialize)]
struct RawRulebook {
    #[serde(rename = "Rules")]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    name: String,
    #[serde(default)]
    conditions: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    field: String,
    #[serde(default)]
    equals: Option<String>,
    #[serde(default)]
    not_equals: Option<String>,
}

impl Rulebook {
    /// Build a rulebook from rules, validating name uniqueness
    pub fn new(rules: Vec<Rule>) -> Result<Self, RulebookError> {
        if rules.is_empty() {
            return Err(RulebookError::Empty);
        }
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(RulebookError::DuplicateRule(rule.name.clone()));
            }
        }
        Ok(Self { rules })
    }

    /// Parse a rulebook from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RulebookError> {
        let raw: RawRulebook = serde_yaml::from_str(yaml)?;

        let mut rules = Vec::with_capacity(raw.rules.len());
        for raw_rule in raw.rules {
            let mut conditions = Vec::with_capacity(raw_rule.conditions.len());
            for raw_cond in raw_rule.conditions {
                let condition = match (raw_cond.equals, raw_cond.not_equals) {
                    (Some(value), None) => Condition::eq(raw_cond.field, value),
                    (None, Some(value)) => Condition::ne(raw_cond.field, value),
                    _ => {
                        return Err(RulebookError::InvalidCondition {
                            rule: raw_rule.name,
                            field: raw_cond.field,
                        })
                    }
                };
                conditions.push(condition);
            }
            rules.push(Rule {
                name: raw_rule.name,
                conditions,
            });
        }

        Self::new(rules)
    }

    /// Load a rulebook from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulebookError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RulebookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rulebook is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
