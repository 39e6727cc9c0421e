//! Structured evidence and patch records
//!
//! `AuditRecord` is the extractor's output contract: four string fields,
//! each present with a value, possibly the `UNKNOWN` sentinel. Absence is
//! not representable, which is what makes downstream rule evaluation total.

use serde::{Deserialize, Serialize};

/// Sentinel for fields the extractor could not determine
pub const UNKNOWN: &str = "UNKNOWN";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Structured record extracted from a raw audit line.
///
/// Every field defaults to [`UNKNOWN`] during deserialization, so a reply
/// that omits a field still yields a fully-populated record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Severity token, e.g. `CRITICAL`
    #[serde(default = "unknown")]
    pub log_level: String,
    /// The user who performed the action
    #[serde(default = "unknown")]
    pub user_name: String,
    /// That user's role, e.g. `USER`, `ADMIN`
    #[serde(default = "unknown")]
    pub user_role: String,
    /// Machine-readable action code, e.g. `admin_delete`
    #[serde(default = "unknown")]
    pub action: String,
}

impl AuditRecord {
    /// A record with every field set to the sentinel
    #[inline]
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            log_level: unknown(),
            user_name: unknown(),
            user_role: unknown(),
            action: unknown(),
        }
    }
}

impl Default for AuditRecord {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Report of a fired rule. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachReport {
    /// Name of the rule that fired
    pub rule_name: String,
    /// Acting user
    pub user_name: String,
    /// Acting user's role
    pub user_role: String,
    /// Action code
    pub action: String,
}

impl BreachReport {
    /// Build a report from a fired rule and the record it matched
    #[must_use]
    pub fn new(rule_name: impl Into<String>, record: &AuditRecord) -> Self {
        Self {
            rule_name: rule_name.into(),
            user_name: record.user_name.clone(),
            user_role: record.user_role.clone(),
            action: record.action.clone(),
        }
    }
}

impl std::fmt::Display for BreachReport {
    /// Free-text rendering included verbatim in the synthesis prompt
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rule '{}' was violated. User '{}' (Role: {}) performed '{}'.",
            self.rule_name, self.user_name, self.user_role, self.action
        )
    }
}

/// Raw text returned by the synthesizer. Untrusted until cleaned.
///
/// Lifecycle: raw -> cleaned (fence stripped, anchor-extracted) ->
/// applied or rejected. A candidate that fails cleaning never reaches the
/// source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchCandidate {
    /// Verbatim oracle reply
    pub raw: String,
}

impl PatchCandidate {
    /// Wrap a raw oracle reply
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn audit_record_defaults_are_total() {
        // Missing fields deserialize to the sentinel, never to absence.
        let record: AuditRecord = serde_json::from_str(r#"{"log_level": "CRITICAL"}"#).unwrap();
        assert_eq!(record.log_level, "CRITICAL");
        assert_eq!(record.user_name, UNKNOWN);
        assert_eq!(record.user_role, UNKNOWN);
        assert_eq!(record.action, UNKNOWN);
    }

    #[test]
    fn audit_record_empty_object_is_all_unknown() {
        let record: AuditRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, AuditRecord::unknown());
    }

    #[test]
    fn breach_report_rendering() {
        let record = AuditRecord {
            log_level: "CRITICAL".into(),
            user_name: "monkey_user".into(),
            user_role: "USER".into(),
            action: "admin_delete".into(),
        };
        let report = BreachReport::new("Admin_Access_Violation", &record);
        assert_eq!(
            report.to_string(),
            "Rule 'Admin_Access_Violation' was violated. \
             User 'monkey_user' (Role: USER) performed 'admin_delete'."
        );
    }
}
