//! Verdict evaluation
//!
//! `evaluate` iterates rules in rulebook order. Within a rule, conditions
//! are checked in order and the rule is abandoned on the first unmet one.
//! The first rule whose every condition holds produces the verdict and
//! evaluation stops: first-match-wins, not all-matches.

use crate::rulebook::{Comparison, Condition, Rule, Rulebook};
use autopatch_types::AuditRecord;

/// Result of evaluating a record against a rulebook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A rule fired
    Breach {
        /// Name of the earliest matching rule
        rule_name: String,
        /// The record that matched
        record: AuditRecord,
    },
    /// No rule fired
    Clear,
}

impl Verdict {
    /// Whether this verdict is a breach
    #[inline]
    #[must_use]
    pub fn is_breach(&self) -> bool {
        matches!(self, Self::Breach { .. })
    }
}

/// Resolve a rulebook field name against a record.
///
/// Returns `None` for names outside the record contract; the caller skips
/// the whole rule with a diagnostic. The rulebook is operator-supplied
/// text, so an unresolvable name is expected input, not a crash.
fn field_value<'r>(record: &'r AuditRecord, field: &str) -> Option<&'r str> {
    match field {
        "log_level" => Some(&record.log_level),
        "user_name" => Some(&record.user_name),
        "user_role" => Some(&record.user_role),
        "action" => Some(&record.action),
        _ => None,
    }
}

/// Evaluate one condition. `None` means the field name did not resolve.
fn condition_holds(record: &AuditRecord, condition: &Condition) -> Option<bool> {
    let actual = field_value(record, &condition.field)?;
    Some(match condition.comparison {
        Comparison::Eq => actual == condition.value,
        Comparison::Ne => actual != condition.value,
    })
}

/// Evaluate one rule: all conditions must hold, checked in order.
///
/// `None` means the rule was skipped because a condition referenced an
/// unresolvable field.
fn rule_fires(record: &AuditRecord, rule: &Rule) -> Option<bool> {
    for condition in &rule.conditions {
        match condition_holds(record, condition) {
            Some(true) => {}
            Some(false) => return Some(false),
            None => {
                tracing::warn!(
                    rule = %rule.name,
                    field = %condition.field,
                    "skipping rule: condition references unknown field"
                );
                return None;
            }
        }
    }
    Some(true)
}

/// Evaluate `record` against `rulebook`.
///
/// Pure and deterministic: repeated calls with identical inputs yield
/// identical verdicts.
#[must_use]
pub fn evaluate(record: &AuditRecord, rulebook: &Rulebook) -> Verdict {
    for rule in &rulebook.rules {
        if rule_fires(record, rule) == Some(true) {
            tracing::info!(rule = %rule.name, "rule fired");
            return Verdict::Breach {
                rule_name: rule.name.clone(),
                record: record.clone(),
            };
        }
    }
    Verdict::Clear
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn admin_rulebook() -> Rulebook {
        Rulebook::new(vec![Rule {
            name: "Admin_Access_Violation".into(),
            conditions: vec![
                Condition::eq("log_level", "CRITICAL"),
                Condition::eq("action", "admin_delete"),
                Condition::ne("user_role", "ADMIN"),
            ],
        }])
        .unwrap()
    }

    fn monkey_record() -> AuditRecord {
        AuditRecord {
            log_level: "CRITICAL".into(),
            user_name: "monkey_user".into(),
            user_role: "USER".into(),
            action: "admin_delete".into(),
        }
    }

    #[test]
    fn non_admin_delete_is_a_breach() {
        let verdict = evaluate(&monkey_record(), &admin_rulebook());
        assert_eq!(
            verdict,
            Verdict::Breach {
                rule_name: "Admin_Access_Violation".into(),
                record: monkey_record(),
            }
        );
    }

    #[test]
    fn admin_delete_is_clear() {
        let record = AuditRecord {
            user_role: "ADMIN".into(),
            ..monkey_record()
        };
        assert_eq!(evaluate(&record, &admin_rulebook()), Verdict::Clear);
    }

    #[test]
    fn non_critical_level_is_clear() {
        let record = AuditRecord {
            log_level: "INFO".into(),
            ..monkey_record()
        };
        assert_eq!(evaluate(&record, &admin_rulebook()), Verdict::Clear);
    }

    #[test]
    fn first_match_wins() {
        let rulebook = Rulebook::new(vec![
            Rule {
                name: "earlier".into(),
                conditions: vec![Condition::eq("action", "admin_delete")],
            },
            Rule {
                name: "later".into(),
                conditions: vec![Condition::eq("action", "admin_delete")],
            },
        ])
        .unwrap();

        match evaluate(&monkey_record(), &rulebook) {
            Verdict::Breach { rule_name, .. } => assert_eq!(rule_name, "earlier"),
            Verdict::Clear => panic!("expected a breach"),
        }
    }

    #[test]
    fn rule_with_unknown_field_is_skipped_not_fatal() {
        let rulebook = Rulebook::new(vec![
            Rule {
                name: "bogus".into(),
                conditions: vec![Condition::eq("source_ip", "10.0.0.1")],
            },
            Rule {
                name: "real".into(),
                conditions: vec![Condition::eq("action", "admin_delete")],
            },
        ])
        .unwrap();

        match evaluate(&monkey_record(), &rulebook) {
            Verdict::Breach { rule_name, .. } => assert_eq!(rule_name, "real"),
            Verdict::Clear => panic!("expected the later rule to fire"),
        }
    }

    #[test]
    fn unknown_sentinel_record_is_clear() {
        assert_eq!(
            evaluate(&AuditRecord::unknown(), &admin_rulebook()),
            Verdict::Clear
        );
    }

    proptest! {
        /// Evaluation is a pure function of (record, rulebook).
        #[test]
        fn evaluation_is_deterministic(
            log_level in "[A-Z]{0,10}",
            user_name in "[a-z_]{0,12}",
            user_role in "(USER|ADMIN|GUEST|UNKNOWN)",
            action in "[a-z_]{0,12}",
        ) {
            let record = AuditRecord { log_level, user_name, user_role, action };
            let rulebook = admin_rulebook();
            prop_assert_eq!(
                evaluate(&record, &rulebook),
                evaluate(&record, &rulebook)
            );
        }

        /// No record shape crashes evaluation.
        #[test]
        fn evaluation_is_total(
            log_level in ".{0,24}",
            user_name in ".{0,24}",
            user_role in ".{0,24}",
            action in ".{0,24}",
        ) {
            let record = AuditRecord { log_level, user_name, user_role, action };
            let _ = evaluate(&record, &admin_rulebook());
        }
    }
}
