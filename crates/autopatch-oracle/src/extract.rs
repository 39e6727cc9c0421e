//! Evidence extraction ("neuro" half of the watcher)
//!
//! Sends a raw audit line to the oracle with an instruction to emit exactly
//! four named fields as a single JSON object, each defaulting to `UNKNOWN`
//! when undeterminable. The reply is untrusted: it is located, parsed, and
//! defaulted here, and anything unparsable is a failure; silence is not
//! evidence.

use crate::client::Oracle;
use crate::OracleError;
use autopatch_types::AuditRecord;

const SYSTEM_PROMPT: &str = "\
You are an expert log analysis system. Your job is to parse unstructured logs \
into a strict JSON format.

The user will provide a log line. You MUST extract the following fields:
- \"log_level\": (e.g., \"INFO\", \"CRITICAL\", \"WARN\")
- \"user_name\": (The user who performed the action)
- \"user_role\": (The role of that user, e.g., \"USER\", \"ADMIN\", \"GUEST\")
- \"action\": (A short machine-readable action code. If you see \
\"ADMIN ACTION... deleted post\", use \"admin_delete\")

If you cannot find a piece of information, set it to \"UNKNOWN\".
Respond ONLY with the single JSON object. Do not add any other text or preamble.";

/// Audit-line extractor backed by an oracle
#[derive(Debug)]
pub struct Extractor<O> {
    oracle: O,
}

impl<O: Oracle> Extractor<O> {
    /// Wrap an oracle
    #[inline]
    #[must_use]
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    /// Turn a raw audit line into a structured record.
    ///
    /// Transport failures and malformed replies surface as errors; they
    /// halt the pipeline for this event rather than implying a verdict.
    pub async fn extract(&self, raw_line: &str) -> Result<AuditRecord, OracleError> {
        tracing::info!(line = raw_line, "analyzing audit line");
        let reply = self.oracle.complete(SYSTEM_PROMPT, raw_line, true).await?;
        let record = parse_record(&reply)?;
        tracing::info!(?record, "oracle parsed audit line");
        Ok(record)
    }
}

/// Parse an oracle reply into an [`AuditRecord`].
///
/// Models often wrap the object in prose or a code fence despite the
/// JSON-only instruction, so the first balanced-looking object slice is
/// taken: from the first `{` to the last `}`. Missing fields fall back to
/// the `UNKNOWN` sentinel via serde defaults, so a successful parse is
/// always fully populated.
pub fn parse_record(reply: &str) -> Result<AuditRecord, OracleError> {
    let start = reply
        .find('{')
        .ok_or_else(|| OracleError::Parse("no JSON object in reply".to_string()))?;
    let end = reply
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| OracleError::Parse("unterminated JSON object in reply".to_string()))?;

    serde_json::from_str(&reply[start..=end])
        .map_err(|e| OracleError::Parse(format!("reply is not a valid record: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopatch_types::UNKNOWN;
    use pretty_assertions::assert_eq;

    struct CannedOracle(String);

    #[async_trait::async_trait]
    impl Oracle for CannedOracle {
        async fn complete(&self, _: &str, _: &str, _: bool) -> Result<String, OracleError> {
            Ok(self.0.clone())
        }
    }

    struct DeadOracle;

    #[async_trait::async_trait]
    impl Oracle for DeadOracle {
        async fn complete(&self, _: &str, _: &str, _: bool) -> Result<String, OracleError> {
            Err(OracleError::Transport("connection refused".into()))
        }
    }

    #[test]
    fn parses_clean_json_reply() {
        let record = parse_record(
            r#"{"log_level": "CRITICAL", "user_name": "monkey_user",
                "user_role": "USER", "action": "admin_delete"}"#,
        )
        .unwrap();
        assert_eq!(record.user_name, "monkey_user");
        assert_eq!(record.action, "admin_delete");
    }

    #[test]
    fn parses_fenced_or_prosy_reply() {
        let reply = "Here is the result:\n```json\n{\"log_level\": \"CRITICAL\"}\n```\nDone.";
        let record = parse_record(reply).unwrap();
        assert_eq!(record.log_level, "CRITICAL");
        assert_eq!(record.user_name, UNKNOWN);
    }

    #[test]
    fn missing_fields_default_to_unknown() {
        let record = parse_record(r#"{"user_role": "ADMIN"}"#).unwrap();
        assert_eq!(record.user_role, "ADMIN");
        assert_eq!(record.log_level, UNKNOWN);
        assert_eq!(record.user_name, UNKNOWN);
        assert_eq!(record.action, UNKNOWN);
    }

    #[test]
    fn reply_without_object_is_a_parse_failure() {
        assert!(matches!(
            parse_record("I could not parse that log line."),
            Err(OracleError::Parse(_))
        ));
    }

    #[test]
    fn malformed_object_is_a_parse_failure() {
        assert!(matches!(
            parse_record(r#"{"log_level": }"#),
            Err(OracleError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn extract_happy_path() {
        let extractor = Extractor::new(CannedOracle(
            r#"{"log_level": "CRITICAL", "user_name": "monkey_user",
                "user_role": "USER", "action": "admin_delete"}"#
                .to_string(),
        ));
        let record = extractor
            .extract("[CRITICAL] ADMIN ACTION: User monkey_user (role: USER) deleted post 1.")
            .await
            .unwrap();
        assert_eq!(record.log_level, "CRITICAL");
        assert_eq!(record.user_role, "USER");
    }

    #[tokio::test]
    async fn extract_surfaces_transport_failure() {
        let extractor = Extractor::new(DeadOracle);
        assert!(matches!(
            extractor.extract("any line").await,
            Err(OracleError::Transport(_))
        ));
    }
}
