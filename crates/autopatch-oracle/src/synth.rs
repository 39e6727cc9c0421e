//! Patch synthesis ("surgeon" stage)
//!
//! Builds a fixed instruction naming the vulnerable function, the required
//! role check, and the anchor token the reply must start at, then sends the
//! breach report plus the full current source text. The reply is returned
//! verbatim as a candidate: validation and cleaning live in the applier so
//! there is a single point of policy for what may be written into the
//! source.

use crate::client::Oracle;
use crate::OracleError;
use autopatch_types::{BreachReport, PatchCandidate};

/// Description of the code the oracle is asked to rewrite.
///
/// These are configuration, not oracle output: the anchors stay a safety
/// net independent of whatever the service returns.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SynthesisTarget {
    /// Signature of the vulnerable function, e.g. `def delete_post(post_id):`
    pub function_signature: String,
    /// Role the authorization check must require, e.g. `ADMIN`
    pub required_role: String,
    /// Token the replacement code must start at, e.g. `@app.route`
    pub anchor_token: String,
}

impl Default for SynthesisTarget {
    fn default() -> Self {
        Self {
            function_signature: "def delete_post(post_id):".to_string(),
            required_role: "ADMIN".to_string(),
            anchor_token: "@app.route".to_string(),
        }
    }
}

impl SynthesisTarget {
    /// Render the fixed system instruction for this target
    #[must_use]
    pub fn instruction(&self) -> String {
        format!(
            "You are an expert developer. You will be given a bug report and a \
             full source file.\n\
             The bug is in the function '{sig}'. It is missing a role check.\n\
             Rewrite the entire '{sig}' function with the security fix included: \
             check that the current user's role is '{role}', and reject the \
             request with a 403 Forbidden outcome when it is not. Preserve all \
             other behavior.\n\
             Respond ONLY with the complete, corrected function. Do not add any \
             other text, explanations, or markdown backticks. Start your \
             response with '{anchor}'.",
            sig = self.function_signature,
            role = self.required_role,
            anchor = self.anchor_token,
        )
    }
}

/// Patch synthesizer backed by an oracle
#[derive(Debug)]
pub struct Synthesizer<O> {
    oracle: O,
    target: SynthesisTarget,
}

impl<O: Oracle> Synthesizer<O> {
    /// Wrap an oracle with a synthesis target
    #[inline]
    #[must_use]
    pub fn new(oracle: O, target: SynthesisTarget) -> Self {
        Self { oracle, target }
    }

    /// Ask the oracle for a replacement code block.
    ///
    /// Returns the raw reply verbatim; code correctness is not validated
    /// here.
    pub async fn synthesize(
        &self,
        report: &BreachReport,
        source_text: &str,
    ) -> Result<PatchCandidate, OracleError> {
        tracing::info!(rule = %report.rule_name, "requesting patch from oracle");

        let user_prompt = format!(
            "--- LOGIC BREACH REPORT ---\n{report}\n\n--- VULNERABLE CODE ---\n{source_text}"
        );
        let reply = self
            .oracle
            .complete(&self.target.instruction(), &user_prompt, false)
            .await?;

        tracing::info!(bytes = reply.len(), "oracle produced a candidate patch");
        Ok(PatchCandidate::new(reply))
    }
}
