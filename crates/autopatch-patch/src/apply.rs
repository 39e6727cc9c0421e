//! Anchored block replacement
//!
//! The target region is delimited by a literal start marker (the vulnerable
//! handler's declaration line) and a literal end marker (a sentinel comment
//! placed after the handler). Both markers are replaced along with the
//! region. Absent markers are the expected steady state once a fix has
//! landed and the sentinel region was rewritten, so that outcome reads as
//! "nothing to do", not as an error.

use crate::clean::clean;
use autopatch_types::PatchCandidate;
use serde::{Deserialize, Serialize};

/// Literal anchors delimiting the patchable region
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchSpec {
    /// Exact declaration line opening the vulnerable handler
    pub start_marker: String,
    /// Sentinel comment closing the region
    pub end_marker: String,
    /// Token a cleaned candidate must be recoverable from
    pub anchor_token: String,
}

impl Default for PatchSpec {
    fn default() -> Self {
        Self {
            start_marker: "@app.route('/admin/delete/<int:post_id>', methods=['GET'])".to_string(),
            end_marker: "# --- !!! END VULNERABLE ROUTE !!! ---".to_string(),
            anchor_token: "@app.route".to_string(),
        }
    }
}

/// Terminal states of one apply operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Replacement performed; carries the new source text to persist
    Applied(String),
    /// The delimited region already holds the candidate text
    AlreadyPatched,
    /// Start or end marker absent (steady state after a fix has landed)
    AnchorsNotFound,
    /// Candidate was rejected by cleaning
    EmptyAfterCleaning,
    /// Apply could not proceed for another reason
    Failed(String),
}

/// Apply a candidate to the source text.
///
/// Single in-memory transform; the source text is never mutated unless the
/// outcome is `Applied`.
#[must_use]
pub fn apply(candidate: &PatchCandidate, source_text: &str, spec: &PatchSpec) -> Outcome {
    // 1-2. Clean and trim; a failed clean never reaches the source.
    let Some(cleaned) = clean(&candidate.raw, &spec.anchor_token) else {
        tracing::warn!("candidate rejected: empty after cleaning");
        return Outcome::EmptyAfterCleaning;
    };

    // 3. Locate the delimited region; the start must precede the end.
    let Some(start) = source_text.find(&spec.start_marker) else {
        tracing::info!("start marker absent; nothing to do");
        return Outcome::AnchorsNotFound;
    };
    let Some(end_rel) = source_text[start..].find(&spec.end_marker) else {
        tracing::info!("end marker absent; nothing to do");
        return Outcome::AnchorsNotFound;
    };
    let region_end = start + end_rel + spec.end_marker.len();
    let region = &source_text[start..region_end];

    if region.trim() == cleaned {
        tracing::info!("region already carries the candidate text");
        return Outcome::AlreadyPatched;
    }

    // 4. Replace the entire region, markers inclusive.
    let mut patched = String::with_capacity(source_text.len() + cleaned.len());
    patched.push_str(&source_text[..start]);
    patched.push_str(&cleaned);
    patched.push_str(&source_text[region_end..]);

    tracing::info!(
        removed = region.len(),
        inserted = cleaned.len(),
        "region replaced"
    );
    Outcome::Applied(patched)
}
