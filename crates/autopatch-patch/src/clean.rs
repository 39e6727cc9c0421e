//! Candidate cleaning
//!
//! Oracle replies arrive as free text. A usable code block is recovered in
//! two steps: prefer the interior of the first fenced code block; failing
//! that, take everything from the first occurrence of the anchor token
//! onward. Neither found, or nothing left after trimming, means the
//! candidate is rejected before it can touch the source.

use once_cell::sync::Lazy;
use regex::Regex;

/// First fenced code block, optional language tag, DOTALL interior.
static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*\n?(.*?)```").expect("fence regex is valid")
});

/// Recover a clean code block from a raw oracle reply.
///
/// Returns `None` when no fenced block and no anchor token is present, or
/// when the recovered text trims to nothing.
#[must_use]
pub fn clean(raw: &str, anchor_token: &str) -> Option<String> {
    let extracted = if let Some(captures) = FENCE.captures(raw) {
        tracing::debug!("extracted candidate from fenced block");
        captures.get(1).map(|m| m.as_str())?
    } else if let Some(idx) = raw.find(anchor_token) {
        tracing::debug!("no fence; falling back to anchor-token extraction");
        &raw[idx..]
    } else {
        return None;
    };

    let trimmed = extracted.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
