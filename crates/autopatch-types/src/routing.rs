//! Routing-key constants following the `agent.verb` convention.
//!
//! Keys are observability metadata only. No subscriber branches on them;
//! wildcard subscribers use them to label rendered traffic.

/// Pipeline bootstrap
pub const SYSTEM_START: &str = "system.start";
/// Fatal startup diagnostics
pub const SYSTEM_ERROR: &str = "system.error";
/// Pipeline standing by after a completed run
pub const SYSTEM_DONE: &str = "system.done";

/// Probe setup and progress
pub const PROBE_ACTION: &str = "probe.action";
/// Confirmed breach: triggers the extraction stage
pub const PROBE_SUCCESS: &str = "probe.success";
/// Attack rejected with forbidden status (already fixed)
pub const PROBE_FAIL: &str = "probe.fail";
/// Unexpected target behavior
pub const PROBE_ERROR: &str = "probe.error";

/// Extractor progress
pub const WATCHER_ANALYZE: &str = "watcher.analyze";
/// Structured record produced
pub const WATCHER_RESULT: &str = "watcher.result";
/// Rule fired: triggers the synthesis stage
pub const WATCHER_BREACH: &str = "watcher.breach";
/// No rule fired
pub const WATCHER_CLEAR: &str = "watcher.clear";
/// Extraction or evaluation failure
pub const WATCHER_ERROR: &str = "watcher.error";

/// Synthesizer progress
pub const CORRECTOR_ANALYZE: &str = "corrector.analyze";
/// Candidate patch produced: triggers the applier
pub const CORRECTOR_SUCCESS: &str = "corrector.success";
/// Synthesis failure
pub const CORRECTOR_ERROR: &str = "corrector.error";

/// Applier progress
pub const PATCHER_CLEAN: &str = "patcher.clean";
/// Source text rewritten and persisted
pub const PATCHER_SUCCESS: &str = "patcher.success";
/// Anchors absent or candidate rejected
pub const PATCHER_SKIP: &str = "patcher.skip";
/// Apply or persist failure
pub const PATCHER_ERROR: &str = "patcher.error";
