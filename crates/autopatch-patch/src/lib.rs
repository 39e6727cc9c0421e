//! Autopatch applier
//!
//! The single point of policy for "is this text acceptable to write into
//! the source":
//! - Cleaning: fence extraction or anchor-token fallback over the raw
//!   oracle reply
//! - Anchored replacement: a region delimited by literal start/end markers
//!   is swapped in one in-memory transform
//! - Persistence: whole-file overwrite via temp file + rename, so a crash
//!   mid-write leaves the prior or the next full version, never an
//!   interleaving
//!
//! "Anchors not found" and "already patched" are distinct, non-fatal
//! terminal states, which is what makes repeated application idempotent.

#![warn(unreachable_pub)]

pub mod apply;
pub mod clean;
pub mod store;

pub use apply::{apply, Outcome, PatchSpec};
pub use clean::clean;
pub use store::{load_source, persist_source};

/// Patch persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// Could not read the source document
    #[error("failed to read source at {path}: {source}")]
    Read {
        /// Offending path
        path: std::path::PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Could not write the new source text
    #[error("failed to persist source at {path}: {source}")]
    Write {
        /// Offending path
        path: std::path::PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
