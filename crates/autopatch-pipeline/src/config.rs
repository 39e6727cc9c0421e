//! Pipeline configuration
//!
//! Defaults match the reference deployment: a target blog app on
//! `localhost:5000`, a local model server on `localhost:11434`, and the
//! `swarm_logs` topic. Everything is overridable from a TOML file.

use autopatch_oracle::{OracleConfig, SynthesisTarget};
use autopatch_patch::PatchSpec;
use autopatch_probe::ProbeConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration load errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the config file
    #[error("failed to read config at {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bus topic every agent publishes under and subscribes to
    pub topic: String,
    /// Base URL of the target system under test
    pub target_url: String,
    /// Path to the target's source document (the patch target)
    pub source_path: PathBuf,
    /// Path to the rulebook YAML
    pub rulebook_path: PathBuf,
    /// Seconds between probe cycles
    pub attack_interval_secs: u64,
    /// Probe identity and markers
    pub probe: ProbeConfig,
    /// Oracle endpoint and model
    pub oracle: OracleConfig,
    /// Patch anchors
    pub patch: PatchSpec,
    /// Synthesis prompt target
    pub synthesis: SynthesisTarget,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topic: "swarm_logs".to_string(),
            target_url: "http://localhost:5000".to_string(),
            source_path: PathBuf::from("app.py"),
            rulebook_path: PathBuf::from("config/rulebook.yaml"),
            attack_interval_secs: 10,
            probe: ProbeConfig::default(),
            oracle: OracleConfig::default(),
            patch: PatchSpec::default(),
            synthesis: SynthesisTarget {
                function_signature: "def delete_post(post_id):".to_string(),
                required_role: "ADMIN".to_string(),
                anchor_token: "@app.route".to_string(),
            },
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file; missing keys take defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = PipelineConfig::default();
        assert_eq!(config.topic, "swarm_logs");
        assert_eq!(config.target_url, "http://localhost:5000");
        assert_eq!(config.attack_interval_secs, 10);
        assert_eq!(config.oracle.model, "gemma:2b");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
target_url = "http://victim:8080"

[oracle]
model = "llama3:8b"
"#,
        )
        .unwrap();
        assert_eq!(config.target_url, "http://victim:8080");
        assert_eq!(config.oracle.model, "llama3:8b");
        // Untouched keys fall back.
        assert_eq!(config.topic, "swarm_logs");
        assert_eq!(config.probe.username, "monkey_user");
    }
}
