//! OpenAI-compatible chat-completions client
//!
//! Speaks the wire protocol local model servers expose (the default config
//! targets an Ollama endpoint). There is deliberately no request deadline:
//! an oracle call blocks until a reply or a transport failure, and a hang
//! stalls that stage only.

use crate::OracleError;
use serde_json::Value;

/// Oracle connection settings
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of the OpenAI-compatible API, e.g. `http://localhost:11434/v1`
    pub base_url: String,
    /// Model name to request
    pub model: String,
    /// Bearer token. Local servers ignore it but the field must be non-empty.
    pub api_key: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "gemma:2b".to_string(),
            api_key: "ollama".to_string(),
        }
    }
}

/// Seam between oracle consumers and the transport.
///
/// Production uses [`OracleClient`]; tests substitute canned or failing
/// oracles to exercise consumer validation.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    /// Request a completion for a system instruction plus user input.
    ///
    /// `json_only` asks the service for a structured-object reply where the
    /// protocol supports it; the reply is still untrusted either way.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_only: bool,
    ) -> Result<String, OracleError>;
}

/// HTTP oracle client
#[derive(Debug, Clone)]
pub struct OracleClient {
    http: reqwest::Client,
    config: OracleConfig,
}

impl OracleClient {
    /// Build a client for the configured endpoint
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .user_agent("autopatch/0.1")
            .build()
            .map_err(|e| OracleError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// The configured model name
    #[inline]
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Reachability check against the model-list endpoint.
    ///
    /// Used at startup: an unreachable oracle is fatal for the agent
    /// process, with this diagnostic surfaced.
    pub async fn ping(&self) -> Result<(), OracleError> {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!(model = %self.config.model, "oracle reachable");
        Ok(())
    }

    /// Extract the completion text from a chat-completions response body
    fn parse_completion(json: &Value) -> Result<String, OracleError> {
        let content = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|v| v.as_str())
            .ok_or(OracleError::EmptyReply)?;

        if content.trim().is_empty() {
            return Err(OracleError::EmptyReply);
        }
        Ok(content.to_string())
    }
}

#[async_trait::async_trait]
impl Oracle for OracleClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_only: bool,
    ) -> Result<String, OracleError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });
        if json_only {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        tracing::debug!(model = %self.config.model, json_only, "sending oracle request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(OracleError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| OracleError::Parse(format!("response not JSON: {e}")))?;
        Self::parse_completion(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_completion_extracts_first_choice() {
        let json: Value = serde_json::from_str(
            r#"{
                "choices": [
                    {"message": {"role": "assistant", "content": "hello"}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(OracleClient::parse_completion(&json).unwrap(), "hello");
    }

    #[test]
    fn parse_completion_rejects_missing_choices() {
        let json: Value = serde_json::from_str(r#"{"object": "list"}"#).unwrap();
        assert!(matches!(
            OracleClient::parse_completion(&json),
            Err(OracleError::EmptyReply)
        ));
    }

    #[test]
    fn parse_completion_rejects_blank_content() {
        let json: Value = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "   \n"}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            OracleClient::parse_completion(&json),
            Err(OracleError::EmptyReply)
        ));
    }

    #[test]
    fn default_config_targets_local_server() {
        let config = OracleConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert!(!config.api_key.is_empty());
    }
}
