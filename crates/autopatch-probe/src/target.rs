//! Target system client
//!
//! The target contract consumed by the probe: query-param registration and
//! login, content creation, and the privileged delete. The trait is the
//! seam that lets the state machine run against a scripted target in
//! tests.

use crate::ProbeError;

/// Status and body of one target call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body text
    pub body: String,
}

impl ApiResponse {
    /// Whether the call succeeded at the HTTP level
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The target's HTTP surface
#[async_trait::async_trait]
pub trait TargetApi: Send + Sync {
    /// Create an account (idempotent create-or-conflict)
    async fn register(&self, username: &str, password: &str) -> Result<ApiResponse, ProbeError>;
    /// Authenticate; the session is held by the implementation
    async fn login(&self, username: &str, password: &str) -> Result<ApiResponse, ProbeError>;
    /// Create a content item as the logged-in user
    async fn create_post(&self, title: &str, content: &str) -> Result<ApiResponse, ProbeError>;
    /// Invoke the privileged delete on `post_id` with the current session
    async fn admin_delete(&self, post_id: u64) -> Result<ApiResponse, ProbeError>;
}

/// Production client. One authenticated session per instance; running two
/// probes against the same identity concurrently is not safe.
#[derive(Debug)]
pub struct HttpTarget {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTarget {
    /// Build a client holding a cookie session for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProbeError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent("autopatch-probe/0.1")
            .build()
            .map_err(|e| ProbeError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, ProbeError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let resp = self.http.get(&url).query(query).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(ApiResponse { status, body })
    }
}

#[async_trait::async_trait]
impl TargetApi for HttpTarget {
    async fn register(&self, username: &str, password: &str) -> Result<ApiResponse, ProbeError> {
        self.get("/register", &[("username", username), ("password", password)])
            .await
    }

    async fn login(&self, username: &str, password: &str) -> Result<ApiResponse, ProbeError> {
        self.get("/login", &[("username", username), ("password", password)])
            .await
    }

    async fn create_post(&self, title: &str, content: &str) -> Result<ApiResponse, ProbeError> {
        self.get("/create_post", &[("title", title), ("content", content)])
            .await
    }

    async fn admin_delete(&self, post_id: u64) -> Result<ApiResponse, ProbeError> {
        self.get(&format!("/admin/delete/{post_id}"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses() {
        let ok = ApiResponse {
            status: 200,
            body: String::new(),
        };
        assert!(ok.is_success());

        let forbidden = ApiResponse {
            status: 403,
            body: String::new(),
        };
        assert!(!forbidden.is_success());
    }
}
