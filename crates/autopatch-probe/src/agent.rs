//! Probe state machine
//!
//! `Idle -> Registering -> LoggingIn -> PostCreated -> Attacking ->
//! {Confirmed | AlreadyFixed | Anomalous}`. Linear, no retries within a
//! run. Registration treats "created" and "already exists" as equivalent
//! success so repeated runs are idempotent setup.

use crate::target::TargetApi;
use crate::ProbeError;
use serde::{Deserialize, Serialize};

/// Probe identity and success markers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Non-privileged account name
    pub username: String,
    /// Account password
    pub password: String,
    /// Marker an authenticated page must contain
    pub session_marker: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            username: "monkey_user".to_string(),
            password: "monkeypass".to_string(),
            session_marker: "<h1>Blog Posts</h1>".to_string(),
        }
    }
}

/// Position in the linear run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Not yet started
    Idle,
    /// Creating the account
    Registering,
    /// Authenticating
    LoggingIn,
    /// Content created, ready to attack
    PostCreated,
    /// Privileged call in flight
    Attacking,
}

/// Classification of the attack step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Privileged action succeeded for the non-privileged session.
    /// Carries the audit line the target is expected to have emitted.
    Confirmed {
        /// Expected audit-log line (breach evidence)
        audit_line: String,
        /// Target's response body (echoes the acting identity)
        response_body: String,
    },
    /// Target rejected the attack with a forbidden status
    AlreadyFixed,
    /// Any other response
    Anomalous {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },
}

/// Scripted attacker over a target API
#[derive(Debug)]
pub struct ProbeAgent<T> {
    target: T,
    config: ProbeConfig,
    state: ProbeState,
}

impl<T: TargetApi> ProbeAgent<T> {
    /// New agent in the idle state
    #[inline]
    #[must_use]
    pub fn new(target: T, config: ProbeConfig) -> Self {
        Self {
            target,
            config,
            state: ProbeState::Idle,
        }
    }

    /// Current state (observability)
    #[inline]
    #[must_use]
    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Run one attack cycle against `post_id`.
    ///
    /// Any step failure aborts the run with its cause; classification of
    /// the final privileged call is returned on success.
    pub async fn run_cycle(&mut self, post_id: u64) -> Result<AttackOutcome, ProbeError> {
        self.state = ProbeState::Registering;
        tracing::info!(user = %self.config.username, "registering");
        let resp = self
            .target
            .register(&self.config.username, &self.config.password)
            .await?;
        // 200 for a new account, 400 when it already exists. Both fine.
        if !resp.is_success() && resp.status != 400 {
            return Err(ProbeError::RegistrationFailed {
                status: resp.status,
                body: resp.body,
            });
        }

        self.state = ProbeState::LoggingIn;
        tracing::info!(user = %self.config.username, "logging in");
        let resp = self
            .target
            .login(&self.config.username, &self.config.password)
            .await?;
        if !resp.is_success() || !resp.body.contains(&self.config.session_marker) {
            return Err(ProbeError::LoginFailed {
                status: resp.status,
                body: resp.body,
            });
        }

        tracing::info!(post_id, "creating post");
        let resp = self
            .target
            .create_post(&format!("Post {post_id}"), "This post was made by the probe.")
            .await?;
        if !resp.is_success() || !resp.body.contains(&self.config.session_marker) {
            return Err(ProbeError::ContentCreationFailed {
                status: resp.status,
                body: resp.body,
            });
        }
        self.state = ProbeState::PostCreated;

        self.state = ProbeState::Attacking;
        tracing::info!(post_id, "attacking: privileged delete with non-privileged session");
        let resp = self.target.admin_delete(post_id).await?;

        let outcome = self.classify(post_id, resp);
        self.state = ProbeState::Idle;
        Ok(outcome)
    }

    /// Classify the privileged call's response
    fn classify(&self, post_id: u64, resp: crate::target::ApiResponse) -> AttackOutcome {
        let identity_echo = format!("deleted by {}", self.config.username);
        if resp.is_success() && resp.body.contains(&identity_echo) {
            AttackOutcome::Confirmed {
                audit_line: format!(
                    "[CRITICAL] ADMIN ACTION: User {} (role: USER) deleted post {}.",
                    self.config.username, post_id
                ),
                response_body: resp.body,
            }
        } else if resp.status == 403 {
            AttackOutcome::AlreadyFixed
        } else {
            AttackOutcome::Anomalous {
                status: resp.status,
                body: resp.body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::ApiResponse;
    use std::sync::Mutex;

    /// Scripted target with a fixed response per endpoint
    struct ScriptedTarget {
        register: ApiResponse,
        login: ApiResponse,
        create_post: ApiResponse,
        admin_delete: ApiResponse,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedTarget {
        fn vulnerable() -> Self {
            Self {
                register: ApiResponse {
                    status: 200,
                    body: "registered".into(),
                },
                login: ApiResponse {
                    status: 200,
                    body: "<h1>Blog Posts</h1>".into(),
                },
                create_post: ApiResponse {
                    status: 200,
                    body: "<h1>Blog Posts</h1>".into(),
                },
                admin_delete: ApiResponse {
                    status: 200,
                    body: "Post 1 deleted by monkey_user.".into(),
                },
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl TargetApi for ScriptedTarget {
        async fn register(&self, _: &str, _: &str) -> Result<ApiResponse, ProbeError> {
            self.calls.lock().unwrap().push("register");
            Ok(self.register.clone())
        }
        async fn login(&self, _: &str, _: &str) -> Result<ApiResponse, ProbeError> {
            self.calls.lock().unwrap().push("login");
            Ok(self.login.clone())
        }
        async fn create_post(&self, _: &str, _: &str) -> Result<ApiResponse, ProbeError> {
            self.calls.lock().unwrap().push("create_post");
            Ok(self.create_post.clone())
        }
        async fn admin_delete(&self, _: u64) -> Result<ApiResponse, ProbeError> {
            self.calls.lock().unwrap().push("admin_delete");
            Ok(self.admin_delete.clone())
        }
    }

    #[tokio::test]
    async fn vulnerable_target_confirms_breach() {
        let target = ScriptedTarget::vulnerable();
        let mut agent = ProbeAgent::new(target, ProbeConfig::default());

        match agent.run_cycle(1).await.unwrap() {
            AttackOutcome::Confirmed {
                audit_line,
                response_body,
            } => {
                assert_eq!(
                    audit_line,
                    "[CRITICAL] ADMIN ACTION: User monkey_user (role: USER) deleted post 1."
                );
                assert!(response_body.contains("deleted by monkey_user"));
            }
            other => panic!("expected Confirmed, got {other:?}"),
        }
        assert_eq!(
            *agent.target.calls.lock().unwrap(),
            vec!["register", "login", "create_post", "admin_delete"]
        );
    }

    #[tokio::test]
    async fn existing_account_is_equivalent_success() {
        let mut target = ScriptedTarget::vulnerable();
        target.register = ApiResponse {
            status: 400,
            body: "User already exists".into(),
        };
        let mut agent = ProbeAgent::new(target, ProbeConfig::default());
        assert!(agent.run_cycle(1).await.is_ok());
    }

    #[tokio::test]
    async fn forbidden_attack_means_already_fixed() {
        let mut target = ScriptedTarget::vulnerable();
        target.admin_delete = ApiResponse {
            status: 403,
            body: "Forbidden".into(),
        };
        let mut agent = ProbeAgent::new(target, ProbeConfig::default());
        assert_eq!(agent.run_cycle(1).await.unwrap(), AttackOutcome::AlreadyFixed);
    }

    #[tokio::test]
    async fn success_without_identity_echo_is_anomalous() {
        let mut target = ScriptedTarget::vulnerable();
        target.admin_delete = ApiResponse {
            status: 200,
            body: "<html>login page</html>".into(),
        };
        let mut agent = ProbeAgent::new(target, ProbeConfig::default());
        assert!(matches!(
            agent.run_cycle(1).await.unwrap(),
            AttackOutcome::Anomalous { status: 200, .. }
        ));
    }

    #[tokio::test]
    async fn server_error_on_attack_is_anomalous() {
        let mut target = ScriptedTarget::vulnerable();
        target.admin_delete = ApiResponse {
            status: 500,
            body: "boom".into(),
        };
        let mut agent = ProbeAgent::new(target, ProbeConfig::default());
        assert!(matches!(
            agent.run_cycle(1).await.unwrap(),
            AttackOutcome::Anomalous { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn failed_login_aborts_with_cause() {
        let mut target = ScriptedTarget::vulnerable();
        target.login = ApiResponse {
            status: 200,
            body: "wrong password".into(), // no session marker
        };
        let mut agent = ProbeAgent::new(target, ProbeConfig::default());
        assert!(matches!(
            agent.run_cycle(1).await,
            Err(ProbeError::LoginFailed { .. })
        ));
        // The attack step never ran.
        assert!(!agent
            .target
            .calls
            .lock()
            .unwrap()
            .contains(&"admin_delete"));
    }

    #[tokio::test]
    async fn failed_post_creation_aborts_with_cause() {
        let mut target = ScriptedTarget::vulnerable();
        target.create_post = ApiResponse {
            status: 500,
            body: "db error".into(),
        };
        let mut agent = ProbeAgent::new(target, ProbeConfig::default());
        assert!(matches!(
            agent.run_cycle(1).await,
            Err(ProbeError::ContentCreationFailed { .. })
        ));
    }
}
