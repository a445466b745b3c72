//! The login gate: session, then CSRF token, then credentials.
//!
//! [`LoginGate::evaluate`] runs the three checks strictly in that order and
//! stops at the first failure:
//!
//! | Step | Failure | Status |
//! |---|---|---|
//! | 1. session lookup | [`AuthOutcome::RejectedNoSession`] | 403 |
//! | 2. CSRF token | [`AuthOutcome::RejectedNoOrBadToken`] | 403 |
//! | 3. credentials | [`AuthOutcome::RejectedCredentials`] | 401 |
//! | success | [`AuthOutcome::Accepted`] | 200 |
//!
//! A rejected attempt leaves the session and its CSRF secret untouched.
//! Store and repository failures are returned as `Err` and never mapped onto
//! a rejection.

use std::sync::Arc;

use sessiongate_core::GateError;

use crate::backends::{CredentialVerifier, Credentials};
use crate::csrf::validate_token;
use crate::session::SessionStore;
use crate::user::User;

/// The result of evaluating one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Session, token, and credentials were all valid.
    Accepted(User),
    /// No session was presented, or it did not resolve to a live record.
    RejectedNoSession,
    /// The session exists but the CSRF token is missing or does not match.
    RejectedNoOrBadToken,
    /// Session and token were valid but the credentials were not.
    RejectedCredentials,
}

impl AuthOutcome {
    /// Returns the HTTP status code for this outcome.
    ///
    /// Missing session and bad token share 403 on purpose.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Accepted(_) => 200,
            Self::RejectedCredentials => 401,
            Self::RejectedNoSession | Self::RejectedNoOrBadToken => 403,
        }
    }

    /// Returns `true` for [`AuthOutcome::Accepted`].
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// A short label for logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted(_) => "accepted",
            Self::RejectedNoSession => "no_session",
            Self::RejectedNoOrBadToken => "bad_csrf_token",
            Self::RejectedCredentials => "bad_credentials",
        }
    }
}

/// Orchestrates the session store, CSRF validation, and credential verifier.
#[derive(Clone)]
pub struct LoginGate {
    sessions: Arc<dyn SessionStore>,
    verifier: CredentialVerifier,
}

impl LoginGate {
    /// Creates a gate over the given store and verifier.
    pub fn new(sessions: Arc<dyn SessionStore>, verifier: CredentialVerifier) -> Self {
        Self { sessions, verifier }
    }

    /// Returns the session store this gate reads from.
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Evaluates one login attempt.
    ///
    /// `session_key` is the already-authenticated session identifier from the
    /// request cookie (if any) and `presented_token` the CSRF header value.
    pub async fn evaluate(
        &self,
        session_key: Option<&str>,
        presented_token: Option<&str>,
        credentials: &Credentials,
    ) -> Result<AuthOutcome, GateError> {
        let session = match session_key {
            Some(key) => self.sessions.get(key).await?,
            None => None,
        };
        let Some(session) = session else {
            return Ok(AuthOutcome::RejectedNoSession);
        };

        if !validate_token(Some(&session), presented_token) {
            return Ok(AuthOutcome::RejectedNoOrBadToken);
        }

        let Some(user) = self.verifier.verify(credentials).await? else {
            return Ok(AuthOutcome::RejectedCredentials);
        };

        if !self
            .sessions
            .record_login(&session.session_key, &user.username)
            .await?
        {
            // The session expired or was deleted between the checks.
            return Ok(AuthOutcome::RejectedNoSession);
        }

        Ok(AuthOutcome::Accepted(user))
    }
}

impl std::fmt::Debug for LoginGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGate")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::backends::{InMemoryUserRepository, UserRepository};
    use crate::csrf::issue_token;
    use crate::session::{generate_session_key, InMemorySessionStore, SessionData};

    struct FailingRepository;

    #[async_trait]
    impl UserRepository for FailingRepository {
        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, GateError> {
            Err(GateError::InternalServerError("user store unreachable".to_string()))
        }
    }

    async fn gate_with_user1() -> (LoginGate, Arc<InMemorySessionStore>) {
        let repository = InMemoryUserRepository::new();
        repository
            .add_user(User::with_password("user1", "password1").await.unwrap())
            .await;
        let store = Arc::new(InMemorySessionStore::new());
        let gate = LoginGate::new(
            store.clone(),
            CredentialVerifier::new(Arc::new(repository)),
        );
        (gate, store)
    }

    async fn session_and_token(store: &InMemorySessionStore) -> (SessionData, String) {
        let session = store.create().await.unwrap();
        let token = issue_token(store, &session).await.unwrap().unwrap();
        (session, token)
    }

    #[test]
    fn test_outcome_status_codes() {
        let user = User::new("user1", "hash");
        assert_eq!(AuthOutcome::Accepted(user).status_code(), 200);
        assert_eq!(AuthOutcome::RejectedCredentials.status_code(), 401);
        assert_eq!(AuthOutcome::RejectedNoSession.status_code(), 403);
        assert_eq!(AuthOutcome::RejectedNoOrBadToken.status_code(), 403);
    }

    #[tokio::test]
    async fn test_accepts_valid_triple() {
        let (gate, store) = gate_with_user1().await;
        let (session, token) = session_and_token(&store).await;

        let outcome = gate
            .evaluate(
                Some(&session.session_key),
                Some(&token),
                &Credentials::new("user1", "password1"),
            )
            .await
            .unwrap();

        let AuthOutcome::Accepted(user) = outcome else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(user.username, "user1");

        let reloaded = store.get(&session.session_key).await.unwrap().unwrap();
        assert_eq!(reloaded.user.as_deref(), Some("user1"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_401() {
        let (gate, store) = gate_with_user1().await;
        let (session, token) = session_and_token(&store).await;

        let outcome = gate
            .evaluate(
                Some(&session.session_key),
                Some(&token),
                &Credentials::new("user1", "password2"),
            )
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::RejectedCredentials);
    }

    #[tokio::test]
    async fn test_missing_token_is_403_even_with_good_credentials() {
        let (gate, store) = gate_with_user1().await;
        let (session, _token) = session_and_token(&store).await;

        let outcome = gate
            .evaluate(
                Some(&session.session_key),
                None,
                &Credentials::new("user1", "password1"),
            )
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::RejectedNoOrBadToken);
    }

    #[tokio::test]
    async fn test_token_check_precedes_credentials() {
        let (gate, store) = gate_with_user1().await;
        let (session, _token) = session_and_token(&store).await;

        let outcome = gate
            .evaluate(
                Some(&session.session_key),
                Some("forged"),
                &Credentials::new("user1", "wrong"),
            )
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::RejectedNoOrBadToken);
    }

    #[tokio::test]
    async fn test_no_session_is_403_even_with_token() {
        let (gate, store) = gate_with_user1().await;
        let (_session, token) = session_and_token(&store).await;

        let outcome = gate
            .evaluate(None, Some(&token), &Credentials::new("user1", "password1"))
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::RejectedNoSession);

        let unknown = generate_session_key();
        let outcome = gate
            .evaluate(Some(&unknown), Some(&token), &Credentials::new("user1", "password1"))
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::RejectedNoSession);
    }

    #[tokio::test]
    async fn test_token_from_another_session_is_rejected() {
        let (gate, store) = gate_with_user1().await;
        let (session_a, _token_a) = session_and_token(&store).await;
        let (_session_b, token_b) = session_and_token(&store).await;

        let outcome = gate
            .evaluate(
                Some(&session_a.session_key),
                Some(&token_b),
                &Credentials::new("user1", "password1"),
            )
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::RejectedNoOrBadToken);
    }

    #[tokio::test]
    async fn test_failed_attempt_keeps_session_and_token() {
        let (gate, store) = gate_with_user1().await;
        let (session, token) = session_and_token(&store).await;
        let key = Some(session.session_key.as_str());

        let first = gate
            .evaluate(key, Some(&token), &Credentials::new("user1", "nope"))
            .await
            .unwrap();
        assert_eq!(first, AuthOutcome::RejectedCredentials);

        let second = gate
            .evaluate(key, Some(&token), &Credentials::new("user1", "password1"))
            .await
            .unwrap();
        assert!(second.is_accepted());
    }

    #[tokio::test]
    async fn test_repository_failure_is_error_not_rejection() {
        let store = Arc::new(InMemorySessionStore::new());
        let gate = LoginGate::new(
            store.clone(),
            CredentialVerifier::new(Arc::new(FailingRepository)),
        );
        let (session, token) = session_and_token(&store).await;

        let result = gate
            .evaluate(
                Some(&session.session_key),
                Some(&token),
                &Credentials::new("user1", "password1"),
            )
            .await;
        assert!(result.unwrap_err().is_server_fault());
    }

    #[tokio::test]
    async fn test_repository_not_consulted_without_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let gate = LoginGate::new(store, CredentialVerifier::new(Arc::new(FailingRepository)));

        let outcome = gate
            .evaluate(None, None, &Credentials::new("user1", "password1"))
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::RejectedNoSession);
    }
}
