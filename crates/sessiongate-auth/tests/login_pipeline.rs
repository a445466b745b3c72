//! Integration tests for the session + CSRF + credentials pipeline.
//!
//! Exercises the public API of sessiongate-auth the way the HTTP layer does:
//! create a session, issue a token for it, then evaluate login attempts.

use std::sync::Arc;

use sessiongate_auth::csrf::mask_csrf_token;
use sessiongate_auth::{
    issue_token, validate_token, AuthOutcome, CredentialVerifier, Credentials,
    InMemorySessionStore, InMemoryUserRepository, LoginGate, SessionStore,
};
use sessiongate_core::UserSeed;

// ── Helpers ──────────────────────────────────────────────────────────

fn seed(username: &str, password: &str) -> UserSeed {
    UserSeed {
        username: username.to_string(),
        password: Some(password.to_string()),
        password_hash: None,
        is_active: true,
    }
}

async fn build_gate(store: Arc<InMemorySessionStore>) -> LoginGate {
    let repository = InMemoryUserRepository::from_seeds(&[seed("user1", "password1")])
        .await
        .unwrap();
    LoginGate::new(store, CredentialVerifier::new(Arc::new(repository)))
}

// ═══════════════════════════════════════════════════════════════════════
// 1. LOGIN FLOW
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn full_flow_accepts_and_records_login() {
    let store = Arc::new(InMemorySessionStore::new());
    let gate = build_gate(store.clone()).await;

    let session = store.create().await.unwrap();
    let token = issue_token(&*store, &session).await.unwrap().unwrap();

    let outcome = gate
        .evaluate(
            Some(&session.session_key),
            Some(&token),
            &Credentials::new("user1", "password1"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.status_code(), 200);

    let stored = store.get(&session.session_key).await.unwrap().unwrap();
    assert!(stored.is_authenticated());
    assert!(stored.last_login.is_some());
}

#[tokio::test]
async fn second_token_does_not_invalidate_first() {
    let store = Arc::new(InMemorySessionStore::new());
    let gate = build_gate(store.clone()).await;

    let session = store.create().await.unwrap();
    let first = issue_token(&*store, &session).await.unwrap().unwrap();
    let _second = issue_token(&*store, &session).await.unwrap().unwrap();

    let outcome = gate
        .evaluate(
            Some(&session.session_key),
            Some(&first),
            &Credentials::new("user1", "password1"),
        )
        .await
        .unwrap();
    assert!(outcome.is_accepted());
}

#[tokio::test]
async fn wrong_password_then_right_password() {
    let store = Arc::new(InMemorySessionStore::new());
    let gate = build_gate(store.clone()).await;
    let session = store.create().await.unwrap();
    let token = issue_token(&*store, &session).await.unwrap().unwrap();
    let key = Some(session.session_key.as_str());

    let denied = gate
        .evaluate(key, Some(&token), &Credentials::new("user1", "password2"))
        .await
        .unwrap();
    assert_eq!(denied, AuthOutcome::RejectedCredentials);
    assert!(!store.get(&session.session_key).await.unwrap().unwrap().is_authenticated());

    let accepted = gate
        .evaluate(key, Some(&token), &Credentials::new("user1", "password1"))
        .await
        .unwrap();
    assert!(accepted.is_accepted());
}

// ═══════════════════════════════════════════════════════════════════════
// 2. CSRF BINDING
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn token_is_bound_to_its_session() {
    let store = Arc::new(InMemorySessionStore::new());
    let session_a = store.create().await.unwrap();
    let session_b = store.create().await.unwrap();

    let token_a = issue_token(&*store, &session_a).await.unwrap().unwrap();
    issue_token(&*store, &session_b).await.unwrap().unwrap();

    let a = store.get(&session_a.session_key).await.unwrap().unwrap();
    let b = store.get(&session_b.session_key).await.unwrap().unwrap();
    assert!(validate_token(Some(&a), Some(&token_a)));
    assert!(!validate_token(Some(&b), Some(&token_a)));
}

#[tokio::test]
async fn forged_mask_of_unknown_secret_is_rejected() {
    let store = Arc::new(InMemorySessionStore::new());
    let gate = build_gate(store.clone()).await;
    let session = store.create().await.unwrap();
    issue_token(&*store, &session).await.unwrap().unwrap();

    let forged = mask_csrf_token(&"00".repeat(32));
    let outcome = gate
        .evaluate(
            Some(&session.session_key),
            Some(&forged),
            &Credentials::new("user1", "password1"),
        )
        .await
        .unwrap();
    assert_eq!(outcome, AuthOutcome::RejectedNoOrBadToken);
}

// ═══════════════════════════════════════════════════════════════════════
// 3. SESSION LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn expired_session_is_rejected_as_missing() {
    let store = Arc::new(InMemorySessionStore::with_lifetime(0));
    let gate = build_gate(store.clone()).await;
    let session = store.create().await.unwrap();

    let outcome = gate
        .evaluate(
            Some(&session.session_key),
            Some("whatever"),
            &Credentials::new("user1", "password1"),
        )
        .await
        .unwrap();
    assert_eq!(outcome, AuthOutcome::RejectedNoSession);
    assert_eq!(store.clear_expired().await.unwrap(), 1);
}

#[tokio::test]
async fn deleted_session_rejects_its_old_token() {
    let store = Arc::new(InMemorySessionStore::new());
    let gate = build_gate(store.clone()).await;
    let session = store.create().await.unwrap();
    let token = issue_token(&*store, &session).await.unwrap().unwrap();
    store.delete(&session.session_key).await.unwrap();

    let outcome = gate
        .evaluate(
            Some(&session.session_key),
            Some(&token),
            &Credentials::new("user1", "password1"),
        )
        .await
        .unwrap();
    assert_eq!(outcome, AuthOutcome::RejectedNoSession);
}
