//! Integration tests for the magic link authentication flow.

use gateway_auth::{
    AuthError, AuthUser, AuthenticationMethod, Authenticator, ConfigError, EmailLinkStrategy,
    Form, InMemorySessionStore, MagicLinkConfig, SessionHandle, SessionId, StrategyOutcome,
    StrategyRequest, VerifyParams,
    constants::{EMAIL_FIELD, STRATEGY_NAME},
    mocks::{MockEmailProvider, MockPostAuthentication, MockUserRepository},
    register_email_link_strategy,
};
use std::time::Duration;

type TestStrategy =
    EmailLinkStrategy<MockEmailProvider, MockUserRepository, MockPostAuthentication>;

struct Harness {
    strategy: TestStrategy,
    email: MockEmailProvider,
    users: MockUserRepository,
    hook: MockPostAuthentication,
}

/// Create a strategy wired to the given mocks.
fn harness_with(
    config: MagicLinkConfig,
    users: MockUserRepository,
    hook: MockPostAuthentication,
) -> Harness {
    let email = MockEmailProvider::new();
    let strategy = EmailLinkStrategy::new(config, email.clone(), users.clone(), hook.clone());
    Harness {
        strategy,
        email,
        users,
        hook,
    }
}

#[allow(clippy::unwrap_used)]
fn test_config() -> MagicLinkConfig {
    MagicLinkConfig::new("integration-secret", "https://app.example.com").unwrap()
}

fn harness() -> Harness {
    harness_with(
        test_config(),
        MockUserRepository::new(),
        MockPostAuthentication::new(),
    )
}

fn form(email: &str) -> Form {
    let mut form = Form::new();
    form.insert(EMAIL_FIELD.to_string(), email.to_string());
    form
}

fn verify_params(email: &str) -> VerifyParams {
    VerifyParams {
        email: email.to_string(),
        form: form(email),
        magic_link_verify: true,
    }
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_magic_link_flow_complete_happy_path() {
    let h = harness();
    let store = InMemorySessionStore::new();
    let session = SessionHandle::new(&store, SessionId::new());

    // Step 1: Send magic link
    let sent = h.strategy.send_link(form("user@example.com"), &session).await.unwrap();
    assert_eq!(sent.email, "user@example.com");
    assert_eq!(h.email.sent_count(), 1);
    assert_eq!(h.email.sent()[0].to, "user@example.com");

    // Step 2: Follow the link
    let link = h.email.last_link().unwrap();
    assert!(link.starts_with("https://app.example.com/magic?token="));
    let token = MockEmailProvider::token_from_link(&link).unwrap();

    let user = h.strategy.callback(&token, &session).await.unwrap();

    // Step 3: User exists and the hook saw the login
    let calls = h.hook.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].user.id, user.user_id);
    assert_eq!(calls[0].user.email, "user@example.com");
    assert_eq!(calls[0].user.authentication_method, AuthenticationMethod::MagicLink);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_first_time_email_is_new_user_with_magic_link_method() {
    let h = harness();

    h.strategy.verify(verify_params("new@example.com")).await.unwrap();

    let calls = h.hook.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_new_user);
    assert_eq!(calls[0].login_method, AuthenticationMethod::MagicLink);
    assert_eq!(calls[0].login_method.to_string(), "MAGIC_LINK");
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_returning_email_is_not_new_user() {
    let h = harness();

    let first = h.strategy.verify(verify_params("back@example.com")).await.unwrap();
    let second = h.strategy.verify(verify_params("back@example.com")).await.unwrap();

    assert_eq!(first, second);
    let calls = h.hook.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].is_new_user);
    assert!(!calls[1].is_new_user);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_verify_returns_user_id_as_principal() {
    let h = harness();

    let principal: AuthUser = h.strategy.verify(verify_params("id@example.com")).await.unwrap();

    assert_eq!(h.hook.calls()[0].user.id, principal.user_id);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_find_or_create_failure_propagates_unchanged() {
    let failure = AuthError::DatabaseError("connection reset".to_string());
    let h = harness_with(
        test_config(),
        MockUserRepository::failing(failure.clone()),
        MockPostAuthentication::new(),
    );

    let err = h.strategy.verify(verify_params("a@example.com")).await.unwrap_err();

    assert_eq!(err, failure);
    assert_eq!(h.users.calls(), 1);
    assert!(h.hook.calls().is_empty());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_post_authentication_failure_propagates_unchanged() {
    let failure = AuthError::HookFailed("org provisioning down".to_string());
    let h = harness_with(
        test_config(),
        MockUserRepository::new(),
        MockPostAuthentication::failing(failure.clone()),
    );

    let err = h.strategy.verify(verify_params("a@example.com")).await.unwrap_err();

    assert_eq!(err, failure);
    assert_eq!(h.hook.calls().len(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_email_failure_does_not_store_pending_link() {
    let email = MockEmailProvider::failing(AuthError::EmailError("smtp down".to_string()));
    let strategy = EmailLinkStrategy::new(
        test_config(),
        email,
        MockUserRepository::new(),
        MockPostAuthentication::new(),
    );
    let store = InMemorySessionStore::new();
    let session = SessionHandle::new(&store, SessionId::new());

    let err = strategy.send_link(form("a@example.com"), &session).await.unwrap_err();

    assert_eq!(err, AuthError::EmailError("smtp down".to_string()));
    assert_eq!(session.get("triggerdotdev:magiclink").await.unwrap(), None);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_expired_link_is_rejected() {
    let h = harness_with(
        test_config().with_link_ttl(chrono::Duration::milliseconds(1)),
        MockUserRepository::new(),
        MockPostAuthentication::new(),
    );
    let store = InMemorySessionStore::new();
    let session = SessionHandle::new(&store, SessionId::new());

    h.strategy.send_link(form("late@example.com"), &session).await.unwrap();
    let token = MockEmailProvider::token_from_link(&h.email.last_link().unwrap()).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = h.strategy.callback(&token, &session).await.unwrap_err();
    assert_eq!(err, AuthError::MagicLinkExpired);
    assert_eq!(h.users.calls(), 0);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_tampered_link_is_rejected() {
    let h = harness();
    let store = InMemorySessionStore::new();
    let session = SessionHandle::new(&store, SessionId::new());

    h.strategy.send_link(form("user@example.com"), &session).await.unwrap();
    let token = MockEmailProvider::token_from_link(&h.email.last_link().unwrap()).unwrap();

    let mut chars: Vec<char> = token.chars().collect();
    let middle = chars.len() / 2;
    chars[middle] = if chars[middle] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    let err = h.strategy.callback(&tampered, &session).await.unwrap_err();
    assert_eq!(err, AuthError::MagicLinkInvalid);
    assert_eq!(h.users.calls(), 0);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_link_sealed_with_other_secret_is_rejected() {
    let issuer = harness();
    let store = InMemorySessionStore::new();
    let session = SessionHandle::new(&store, SessionId::new());
    issuer.strategy.send_link(form("user@example.com"), &session).await.unwrap();
    let token = MockEmailProvider::token_from_link(&issuer.email.last_link().unwrap()).unwrap();

    let other = harness_with(
        MagicLinkConfig::new("another-secret", "https://app.example.com").unwrap(),
        MockUserRepository::new(),
        MockPostAuthentication::new(),
    );

    let err = other.strategy.callback(&token, &session).await.unwrap_err();
    assert_eq!(err, AuthError::MagicLinkInvalid);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_session_validation_rejects_link_from_other_session() {
    let h = harness_with(
        test_config().with_session_validation(true),
        MockUserRepository::new(),
        MockPostAuthentication::new(),
    );
    let store = InMemorySessionStore::new();
    let requester = SessionHandle::new(&store, SessionId::new());
    let other = SessionHandle::new(&store, SessionId::new());

    h.strategy.send_link(form("user@example.com"), &requester).await.unwrap();
    let token = MockEmailProvider::token_from_link(&h.email.last_link().unwrap()).unwrap();

    let err = h.strategy.callback(&token, &other).await.unwrap_err();
    assert_eq!(err, AuthError::MagicLinkMismatch);

    tokio_test::assert_ok!(h.strategy.callback(&token, &requester).await);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_session_validation_rejects_superseded_link() {
    let h = harness_with(
        test_config().with_session_validation(true),
        MockUserRepository::new(),
        MockPostAuthentication::new(),
    );
    let store = InMemorySessionStore::new();
    let session = SessionHandle::new(&store, SessionId::new());

    h.strategy.send_link(form("user@example.com"), &session).await.unwrap();
    let first = MockEmailProvider::token_from_link(&h.email.last_link().unwrap()).unwrap();
    h.strategy.send_link(form("user@example.com"), &session).await.unwrap();

    let err = h.strategy.callback(&first, &session).await.unwrap_err();
    assert_eq!(err, AuthError::MagicLinkMismatch);
}

#[tokio::test]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn test_authenticator_round_trip_through_registry() {
    let email = MockEmailProvider::new();
    let hook = MockPostAuthentication::new();
    let mut authenticator = Authenticator::new(InMemorySessionStore::new());
    register_email_link_strategy(
        &mut authenticator,
        test_config(),
        email.clone(),
        MockUserRepository::new(),
        hook.clone(),
    );
    let session_id = SessionId::new();

    let outcome = authenticator
        .authenticate(STRATEGY_NAME, StrategyRequest::Submit { form: form("r@example.com") }, session_id)
        .await
        .unwrap();
    assert!(matches!(outcome, StrategyOutcome::LinkSent(_)));

    let token = MockEmailProvider::token_from_link(&email.last_link().unwrap()).unwrap();
    let outcome = authenticator
        .authenticate(STRATEGY_NAME, StrategyRequest::Callback { token }, session_id)
        .await
        .unwrap();

    let StrategyOutcome::Authenticated(user) = outcome else {
        panic!("expected authenticated outcome");
    };
    assert_eq!(authenticator.current_user(session_id).await.unwrap(), Some(user));
    assert!(hook.calls()[0].is_new_user);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_missing_secret_fails_fast() {
    let err = MagicLinkConfig::from_lookup(|_| None).unwrap_err();
    assert_eq!(err, ConfigError::MissingSecret("MAGIC_LINK_SECRET"));

    let err = MagicLinkConfig::new("", "https://app.example.com").unwrap_err();
    assert_eq!(err, ConfigError::MissingSecret("MAGIC_LINK_SECRET"));
}
