//! Session authentication integration tests: registration, login, token
//! validation, and refresh rotation. These exercise positive and negative
//! paths across the full authenticator surface.

use anyhow::Result;
use std::sync::Arc;

use credence::config::AuthConfig;
use credence::identity::{Registration, SessionAuthenticator};
use credence::store::MemoryUserStore;

fn test_config() -> AuthConfig {
    AuthConfig {
        // Cheap Argon2 costs keep the suite fast.
        argon_m_cost_kib: 8,
        argon_t_cost: 1,
        ..AuthConfig::default()
    }
}

fn new_authenticator(config: &AuthConfig) -> Arc<SessionAuthenticator> {
    Arc::new(SessionAuthenticator::from_config(
        Arc::new(MemoryUserStore::new()),
        config,
    ))
}

fn registration(email: &str) -> Registration {
    Registration {
        email: email.to_string(),
        password: "correct-horse-battery".to_string(),
        first_name: Some("Grace".to_string()),
        last_name: Some("Hopper".to_string()),
    }
}

#[tokio::test]
async fn register_login_me_round_trip() -> Result<()> {
    let auth = new_authenticator(&test_config());

    let registered = auth.register(registration("grace@example.com")).await?;
    assert_eq!(registered.user.email, "grace@example.com");

    let logged_in = auth.login("grace@example.com", "correct-horse-battery").await?;
    assert_eq!(logged_in.user.id, registered.user.id);

    let me = auth.current_user(&logged_in.tokens.access_token).await?;
    assert_eq!(me.id, registered.user.id);
    assert_eq!(me.first_name.as_deref(), Some("Grace"));
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let store = Arc::new(MemoryUserStore::new());
    let auth = SessionAuthenticator::from_config(store.clone(), &test_config());
    auth.register(registration("grace@example.com")).await?;

    let err = auth
        .register(registration("GRACE@EXAMPLE.COM"))
        .await
        .expect_err("case-folded duplicate must be rejected");
    assert_eq!(err.code_str(), "email_taken");
    assert_eq!(err.http_status(), 409);
    assert_eq!(store.user_count(), 1, "exactly one record may remain");
    Ok(())
}

#[tokio::test]
async fn login_failures_share_one_shape() -> Result<()> {
    let auth = new_authenticator(&test_config());
    auth.register(registration("grace@example.com")).await?;

    let wrong_pw = auth
        .login("grace@example.com", "wrong")
        .await
        .expect_err("wrong password must fail");
    let no_user = auth
        .login("nobody@example.com", "correct-horse-battery")
        .await
        .expect_err("unknown email must fail");

    assert_eq!(wrong_pw.code_str(), "invalid_credentials");
    assert_eq!(no_user.code_str(), "invalid_credentials");
    assert_eq!(wrong_pw.message(), no_user.message());
    assert_eq!(wrong_pw.http_status(), 401);
    Ok(())
}

#[tokio::test]
async fn expired_access_token_is_rejected() -> Result<()> {
    // Negative TTL mints tokens that are already past their expiry.
    let config = AuthConfig { access_ttl_secs: -5, ..test_config() };
    let auth = new_authenticator(&config);

    let session = auth.register(registration("grace@example.com")).await?;
    let err = auth
        .validate_access_token(&session.tokens.access_token)
        .expect_err("expired token must be rejected");
    assert_eq!(err.code_str(), "unauthenticated");
    assert_eq!(err.http_status(), 401);
    Ok(())
}

#[tokio::test]
async fn tampered_access_token_is_rejected() -> Result<()> {
    let auth = new_authenticator(&test_config());
    let session = auth.register(registration("grace@example.com")).await?;

    let token = session.tokens.access_token;
    let mid = token.len() / 2;
    let flipped = if &token[mid..mid + 1] == "x" { "y" } else { "x" };
    let mut forged = token.clone();
    forged.replace_range(mid..mid + 1, flipped);

    assert!(auth.validate_access_token(&forged).is_err());
    assert!(auth.validate_access_token("").is_err());
    assert!(auth.validate_access_token("not.a.token").is_err());
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_replay_fails() -> Result<()> {
    let auth = new_authenticator(&test_config());
    let session = auth.register(registration("grace@example.com")).await?;
    let original = session.tokens.refresh_token.clone();

    let rotated = auth.refresh(&original).await?;
    assert_ne!(rotated.tokens.refresh_token, original);
    assert_ne!(rotated.tokens.access_token, session.tokens.access_token);

    // The consumed token is retired for good.
    let replay = auth.refresh(&original).await.expect_err("replay must fail");
    assert_eq!(replay.code_str(), "unauthenticated");

    // The rotated token still works.
    auth.refresh(&rotated.tokens.refresh_token).await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_refresh_has_exactly_one_winner() -> Result<()> {
    let auth = new_authenticator(&test_config());
    let session = auth.register(registration("grace@example.com")).await?;
    let token = session.tokens.refresh_token.clone();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let auth = Arc::clone(&auth);
        let token = token.clone();
        tasks.push(tokio::spawn(async move { auth.refresh(&token).await.is_ok() }));
    }
    let outcomes = futures::future::join_all(tasks).await;
    let wins = outcomes.into_iter().filter(|r| matches!(r, Ok(true))).count();
    assert_eq!(wins, 1, "exactly one concurrent refresh may succeed");
    Ok(())
}

#[tokio::test]
async fn logout_retires_the_refresh_token() -> Result<()> {
    let auth = new_authenticator(&test_config());
    let session = auth.register(registration("grace@example.com")).await?;

    assert!(auth.logout(&session.tokens.refresh_token));
    // Second logout is a no-op.
    assert!(!auth.logout(&session.tokens.refresh_token));

    let err = auth
        .refresh(&session.tokens.refresh_token)
        .await
        .expect_err("logged-out token must not refresh");
    assert_eq!(err.code_str(), "unauthenticated");

    // Access tokens are stateless and stay valid until expiry.
    assert!(auth.validate_access_token(&session.tokens.access_token).is_ok());
    Ok(())
}

#[tokio::test]
async fn revoke_all_sessions_clears_every_refresh_token() -> Result<()> {
    let auth = new_authenticator(&test_config());
    let first = auth.register(registration("grace@example.com")).await?;
    let second = auth.login("grace@example.com", "correct-horse-battery").await?;

    let revoked = auth.revoke_all_sessions(first.user.id);
    assert_eq!(revoked, 2);

    assert!(auth.refresh(&first.tokens.refresh_token).await.is_err());
    assert!(auth.refresh(&second.tokens.refresh_token).await.is_err());
    Ok(())
}
