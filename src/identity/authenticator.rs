//! The session authenticator: registration, login, token validation, and
//! refresh rotation. All policy decisions live here so the HTTP layer stays a
//! thin translation of requests and errors.

use std::sync::Arc;
use anyhow::Result;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::security::{self, HashParams, PasswordPolicy};
use crate::store::{NewUser, StoreError, User, UserStore};

use super::principal::AuthenticatedPrincipal;
use super::refresh::RefreshTokenStore;
use super::tokens::TokenSigner;

/// Registration input. `password` is consumed by value so the plaintext does
/// not outlive the call.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// What a successful register/login/refresh hands back: the caller's profile
/// plus a fresh token pair.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthenticatedPrincipal,
    pub tokens: TokenPair,
}

pub struct SessionAuthenticator {
    store: Arc<dyn UserStore>,
    signer: TokenSigner,
    refresh_tokens: RefreshTokenStore,
    policy: PasswordPolicy,
    hash_params: HashParams,
}

fn map_store_err(err: StoreError) -> AppError {
    match err {
        StoreError::Conflict => AppError::conflict("email_taken", "email already registered"),
        StoreError::Unavailable(_) => {
            warn!("credential store unavailable: {}", err);
            AppError::store("store_unavailable", "credential store unavailable")
        }
    }
}

impl SessionAuthenticator {
    pub fn from_config(store: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            signer: TokenSigner::new(&config.token_secret, config.access_ttl_secs),
            refresh_tokens: RefreshTokenStore::new(config.refresh_ttl_secs),
            policy: PasswordPolicy { min_len: config.min_password_len },
            hash_params: HashParams {
                m_cost_kib: config.argon_m_cost_kib,
                t_cost: config.argon_t_cost,
                ..HashParams::default()
            },
        }
    }

    /// Validate, hash, store, and log the new account in. Hashing runs on the
    /// blocking pool so it never stalls the async dispatch path.
    pub async fn register(&self, reg: Registration) -> AppResult<AuthSession> {
        if !security::email_is_well_formed(&reg.email) {
            return Err(AppError::user("invalid_email", "email is not well-formed"));
        }
        if !self.policy.accepts(&reg.password) {
            return Err(AppError::user(
                "weak_password",
                "password does not meet the minimum length",
            ));
        }
        let params = self.hash_params;
        let password = reg.password;
        let password_hash = tokio::task::spawn_blocking(move || {
            security::hash_password(&password, &params)
        })
        .await
        .map_err(anyhow::Error::from)??;

        let user = self
            .store
            .create_user(NewUser {
                email: reg.email,
                password_hash,
                first_name: reg.first_name,
                last_name: reg.last_name,
            })
            .await
            .map_err(map_store_err)?;
        info!(user_id = %user.id, "account registered");
        self.issue(&user).map_err(AppError::from)
    }

    /// Verify credentials and mint a session. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let invalid = || AppError::auth("invalid_credentials", "invalid email or password");
        let user = self
            .store
            .find_by_email(email)
            .await
            .map_err(map_store_err)?
            .ok_or_else(invalid)?;

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let ok = tokio::task::spawn_blocking(move || security::verify_password(&hash, &password))
            .await
            .map_err(|e| AppError::from(anyhow::Error::from(e)))?;
        if !ok {
            return Err(invalid());
        }
        info!(user_id = %user.id, "login succeeded");
        self.issue(&user).map_err(AppError::from)
    }

    /// Mint a fresh access/refresh pair for an authenticated account.
    pub fn issue(&self, user: &User) -> Result<AuthSession> {
        let access_token = self.signer.sign(user.id, &user.email)?;
        let refresh_token = self.refresh_tokens.issue(user.id);
        Ok(AuthSession {
            user: AuthenticatedPrincipal::from(user),
            tokens: TokenPair { access_token, refresh_token },
        })
    }

    /// Check an access token's signature and expiry. Expired and malformed
    /// tokens collapse to the same error at this boundary.
    pub fn validate_access_token(&self, token: &str) -> AppResult<AuthenticatedPrincipal> {
        let claims = self
            .signer
            .verify(token)
            .map_err(|_| AppError::auth("unauthenticated", "invalid or expired token"))?;
        Ok(AuthenticatedPrincipal::from_claims(&claims))
    }

    /// Like [`validate_access_token`] but re-reads the account record so the
    /// caller gets current profile fields, not the snapshot baked into the
    /// token.
    ///
    /// [`validate_access_token`]: Self::validate_access_token
    pub async fn current_user(&self, token: &str) -> AppResult<AuthenticatedPrincipal> {
        let principal = self.validate_access_token(token)?;
        match self.store.find_by_id(principal.id).await.map_err(map_store_err)? {
            Some(user) => Ok(AuthenticatedPrincipal::from(&user)),
            // Token outlives the account record until exp; fall back to claims.
            None => Ok(principal),
        }
    }

    /// Rotate a refresh token: consume it, then mint a new pair. The consume
    /// is atomic, so under concurrent use exactly one caller wins and the
    /// rest see an auth failure.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthSession> {
        let user_id = self
            .refresh_tokens
            .consume(refresh_token)
            .ok_or_else(|| AppError::auth("unauthenticated", "invalid or expired refresh token"))?;
        let user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(map_store_err)?
            .ok_or_else(|| AppError::auth("unauthenticated", "account no longer exists"))?;
        info!(user_id = %user.id, "refresh token rotated");
        self.issue(&user).map_err(AppError::from)
    }

    /// Retire a refresh token without minting a replacement.
    pub fn logout(&self, refresh_token: &str) -> bool {
        self.refresh_tokens.revoke(refresh_token)
    }

    /// Drop every outstanding refresh token for one account.
    pub fn revoke_all_sessions(&self, user_id: uuid::Uuid) -> usize {
        self.refresh_tokens.revoke_all_for_user(user_id)
    }
}
