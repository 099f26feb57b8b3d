//! Credential persistence boundary. The authenticator only ever talks to the
//! [`UserStore`] trait, so the backing implementation can be swapped without
//! touching session logic.

pub mod memory;

pub use memory::MemoryUserStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A stored account. `password_hash` is a PHC string, never plaintext.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create an account. The caller hashes the password
/// before constructing this.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness violation on the email column.
    #[error("email already registered")]
    Conflict,
    /// The backing store could not be reached or failed mid-operation.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Async credential store. Emails are matched case-insensitively; the stored
/// casing is preserved for display.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with [`StoreError::Conflict`] when the
    /// email is already taken under case-insensitive comparison.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
}
