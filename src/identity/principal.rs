use serde::Serialize;
use uuid::Uuid;

use crate::store::User;

use super::tokens::AccessClaims;

/// The caller identity established by a verified access token. This is what
/// `/auth/me` renders; it never carries credential material.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPrincipal {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl AuthenticatedPrincipal {
    /// A token proves identity but carries only `sub` and `email`; the name
    /// fields come from the store when the caller record is loaded.
    pub fn from_claims(claims: &AccessClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
            first_name: None,
            last_name: None,
        }
    }
}

impl From<&User> for AuthenticatedPrincipal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}
