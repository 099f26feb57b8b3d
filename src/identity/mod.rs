//! Session authentication core: token issuance, validation, refresh rotation.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod tokens;
mod refresh;
mod authenticator;

pub use principal::AuthenticatedPrincipal;
pub use tokens::{AccessClaims, TokenError, TokenSigner};
pub use refresh::RefreshTokenStore;
pub use authenticator::{AuthSession, Registration, SessionAuthenticator, TokenPair};
