//! Credential hygiene: password policy, email shape checks, and Argon2
//! hashing/verification over PHC strings. Plaintext passwords only ever live
//! on the stack of these functions and their callers.

use anyhow::{Result, anyhow};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{SaltString, PasswordHash};

/// Tunable Argon2 cost parameters. Defaults match the argon2 crate's own.
#[derive(Debug, Clone, Copy)]
pub struct HashParams {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for HashParams {
    fn default() -> Self { Self { m_cost_kib: 19 * 1024, t_cost: 2, p_cost: 1 } }
}

/// Minimum-strength policy applied at registration.
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_len: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self { Self { min_len: 8 } }
}

impl PasswordPolicy {
    pub fn accepts(&self, password: &str) -> bool {
        password.chars().count() >= self.min_len
    }
}

/// Cheap structural check, not RFC validation: one '@' with non-empty
/// local part and a dotted domain.
pub fn email_is_well_formed(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else { return false; };
    if local.is_empty() || domain.is_empty() { return false; }
    if email.chars().any(|c| c.is_whitespace()) { return false; }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn argon2_for(params: &HashParams) -> Result<Argon2<'static>> {
    let p = argon2::Params::new(params.m_cost_kib, params.t_cost, params.p_cost, None)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, p))
}

pub fn hash_password(password: &str, params: &HashParams) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = argon2_for(params)?;
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        // Cost parameters come from the PHC string itself, so older hashes
        // keep verifying after a config change.
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> HashParams {
        HashParams { m_cost_kib: 8, t_cost: 1, p_cost: 1 }
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let phc = hash_password("s3cr3t-pw", &cheap()).unwrap();
        assert!(phc.starts_with("$argon2id$"));
        assert!(verify_password(&phc, "s3cr3t-pw"));
        assert!(!verify_password(&phc, "wrong-pw"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password", &cheap()).unwrap();
        let b = hash_password("same-password", &cheap()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "anything"));
        assert!(!verify_password("", "anything"));
    }

    #[test]
    fn policy_minimum_length() {
        let policy = PasswordPolicy::default();
        assert!(!policy.accepts("short7!"));
        assert!(policy.accepts("exactly8"));
        let strict = PasswordPolicy { min_len: 12 };
        assert!(!strict.accepts("only11chars"));
    }

    #[test]
    fn email_shape() {
        assert!(email_is_well_formed("user@example.com"));
        assert!(email_is_well_formed("first.last@sub.example.org"));
        assert!(!email_is_well_formed("no-at-sign"));
        assert!(!email_is_well_formed("@example.com"));
        assert!(!email_is_well_formed("user@"));
        assert!(!email_is_well_formed("user@nodot"));
        assert!(!email_is_well_formed("user name@example.com"));
        assert!(!email_is_well_formed("user@.example.com"));
    }
}
