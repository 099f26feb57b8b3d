//! Process configuration read from environment variables at startup.
//! Every knob has a default so the server boots with no environment at all.

use base64::Engine;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub http_port: u16,
    /// HMAC key for access-token signatures.
    pub token_secret: Vec<u8>,
    /// Access-token lifetime in seconds (short window, minutes).
    pub access_ttl_secs: i64,
    /// Refresh-token lifetime in seconds (long window, days).
    pub refresh_ttl_secs: i64,
    pub min_password_len: usize,
    /// Argon2 memory cost in KiB.
    pub argon_m_cost_kib: u32,
    /// Argon2 iteration count.
    pub argon_t_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            http_port: 7878,
            token_secret: random_secret(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 24 * 3600,
            min_password_len: 8,
            argon_m_cost_kib: 19 * 1024,
            argon_t_cost: 2,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

fn random_secret() -> Vec<u8> {
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    buf.to_vec()
}

impl AuthConfig {
    /// Build from `CREDENCE_*` environment variables, falling back to defaults.
    ///
    /// When `CREDENCE_TOKEN_SECRET` is unset an ephemeral random secret is
    /// generated; tokens signed with it do not survive a restart.
    pub fn from_env() -> Self {
        let defaults = AuthConfig::default();
        let token_secret = match std::env::var("CREDENCE_TOKEN_SECRET") {
            Ok(s) if !s.trim().is_empty() => decode_secret(s.trim()),
            _ => {
                warn!("CREDENCE_TOKEN_SECRET not set; using an ephemeral secret, issued tokens will not survive restart");
                defaults.token_secret.clone()
            }
        };
        Self {
            http_port: env_parse("CREDENCE_HTTP_PORT", defaults.http_port),
            token_secret,
            access_ttl_secs: env_parse("CREDENCE_ACCESS_TTL_SECS", defaults.access_ttl_secs),
            refresh_ttl_secs: env_parse("CREDENCE_REFRESH_TTL_SECS", defaults.refresh_ttl_secs),
            min_password_len: env_parse("CREDENCE_MIN_PASSWORD_LEN", defaults.min_password_len),
            argon_m_cost_kib: env_parse("CREDENCE_ARGON_M_COST_KIB", defaults.argon_m_cost_kib),
            argon_t_cost: env_parse("CREDENCE_ARGON_T_COST", defaults.argon_t_cost),
        }
    }
}

/// Accept either base64url key material or a raw passphrase.
fn decode_secret(raw: &str) -> Vec<u8> {
    if let Ok(bytes) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(raw) {
        if bytes.len() >= 16 { return bytes; }
    }
    raw.as_bytes().to_vec()
}
