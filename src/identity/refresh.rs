//! Server-side refresh token ledger. Tokens are opaque 256-bit random values;
//! each is single-use and a successful consume retires it permanently, so a
//! replayed token fails even while its session lineage lives on.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use parking_lot::RwLock;
use base64::Engine;
use uuid::Uuid;
use crate::tprintln;

#[derive(Debug)]
struct RefreshEntry {
    user_id: Uuid,
    expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    active: HashMap<String, RefreshEntry>,
    user_index: HashMap<Uuid, HashSet<String>>,
    /// Tokens that were ever consumed or revoked. Kept so a replay is
    /// distinguishable from a random guess and still fails closed.
    retired: HashSet<String>,
}

fn gen_token() -> String {
    // 256-bit random token, base64url without padding
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

pub struct RefreshTokenStore {
    ttl: Duration,
    inner: RwLock<Inner>,
}

impl RefreshTokenStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs.max(0) as u64),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> String {
        let token = gen_token();
        let entry = RefreshEntry {
            user_id,
            expires_at: Instant::now() + self.ttl,
        };
        let mut inner = self.inner.write();
        inner.user_index.entry(user_id).or_default().insert(token.clone());
        inner.active.insert(token.clone(), entry);
        tprintln!("refresh.issue user={} ttl_secs={}", user_id, self.ttl.as_secs());
        token
    }

    /// Atomically take the token out of the active set. Exactly one caller
    /// observes `Some`; concurrent losers and later replays get `None`.
    pub fn consume(&self, token: &str) -> Option<Uuid> {
        let mut inner = self.inner.write();
        let entry = inner.active.remove(token)?;
        inner.retired.insert(token.to_string());
        if let Some(set) = inner.user_index.get_mut(&entry.user_id) {
            set.remove(token);
        }
        if entry.expires_at <= Instant::now() {
            tprintln!("refresh.consume user={} expired", entry.user_id);
            return None;
        }
        Some(entry.user_id)
    }

    pub fn revoke(&self, token: &str) -> bool {
        let mut inner = self.inner.write();
        inner.retired.insert(token.to_string());
        if let Some(entry) = inner.active.remove(token) {
            if let Some(set) = inner.user_index.get_mut(&entry.user_id) {
                set.remove(token);
            }
            true
        } else {
            false
        }
    }

    pub fn revoke_all_for_user(&self, user_id: Uuid) -> usize {
        let mut inner = self.inner.write();
        let tokens = match inner.user_index.remove(&user_id) {
            Some(t) => t,
            None => return 0,
        };
        let mut count = 0usize;
        for t in tokens {
            if inner.active.remove(&t).is_some() {
                count += 1;
            }
            inner.retired.insert(t);
        }
        tprintln!("refresh.revoke_all user={} count={}", user_id, count);
        count
    }

    pub fn active_count(&self) -> usize {
        self.inner.read().active.len()
    }
}
