use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use sha2::{Digest, Sha256};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use zeroize::Zeroizing;

use crate::models::credential::Credential;

/// Cookie holding the bearer token.
pub const TOKEN_COOKIE: &str = "jwt";
/// Cookie holding the selected syllabus id.
pub const CATEGORY_ID_COOKIE: &str = "category_id";
/// Cookie holding the selected syllabus name.
pub const CATEGORY_NAME_COOKIE: &str = "category_name";

/// Storage for the user's credential.
///
/// Last write wins. `clear` bumps a monotonically increasing epoch so that
/// an access check started before the clear can tell it raced with one.
pub trait CredentialStore: Send + Sync {
    /// Snapshot of the stored credential.
    fn get(&self) -> Credential;

    /// Stores the bearer token issued by the auth flow.
    fn set_token(&self, token: &str);

    /// Stores the syllabus selection.
    fn set_category(&self, id: &str, name: &str);

    /// Removes token and category together.
    fn clear(&self);

    /// Number of `clear` calls so far.
    fn clear_epoch(&self) -> u64;
}

/// In-process store for embedders and tests.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    credential: Credential,
    epoch: u64,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryInner { credential, epoch: 0 })),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Credential {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.credential.clone()
    }

    fn set_token(&self, token: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.credential.token = Some(Zeroizing::new(token.to_string()));
    }

    fn set_category(&self, id: &str, name: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.credential.category_id = Some(id.to_string());
        inner.credential.category_name = Some(name.to_string());
    }

    fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.credential = Credential::default();
        inner.epoch += 1;
        tracing::info!("🧹 Credentials cleared (epoch {})", inner.epoch);
    }

    fn clear_epoch(&self) -> u64 {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).epoch
    }
}

/// Attributes applied to every credential cookie.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub max_age_days: i64,
    pub secure: bool,
}

/// SHA-256 of a bearer token. Tokens themselves are never kept in shared
/// state.
pub type TokenDigest = [u8; 32];

pub fn token_digest(token: &str) -> TokenDigest {
    Sha256::digest(token.as_bytes()).into()
}

/// Clear epochs shared by every request, keyed by token digest.
///
/// A logout in one request must be visible to an access check running in
/// another request for the same token.
#[derive(Clone, Default)]
pub struct ClearLedger {
    epochs: Arc<RwLock<HashMap<TokenDigest, (u64, Instant)>>>,
}

impl ClearLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self, key: &TokenDigest) -> u64 {
        self.epochs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, |&(epoch, _)| epoch)
    }

    fn bump(&self, key: TokenDigest) -> u64 {
        let mut epochs = self.epochs.write().unwrap_or_else(PoisonError::into_inner);
        let entry = epochs.entry(key).or_insert((0, Instant::now()));
        entry.0 += 1;
        entry.1 = Instant::now();
        entry.0
    }

    /// Forgets clears older than `max_age`. Must exceed the longest
    /// possible access check.
    pub fn prune(&self, max_age: std::time::Duration) -> usize {
        let mut epochs = self.epochs.write().unwrap_or_else(PoisonError::into_inner);
        let before = epochs.len();
        epochs.retain(|_, (_, cleared_at)| cleared_at.elapsed() < max_age);
        before - epochs.len()
    }

    pub fn len(&self) -> usize {
        self.epochs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Credential store backed by the request's cookie jar.
///
/// The clear epoch combines this request's own clears with the shared
/// ledger entry of the token the request arrived with.
#[derive(Clone)]
pub struct CookieCredentialStore {
    cookies: Cookies,
    policy: CookiePolicy,
    ledger: ClearLedger,
    owner: Option<TokenDigest>,
    local_epoch: Arc<AtomicU64>,
}

impl CookieCredentialStore {
    pub fn new(cookies: Cookies, policy: CookiePolicy, ledger: ClearLedger) -> Self {
        let owner = cookies
            .get(TOKEN_COOKIE)
            .filter(|c| !c.value().is_empty())
            .map(|c| token_digest(c.value()));

        Self {
            cookies,
            policy,
            ledger,
            owner,
            local_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Digest of the token this request arrived with.
    pub fn owner(&self) -> Option<TokenDigest> {
        self.owner
    }

    fn read(&self, name: &str) -> Option<String> {
        self.cookies
            .get(name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn write(&self, name: &'static str, value: String) {
        self.cookies.add(credential_cookie(name, value, self.policy));
    }

    fn remove(&self, name: &'static str) {
        let mut cookie = Cookie::new(name, "");
        cookie.set_max_age(Duration::seconds(0));
        cookie.set_path("/");
        self.cookies.remove(cookie);
    }
}

impl CredentialStore for CookieCredentialStore {
    fn get(&self) -> Credential {
        Credential {
            token: self.read(TOKEN_COOKIE).map(Zeroizing::new),
            category_id: self.read(CATEGORY_ID_COOKIE),
            category_name: self.read(CATEGORY_NAME_COOKIE),
        }
    }

    fn set_token(&self, token: &str) {
        self.write(TOKEN_COOKIE, token.to_string());
    }

    fn set_category(&self, id: &str, name: &str) {
        self.write(CATEGORY_ID_COOKIE, id.to_string());
        self.write(CATEGORY_NAME_COOKIE, name.to_string());
    }

    fn clear(&self) {
        self.local_epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(owner) = self.owner {
            let epoch = self.ledger.bump(owner);
            tracing::debug!("🧹 Shared clear epoch now {}", epoch);
        }
        self.remove(TOKEN_COOKIE);
        self.remove(CATEGORY_ID_COOKIE);
        self.remove(CATEGORY_NAME_COOKIE);
        tracing::info!("🧹 Credential cookies cleared");
    }

    fn clear_epoch(&self) -> u64 {
        let shared = self.owner.map_or(0, |owner| self.ledger.epoch(&owner));
        self.local_epoch.load(Ordering::SeqCst) + shared
    }
}

/// Creates a credential cookie with the given name, value, and policy.
fn credential_cookie(name: &'static str, value: String, policy: CookiePolicy) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);

    cookie.set_http_only(true);
    if policy.secure {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(policy.max_age_days * 86400));
    cookie.set_path("/");

    cookie
}
