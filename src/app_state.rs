//! Implements a struct that holds the state of the web server.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::session::{SessionRegistry, StoreBackend};

/// The state of the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// How long a session may be idle before it ends.
    pub session_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// Where the bills are stored.
    pub backend: StoreBackend,

    /// The live sessions and, for the volatile backend, their bills.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Create a new [AppState] with no live sessions.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        backend: StoreBackend,
        session_duration: Duration,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            session_duration,
            local_timezone: local_timezone.to_owned(),
            backend,
            sessions: SessionRegistry::new(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
