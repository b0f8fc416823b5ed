//! Browser sessions and the expense store each request should use.
//!
//! Every browser gets a random session ID in a private (encrypted and signed)
//! cookie. With the volatile backend, each session owns its own in-memory
//! store: the store is created when the session starts and dropped when the
//! session ends, either because it was idle for longer than the session
//! duration or because the user ended it. Durable backends share one store
//! between all sessions.

use std::{
    collections::HashMap,
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    Extension,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use axum_htmx::HxRedirect;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    AppState, Error, endpoints,
    internal_server_error::ServerErrorPage,
    store::{ExpenseStore, MemoryStore},
};

pub(crate) const COOKIE_SESSION_ID: &str = "session_id";
/// How long a session may sit idle before it ends and its volatile bills are dropped.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::minutes(30);

/// Identifies a browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Where the expenses for a session come from.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Every session gets its own in-memory store.
    Volatile,
    /// Every session uses the same durable store.
    Shared(ExpenseStore),
}

#[derive(Debug)]
struct Session {
    store: Arc<Mutex<MemoryStore>>,
    last_seen: OffsetDateTime,
}

/// The volatile stores of the live sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl SessionRegistry {
    /// Create a registry with no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, Session>>, Error> {
        self.sessions
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire session lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }

    /// Get the store of the session `session_id`, starting the session with an
    /// empty store if it is not live.
    ///
    /// Sessions that have been idle for longer than `idle_timeout` are ended
    /// first, so an expired session starts again empty.
    ///
    /// # Errors
    /// Returns an [Error::DatabaseLockError] if the registry lock is poisoned.
    pub fn resume_or_start(
        &self,
        session_id: SessionId,
        idle_timeout: Duration,
    ) -> Result<Arc<Mutex<MemoryStore>>, Error> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.lock()?;

        let session_count = sessions.len();
        sessions.retain(|_, session| now - session.last_seen <= idle_timeout);
        let expired_count = session_count - sessions.len();
        if expired_count > 0 {
            tracing::debug!("ended {expired_count} idle sessions");
        }

        let session = sessions.entry(session_id).or_insert_with(|| {
            tracing::info!("starting session {session_id}");
            Session {
                store: Arc::new(Mutex::new(MemoryStore::new())),
                last_seen: now,
            }
        });
        session.last_seen = now;

        Ok(session.store.clone())
    }

    /// End the session `session_id`, dropping its store.
    ///
    /// Returns whether the session was live.
    ///
    /// # Errors
    /// Returns an [Error::DatabaseLockError] if the registry lock is poisoned.
    pub fn end(&self, session_id: SessionId) -> Result<bool, Error> {
        let ended = self.lock()?.remove(&session_id).is_some();
        if ended {
            tracing::info!("ended session {session_id}");
        }

        Ok(ended)
    }

    /// The number of live sessions.
    ///
    /// # Errors
    /// Returns an [Error::DatabaseLockError] if the registry lock is poisoned.
    pub fn live_count(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }
}

/// The state needed for the session middleware.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session may be idle before it ends.
    pub session_duration: Duration,
    /// Where to get each session's store from.
    pub backend: StoreBackend,
    /// The live sessions.
    pub sessions: SessionRegistry,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            session_duration: state.session_duration,
            backend: state.backend.clone(),
            sessions: state.sessions.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SessionState> for Key {
    fn from_ref(state: &SessionState) -> Self {
        state.cookie_key.clone()
    }
}

/// Add the session cookie to `jar`, expiring `duration` from now.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    session_id: SessionId,
    duration: Duration,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION_ID, session_id.to_string()))
            .expires(OffsetDateTime::now_utc() + duration)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION_ID, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

fn get_session_id(jar: &PrivateCookieJar) -> Option<SessionId> {
    jar.get(COOKIE_SESSION_ID)
        .and_then(|cookie| cookie.value_trimmed().parse().ok())
}

fn sets_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| {
            value
                .to_str()
                .is_ok_and(|value| value.starts_with(&format!("{COOKIE_SESSION_ID}=")))
        })
}

/// Middleware function that resolves the expense store for the request's session.
///
/// A session is started if the request has no valid session cookie. The
/// session cookie is refreshed on every response, unless the handler already
/// set it (e.g. when ending the session).
///
/// **Note**: Route handlers can use the function arguments
/// `Extension(store): Extension<ExpenseStore>` and
/// `Extension(session_id): Extension<SessionId>`.
pub async fn session_guard(
    State(state): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}.");
            return ServerErrorPage::default().into_response();
        }
    };

    let session_id = get_session_id(&jar).unwrap_or_default();
    let store = match &state.backend {
        StoreBackend::Volatile => {
            match state
                .sessions
                .resume_or_start(session_id, state.session_duration)
            {
                Ok(store) => ExpenseStore::Volatile(store),
                Err(error) => return error.into_response(),
            }
        }
        StoreBackend::Shared(store) => store.clone(),
    };

    parts.extensions.insert(store);
    parts.extensions.insert(session_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    if sets_session_cookie(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let jar = set_session_cookie(jar, session_id, state.session_duration);
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// A route handler that ends the current session and sends the client back to
/// the bills page, where a fresh session starts.
pub async fn end_session_endpoint(
    State(state): State<SessionState>,
    Extension(session_id): Extension<SessionId>,
    jar: PrivateCookieJar,
) -> Response {
    if let Err(error) = state.sessions.end(session_id) {
        return error.into_response();
    }

    (
        invalidate_session_cookie(jar),
        HxRedirect(endpoints::BILLS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
