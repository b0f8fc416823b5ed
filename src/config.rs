//! Turns the command line options and secrets into the state of the web server.
//!
//! The secrets are read through a lookup function so the server can read them
//! from the environment while tests supply their own.

use std::{env, path::PathBuf};

use reqwest::Url;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState,
    session::{DEFAULT_SESSION_DURATION, StoreBackend},
    store::{ExpenseStore, RemoteTable},
    timezone::get_local_offset,
};

/// The secret used to derive the cookie key.
pub const SECRET_VAR: &str = "SECRET";
/// The project URL of the hosted bills table.
pub const BILLS_URL_VAR: &str = "BILLS_URL";
/// The API key of the hosted bills table.
pub const BILLS_KEY_VAR: &str = "BILLS_KEY";

/// Which backend stores the bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StoreKind {
    /// Each browser session keeps its own bills in memory until the session ends.
    #[default]
    Volatile,
    /// All sessions share the bills in a local SQLite database.
    Sqlite,
    /// All sessions share the bills in a hosted table.
    Remote,
}

/// The errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required secret was not set.
    #[error("the environment variable '{0}' must be set")]
    MissingVariable(&'static str),

    /// A required secret was set to an empty string.
    #[error("the environment variable '{0}' must not be empty")]
    EmptyVariable(&'static str),

    /// The URL of the hosted table could not be used.
    #[error("'{value}' is not a valid project URL: {reason}")]
    InvalidUrl {
        /// The value that was given.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The SQLite store was chosen without giving a database path.
    #[error("a database path must be given with --db-path to use the sqlite store")]
    MissingDbPath,

    /// The SQLite database could not be opened or set up.
    #[error("could not open the bills database: {0}")]
    Database(#[from] rusqlite::Error),

    /// The bills table could not be created.
    #[error("could not set up the bills table: {0}")]
    Store(crate::Error),

    /// The local timezone is not a canonical timezone name.
    #[error("invalid timezone '{0}', expected a canonical name such as 'Pacific/Auckland'")]
    InvalidTimezone(String),

    /// The client for the hosted table could not be created.
    #[error("could not create the client for the remote bill store: {0}")]
    RemoteClient(String),

    /// The hosted table could not be read, e.g. it is down or the key is wrong.
    #[error("could not reach the remote bill store: {0}")]
    Unreachable(crate::Error),
}

/// The settings the server was started with.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Which backend stores the bills.
    pub store: StoreKind,
    /// The SQLite database file, required for [StoreKind::Sqlite].
    pub db_path: Option<PathBuf>,
    /// The canonical name of the timezone to show times in.
    pub local_timezone: String,
    /// How long a session may be idle before it ends.
    pub session_duration: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            db_path: None,
            local_timezone: "Etc/UTC".to_owned(),
            session_duration: DEFAULT_SESSION_DURATION,
        }
    }
}

impl AppConfig {
    /// Validate the settings and connect to the store.
    ///
    /// `lookup` returns the value of a secret by name, e.g. [env_lookup].
    ///
    /// # Errors
    /// Returns a [ConfigError] if a secret is missing or malformed, the
    /// timezone is unknown, or the store cannot be set up or reached. The
    /// server should not start in any of these cases.
    pub async fn into_app_state(
        self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<AppState, ConfigError> {
        let secret = required_var(&lookup, SECRET_VAR)?;

        if get_local_offset(&self.local_timezone).is_none() {
            return Err(ConfigError::InvalidTimezone(self.local_timezone));
        }

        let backend = match self.store {
            StoreKind::Volatile => StoreBackend::Volatile,
            StoreKind::Sqlite => {
                let db_path = self.db_path.ok_or(ConfigError::MissingDbPath)?;
                let connection = Connection::open(&db_path)?;
                let store = ExpenseStore::sqlite(connection).map_err(ConfigError::Store)?;
                tracing::info!("storing bills in {}", db_path.display());

                StoreBackend::Shared(store)
            }
            StoreKind::Remote => {
                let url = project_url(&lookup)?;
                let api_key = required_var(&lookup, BILLS_KEY_VAR)?;
                let table = RemoteTable::new(&url, &api_key)
                    .map_err(|error| ConfigError::RemoteClient(error.to_string()))?;
                table
                    .check_connection()
                    .await
                    .map_err(ConfigError::Unreachable)?;
                tracing::info!("storing bills in the remote table at {url}");

                StoreBackend::Shared(ExpenseStore::Remote(table))
            }
        };

        Ok(AppState::new(
            &secret,
            &self.local_timezone,
            backend,
            self.session_duration,
        ))
    }
}

/// Read a secret from the process environment.
pub fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn required_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        None => Err(ConfigError::MissingVariable(name)),
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyVariable(name)),
        Some(value) => Ok(value),
    }
}

fn project_url(lookup: &impl Fn(&str) -> Option<String>) -> Result<Url, ConfigError> {
    let value = required_var(lookup, BILLS_URL_VAR)?;

    let url = Url::parse(value.trim()).map_err(|error| ConfigError::InvalidUrl {
        value: value.clone(),
        reason: error.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            value,
            reason: format!("the scheme must be http or https, got {scheme}"),
        }),
    }
}
