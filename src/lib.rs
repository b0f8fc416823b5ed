//! Billbook is a small web app for keeping track of what you spend.
//!
//! Add an item and its price, and the page lists every bill, shows the total
//! spent and charts the spend per item. Bills live either in memory for the
//! current browser session, in a local SQLite database, or in a hosted
//! `bills` table.
//!
//! This library provides the HTTP routes that directly serve the HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod aggregation;
mod api;
mod app_state;
mod config;
mod endpoints;
mod expense;
mod html;
mod internal_server_error;
mod ledger;
mod logging;
mod not_found;
mod routing;
mod session;
mod store;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use aggregation::{ItemTotal, group_by_item, item_totals_by_spend, total};
pub use app_state::AppState;
pub use config::{AppConfig, ConfigError, StoreKind, env_lookup};
pub use expense::{Expense, ExpenseId, ItemName, NewExpense, Price};
pub use ledger::{Action, Effect, Notice, PageState, Render, Summary, Transition, transition};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use session::{DEFAULT_SESSION_DURATION, SessionId, SessionRegistry, StoreBackend};
pub use store::{ExpenseStore, MemoryStore, RemoteTable};

use crate::{internal_server_error::ServerErrorPage, not_found::get_404_not_found_response};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty (or whitespace only) item name was used to create an expense.
    #[error("item name cannot be empty")]
    EmptyItemName,

    /// A negative, NaN or infinite number was used as the price of an expense.
    #[error("{0} is not a valid price")]
    InvalidPrice(f64),

    /// The price of an expense was left blank or is not a number.
    #[error("'{0}' is not a number")]
    UnparsablePrice(String),

    /// The admin wipe was requested without turning on admin mode.
    #[error("admin mode must be turned on to wipe all bills")]
    AdminModeRequired,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A request to the hosted bills table failed, either because the server
    /// could not be reached or because it responded with an error.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("the remote bill store failed: {0}")]
    RemoteStore(String),

    /// Could not acquire the lock on a store.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        tracing::error!("a request to the remote bill store failed: {}", value);
        Error::RemoteStore(value.to_string())
    }
}

impl Error {
    /// The HTTP status code to respond with when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyItemName | Error::InvalidPrice(_) | Error::UnparsablePrice(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::AdminModeRequired => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::SqlError(_)
            | Error::RemoteStore(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A message that is safe to show to the user.
    ///
    /// Store failures get a generic message; the details are in the server logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::EmptyItemName => "Item name cannot be empty.".to_owned(),
            Error::InvalidPrice(price) => {
                format!("{price} is not a valid price. Enter a number that is zero or more.")
            }
            Error::UnparsablePrice(price) if price.trim().is_empty() => {
                "Enter a price for the item.".to_owned()
            }
            Error::UnparsablePrice(price) => {
                format!("\"{price}\" is not a number. Enter a price such as 4.50.")
            }
            Error::AdminModeRequired => "Turn on admin mode to wipe all bills.".to_owned(),
            Error::NotFound => "The requested resource could not be found.".to_owned(),
            Error::InvalidTimezoneError(timezone) => format!(
                "Could not get local timezone \"{timezone}\". Check your server settings and \
                ensure the timezone has been set to valid, canonical timezone string"
            ),
            Error::SqlError(_) | Error::RemoteStore(_) | Error::DatabaseLockError => {
                "Something went wrong talking to the bill store. Try again later or check the \
                server logs."
                    .to_owned()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(_) => ServerErrorPage::for_error(&self).into_response(),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ServerErrorPage::for_error(&error).into_response()
            }
        }
    }
}
