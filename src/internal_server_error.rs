//! The page shown when a request fails on the server's side.

use std::borrow::Cow;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{Error, html::error_view};

/// A 500 page saying what went wrong and what the user can do about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerErrorPage {
    summary: Cow<'static, str>,
    advice: Cow<'static, str>,
}

impl Default for ServerErrorPage {
    fn default() -> Self {
        Self {
            summary: Cow::Borrowed("Sorry, something went wrong."),
            advice: Cow::Borrowed("Try again later or check the server logs."),
        }
    }
}

impl ServerErrorPage {
    /// The page for `error`.
    ///
    /// Only [Error::user_message] reaches the page, so store details stay in
    /// the server logs.
    pub fn for_error(error: &Error) -> Self {
        let summary = match error {
            Error::InvalidTimezoneError(_) => "Invalid timezone settings.",
            Error::SqlError(_) | Error::RemoteStore(_) | Error::DatabaseLockError => {
                "The bill store is not available."
            }
            _ => return Self::default(),
        };

        Self {
            summary: Cow::Borrowed(summary),
            advice: Cow::Owned(error.user_message()),
        }
    }
}

impl IntoResponse for ServerErrorPage {
    fn into_response(self) -> Response {
        let page = error_view("Internal Server Error", "500", &self.summary, &self.advice);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}

/// A route handler that always shows the generic error page.
pub async fn get_internal_server_error_page() -> ServerErrorPage {
    ServerErrorPage::default()
}
