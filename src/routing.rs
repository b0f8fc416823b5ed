//! Application router configuration.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    api::get_bills_summary,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    ledger::{clear_bills_endpoint, create_bill_endpoint, get_ledger_page, wipe_bills_endpoint},
    not_found::get_404_not_found,
    session::{end_session_endpoint, session_guard},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route(endpoints::BILLS_VIEW, get(get_ledger_page))
        .route(
            endpoints::BILLS_API,
            get(get_bills_summary).post(create_bill_endpoint),
        )
        .route(endpoints::CLEAR_BILLS, post(clear_bills_endpoint))
        .route(endpoints::WIPE_BILLS, post(wipe_bills_endpoint))
        .route(endpoints::END_SESSION, post(end_session_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_guard));

    let other_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    session_routes
        .merge(other_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the bills page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::BILLS_VIEW)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use serde_json::Value;

    use crate::{
        AppState, endpoints,
        session::{COOKIE_SESSION_ID, DEFAULT_SESSION_DURATION, StoreBackend},
        store::ExpenseStore,
        test_utils::assert_valid_html,
    };

    use super::build_router;

    fn get_test_server(backend: StoreBackend) -> TestServer {
        let state = AppState::new("42", "Etc/UTC", backend, DEFAULT_SESSION_DURATION);
        let app = build_router(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn get_sqlite_backend() -> StoreBackend {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");

        StoreBackend::Shared(ExpenseStore::sqlite(connection).expect("Could not create store"))
    }

    fn count_rows(html: &Html) -> usize {
        html.select(&Selector::parse("#bills tbody tr").unwrap())
            .count()
    }

    #[tokio::test]
    async fn root_redirects_to_bills() {
        let server = get_test_server(StoreBackend::Volatile);

        let response = server.get(endpoints::ROOT).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), endpoints::BILLS_VIEW);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server(StoreBackend::Volatile);

        let response = server.get("/this/does/not/exist").await;

        response.assert_status_not_found();
        assert_valid_html(&Html::parse_document(&response.text()));
    }

    #[tokio::test]
    async fn error_page_is_internal_server_error() {
        let server = get_test_server(StoreBackend::Volatile);

        server
            .get(endpoints::INTERNAL_ERROR_VIEW)
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn volatile_session_keeps_its_bills() {
        let server = get_test_server(StoreBackend::Volatile);
        let cookie = server
            .get(endpoints::BILLS_VIEW)
            .await
            .cookie(COOKIE_SESSION_ID);

        for (item, price) in [("Coffee", "5"), ("Coffee", "3"), ("Tea", "2")] {
            server
                .post(endpoints::BILLS_API)
                .add_cookie(cookie.clone())
                .form(&[("item", item), ("price", price)])
                .await
                .assert_status_ok();
        }

        let response = server
            .get(endpoints::BILLS_API)
            .add_cookie(cookie.clone())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total"], 10.0);
        assert_eq!(body["records"].as_array().map(Vec::len), Some(3));

        let response = server.get(endpoints::BILLS_VIEW).add_cookie(cookie).await;
        let html = Html::parse_document(&response.text());
        assert_eq!(count_rows(&html), 3);
    }

    #[tokio::test]
    async fn volatile_sessions_do_not_share_bills() {
        let server = get_test_server(StoreBackend::Volatile);
        let first = server
            .get(endpoints::BILLS_VIEW)
            .await
            .cookie(COOKIE_SESSION_ID);
        let second = server
            .get(endpoints::BILLS_VIEW)
            .await
            .cookie(COOKIE_SESSION_ID);

        server
            .post(endpoints::BILLS_API)
            .add_cookie(first)
            .form(&[("item", "Coffee"), ("price", "5")])
            .await
            .assert_status_ok();

        let body: Value = server
            .get(endpoints::BILLS_API)
            .add_cookie(second)
            .await
            .json();
        assert_eq!(body["total"], 0.0);
    }

    #[tokio::test]
    async fn sqlite_bills_are_shared_between_sessions() {
        let server = get_test_server(get_sqlite_backend());

        server
            .post(endpoints::BILLS_API)
            .form(&[("item", "Coffee"), ("price", "5")])
            .await
            .assert_status_ok();

        // A request without a cookie starts a new session.
        let body: Value = server.get(endpoints::BILLS_API).await.json();
        assert_eq!(body["total"], 5.0);
        assert_eq!(body["records"][0]["item"], "Coffee");
    }

    #[tokio::test]
    async fn empty_item_name_does_not_change_bills() {
        let server = get_test_server(get_sqlite_backend());

        server
            .post(endpoints::BILLS_API)
            .form(&[("item", ""), ("price", "5")])
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let body: Value = server.get(endpoints::BILLS_API).await.json();
        assert_eq!(body["records"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn clear_then_list_is_empty() {
        let server = get_test_server(get_sqlite_backend());
        for (item, price) in [("Coffee", "5"), ("Coffee", "3"), ("Tea", "2")] {
            server
                .post(endpoints::BILLS_API)
                .form(&[("item", item), ("price", price)])
                .await
                .assert_status_ok();
        }

        server
            .post(endpoints::CLEAR_BILLS)
            .await
            .assert_status_ok();

        let body: Value = server.get(endpoints::BILLS_API).await.json();
        assert_eq!(body["records"], Value::Array(Vec::new()));
        assert_eq!(body["total"], 0.0);
    }

    #[tokio::test]
    async fn wipe_is_gated_by_admin_mode() {
        let server = get_test_server(get_sqlite_backend());
        server
            .post(endpoints::BILLS_API)
            .form(&[("item", "Coffee"), ("price", "5")])
            .await
            .assert_status_ok();

        server
            .post(endpoints::WIPE_BILLS)
            .form(&[("note", "admin mode off")])
            .await
            .assert_status(StatusCode::FORBIDDEN);
        let body: Value = server.get(endpoints::BILLS_API).await.json();
        assert_eq!(body["total"], 5.0);

        server
            .post(endpoints::WIPE_BILLS)
            .form(&[("admin_mode", "on")])
            .await
            .assert_status_ok();
        let body: Value = server.get(endpoints::BILLS_API).await.json();
        assert_eq!(body["total"], 0.0);
    }

    #[tokio::test]
    async fn ending_session_forgets_volatile_bills() {
        let server = get_test_server(StoreBackend::Volatile);
        let cookie = server
            .get(endpoints::BILLS_VIEW)
            .await
            .cookie(COOKIE_SESSION_ID);
        server
            .post(endpoints::BILLS_API)
            .add_cookie(cookie.clone())
            .form(&[("item", "Coffee"), ("price", "5")])
            .await
            .assert_status_ok();

        server
            .post(endpoints::END_SESSION)
            .add_cookie(cookie.clone())
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let body: Value = server
            .get(endpoints::BILLS_API)
            .add_cookie(cookie)
            .await
            .json();
        assert_eq!(body["total"], 0.0);
    }
}
