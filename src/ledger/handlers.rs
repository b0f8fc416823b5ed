//! Route handlers for the bills page and the htmx endpoints that change it.
//!
//! Every POST endpoint goes through [dispatch], which reads the store, asks
//! [transition] what the action should do, runs it and re-reads the store.
//! The handlers then render the `#ledger` fragment for htmx to swap in.

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use time::UtcOffset;

use crate::{
    AppState, Error,
    ledger::{
        state::{Action, Effect, Notice, PageState, Render, Transition, transition},
        view::{ledger_page, ledger_view},
    },
    session::SessionId,
    store::ExpenseStore,
    timezone::get_local_offset,
};

/// The state needed to render the bills page.
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for adding a bill.
#[derive(Debug, Deserialize)]
pub struct BillForm {
    /// What was bought.
    pub item: String,
    /// What it cost, as typed into the form.
    pub price: String,
}

/// The form data for wiping every bill.
#[derive(Debug, Deserialize)]
pub struct WipeForm {
    /// Present when the admin mode checkbox is ticked.
    #[serde(default)]
    pub admin_mode: Option<String>,
}

/// Display the bills page.
pub async fn get_ledger_page(
    State(state): State<LedgerState>,
    Extension(store): Extension<ExpenseStore>,
) -> Response {
    let local_offset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let render = match store.list_all().await {
        Ok(records) => Render::quiet(PageState::from_records(records)),
        Err(error) => {
            tracing::error!("could not read bills from the {} store: {error}", store.kind());
            Render::failed(PageState::Empty, error)
        }
    };

    (render.status_code(), ledger_page(&render, local_offset)).into_response()
}

/// A route handler that records a bill and responds with the updated ledger.
pub async fn create_bill_endpoint(
    State(state): State<LedgerState>,
    Extension(store): Extension<ExpenseStore>,
    Form(form): Form<BillForm>,
) -> Response {
    let action = Action::Add {
        item: form.item,
        price: form.price,
    };

    respond(&state, dispatch(&store, action).await)
}

/// A route handler that deletes every bill and responds with the updated ledger.
pub async fn clear_bills_endpoint(
    State(state): State<LedgerState>,
    Extension(store): Extension<ExpenseStore>,
) -> Response {
    respond(&state, dispatch(&store, Action::Clear).await)
}

/// A route handler that deletes every bill when admin mode is on and responds
/// with the updated ledger.
///
/// Responds with 403 Forbidden and leaves the bills alone when admin mode is off.
pub async fn wipe_bills_endpoint(
    State(state): State<LedgerState>,
    Extension(store): Extension<ExpenseStore>,
    Extension(session_id): Extension<SessionId>,
    Form(form): Form<WipeForm>,
) -> Response {
    let action = Action::Wipe {
        admin_mode: form.admin_mode.is_some(),
    };

    let render = dispatch(&store, action).await;

    match &render.notice {
        Some(Notice::Wiped) => {
            tracing::warn!(
                "session {session_id} wiped every bill in the {} store",
                store.kind()
            );
        }
        Some(Notice::Failed(Error::AdminModeRequired)) => {
            tracing::info!("session {session_id} tried to wipe the bills without admin mode");
        }
        _ => {}
    }

    respond(&state, render)
}

/// Apply `action` to the bills in `store`.
///
/// The store is read before and after the action runs, so the result always
/// reflects what the store holds. If the action fails, the state from before
/// the action is kept and the notice describes the failure.
pub(crate) async fn dispatch(store: &ExpenseStore, action: Action) -> Render {
    let current = match store.list_all().await {
        Ok(records) => PageState::from_records(records),
        Err(error) => {
            tracing::error!("could not read bills from the {} store: {error}", store.kind());
            return Render::failed(PageState::Empty, error);
        }
    };

    let (effect, on_success) = match transition(&current, action) {
        Transition::Reject { state, notice } => {
            return Render {
                state,
                notice: Some(notice),
            };
        }
        Transition::Run { effect, on_success } => (effect, on_success),
    };

    if let Err(error) = run(store, effect).await {
        tracing::error!("could not update the {} store: {error}", store.kind());
        return Render::failed(current, error);
    }

    match store.list_all().await {
        Ok(records) => Render {
            state: PageState::from_records(records),
            notice: Some(on_success),
        },
        Err(error) => {
            tracing::error!("could not read bills from the {} store: {error}", store.kind());
            Render::failed(PageState::Empty, error)
        }
    }
}

async fn run(store: &ExpenseStore, effect: Effect) -> Result<(), Error> {
    match effect {
        Effect::Append(expense) => {
            let expense = store.insert(expense).await?;
            tracing::debug!("recorded bill {} for {}", expense.id, expense.item);
        }
        Effect::ClearAll => store.clear_all().await?,
    }

    Ok(())
}

fn respond(state: &LedgerState, render: Render) -> Response {
    let local_offset: UtcOffset = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone.clone()).into_response(),
    };

    (render.status_code(), ledger_view(&render, local_offset)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        endpoints,
        ledger::{
            state::{Action, Notice, PageState},
            view::EMPTY_PLACEHOLDER,
        },
        session::SessionId,
        store::ExpenseStore,
        test_utils::assert_valid_html,
    };

    use super::{
        BillForm, LedgerState, WipeForm, clear_bills_endpoint, create_bill_endpoint, dispatch,
        get_ledger_page, wipe_bills_endpoint,
    };

    #[test]
    fn wipe_form_without_checkbox_is_not_admin_mode() {
        let form: WipeForm = serde_html_form::from_str("").unwrap();

        assert_eq!(form.admin_mode, None);
    }

    #[test]
    fn wipe_form_with_checkbox_is_admin_mode() {
        let form: WipeForm = serde_html_form::from_str("admin_mode=on").unwrap();

        assert_eq!(form.admin_mode.as_deref(), Some("on"));
    }

    #[test]
    fn bill_form_parses_price() {
        let form: BillForm = serde_html_form::from_str("item=Coffee&price=4.50").unwrap();

        assert_eq!(form.item, "Coffee");
        assert_eq!(form.price, "4.50");
    }

    #[test]
    fn bill_form_accepts_blank_price() {
        let form: BillForm = serde_html_form::from_str("item=Coffee&price=").unwrap();

        assert_eq!(form.price, "");
    }

    fn get_test_server(store: ExpenseStore) -> TestServer {
        let state = LedgerState {
            local_timezone: "Etc/UTC".to_owned(),
        };
        let app = Router::new()
            .route(endpoints::BILLS_VIEW, get(get_ledger_page))
            .route(endpoints::BILLS_API, post(create_bill_endpoint))
            .route(endpoints::CLEAR_BILLS, post(clear_bills_endpoint))
            .route(endpoints::WIPE_BILLS, post(wipe_bills_endpoint))
            .layer(Extension(store))
            .layer(Extension(SessionId::new()))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn select_text(html: &Html, selector: &str) -> Option<String> {
        html.select(&Selector::parse(selector).unwrap())
            .next()
            .map(|element| element.text().collect::<String>().trim().to_owned())
    }

    fn count_rows(html: &Html) -> usize {
        html.select(&Selector::parse("#bills tbody tr").unwrap())
            .count()
    }

    #[tokio::test]
    async fn page_shows_placeholder_for_fresh_store() {
        let server = get_test_server(ExpenseStore::volatile());

        let response = server.get(endpoints::BILLS_VIEW).await;

        response.assert_status_ok();
        let html = Html::parse_document(&response.text());
        assert_valid_html(&html);
        assert_eq!(
            select_text(&html, "#placeholder").as_deref(),
            Some(EMPTY_PLACEHOLDER)
        );
    }

    #[tokio::test]
    async fn page_lists_bills_newest_first() {
        let store = ExpenseStore::volatile();
        store.append("Coffee", 5.0).await.unwrap();
        store.append("Tea", 2.0).await.unwrap();
        let server = get_test_server(store);

        let response = server.get(endpoints::BILLS_VIEW).await;

        response.assert_status_ok();
        let html = Html::parse_document(&response.text());
        let items: Vec<_> = html
            .select(&Selector::parse("#bills tbody tr td:first-child").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect();
        assert_eq!(items, ["Tea", "Coffee"]);
    }

    #[tokio::test]
    async fn adding_bill_renders_ledger_with_notice() {
        let server = get_test_server(ExpenseStore::volatile());

        let response = server
            .post(endpoints::BILLS_API)
            .form(&[("item", "Coffee"), ("price", "5")])
            .await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        assert_valid_html(&html);
        assert_eq!(
            select_text(&html, "#notice").as_deref(),
            Some("Added: Coffee")
        );
        assert_eq!(count_rows(&html), 1);
        let total = select_text(&html, "#total").expect("total missing");
        assert!(total.contains("$5.00"), "want total $5.00, got {total}");
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let store = ExpenseStore::volatile();
        store.append("Coffee", 5.0).await.unwrap();
        let server = get_test_server(store.clone());

        let response = server
            .post(endpoints::BILLS_API)
            .form(&[("item", ""), ("price", "5")])
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let html = Html::parse_fragment(&response.text());
        assert_eq!(
            select_text(&html, "#notice[role='alert']").as_deref(),
            Some("Item name cannot be empty.")
        );
        assert_eq!(count_rows(&html), 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_or_unparsable_price_renders_ledger_with_notice() {
        let store = ExpenseStore::volatile();
        store.append("Coffee", 5.0).await.unwrap();
        let server = get_test_server(store.clone());

        for (price, want) in [
            ("", "Enter a price for the item."),
            ("five", "\"five\" is not a number. Enter a price such as 4.50."),
        ] {
            let response = server
                .post(endpoints::BILLS_API)
                .form(&[("item", "Tea"), ("price", price)])
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let html = Html::parse_fragment(&response.text());
            assert_valid_html(&html);
            assert_eq!(
                select_text(&html, "#notice[role='alert']").as_deref(),
                Some(want)
            );
            assert_eq!(count_rows(&html), 1);
        }
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clearing_shows_placeholder() {
        let store = ExpenseStore::volatile();
        for (item, price) in [("Coffee", 5.0), ("Coffee", 3.0), ("Tea", 2.0)] {
            store.append(item, price).await.unwrap();
        }
        let server = get_test_server(store.clone());

        let response = server.post(endpoints::CLEAR_BILLS).await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        assert_eq!(
            select_text(&html, "#notice").as_deref(),
            Some("Bills cleared")
        );
        assert_eq!(
            select_text(&html, "#placeholder").as_deref(),
            Some(EMPTY_PLACEHOLDER)
        );
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wipe_without_admin_mode_is_forbidden() {
        let store = ExpenseStore::volatile();
        store.append("Coffee", 5.0).await.unwrap();
        let server = get_test_server(store.clone());

        let response = server
            .post(endpoints::WIPE_BILLS)
            .form(&[("other", "value")])
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let html = Html::parse_fragment(&response.text());
        assert_eq!(count_rows(&html), 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wipe_in_admin_mode_deletes_everything() {
        let store = ExpenseStore::volatile();
        store.append("Coffee", 5.0).await.unwrap();
        let server = get_test_server(store.clone());

        let response = server
            .post(endpoints::WIPE_BILLS)
            .form(&[("admin_mode", "on")])
            .await;

        response.assert_status_ok();
        let html = Html::parse_fragment(&response.text());
        assert_eq!(
            select_text(&html, "#notice").as_deref(),
            Some("All bills wiped")
        );
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dispatch_works_with_sqlite_store() {
        let store = ExpenseStore::sqlite(Connection::open_in_memory().unwrap()).unwrap();

        let render = dispatch(
            &store,
            Action::Add {
                item: "Coffee".to_owned(),
                price: "5".to_owned(),
            },
        )
        .await;

        assert!(matches!(render.notice, Some(Notice::Added(_))));
        let PageState::Populated(summary) = render.state else {
            panic!("want populated state");
        };
        assert_eq!(summary.total, 5.0);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_state() {
        let store = ExpenseStore::sqlite(Connection::open_in_memory().unwrap()).unwrap();
        store.append("Coffee", 5.0).await.unwrap();
        if let ExpenseStore::Sqlite(connection) = &store {
            connection
                .lock()
                .unwrap()
                .execute_batch(
                    "CREATE TRIGGER no_new_bills BEFORE INSERT ON bills \
                    BEGIN SELECT RAISE(FAIL, 'read only'); END;",
                )
                .unwrap();
        }

        let render = dispatch(
            &store,
            Action::Add {
                item: "Tea".to_owned(),
                price: "2".to_owned(),
            },
        )
        .await;

        assert!(matches!(render.notice, Some(Notice::Failed(_))));
        let PageState::Populated(summary) = render.state else {
            panic!("want the previous populated state");
        };
        assert_eq!(summary.records.len(), 1);
        assert_eq!(count_bills(&store).await, 1);
    }

    async fn count_bills(store: &ExpenseStore) -> usize {
        store.list_all().await.unwrap().len()
    }
}
