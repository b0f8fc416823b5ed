//! The JSON view of the bills for scripts and other clients.

use axum::{
    Extension, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    aggregation::{ItemTotal, item_totals_by_spend, total},
    expense::Expense,
    store::ExpenseStore,
};

/// Every bill, newest first, with the total spent and the total per item.
#[derive(Debug, Serialize)]
pub struct BillsSummary {
    records: Vec<Expense>,
    total: f64,
    by_item: Vec<ItemTotal>,
}

impl BillsSummary {
    fn new(records: Vec<Expense>) -> Self {
        Self {
            total: total(&records),
            by_item: item_totals_by_spend(&records),
            records,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A route handler for getting the bills of the current session as JSON.
pub async fn get_bills_summary(Extension(store): Extension<ExpenseStore>) -> Response {
    match store.list_all().await {
        Ok(records) => (StatusCode::OK, Json(BillsSummary::new(records))).into_response(),
        Err(error) => {
            tracing::error!("could not read bills from the {} store: {error}", store.kind());
            (
                error.status_code(),
                Json(ErrorBody {
                    error: error.user_message(),
                }),
            )
                .into_response()
        }
    }
}
