//! The bills page: a side panel for adding and clearing bills and a main panel
//! with the list of bills, the total spent and a chart of spend per item.

mod chart;
mod handlers;
mod state;
mod view;

pub use handlers::{
    LedgerState, clear_bills_endpoint, create_bill_endpoint, get_ledger_page, wipe_bills_endpoint,
};
pub use state::{Action, Effect, Notice, PageState, Render, Summary, Transition, transition};
