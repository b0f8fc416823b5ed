//! The states of the bills page and the actions that move between them.
//!
//! [transition] decides what an action should do without touching the store,
//! and [PageState::from_records] settles the state from a fresh read of the
//! store once the action has run.

use axum::http::StatusCode;

use crate::{
    Error,
    aggregation::{ItemTotal, item_totals_by_spend, total},
    expense::{Expense, ItemName, NewExpense},
};

/// What the main panel of the bills page shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    /// There are no bills, so a placeholder is shown.
    Empty,
    /// There are bills, so the list, the total and the chart are shown.
    Populated(Summary),
}

/// A snapshot of the bills and their totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// The bills, newest first.
    pub records: Vec<Expense>,
    /// The sum of every bill's price.
    pub total: f64,
    /// The total per item, biggest spend first.
    pub by_item: Vec<ItemTotal>,
}

impl PageState {
    /// Settle the page state from a full read of the store.
    pub fn from_records(records: Vec<Expense>) -> Self {
        if records.is_empty() {
            return Self::Empty;
        }

        Self::Populated(Summary {
            total: total(&records),
            by_item: item_totals_by_spend(&records),
            records,
        })
    }
}

/// Something the user asked the bills page to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Record a new bill.
    Add {
        /// The raw item name from the form.
        item: String,
        /// The raw price from the form.
        price: String,
    },
    /// Delete every bill.
    Clear,
    /// Delete every bill, but only if admin mode is turned on.
    Wipe {
        /// Whether the admin mode checkbox was ticked.
        admin_mode: bool,
    },
}

/// A change to make to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a validated bill.
    Append(NewExpense),
    /// Delete every bill.
    ClearAll,
}

/// A message shown in the side panel after an action.
#[derive(Debug, PartialEq)]
pub enum Notice {
    /// A bill was recorded.
    Added(ItemName),
    /// The bills were cleared.
    Cleared,
    /// The bills were wiped in admin mode.
    Wiped,
    /// The action did not go through.
    Failed(Error),
}

impl Notice {
    /// The text to show the user.
    pub fn message(&self) -> String {
        match self {
            Notice::Added(item) => format!("Added: {item}"),
            Notice::Cleared => "Bills cleared".to_owned(),
            Notice::Wiped => "All bills wiped".to_owned(),
            Notice::Failed(error) => error.user_message(),
        }
    }

    /// Whether the notice reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Failed(_))
    }
}

/// The outcome of applying an action to the current page state.
#[derive(Debug, PartialEq)]
pub enum Transition {
    /// The action was refused; the page stays as it was.
    Reject {
        /// The unchanged page state.
        state: PageState,
        /// Why the action was refused.
        notice: Notice,
    },
    /// The action should change the store.
    Run {
        /// The change to make.
        effect: Effect,
        /// The notice to show if the change succeeds.
        on_success: Notice,
    },
}

/// Decide how the page reacts to `action` when it is showing `current`.
pub fn transition(current: &PageState, action: Action) -> Transition {
    let reject = |error| Transition::Reject {
        state: current.clone(),
        notice: Notice::Failed(error),
    };

    match action {
        Action::Add { item, price } => match NewExpense::parse(&item, &price) {
            Ok(expense) => Transition::Run {
                on_success: Notice::Added(expense.item.clone()),
                effect: Effect::Append(expense),
            },
            Err(error) => reject(error),
        },
        Action::Clear => Transition::Run {
            effect: Effect::ClearAll,
            on_success: Notice::Cleared,
        },
        Action::Wipe { admin_mode: false } => reject(Error::AdminModeRequired),
        Action::Wipe { admin_mode: true } => Transition::Run {
            effect: Effect::ClearAll,
            on_success: Notice::Wiped,
        },
    }
}

/// What to draw after an action: the page state and an optional notice.
#[derive(Debug, PartialEq)]
pub struct Render {
    /// The state of the main panel.
    pub state: PageState,
    /// The notice for the side panel.
    pub notice: Option<Notice>,
}

impl Render {
    /// Render `state` with no notice.
    pub fn quiet(state: PageState) -> Self {
        Self {
            state,
            notice: None,
        }
    }

    /// Render `state` with a notice describing `error`.
    pub fn failed(state: PageState, error: Error) -> Self {
        Self {
            state,
            notice: Some(Notice::Failed(error)),
        }
    }

    /// The status code to send the rendered page with.
    pub fn status_code(&self) -> StatusCode {
        match &self.notice {
            Some(Notice::Failed(error)) => error.status_code(),
            _ => StatusCode::OK,
        }
    }
}
