//! A volatile expense store that lives only as long as a browser session.

use time::OffsetDateTime;

use crate::expense::{Expense, ExpenseId, NewExpense};

/// Expenses kept in memory, in the order they were appended.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Expense>,
    last_id: ExpenseId,
}

impl MemoryStore {
    /// Create an empty store. The first appended expense gets the ID 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `expense` with the next ID and the current time.
    pub fn append(&mut self, expense: NewExpense) -> Expense {
        self.last_id += 1;

        let expense = Expense {
            id: self.last_id,
            item: expense.item,
            price: expense.price,
            created_at: OffsetDateTime::now_utc(),
        };
        self.records.push(expense.clone());

        expense
    }

    /// All expenses, newest first.
    pub fn list_all(&self) -> Vec<Expense> {
        self.records.iter().rev().cloned().collect()
    }

    /// Remove every expense.
    ///
    /// IDs are not reused after clearing.
    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    /// The number of expenses in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no expenses.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
