//! The record store: the single owner of the recorded expenses.
//!
//! [ExpenseStore] is a cheap-to-clone handle over one of three backends:
//! - a volatile in-memory store owned by a browser session ([MemoryStore]),
//! - a local SQLite `bills` table,
//! - a hosted `bills` table reached over HTTP ([RemoteTable]).

mod memory;
mod remote;
mod sqlite;

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

pub use memory::MemoryStore;
pub use remote::RemoteTable;
pub use sqlite::create_bills_table;

use crate::{
    Error,
    expense::{Expense, NewExpense},
};

/// A handle to the store that owns the expenses for the current request.
#[derive(Debug, Clone)]
pub enum ExpenseStore {
    /// Expenses kept in memory for a single session.
    Volatile(Arc<Mutex<MemoryStore>>),
    /// Expenses kept in a SQLite database shared by every session.
    Sqlite(Arc<Mutex<Connection>>),
    /// Expenses kept in a hosted table shared by every client.
    Remote(RemoteTable),
}

impl ExpenseStore {
    /// Create a handle to a new, empty volatile store.
    pub fn volatile() -> Self {
        Self::Volatile(Arc::new(Mutex::new(MemoryStore::new())))
    }

    /// Create a handle to the SQLite store behind `connection`, creating the
    /// bills table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the table cannot be created.
    pub fn sqlite(connection: Connection) -> Result<Self, Error> {
        create_bills_table(&connection)?;

        Ok(Self::Sqlite(Arc::new(Mutex::new(connection))))
    }

    /// Validate and record a new expense.
    ///
    /// The item name is checked before the backend is touched, so an invalid
    /// expense never changes the store.
    ///
    /// # Errors
    /// Returns an [Error::EmptyItemName] or [Error::InvalidPrice] for invalid
    /// input, otherwise any error from the backend.
    pub async fn append(&self, item: &str, price: f64) -> Result<Expense, Error> {
        let expense = NewExpense::new(item, price)?;

        self.insert(expense).await
    }

    /// Record an expense that has already been validated.
    ///
    /// # Errors
    /// Returns any error from the backend.
    pub async fn insert(&self, expense: NewExpense) -> Result<Expense, Error> {
        match self {
            Self::Volatile(store) => append_volatile(store, expense),
            Self::Sqlite(connection) => append_sqlite(connection, expense),
            Self::Remote(table) => table.insert(&expense).await,
        }
    }

    /// Get every expense, newest first.
    ///
    /// # Errors
    /// Returns any error from the backend.
    pub async fn list_all(&self) -> Result<Vec<Expense>, Error> {
        match self {
            Self::Volatile(store) => list_volatile(store),
            Self::Sqlite(connection) => list_sqlite(connection),
            Self::Remote(table) => table.select_all().await,
        }
    }

    /// Irreversibly delete every expense.
    ///
    /// # Errors
    /// Returns any error from the backend.
    pub async fn clear_all(&self) -> Result<(), Error> {
        match self {
            Self::Volatile(store) => clear_volatile(store),
            Self::Sqlite(connection) => clear_sqlite(connection),
            Self::Remote(table) => table.delete_all().await,
        }
    }

    /// A short name for the backend, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Volatile(_) => "volatile",
            Self::Sqlite(_) => "sqlite",
            Self::Remote(_) => "remote",
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, Error> {
    mutex
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire store lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

fn append_volatile(store: &Mutex<MemoryStore>, expense: NewExpense) -> Result<Expense, Error> {
    Ok(lock(store)?.append(expense))
}

fn list_volatile(store: &Mutex<MemoryStore>) -> Result<Vec<Expense>, Error> {
    Ok(lock(store)?.list_all())
}

fn clear_volatile(store: &Mutex<MemoryStore>) -> Result<(), Error> {
    lock(store)?.clear_all();

    Ok(())
}

fn append_sqlite(connection: &Mutex<Connection>, expense: NewExpense) -> Result<Expense, Error> {
    let connection = lock(connection)?;

    sqlite::insert_bill(expense, &connection)
}

fn list_sqlite(connection: &Mutex<Connection>) -> Result<Vec<Expense>, Error> {
    let connection = lock(connection)?;

    sqlite::get_all_bills(&connection)
}

fn clear_sqlite(connection: &Mutex<Connection>) -> Result<(), Error> {
    let connection = lock(connection)?;
    let rows_affected = sqlite::delete_all_bills(&connection)?;
    tracing::debug!("deleted {rows_affected} bills");

    Ok(())
}
