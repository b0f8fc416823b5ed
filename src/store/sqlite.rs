//! Stores expenses in the `bills` table of a SQLite database.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    expense::{Expense, ItemName, NewExpense, Price},
};

/// Create the bills table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_bills_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS bills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item TEXT NOT NULL,
                price REAL NOT NULL CHECK (price >= 0),
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('bills', 0)",
        (),
    )?;

    Ok(())
}

/// Insert a new bill and return it with its ID and creation time.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn insert_bill(expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    let bill = connection
        .prepare(
            "INSERT INTO bills (item, price, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING id, item, price, created_at",
        )?
        .query_row(
            (
                expense.item.as_ref(),
                expense.price.as_f64(),
                OffsetDateTime::now_utc(),
            ),
            map_bill_row,
        )?;

    Ok(bill)
}

/// Get every bill, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_all_bills(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare("SELECT id, item, price, created_at FROM bills ORDER BY id DESC")?
        .query_map([], map_bill_row)?
        .map(|maybe_bill| maybe_bill.map_err(Error::from))
        .collect()
}

type RowsAffected = usize;

/// Delete every bill.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_all_bills(connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM bills WHERE id <> 0", ())
        .map_err(|error| error.into())
}

/// Get the total number of bills in the database.
#[cfg(test)]
pub fn count_bills(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM bills;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Map a database row to an [Expense].
fn map_bill_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let item: String = row.get(1)?;
    let price = row.get(2)?;
    let created_at = row.get(3)?;

    Ok(Expense {
        id,
        item: ItemName::new_unchecked(&item),
        price: Price::new_unchecked(price),
        created_at,
    })
}
