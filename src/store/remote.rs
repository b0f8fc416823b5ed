//! Stores expenses in a hosted `bills` table exposed through a PostgREST-style
//! REST API, e.g. a hosted Postgres project.
//!
//! The table is expected to have the columns `id` (integer, server-assigned),
//! `item` (text), `price` (numeric) and `created_at` (server-assigned timestamp).

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    expense::{Expense, ItemName, NewExpense, Price},
};

/// How long to wait for the remote table before giving up on a request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The path of the bills table relative to the project URL.
const TABLE_PATH: &str = "rest/v1/bills";

/// A client for the remote bills table.
#[derive(Debug, Clone)]
pub struct RemoteTable {
    client: Client,
    table_url: String,
    api_key: String,
}

/// A row of the bills table as it is sent over the wire.
#[derive(Debug, Deserialize)]
struct BillRow {
    id: i64,
    item: String,
    price: f64,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl From<BillRow> for Expense {
    fn from(row: BillRow) -> Self {
        Self {
            id: row.id,
            item: ItemName::new_unchecked(&row.item),
            price: Price::new_unchecked(row.price),
            created_at: row.created_at,
        }
    }
}

/// The columns the client provides when inserting a bill.
#[derive(Debug, Serialize)]
struct NewBillRow<'a> {
    item: &'a str,
    price: f64,
}

impl RemoteTable {
    /// Create a client for the bills table of the project at `project_url`,
    /// authenticating with `api_key`.
    ///
    /// # Errors
    /// Returns an [Error::RemoteStore] if the HTTP client cannot be created.
    pub fn new(project_url: &Url, api_key: &str) -> Result<Self, Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let table_url = format!(
            "{}/{TABLE_PATH}",
            project_url.as_str().trim_end_matches('/')
        );

        Ok(Self {
            client,
            table_url,
            api_key: api_key.to_owned(),
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.table_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Insert a row and return it as stored by the server.
    ///
    /// # Errors
    /// Returns an [Error::RemoteStore] if the request fails, the server responds
    /// with an error status, or the response does not contain the new row.
    pub async fn insert(&self, expense: &NewExpense) -> Result<Expense, Error> {
        let rows: Vec<BillRow> = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&NewBillRow {
                item: expense.item.as_ref(),
                price: expense.price.as_f64(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        rows.into_iter()
            .next()
            .map(Expense::from)
            .ok_or_else(|| Error::RemoteStore("the inserted row was not returned".to_owned()))
    }

    /// Select every row, ordered by ID descending.
    ///
    /// # Errors
    /// Returns an [Error::RemoteStore] if the request fails or the server
    /// responds with an error status.
    pub async fn select_all(&self) -> Result<Vec<Expense>, Error> {
        let rows: Vec<BillRow> = self
            .request(Method::GET)
            .query(&[("select", "id,item,price,created_at"), ("order", "id.desc")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(rows.into_iter().map(Expense::from).collect())
    }

    /// Check that the table can be read with the configured key by selecting
    /// at most one row.
    ///
    /// # Errors
    /// Returns an [Error::RemoteStore] if the server cannot be reached or
    /// responds with an error status, e.g. because the key is wrong.
    pub async fn check_connection(&self) -> Result<(), Error> {
        self.request(Method::GET)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Delete every row.
    ///
    /// PostgREST refuses unfiltered deletes, so this deletes the rows whose ID is
    /// not zero, which is every row since IDs start at one.
    ///
    /// # Errors
    /// Returns an [Error::RemoteStore] if the request fails or the server
    /// responds with an error status.
    pub async fn delete_all(&self) -> Result<(), Error> {
        self.request(Method::DELETE)
            .query(&[("id", "neq.0")])
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
