//! Defines the expense record and the validated values it is built from.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// The identity a store assigns to an expense when it is created.
pub type ExpenseId = i64;

/// A validated, non-empty item name, e.g. "Coffee".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemName(String);

impl ItemName {
    /// Create an item name.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyItemName] if `name` is empty
    /// or only contains whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyItemName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create an item name without validation.
    ///
    /// Used for names read back from a store, which were validated when they
    /// were appended and are not re-validated afterwards.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ItemName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemName::new(s)
    }
}

impl Display for ItemName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How much was paid for an item. Always finite and never negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    /// Create a price.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidPrice] if `amount` is
    /// negative, NaN or infinite.
    pub fn new(amount: f64) -> Result<Self, Error> {
        if amount.is_finite() && amount >= 0.0 {
            // Normalise -0.0 so it displays as zero.
            Ok(Self(amount.abs()))
        } else {
            Err(Error::InvalidPrice(amount))
        }
    }

    /// Parse a price typed into a form, e.g. "4.50".
    ///
    /// # Errors
    ///
    /// Returns an [Error::UnparsablePrice] if `raw` is blank or not a number,
    /// or an [Error::InvalidPrice] if the number is negative or not finite.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let amount = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::UnparsablePrice(raw.to_owned()))?;

        Self::new(amount)
    }

    /// Create a price without validation, e.g. for a value read from a store.
    pub fn new_unchecked(amount: f64) -> Self {
        Self(amount)
    }

    /// The price as a plain number.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

/// One recorded expense.
///
/// Expenses are created by a store (see [crate::ExpenseStore]), which assigns
/// the `id` and `created_at` fields. They are never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The store-assigned identity, unique and increasing in creation order.
    pub id: ExpenseId,
    /// What was bought.
    pub item: ItemName,
    /// What it cost.
    pub price: Price,
    /// When the store recorded the expense.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated expense that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// What was bought.
    pub item: ItemName,
    /// What it cost.
    pub price: Price,
}

impl NewExpense {
    /// Validate the raw form values for a new expense.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyItemName] if `item` is blank, or an
    /// [Error::InvalidPrice] if `price` is negative or not a finite number.
    pub fn new(item: &str, price: f64) -> Result<Self, Error> {
        Ok(Self {
            item: ItemName::new(item)?,
            price: Price::new(price)?,
        })
    }

    /// Validate the raw form values for a new expense, where the price is
    /// still the text the user typed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyItemName] if `item` is blank, otherwise the
    /// error from [Price::parse].
    pub fn parse(item: &str, price: &str) -> Result<Self, Error> {
        Ok(Self {
            item: ItemName::new(item)?,
            price: Price::parse(price)?,
        })
    }
}
