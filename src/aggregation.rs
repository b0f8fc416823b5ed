//! Totals over a snapshot of expenses.
//!
//! Everything here is a pure function of the records passed in. Nothing is
//! cached, so callers recompute the totals after every change to the store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::expense::{Expense, ItemName};

/// The total amount spent over all `records`. Zero if there are none.
pub fn total(records: &[Expense]) -> f64 {
    records.iter().map(|record| record.price.as_f64()).sum()
}

/// The amount spent on each distinct item name.
///
/// Each name in `records` appears exactly once in the result.
pub fn group_by_item(records: &[Expense]) -> BTreeMap<ItemName, f64> {
    let mut totals = BTreeMap::new();

    for record in records {
        *totals.entry(record.item.clone()).or_insert(0.0) += record.price.as_f64();
    }

    totals
}

/// The total spent on one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTotal {
    /// The item the bills were for.
    pub item: ItemName,
    /// The sum of the prices of the item's bills.
    pub total: f64,
}

/// The per-item totals ordered for display: biggest spend first, ties broken
/// by item name.
pub fn item_totals_by_spend(records: &[Expense]) -> Vec<ItemTotal> {
    let mut totals: Vec<_> = group_by_item(records)
        .into_iter()
        .map(|(item, total)| ItemTotal { item, total })
        .collect();

    totals.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.item.cmp(&b.item)));

    totals
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::expense::{Expense, ItemName, Price};

    use super::{ItemTotal, group_by_item, item_totals_by_spend, total};

    fn create_test_expense(id: i64, item: &str, price: f64) -> Expense {
        Expense {
            id,
            item: ItemName::new_unchecked(item),
            price: Price::new_unchecked(price),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn coffee_and_tea() -> Vec<Expense> {
        vec![
            create_test_expense(3, "Tea", 2.0),
            create_test_expense(2, "Coffee", 3.0),
            create_test_expense(1, "Coffee", 5.0),
        ]
    }

    #[test]
    fn total_sums_prices() {
        assert_eq!(total(&coffee_and_tea()), 10.0);
    }

    #[test]
    fn total_handles_empty_input() {
        assert_eq!(total(&[]), 0.0);
    }

    #[test]
    fn group_by_item_sums_each_name() {
        let groups = group_by_item(&coffee_and_tea());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&ItemName::new_unchecked("Coffee")], 8.0);
        assert_eq!(groups[&ItemName::new_unchecked("Tea")], 2.0);
    }

    #[test]
    fn group_by_item_handles_empty_input() {
        assert!(group_by_item(&[]).is_empty());
    }

    #[test]
    fn group_totals_add_up_to_total() {
        let records = vec![
            create_test_expense(1, "Coffee", 4.5),
            create_test_expense(2, "Bread", 3.25),
            create_test_expense(3, "Coffee", 0.75),
            create_test_expense(4, "Milk", 2.0),
            create_test_expense(5, "Bread", 1.5),
        ];

        let group_sum: f64 = group_by_item(&records).values().sum();

        assert_eq!(group_sum, total(&records));
    }

    #[test]
    fn item_names_are_case_sensitive() {
        let records = vec![
            create_test_expense(1, "tea", 1.0),
            create_test_expense(2, "Tea", 1.0),
        ];

        assert_eq!(group_by_item(&records).len(), 2);
    }

    #[test]
    fn item_totals_are_ordered_by_spend_then_name() {
        let mut records = coffee_and_tea();
        records.push(create_test_expense(4, "Cake", 2.0));

        let totals = item_totals_by_spend(&records);

        assert_eq!(
            totals,
            vec![
                ItemTotal {
                    item: ItemName::new_unchecked("Coffee"),
                    total: 8.0
                },
                ItemTotal {
                    item: ItemName::new_unchecked("Cake"),
                    total: 2.0
                },
                ItemTotal {
                    item: ItemName::new_unchecked("Tea"),
                    total: 2.0
                },
            ]
        );
    }
}
