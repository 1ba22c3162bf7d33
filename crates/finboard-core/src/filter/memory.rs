//! In-process evaluation of transaction queries

use std::cmp::Ordering;

use crate::models::Transaction;
use crate::query::{Pagination, Sort, SortField, SortOrder, TransactionFilter};

/// Whether a transaction satisfies every constraint of the filter
pub fn matches(tx: &Transaction, filter: &TransactionFilter) -> bool {
    if filter.date_from.map_or(false, |from| tx.date < from) {
        return false;
    }
    if filter.date_to.map_or(false, |to| tx.date > to) {
        return false;
    }
    if filter.amount_from.map_or(false, |min| tx.amount < min) {
        return false;
    }
    if filter.amount_to.map_or(false, |max| tx.amount > max) {
        return false;
    }
    if filter.category.map_or(false, |category| tx.category != category) {
        return false;
    }
    if filter.status.map_or(false, |status| tx.status != status) {
        return false;
    }
    if filter
        .user_id
        .as_ref()
        .map_or(false, |user_id| &tx.user_id != user_id)
    {
        return false;
    }
    match filter.search_needle() {
        Some(needle) => matches_search(tx, &needle),
        None => true,
    }
}

fn matches_search(tx: &Transaction, needle: &str) -> bool {
    let description = tx.description.as_deref().unwrap_or("");
    [
        tx.user_id.as_str(),
        description,
        tx.category.as_str(),
        tx.status.as_str(),
    ]
    .iter()
    .any(|haystack| haystack.to_lowercase().contains(needle))
}

fn compare_field(a: &Transaction, b: &Transaction, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Date => a.date.cmp(&b.date),
        SortField::Amount => a.amount.total_cmp(&b.amount),
        SortField::Category => a.category.as_str().cmp(b.category.as_str()),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::UserId => a.user_id.cmp(&b.user_id),
        SortField::UserProfile => a.user_profile.cmp(&b.user_profile),
        // None < Some, so missing descriptions lead when ascending
        SortField::Description => a.description.cmp(&b.description),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

/// Total order for a sort: the requested field, then ascending id
pub fn compare(a: &Transaction, b: &Transaction, sort: &Sort) -> Ordering {
    let primary = compare_field(a, b, sort.field);
    let primary = match sort.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Matching transactions in sort order
pub fn select(transactions: &[Transaction], filter: &TransactionFilter, sort: &Sort) -> Vec<Transaction> {
    let mut selected: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| matches(tx, filter))
        .cloned()
        .collect();
    selected.sort_by(|a, b| compare(a, b, sort));
    selected
}

/// Cut one page out of an already ordered list
pub fn paginate<T>(items: Vec<T>, pagination: &Pagination) -> Vec<T> {
    let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    items
        .into_iter()
        .skip(offset)
        .take(pagination.limit() as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Status};
    use chrono::{TimeZone, Utc};

    fn tx(id: u64, day: u32, amount: f64, description: Option<&str>) -> Transaction {
        let date = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        Transaction {
            id,
            date,
            amount,
            category: Category::Revenue,
            status: Status::Paid,
            user_id: format!("user_{:03}", id),
            user_profile: "https://thispersondoesnotexist.com/".to_string(),
            description: description.map(str::to_string),
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn test_amount_bounds_are_inclusive() {
        let t = tx(1, 1, 100.0, None);
        let filter = TransactionFilter {
            amount_from: Some(100.0),
            amount_to: Some(100.0),
            ..TransactionFilter::default()
        };
        assert!(matches(&t, &filter));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let t = tx(1, 1, 10.0, Some("Office Supplies"));
        let filter = TransactionFilter {
            search: Some("oFFice".to_string()),
            ..TransactionFilter::default()
        };
        assert!(matches(&t, &filter));

        let filter = TransactionFilter {
            search: Some("revenue".to_string()),
            ..TransactionFilter::default()
        };
        assert!(matches(&tx(2, 1, 10.0, None), &filter));
    }

    #[test]
    fn test_ties_broken_by_id() {
        let items = vec![tx(3, 5, 50.0, None), tx(1, 5, 50.0, None), tx(2, 5, 50.0, None)];
        let sorted = select(&items, &TransactionFilter::default(), &Sort::new(SortField::Amount, SortOrder::Desc));
        let ids: Vec<u64> = sorted.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_description_ordering() {
        let items = vec![tx(1, 1, 1.0, Some("b")), tx(2, 1, 1.0, None), tx(3, 1, 1.0, Some("a"))];
        let asc = select(&items, &TransactionFilter::default(), &Sort::new(SortField::Description, SortOrder::Asc));
        assert_eq!(asc.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3, 1]);
        let desc = select(&items, &TransactionFilter::default(), &Sort::new(SortField::Description, SortOrder::Desc));
        assert_eq!(desc.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], &Pagination::new(Some(5), Some(2), 10));
        assert!(page.is_empty());
        let page = paginate(vec![1, 2, 3], &Pagination::new(Some(2), Some(2), 10));
        assert_eq!(page, vec![3]);
    }
}
