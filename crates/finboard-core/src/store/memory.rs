//! In-memory transaction store, used when no database is reachable

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::TransactionStore;
use crate::error::CoreResult;
use crate::filter::memory;
use crate::models::{NewTransaction, Page, Transaction};
use crate::query::{Sort, TransactionFilter, TransactionQuery};

/// Transactions kept in process memory; lost on restart
#[derive(Debug, Default)]
pub struct MemoryTransactionStore {
    transactions: RwLock<Vec<Transaction>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: RwLock::new(transactions),
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn query(&self, query: &TransactionQuery) -> CoreResult<Page<Transaction>> {
        let transactions = self.transactions.read().await;
        let selected = memory::select(&transactions, &query.filter, &query.sort);
        let total = selected.len() as u64;
        let data = memory::paginate(selected, &query.pagination);
        Ok(Page::new(data, total, &query.pagination))
    }

    async fn find_all(&self, filter: &TransactionFilter, sort: &Sort) -> CoreResult<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(memory::select(&transactions, filter, sort))
    }

    async fn count(&self, filter: &TransactionFilter) -> CoreResult<u64> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|tx| memory::matches(tx, filter))
            .count() as u64)
    }

    async fn sum_amount(&self, filter: &TransactionFilter) -> CoreResult<f64> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|tx| memory::matches(tx, filter))
            .map(|tx| tx.amount)
            .sum())
    }

    async fn insert(&self, new: NewTransaction) -> CoreResult<Transaction> {
        let new = new.validated()?;
        let mut transactions = self.transactions.write().await;
        let id = transactions.iter().map(|tx| tx.id).max().unwrap_or(0) + 1;
        let created = new.into_transaction(id, Utc::now());
        transactions.push(created.clone());
        log::debug!("Inserted transaction {} for {} (memory)", created.id, created.user_id);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Status};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn new_tx(amount: f64) -> NewTransaction {
        NewTransaction {
            date: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            amount,
            category: Category::Revenue,
            status: Status::Pending,
            user_id: "user_001".to_string(),
            user_profile: "https://thispersondoesnotexist.com/".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_unique_ids() {
        let store = Arc::new(MemoryTransactionStore::new());
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.insert(new_tx(i as f64)).await }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=20).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_next_id_follows_existing_max() {
        let existing = new_tx(1.0).into_transaction(41, Utc::now());
        let store = MemoryTransactionStore::with_transactions(vec![existing]);
        assert_eq!(store.insert(new_tx(2.0)).await.unwrap().id, 42);
    }
}
