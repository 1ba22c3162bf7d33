//! Transaction storage backends
//!
//! A process serves transactions from exactly one backend, chosen at startup:
//! SQLite when [`connect_database`] succeeds, otherwise the in-memory store.

pub mod database;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;

use finboard_config::DatabaseConfig;

use crate::error::CoreResult;
use crate::models::{NewTransaction, Page, Transaction};
use crate::query::{Sort, TransactionFilter, TransactionQuery};

pub use database::Database;
pub use memory::MemoryTransactionStore;
pub use sqlite::SqliteTransactionStore;

/// Storage interface shared by every transaction backend
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Short backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;

    /// One page of matches plus the pre-pagination total
    async fn query(&self, query: &TransactionQuery) -> CoreResult<Page<Transaction>>;

    /// Every match, ordered
    async fn find_all(&self, filter: &TransactionFilter, sort: &Sort) -> CoreResult<Vec<Transaction>>;

    async fn count(&self, filter: &TransactionFilter) -> CoreResult<u64>;

    /// Sum of matching amounts, zero when nothing matches
    async fn sum_amount(&self, filter: &TransactionFilter) -> CoreResult<f64>;

    /// Validate and store a new transaction under the next sequential id
    async fn insert(&self, new: NewTransaction) -> CoreResult<Transaction>;
}

/// Shared handle to the active transaction backend
pub type TransactionStoreRef = Arc<dyn TransactionStore>;

/// Connect to the configured database if enabled; `None` means fall back to memory
pub async fn connect_database(config: &DatabaseConfig) -> Option<Database> {
    if !config.enabled {
        log::info!("Database disabled in config, using in-memory stores");
        return None;
    }
    match Database::connect(config).await {
        Ok(db) => Some(db),
        Err(e) => {
            log::warn!("Database unavailable ({}), falling back to in-memory stores", e);
            None
        }
    }
}

/// Transaction backend for an optional database connection
pub fn transaction_store(database: Option<&Database>) -> TransactionStoreRef {
    match database {
        Some(db) => Arc::new(SqliteTransactionStore::new(db.pool().clone())),
        None => Arc::new(MemoryTransactionStore::new()),
    }
}

/// Shared behaviour of both backends over one request table
#[cfg(test)]
mod conformance {
    use super::*;
    use crate::query::{Pagination, SortField, SortOrder};
    use crate::seed::demo_transactions;
    use crate::types::{Category, Status};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    async fn seeded_backends() -> Vec<TransactionStoreRef> {
        let db = Database::in_memory().await.unwrap();
        let stores: Vec<TransactionStoreRef> = vec![
            Arc::new(SqliteTransactionStore::new(db.pool().clone())),
            Arc::new(MemoryTransactionStore::new()),
        ];
        for store in &stores {
            for tx in demo_transactions() {
                store.insert(tx).await.unwrap();
            }
        }
        stores
    }

    fn request(pairs: &[(&str, &str)]) -> TransactionQuery {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TransactionQuery::from_params(&params, 10).unwrap()
    }

    fn request_table() -> Vec<TransactionQuery> {
        vec![
            request(&[]),
            request(&[("sortBy", "amount"), ("sortOrder", "asc")]),
            request(&[("sortBy", "amount"), ("sortOrder", "desc"), ("limit", "3"), ("page", "2")]),
            request(&[("category", "Expense")]),
            request(&[("status", "Pending"), ("sortBy", "user_id"), ("sortOrder", "asc")]),
            request(&[("search", "CONSULT")]),
            request(&[("search", "paid"), ("sortBy", "description")]),
            request(&[("search", "%")]),
            request(&[("search", "übung")]),
            request(&[("search", "ÄRGER"), ("sortBy", "amount")]),
            request(&[("amountFrom", "800"), ("amountTo", "1500")]),
            request(&[("dateFrom", "2024-01-20"), ("dateTo", "2024-02-15")]),
            request(&[("user_id", "user_002"), ("sortBy", "category")]),
            request(&[("sortBy", "description"), ("sortOrder", "asc")]),
            request(&[("sortBy", "status"), ("limit", "4"), ("page", "3")]),
            request(&[("page", "99")]),
        ]
    }

    fn unicode_transaction() -> NewTransaction {
        NewTransaction {
            date: Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap(),
            amount: 75.0,
            category: Category::Expense,
            status: Status::Paid,
            user_id: "user_005".to_string(),
            user_profile: "https://thispersondoesnotexist.com/".to_string(),
            description: Some("Ärger Übung".to_string()),
        }
    }

    #[tokio::test]
    async fn test_backends_agree_on_request_table() {
        let stores = seeded_backends().await;
        for store in &stores {
            store.insert(unicode_transaction()).await.unwrap();
        }
        for query in request_table() {
            let pages: Vec<Page<Transaction>> = {
                let mut pages = Vec::new();
                for store in &stores {
                    pages.push(store.query(&query).await.unwrap());
                }
                pages
            };
            let ids = |page: &Page<Transaction>| page.data.iter().map(|t| t.id).collect::<Vec<_>>();
            assert_eq!(pages[0].total, pages[1].total, "total differs for {:?}", query);
            assert_eq!(ids(&pages[0]), ids(&pages[1]), "order differs for {:?}", query);
            assert_eq!(pages[0].total_pages, pages[1].total_pages);

            let count = stores[0].count(&query.filter).await.unwrap();
            assert_eq!(count, stores[1].count(&query.filter).await.unwrap());
            assert_eq!(count, pages[0].total);
        }
    }

    #[tokio::test]
    async fn test_pages_concatenate_to_full_result() {
        for store in seeded_backends().await {
            let sort = Sort::new(SortField::Category, SortOrder::Asc);
            let full = store.find_all(&TransactionFilter::default(), &sort).await.unwrap();

            let mut collected = Vec::new();
            for page in 1..=4 {
                let query = TransactionQuery::new(
                    TransactionFilter::default(),
                    sort,
                    Pagination::new(Some(page), Some(3), 10),
                );
                let result = store.query(&query).await.unwrap();
                assert_eq!(result.total, 10);
                assert_eq!(result.total_pages, 4);
                collected.extend(result.data);
            }
            assert_eq!(collected, full, "backend {}", store.backend());
        }
    }

    #[tokio::test]
    async fn test_amount_sort() {
        for store in seeded_backends().await {
            let filter = TransactionFilter::default()
                .until(Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap());
            let asc = store
                .find_all(&filter, &Sort::new(SortField::Amount, SortOrder::Asc))
                .await
                .unwrap();
            let amounts: Vec<f64> = asc.iter().map(|t| t.amount).collect();
            assert_eq!(amounts, vec![300.75, 1200.5, 1500.0], "backend {}", store.backend());

            let desc = store
                .find_all(&filter, &Sort::new(SortField::Amount, SortOrder::Desc))
                .await
                .unwrap();
            let amounts: Vec<f64> = desc.iter().map(|t| t.amount).collect();
            assert_eq!(amounts, vec![1500.0, 1200.5, 300.75]);
        }
    }

    #[tokio::test]
    async fn test_search_matches_description() {
        for store in seeded_backends().await {
            let page = store.query(&request(&[("search", "consult")])).await.unwrap();
            assert!(page.total >= 1, "backend {}", store.backend());
            assert!(page
                .data
                .iter()
                .any(|t| t.description.as_deref() == Some("Consulting services")));
        }
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        for store in seeded_backends().await {
            let created = store.insert(unicode_transaction()).await.unwrap();
            for needle in ["übung", "ÄRGER"] {
                let page = store.query(&request(&[("search", needle)])).await.unwrap();
                assert_eq!(page.total, 1, "backend {} search {}", store.backend(), needle);
                assert_eq!(page.data[0].id, created.id);
            }
        }
    }

    #[tokio::test]
    async fn test_date_to_is_inclusive() {
        for store in seeded_backends().await {
            // the demo record dated 2024-01-15T08:34:12Z
            let page = store
                .query(&request(&[("dateTo", "2024-01-15T08:34:12.000Z"), ("dateFrom", "2024-01-15")]))
                .await
                .unwrap();
            assert_eq!(page.total, 1, "backend {}", store.backend());
            assert_eq!(page.data[0].id, 1);
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_next_id() {
        for store in seeded_backends().await {
            let created = store
                .insert(NewTransaction {
                    date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
                    amount: 42.0,
                    category: Category::Expense,
                    status: Status::Pending,
                    user_id: "user_009".to_string(),
                    user_profile: "https://thispersondoesnotexist.com/".to_string(),
                    description: None,
                })
                .await
                .unwrap();
            assert_eq!(created.id, 11, "backend {}", store.backend());
            assert_eq!(created.created_at, created.updated_at);
            assert_eq!(store.count(&TransactionFilter::default()).await.unwrap(), 11);
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_amount() {
        for store in seeded_backends().await {
            let result = store
                .insert(NewTransaction {
                    date: Utc::now(),
                    amount: f64::NAN,
                    category: Category::Revenue,
                    status: Status::Paid,
                    user_id: "user_001".to_string(),
                    user_profile: "p".to_string(),
                    description: None,
                })
                .await;
            assert!(result.is_err(), "backend {}", store.backend());
            assert_eq!(store.count(&TransactionFilter::default()).await.unwrap(), 10);
        }
    }

    #[tokio::test]
    async fn test_sum_amount_agrees() {
        let stores = seeded_backends().await;
        let filter = TransactionFilter::default().with_status(Status::Paid);
        let a = stores[0].sum_amount(&filter).await.unwrap();
        let b = stores[1].sum_amount(&filter).await.unwrap();
        assert!((a - b).abs() < 1e-9);

        let none = TransactionFilter {
            amount_from: Some(1_000_000.0),
            ..TransactionFilter::default()
        };
        assert_eq!(stores[0].sum_amount(&none).await.unwrap(), 0.0);
        assert_eq!(stores[1].sum_amount(&none).await.unwrap(), 0.0);
    }
}
