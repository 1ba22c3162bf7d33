//! Core transaction processing: query parsing, storage backends, statistics,
//! CSV export and user accounts

pub mod error;
pub mod export;
pub mod filter;
pub mod models;
pub mod query;
pub mod seed;
pub mod stats;
pub mod store;
pub mod time;
pub mod types;
pub mod users;

pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorKind, ErrorLogger, ErrorSeverity};
pub use models::{NewTransaction, Page, Transaction};
pub use query::{Pagination, Sort, SortField, SortOrder, TransactionFilter, TransactionQuery};
pub use store::{Database, TransactionStore, TransactionStoreRef};
pub use types::{Category, Status};
pub use users::{User, UserStore, UserStoreRef};

/// Active storage backends for one server process
#[derive(Clone)]
pub struct Stores {
    pub transactions: TransactionStoreRef,
    pub users: UserStoreRef,
    /// Present when the SQLite backend is in use
    pub database: Option<Database>,
}

impl Stores {
    /// Pick backends from config: SQLite when reachable, otherwise memory and the users file
    pub async fn open(config: &finboard_config::Config) -> CoreResult<Self> {
        let database = store::connect_database(&config.database).await;
        let transactions = store::transaction_store(database.as_ref());
        let users = users::user_store(database.as_ref(), &config.auth).await?;
        log::info!(
            "Using {} transaction store and {} user store",
            transactions.backend(),
            users.backend()
        );
        Ok(Self {
            transactions,
            users,
            database,
        })
    }

    /// In-memory stores with no persistence, for tests and demos
    pub fn in_memory(users_file: impl Into<std::path::PathBuf>) -> Self {
        Self {
            transactions: std::sync::Arc::new(store::MemoryTransactionStore::new()),
            users: std::sync::Arc::new(users::FileUserStore::empty(users_file)),
            database: None,
        }
    }

    /// Load demo data into empty stores
    pub async fn seed(&self) -> CoreResult<()> {
        seed::seed_transactions(self.transactions.as_ref()).await?;
        seed::seed_demo_user(self.users.as_ref()).await?;
        Ok(())
    }

    pub fn database_connected(&self) -> bool {
        self.database.is_some()
    }

    pub async fn close(&self) {
        if let Some(ref db) = self.database {
            db.close().await;
        }
    }
}
