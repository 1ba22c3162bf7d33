//! SQLite connection pool and schema

use std::str::FromStr;
use std::time::Duration;

use finboard_config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::{CoreError, CoreResult};
use crate::filter::sql::fold;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY,
        date INTEGER NOT NULL,
        amount REAL NOT NULL,
        category TEXT NOT NULL,
        status TEXT NOT NULL,
        user_id TEXT NOT NULL,
        user_profile TEXT NOT NULL,
        description TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        user_id_folded TEXT NOT NULL DEFAULT '',
        description_folded TEXT NOT NULL DEFAULT ''
    )",
    "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)",
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        profile_photo TEXT,
        password_hash TEXT NOT NULL,
        salt TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
];

/// Shared SQLite pool with the finboard schema applied
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the configured database and create missing tables
    pub async fn connect(config: &DatabaseConfig) -> CoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| CoreError::StoreUnavailable {
                message: format!("invalid database url '{}': {}", config.url, e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| CoreError::StoreUnavailable {
                message: e.to_string(),
            })?;

        let db = Self { pool };
        db.migrate().await?;
        log::info!("Connected to database {}", config.url);
        Ok(db)
    }

    /// Private in-memory database, used by tests
    pub async fn in_memory() -> CoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> CoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.add_folded_columns().await?;
        log::debug!("Database schema up to date");
        Ok(())
    }

    /// Upgrade tables created before the search columns existed
    async fn add_folded_columns(&self) -> CoreResult<()> {
        let columns: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info('transactions')")
            .fetch_all(&self.pool)
            .await?;
        if columns.iter().any(|(name,)| name == "user_id_folded") {
            return Ok(());
        }

        log::info!("Adding search columns to transactions table");
        for column in ["user_id_folded", "description_folded"] {
            let statement = format!("ALTER TABLE transactions ADD COLUMN {} TEXT NOT NULL DEFAULT ''", column);
            sqlx::query(&statement).execute(&self.pool).await?;
        }

        let rows: Vec<(i64, String, Option<String>)> =
            sqlx::query_as("SELECT id, user_id, description FROM transactions")
                .fetch_all(&self.pool)
                .await?;
        let mut tx = self.pool.begin().await?;
        for (id, user_id, description) in rows {
            sqlx::query("UPDATE transactions SET user_id_folded = ?, description_folded = ? WHERE id = ?")
                .bind(fold(&user_id))
                .bind(fold(description.as_deref().unwrap_or("")))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool; later queries fail as unavailable
    pub async fn close(&self) {
        self.pool.close().await;
        log::debug!("SQLite pool closed");
    }
}
