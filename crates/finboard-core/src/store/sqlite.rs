//! SQLite-backed transaction store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query::QueryAs;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool};

use super::TransactionStore;
use crate::error::{CoreError, CoreResult};
use crate::filter::sql::{self, fold, SqlFragment, SqlParam, FOLDED_COLUMNS, TRANSACTION_COLUMNS};
use crate::models::{NewTransaction, Page, Transaction};
use crate::query::{Sort, TransactionFilter, TransactionQuery};

/// Raw `transactions` row; instants are stored as epoch milliseconds
#[derive(Debug, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub date: i64,
    pub amount: f64,
    pub category: String,
    pub status: String,
    pub user_id: String,
    pub user_profile: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

fn instant(millis: i64, column: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| CoreError::Database {
        message: format!("{} out of range: {}", column, millis),
    })
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = CoreError;

    fn try_from(row: TransactionRow) -> CoreResult<Self> {
        let corrupt = |message: String| CoreError::Database { message };
        Ok(Transaction {
            id: u64::try_from(row.id).map_err(|_| corrupt(format!("negative id {}", row.id)))?,
            date: instant(row.date, "date")?,
            amount: row.amount,
            category: row.category.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            user_id: row.user_id,
            user_profile: row.user_profile,
            description: row.description,
            created_at: instant(row.created_at, "created_at")?,
            updated_at: instant(row.updated_at, "updated_at")?,
        })
    }
}

fn bind_params<'q, O>(
    mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    params: &'q [SqlParam],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Real(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// Transactions held in the `transactions` table
#[derive(Debug, Clone)]
pub struct SqliteTransactionStore {
    pool: SqlitePool,
}

impl SqliteTransactionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(&self, fragment: &SqlFragment) -> CoreResult<Vec<Transaction>> {
        log::trace!("SQL: {}", fragment.sql);
        let rows: Vec<TransactionRow> =
            bind_params(sqlx::query_as(&fragment.sql), &fragment.params)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }
}

#[async_trait]
impl TransactionStore for SqliteTransactionStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn query(&self, query: &TransactionQuery) -> CoreResult<Page<Transaction>> {
        let page = sql::select_page(query);
        let count = sql::count(&query.filter);
        log::trace!("SQL: {}", page.sql);

        // page and total read from one snapshot
        let mut tx = self.pool.begin().await?;
        let rows: Vec<TransactionRow> = bind_params(sqlx::query_as(&page.sql), &page.params)
            .fetch_all(&mut *tx)
            .await?;
        let (total,): (i64,) = bind_params(sqlx::query_as(&count.sql), &count.params)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        let data = rows
            .into_iter()
            .map(Transaction::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Page::new(data, total.max(0) as u64, &query.pagination))
    }

    async fn find_all(&self, filter: &TransactionFilter, sort: &Sort) -> CoreResult<Vec<Transaction>> {
        self.fetch_rows(&sql::select_all(filter, sort)).await
    }

    async fn count(&self, filter: &TransactionFilter) -> CoreResult<u64> {
        let fragment = sql::count(filter);
        let (count,): (i64,) = bind_params(sqlx::query_as(&fragment.sql), &fragment.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn sum_amount(&self, filter: &TransactionFilter) -> CoreResult<f64> {
        let fragment = sql::sum_amount(filter);
        let (sum,): (f64,) = bind_params(sqlx::query_as(&fragment.sql), &fragment.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(sum)
    }

    async fn insert(&self, new: NewTransaction) -> CoreResult<Transaction> {
        let new = new.validated()?;
        let now = Utc::now().timestamp_millis();

        // id assignment and insert happen in one statement
        let statement = format!(
            "INSERT INTO transactions ({cols}, {folded}) \
             SELECT COALESCE(MAX(id), 0) + 1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ? FROM transactions \
             RETURNING {cols}",
            cols = TRANSACTION_COLUMNS,
            folded = FOLDED_COLUMNS
        );
        let row: TransactionRow = sqlx::query_as(&statement)
            .bind(new.date.timestamp_millis())
            .bind(new.amount)
            .bind(new.category.as_str())
            .bind(new.status.as_str())
            .bind(&new.user_id)
            .bind(&new.user_profile)
            .bind(new.description.as_deref())
            .bind(now)
            .bind(now)
            .bind(fold(&new.user_id))
            .bind(fold(new.description.as_deref().unwrap_or("")))
            .fetch_one(&self.pool)
            .await?;

        let created = Transaction::try_from(row)?;
        log::debug!("Inserted transaction {} for {}", created.id, created.user_id);
        Ok(created)
    }
}
