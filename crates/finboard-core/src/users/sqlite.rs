//! SQLite-backed user store

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::SqlitePool;

use super::{StoredUser, User, UserStore};
use crate::error::{CoreError, CoreResult};

const USER_COLUMNS: &str = "id, email, name, role, profile_photo, password_hash, salt, created_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    role: String,
    profile_photo: Option<String>,
    password_hash: String,
    salt: String,
    created_at: i64,
}

impl TryFrom<UserRow> for StoredUser {
    type Error = CoreError;

    fn try_from(row: UserRow) -> CoreResult<Self> {
        let created_at = DateTime::from_timestamp_millis(row.created_at).ok_or_else(|| CoreError::Database {
            message: format!("created_at out of range: {}", row.created_at),
        })?;
        Ok(StoredUser {
            user: User {
                id: row.id,
                email: row.email,
                name: row.name,
                role: row.role.parse().map_err(|message| CoreError::Database { message })?,
                profile_photo: row.profile_photo,
                created_at,
            },
            password_hash: row.password_hash,
            salt: row.salt,
        })
    }
}

/// Users held in the `users` table
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, column: &str, value: &str) -> CoreResult<Option<StoredUser>> {
        let statement = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        let row: Option<UserRow> = sqlx::query_as(&statement)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(StoredUser::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<StoredUser>> {
        self.fetch_one_where("email", email).await
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<User>> {
        Ok(self.fetch_one_where("id", id).await?.map(|stored| stored.user))
    }

    async fn insert(&self, stored: StoredUser) -> CoreResult<User> {
        let user = &stored.user;
        let result = sqlx::query(&format!(
            "INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            USER_COLUMNS
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.profile_photo.as_deref())
        .bind(&stored.password_hash)
        .bind(&stored.salt)
        .bind(user.created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(stored.user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(CoreError::UserExists {
                email: stored.user.email,
            }),
            Err(e) => Err(e.into()),
        }
    }
}
