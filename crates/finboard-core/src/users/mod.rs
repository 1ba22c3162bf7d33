//! Dashboard users and credential checks
//!
//! Passwords are kept as a hex SHA-256 digest of `salt || password` with a
//! random 16-byte salt per user.

pub mod file;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use finboard_config::AuthConfig;

use crate::error::{CoreError, CoreResult};
use crate::models::iso_millis;
use crate::store::Database;

pub use file::FileUserStore;
pub use sqlite::SqliteUserStore;

/// Access role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Analyst,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Analyst => "analyst",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analyst" => Ok(Role::Analyst),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Public view of a user; never carries credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(rename = "profilePhoto", default)]
    pub profile_photo: Option<String>,
    #[serde(rename = "createdAt", serialize_with = "iso_millis::serialize")]
    pub created_at: DateTime<Utc>,
}

/// A user plus password material, as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    pub salt: String,
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

impl StoredUser {
    /// New user with a freshly salted password and a random id
    pub fn new(email: &str, name: &str, role: Role, password: &str) -> Self {
        let salt: [u8; 16] = rand::random();
        Self {
            user: User {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.to_string(),
                name: name.to_string(),
                role,
                profile_photo: None,
                created_at: crate::query::truncate_to_millis(Utc::now()),
            },
            password_hash: hex::encode(digest(&salt, password)),
            salt: hex::encode(salt),
        }
    }

    /// Constant-time password check; malformed stored material never matches
    pub fn verify_password(&self, password: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (hex::decode(&self.salt), hex::decode(&self.password_hash)) else {
            return false;
        };
        digest(&salt, password).ct_eq(&expected).into()
    }
}

/// User persistence shared by the SQLite and file backends
#[async_trait]
pub trait UserStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<StoredUser>>;

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<User>>;

    /// Store a user; an existing email fails with [`CoreError::UserExists`]
    async fn insert(&self, user: StoredUser) -> CoreResult<User>;
}

pub type UserStoreRef = Arc<dyn UserStore>;

/// User backend for an optional database connection; without one, users live in `users_file`
pub async fn user_store(database: Option<&Database>, auth: &AuthConfig) -> CoreResult<UserStoreRef> {
    match database {
        Some(db) => Ok(Arc::new(SqliteUserStore::new(db.pool().clone()))),
        None => Ok(Arc::new(FileUserStore::open(&auth.users_file).await?)),
    }
}

/// Sign-up payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Create an analyst account
pub async fn register(
    store: &dyn UserStore,
    registration: Registration,
    min_password_length: usize,
) -> CoreResult<User> {
    let email = registration.email.trim();
    let name = registration.name.trim();
    if email.is_empty() || registration.password.is_empty() || name.is_empty() {
        return Err(CoreError::validation("Email, password, and name are required"));
    }
    if registration.password.chars().count() < min_password_length {
        return Err(CoreError::validation(format!(
            "Password must be at least {} characters long",
            min_password_length
        )));
    }
    if store.find_by_email(email).await?.is_some() {
        return Err(CoreError::UserExists {
            email: email.to_string(),
        });
    }

    let user = store
        .insert(StoredUser::new(email, name, Role::Analyst, &registration.password))
        .await?;
    log::info!("Registered user {} ({})", user.id, user.email);
    Ok(user)
}

/// Check an email/password pair
pub async fn authenticate(store: &dyn UserStore, email: &str, password: &str) -> CoreResult<User> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(CoreError::validation("Email and password are required"));
    }
    match store.find_by_email(email).await? {
        Some(stored) if stored.verify_password(password) => Ok(stored.user),
        _ => Err(CoreError::InvalidCredentials),
    }
}
