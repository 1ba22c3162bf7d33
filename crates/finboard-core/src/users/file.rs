//! JSON-file user store for running without a database

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::{Role, StoredUser, User, UserStore};
use crate::error::{CoreError, CoreResult};
use crate::seed::{DEMO_EMAIL, DEMO_PASSWORD};

/// Accounts available out of the box
fn default_users() -> Vec<StoredUser> {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    [
        ("demo_user_1", DEMO_EMAIL, "Demo User", Role::Analyst),
        ("admin_user_1", "admin@example.com", "Admin User", Role::Admin),
    ]
    .into_iter()
    .map(|(id, email, name, role)| {
        let mut stored = StoredUser::new(email, name, role, DEMO_PASSWORD);
        stored.user.id = id.to_string();
        stored.user.created_at = created_at;
        stored
    })
    .collect()
}

/// Users kept in memory and mirrored to a JSON file after every change
#[derive(Debug)]
pub struct FileUserStore {
    path: PathBuf,
    users: RwLock<Vec<StoredUser>>,
}

impl FileUserStore {
    /// Load users from `path`; a missing file is created with the default accounts
    pub async fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let users = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Vec<StoredUser>>(&content) {
                Ok(users) => users,
                Err(e) => {
                    log::warn!("Failed to parse {}, using default users: {}", path.display(), e);
                    default_users()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let users = default_users();
                Self::save(&path, &users).await?;
                log::info!("Created user file {} with default users", path.display());
                users
            }
            Err(e) => return Err(e.into()),
        };

        log::debug!("Loaded {} users from {}", users.len(), path.display());
        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    /// Store with no accounts; nothing is written until the first insert
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            users: RwLock::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(path: &Path, users: &[StoredUser]) -> CoreResult<()> {
        let content = serde_json::to_string_pretty(users)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<StoredUser>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.user.id == id).map(|u| u.user.clone()))
    }

    async fn insert(&self, stored: StoredUser) -> CoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.user.email == stored.user.email) {
            return Err(CoreError::UserExists {
                email: stored.user.email,
            });
        }
        let user = stored.user.clone();
        users.push(stored);
        if let Err(e) = Self::save(&self.path, &users).await {
            users.pop();
            log::error!("Failed to save users to {}: {}", self.path.display(), e);
            return Err(e);
        }
        Ok(user)
    }
}
