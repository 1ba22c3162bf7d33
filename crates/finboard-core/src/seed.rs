//! Demo data for fresh installs

use crate::error::CoreResult;
use crate::models::NewTransaction;
use crate::query::{parse_instant, TransactionFilter};
use crate::store::TransactionStore;
use crate::types::{Category, Status};
use crate::users::{Role, StoredUser, UserStore};

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "password123";

const PROFILE_URL: &str = "https://thispersondoesnotexist.com/";

const DEMO_ROWS: [(&str, f64, Category, Status, &str, &str); 10] = [
    ("2024-01-15T08:34:12Z", 1500.0, Category::Revenue, Status::Paid, "user_001", "Consulting services"),
    ("2024-02-21T11:14:38Z", 1200.5, Category::Expense, Status::Paid, "user_002", "Office supplies"),
    ("2024-03-03T18:22:04Z", 300.75, Category::Revenue, Status::Pending, "user_003", "Product sales"),
    ("2024-04-10T05:03:11Z", 5000.0, Category::Expense, Status::Paid, "user_004", "Equipment purchase"),
    ("2024-05-20T12:01:45Z", 800.0, Category::Revenue, Status::Pending, "user_001", "Service fee"),
    ("2024-06-12T03:13:09Z", 2200.25, Category::Expense, Status::Paid, "user_002", "Marketing campaign"),
    ("2024-07-14T09:45:33Z", 900.0, Category::Revenue, Status::Pending, "user_003", "Subscription revenue"),
    ("2024-08-05T17:30:23Z", 150.0, Category::Expense, Status::Paid, "user_004", "Software license"),
    ("2024-09-10T02:10:59Z", 650.0, Category::Revenue, Status::Paid, "user_001", "Client payment"),
    ("2024-10-30T14:55:12Z", 1200.0, Category::Expense, Status::Pending, "user_002", "Travel expenses"),
];

/// The ten sample transactions, in id order
pub fn demo_transactions() -> Vec<NewTransaction> {
    DEMO_ROWS
        .iter()
        .map(|&(date, amount, category, status, user_id, description)| NewTransaction {
            date: parse_instant(date).unwrap_or_default(),
            amount,
            category,
            status,
            user_id: user_id.to_string(),
            user_profile: PROFILE_URL.to_string(),
            description: Some(description.to_string()),
        })
        .collect()
}

/// Insert the demo transactions when the store is empty; returns how many were added
pub async fn seed_transactions(store: &dyn TransactionStore) -> CoreResult<usize> {
    let existing = store.count(&TransactionFilter::default()).await?;
    if existing > 0 {
        log::debug!("Store already holds {} transactions, skipping seed", existing);
        return Ok(0);
    }
    let rows = demo_transactions();
    let count = rows.len();
    for tx in rows {
        store.insert(tx).await?;
    }
    log::info!("Seeded {} demo transactions ({})", count, store.backend());
    Ok(count)
}

/// Create the demo analyst account if it does not exist yet
pub async fn seed_demo_user(store: &dyn UserStore) -> CoreResult<bool> {
    if store.find_by_email(DEMO_EMAIL).await?.is_some() {
        log::debug!("Demo user already exists");
        return Ok(false);
    }
    store
        .insert(StoredUser::new(DEMO_EMAIL, "Demo User", Role::Analyst, DEMO_PASSWORD))
        .await?;
    log::info!("Created demo user {}", DEMO_EMAIL);
    Ok(true)
}
