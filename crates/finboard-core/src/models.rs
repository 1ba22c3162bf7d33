//! Core data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::query::{parse_instant, truncate_to_millis, Pagination};
use crate::types::{Category, Status};

/// Serialize instants the way the dashboard expects: `2024-01-15T08:34:12.000Z`
pub(crate) mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&finboard_utils::iso_timestamp(at))
    }
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

/// A financial record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sequential identifier, unique per store
    pub id: u64,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub date: DateTime<Utc>,
    /// Non-negative amount
    pub amount: f64,
    pub category: Category,
    pub status: Status,
    /// Owning user
    pub user_id: String,
    /// Profile image reference
    pub user_profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "createdAt", serialize_with = "iso_millis::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", serialize_with = "iso_millis::serialize")]
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a transaction; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransaction {
    #[serde(deserialize_with = "deserialize_instant")]
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub category: Category,
    pub status: Status,
    pub user_id: String,
    pub user_profile: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewTransaction {
    /// Check field constraints and normalize values before storage
    pub fn validated(mut self) -> CoreResult<Self> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(CoreError::validation("Amount must be a non-negative number"));
        }
        if self.user_id.trim().is_empty() {
            return Err(CoreError::validation("user_id is required"));
        }
        if self.user_profile.trim().is_empty() {
            return Err(CoreError::validation("user_profile is required"));
        }

        self.date = truncate_to_millis(self.date);
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(self)
    }

    /// Build the stored record
    pub fn into_transaction(self, id: u64, now: DateTime<Utc>) -> Transaction {
        let now = truncate_to_millis(now);
        Transaction {
            id,
            date: self.date,
            amount: self.amount,
            category: self.category,
            status: self.status,
            user_id: self.user_id,
            user_profile: self.user_profile,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One page of results plus page metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Matches before pagination
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        let limit = u64::from(pagination.limit());
        Self {
            data,
            total,
            page: pagination.page(),
            limit: pagination.limit(),
            total_pages: total.div_ceil(limit),
        }
    }

    /// Result returned when the store cannot be queried
    pub fn empty(pagination: &Pagination) -> Self {
        Self::new(Vec::new(), 0, pagination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> NewTransaction {
        NewTransaction {
            date: Utc.with_ymd_and_hms(2024, 1, 15, 8, 34, 12).unwrap(),
            amount: 1500.0,
            category: Category::Revenue,
            status: Status::Paid,
            user_id: "user_001".to_string(),
            user_profile: "https://thispersondoesnotexist.com/".to_string(),
            description: Some("  Consulting services ".to_string()),
        }
    }

    #[test]
    fn test_validated_trims_description() {
        let tx = sample().validated().unwrap();
        assert_eq!(tx.description.as_deref(), Some("Consulting services"));
    }

    #[test]
    fn test_blank_description_becomes_none() {
        let mut tx = sample();
        tx.description = Some("   ".to_string());
        assert_eq!(tx.validated().unwrap().description, None);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut tx = sample();
        tx.amount = -1.0;
        assert!(matches!(tx.validated(), Err(CoreError::Validation { .. })));
    }

    #[test]
    fn test_missing_user_rejected() {
        let mut tx = sample();
        tx.user_id = " ".to_string();
        assert!(tx.validated().is_err());
    }

    #[test]
    fn test_deserialize_accepts_plain_date() {
        let json = r#"{"date":"2024-05-20","amount":800,"category":"Revenue","status":"Pending","user_id":"u","user_profile":"p"}"#;
        let tx: NewTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.date, Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap());
        assert_eq!(tx.description, None);
    }

    #[test]
    fn test_transaction_json_shape() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let tx = sample().validated().unwrap().into_transaction(7, now);
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["date"], "2024-01-15T08:34:12.000Z");
        assert_eq!(value["createdAt"], "2024-02-01T00:00:00.000Z");
        assert_eq!(value["category"], "Revenue");
    }

    #[test]
    fn test_page_total_pages() {
        let pagination = Pagination::new(Some(2), Some(3), 10);
        let page: Page<u32> = Page::new(vec![4, 5, 6], 7, &pagination);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        let empty: Page<u32> = Page::empty(&pagination);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.limit, 3);
    }
}
