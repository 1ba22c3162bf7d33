//! Calendar month windows for dashboard statistics

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};

use crate::query::TransactionFilter;

/// Midnight UTC on the first day of the month containing `at`
pub fn month_start(at: DateTime<Utc>) -> DateTime<Utc> {
    let first = NaiveDate::from_ymd_opt(at.year(), at.month(), 1).unwrap_or_else(|| at.date_naive());
    first.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

/// First instant of the month `months` before the month containing `at`
pub fn months_back(at: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let start = month_start(at);
    start.checked_sub_months(Months::new(months)).unwrap_or(start)
}

/// `YYYY-MM` bucket label
pub fn month_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Half-open month range; `end == None` means open-ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl MonthWindow {
    /// From the start of the current month onward
    pub fn current(now: DateTime<Utc>) -> Self {
        Self {
            start: month_start(now),
            end: None,
        }
    }

    /// The whole of the previous calendar month
    pub fn previous(now: DateTime<Utc>) -> Self {
        let current = month_start(now);
        Self {
            start: months_back(now, 1),
            end: Some(current),
        }
    }

    /// Express the window as an inclusive date filter at millisecond precision
    pub fn to_filter(&self) -> TransactionFilter {
        let filter = TransactionFilter::default().since(self.start);
        match self.end {
            Some(end) => filter.until(end - Duration::milliseconds(1)),
            None => filter,
        }
    }
}
