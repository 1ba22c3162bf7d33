//! Utility functions and helpers

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a monetary amount with exactly two decimals
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// ISO-8601 timestamp with millisecond precision and a `Z` suffix
pub fn iso_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Rough size of a CSV export, e.g. `"12KB"`
pub fn estimated_file_size(records: u64, bytes_per_record: u64) -> String {
    let kb = (records * bytes_per_record) as f64 / 1024.0;
    format!("{}KB", kb.round() as u64)
}

/// Download file name for an export produced on `day`
pub fn export_filename(day: NaiveDate) -> String {
    format!("transactions_export_{}.csv", day.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1500.0), "1500.00");
        assert_eq!(format_amount(1200.5), "1200.50");
        assert_eq!(format_amount(300.75), "300.75");
    }

    #[test]
    fn test_iso_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 8, 34, 12).unwrap();
        assert_eq!(iso_timestamp(&at), "2024-01-15T08:34:12.000Z");
    }

    #[test]
    fn test_estimated_file_size() {
        assert_eq!(estimated_file_size(0, 150), "0KB");
        assert_eq!(estimated_file_size(10, 150), "1KB");
        assert_eq!(estimated_file_size(1000, 150), "146KB");
    }

    #[test]
    fn test_export_filename() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_filename(day), "transactions_export_2024-03-09.csv");
    }
}
