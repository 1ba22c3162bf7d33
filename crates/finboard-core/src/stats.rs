//! Dashboard statistics and monthly chart series
//!
//! Everything here goes through [`TransactionStore`], so the numbers are the
//! same whichever backend is active. Sums only count `Paid` transactions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::CoreResult;
use crate::query::{Sort, SortField, SortOrder, TransactionFilter};
use crate::store::TransactionStore;
use crate::time::{month_key, months_back, MonthWindow};
use crate::types::{Category, Status};

pub const DEFAULT_CHART_PERIOD: u32 = 12;
pub const MAX_CHART_PERIOD: u32 = 24;

/// Headline numbers for the current month
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub net_income: f64,
    /// Transactions of any status dated this month
    pub transaction_count: u64,
    /// Percent change against last month
    pub revenue_growth: f64,
    pub expense_growth: f64,
}

/// Percent change; zero when there is no previous amount to compare with
pub fn growth(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

async fn paid_total(store: &dyn TransactionStore, window: &MonthWindow, category: Category) -> CoreResult<f64> {
    let filter = window.to_filter().with_category(category).with_status(Status::Paid);
    store.sum_amount(&filter).await
}

pub async fn dashboard_stats(store: &dyn TransactionStore, now: DateTime<Utc>) -> CoreResult<DashboardStats> {
    let current = MonthWindow::current(now);
    let previous = MonthWindow::previous(now);

    let total_revenue = paid_total(store, &current, Category::Revenue).await?;
    let total_expenses = paid_total(store, &current, Category::Expense).await?;
    let transaction_count = store.count(&current.to_filter()).await?;
    let last_revenue = paid_total(store, &previous, Category::Revenue).await?;
    let last_expenses = paid_total(store, &previous, Category::Expense).await?;

    Ok(DashboardStats {
        total_revenue,
        total_expenses,
        net_income: total_revenue - total_expenses,
        transaction_count,
        revenue_growth: growth(total_revenue, last_revenue),
        expense_growth: growth(total_expenses, last_expenses),
    })
}

/// Paid totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: f64,
    pub expenses: f64,
}

/// Number of months to chart: `[1, 24]`, defaulting to 12
pub fn chart_period(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.trunc().clamp(1.0, f64::from(MAX_CHART_PERIOD)) as u32)
        .unwrap_or(DEFAULT_CHART_PERIOD)
}

/// Monthly paid revenue and expenses from the first day of the month `period`
/// months ago, oldest first; months without paid transactions are left out
pub async fn chart_data(
    store: &dyn TransactionStore,
    period: u32,
    now: DateTime<Utc>,
) -> CoreResult<Vec<ChartPoint>> {
    let period = period.clamp(1, MAX_CHART_PERIOD);
    let filter = TransactionFilter::default()
        .since(months_back(now, period))
        .with_status(Status::Paid);
    let transactions = store
        .find_all(&filter, &Sort::new(SortField::Date, SortOrder::Asc))
        .await?;

    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for tx in &transactions {
        let entry = months.entry(month_key(&tx.date)).or_insert((0.0, 0.0));
        match tx.category {
            Category::Revenue => entry.0 += tx.amount,
            Category::Expense => entry.1 += tx.amount,
        }
    }

    Ok(months
        .into_iter()
        .map(|(month, (revenue, expenses))| ChartPoint {
            month,
            revenue,
            expenses,
        })
        .collect())
}
