//! Read-side helpers over a generated dataset: run summary, vintage
//! churn curves, usage segmentation and per-account time series.

use crate::{
    generator::{Dataset, UsageRecord},
    metrics::Metric,
    types::{AccountId, Tenure, YearMonth},
    window::ObservationWindow,
};
use serde::Serialize;
use std::collections::BTreeMap;

pub const HEAVY_CALLS_PER_MONTH: f64 = 120.0;
pub const LIGHT_CALLS_PER_MONTH: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub accounts:                     usize,
    pub churned_accounts:             usize,
    pub churn_rate:                   f64,
    pub usage_rows:                   usize,
    pub attribute_rows:               usize,
    pub avg_usage_months:             f64,
    pub accounts_with_package_change: usize,
}

pub fn dataset_summary(dataset: &Dataset) -> DatasetSummary {
    let accounts = dataset.accounts.len();
    let churned_accounts = dataset.churned_accounts();
    let ratio = |n: f64| if accounts == 0 { 0.0 } else { n / accounts as f64 };
    DatasetSummary {
        accounts,
        churned_accounts,
        churn_rate: ratio(churned_accounts as f64),
        usage_rows: dataset.usage.len(),
        attribute_rows: dataset.attributes.len(),
        avg_usage_months: ratio(dataset.usage.len() as f64),
        accounts_with_package_change: dataset
            .accounts
            .iter()
            .filter(|a| a.package_changes > 0)
            .count(),
    }
}

/// Cumulative churn for one signup cohort at one tenure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VintagePoint {
    pub vintage:               YearMonth,
    pub tenure:                Tenure,
    pub cohort_size:           usize,
    pub cumulative_churned:    usize,
    pub cumulative_churn_rate: f64,
}

/// Cumulative churn rate by (vintage, tenure) for cohorts of at least
/// `min_cohort_size` accounts. Each cohort is followed up to the last
/// tenure its members can be observed at inside `window`.
pub fn vintage_curves(
    dataset: &Dataset,
    window: &ObservationWindow,
    min_cohort_size: usize,
) -> Vec<VintagePoint> {
    let mut cohorts: BTreeMap<YearMonth, Vec<Option<Tenure>>> = BTreeMap::new();
    for account in &dataset.accounts {
        cohorts
            .entry(account.attributes.signup_month)
            .or_default()
            .push(account.churn.map(|p| p.churn_tenure));
    }

    let mut points = Vec::new();
    for (vintage, churn_tenures) in cohorts {
        let cohort_size = churn_tenures.len();
        if cohort_size < min_cohort_size.max(1) {
            continue;
        }
        let Ok(max_tenure) = Tenure::try_from(vintage.months_until(window.end)) else {
            continue;
        };
        for tenure in 0..=max_tenure {
            let cumulative_churned = churn_tenures
                .iter()
                .filter(|t| matches!(t, Some(ct) if *ct <= tenure))
                .count();
            points.push(VintagePoint {
                vintage,
                tenure,
                cohort_size,
                cumulative_churned,
                cumulative_churn_rate: cumulative_churned as f64 / cohort_size as f64,
            });
        }
    }
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum UsageSegment {
    Heavy,
    Medium,
    Light,
}

impl UsageSegment {
    pub fn from_avg_calls(avg_calls: f64) -> Self {
        if avg_calls > HEAVY_CALLS_PER_MONTH {
            Self::Heavy
        } else if avg_calls >= LIGHT_CALLS_PER_MONTH {
            Self::Medium
        } else {
            Self::Light
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heavy  => "Heavy",
            Self::Medium => "Medium",
            Self::Light  => "Light",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSegment {
    pub user_id:           AccountId,
    pub avg_monthly_calls: f64,
    pub segment:           UsageSegment,
}

/// Segment every account with at least one usage row by its average
/// monthly PHONE_TOTAL_CALLS. Ordered by user id.
pub fn segment_users(dataset: &Dataset) -> Vec<UserSegment> {
    let mut totals: BTreeMap<AccountId, (u64, u32)> = BTreeMap::new();
    for row in &dataset.usage {
        let entry = totals.entry(row.user_id).or_default();
        entry.0 += row.metrics.count(Metric::PhoneTotalCalls);
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(user_id, (calls, months))| {
            let avg_monthly_calls = calls as f64 / f64::from(months);
            UserSegment {
                user_id,
                avg_monthly_calls,
                segment: UsageSegment::from_avg_calls(avg_monthly_calls),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountTimeseries<'a> {
    pub user_id:      AccountId,
    pub signup_month: YearMonth,
    pub churn_date:   Option<YearMonth>,
    pub rows:         Vec<&'a UsageRecord>,
}

impl AccountTimeseries<'_> {
    /// Mean of `metric` over the last `n` rows (fewer if the series is shorter).
    pub fn trailing_mean(&self, metric: Metric, n: usize) -> Option<f64> {
        let tail = &self.rows[self.rows.len().saturating_sub(n)..];
        mean(tail.iter().map(|r| r.metrics.get(metric).map_or(0.0, |v| v.as_f64())))
    }

    pub fn lifetime_mean(&self, metric: Metric) -> Option<f64> {
        mean(self.rows.iter().map(|r| r.metrics.get(metric).map_or(0.0, |v| v.as_f64())))
    }
}

/// Usage rows of one account in month order, with its churn outcome.
pub fn account_timeseries(dataset: &Dataset, user_id: AccountId) -> Option<AccountTimeseries<'_>> {
    let account = dataset
        .accounts
        .iter()
        .find(|a| a.attributes.service_account_id == user_id)?;
    let mut rows: Vec<&UsageRecord> = dataset.usage_for(user_id).collect();
    rows.sort_by_key(|r| r.month);
    Some(AccountTimeseries {
        user_id,
        signup_month: account.attributes.signup_month,
        churn_date: account.churn.map(|p| p.churn_month),
        rows,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
