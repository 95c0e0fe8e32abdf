//! Shared primitive types used across the whole generator.

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Service account identifier. Doubles as `USERID` in usage and churn tables.
pub type AccountId = u64;

/// Months elapsed since an account's signup month (0 = signup month).
pub type Tenure = u32;

/// A calendar month. Ordered chronologically.
///
/// Parses from `"YYYY-MM"` or any `"YYYY-MM-DD"` date (the day is dropped),
/// and always renders as the first of the month, `"YYYY-MM-01"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year:  i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(Self::from_date(date));
        }
        let (year, month) = s.split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    /// Calendar month, 1 = January.
    pub fn month(&self) -> u32 { self.month }

    /// Calendar position, 0 = January .. 11 = December.
    pub fn month0(&self) -> u32 { self.month - 1 }

    pub fn add_months(&self, n: u32) -> Self {
        Self::from_ordinal(self.ordinal() + i64::from(n))
    }

    /// Signed number of months from `self` to `later`.
    pub fn months_until(&self, later: YearMonth) -> i64 {
        later.ordinal() - self.ordinal()
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month0())
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year:  ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-01", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        YearMonth::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid month '{raw}', expected YYYY-MM")))
    }
}

/// Service-account status carried on every monthly attribute row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
    Churned,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active    => "Active",
            Self::Suspended => "Suspended",
            Self::Closed    => "Closed",
            Self::Churned   => "Churned",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_arithmetic_crosses_year_boundaries() {
        let nov = YearMonth::new(2023, 11).unwrap();
        assert_eq!(nov.add_months(2), YearMonth::new(2024, 1).unwrap());
        assert_eq!(nov.add_months(14), YearMonth::new(2025, 1).unwrap());
        assert_eq!(nov.months_until(YearMonth::new(2025, 1).unwrap()), 14);
        assert_eq!(YearMonth::new(2025, 1).unwrap().months_until(nov), -14);
    }

    #[test]
    fn parses_month_and_date_forms() {
        let a = YearMonth::parse("2021-01").unwrap();
        let b = YearMonth::parse("2021-01-17").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2021-01-01");
        assert!(YearMonth::parse("2021-13").is_none());
        assert!(YearMonth::parse("junk").is_none());
    }

    #[test]
    fn serde_round_trips_through_display_form() {
        let m = YearMonth::new(2024, 7).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"2024-07-01\"");
        let back: YearMonth = serde_json::from_str("\"2024-07\"").unwrap();
        assert_eq!(back, m);
    }
}
