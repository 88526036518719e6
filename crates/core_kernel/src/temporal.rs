//! Calendar value types
//!
//! The ledger works at day granularity: due dates and payment dates are
//! plain calendar dates, and commissions are grouped by calendar month.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    #[error("Invalid commission month: {0} (expected YYYY-MM)")]
    InvalidFormat(String),
}

/// The calendar month a commission entry is accounted under
///
/// Defaults to the month the entry is recorded in, but is independently
/// editable by back office without touching the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommissionMonth {
    year: i32,
    month: u32,
}

impl CommissionMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, TemporalError> {
        if !(1..=12).contains(&month) {
            return Err(TemporalError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The month containing the given date
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current calendar month
    pub fn current() -> Self {
        Self::for_date(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for CommissionMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CommissionMonth {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| TemporalError::InvalidFormat(s.to_string()))?;
        let year = year
            .parse()
            .map_err(|_| TemporalError::InvalidFormat(s.to_string()))?;
        let month = month
            .parse()
            .map_err(|_| TemporalError::InvalidFormat(s.to_string()))?;
        Self::new(year, month)
    }
}
