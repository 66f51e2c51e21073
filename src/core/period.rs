//! Lookback periods and unit conversions

use anyhow::anyhow;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

pub const DAYS_PER_WEEK: f64 = 7.0;
pub const DAYS_PER_MONTH: f64 = 30.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// An approximate lookback window. Not meant for calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Months(f64),
    Years(f64),
    Weeks(f64),
    Days(f64),
}

impl Period {
    pub fn as_days(&self) -> f64 {
        match *self {
            Period::Days(d) => d,
            Period::Weeks(w) => w * DAYS_PER_WEEK,
            Period::Months(m) => m * DAYS_PER_MONTH,
            Period::Years(y) => y * MONTHS_PER_YEAR * DAYS_PER_MONTH,
        }
    }

    pub fn as_months(&self) -> f64 {
        match *self {
            Period::Months(m) => m,
            Period::Years(y) => y * MONTHS_PER_YEAR,
            Period::Weeks(_) | Period::Days(_) => self.as_days() / DAYS_PER_MONTH,
        }
    }

    pub fn to_months(self) -> Period {
        Period::Months(self.as_months())
    }

    pub fn to_years(self) -> Period {
        Period::Years(self.as_months() / MONTHS_PER_YEAR)
    }

    pub fn to_weeks(self) -> Period {
        Period::Weeks(self.as_days() / DAYS_PER_WEEK)
    }

    pub fn to_days(self) -> Period {
        Period::Days(self.as_days())
    }

    /// The quantity in the period's own unit.
    pub fn value(&self) -> f64 {
        match *self {
            Period::Months(v) | Period::Years(v) | Period::Weeks(v) | Period::Days(v) => v,
        }
    }

    /// Rejects quantities that cannot describe a lookback window: NaN, infinite or negative.
    pub fn validate(self) -> anyhow::Result<Self> {
        let value = self.value();
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow!("Period must be a finite, non-negative quantity, got {}", self));
        }
        Ok(self)
    }

    pub fn to_duration(&self) -> Duration {
        Duration::seconds((self.as_days() * 86_400.0).round() as i64)
    }

    /// Rendering used in cache keys: the quantity in months, so `Months(3.0)` becomes `3`.
    pub fn cache_key(&self) -> String {
        format!("{}", self.as_months())
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Months(v) => write!(f, "{v} month(s)"),
            Period::Years(v) => write!(f, "{v} year(s)"),
            Period::Weeks(v) => write!(f, "{v} week(s)"),
            Period::Days(v) => write!(f, "{v} day(s)"),
        }
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(s.len());
        let (value, unit) = s.split_at(split);
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid period: {}", s))?;
        let period = match unit {
            "" | "m" | "mo" | "month" | "months" => Period::Months(value),
            "y" | "year" | "years" => Period::Years(value),
            "w" | "week" | "weeks" => Period::Weeks(value),
            "d" | "day" | "days" => Period::Days(value),
            _ => return Err(anyhow!("Invalid period unit: {}", unit)),
        };
        period.validate()
    }
}
