//! Currency codes, rate quotes and the rate provider abstraction

use crate::core::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// ISO-4217 numeric currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(pub u16);

const SYMBOLS: &[(u16, &str)] = &[
    (980, "UAH"),
    (840, "USD"),
    (978, "EUR"),
    (985, "PLN"),
    (826, "GBP"),
];

impl CurrencyCode {
    pub const UAH: CurrencyCode = CurrencyCode(980);
    pub const USD: CurrencyCode = CurrencyCode(840);
    pub const EUR: CurrencyCode = CurrencyCode(978);

    /// Alphabetic symbol from the fixed code table, if known.
    pub fn symbol(&self) -> Option<&'static str> {
        SYMBOLS
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, symbol)| *symbol)
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed quote: one unit of `from` is worth `rate_buy` units of `to` when the bank buys it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    #[serde(rename = "currencyCodeA")]
    pub from: CurrencyCode,
    #[serde(rename = "currencyCodeB")]
    pub to: CurrencyCode,
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_buy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_sell: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_cross: Option<f64>,
}

impl CurrencyRate {
    pub fn matches(&self, from: CurrencyCode, to: CurrencyCode) -> bool {
        self.from == from && self.to == to
    }
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Result<CurrencyRate>;
}
