//! Error kinds surfaced by the bank clients, the cache layer and the aggregation engine.

use crate::core::currency::CurrencyCode;
use std::fmt::Display;
use thiserror::Error;

/// Provider call site a fetch failure originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Accounts,
    Transactions,
    CurrencyRates,
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Resource::Accounts => "accounts",
                Resource::Transactions => "transactions",
                Resource::CurrencyRates => "currency rates",
            }
        )
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Accounts not found in provider response")]
    AccountsNotFound,

    #[error("No business accounts in a foreign currency found")]
    EligibleAccountsNotFound,

    #[error("Transactions not found for account {account_id} in range {from}..{to}")]
    TransactionsNotFound { account_id: String, from: i64, to: i64 },

    #[error("Failed to fetch {resource}: HTTP {status}")]
    FetchFailed { resource: Resource, status: u16 },

    #[error("Request for {resource} failed: {source}")]
    Request {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },

    #[error("Currency rate not found for pair {from} -> {to}")]
    CurrencyRateNotFound { from: CurrencyCode, to: CurrencyCode },

    #[error("Cache store error: {0}")]
    Cache(String),

    #[error("Failed to set expiration for cache key: {0}")]
    CacheExpirationFailed(String),

    #[error("Aggregation failed for bank {bank_id}: {source}")]
    AggregationFailed {
        bank_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    pub fn aggregation(bank_id: impl Into<String>, source: Error) -> Self {
        Self::AggregationFailed {
            bank_id: bank_id.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
