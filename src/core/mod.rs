//! Domain types, the cache-aside layer and the aggregation engine

pub mod bank;
pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod period;
pub mod statement;
pub mod tax;

pub use bank::{Account, BankClient, Transaction};
pub use cache::{Cache, CacheLookup, CacheStore};
pub use currency::{CurrencyCode, CurrencyRate, CurrencyRateProvider};
pub use error::{Error, Result};
pub use period::Period;
pub use tax::{Aggregation, ErrorPolicy, IncomeAndTaxes, TaxCalculator, TaxRates, Taxes};
