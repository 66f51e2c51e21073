pub mod api;

use crate::core::bank::{Account, BankClient, eligible_accounts};
use crate::core::cache::{Cache, keys};
use crate::core::currency::{CurrencyCode, CurrencyRate, CurrencyRateProvider};
use crate::core::error::{Error, Result};
use crate::core::period::Period;
use crate::core::statement::{Throttle, TransactionFetcher};
use api::MonobankApi;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_BANK_ID: &str = "monobank";

pub struct MonobankClient {
    id: String,
    api: Arc<MonobankApi>,
    cache: Cache,
    fetcher: TransactionFetcher,
    home_currency: CurrencyCode,
}

impl MonobankClient {
    pub fn new(
        id: &str,
        api: MonobankApi,
        cache: Cache,
        throttle: Arc<dyn Throttle>,
        home_currency: CurrencyCode,
    ) -> Self {
        let api = Arc::new(api);
        let fetcher = TransactionFetcher::new(api.clone(), cache.clone(), throttle);
        Self {
            id: id.to_string(),
            api,
            cache,
            fetcher,
            home_currency,
        }
    }

    fn accounts_key(&self) -> String {
        // Extra clients get their own entry so different tokens never share an account list.
        if self.id == DEFAULT_BANK_ID {
            keys::accounts()
        } else {
            format!("{}:{}", keys::accounts(), self.id)
        }
    }

    /// Accounts not held in the home currency.
    pub async fn get_accounts_with_foreign_currencies(&self) -> Result<Vec<Account>> {
        self.cache
            .get_or_fetch(&self.accounts_key(), || async {
                let info = self.api.fetch_client_info().await?;
                info!("Fetched personal info for client {}", info.client_id);

                let accounts = info.accounts.ok_or(Error::AccountsNotFound)?;
                Ok(accounts
                    .into_iter()
                    .filter(|account| account.currency_code != self.home_currency)
                    .collect::<Vec<_>>())
            })
            .await
    }

    pub async fn get_eligible_accounts(&self) -> Result<Vec<Account>> {
        let accounts = self.get_accounts_with_foreign_currencies().await?;
        let eligible = eligible_accounts(&accounts, self.home_currency);
        if eligible.is_empty() {
            return Err(Error::EligibleAccountsNotFound);
        }
        info!("Found {} FOP accounts", eligible.len());
        Ok(eligible)
    }
}

#[async_trait]
impl CurrencyRateProvider for MonobankClient {
    async fn get_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Result<CurrencyRate> {
        self.cache
            .get_or_fetch(&keys::currency_rate(from, to), || async {
                let rates = self.api.fetch_currency_rates().await?;
                let rate = rates
                    .into_iter()
                    .find(|rate| rate.matches(from, to) && rate.rate_buy.is_some())
                    .ok_or(Error::CurrencyRateNotFound { from, to })?;

                info!(
                    "Found currency rate for pair {} to {}: {:?}",
                    from.symbol().unwrap_or("?"),
                    to.symbol().unwrap_or("?"),
                    rate.rate_buy
                );
                Ok(rate)
            })
            .await
    }
}

#[async_trait]
impl BankClient for MonobankClient {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(name = "MonobankIncome", skip(self), fields(bank_id = %self.id))]
    async fn get_income_by_period(&self, period: Period) -> Result<Vec<f64>> {
        let accounts = self.get_eligible_accounts().await?;
        let mut incomes = Vec::new();

        for account in &accounts {
            info!(
                "Fetching transactions for account {} in {}",
                account.id,
                account.currency_code.symbol().unwrap_or("?")
            );

            let rate = self.get_rate(account.currency_code, self.home_currency).await?;
            let rate_buy = rate.rate_buy.ok_or(Error::CurrencyRateNotFound {
                from: rate.from,
                to: rate.to,
            })?;

            let transactions = self.fetcher.fetch_period(&account.id, &period).await?;
            incomes.extend(
                transactions
                    .iter()
                    .filter(|tx| tx.is_income())
                    .map(|tx| tx.operation_amount as f64 * rate_buy),
            );
        }

        Ok(incomes)
    }
}
