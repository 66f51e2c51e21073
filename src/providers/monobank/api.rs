//! Monobank personal API wire calls.

use crate::core::bank::{Account, Transaction};
use crate::core::currency::CurrencyRate;
use crate::core::error::{Error, Resource, Result};
use crate::core::statement::StatementSource;
use crate::providers::util::RetryPolicy;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

const TOKEN_HEADER: &str = "X-Token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_id: String,
    #[serde(default)]
    pub accounts: Option<Vec<Account>>,
}

pub struct MonobankApi {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl MonobankApi {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent("taxcalc/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn accounts_url(&self) -> String {
        format!("{}/personal/client-info", self.base_url)
    }

    pub fn currency_url(&self) -> String {
        format!("{}/bank/currency", self.base_url)
    }

    pub fn statement_url(&self, account_id: &str, from: i64, to: i64) -> String {
        format!(
            "{}/personal/statement/{}/{}/{}",
            self.base_url, account_id, from, to
        )
    }

    pub async fn fetch_client_info(&self) -> Result<ClientInfo> {
        let url = self.accounts_url();
        debug!("Requesting client info from {}", url);

        let response = self
            .retry
            .run(|| self.client.get(&url).header(TOKEN_HEADER, &self.token).send())
            .await
            .map_err(|source| Error::Request {
                resource: Resource::Accounts,
                source,
            })?;

        let response = ensure_success(response, Resource::Accounts)?;
        response.json().await.map_err(|source| Error::Request {
            resource: Resource::Accounts,
            source,
        })
    }

    pub async fn fetch_currency_rates(&self) -> Result<Vec<CurrencyRate>> {
        let url = self.currency_url();
        debug!("Requesting currency rates from {}", url);

        let response = self
            .retry
            .run(|| self.client.post(&url).send())
            .await
            .map_err(|source| Error::Request {
                resource: Resource::CurrencyRates,
                source,
            })?;

        let response = ensure_success(response, Resource::CurrencyRates)?;
        response.json().await.map_err(|source| Error::Request {
            resource: Resource::CurrencyRates,
            source,
        })
    }
}

fn ensure_success(response: Response, resource: Resource) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::FetchFailed {
            resource,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

#[async_trait]
impl StatementSource for MonobankApi {
    #[instrument(name = "MonobankStatement", skip(self))]
    async fn fetch_statement(
        &self,
        account_id: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<Transaction>> {
        let url = self.statement_url(account_id, from, to);
        debug!("Requesting statement from {}", url);

        let response = self
            .retry
            .run(|| self.client.get(&url).header(TOKEN_HEADER, &self.token).send())
            .await
            .map_err(|source| Error::Request {
                resource: Resource::Transactions,
                source,
            })?;

        let response = ensure_success(response, Resource::Transactions)?;
        let body = response.text().await.map_err(|source| Error::Request {
            resource: Resource::Transactions,
            source,
        })?;

        let not_found = || Error::TransactionsNotFound {
            account_id: account_id.to_string(),
            from,
            to,
        };
        let data: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                error!(error = ?e, response = %body, "Unparseable statement response");
                return Err(not_found());
            }
        };
        if !data.is_array() {
            error!(response = %data, "Unexpected statement response");
            return Err(not_found());
        }

        Ok(serde_json::from_value(data)?)
    }
}
