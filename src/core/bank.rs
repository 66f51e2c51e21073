//! Bank-side domain types and the bank client capability

use crate::core::currency::CurrencyCode;
use crate::core::error::Result;
use crate::core::period::Period;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountKind {
    /// Sole-proprietor (FOP) business account.
    #[serde(rename = "fop")]
    Business,
    #[serde(rename = "black")]
    Salary,
    White,
    EAid,
    MadeInUkraine,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub send_id: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    pub currency_code: CurrencyCode,
    pub balance: i64,
    pub credit_limit: i64,
    #[serde(default)]
    pub masked_pan: Vec<String>,
    pub iban: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashback_type: Option<String>,
}

impl Account {
    /// Business account held in a currency other than `home`.
    pub fn is_eligible(&self, home: CurrencyCode) -> bool {
        self.kind == AccountKind::Business && self.currency_code != home
    }
}

/// Keeps the accounts whose income is taxable here, in their original order.
pub fn eligible_accounts(accounts: &[Account], home: CurrencyCode) -> Vec<Account> {
    accounts
        .iter()
        .filter(|account| account.is_eligible(home))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Epoch seconds.
    pub time: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mcc: u32,
    #[serde(default)]
    pub original_mcc: u32,
    #[serde(default)]
    pub amount: i64,
    /// Signed amount in minor units of the account currency. Positive is inflow.
    pub operation_amount: i64,
    pub currency_code: CurrencyCode,
    #[serde(default)]
    pub commission_rate: i64,
    #[serde(default)]
    pub cashback_amount: i64,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub hold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_edrpou: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_iban: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_name: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.operation_amount > 0
    }
}

/// A bank able to report raw income for a lookback period.
#[async_trait]
pub trait BankClient: Send + Sync {
    /// Stable identifier used to scope per-bank cache entries.
    fn id(&self) -> &str;

    /// Income amounts in minor units of the home currency, one per incoming transaction.
    async fn get_income_by_period(&self, period: Period) -> Result<Vec<f64>>;
}
