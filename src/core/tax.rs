//! Multi-bank income aggregation and flat tax calculation.
use crate::core::bank::BankClient;
use crate::core::cache::{Cache, keys};
use crate::core::error::{Error, Result};
use crate::core::period::Period;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Minor units per major unit of the home currency.
pub const CURRENCY_DENOMINATOR: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    pub general: f64,
    pub military: f64,
}

impl Default for TaxRates {
    fn default() -> Self {
        TaxRates {
            general: 0.05,
            military: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaxesRecord")]
pub struct Taxes {
    pub general: f64,
    pub military: f64,
    pub total: f64,
}

/// Wire shape of [`Taxes`]. Entries cached before `total` existed lack the field.
#[derive(Deserialize)]
struct TaxesRecord {
    general: f64,
    military: f64,
    total: Option<f64>,
}

impl From<TaxesRecord> for Taxes {
    fn from(record: TaxesRecord) -> Self {
        Taxes {
            general: record.general,
            military: record.military,
            total: record.total.unwrap_or(record.general + record.military),
        }
    }
}

impl AddAssign for Taxes {
    fn add_assign(&mut self, other: Taxes) {
        self.general += other.general;
        self.military += other.military;
        self.total += other.total;
    }
}

/// Income in home-currency major units together with the taxes due on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeAndTaxes {
    #[serde(alias = "totalIncome")]
    pub income: f64,
    pub taxes: Taxes,
}

impl AddAssign for IncomeAndTaxes {
    fn add_assign(&mut self, other: IncomeAndTaxes) {
        self.income += other.income;
        self.taxes += other.taxes;
    }
}

/// What to do when one bank fails during aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole calculation with the first bank error.
    #[default]
    Abort,
    /// Skip failing banks and report them next to the partial totals.
    Continue,
}

#[derive(Debug)]
pub struct BankFailure {
    pub bank_id: String,
    pub error: Error,
}

#[derive(Debug)]
pub struct Aggregation {
    pub totals: IncomeAndTaxes,
    pub failures: Vec<BankFailure>,
}

impl Aggregation {
    /// True when some banks are missing from `totals`.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct TaxCalculator {
    banks: Vec<Arc<dyn BankClient>>,
    rates: TaxRates,
    cache: Cache,
    policy: ErrorPolicy,
}

impl TaxCalculator {
    pub fn new(banks: Vec<Arc<dyn BankClient>>, rates: TaxRates, cache: Cache) -> Self {
        Self {
            banks,
            rates,
            cache,
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn rates(&self) -> &TaxRates {
        &self.rates
    }

    /// Sums raw minor-unit amounts into major units.
    pub fn calculate_income(incomes: &[f64]) -> f64 {
        incomes.iter().sum::<f64>() / CURRENCY_DENOMINATOR
    }

    pub fn calculate_taxes(&self, income: f64) -> Taxes {
        Taxes {
            general: income * self.rates.general,
            military: income * self.rates.military,
            total: income * (self.rates.general + self.rates.military),
        }
    }

    #[instrument(name = "IncomeByPeriod", skip(self))]
    pub async fn calculate_income_by_period(&self, period: Period) -> Result<Aggregation> {
        let mut totals = IncomeAndTaxes::default();
        let mut failures = Vec::new();

        for bank in &self.banks {
            match self.bank_income(bank.as_ref(), &period).await {
                Ok(result) => {
                    debug!(bank_id = bank.id(), income = result.income, "Bank income added");
                    totals += result;
                }
                Err(error) => match self.policy {
                    ErrorPolicy::Abort => return Err(Error::aggregation(bank.id(), error)),
                    ErrorPolicy::Continue => {
                        warn!(bank_id = bank.id(), error = %error, "Skipping failed bank");
                        failures.push(BankFailure {
                            bank_id: bank.id().to_string(),
                            error,
                        });
                    }
                },
            }
        }

        if !self.banks.is_empty() && failures.len() == self.banks.len() {
            let first = failures.remove(0);
            return Err(Error::aggregation(first.bank_id, first.error));
        }

        info!(
            income = totals.income,
            failed_banks = failures.len(),
            "Aggregated income for {}",
            period
        );
        Ok(Aggregation { totals, failures })
    }

    async fn bank_income(&self, bank: &dyn BankClient, period: &Period) -> Result<IncomeAndTaxes> {
        let key = keys::income_by_period(period, bank.id());
        self.cache
            .get_or_fetch(&key, || async {
                let incomes = bank.get_income_by_period(*period).await?;
                let income = Self::calculate_income(&incomes);
                Ok(IncomeAndTaxes {
                    income,
                    taxes: self.calculate_taxes(income),
                })
            })
            .await
    }
}
