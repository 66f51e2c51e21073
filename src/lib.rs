pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::{report, ui};
use crate::core::bank::BankClient;
use crate::core::cache::Cache;
use crate::core::config::{AppConfig, BankConfig};
use crate::core::period::Period;
use crate::core::statement::{FixedDelay, Throttle};
use crate::core::tax::{Aggregation, TaxCalculator};
use crate::providers::monobank::MonobankClient;
use crate::providers::monobank::api::MonobankApi;
use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Income and taxes over `period`, or the configured default period.
    Report { period: Option<Period> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Tax calculator starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Report { period } => {
            let period = period.unwrap_or_else(|| config.period()).validate()?;
            let calculator = build_calculator(&config).await?;

            let spinner = ui::new_spinner(&format!("Collecting income for the last {period}"));
            let result = calculator.calculate_income_by_period(period).await;
            spinner.finish_and_clear();

            let aggregation = result?;
            println!(
                "{}",
                report::render(
                    &aggregation,
                    &period,
                    config.home_currency,
                    calculator.rates()
                )
            );
            Ok(())
        }
    }
}

/// Runs one aggregation over every configured bank.
pub async fn calculate(config: &AppConfig, period: Period) -> Result<Aggregation> {
    let period = period.validate()?;
    let calculator = build_calculator(config).await?;
    Ok(calculator.calculate_income_by_period(period).await?)
}

/// Wires the cache store, bank clients and tax rates from `config`.
pub async fn build_calculator(config: &AppConfig) -> Result<TaxCalculator> {
    if config.banks.is_empty() {
        bail!("No banks configured");
    }

    let data_path = config.default_data_path()?;
    let store = store::open_store(&config.cache, &data_path).await?;
    let cache = Cache::new(store, config.cache.ttl());
    let throttle: Arc<dyn Throttle> = Arc::new(FixedDelay(config.request_delay()));

    let mut ids = HashSet::new();
    let mut banks: Vec<Arc<dyn BankClient>> = Vec::with_capacity(config.banks.len());
    for bank in &config.banks {
        match bank {
            BankConfig::Monobank(mono) => {
                // Per-bank cache keys are scoped by id.
                if !ids.insert(mono.id.as_str()) {
                    bail!("Duplicate bank id in config: {}", mono.id);
                }
                let token = mono.resolve_token()?;
                let api = MonobankApi::new(&mono.base_url, &token, config.request_timeout())
                    .context("Failed to build HTTP client")?;
                banks.push(Arc::new(MonobankClient::new(
                    &mono.id,
                    api,
                    cache.clone(),
                    Arc::clone(&throttle),
                    config.home_currency,
                )));
            }
        }
    }

    Ok(TaxCalculator::new(banks, config.tax_rates, cache).with_policy(config.on_error))
}
