use crate::core::currency::CurrencyCode;
use crate::core::period::Period;
use crate::core::tax::{ErrorPolicy, TaxRates};
use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const MONOBANK_API_URL: &str = "https://api.monobank.ua";
pub const MONOBANK_TOKEN_ENV: &str = "MONOBANK_API_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonobankConfig {
    #[serde(default = "default_monobank_id")]
    pub id: String,
    /// Falls back to the `MONOBANK_API_TOKEN` environment variable.
    pub token: Option<String>,
    #[serde(default = "default_monobank_url")]
    pub base_url: String,
}

impl MonobankConfig {
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(token.clone());
        }
        std::env::var(MONOBANK_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No token configured for bank '{}' and {} is not set",
                    self.id,
                    MONOBANK_TOKEN_ENV
                )
            })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BankConfig {
    Monobank(MonobankConfig),
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    #[default]
    Disk,
    Redis,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    pub redis_url: Option<String>,
    /// Directory for the disk backend. Defaults to the app data directory.
    pub path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            backend: CacheBackend::default(),
            ttl_secs: default_ttl_secs(),
            redis_url: None,
            path: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub banks: Vec<BankConfig>,
    #[serde(default = "default_home_currency")]
    pub home_currency: CurrencyCode,
    #[serde(default = "default_period_months")]
    pub period_months: f64,
    #[serde(default)]
    pub tax_rates: TaxRates,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    pub data_path: Option<String>,
}

fn default_monobank_id() -> String {
    "monobank".to_string()
}

fn default_monobank_url() -> String {
    MONOBANK_API_URL.to_string()
}

fn default_ttl_secs() -> u64 {
    60 * 60
}

fn default_home_currency() -> CurrencyCode {
    CurrencyCode::UAH
}

// A regular tax quarter.
fn default_period_months() -> f64 {
    3.0
}

fn default_request_delay_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ua", "taxcalc", "taxcalc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("ua", "taxcalc", "taxcalc")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.period().validate().context("Invalid period_months")?;
        Ok(())
    }

    pub fn period(&self) -> Period {
        Period::Months(self.period_months)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let yaml_str = r#"
banks:
  - kind: monobank
    token: "secret"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.banks.len(), 1);
        let BankConfig::Monobank(mono) = &config.banks[0];
        assert_eq!(mono.id, "monobank");
        assert_eq!(mono.base_url, MONOBANK_API_URL);
        assert_eq!(mono.resolve_token().unwrap(), "secret");

        assert_eq!(config.home_currency, CurrencyCode::UAH);
        assert_eq!(config.period(), Period::Months(3.0));
        assert_eq!(config.tax_rates, TaxRates::default());
        assert_eq!(config.cache.backend, CacheBackend::Disk);
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.on_error, ErrorPolicy::Abort);
        assert_eq!(config.request_delay(), Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
banks:
  - kind: monobank
    id: "mono-fop"
    token: "t1"
    base_url: "http://localhost:8080"
  - kind: monobank
    id: "mono-second"
    token: "t2"
home_currency: 980
period_months: 12
tax_rates:
  general: 0.05
  military: 0.015
cache:
  backend: redis
  ttl_secs: 600
  redis_url: "redis://127.0.0.1:6379/0"
on_error: continue
request_delay_secs: 0
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.banks.len(), 2);
        let BankConfig::Monobank(first) = &config.banks[0];
        assert_eq!(first.id, "mono-fop");
        assert_eq!(first.base_url, "http://localhost:8080");
        let BankConfig::Monobank(second) = &config.banks[1];
        assert_eq!(second.base_url, MONOBANK_API_URL);

        assert_eq!(config.period(), Period::Months(12.0));
        assert_eq!(config.tax_rates.military, 0.015);
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(
            config.cache.redis_url.as_deref(),
            Some("redis://127.0.0.1:6379/0")
        );
        assert_eq!(config.on_error, ErrorPolicy::Continue);
        assert_eq!(config.request_delay(), Duration::ZERO);
    }

    #[test]
    fn test_unusable_period_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        for period in ["-3", ".nan", ".inf"] {
            let path = dir.path().join("config.yaml");
            fs::write(
                &path,
                format!("banks:\n  - kind: monobank\n    token: \"t\"\nperiod_months: {period}\n"),
            )
            .unwrap();

            let err = AppConfig::load_from_path(&path).unwrap_err();
            assert!(
                format!("{err:#}").contains("Invalid period_months"),
                "unexpected error for {period}: {err:#}"
            );
        }
    }

    #[test]
    fn test_unknown_bank_kind_is_rejected() {
        let yaml_str = r#"
banks:
  - kind: privatbank
    token: "x"
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml_str).is_err());
    }

    #[test]
    fn test_empty_token_is_not_used() {
        let mono = MonobankConfig {
            id: "mono".to_string(),
            token: Some(String::new()),
            base_url: MONOBANK_API_URL.to_string(),
        };
        // Only the env fallback can satisfy this, which tests must not rely on.
        if std::env::var(MONOBANK_TOKEN_ENV).is_err() {
            assert!(mono.resolve_token().is_err());
        }
    }
}
