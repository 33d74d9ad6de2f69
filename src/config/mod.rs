use reqwest::Client;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::services::rate_fetcher::{OpenExchangeRates, RateFetcher};
use crate::utils::error::RatesError;

pub const DEFAULT_LATEST_URL: &str = "https://openexchangerates.org/api/latest.json";
pub const DEFAULT_CURRENCIES_URL: &str = "https://openexchangerates.org/api/currencies.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_id: String,
    pub latest_url: String,
    pub currencies_url: String,
    pub base_currency: Option<String>,
    pub external_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let app_id = env::var("OXR_APP_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| RatesError::Config("OXR_APP_ID is required".into()))?;
        let latest_url = env::var("LATEST_RATES_URL").unwrap_or_else(|_| DEFAULT_LATEST_URL.into());
        let currencies_url =
            env::var("CURRENCIES_URL").unwrap_or_else(|_| DEFAULT_CURRENCIES_URL.into());
        let base_currency = env::var("BASE_CURRENCY")
            .ok()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty());
        let external_timeout_ms: u64 = env::var("EXTERNAL_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(12_000);
        Ok(Self { app_id, latest_url, currencies_url, base_currency, external_timeout_ms })
    }

    pub fn build_fetcher(&self) -> Result<RateFetcher, anyhow::Error> {
        // http client
        let http = Client::builder()
            .timeout(Duration::from_millis(self.external_timeout_ms))
            .build()?;

        let source = OpenExchangeRates::new(
            http,
            self.latest_url.clone(),
            self.currencies_url.clone(),
            self.app_id.clone(),
        )
        .with_base(self.base_currency.clone());

        info!(
            latest = %self.latest_url,
            currencies = %self.currencies_url,
            "rate source configured"
        );
        Ok(RateFetcher::new(Arc::new(source)))
    }
}
