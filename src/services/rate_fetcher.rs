use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::models::{RateRecord, RatesSnapshot};
use crate::types::external::{CurrencyNames, LatestRatesResponse};
use crate::utils::error::RatesError;

pub const DEFAULT_BASE_RATE: f64 = 1.0;

/// Where the two raw datasets come from.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn latest_rates(&self) -> Result<LatestRatesResponse, RatesError>;

    async fn currency_names(&self) -> Result<CurrencyNames, RatesError>;
}

// openexchangerates.org style endpoints, keyed by an app_id query parameter
pub struct OpenExchangeRates {
    http: Client,
    latest_url: String,
    currencies_url: String,
    app_id: String,
    base: Option<String>,
}

impl OpenExchangeRates {
    pub fn new(
        http: Client,
        latest_url: impl Into<String>,
        currencies_url: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            latest_url: latest_url.into(),
            currencies_url: currencies_url.into(),
            app_id: app_id.into(),
            base: None,
        }
    }

    pub fn with_base(mut self, base: Option<String>) -> Self {
        self.base = base;
        self
    }
}

#[async_trait]
impl RateSource for OpenExchangeRates {
    async fn latest_rates(&self) -> Result<LatestRatesResponse, RatesError> {
        let mut query: Vec<(&str, &str)> = vec![("app_id", self.app_id.as_str())];
        if let Some(base) = self.base.as_deref() {
            query.push(("base", base));
        }

        self.http
            .get(&self.latest_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| RatesError::fetch("Could not fetch latest rates", e))?
            .error_for_status()
            .map_err(|e| RatesError::fetch("Latest rates request failed", e))?
            .json()
            .await
            .map_err(|e| RatesError::fetch("Could not parse latest rates", e))
    }

    async fn currency_names(&self) -> Result<CurrencyNames, RatesError> {
        self.http
            .get(&self.currencies_url)
            .query(&[("app_id", self.app_id.as_str())])
            .send()
            .await
            .map_err(|e| RatesError::fetch("Could not fetch currency names", e))?
            .error_for_status()
            .map_err(|e| RatesError::fetch("Currency names request failed", e))?
            .json()
            .await
            .map_err(|e| RatesError::fetch("Could not parse currency names", e))
    }
}

#[derive(Clone)]
pub struct RateFetcher {
    source: Arc<dyn RateSource>,
}

impl RateFetcher {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self { source }
    }

    pub async fn fetch(&self) -> Result<Vec<RateRecord>, RatesError> {
        Ok(self.fetch_snapshot().await?.rates)
    }

    pub async fn fetch_snapshot(&self) -> Result<RatesSnapshot, RatesError> {
        let (latest, names) =
            match tokio::try_join!(self.source.latest_rates(), self.source.currency_names()) {
                Ok(pair) => pair,
                Err(e) => {
                    error!("rate fetch failed: {}", e);
                    return Err(e);
                }
            };

        let rates = merge_rates(&names, &latest.rates);
        let as_of = latest
            .timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

        debug!(
            count = rates.len(),
            base = latest.base.as_deref().unwrap_or("?"),
            "rates merged"
        );

        Ok(RatesSnapshot {
            base: latest.base,
            as_of,
            rates,
        })
    }
}

// The names catalog decides membership and order.
pub fn merge_rates(names: &CurrencyNames, rates: &HashMap<String, f64>) -> Vec<RateRecord> {
    let mut defaulted = 0usize;
    let out: Vec<RateRecord> = names
        .iter()
        .map(|(code, name)| {
            let base_rate = match rates.get(code) {
                Some(rate) => *rate,
                None => {
                    debug!(code, "no published rate, defaulting");
                    defaulted += 1;
                    DEFAULT_BASE_RATE
                }
            };
            RateRecord::new(code, name, base_rate)
        })
        .collect();

    if defaulted > 0 {
        info!(defaulted, "currencies without a published rate");
    }
    out
}
