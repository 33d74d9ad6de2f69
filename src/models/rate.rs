use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One currency row. `base_rate` is how many units of this currency one unit
/// of the base currency buys; after a conversion it holds the converted amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRecord {
    pub currency_code: String,
    pub currency_name: String,
    pub base_rate: f64,
}

impl RateRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>, base_rate: f64) -> Self {
        Self {
            currency_code: code.into(),
            currency_name: name.into(),
            base_rate,
        }
    }
}

impl fmt::Display for RateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.currency_code, self.currency_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatesSnapshot {
    pub base: Option<String>,
    pub as_of: Option<DateTime<Utc>>,
    pub rates: Vec<RateRecord>,
}
