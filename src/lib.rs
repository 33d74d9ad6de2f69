pub mod config;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests;

pub use models::{RateRecord, RatesSnapshot, ViewState};
pub use services::controller::{
    CurrencyRatesController, Dispatcher, InlineDispatcher, RatesUiState, TokioDispatcher,
};
pub use services::converter::{convert, parse_amount, round2};
pub use services::rate_fetcher::{merge_rates, OpenExchangeRates, RateFetcher, RateSource};
pub use utils::error::RatesError;
