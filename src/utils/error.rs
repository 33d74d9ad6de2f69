use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RatesError {
    #[error("{0}")]
    Fetch(String),
    #[error("Empty currency rates list")]
    EmptyRates,
    #[error("conversion failed: {0}")]
    Computation(String),
    #[error("config: {0}")]
    Config(String),
}

impl RatesError {
    pub fn fetch(context: &str, e: impl std::fmt::Display) -> Self {
        RatesError::Fetch(format!("{}: {}", context, e))
    }
}
