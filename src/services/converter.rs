use crate::models::RateRecord;
use crate::utils::error::RatesError;

pub const DEFAULT_AMOUNT: f64 = 1.0;

pub const FALLBACK_BASE_RATE: f64 = 1.0;

/// Two-decimal monetary rounding, half away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn parse_amount(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => DEFAULT_AMOUNT,
    }
}

pub fn base_rate_for(rates: &[RateRecord], code: &str) -> f64 {
    rates
        .iter()
        .find(|r| r.currency_code == code)
        .map(|r| r.base_rate)
        .unwrap_or(FALLBACK_BASE_RATE)
}

// All rates share one base currency, so c.base_rate / pivot converts between
// any two entries. A zero pivot gives inf/NaN; not guarded.
pub fn convert(
    amount: f64,
    target_code: &str,
    rates: &[RateRecord],
) -> Result<Vec<RateRecord>, RatesError> {
    if rates.is_empty() {
        return Err(RatesError::EmptyRates);
    }

    let pivot = base_rate_for(rates, target_code);

    Ok(rates
        .iter()
        .map(|c| RateRecord {
            currency_code: c.currency_code.clone(),
            currency_name: c.currency_name.clone(),
            base_rate: round2(amount * c.base_rate / pivot),
        })
        .collect())
}
