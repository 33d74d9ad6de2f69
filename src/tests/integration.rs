use std::{env, sync::Arc, time::Duration};

use async_trait::async_trait;
use serial_test::serial;
use tokio::time::timeout;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::AppConfig;
use crate::models::{RateRecord, ViewState};
use crate::services::controller::{CurrencyRatesController, RatesUiState, TokioDispatcher};
use crate::services::rate_fetcher::{OpenExchangeRates, RateFetcher, RateSource};
use crate::types::external::{CurrencyNames, LatestRatesResponse};
use crate::utils::error::RatesError;

const APP_ID: &str = "test-app-id";

async fn mount_latest(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .and(query_param("app_id", APP_ID))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// raw body: json! would sort the keys and hide the catalog order
async fn mount_currencies(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/currencies.json"))
        .and(query_param("app_id", APP_ID))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "application/json"))
        .mount(server)
        .await;
}

async fn start_mocks() -> MockServer {
    let server = MockServer::start().await;

    // Latest rates fixture (no rate for AED or XYZ)
    mount_latest(
        &server,
        200,
        serde_json::json!({
            "disclaimer": "Usage subject to terms",
            "license": "https://openexchangerates.org/license",
            "timestamp": 1_700_000_000,
            "base": "USD",
            "rates": { "USD": 1.0, "EUR": 0.9, "JPY": 150.0, "ZAR": 18.0 }
        }),
    )
    .await;

    mount_currencies(
        &server,
        200,
        r#"{"ZAR":"South African Rand","USD":"US Dollar","AED":"UAE Dirham","EUR":"Euro","JPY":"Yen","XYZ":"Mystery"}"#,
    )
    .await;

    server
}

fn fetcher_for(server: &MockServer) -> RateFetcher {
    let source = OpenExchangeRates::new(
        reqwest::Client::new(),
        format!("{}/latest.json", server.uri()),
        format!("{}/currencies.json", server.uri()),
        APP_ID,
    );
    RateFetcher::new(Arc::new(source))
}

async fn wait_for_settled(controller: &CurrencyRatesController) -> RatesUiState {
    let mut rx = controller.subscribe();
    let settled = timeout(
        Duration::from_secs(5),
        rx.wait_for(|state| !state.is_loading()),
    )
    .await
    .expect("state settled in time")
    .expect("sender alive");
    settled.clone()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_fetches_and_merges_both_endpoints() {
    let mock = start_mocks().await;

    let snapshot = fetcher_for(&mock).fetch_snapshot().await.expect("fetch");
    assert_eq!(snapshot.base.as_deref(), Some("USD"));
    assert_eq!(snapshot.as_of.map(|t| t.timestamp()), Some(1_700_000_000));

    let codes: Vec<&str> = snapshot.rates.iter().map(|r| r.currency_code.as_str()).collect();
    assert_eq!(codes, vec!["ZAR", "USD", "AED", "EUR", "JPY", "XYZ"]);
    assert_eq!(snapshot.rates[0], RateRecord::new("ZAR", "South African Rand", 18.0));
    assert_eq!(snapshot.rates[2], RateRecord::new("AED", "UAE Dirham", 1.0));
    assert_eq!(snapshot.rates[5], RateRecord::new("XYZ", "Mystery", 1.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_fails_whole_fetch_on_error_status() {
    let mock = MockServer::start().await;
    mount_latest(&mock, 200, serde_json::json!({ "rates": { "USD": 1.0 } })).await;
    mount_currencies(&mock, 503, r#"{"error":true}"#).await;

    let err = fetcher_for(&mock).fetch().await.unwrap_err();
    match err {
        RatesError::Fetch(msg) => assert!(msg.starts_with("Currency names request failed"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_fails_whole_fetch_on_malformed_payload() {
    let mock = MockServer::start().await;
    mount_latest(&mock, 200, serde_json::json!({ "rates": ["not", "a", "map"] })).await;
    mount_currencies(&mock, 200, r#"{"USD":"US Dollar"}"#).await;

    let err = fetcher_for(&mock).fetch().await.unwrap_err();
    assert!(matches!(err, RatesError::Fetch(ref m) if m.starts_with("Could not parse latest rates")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn controller_loads_then_converts() {
    let mock = start_mocks().await;
    let controller =
        CurrencyRatesController::start(fetcher_for(&mock), Arc::new(TokioDispatcher::current()));

    let state = wait_for_settled(&controller).await;
    assert_eq!(state.success().map(|l| l.len()), Some(6));

    let mut rx = controller.subscribe();
    controller.convert_input("50", "EUR");
    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("conversion published")
        .expect("sender alive");

    let values: Vec<f64> = rx
        .borrow()
        .success()
        .expect("success")
        .iter()
        .map(|r| r.base_rate)
        .collect();
    assert_eq!(values, vec![1000.0, 55.56, 55.56, 50.0, 8333.33, 55.56]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn controller_surfaces_fetch_failure() {
    let mock = MockServer::start().await;
    mount_latest(&mock, 500, serde_json::json!({})).await;
    mount_currencies(&mock, 200, r#"{"USD":"US Dollar"}"#).await;

    let controller =
        CurrencyRatesController::start(fetcher_for(&mock), Arc::new(TokioDispatcher::current()));

    let state = wait_for_settled(&controller).await;
    let msg = state.error().expect("error state");
    assert!(msg.starts_with("Latest rates request failed"), "{msg}");
    assert!(!matches!(state, ViewState::Success(_)));
}

// Holds the latest rates back so the controller is observably still loading.
struct SlowSource {
    delay: Duration,
}

#[async_trait]
impl RateSource for SlowSource {
    async fn latest_rates(&self) -> Result<LatestRatesResponse, RatesError> {
        tokio::time::sleep(self.delay).await;
        Ok(LatestRatesResponse {
            disclaimer: None,
            license: None,
            timestamp: None,
            base: Some("USD".into()),
            rates: [("USD".to_string(), 1.0), ("EUR".to_string(), 0.9)].into(),
        })
    }

    async fn currency_names(&self) -> Result<CurrencyNames, RatesError> {
        Ok(CurrencyNames(vec![
            ("USD".into(), "US Dollar".into()),
            ("EUR".into(), "Euro".into()),
        ]))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn controller_lifecycle_loading_early_error_then_success() {
    let fetcher = RateFetcher::new(Arc::new(SlowSource {
        delay: Duration::from_millis(300),
    }));
    let controller = CurrencyRatesController::start(fetcher, Arc::new(TokioDispatcher::current()));
    assert_eq!(controller.current(), ViewState::Loading);

    // no baseline yet: the conversion fails, and the fetch later overwrites it
    let mut rx = controller.subscribe();
    controller.convert_currency(10.0, "USD");
    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("early conversion published")
        .expect("sender alive");
    assert_eq!(
        *rx.borrow_and_update(),
        ViewState::Error("Empty currency rates list".into())
    );

    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("fetch published")
        .expect("sender alive");
    assert_eq!(
        *rx.borrow_and_update(),
        ViewState::Success(vec![
            RateRecord::new("USD", "US Dollar", 1.0),
            RateRecord::new("EUR", "Euro", 0.9),
        ])
    );

    // Loading never comes back once settled
    controller.convert_currency(10.0, "EUR");
    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("conversion published")
        .expect("sender alive");
    let state = rx.borrow_and_update().clone();
    assert!(!state.is_loading());
    assert_eq!(
        state.success().map(|l| l.iter().map(|r| r.base_rate).collect::<Vec<_>>()),
        Some(vec![11.11, 10.0])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial] // process env
async fn config_points_fetcher_at_env_urls() {
    let mock = start_mocks().await;

    env::set_var("OXR_APP_ID", APP_ID);
    env::set_var("LATEST_RATES_URL", format!("{}/latest.json", mock.uri()));
    env::set_var("CURRENCIES_URL", format!("{}/currencies.json", mock.uri()));
    env::remove_var("BASE_CURRENCY");
    env::set_var("EXTERNAL_TIMEOUT_MS", "5000");

    let cfg = AppConfig::from_env().expect("config");
    assert_eq!(cfg.external_timeout_ms, 5000);
    assert!(cfg.base_currency.is_none());

    let rates = cfg.build_fetcher().expect("fetcher").fetch().await.expect("fetch");
    assert_eq!(rates.len(), 6);
}

#[test]
#[serial] // process env
fn config_requires_app_id() {
    env::remove_var("OXR_APP_ID");
    let err = AppConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("OXR_APP_ID"));
}
