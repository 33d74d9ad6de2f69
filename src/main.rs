use currency_rates::config::AppConfig;
use currency_rates::{CurrencyRatesController, TokioDispatcher, ViewState};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sig) = signal(SignalKind::terminate()) {
            sig.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! { _ = ctrl_c => {}, _ = terminate => {} }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::from_env()?;
    let fetcher = cfg.build_fetcher()?;
    let controller = CurrencyRatesController::start(fetcher, Arc::new(TokioDispatcher::current()));
    let mut states = controller.subscribe();
    // the fetch may already have published before we subscribed
    states.mark_changed();

    let watch_states = async {
        while states.changed().await.is_ok() {
            match &*states.borrow_and_update() {
                ViewState::Loading => info!("loading rates"),
                ViewState::Success(list) => {
                    info!("{} currencies", list.len());
                    for r in list {
                        info!("{}: {:.2}", r, r.base_rate);
                    }
                }
                ViewState::Error(msg) => error!("{}", msg),
            }
        }
    };

    tokio::select! {
        _ = watch_states => {}
        _ = shutdown_signal() => info!("shutting down"),
    }

    Ok(())
}
