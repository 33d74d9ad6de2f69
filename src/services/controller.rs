use futures::future::BoxFuture;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::models::{RateRecord, ViewState};
use crate::services::converter;
use crate::services::rate_fetcher::RateFetcher;
use crate::utils::error::RatesError;

pub type RatesUiState = ViewState<Vec<RateRecord>>;

pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: BoxFuture<'static, ()>);
}

#[derive(Clone)]
pub struct TokioDispatcher {
    handle: Handle,
}

impl TokioDispatcher {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    // panics outside a runtime
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, task: BoxFuture<'static, ()>) {
        self.handle.spawn(task);
    }
}

/// Runs each task to completion on the calling thread. Only for sources that
/// never wait on the tokio reactor.
#[derive(Clone, Copy, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, task: BoxFuture<'static, ()>) {
        futures::executor::block_on(task);
    }
}

// One watch slot, last write wins. Conversions are not sequenced or cancelled.
struct Shared {
    state: watch::Sender<RatesUiState>,
    // last successful fetch; conversions always pivot on this, not on what is displayed
    baseline: RwLock<Option<Arc<Vec<RateRecord>>>>,
}

impl Shared {
    fn publish(&self, next: RatesUiState) {
        self.state.send_replace(next);
    }

    fn baseline(&self) -> Option<Arc<Vec<RateRecord>>> {
        match self.baseline.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_baseline(&self, rates: Option<Arc<Vec<RateRecord>>>) {
        match self.baseline.write() {
            Ok(mut guard) => *guard = rates,
            Err(poisoned) => *poisoned.into_inner() = rates,
        }
    }
}

pub struct CurrencyRatesController {
    shared: Arc<Shared>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl CurrencyRatesController {
    pub fn start(fetcher: RateFetcher, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let (state, _) = watch::channel(ViewState::Loading);
        let shared = Arc::new(Shared {
            state,
            baseline: RwLock::new(None),
        });

        let task_shared = shared.clone();
        dispatcher.dispatch(Box::pin(async move {
            let res = fetcher.fetch_snapshot().await.map(|snapshot| {
                info!(
                    count = snapshot.rates.len(),
                    base = snapshot.base.as_deref().unwrap_or("?"),
                    as_of = ?snapshot.as_of,
                    "initial rates loaded"
                );
                let rates = Arc::new(snapshot.rates);
                task_shared.set_baseline(Some(rates.clone()));
                (*rates).clone()
            });
            if let Err(e) = &res {
                warn!("initial rates fetch failed: {}", e);
                task_shared.set_baseline(None);
            }
            task_shared.publish(res.into());
        }));

        Self { shared, dispatcher }
    }

    pub fn subscribe(&self) -> watch::Receiver<RatesUiState> {
        self.shared.state.subscribe()
    }

    pub fn current(&self) -> RatesUiState {
        self.shared.state.borrow().clone()
    }

    pub fn convert_currency(&self, amount: f64, currency_code: &str) {
        let shared = self.shared.clone();
        let code = currency_code.to_string();

        self.dispatcher.dispatch(Box::pin(async move {
            let baseline = shared.baseline().unwrap_or_default();
            let res = run_conversion(amount, &code, &baseline);
            if let Err(e) = &res {
                warn!(currency = %code, "conversion failed: {}", e);
            }
            shared.publish(res.into());
        }));
    }

    // non-numeric text converts as 1.0
    pub fn convert_input(&self, amount_text: &str, currency_code: &str) {
        self.convert_currency(converter::parse_amount(amount_text), currency_code);
    }
}

fn run_conversion(
    amount: f64,
    code: &str,
    rates: &[RateRecord],
) -> Result<Vec<RateRecord>, RatesError> {
    catch_unwind(AssertUnwindSafe(|| converter::convert(amount, code, rates)))
        .unwrap_or_else(|panic| Err(RatesError::Computation(panic_message(panic.as_ref()))))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".into()
    }
}
