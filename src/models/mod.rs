pub mod rate;
pub mod view_state;

pub use rate::{RateRecord, RatesSnapshot};
pub use view_state::ViewState;
