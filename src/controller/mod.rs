//! API Controller modules
//!
//! Fixture backend endpoints mirroring the contract the HTTP data source
//! consumes.

pub mod dashboard;
pub mod health;
pub mod transactions;
pub mod version;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use crate::{
        configuration::{AppState, Config, State},
        provider::{Api, Latency, Mock},
    };

    pub fn app_state() -> AppState<State> {
        let anchor = Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap();
        let api = Api::new(Arc::new(Mock::with_anchor(anchor, Latency::NONE)));
        AppState::new(State::new(Config::default(), api))
    }
}
