use std::sync::Arc;
use std::time::Duration;

use events_domain::ports::{ChangeNotifier, EventRepository, MembershipOracle, ProfileOracle};
use events_domain::RuntimeConfig;

use crate::Metrics;

/// Everything a request needs. Cloned per request; holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub event_repo: Arc<dyn EventRepository>,
    pub membership: Arc<dyn MembershipOracle>,
    pub profiles: Arc<dyn ProfileOracle>,
    pub notifier: Arc<dyn ChangeNotifier>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.config.rpc_timeout_ms.max(1))
    }
}
