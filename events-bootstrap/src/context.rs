use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use events_application::{AppState, Metrics};
use events_domain::{ChangeNotifier, EventRepository, StorageBackend};
use events_infrastructure::{
    AppConfig, HttpMembershipOracle, HttpProfileOracle, InMemoryEventRepository,
    LogChangeNotifier, PgEventRepository, WebhookChangeNotifier,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config()?;
        let upstream_config = config.to_upstream_config();
        let notifier_config = config.to_notifier_config();

        let event_repo: Arc<dyn EventRepository> = match db_config.storage_backend {
            StorageBackend::Postgres => {
                let repo = PgEventRepository::connect_lazy(&db_config)?;
                repo.ensure_schema().await?;
                Arc::new(repo)
            }
            StorageBackend::Memory => {
                warn!("using in-memory event storage, data is lost on restart");
                Arc::new(InMemoryEventRepository::new())
            }
        };

        let notifier: Arc<dyn ChangeNotifier> = match &notifier_config.webhook_url {
            Some(url) => {
                info!(topic = %notifier_config.topic, "publishing event changes to webhook");
                Arc::new(WebhookChangeNotifier::new(&notifier_config, url)?)
            }
            None => Arc::new(LogChangeNotifier::new(&notifier_config.topic)),
        };

        let state = AppState {
            config: runtime_config,
            event_repo,
            membership: Arc::new(HttpMembershipOracle::new(&upstream_config)?),
            profiles: Arc::new(HttpProfileOracle::new(&upstream_config)?),
            notifier,
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
