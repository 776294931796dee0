use std::sync::Arc;

use ingestor_core::{
    BatchWorker, Config, Dispatcher, IngestionService, MemoryStatusStore, PriorityScheduler,
    RateLimiter, SanitizedConfig, StatusStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn StatusStore>,
    service: IngestionService,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn StatusStore>,
        service: IngestionService,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            store,
            service,
            dispatcher,
        }
    }

    /// Wire an in-memory store, scheduler, and rate limiter around `worker`.
    ///
    /// The dispatcher is created stopped.
    pub fn in_memory(config: Config, worker: Arc<dyn BatchWorker>) -> Self {
        let store: Arc<dyn StatusStore> = Arc::new(MemoryStatusStore::new());
        let scheduler = Arc::new(PriorityScheduler::new());
        let limiter = Arc::new(RateLimiter::new(
            config.dispatcher.rate_limit_window(),
            config.dispatcher.burst,
        ));

        let service = IngestionService::new(
            config.ingestion.clone(),
            Arc::clone(&store),
            Arc::clone(&scheduler),
        );
        let dispatcher = Dispatcher::new(
            config.dispatcher.clone(),
            Arc::clone(&store),
            scheduler,
            limiter,
            worker,
        );

        Self::new(config, store, service, dispatcher)
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn StatusStore {
        self.store.as_ref()
    }

    pub fn service(&self) -> &IngestionService {
        &self.service
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
