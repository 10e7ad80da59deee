use std::sync::Arc;

use courier_engine::{
    DocumentRenderer, FetchError, Mailer, Orchestrator, ReqwestFetcher, SmtpMailer,
};

use crate::config::AppConfig;

/// Shared handler state. Batches never share mutable state; the orchestrator
/// only holds configuration and stateless components.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub default_limit: usize,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, default_limit: usize) -> Self {
        Self {
            orchestrator,
            default_limit,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.settings())?);
        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(config.relay.clone()));
        let orchestrator = Orchestrator::new(
            fetcher,
            DocumentRenderer::default(),
            mailer,
            config.batch.settings(),
        );
        Ok(Self::new(Arc::new(orchestrator), config.batch.default_limit))
    }
}
