// Shared state of the web server.
// Every request builds its own run context; only settings and the cache are shared.

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::Settings;
use crate::error::Result;
use crate::github::{GitHubClient, Transport};

pub struct AppState {
    pub settings: Settings,
    pub cache: Arc<dyn CacheStore>,
    transport: Option<Arc<dyn Transport>>,
}

impl AppState {
    pub fn new(settings: Settings, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            settings,
            cache,
            transport: None,
        }
    }

    /// Route API calls through the given transport instead of the token-authenticated one.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn client(&self) -> Result<GitHubClient> {
        match &self.transport {
            Some(transport) => Ok(self
                .settings
                .configure(GitHubClient::new(transport.clone(), self.cache.clone()))),
            None => self.settings.client(self.cache.clone()),
        }
    }
}
