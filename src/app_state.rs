//! Shared state handed to every actix-web handler.

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::config::Config;
use crate::error::RelayError;
use crate::fetcher::{Fetcher, HttpTransport};
use crate::ranobe::RanobeClient;
use crate::senkuro::SenkuroService;

pub struct AppState {
    /// Cached Senkuro GraphQL lookups
    pub senkuro: SenkuroService<HttpTransport>,
    /// Ranobe chapter downloader
    pub ranobe: RanobeClient,
    /// Same cache the Senkuro service writes to, exposed for raw probes
    pub cache: Arc<CacheManager>,
}

impl AppState {
    pub fn new(senkuro: SenkuroService<HttpTransport>, ranobe: RanobeClient, cache: Arc<CacheManager>) -> Self {
        Self { senkuro, ranobe, cache }
    }

    /// Wire the services up from configuration around an already opened cache.
    pub fn from_config(config: &Config, cache: Arc<CacheManager>) -> Result<Self, RelayError> {
        let fetcher = Fetcher::new(HttpTransport::new()?, config.senkuro_url.clone(), config.retry_policy());
        let senkuro = SenkuroService::new(fetcher, Arc::clone(&cache), config.locale.clone())
            .with_pagination(config.page_size, config.max_pages);
        let ranobe = RanobeClient::new(config.ranobehub_media_url.clone(), config.image_concurrency)?;
        Ok(Self::new(senkuro, ranobe, cache))
    }
}
