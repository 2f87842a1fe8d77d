use std::sync::Arc;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::cache::{CacheManager, chapter_key};
use crate::error::RelayError;
use crate::fetcher::{Fetcher, Transport};
use crate::models::{ChapterEntry, MangaRecord, SearchResult};
use crate::paginate::{self, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};

use super::{normalize, queries};

/// Cached access to the Senkuro GraphQL API.
///
/// Lookups return the JSON text stored in the cache, so a hit is served
/// byte for byte as it was first written.
pub struct SenkuroService<T> {
    fetcher: Fetcher<T>,
    cache: Arc<CacheManager>,
    locale: String,
    page_size: u32,
    max_pages: usize,
}

impl<T: Transport> SenkuroService<T> {
    pub fn new(fetcher: Fetcher<T>, cache: Arc<CacheManager>, locale: impl Into<String>) -> Self {
        Self {
            fetcher,
            cache,
            locale: locale.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_pagination(mut self, page_size: u32, max_pages: usize) -> Self {
        self.page_size = page_size.max(1);
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Cached JSON under `key`, provided it still decodes as `R`.
    ///
    /// Search texts and slugs share one key space, so an entry written by the
    /// other lookup counts as a miss and gets overwritten.
    async fn cached<R: DeserializeOwned>(&self, key: &str) -> Option<String> {
        let hit = self.cache.get(key).await?;
        match serde_json::from_str::<R>(&hit) {
            Ok(_) => Some(hit),
            Err(e) => {
                warn!("Ignoring cached {:?} of another shape: {}", key, e);
                None
            }
        }
    }

    /// Search results for `text` as a JSON array, cached under the query text.
    pub async fn search_json(&self, text: &str) -> Result<String, RelayError> {
        if let Some(hit) = self.cached::<Vec<SearchResult>>(text).await {
            debug!("Cache hit for search {:?}", text);
            return Ok(hit);
        }

        let body = self.fetcher.fetch(&queries::search(text)).await?;
        let results = normalize::search_results(body, &self.locale)?;
        let json = serde_json::to_string(&results)?;

        self.cache.set(text, json.clone()).await;
        info!("Search {:?} matched {} titles", text, results.len());
        Ok(json)
    }

    /// Manga details as a JSON object, cached under the slug.
    pub async fn title_json(&self, slug: &str) -> Result<String, RelayError> {
        if let Some(hit) = self.cached::<MangaRecord>(slug).await {
            debug!("Cache hit for title {:?}", slug);
            return Ok(hit);
        }

        let body = self.fetcher.fetch(&queries::title(slug)).await?;
        let record = normalize::manga_record(body, &self.locale)?;
        let json = serde_json::to_string(&record)?;

        self.cache.set(slug, json.clone()).await;
        Ok(json)
    }

    pub async fn title(&self, slug: &str) -> Result<MangaRecord, RelayError> {
        let json = self.title_json(slug).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Every chapter of the manga's primary branch, in upstream order.
    pub async fn chapters(&self, slug: &str) -> Result<Vec<ChapterEntry>, RelayError> {
        let record = self.title(slug).await?;
        let branch_id = record.primary_branch_id
            .ok_or_else(|| RelayError::MissingField(format!("branches of manga {}", slug)))?;

        let mut variables = Map::new();
        variables.insert(String::from("branchId"), Value::String(branch_id));

        let chapters = paginate::aggregate(
            &self.fetcher,
            queries::CHAPTERS,
            variables,
            self.page_size,
            self.max_pages,
            normalize::chapter_page,
        ).await?;

        info!("Listed {} chapters of {}", chapters.len(), slug);
        Ok(chapters)
    }

    /// Page image links of one chapter, cached under `slug_chapterId`.
    pub async fn images_json(&self, slug: &str, chapter_id: &str) -> Result<String, RelayError> {
        let key = chapter_key(slug, chapter_id);
        if let Some(hit) = self.cache.get(&key).await {
            debug!("Cache hit for images {:?}", key);
            return Ok(hit);
        }

        let record = self.title(slug).await?;
        let body = self.fetcher.fetch(&queries::chapter_pages(&record.id, chapter_id)).await?;
        let json = serde_json::to_string(&normalize::image_set(body)?)?;

        self.cache.set(&key, json.clone()).await;
        Ok(json)
    }
}
