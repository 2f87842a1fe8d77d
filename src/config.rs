use std::time::Duration;

use clap::Parser;

use crate::fetcher::RetryPolicy;

pub const DEFAULT_SENKURO_URL: &str = "https://api.senkuro.com/graphql";
pub const DEFAULT_RANOBEHUB_MEDIA_URL: &str = "https://ranobehub.org";

/// Relay manga and ranobe metadata from upstream sites over HTTP
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// GraphQL endpoint of the manga upstream
    #[arg(long, env = "SENKURO_URL", default_value = DEFAULT_SENKURO_URL)]
    pub senkuro_url: String,

    /// Base URL media ids are resolved against for RanobeHub chapters
    #[arg(long, env = "RANOBEHUB_MEDIA_URL", default_value = DEFAULT_RANOBEHUB_MEDIA_URL)]
    pub ranobehub_media_url: String,

    /// Language tag picked from localized upstream fields
    #[arg(long, env = "CONTENT_LOCALE", default_value = "RU")]
    pub locale: String,

    /// Lifetime of cache entries in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "3600")]
    pub cache_ttl_secs: u64,

    /// Maximum attempts per upstream request
    #[arg(long, env = "FETCH_MAX_RETRIES", default_value = "15")]
    pub max_retries: u32,

    /// Backoff factor in seconds, multiplied by the attempt number
    #[arg(long, env = "FETCH_BACKOFF_SECS", default_value = "0.5")]
    pub backoff_secs: f64,

    /// Timeout of a single upstream attempt in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "60")]
    pub timeout_secs: u64,

    /// Chapters requested per page
    #[arg(long, env = "CHAPTER_PAGE_SIZE", default_value = "100")]
    pub page_size: u32,

    /// Upper bound on pages fetched for one chapter listing
    #[arg(long, env = "CHAPTER_MAX_PAGES", default_value = "1000")]
    pub max_pages: usize,

    /// Maximum number of images downloaded at once for a ranobe chapter
    #[arg(long, env = "IMAGE_CONCURRENCY", default_value = "4")]
    pub image_concurrency: usize,
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_secs, Duration::from_secs(self.timeout_secs))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_upstream_service() {
        let config = Config::parse_from(["manga-relay"]);
        assert_eq!(config.senkuro_url, DEFAULT_SENKURO_URL);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries(), 15);
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::parse_from(["manga-relay", "--port", "9000", "--max-retries", "0", "--locale", "EN"]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.locale, "EN");
        // zero attempts is clamped so that at least one request is made
        assert_eq!(config.retry_policy().max_retries(), 1);
    }
}
