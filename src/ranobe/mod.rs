//! Ranobe chapter pages scraped from three sites and repackaged as FB2.

mod extract;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use log::{debug, info};

use crate::error::RelayError;
use crate::fb2::Fb2Builder;
use crate::fetcher::USER_AGENT;

pub use extract::{ChapterDraft, ContentBlock};

/// Site a chapter page comes from. The variants share everything but their
/// selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RanobeSource {
    RanobeHub,
    RanobeLib,
    RanobePoisk,
}

impl RanobeSource {
    pub fn name(&self) -> &'static str {
        match self {
            RanobeSource::RanobeHub => "ranobehub",
            RanobeSource::RanobeLib => "ranobelib",
            RanobeSource::RanobePoisk => "ranobepoisk",
        }
    }

    /// Pull title, chapter heading and content blocks out of a chapter page.
    pub fn extract(&self, html: &str) -> Result<ChapterDraft, RelayError> {
        match self {
            RanobeSource::RanobeHub => extract::ranobehub(html),
            RanobeSource::RanobeLib => extract::ranobelib(html),
            RanobeSource::RanobePoisk => extract::ranobepoisk(html),
        }
    }
}

impl fmt::Display for RanobeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RanobeSource {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ranobehub" => Ok(RanobeSource::RanobeHub),
            "ranobelib" => Ok(RanobeSource::RanobeLib),
            "ranobepoisk" | "ranobe-poisk" => Ok(RanobeSource::RanobePoisk),
            _ => Err(RelayError::UnknownSource(s.to_string())),
        }
    }
}

/// Downloads chapter pages and their images.
#[derive(Debug, Clone)]
pub struct RanobeClient {
    client: reqwest::Client,
    media_base: String,
    image_concurrency: usize,
}

impl RanobeClient {
    pub fn new(media_base: impl Into<String>, image_concurrency: usize) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self::with_client(client, media_base, image_concurrency))
    }

    pub fn with_client(client: reqwest::Client, media_base: impl Into<String>, image_concurrency: usize) -> Self {
        Self {
            client,
            media_base: media_base.into().trim_end_matches('/').to_string(),
            image_concurrency: image_concurrency.max(1),
        }
    }

    /// Fetch the chapter at `url` and render it as an FB2 document.
    pub async fn download(&self, source: RanobeSource, url: &str) -> Result<Vec<u8>, RelayError> {
        info!("Downloading {} chapter {}", source, url);
        let html = self.fetch_page(url).await?;
        let draft = source.extract(&html)?;
        let fb2 = self.build_document(draft).await?;
        Ok(fb2.generate())
    }

    async fn fetch_page(&self, url: &str) -> Result<String, RelayError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    pub fn media_url(&self, media_id: &str) -> String {
        format!("{}/api/media/{}", self.media_base, media_id)
    }

    async fn fetch_media(&self, media_id: &str) -> Result<Vec<u8>, RelayError> {
        let response = self.client.get(self.media_url(media_id)).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!("Fetched media {} ({} bytes)", media_id, bytes.len());
        Ok(bytes.to_vec())
    }

    /// Download every image of the draft, then lay out one section with a
    /// paragraph or the images per block, each followed by an empty line.
    pub async fn build_document(&self, draft: ChapterDraft) -> Result<Fb2Builder, RelayError> {
        // `buffered` yields in input order, so binaries keep document order.
        let media: HashMap<String, Vec<u8>> = stream::iter(draft.media_ids())
            .map(|id| async move {
                let data = self.fetch_media(&id).await?;
                Ok::<_, RelayError>((id, data))
            })
            .buffered(self.image_concurrency)
            .try_collect()
            .await?;

        let mut fb2 = Fb2Builder::new(draft.title);
        let chapter = fb2.add_section(draft.heading);
        for block in draft.blocks {
            match block {
                ContentBlock::Paragraph(text) => fb2.add_paragraph(chapter, text),
                ContentBlock::Images(ids) => {
                    for id in ids {
                        fb2.add_image(chapter, &id);
                        if let Some(data) = media.get(&id) {
                            fb2.add_binary(chapter, &id, data.clone());
                        }
                    }
                }
            }
            fb2.add_empty_line(chapter);
        }
        Ok(fb2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_names_round_trip() {
        for source in [RanobeSource::RanobeHub, RanobeSource::RanobeLib, RanobeSource::RanobePoisk] {
            assert_eq!(source.name().parse::<RanobeSource>().unwrap(), source);
        }
        assert_eq!("RanobeHub".parse::<RanobeSource>().unwrap(), RanobeSource::RanobeHub);
        assert!(matches!("novelupdates".parse::<RanobeSource>(), Err(RelayError::UnknownSource(_))));
    }

    #[test]
    fn test_media_url_joins_base() {
        let client = RanobeClient::with_client(reqwest::Client::new(), "https://ranobehub.org/", 2);
        assert_eq!(client.media_url("77"), "https://ranobehub.org/api/media/77");
    }

    #[tokio::test]
    async fn test_text_only_draft_needs_no_network() {
        let client = RanobeClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9", 2);
        let draft = ChapterDraft {
            title: String::from("Книга"),
            heading: String::from("Глава"),
            blocks: vec![ContentBlock::Paragraph(String::from("a")), ContentBlock::Paragraph(String::from("b"))],
        };

        let xml = String::from_utf8(client.build_document(draft).await.unwrap().generate()).unwrap();

        assert_eq!(xml.matches("<empty-line/>").count(), 2);
        assert!(xml.find("<p>a</p>").unwrap() < xml.find("<p>b</p>").unwrap());
    }
}
