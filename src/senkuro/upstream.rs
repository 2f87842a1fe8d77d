//! Response shapes of the Senkuro GraphQL API.
//!
//! Every field is optional: GraphQL may omit or null anything, and the
//! normalizer decides which absences are fatal.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default, deserialize_with = "nullable")]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocalizedText {
    pub lang: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Cover {
    pub original: Option<ImageRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageRef {
    pub url: Option<String>,
}

impl Cover {
    pub fn url(&self) -> Option<&str> {
        self.original.as_ref()?.url.as_deref()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub manga_tachiyomi_search: Option<SearchPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchPayload {
    #[serde(default, deserialize_with = "nullable")]
    pub mangas: Vec<SearchManga>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchManga {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub original_name: Option<LocalizedText>,
    #[serde(default, deserialize_with = "nullable")]
    pub titles: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "nullable")]
    pub alternative_names: Vec<LocalizedText>,
    pub cover: Option<Cover>,
}

#[derive(Debug, Deserialize)]
pub struct TitleData {
    pub manga: Option<UpstreamManga>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamManga {
    pub id: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub localizations: Vec<Localization>,
    #[serde(default, deserialize_with = "nullable")]
    pub titles: Vec<LocalizedText>,
    #[serde(default, deserialize_with = "nullable")]
    pub alternative_names: Vec<LocalizedText>,
    pub chapters: Option<u64>,
    pub status: Option<String>,
    pub translition_status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub branches: Vec<Branch>,
    #[serde(default, deserialize_with = "nullable")]
    pub genres: Vec<Label>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<Label>,
    pub cover: Option<Cover>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Localization {
    pub lang: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Vec<DescriptionBlock>,
}

/// A rich-text block; only its text nodes matter here.
#[derive(Debug, Default, Deserialize)]
pub struct DescriptionBlock {
    #[serde(default, deserialize_with = "nullable")]
    pub content: Vec<TextNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextNode {
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Branch {
    pub id: Option<String>,
    pub lang: Option<String>,
    pub chapters: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Label {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub titles: Vec<LocalizedText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaptersData {
    pub manga_chapters: Option<ChapterConnection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterConnection {
    pub page_info: Option<ConnectionPageInfo>,
    #[serde(default, deserialize_with = "nullable")]
    pub edges: Vec<ChapterEdge>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChapterEdge {
    pub node: Option<ChapterNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChapterNode {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub number: Option<Value>,
    pub volume: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesData {
    pub manga_tachiyomi_chapter_pages: Option<PagesPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PagesPayload {
    #[serde(default, deserialize_with = "nullable")]
    pub pages: Vec<PageImage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageImage {
    pub url: Option<String>,
}
