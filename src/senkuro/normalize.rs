//! Pure mapping from Senkuro responses to the relay's records.

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RelayError;
use crate::models::{ChapterEntry, ImageSet, MangaRecord, SearchResult};
use crate::paginate::{Page, PageInfo};

use super::upstream::{
    Branch, ChaptersData, GraphQlResponse, Label, LocalizedText, PagesData, SearchData, TitleData,
};

/// Replace double quotes with single quotes.
pub fn sanitize_quotes(text: &str) -> String {
    text.replace('"', "'")
}

/// Decode the `data` member of a GraphQL response, logging reported errors.
fn data<T: DeserializeOwned>(body: Value) -> Result<Option<T>, RelayError> {
    let response: GraphQlResponse<T> = serde_json::from_value(body)?;
    for error in &response.errors {
        warn!("Upstream reported a GraphQL error: {}", error.message);
    }
    Ok(response.data)
}

fn localized<'a>(texts: &'a [LocalizedText], locale: &str) -> Option<&'a str> {
    texts.iter()
        .find(|t| t.lang.as_deref() == Some(locale))
        .and_then(|t| t.content.as_deref())
}

fn contents(texts: &[LocalizedText]) -> Vec<String> {
    texts.iter()
        .filter_map(|t| t.content.as_deref())
        .map(sanitize_quotes)
        .collect()
}

fn labels(items: &[Label]) -> Vec<String> {
    items.iter()
        .filter_map(|item| item.titles.first()?.content.as_deref())
        .filter(|label| !label.is_empty())
        .map(sanitize_quotes)
        .collect()
}

/// Id of the branch with the most chapters. Ties go to the earliest branch.
pub fn primary_branch(branches: &[Branch]) -> Option<String> {
    let mut best: Option<&Branch> = None;
    for branch in branches {
        let chapters = branch.chapters.unwrap_or(0);
        if best.is_none_or(|b| chapters > b.chapters.unwrap_or(0)) {
            best = Some(branch);
        }
    }
    best.and_then(|b| b.id.clone())
}

pub fn search_results(body: Value, locale: &str) -> Result<Vec<SearchResult>, RelayError> {
    let mangas = data::<SearchData>(body)?
        .and_then(|d| d.manga_tachiyomi_search)
        .map(|p| p.mangas)
        .unwrap_or_default();

    if mangas.is_empty() {
        return Err(RelayError::NotFound(String::from("No manga found")));
    }

    mangas.into_iter().enumerate().map(|(i, manga)| {
        let path = format!("data.mangaTachiyomiSearch.mangas[{}]", i);
        Ok(SearchResult {
            id: manga.id.ok_or_else(|| RelayError::MissingField(format!("{}.id", path)))?,
            slug: manga.slug.ok_or_else(|| RelayError::MissingField(format!("{}.slug", path)))?,
            original_name: manga.original_name
                .and_then(|n| n.content)
                .map(|n| sanitize_quotes(&n))
                .unwrap_or_default(),
            localized_title: localized(&manga.titles, locale).map(sanitize_quotes),
            alternative_names: contents(&manga.alternative_names),
            cover_url: manga.cover.as_ref().and_then(|c| c.url()).map(String::from),
        })
    }).collect()
}

pub fn manga_record(body: Value, locale: &str) -> Result<MangaRecord, RelayError> {
    let manga = data::<TitleData>(body)?
        .and_then(|d| d.manga)
        .ok_or_else(|| RelayError::NotFound(String::from("Manga not found")))?;

    let description = manga.localizations.iter()
        .filter(|loc| loc.lang.as_deref() == Some(locale))
        .flat_map(|loc| &loc.description)
        .flat_map(|block| &block.content)
        .filter_map(|node| node.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\\', "");

    Ok(MangaRecord {
        id: manga.id.unwrap_or_default(),
        slug: manga.slug.unwrap_or_default(),
        description: sanitize_quotes(&description),
        title_name: localized(&manga.titles, locale).map(sanitize_quotes),
        alternative_names: contents(&manga.alternative_names),
        chapter_count: manga.chapters.unwrap_or(0),
        status: manga.status.unwrap_or_default(),
        translation_status: manga.translition_status.unwrap_or_default(),
        primary_branch_id: primary_branch(&manga.branches),
        genres: labels(&manga.genres),
        tags: labels(&manga.tags),
        cover_url: manga.cover.as_ref().and_then(|c| c.url()).unwrap_or_default().to_string(),
    })
}

fn scalar_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// One page of a branch's chapter listing, edges kept in upstream order.
pub fn chapter_page(body: Value) -> Result<Page<ChapterEntry>, RelayError> {
    let connection = data::<ChaptersData>(body)?
        .and_then(|d| d.manga_chapters)
        .ok_or_else(|| RelayError::MissingField(String::from("data.mangaChapters")))?;

    let page_info = connection.page_info
        .ok_or_else(|| RelayError::MissingField(String::from("data.mangaChapters.pageInfo")))?;
    let has_next_page = page_info.has_next_page
        .ok_or_else(|| RelayError::MissingField(String::from("data.mangaChapters.pageInfo.hasNextPage")))?;

    let entries = connection.edges.into_iter().enumerate().map(|(i, edge)| {
        let path = format!("data.mangaChapters.edges[{}].node", i);
        let node = edge.node.ok_or_else(|| RelayError::MissingField(path.clone()))?;
        Ok(ChapterEntry {
            id: node.id.ok_or_else(|| RelayError::MissingField(format!("{}.id", path)))?,
            slug: node.slug.unwrap_or_default(),
            name: node.name,
            number: scalar_text(node.number),
            volume: scalar_text(node.volume),
        })
    }).collect::<Result<Vec<_>, RelayError>>()?;

    Ok(Page {
        entries,
        page_info: PageInfo { end_cursor: page_info.end_cursor, has_next_page },
    })
}

pub fn image_set(body: Value) -> Result<ImageSet, RelayError> {
    let pages = data::<PagesData>(body)?
        .and_then(|d| d.manga_tachiyomi_chapter_pages)
        .ok_or_else(|| RelayError::MissingField(String::from("data.mangaTachiyomiChapterPages")))?;

    Ok(ImageSet {
        links: pages.pages.into_iter().map(|p| p.url.unwrap_or_default()).collect(),
    })
}
