//! Cursor pagination over a GraphQL connection.

use log::debug;
use serde_json::{Map, Value};

use crate::error::RelayError;
use crate::fetcher::{Fetcher, Transport};

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Entries of one page plus the continuation for the next request.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub entries: Vec<T>,
    pub page_info: PageInfo,
}

/// Sends `query` repeatedly, advancing the `after` variable, until upstream
/// reports no further page. `extract` turns one raw response into a page.
///
/// Pages are requested one after the other and their entries appended in
/// order. Any failing page fails the whole listing.
pub async fn aggregate<T, E, F>(
    fetcher: &Fetcher<T>,
    query: &str,
    initial_variables: Map<String, Value>,
    page_size: u32,
    max_pages: usize,
    mut extract: F,
) -> Result<Vec<E>, RelayError>
where
    T: Transport,
    F: FnMut(Value) -> Result<Page<E>, RelayError>,
{
    let mut variables = initial_variables;
    variables.insert(String::from("first"), Value::from(page_size));
    variables.entry("after").or_insert(Value::Null);

    let mut entries = Vec::new();
    let mut pages = 0;
    let mut has_next_page = true;

    while has_next_page {
        if pages == max_pages {
            return Err(RelayError::PageLimitExceeded(max_pages));
        }

        let payload = serde_json::json!({ "query": query, "variables": variables });
        let page = extract(fetcher.fetch(&payload).await?)?;
        pages += 1;

        debug!("Page {} returned {} entries", pages, page.entries.len());
        entries.extend(page.entries);
        has_next_page = page.page_info.has_next_page;

        if has_next_page {
            let cursor = page.page_info.end_cursor
                .ok_or_else(|| RelayError::MissingField(String::from("pageInfo.endCursor")))?;
            variables.insert(String::from("after"), Value::String(cursor));
        }
    }

    Ok(entries)
}
