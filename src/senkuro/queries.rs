use serde_json::{Value, json};

pub const SEARCH: &str = r#"
    query searchTachiyomiManga($query: String) {
        mangaTachiyomiSearch(query: $query) {
            mangas { id slug originalName { lang content } titles { lang content } alternativeNames { lang content } cover { original { url } } }
        }
    }
"#;

pub const TITLE: &str = r#"
    query($slug: String!) {
        manga(slug: $slug) {
            id slug localizations { lang description { __typename ... on TiptapNodeNestedBlock { content { ... on TiptapNodeText { text } } } } }
            titles { lang content }
            alternativeNames { content }
            chapters status translitionStatus
            branches { id lang chapters }
            genres { id titles { content } }
            tags { id titles { content } }
            cover { id blurhash original { url } }
        }
    }
"#;

pub const CHAPTERS: &str = r#"
    query($branchId: ID!, $after: String, $first: Int) {
        mangaChapters(branchId: $branchId, after: $after, first: $first) {
            pageInfo { endCursor hasNextPage }
            edges { node { slug id name number volume } }
        }
    }
"#;

pub const CHAPTER_PAGES: &str = r#"
    query fetchTachiyomiChapterPages($mangaId: ID!, $chapterId: ID!) {
        mangaTachiyomiChapterPages(mangaId: $mangaId, chapterId: $chapterId) { pages { url } }
    }
"#;

pub fn search(text: &str) -> Value {
    json!({ "query": SEARCH, "variables": { "query": text } })
}

pub fn title(slug: &str) -> Value {
    json!({ "query": TITLE, "variables": { "slug": slug } })
}

pub fn chapter_pages(manga_id: &str, chapter_id: &str) -> Value {
    json!({ "query": CHAPTER_PAGES, "variables": { "mangaId": manga_id, "chapterId": chapter_id } })
}
