use scraper::{ElementRef, Html, Selector};

use crate::error::RelayError;

/// One content element of a chapter page.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Paragraph(String),
    /// Media ids of the images embedded in one element, in document order
    Images(Vec<String>),
}

/// Everything taken from a chapter page before images are downloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDraft {
    pub title: String,
    pub heading: String,
    pub blocks: Vec<ContentBlock>,
}

impl ChapterDraft {
    /// Media ids across all blocks, in document order
    pub fn media_ids(&self) -> Vec<String> {
        self.blocks.iter()
            .filter_map(|block| match block {
                ContentBlock::Images(ids) => Some(ids.iter().cloned()),
                ContentBlock::Paragraph(_) => None,
            })
            .flatten()
            .collect()
    }
}

fn selector(css: &str) -> Result<Selector, RelayError> {
    Selector::parse(css).map_err(|_| RelayError::SelectorError(format!("Failed to parse {} selector", css)))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn first<'a>(root: ElementRef<'a>, css: &str, what: &str) -> Result<ElementRef<'a>, RelayError> {
    root.select(&selector(css)?).next()
        .ok_or_else(|| RelayError::ElementNotFound(String::from(what)))
}

fn child_paragraphs(parent: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    parent.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "p")
}

pub(super) fn ranobehub(html: &str) -> Result<ChapterDraft, RelayError> {
    let document = Html::parse_document(html.trim());
    let root = document.root_element();

    let title = text_of(first(root, "title", "Page title")?)
        .split(" / ")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    let heading = text_of(first(root, "h1.header", "Chapter header h1.header")?).trim().to_string();
    let container = first(root, "div.ui.text.container[data-container]", "Chapter text container")?;

    let img_selector = selector("img")?;
    let mut blocks = Vec::new();
    for paragraph in child_paragraphs(container) {
        let images = paragraph.select(&img_selector).collect::<Vec<_>>();
        if images.is_empty() {
            blocks.push(ContentBlock::Paragraph(text_of(paragraph)));
            continue;
        }
        let ids = images.into_iter()
            .map(|img| {
                img.attr("data-media-id")
                    .map(|id| id.trim().to_string())
                    .ok_or_else(|| RelayError::AttributeNotFound(String::from("data-media-id on chapter image")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        blocks.push(ContentBlock::Images(ids));
    }

    Ok(ChapterDraft { title, heading, blocks })
}

pub(super) fn ranobelib(html: &str) -> Result<ChapterDraft, RelayError> {
    let document = Html::parse_document(html.trim());
    let root = document.root_element();

    let header_selector = selector("div.reader-header-action__text")?;
    let mut headers = root.select(&header_selector).map(|e| text_of(e).trim().to_string());
    let title = headers.next()
        .ok_or_else(|| RelayError::ElementNotFound(String::from("Book title in reader header")))?;
    let heading = headers.next()
        .ok_or_else(|| RelayError::ElementNotFound(String::from("Chapter title in reader header")))?;

    // A page without a text container is an empty chapter.
    let blocks = match root.select(&selector("div.container")?).next() {
        Some(container) => child_paragraphs(container)
            .map(|p| ContentBlock::Paragraph(text_of(p)))
            .collect(),
        None => Vec::new(),
    };

    Ok(ChapterDraft { title, heading, blocks })
}

pub(super) fn ranobepoisk(html: &str) -> Result<ChapterDraft, RelayError> {
    let document = Html::parse_document(html.trim());
    let root = document.root_element();

    let h1 = first(root, "h1", "Chapter h1")?;
    let title = text_of(first(h1, "a", "Book link inside h1")?).trim().to_string();
    let heading = text_of(h1).trim().replace(&title, "").trim().to_string();

    let wrapper = first(root, "div.py-4", "Chapter wrapper div.py-4")?;
    let container = first(wrapper, "div.chapter-text-container", "Chapter text container")?;
    let blocks = container.select(&selector("p")?)
        .map(|p| ContentBlock::Paragraph(text_of(p)))
        .collect();

    Ok(ChapterDraft { title, heading, blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANOBEHUB_PAGE: &str = r#"
        <html><head><title>Повелитель тайн / Глава 1 / RanobeHub</title></head>
        <body>
            <h1 class="header"> Глава 1. Багровый </h1>
            <div class="ui text container" data-container="42">
                <p>Первый абзац</p>
                <div>не абзац</div>
                <p><img data-media-id="101"><img data-media-id="102"></p>
                <p>Второй <b>абзац</b></p>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_ranobehub_blocks() {
        let draft = ranobehub(RANOBEHUB_PAGE).unwrap();

        assert_eq!(draft.title, "Повелитель тайн");
        assert_eq!(draft.heading, "Глава 1. Багровый");
        assert_eq!(draft.blocks, vec![
            ContentBlock::Paragraph(String::from("Первый абзац")),
            ContentBlock::Images(vec![String::from("101"), String::from("102")]),
            ContentBlock::Paragraph(String::from("Второй абзац")),
        ]);
        assert_eq!(draft.media_ids(), vec!["101", "102"]);
    }

    #[test]
    fn test_ranobehub_image_without_media_id() {
        let page = RANOBEHUB_PAGE.replace(r#"<img data-media-id="102">"#, "<img src=\"x.png\">");
        assert!(matches!(ranobehub(&page), Err(RelayError::AttributeNotFound(_))));
    }

    #[test]
    fn test_ranobehub_missing_container() {
        let page = "<html><head><title>T</title></head><body><h1 class=\"header\">H</h1></body></html>";
        assert!(matches!(ranobehub(page), Err(RelayError::ElementNotFound(_))));
    }

    #[test]
    fn test_ranobelib_direct_paragraphs_only() {
        let page = r#"
            <div class="reader-header-action__text">Книга</div>
            <div class="reader-header-action__text">Том 1 Глава 3</div>
            <div class="container">
                <p>Раз</p>
                <section><p>вложенный</p></section>
                <p>Два</p>
            </div>
        "#;

        let draft = ranobelib(page).unwrap();

        assert_eq!(draft.title, "Книга");
        assert_eq!(draft.heading, "Том 1 Глава 3");
        assert_eq!(draft.blocks, vec![
            ContentBlock::Paragraph(String::from("Раз")),
            ContentBlock::Paragraph(String::from("Два")),
        ]);
    }

    #[test]
    fn test_ranobelib_without_container_is_empty() {
        let page = r#"<div class="reader-header-action__text">A</div><div class="reader-header-action__text">B</div>"#;
        assert!(ranobelib(page).unwrap().blocks.is_empty());
    }

    #[test]
    fn test_ranobepoisk_heading_without_title() {
        let page = r#"
            <h1><a href="/book">Книга</a> Глава 7</h1>
            <div class="py-4"><div class="chapter-text-container">
                <div><p>Один</p></div>
                <p>Два</p>
            </div></div>
        "#;

        let draft = ranobepoisk(page).unwrap();

        assert_eq!(draft.title, "Книга");
        assert_eq!(draft.heading, "Глава 7");
        assert_eq!(draft.blocks, vec![
            ContentBlock::Paragraph(String::from("Один")),
            ContentBlock::Paragraph(String::from("Два")),
        ]);
    }
}
