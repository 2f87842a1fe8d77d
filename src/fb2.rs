//! FictionBook 2 document builder.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{trace, warn};

pub const CONTENT_TYPE: &str = "application/x-fictionbook+xml";

const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

/// Index of a section inside its builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionId(usize);

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Paragraph(String),
    Image(String),
    EmptyLine,
}

#[derive(Debug, Clone)]
struct Section {
    heading: String,
    blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
struct Binary {
    id: String,
    /// XML-safe id, unique within the document
    xml_id: String,
    content_type: String,
    data: Vec<u8>,
}

/// Collects sections and image payloads, then renders them as one FB2 file.
#[derive(Debug, Clone)]
pub struct Fb2Builder {
    title: String,
    lang: String,
    sections: Vec<Section>,
    binaries: Vec<Binary>,
}

impl Fb2Builder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lang: String::from("ru"),
            sections: Vec::new(),
            binaries: Vec::new(),
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_section(&mut self, heading: impl Into<String>) -> SectionId {
        self.sections.push(Section { heading: heading.into(), blocks: Vec::new() });
        SectionId(self.sections.len() - 1)
    }

    pub fn add_paragraph(&mut self, section: SectionId, text: impl Into<String>) {
        self.push(section, Block::Paragraph(text.into()));
    }

    /// Place a reference to the binary `image_id` at the end of the section.
    pub fn add_image(&mut self, section: SectionId, image_id: &str) {
        self.push(section, Block::Image(image_id.to_string()));
    }

    /// Attach image bytes. A second payload with the same id is ignored.
    pub fn add_binary(&mut self, section: SectionId, image_id: &str, data: Vec<u8>) {
        trace!("Binary {} ({} bytes) for section {}", image_id, data.len(), section.0);
        if self.binaries.iter().any(|b| b.id == image_id) {
            return;
        }
        let content_type = image::guess_format(&data)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| DEFAULT_IMAGE_TYPE.to_string());
        let xml_id = self.unique_xml_id(image_id);
        self.binaries.push(Binary { id: image_id.to_string(), xml_id, content_type, data });
    }

    fn unique_xml_id(&self, image_id: &str) -> String {
        let base = binary_id(image_id);
        let taken = |candidate: &str| self.binaries.iter().any(|b| b.xml_id == candidate);
        if !taken(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn add_empty_line(&mut self, section: SectionId) {
        self.push(section, Block::EmptyLine);
    }

    fn push(&mut self, section: SectionId, block: Block) {
        match self.sections.get_mut(section.0) {
            Some(s) => s.blocks.push(block),
            None => warn!("Dropping content for unknown section {}", section.0),
        }
    }

    /// Render the document. Image references whose binary never arrived are
    /// left out.
    pub fn generate(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        out.push('\n');
        out.push_str(r#"<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink">"#);
        out.push('\n');

        let title = xml_escape(&self.title);
        out.push_str("<description><title-info>");
        out.push_str(&format!("<book-title>{}</book-title><lang>{}</lang>", title, xml_escape(&self.lang)));
        out.push_str("</title-info><document-info>");
        out.push_str(&format!("<program-used>{} {}</program-used>", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
        out.push_str("</document-info></description>\n");

        out.push_str(&format!("<body><title><p>{}</p></title>\n", title));
        for section in &self.sections {
            out.push_str(&format!("<section><title><p>{}</p></title>\n", xml_escape(&section.heading)));
            for block in &section.blocks {
                match block {
                    Block::Paragraph(text) => out.push_str(&format!("<p>{}</p>\n", xml_escape(text))),
                    Block::EmptyLine => out.push_str("<empty-line/>\n"),
                    Block::Image(id) => match self.binaries.iter().find(|b| &b.id == id) {
                        Some(binary) => out.push_str(&format!("<image l:href=\"#{}\"/>\n", binary.xml_id)),
                        None => warn!("No binary attached for image {}, skipping", id),
                    },
                }
            }
            out.push_str("</section>\n");
        }
        out.push_str("</body>\n");

        for binary in &self.binaries {
            out.push_str(&format!(
                "<binary id=\"{}\" content-type=\"{}\">{}</binary>\n",
                binary.xml_id,
                binary.content_type,
                STANDARD.encode(&binary.data)
            ));
        }
        out.push_str("</FictionBook>\n");
        out.into_bytes()
    }
}

/// Escape markup characters and drop those XML 1.0 does not allow at all.
pub fn xml_escape(s: &str) -> String {
    s.chars()
        .filter(|&c| is_xml_char(c))
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

// XML ids may not start with a digit and media ids usually do.
fn binary_id(id: &str) -> String {
    let cleaned: String = id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    match cleaned.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => cleaned,
        _ => format!("img_{}", cleaned),
    }
}
