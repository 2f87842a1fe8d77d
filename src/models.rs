use serde::{Deserialize, Serialize};

/// One hit of a title search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub slug: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    /// Title in the configured locale, if upstream has one
    #[serde(rename = "titles")]
    pub localized_title: Option<String>,
    #[serde(rename = "alternativeNames", with = "comma_list")]
    pub alternative_names: Vec<String>,
    #[serde(rename = "cover")]
    pub cover_url: Option<String>,
}

/// Normalized manga details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MangaRecord {
    pub id: String,
    pub slug: String,
    pub description: String,
    pub title_name: Option<String>,
    #[serde(rename = "alternativeNames", with = "comma_list")]
    pub alternative_names: Vec<String>,
    #[serde(rename = "chapters")]
    pub chapter_count: u64,
    pub status: String,
    #[serde(rename = "translitionStatus")]
    pub translation_status: String,
    /// Branch with the most chapters; the first one wins a tie
    #[serde(rename = "branches")]
    pub primary_branch_id: Option<String>,
    #[serde(with = "comma_list")]
    pub genres: Vec<String>,
    #[serde(with = "comma_list")]
    pub tags: Vec<String>,
    #[serde(rename = "cover")]
    pub cover_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterEntry {
    pub id: String,
    pub slug: String,
    pub name: Option<String>,
    pub number: String,
    pub volume: String,
}

/// Page image URLs of one chapter, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    pub links: Vec<String>,
}

/// Multi-valued text fields travel as one `", "` separated string.
pub mod comma_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub const SEPARATOR: &str = ", ";

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&values.join(SEPARATOR))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let joined = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if joined.is_empty() {
            return Ok(Vec::new());
        }
        Ok(joined.split(SEPARATOR).map(String::from).collect())
    }
}
