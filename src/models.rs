//! Records
//!
//! Upstream records keep the origin's JSON field names so the origin body and
//! the cached payload share one shape. Outward records are what the content
//! services hand to the transport layer.

use serde::{Deserialize, Serialize};

// ===== Upstream records =====

/// One catalog entry as served by the origin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    pub id: String,
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "hidden_komik")]
    pub title_id: String,
    #[serde(rename = "icon_komik")]
    pub icon_url: String,
    #[serde(rename = "hiddenNewChapter")]
    pub last_chapter: String,
    #[serde(rename = "lastModified")]
    pub modified_date: String,
    pub genre: String,
    #[serde(rename = "nama_lain")]
    pub alias: String,
    #[serde(rename = "pengarang")]
    pub author: String,
    pub status: String,
    #[serde(rename = "published")]
    pub publish_year: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogListResponse {
    #[serde(rename = "komik", default)]
    pub items: Vec<CatalogItem>,
}

/// One chapter of a catalog entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubListItem {
    #[serde(rename = "hidden_chapter")]
    pub number: f32,
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "hidden_komik")]
    pub title_id: String,
    #[serde(rename = "waktu")]
    pub modified_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubListResponse {
    #[serde(rename = "komik", default)]
    pub items: Vec<SubListItem>,
}

/// One page of a chapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageItem {
    pub url: String,
    pub page: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageListResponse {
    #[serde(rename = "chapter", default)]
    pub items: Vec<PageItem>,
}

// ===== Outward records =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub title_id: String,
    pub icon_url: String,
    pub last_chapter: String,
    pub genre: String,
    pub alias: String,
    pub author: String,
    pub status: String,
    #[serde(rename = "publish_date")]
    pub publish_year: String,
    pub summary: String,
}

impl From<CatalogItem> for CatalogEntry {
    fn from(item: CatalogItem) -> Self {
        Self {
            title: item.title,
            title_id: item.title_id,
            icon_url: item.icon_url,
            last_chapter: item.last_chapter,
            genre: item.genre,
            alias: item.alias,
            author: item.author,
            status: item.status,
            publish_year: item.publish_year,
            summary: item.summary,
        }
    }
}

/// Catalog split by the popular tag set
///
/// An empty side is `None`; a catalog with no entries at all never gets
/// partitioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPartition {
    #[serde(rename = "popular_mangas")]
    pub popular: Option<Vec<CatalogEntry>>,
    #[serde(rename = "latest_mangas")]
    pub latest: Option<Vec<CatalogEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub number: String,
    pub title: String,
    pub title_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub image_url: String,
}

// ===== Requests =====

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubListRequest {
    pub title_id: String,
}

impl SubListRequest {
    pub fn new(title_id: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageListRequest {
    pub title_id: String,
    pub chapter: f32,
}

impl PageListRequest {
    pub fn new(title_id: impl Into<String>, chapter: f32) -> Self {
        Self {
            title_id: title_id.into(),
            chapter,
        }
    }

    /// Build a request from raw query values
    ///
    /// A chapter that does not parse as a finite `f32` becomes `0.0`.
    pub fn parse(title_id: impl Into<String>, chapter: &str) -> Self {
        let chapter = chapter
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .unwrap_or(0.0);
        Self::new(title_id, chapter)
    }
}
