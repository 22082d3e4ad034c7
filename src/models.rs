//! Core data models used throughout shotlist.
//!
//! These types represent the people extracted from a script, the normalized
//! media returned by the provider, and the operator's selections that flow
//! into the CSV export and the ZIP bundle.

use serde::{Deserialize, Serialize};

/// A person mentioned in the script.
///
/// Has no natural key: people are identified by their index in the
/// extracted list, and names may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(rename = "searchTerm", default)]
    pub search_term: String,
}

/// Which of the two result lists a media item was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Photo,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Video, MediaKind::Photo];

    /// Label used in the CSV `Media Type` column and CLI arguments.
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Photo => "photo",
        }
    }

    /// Directory name inside the bundle.
    pub fn plural(&self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Photo => "photos",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Photo => "jpg",
        }
    }

    /// File name a selected item gets inside the bundle.
    pub fn file_name(&self, media_id: &str) -> String {
        format!("{}.{}", media_id, self.extension())
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" | "videos" => Some(MediaKind::Video),
            "photo" | "photos" | "image" | "images" => Some(MediaKind::Photo),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized provider search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Provider id, unique within its kind.
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub preview_url: String,
    /// Full-resolution reference used for download and export.
    pub comp_url: String,
    pub date_created: String,
}

/// Search results for one person, in the same order as the people list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonResults {
    pub person: Person,
    pub videos: Vec<MediaItem>,
    pub photos: Vec<MediaItem>,
}

impl PersonResults {
    pub fn items(&self, kind: MediaKind) -> &[MediaItem] {
        match kind {
            MediaKind::Video => &self.videos,
            MediaKind::Photo => &self.photos,
        }
    }

    /// Looks up a media item by kind and id.
    pub fn find(&self, kind: MediaKind, media_id: &str) -> Option<&MediaItem> {
        self.items(kind).iter().find(|m| m.id == media_id)
    }
}

/// Identity of a selection: the same provider id may appear under several
/// people, so uniqueness is per `(entity_index, media_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionKey {
    pub entity_index: usize,
    pub media_id: String,
}

impl SelectionKey {
    pub fn new(entity_index: usize, media_id: impl Into<String>) -> Self {
        Self {
            entity_index,
            media_id: media_id.into(),
        }
    }
}

/// An operator-chosen media item destined for export and download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub entity_index: usize,
    pub entity_name: String,
    pub media_id: String,
    pub kind: MediaKind,
    pub comp_url: String,
    pub file_name: String,
}

impl Selection {
    pub fn new(entity_index: usize, entity_name: &str, media: &MediaItem, kind: MediaKind) -> Self {
        Self {
            entity_index,
            entity_name: entity_name.to_string(),
            media_id: media.id.clone(),
            kind,
            comp_url: media.comp_url.clone(),
            file_name: kind.file_name(&media.id),
        }
    }

    pub fn key(&self) -> SelectionKey {
        SelectionKey::new(self.entity_index, self.media_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_uses_camel_case_search_term() {
        let p: Person =
            serde_json::from_str(r#"{"name":"Jane Doe","searchTerm":"Jane Doe senator"}"#).unwrap();
        assert_eq!(p.name, "Jane Doe");
        assert_eq!(p.search_term, "Jane Doe senator");
    }

    #[test]
    fn file_names_follow_kind() {
        assert_eq!(MediaKind::Video.file_name("123"), "123.mp4");
        assert_eq!(MediaKind::Photo.file_name("abc"), "abc.jpg");
    }

    #[test]
    fn parse_kind_accepts_plurals() {
        assert_eq!(MediaKind::parse("Videos"), Some(MediaKind::Video));
        assert_eq!(MediaKind::parse("image"), Some(MediaKind::Photo));
        assert_eq!(MediaKind::parse("audio"), None);
    }

    #[test]
    fn selection_keys_compare_by_value() {
        // "1" + "23" and "12" + "3" would collide as concatenated strings.
        assert_ne!(SelectionKey::new(1, "23"), SelectionKey::new(12, "3"));
        assert_eq!(SelectionKey::new(4, "x"), SelectionKey::new(4, "x"));
    }
}
