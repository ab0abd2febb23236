use serde::Deserialize;

use super::page::ListItem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Folder,
    #[default]
    Other,
}

impl MediaType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif" | "avif" | "heic" => {
                Some(Self::Image)
            }
            "webm" | "mp4" | "mkv" | "avi" | "mov" | "m4v" => Some(Self::Video),
            "mp3" | "flac" | "ogg" | "wav" | "m4a" | "opus" => Some(Self::Audio),
            _ => None,
        }
    }
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "folder" | "directory" | "dir" => Self::Folder,
            _ => Self::Other,
        }
    }
}

/// One entry of a listing or search result.
///
/// Only `path` is interpreted by the pager; the remaining fields are carried
/// through untouched for renderers and sibling features.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaItem {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "isFavorite")]
    pub favorite: bool,
    #[serde(default)]
    pub mtime: i64,
    #[serde(default)]
    pub size: i64,
}

impl MediaItem {
    pub fn new(path: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            path: path.into(),
            name: None,
            media_type,
            tags: Vec::new(),
            favorite: false,
            mtime: 0,
            size: 0,
        }
    }

    pub fn new_folder(path: impl Into<String>) -> Self {
        Self::new(path, MediaType::Folder)
    }

    /// Name shown on a tile: the explicit name, or the last path segment.
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.name.as_deref() {
            return name;
        }
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(&self.path)
    }

    pub fn is_folder(&self) -> bool {
        self.media_type == MediaType::Folder
    }
}

impl ListItem for MediaItem {
    fn key(&self) -> &str {
        &self.path
    }
}
