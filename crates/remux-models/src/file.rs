//! Input file descriptors supplied by the upload collaborator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Broad media category of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
    Image,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file already stored under the upload root by the upload collaborator.
///
/// The engine treats these as read-only references: it never deletes,
/// renames, or writes into the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InputFile {
    /// Name the user uploaded the file under.
    pub original_name: String,
    /// Sanitized name the file is stored under inside the upload root.
    pub stored_name: String,
    /// Media category, as classified by the upload collaborator.
    pub kind: MediaKind,
    /// File size in bytes.
    #[serde(default)]
    pub size_bytes: u64,
}

impl InputFile {
    pub fn new(
        original_name: impl Into<String>,
        stored_name: impl Into<String>,
        kind: MediaKind,
        size_bytes: u64,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            stored_name: stored_name.into(),
            kind,
            size_bytes,
        }
    }

    /// Stem of the stored name, used to derive output filenames.
    pub fn stem(&self) -> &str {
        match self.stored_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.stored_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem() {
        let file = InputFile::new("song.mp3", "abc123_song.mp3", MediaKind::Audio, 10);
        assert_eq!(file.stem(), "abc123_song");

        let no_ext = InputFile::new("raw", "raw", MediaKind::Audio, 0);
        assert_eq!(no_ext.stem(), "raw");

        let dotfile = InputFile::new(".hidden", ".hidden", MediaKind::Audio, 0);
        assert_eq!(dotfile.stem(), ".hidden");
    }

    #[test]
    fn test_media_kind_serde() {
        let json = serde_json::to_string(&MediaKind::Video).unwrap();
        assert_eq!(json, "\"video\"");
    }
}
