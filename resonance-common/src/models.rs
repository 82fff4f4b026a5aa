//! Shared data model

use serde::{Deserialize, Serialize};

/// Placeholder for a missing song name or artist
pub const UNKNOWN: &str = "Unknown";

/// One recommended song
///
/// Serialized in camelCase for the presentation layer. `matched_track_id`
/// is always emitted; `null` means the catalog produced no match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    /// Never empty
    pub name: String,
    /// Never empty
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub matched_track_id: Option<String>,
}

impl SongRecord {
    /// Create a record with only the required fields
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            album: None,
            year: None,
            genres: Vec::new(),
            explanation: None,
            matched_track_id: None,
        }
    }

    /// Free-text catalog query: `"<name> <artist>"`
    pub fn search_query(&self) -> String {
        format!("{} {}", self.name, self.artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_query() {
        let song = SongRecord::new("Bohemian Rhapsody", "Queen");
        assert_eq!(song.search_query(), "Bohemian Rhapsody Queen");
    }

    #[test]
    fn test_serializes_camel_case_with_null_match() {
        let song = SongRecord::new("Heroes", "David Bowie");
        let value = serde_json::to_value(&song).unwrap();

        assert_eq!(value["name"], json!("Heroes"));
        assert_eq!(value["genres"], json!([]));
        assert!(value.get("matchedTrackId").is_some());
        assert!(value["matchedTrackId"].is_null());
    }
}
