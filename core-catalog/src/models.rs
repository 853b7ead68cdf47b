//! Domain models for the sheet catalog.
//!
//! Rows travel through the `TableStore` as `serde_json::Value` and are
//! decoded into these types at the repository boundary. Assembled types
//! (`Song`) carry fields joined from other tables; their row-shaped
//! counterparts (`VariantRow`, `FavoriteRow`) match table columns exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category tags a song can carry. Fixed enumeration; a song holds a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Christmas,
    Easter,
    Worship,
    Others,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 4] = [
        Category::Christmas,
        Category::Easter,
        Category::Worship,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Christmas => "Christmas",
            Category::Easter => "Easter",
            Category::Worship => "Worship",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instrumentation a sheet is arranged for. Exactly one per song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Piano,
    Band,
}

impl Instrument {
    pub const ALL: [Instrument; 2] = [Instrument::Piano, Instrument::Band];

    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::Piano => "Piano",
            Instrument::Band => "Band",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-key rendition of a song, as presented to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Musical key label, e.g. "C", "Bb", "F#m".
    pub key: String,
    /// Public URL of the sheet PDF.
    pub pdf_url: String,
}

/// Row shape of the `song_variants` table: a [`Variant`] plus its owner.
///
/// At most one row exists per `(song_id, key)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRow {
    pub song_id: String,
    pub key: String,
    pub pdf_url: String,
}

impl VariantRow {
    pub fn into_variant(self) -> Variant {
        Variant {
            key: self.key,
            pdf_url: self.pdf_url,
        }
    }
}

/// Row shape of the `user_favorites` table.
///
/// At most one row exists per `(user_id, song_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRow {
    pub user_id: String,
    pub song_id: String,
}

/// A catalog entry, assembled from its row plus joined variants and the
/// viewer's favorite state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Store-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category tags.
    pub categories: Vec<Category>,
    /// Instrumentation.
    pub instrument: Instrument,
    /// How often the song has surfaced through search.
    #[serde(default)]
    pub search_count: i64,
    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Key variants, joined from `song_variants`.
    #[serde(default)]
    pub variants: Vec<Variant>,
    /// Whether the requesting viewer has favorited this song. Always false
    /// for anonymous viewers.
    #[serde(default)]
    pub is_favorite: bool,
}

impl Song {
    /// Validates fields prior to persistence.
    pub fn validate_name(name: &str) -> Result<(), String> {
        if name.trim().is_empty() {
            return Err("Song name cannot be empty".to_string());
        }
        Ok(())
    }

    /// The variant for a given key, if one exists.
    pub fn variant(&self, key: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.key == key)
    }
}

/// Row shape of the `admins` table: an email with admin capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminGrant {
    pub email: String,
}

/// Row shape of the `profiles` table, mirroring the identity provider's
/// account data into the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_song_decodes_from_bare_row() {
        let row = json!({
            "id": "s1",
            "name": "O Holy Night",
            "categories": ["Christmas", "Worship"],
            "instrument": "Piano",
            "search_count": 3,
            "created_at": "2024-12-01T10:00:00Z",
        });
        let song: Song = serde_json::from_value(row).unwrap();
        assert_eq!(song.name, "O Holy Night");
        assert_eq!(song.categories, vec![Category::Christmas, Category::Worship]);
        assert_eq!(song.instrument, Instrument::Piano);
        assert!(song.variants.is_empty());
        assert!(!song.is_favorite);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let row = json!({
            "id": "s1",
            "name": "x",
            "categories": ["Jazz"],
            "instrument": "Piano",
            "created_at": "2024-12-01T10:00:00Z",
        });
        assert!(serde_json::from_value::<Song>(row).is_err());
    }

    #[test]
    fn test_validate_name_rejects_blank() {
        assert!(Song::validate_name("  ").is_err());
        assert!(Song::validate_name("Agnus Dei").is_ok());
    }

    #[test]
    fn test_variant_lookup_by_key() {
        let song = Song {
            id: "s1".to_string(),
            name: "x".to_string(),
            categories: vec![Category::Others],
            instrument: Instrument::Band,
            search_count: 0,
            created_at: Utc::now(),
            variants: vec![Variant {
                key: "Bb".to_string(),
                pdf_url: "https://example.com/x.pdf".to_string(),
            }],
            is_favorite: false,
        };
        assert!(song.variant("Bb").is_some());
        assert!(song.variant("C").is_none());
    }
}
