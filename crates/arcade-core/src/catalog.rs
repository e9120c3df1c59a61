//! Catalog entries and their detail attributes.
//!
//! Entries are owned by the store and immutable from the service's point of
//! view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::GameId;

// ============================================================================
// Platforms
// ============================================================================

/// An operating system a game ships for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    Mac,
    /// Linux.
    Linux,
}

impl Platform {
    /// Flag order used by the store's platform column.
    const FLAG_ORDER: [Self; 3] = [Self::Windows, Self::Mac, Self::Linux];

    /// Decode the store's positional flag string (`"101"` = Windows + Linux).
    ///
    /// Missing positions count as unsupported; anything other than `'1'` is
    /// treated as unset.
    #[must_use]
    pub fn decode_flags(flags: &str) -> Vec<Self> {
        flags
            .chars()
            .zip(Self::FLAG_ORDER)
            .filter(|(flag, _)| *flag == '1')
            .map(|(_, platform)| platform)
            .collect()
    }
}

// ============================================================================
// Entries
// ============================================================================

/// One game as listed in the paginated catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Store key.
    pub id: GameId,
    /// Display name.
    pub name: String,
    /// Release date, when known.
    pub release_date: Option<NaiveDate>,
    /// Free-text owner-count bucket, e.g. `"20000 - 50000"`.
    pub estimated_owners: Option<String>,
    /// Price in cents.
    pub price_cents: i64,
    /// Long description.
    pub description: Option<String>,
    /// Metacritic score (0-100), absent when unrated.
    pub review_score: Option<i32>,
    /// Supported platforms.
    pub platforms: Vec<Platform>,
    /// Header image URL.
    pub header_image: Option<String>,
}

/// The multi-valued attributes resolved for a detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameAttributes {
    /// Trailer/video URLs.
    pub videos: Vec<String>,
    /// Category names.
    pub categories: Vec<String>,
    /// Genre names.
    pub genres: Vec<String>,
    /// Tag names.
    pub tags: Vec<String>,
    /// Supported interface languages.
    pub languages: Vec<String>,
    /// Supported audio languages.
    pub audio_languages: Vec<String>,
    /// Developer names.
    pub developers: Vec<String>,
    /// Publisher names.
    pub publishers: Vec<String>,
}

/// A catalog entry with all attributes and the caller's purchase status.
///
/// `purchased` is scoped to the principal that requested the detail and must
/// be recomputed for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogDetail {
    /// The listed entry.
    #[serde(flatten)]
    pub entry: CatalogEntry,
    /// Multi-valued attributes.
    #[serde(flatten)]
    pub attributes: GameAttributes,
    /// Whether the requesting principal owns this game.
    pub purchased: bool,
}

/// Split a comma-joined attribute list as returned by the detail procedure.
///
/// Empty items are dropped, so `None`, `""` and `","` all yield an empty list.
#[must_use]
pub fn split_list(joined: Option<&str>) -> Vec<String> {
    joined
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}
