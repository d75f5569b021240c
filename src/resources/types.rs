/// TheTVDB API response types for deserialization.
///
/// These structures mirror the JSON response format of the remote API. Only
/// the fields the client exposes are mapped, everything else is ignored.
use serde::{Deserialize, Serialize};

/// The envelope every JSON response is wrapped in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope<T> {
    /// The actual payload
    pub data: T,
    /// Soft errors, e.g. an unknown language that fell back to English
    #[serde(default)]
    pub errors: Option<JsonErrors>,
    /// Pagination links of paged routes
    #[serde(default)]
    pub links: Option<Links>,
}

/// Soft errors reported next to the payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonErrors {
    pub invalid_filters: Option<Vec<String>>,
    pub invalid_language: Option<String>,
    pub invalid_query_params: Option<Vec<String>>,
}

/// Page numbers of a paged response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Links {
    pub first: Option<u32>,
    pub last: Option<u32>,
    pub next: Option<u32>,
    pub previous: Option<u32>,
}

/// A TV series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: u64,
    /// The series title in the requested language (may be null if untranslated)
    pub series_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub first_aired: Option<String>,
    pub network: Option<String>,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub imdb_id: Option<String>,
    pub slug: Option<String>,
}

/// A single hit of a series search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSearchResult {
    pub id: u64,
    pub series_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub first_aired: Option<String>,
    pub network: Option<String>,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub slug: Option<String>,
}

/// A single episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: u64,
    /// Season number (0 for specials)
    pub aired_season: Option<u32>,
    /// Episode number within the season
    pub aired_episode_number: Option<u32>,
    pub episode_name: Option<String>,
    pub first_aired: Option<String>,
    pub overview: Option<String>,
    pub series_id: Option<u64>,
}

/// A language supported by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: u32,
    pub abbreviation: String,
    pub name: String,
    pub english_name: String,
}

/// Settings of the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_name: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "favoritesDisplaymode")]
    pub favorites_display_mode: Option<String>,
}

/// Favorite series ids of the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorites {
    /// Series ids as returned by the remote API (strings, not numbers)
    #[serde(default)]
    pub favorites: Vec<String>,
}

/// A series updated within a queried time frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Updated {
    pub id: u64,
    /// Unix epoch seconds of the last update
    pub last_updated: i64,
}
