//! Media catalog data model
//!
//! A catalog starts life as a flat list of episode records and is grouped
//! once, at startup, into a browsable series -> season -> episode index.
//! The index is an immutable snapshot; handlers only ever read it.

mod loader;

pub use loader::{build_index, load_catalog};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One record of the flat input list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Series title this episode belongs to
    pub series: String,
    /// Season number (1-based)
    #[serde(default = "default_season")]
    pub season: u32,
    /// Episode number within the season
    pub episode: u32,
    /// Episode title, if known
    #[serde(default)]
    pub title: Option<String>,
    /// Playable media URL (absolute http/https)
    #[serde(default)]
    pub url: String,
    /// Cover/thumbnail image URL
    #[serde(default)]
    pub thumbnail: Option<String>,
}

fn default_season() -> u32 {
    1
}

/// An episode as exposed by the index.
#[derive(Debug, Clone, Serialize)]
pub struct Episode {
    pub number: u32,
    pub title: Option<String>,
    /// Original upstream media URL
    pub url: String,
    /// Same-origin playback path through the relay
    pub play_path: String,
}

/// A season holding its episodes in ascending order.
#[derive(Debug, Clone, Serialize)]
pub struct Season {
    pub number: u32,
    pub episodes: Vec<Episode>,
}

/// A series with its seasons in ascending order.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    /// Stable identifier derived from the title
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub seasons: Vec<Season>,
}

impl Series {
    /// Total episode count across all seasons.
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

/// Lightweight series summary for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub season_count: usize,
    pub episode_count: usize,
}

/// Immutable catalog snapshot: series sorted by title, with an id lookup.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    series: Vec<Series>,
    by_id: BTreeMap<String, usize>,
}

impl CatalogIndex {
    pub(crate) fn new(series: Vec<Series>) -> Self {
        let by_id = series
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        Self { series, by_id }
    }

    /// Number of series in the catalog.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Look up a series by its slug id.
    pub fn get(&self, id: &str) -> Option<&Series> {
        self.by_id.get(id).map(|&i| &self.series[i])
    }

    /// All series, sorted by title.
    pub fn all(&self) -> &[Series] {
        &self.series
    }

    /// Series summaries matching an optional case-insensitive title filter.
    pub fn search(&self, query: Option<&str>) -> Vec<SeriesSummary> {
        let needle = query.map(|q| q.to_lowercase());
        self.series
            .iter()
            .filter(|s| match &needle {
                Some(n) if !n.is_empty() => s.title.to_lowercase().contains(n.as_str()),
                _ => true,
            })
            .map(|s| SeriesSummary {
                id: s.id.clone(),
                title: s.title.clone(),
                thumbnail: s.thumbnail.clone(),
                season_count: s.seasons.len(),
                episode_count: s.episode_count(),
            })
            .collect()
    }
}

/// Derive a stable slug id from a series title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
