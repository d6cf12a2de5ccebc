//! One-shot catalog load and index build

use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, ServerError};

use super::{slugify, CatalogIndex, Episode, EpisodeRecord, Season, Series};

/// Load the flat episode list from a JSON file and build the index.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogIndex> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        ServerError::Catalog(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let records: Vec<EpisodeRecord> = serde_json::from_str(&content)?;
    info!("Loaded {} episode record(s) from {}", records.len(), path.display());

    Ok(build_index(records))
}

/// Group a flat record list into the series -> season -> episode index.
///
/// Records without a playable URL are skipped with a warning. Seasons and
/// episodes come out sorted ascending; series are sorted by title.
pub fn build_index(records: Vec<EpisodeRecord>) -> CatalogIndex {
    // title -> (thumbnail, season number -> episodes)
    let mut grouped: std::collections::BTreeMap<
        String,
        (Option<String>, std::collections::BTreeMap<u32, Vec<Episode>>),
    > = std::collections::BTreeMap::new();

    let mut skipped = 0usize;
    for record in records {
        if record.url.is_empty() {
            warn!(
                "Skipping episode without URL: {} S{:02}E{:02}",
                record.series, record.season, record.episode
            );
            skipped += 1;
            continue;
        }

        let play_path = format!("/video-proxy?url={}", urlencode(&record.url));
        let entry = grouped.entry(record.series.clone()).or_default();
        if entry.0.is_none() {
            entry.0 = record.thumbnail.clone();
        }
        entry.1.entry(record.season).or_default().push(Episode {
            number: record.episode,
            title: record.title,
            url: record.url,
            play_path,
        });
    }

    if skipped > 0 {
        warn!("Skipped {} record(s) without a playable URL", skipped);
    }

    let series = grouped
        .into_iter()
        .map(|(title, (thumbnail, seasons))| {
            let seasons = seasons
                .into_iter()
                .map(|(number, mut episodes)| {
                    episodes.sort_by_key(|e| e.number);
                    Season { number, episodes }
                })
                .collect();
            Series {
                id: slugify(&title),
                title,
                thumbnail,
                seasons,
            }
        })
        .collect();

    CatalogIndex::new(series)
}

/// Percent-encode a URL for embedding in a query string value.
fn urlencode(url: &str) -> String {
    url::form_urlencoded::byte_serialize(url.as_bytes()).collect()
}
