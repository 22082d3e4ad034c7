//! Per-person media search.
//!
//! For every person in the shotlist, one video search and one photo search
//! are issued through a [`MediaGateway`], and the provider records are
//! normalized into [`MediaItem`]s.
//!
//! # Pipeline
//!
//! ```text
//! people ──▶ for each person (sequential):
//!              phrase = name [+ " " + marker]
//!              ├── search videos ──▶ first N records ──▶ normalize
//!              ├── search photos ──▶ first N records ──▶ normalize
//!              └── sleep(delay)          (not after the last person)
//! ```
//!
//! People are searched one at a time with a fixed pause in between, which
//! keeps the session under the provider's rate limit. The first failure
//! aborts the rest of the queue; results are only returned for the whole
//! list.
//!
//! Only the person's bare `name` is searched. The model's `search_term` is
//! kept for display but never sent to the provider.

use std::time::Duration;
use tracing::{debug, info};

use crate::error::Result;
use crate::filters::FilterConfig;
use crate::gateway::{MediaGateway, ProviderRecord, SearchQuery};
use crate::models::{MediaItem, MediaKind, Person, PersonResults};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Candidates requested from the provider per search.
pub const FETCH_PAGE_SIZE: u32 = 30;
/// Items kept per kind and person, in provider order.
pub const RESULTS_PER_KIND: usize = 5;
/// Rendition shown as the thumbnail.
pub const THUMB_RENDITION: &str = "thumb";
/// Rendition shown as the preview.
pub const PREVIEW_RENDITION: &str = "preview";
/// Renditions tried, in order, for the full-resolution reference.
pub const COMP_RENDITION_CHAIN: [&str; 2] = ["comp", "preview"];
/// Marker appended to the phrase when phrase augmentation is on.
pub const DEFAULT_PHRASE_MARKER: &str = "PMCARC";
/// Pause between two people's searches.
pub const DEFAULT_INTER_ENTITY_DELAY: Duration = Duration::from_secs(1);

/// Tunable search limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPolicy {
    pub page_size: u32,
    pub results_per_kind: usize,
    pub delay: Duration,
    pub phrase_marker: String,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            page_size: FETCH_PAGE_SIZE,
            results_per_kind: RESULTS_PER_KIND,
            delay: DEFAULT_INTER_ENTITY_DELAY,
            phrase_marker: DEFAULT_PHRASE_MARKER.to_string(),
        }
    }
}

/// Returns the URI of the rendition called `name`, if the record has one.
pub fn rendition_uri<'a>(record: &'a ProviderRecord, name: &str) -> Option<&'a str> {
    record
        .display_sizes
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.uri.as_str())
}

/// Normalizes one provider record. Missing renditions become `""`.
pub fn normalize_record(record: &ProviderRecord) -> MediaItem {
    let comp_url = COMP_RENDITION_CHAIN
        .iter()
        .find_map(|name| rendition_uri(record, name))
        .unwrap_or_default();

    MediaItem {
        id: record.id.clone(),
        title: record.title.clone().unwrap_or_default(),
        thumbnail_url: rendition_uri(record, THUMB_RENDITION)
            .unwrap_or_default()
            .to_string(),
        preview_url: rendition_uri(record, PREVIEW_RENDITION)
            .unwrap_or_default()
            .to_string(),
        comp_url: comp_url.to_string(),
        date_created: record.date_created.clone().unwrap_or_default(),
    }
}

/// Keeps the first `cap` records, in provider order, normalized.
pub fn normalize_records(records: &[ProviderRecord], cap: usize) -> Vec<MediaItem> {
    records.iter().take(cap).map(normalize_record).collect()
}

/// Runs the video and photo searches for a single person.
pub async fn search_person(
    gateway: &dyn MediaGateway,
    person: &Person,
    filter: &FilterConfig,
    policy: &SearchPolicy,
) -> Result<PersonResults> {
    let phrase = filter.phrase_for(&person.name, &policy.phrase_marker);
    let query = SearchQuery::new(phrase, policy.page_size, filter.collection_codes());

    let video_records = gateway.search(MediaKind::Video, &query).await?;
    let photo_records = gateway.search(MediaKind::Photo, &query).await?;

    debug!(
        person = %person.name,
        video_candidates = video_records.len(),
        photo_candidates = photo_records.len(),
        "provider returned candidates"
    );

    Ok(PersonResults {
        person: person.clone(),
        videos: normalize_records(&video_records, policy.results_per_kind),
        photos: normalize_records(&photo_records, policy.results_per_kind),
    })
}

/// Searches every person in order, one at a time.
///
/// Returns one [`PersonResults`] per person, in the same order, or the
/// first error encountered (remaining people are not searched).
pub async fn search_all(
    gateway: &dyn MediaGateway,
    people: &[Person],
    filter: &FilterConfig,
    policy: &SearchPolicy,
    progress: &dyn ProgressReporter,
) -> Result<Vec<PersonResults>> {
    info!(
        people = people.len(),
        codes = ?filter.collection_codes(),
        augmented = filter.phrase_augmentation,
        "searching provider"
    );

    let total = people.len();
    let mut results = Vec::with_capacity(total);

    for (i, person) in people.iter().enumerate() {
        progress.report(ProgressEvent::Searching {
            person: person.name.clone(),
            n: i + 1,
            total,
        });

        let found = search_person(gateway, person, filter, policy).await?;

        progress.report(ProgressEvent::Found {
            person: person.name.clone(),
            videos: found.videos.len(),
            photos: found.photos.len(),
        });
        results.push(found);

        // No pause after the last person; nothing follows it.
        if i + 1 < total && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Ok(results)
}
