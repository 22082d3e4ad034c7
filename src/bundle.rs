//! Package the selected media into a single ZIP archive.
//!
//! Layout: `{person}/{videos|photos}/{media_id}.{mp4|jpg}`.
//!
//! Every selection's full-resolution reference is fetched (with bounded
//! concurrency). A failed fetch is logged and the item is left out; the
//! rest of the bundle is still produced. Packaging only fails as a whole
//! when nothing could be packaged.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;

use crate::error::{Error, PackagingItemError, Result};
use crate::models::Selection;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Fetches the binary content behind a URL.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`ContentFetcher`] over plain HTTP GET.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Packaging(format!("download returned {}", status)));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// A finished archive plus what went into it.
#[derive(Debug)]
pub struct Bundle {
    pub bytes: Vec<u8>,
    /// Archive paths that were written, in archive order.
    pub packaged: Vec<String>,
    /// Items that could not be fetched.
    pub failed: Vec<PackagingItemError>,
}

impl Bundle {
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Path of a selection inside the archive.
pub fn archive_path(selection: &Selection) -> String {
    format!(
        "{}/{}/{}",
        path_segment(&selection.entity_name),
        selection.kind.plural(),
        path_segment(&selection.file_name)
    )
}

// Keeps a name to one path component.
fn path_segment(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" => "unnamed".to_string(),
        "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

struct PlannedItem {
    path: String,
    url: String,
}

// Groups by person name (first-seen order), then by kind, and drops
// repeated paths.
fn plan(selections: &[Selection]) -> Vec<PlannedItem> {
    let mut people: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Selection>> = HashMap::new();
    for selection in selections {
        let name = selection.entity_name.as_str();
        groups
            .entry(name)
            .or_insert_with(|| {
                people.push(name);
                Vec::new()
            })
            .push(selection);
    }

    let mut seen = HashSet::new();
    let mut planned = Vec::with_capacity(selections.len());
    for name in people {
        let mut group = groups.remove(name).unwrap_or_default();
        group.sort_by_key(|s| s.kind.plural());
        for selection in group {
            let path = archive_path(selection);
            if !seen.insert(path.clone()) {
                warn!(%path, "duplicate archive path; keeping the first");
                continue;
            }
            planned.push(PlannedItem {
                path,
                url: selection.comp_url.clone(),
            });
        }
    }
    planned
}

/// Fetches every selection and assembles the archive.
pub async fn package(
    fetcher: &dyn ContentFetcher,
    selections: &[Selection],
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> Result<Bundle> {
    if selections.is_empty() {
        return Err(Error::Packaging("no media selected".into()));
    }

    let planned = plan(selections);
    let total = planned.len();
    info!(items = total, concurrency, "packaging bundle");

    let mut fetched = stream::iter(planned.iter())
        .map(|item| async move {
            let outcome = if item.url.is_empty() {
                Err(Error::Packaging("no download URL".into()))
            } else {
                fetcher.fetch(&item.url).await
            };
            (item, outcome)
        })
        .buffer_unordered(concurrency.max(1));

    let mut contents: HashMap<&str, Vec<u8>> = HashMap::new();
    let mut failed = Vec::new();
    let mut n = 0;
    while let Some((item, outcome)) = fetched.next().await {
        n += 1;
        match outcome {
            Ok(bytes) => {
                progress.report(ProgressEvent::Fetched {
                    path: item.path.clone(),
                    n,
                    total,
                });
                contents.insert(item.path.as_str(), bytes);
            }
            Err(e) => {
                warn!(path = %item.path, url = %item.url, error = %e, "skipping item");
                failed.push(PackagingItemError {
                    path: item.path.clone(),
                    url: item.url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if contents.is_empty() {
        return Err(Error::Packaging(format!(
            "none of the {} selected items could be downloaded",
            total
        )));
    }

    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let mut packaged = Vec::with_capacity(contents.len());

    for item in &planned {
        let Some(bytes) = contents.get(item.path.as_str()) else {
            continue;
        };
        writer.start_file(item.path.as_str(), options)?;
        writer.write_all(bytes)?;
        packaged.push(item.path.clone());
    }

    let bytes = writer.finish()?.into_inner();
    info!(
        packaged = packaged.len(),
        failed = failed.len(),
        bytes = bytes.len(),
        "bundle ready"
    );

    Ok(Bundle {
        bytes,
        packaged,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn selection(entity: usize, name: &str, id: &str, kind: MediaKind) -> Selection {
        Selection {
            entity_index: entity,
            entity_name: name.to_string(),
            media_id: id.to_string(),
            kind,
            comp_url: format!("https://comp/{}", id),
            file_name: kind.file_name(id),
        }
    }

    #[test]
    fn archive_paths() {
        let s = selection(0, "Jane Doe", "v1", MediaKind::Video);
        assert_eq!(archive_path(&s), "Jane Doe/videos/v1.mp4");
        let s = selection(0, "AC/DC", "p1", MediaKind::Photo);
        assert_eq!(archive_path(&s), "AC_DC/photos/p1.jpg");
        let s = selection(0, "..", "p1", MediaKind::Photo);
        assert_eq!(archive_path(&s), "_/photos/p1.jpg");
    }

    #[test]
    fn plan_groups_by_person_then_kind() {
        let selections = vec![
            selection(0, "Jane", "p1", MediaKind::Photo),
            selection(1, "John", "v2", MediaKind::Video),
            selection(0, "Jane", "v1", MediaKind::Video),
        ];
        let paths: Vec<String> = plan(&selections).into_iter().map(|p| p.path).collect();
        assert_eq!(
            paths,
            vec!["Jane/photos/p1.jpg", "Jane/videos/v1.mp4", "John/videos/v2.mp4"]
        );
    }

    #[test]
    fn plan_drops_duplicate_paths() {
        // Two people with the same name picking the same id.
        let selections = vec![
            selection(0, "Jane", "p1", MediaKind::Photo),
            selection(3, "Jane", "p1", MediaKind::Photo),
        ];
        assert_eq!(plan(&selections).len(), 1);
    }
}
