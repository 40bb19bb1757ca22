//! Page image download: one GET per manifest entry, stored in a temp dir.
//!
//! A page that cannot be fetched is skipped rather than failing the whole
//! document; the reason travels back as a [`PageError`]. Requests run with
//! bounded parallelism through [`StreamExt::buffered`], which hands results
//! back in manifest order no matter which request finishes first.

use crate::config::FetcherConfig;
use crate::error::PageError;
use crate::output::SkippedPage;
use crate::pipeline::manifest::{PageEntry, PageManifest};
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A page image stored on disk, ready for assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    /// 1-indexed position in the manifest.
    pub page_num: usize,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Outcome of downloading every page of a manifest.
#[derive(Debug, Default)]
pub struct PageDownloads {
    /// Stored images in page order.
    pub images: Vec<DownloadedImage>,
    /// Pages left out, in page order.
    pub skipped: Vec<SkippedPage>,
}

/// Fetch one page image into `dir` as `page_<page_num>.jpg`.
pub async fn download_page(
    client: &reqwest::Client,
    page_num: usize,
    entry: &PageEntry,
    dir: &Path,
    config: &FetcherConfig,
) -> Result<DownloadedImage, PageError> {
    let location = entry
        .location()
        .ok_or(PageError::MissingImageUri { page: page_num })?;
    let url = config.image_url(location);
    debug!("Page {}: GET {}", page_num, url);

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| PageError::Request {
            page: page_num,
            detail: e.to_string(),
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(PageError::HttpStatus {
            page: page_num,
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|e| PageError::Request {
        page: page_num,
        detail: e.to_string(),
    })?;

    let path = dir.join(format!("page_{page_num}.jpg"));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| PageError::WriteFailed {
            page: page_num,
            detail: e.to_string(),
        })?;

    debug!("Page {}: {} bytes → {}", page_num, bytes.len(), path.display());
    Ok(DownloadedImage {
        page_num,
        path,
        bytes: bytes.len(),
    })
}

/// Fetch every page of `manifest` into `dir`.
///
/// At most `config.concurrency` requests are in flight. Never fails: pages
/// that could not be fetched end up in [`PageDownloads::skipped`].
pub async fn download_pages(
    client: &reqwest::Client,
    manifest: &PageManifest,
    dir: &Path,
    config: &FetcherConfig,
) -> PageDownloads {
    let total_pages = manifest.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_download_start(total_pages);
    }

    // Each future owns its inputs so the stream stays `Send` inside spawned
    // tasks. Cloning a `reqwest::Client` only bumps a refcount.
    let results: Vec<Result<DownloadedImage, PageError>> =
        stream::iter(manifest.pages.iter().cloned().enumerate().map(|(idx, entry)| {
            let client = client.clone();
            let dir = dir.to_path_buf();
            let config = config.clone();
            async move {
                let page_num = idx + 1;
                let result = download_page(&client, page_num, &entry, &dir, &config).await;
                if let Some(ref cb) = config.progress_callback {
                    match &result {
                        Ok(img) => cb.on_page_complete(page_num, total_pages, img.bytes),
                        Err(e) => cb.on_page_skipped(page_num, total_pages, &e.to_string()),
                    }
                }
                result
            }
        }))
        .buffered(config.concurrency)
        .collect()
        .await;

    let mut downloads = PageDownloads::default();
    for result in results {
        match result {
            Ok(img) => downloads.images.push(img),
            Err(reason) => {
                warn!("Skipping page: {}", reason);
                downloads.skipped.push(SkippedPage {
                    page_num: reason.page(),
                    reason,
                });
            }
        }
    }

    info!(
        "Downloaded {}/{} page images ({} skipped)",
        downloads.images.len(),
        total_pages,
        downloads.skipped.len()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_download_complete(total_pages, downloads.images.len());
    }

    downloads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::reference::DocumentReference;

    #[tokio::test]
    async fn missing_location_is_skipped_without_a_request() {
        let dir = tempfile::tempdir().unwrap();
        let config = FetcherConfig::default();
        let client = config.http_client().unwrap();

        let err = download_page(&client, 4, &PageEntry::default(), dir.path(), &config)
            .await
            .unwrap_err();
        assert_eq!(err, PageError::MissingImageUri { page: 4 });
    }

    #[tokio::test]
    async fn manifest_without_locations_downloads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = FetcherConfig::default();
        let client = config.http_client().unwrap();
        let manifest = PageManifest {
            reference: DocumentReference::new("acme", "blank"),
            pages: vec![PageEntry::default(), PageEntry::default()],
        };

        let downloads = download_pages(&client, &manifest, dir.path(), &config).await;
        assert!(downloads.images.is_empty());
        let skipped: Vec<usize> = downloads.skipped.iter().map(|s| s.page_num).collect();
        assert_eq!(skipped, vec![1, 2]);
    }
}
