//! Top-level download entry points.
//!
//! [`download`] runs the whole pipeline (parse → manifest → pages →
//! assemble) inside one [`TempDir`]. The directory is removed when it goes
//! out of scope, on success, on error and on panic, so page images never
//! outlive the call.

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::output::DownloadReport;
use crate::pipeline::reference::DocumentReference;
use crate::pipeline::{assemble, manifest, pages, reference};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info};

/// Download the issuu document at `url` and write it as a PDF to `output_path`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(DownloadReport)` when at least one page made it into the PDF. Pages
/// that could not be fetched are listed in `report.skipped`.
///
/// # Errors
/// Every [`FetchError`] from a pipeline stage is returned unchanged. Nothing
/// is written to `output_path` unless the whole document was assembled.
///
/// # Example
/// ```rust,no_run
/// use issuu2pdf::{download, FetcherConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = FetcherConfig::default();
/// let report = download(
///     "https://issuu.com/acme/docs/report2024",
///     "acme_report2024.pdf",
///     &config,
/// )
/// .await?;
/// println!("{}/{} pages", report.downloaded_pages, report.total_pages);
/// # Ok(())
/// # }
/// ```
pub async fn download(
    url: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &FetcherConfig,
) -> Result<DownloadReport, FetchError> {
    let start = Instant::now();
    let url = url.as_ref();
    let output_path = output_path.as_ref();
    info!("Starting download: {}", url);

    // ── Step 1: Parse the document reference ─────────────────────────────
    let reference = reference::parse_reference(url)?;
    debug!("Document reference: {}", reference);

    // ── Step 2: Fetch the manifest ───────────────────────────────────────
    let client = config.http_client()?;
    let manifest = manifest::fetch_manifest(&client, &reference, config).await?;
    let total_pages = manifest.len();

    // ── Step 3: Download page images into a scoped temp dir ──────────────
    let temp_dir = match config.temp_dir {
        Some(ref parent) => TempDir::new_in(parent),
        None => TempDir::new(),
    }
    .map_err(|e| FetchError::Internal(format!("Failed to create temp dir: {}", e)))?;
    let downloads = pages::download_pages(&client, &manifest, temp_dir.path(), config).await;

    if downloads.images.is_empty() {
        return Err(FetchError::NoImagesDownloaded { total: total_pages });
    }

    // ── Step 4: Assemble the PDF ─────────────────────────────────────────
    let downloaded_pages = assemble::assemble_document(downloads.images, output_path).await?;

    // The temp dir (and every page image) is released here.
    drop(temp_dir);

    let report = DownloadReport {
        reference,
        output_path: output_path.to_path_buf(),
        total_pages,
        downloaded_pages,
        skipped: downloads.skipped,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Download complete: {}/{} pages, {}ms total",
        report.downloaded_pages, report.total_pages, report.duration_ms
    );
    Ok(report)
}

/// Download into `output_dir` using the `<owner>_<document_id>.pdf` naming
/// convention. `output_dir` is created if missing.
pub async fn download_to_dir(
    url: impl AsRef<str>,
    output_dir: impl AsRef<Path>,
    config: &FetcherConfig,
) -> Result<DownloadReport, FetchError> {
    let url = url.as_ref();
    let output_path = output_path_in(output_dir.as_ref(), &reference::parse_reference(url)?);

    download(url, output_path, config).await
}

/// Synchronous wrapper around [`download`].
///
/// Creates a temporary tokio runtime internally.
pub fn download_sync(
    url: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &FetcherConfig,
) -> Result<DownloadReport, FetchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| FetchError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(download(url, output_path, config))
}

/// File name of the PDF for `reference`: `<owner>_<document_id>.pdf`.
pub fn output_file_name(reference: &DocumentReference) -> String {
    format!("{}.pdf", reference.file_stem())
}

/// `output_dir/<owner>_<document_id>.pdf`.
pub fn output_path_in(output_dir: &Path, reference: &DocumentReference) -> PathBuf {
    output_dir.join(output_file_name(reference))
}
