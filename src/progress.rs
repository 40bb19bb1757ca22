//! Progress-callback trait for per-page download events.
//!
//! Inject an [`Arc<dyn DownloadProgressCallback>`] via
//! [`crate::config::FetcherConfigBuilder::progress_callback`] to receive
//! events while page images are fetched. The CLI turns them into a progress
//! bar; library users can forward them anywhere.
//!
//! # Example
//!
//! ```rust
//! use issuu2pdf::{DownloadProgressCallback, FetcherConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     fetched: AtomicUsize,
//! }
//!
//! impl DownloadProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
//!         self.fetched.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} ({} bytes)", page_num, total_pages, bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { fetched: AtomicUsize::new(0) });
//!
//! let config = FetcherConfig::builder()
//!     .progress_callback(counter as Arc<dyn DownloadProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it fetches each page image.
///
/// Implementations must be `Send + Sync`. With `concurrency > 1` the page
/// events may arrive out of page order; protect shared mutable state with
/// `Mutex` or atomics. All methods default to no-ops.
pub trait DownloadProgressCallback: Send + Sync {
    /// Called once after the manifest is read, before any image request.
    fn on_download_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page image has been stored.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages listed in the manifest
    /// * `bytes`       — size of the downloaded image
    fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
        let _ = (page_num, total_pages, bytes);
    }

    /// Called when a page is left out of the PDF.
    fn on_page_skipped(&self, page_num: usize, total_pages: usize, reason: &str) {
        let _ = (page_num, total_pages, reason);
    }

    /// Called once after every page has been attempted.
    ///
    /// # Arguments
    /// * `total_pages` — pages listed in the manifest
    /// * `downloaded`  — pages that will appear in the PDF
    fn on_download_complete(&self, total_pages: usize, downloaded: usize) {
        let _ = (total_pages, downloaded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DownloadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FetcherConfig`].
pub type ProgressCallback = Arc<dyn DownloadProgressCallback>;
