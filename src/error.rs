//! Error types for the issuu2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FetchError`] — **Fatal**: the download cannot produce a document at
//!   all (bad URL, manifest unavailable, nothing downloaded). Returned as
//!   `Err(FetchError)` from the top-level `download*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page image could not be
//!   fetched. The page is left out of the PDF and the reason is stored in
//!   [`crate::output::SkippedPage`] so callers can see what went missing.

use crate::pipeline::reference::DocumentReference;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the issuu2pdf library.
///
/// Page-level failures use [`PageError`] and are reported through
/// [`crate::output::DownloadReport::skipped`] rather than propagated here.
#[derive(Debug, Error)]
pub enum FetchError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input does not contain an `issuu.com/<owner>/docs/<id>` path.
    #[error("Invalid issuu document URL '{input}'\nExpected something like https://issuu.com/<owner>/docs/<document>")]
    InvalidUrl { input: String },

    // ── Manifest errors ───────────────────────────────────────────────────
    /// The manifest request failed or answered with a non-200 status.
    #[error("Failed to fetch document manifest '{url}': {reason}")]
    ManifestFetch { url: String, reason: String },

    /// The manifest body is not JSON or lacks the `document.pages` list.
    #[error("Malformed document manifest '{url}': {detail}")]
    ManifestParse { url: String, detail: String },

    /// The manifest parsed but lists no pages.
    #[error("No pages found in the document data for '{reference}'")]
    EmptyManifest { reference: DocumentReference },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// Every page was skipped; there is nothing to put in the PDF.
    #[error("No pages were successfully downloaded (manifest listed {total})")]
    NoImagesDownloaded { total: usize },

    /// A downloaded page could not be decoded as an image.
    #[error("Page {page} is not a readable image: {detail}")]
    InvalidImage { page: usize, detail: String },

    /// lopdf failed to serialise the assembled document.
    #[error("PDF assembly failed: {0}")]
    PdfAssembly(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (temp dir, HTTP client or runtime setup).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The page is skipped; the download continues unless every page ends up
/// here, in which case [`FetchError::NoImagesDownloaded`] is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The manifest entry has no `imageUri`.
    #[error("Page {page}: manifest entry has no image location")]
    MissingImageUri { page: usize },

    /// The image server answered with something other than 200.
    #[error("Page {page}: image request returned HTTP {status}")]
    HttpStatus { page: usize, status: u16 },

    /// The image request failed before a status was received.
    #[error("Page {page}: image request failed: {detail}")]
    Request { page: usize, detail: String },

    /// The image bytes could not be stored in the temporary directory.
    #[error("Page {page}: could not store image: {detail}")]
    WriteFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-based page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::MissingImageUri { page }
            | PageError::HttpStatus { page, .. }
            | PageError::Request { page, .. }
            | PageError::WriteFailed { page, .. } => *page,
        }
    }
}
