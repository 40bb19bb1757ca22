//! # issuu2pdf
//!
//! Download documents from issuu's online reader as PDF files.
//!
//! The reader shows every page as a JPEG and publishes the list of those
//! images in a per-document JSON manifest. This crate fetches that manifest,
//! downloads the page images and stitches them into a PDF with one page per
//! image, in the reader's page order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! issuu URL
//!  │
//!  ├─ 1. Reference  owner + document id from issuu.com/<owner>/docs/<id>
//!  ├─ 2. Manifest   GET reader3.isu.pub/<owner>/<id>/reader3_4.json
//!  ├─ 3. Pages      GET https://<imageUri> per page (bounded parallelism)
//!  └─ 4. Assemble   one PDF page per image (lopdf), atomic write
//! ```
//!
//! Pages whose image cannot be fetched are left out and listed in
//! [`DownloadReport::skipped`]; the download only fails when nothing at all
//! could be fetched.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use issuu2pdf::{download_to_dir, FetcherConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FetcherConfig::default();
//!     let report = download_to_dir("https://issuu.com/acme/docs/report2024", "downloads", &config).await?;
//!     println!("{} pages → {}", report.downloaded_pages, report.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `bot`   | via `cli` | Telegram front end ([`bot`]) |
//! | `cli`   | on      | Enables the `issuu2pdf` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

#[cfg(feature = "bot")]
pub mod bot;
pub mod config;
pub mod download;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FetcherConfig, FetcherConfigBuilder};
pub use download::{download, download_sync, download_to_dir, output_file_name, output_path_in};
pub use error::{FetchError, PageError};
pub use output::{DownloadReport, SkippedPage};
pub use pipeline::reference::{parse_reference, DocumentReference};
pub use progress::{DownloadProgressCallback, NoopProgressCallback, ProgressCallback};
