//! Result types returned by a successful download.

use crate::error::PageError;
use crate::pipeline::reference::DocumentReference;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A page that is missing from the generated PDF, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    /// 1-indexed position in the manifest.
    pub page_num: usize,
    pub reason: PageError,
}

/// Summary of one finished download.
///
/// The PDF itself lives at `output_path`; the report only describes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadReport {
    pub reference: DocumentReference,
    pub output_path: PathBuf,
    /// Pages listed in the manifest.
    pub total_pages: usize,
    /// Pages present in the PDF.
    pub downloaded_pages: usize,
    /// Pages left out, in page order.
    pub skipped: Vec<SkippedPage>,
    pub duration_ms: u64,
}

impl DownloadReport {
    /// `true` when every manifest page made it into the PDF.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
