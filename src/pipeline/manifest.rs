//! Manifest fetch: one GET to the reader host, then JSON → [`PageManifest`].
//!
//! The reader publishes `reader3_4.json` per document. Only
//! `document.pages[].imageUri` matters here; every other field is ignored so
//! upstream additions don't break parsing.

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::pipeline::reference::DocumentReference;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One page as listed by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageEntry {
    /// Scheme-less image location, e.g. `image.isu.pub/<id>/jpg/page_1.jpg`.
    #[serde(rename = "imageUri", default)]
    pub image_uri: Option<String>,
}

impl PageEntry {
    /// The image location exactly as listed, or `None` when absent or empty.
    pub fn location(&self) -> Option<&str> {
        self.image_uri.as_deref().filter(|s| !s.is_empty())
    }
}

/// Ordered page list of one document. Never empty once returned by
/// [`fetch_manifest`] or [`parse_manifest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageManifest {
    pub reference: DocumentReference,
    pub pages: Vec<PageEntry>,
}

impl PageManifest {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[derive(Deserialize)]
struct ManifestBody {
    document: ManifestDocument,
}

#[derive(Deserialize)]
struct ManifestDocument {
    pages: Vec<PageEntry>,
}

/// Fetch and parse the page manifest of `reference`.
///
/// No retry: a non-200 answer is reported as [`FetchError::ManifestFetch`]
/// straight away.
pub async fn fetch_manifest(
    client: &reqwest::Client,
    reference: &DocumentReference,
    config: &FetcherConfig,
) -> Result<PageManifest, FetchError> {
    let url = config.manifest_url(&reference.owner, &reference.document_id);
    info!("Fetching manifest for {}", reference);
    debug!("Manifest URL: {}", url);

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| FetchError::ManifestFetch {
            url: url.clone(),
            reason: if e.is_timeout() {
                format!("timed out after {}s", config.timeout_secs)
            } else {
                e.to_string()
            },
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::ManifestFetch {
            url,
            reason: format!("HTTP {}", status.as_u16()),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::ManifestFetch {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    let manifest = parse_manifest(&url, reference, &body)?;
    info!("Manifest lists {} pages", manifest.len());
    Ok(manifest)
}

/// Parse a manifest body. `url` is only used for error messages.
pub fn parse_manifest(
    url: &str,
    reference: &DocumentReference,
    body: &[u8],
) -> Result<PageManifest, FetchError> {
    let parsed: ManifestBody =
        serde_json::from_slice(body).map_err(|e| FetchError::ManifestParse {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    let pages = parsed.document.pages;
    if pages.is_empty() {
        return Err(FetchError::EmptyManifest {
            reference: reference.clone(),
        });
    }

    Ok(PageManifest {
        reference: reference.clone(),
        pages,
    })
}
