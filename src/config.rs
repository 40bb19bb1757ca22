//! Configuration types for issuu document downloads.
//!
//! All download behaviour is controlled through [`FetcherConfig`], built via
//! its [`FetcherConfigBuilder`]. The endpoints live here rather than as
//! constants inside the pipeline so tests (and mirrors) can point the
//! fetcher at another host.

use crate::error::FetchError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Host serving the `reader3_4.json` page manifests.
pub const DEFAULT_MANIFEST_BASE_URL: &str = "https://reader3.isu.pub";

/// Scheme prepended to the scheme-less `imageUri` values of the manifest.
pub const DEFAULT_IMAGE_SCHEME: &str = "https";

/// Configuration for a document download.
///
/// Built via [`FetcherConfig::builder()`] or using [`FetcherConfig::default()`].
///
/// # Example
/// ```rust
/// use issuu2pdf::FetcherConfig;
///
/// let config = FetcherConfig::builder()
///     .concurrency(8)
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 8);
/// ```
#[derive(Clone)]
pub struct FetcherConfig {
    /// Base URL of the manifest host, without trailing slash.
    /// Default: [`DEFAULT_MANIFEST_BASE_URL`].
    pub manifest_base_url: String,

    /// Scheme used for page image requests. Default: `https`.
    pub image_scheme: String,

    /// Per-request timeout in seconds, applied to the manifest and every
    /// image request. Default: 60.
    ///
    /// The upstream service sets none, and a stalled image request would
    /// otherwise hang the whole download.
    pub timeout_secs: u64,

    /// Maximum number of page images fetched at the same time. Default: 4.
    ///
    /// Results are re-ordered to manifest order before assembly, so this only
    /// changes wall-clock time. Set to 1 for strictly sequential fetching.
    pub concurrency: usize,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Parent directory for the per-download scratch directory holding page
    /// images. Must exist. Default: the system temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            manifest_base_url: DEFAULT_MANIFEST_BASE_URL.to_string(),
            image_scheme: DEFAULT_IMAGE_SCHEME.to_string(),
            timeout_secs: 60,
            concurrency: 4,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            temp_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FetcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherConfig")
            .field("manifest_base_url", &self.manifest_base_url)
            .field("image_scheme", &self.image_scheme)
            .field("timeout_secs", &self.timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("user_agent", &self.user_agent)
            .field("temp_dir", &self.temp_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn DownloadProgressCallback>"),
            )
            .finish()
    }
}

impl FetcherConfig {
    /// Create a new builder for `FetcherConfig`.
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder {
            config: Self::default(),
        }
    }

    /// Manifest URL for one document.
    pub fn manifest_url(&self, owner: &str, document_id: &str) -> String {
        format!(
            "{}/{}/{}/reader3_4.json",
            self.manifest_base_url, owner, document_id
        )
    }

    /// Absolute URL for a scheme-less manifest `imageUri`.
    pub fn image_url(&self, image_uri: &str) -> String {
        format!("{}://{}", self.image_scheme, image_uri)
    }

    /// Build the HTTP client shared by every request of one download.
    pub fn http_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Internal(format!("Failed to build HTTP client: {e}")))
    }
}

/// Builder for [`FetcherConfig`].
#[derive(Debug)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    pub fn manifest_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.manifest_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn image_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.image_scheme = scheme.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FetcherConfig, FetchError> {
        let c = &self.config;
        if c.manifest_base_url.is_empty() {
            return Err(FetchError::InvalidConfig(
                "Manifest base URL must not be empty".into(),
            ));
        }
        if c.image_scheme.is_empty() || c.image_scheme.contains("://") {
            return Err(FetchError::InvalidConfig(format!(
                "Image scheme must be a bare scheme like 'https', got '{}'",
                c.image_scheme
            )));
        }
        if c.timeout_secs == 0 {
            return Err(FetchError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
