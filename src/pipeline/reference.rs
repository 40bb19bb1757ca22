//! URL parsing: extract the owner and document id from an issuu link.
//!
//! The match is deliberately loose. Any string that contains
//! `issuu.com/<owner>/docs/<document>` is accepted, so links copied with a
//! scheme, a `www.` prefix, query strings or surrounding chat text all work.

use crate::error::FetchError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

static DOCUMENT_URL: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"issuu\.com/([^/]+)/docs/([^/]+)").unwrap());

/// Identifies one issuu document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    /// Publisher account name (first path segment).
    pub owner: String,
    /// Document slug (segment after `/docs/`).
    pub document_id: String,
}

impl DocumentReference {
    pub fn new(owner: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            document_id: document_id.into(),
        }
    }

    /// `<owner>_<document_id>`, used for output file names.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.owner, self.document_id)
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.document_id)
    }
}

/// Parse the first `issuu.com/<owner>/docs/<document>` occurrence in `input`.
pub fn parse_reference(input: &str) -> Result<DocumentReference, FetchError> {
    let caps = DOCUMENT_URL
        .captures(input)
        .ok_or_else(|| FetchError::InvalidUrl {
            input: input.to_string(),
        })?;

    Ok(DocumentReference::new(&caps[1], &caps[2]))
}
