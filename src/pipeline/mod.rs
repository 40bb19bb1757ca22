//! Pipeline stages for issuu-document-to-PDF downloads.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own (and the network-free ones without a server at all).
//!
//! ## Data Flow
//!
//! ```text
//! reference ──▶ manifest ──▶ pages ──▶ assemble
//!   (regex)      (JSON GET)   (image GETs)  (lopdf)
//! ```
//!
//! 1. [`reference`] — pull `owner` / `document_id` out of the user's URL
//! 2. [`manifest`]  — fetch `reader3_4.json` and read the ordered page list
//! 3. [`pages`]     — download every page image into a temp dir; failures
//!    become skipped pages, not errors
//! 4. [`assemble`]  — one PDF page per image, written atomically

pub mod assemble;
pub mod manifest;
pub mod pages;
pub mod reference;
