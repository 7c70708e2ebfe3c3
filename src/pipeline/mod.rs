//! Pipeline stages for turning a document into chunks.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ layout ──▶ chunker
//! (URL/path)  (pdfium or dump)  (text/table/figure chunks)
//! ```
//!
//! 1. [`input`]: canonicalise the user-supplied path or URL to a local
//!    file, downloading into the cache once
//! 2. [`layout`]: read raw words, tables and image boxes per page; the
//!    pdfium reader runs in `spawn_blocking`
//! 3. [`chunker`]: pure, per-page conversion of primitives into chunks

pub mod chunker;
pub mod input;
pub mod layout;
