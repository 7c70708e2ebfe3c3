//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractConfigBuilder::progress_callback`] to receive
//! events as the extractor walks the document.
//!
//! # Example
//!
//! ```rust
//! use leser::{ExtractionProgressCallback, ExtractConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     chunks: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_extracted(&self, page_num: usize, total_pages: usize, chunk_count: usize) {
//!         self.chunks.fetch_add(chunk_count, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} chunks", page_num, total_pages, chunk_count);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { chunks: AtomicUsize::new(0) });
//!
//! let config = ExtractConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// config (and the callback with it) may be moved onto a blocking thread.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once, after the layout is read and before any page is chunked.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page has been turned into chunks.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: pages selected for extraction
    /// * `chunk_count`: chunks the page produced (may be 0)
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chunk_count: usize) {
        let _ = (page_num, total_pages, chunk_count);
    }

    /// Called when a page's layout could not be read. The page is skipped.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once when every selected page has been processed.
    fn on_extraction_complete(&self, total_pages: usize, chunk_count: usize) {
        let _ = (total_pages, chunk_count);
    }
}

/// Shared handle to a progress callback.
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

/// A callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}
