//! # leser
//!
//! Turn PDFs into reviewable chunks and let an operator settle the ones a
//! machine should not be trusted with.
//!
//! Running text is reconstructed from positioned words and accepted as is.
//! Tables and figures are flagged `needs_review`; a line-oriented review
//! walkthrough lets a human approve, edit, discard or skip each of them, and
//! every decision is persisted as it is made.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / URL / layout dump
//!  │
//!  ├─ 1. Input    resolve local file or download once into the cache
//!  ├─ 2. Layout   words, tables and image boxes per page (pdfium or JSON dump)
//!  ├─ 3. Chunk    one text chunk per page, one per table, one per figure
//!  ├─ 4. Store    data/parsed/<name>.json
//!  └─ 5. Review   data/reviewed/<name>.json, saved after every decision
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use leser::{extract_to_store, review_record, ChunkStore, ExtractConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ChunkStore::new("data");
//!     let (extraction, _) =
//!         extract_to_store("report.pdf", None, &store, &ExtractConfig::default()).await?;
//!
//!     let stdin = std::io::stdin();
//!     review_record(&store, &extraction.name, stdin.lock(), std::io::stdout())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `leser` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! leser = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod chunk;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod progress;
pub mod review;
pub mod stats;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use chunk::{BBox, Chunk, ChunkBody, ChunkKind, ChunkStatus, Decision, Row, TableContent};
pub use config::{ExtractConfig, ExtractConfigBuilder, PageSelection};
pub use error::{LayoutError, LeserError};
pub use extract::{extract, extract_sync, extract_to_store, Extraction, ExtractionStats};
pub use pipeline::layout::{DocumentLayout, PageLayout, RawImage, Word};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use review::{review_record, Command, ReviewOutcome, ReviewSession};
pub use stats::{RecordStats, Tally};
pub use store::{ChunkStore, Namespace};
