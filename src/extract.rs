//! Whole-document extraction entry points.
//!
//! [`extract`] resolves the input, reads its layout, chunks every selected
//! page and returns the chunks in page order. [`extract_to_store`] does the
//! same and writes the result as a parsed record.

use crate::chunk::Chunk;
use crate::config::ExtractConfig;
use crate::error::LeserError;
use crate::pipeline::chunker;
use crate::pipeline::input::{self, InputKind, ResolvedInput};
use crate::pipeline::layout::{self, PageRead};
use crate::store::{ChunkStore, Namespace};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Chunks of one document plus how the pages fared.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Record name: the explicit name, or the document's file stem.
    pub name: String,
    /// Document file name stamped on every chunk.
    pub source: String,
    pub chunks: Vec<Chunk>,
    pub stats: ExtractionStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub selected_pages: usize,
    pub extracted_pages: usize,
    /// Pages whose layout could not be read; they contribute no chunks.
    pub failed_pages: usize,
    pub duration_ms: u64,
}

/// Extract chunks from a PDF, a JSON layout dump or a PDF URL.
///
/// URLs are cached under `cache_dir`. Pages that fail to read are logged and
/// skipped; the call fails only when nothing at all could be read.
pub async fn extract(
    input_str: impl AsRef<str>,
    name: Option<&str>,
    cache_dir: &Path,
    config: &ExtractConfig,
) -> Result<Extraction, LeserError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let resolved =
        input::resolve_input(input_str, name, cache_dir, config.download_timeout_secs).await?;
    let pages = read_layout(&resolved, config).await?;

    let name = match name {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => resolved.stem(),
    };
    let source = resolved.source_name();

    let total = pages.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total);
    }

    let mut chunks = Vec::new();
    let mut stats = ExtractionStats {
        selected_pages: total,
        ..Default::default()
    };
    let mut first_error = None;

    for (page_num, read) in pages {
        match read {
            Ok(page) => {
                let page_chunks = chunker::chunk_page(page_num as u32, &page, &source, config);
                debug!("Page {} → {} chunks", page_num, page_chunks.len());
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_extracted(page_num, total, page_chunks.len());
                }
                chunks.extend(page_chunks);
                stats.extracted_pages += 1;
            }
            Err(e) => {
                warn!("Skipping page {}: {}", page_num, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total, e.to_string());
                }
                stats.failed_pages += 1;
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    if stats.extracted_pages == 0 {
        return Err(LeserError::AllPagesFailed {
            total,
            first_error: first_error.unwrap_or_else(|| "no pages read".to_string()),
        });
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Extraction complete: {} chunks from {}/{} pages, {}ms",
        chunks.len(),
        stats.extracted_pages,
        total,
        stats.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(total, chunks.len());
    }

    Ok(Extraction {
        name,
        source,
        chunks,
        stats,
    })
}

/// Extract and save the chunks as the parsed record, returning the
/// extraction and the record path.
///
/// Downloads are cached in the store's download directory.
pub async fn extract_to_store(
    input_str: impl AsRef<str>,
    name: Option<&str>,
    store: &ChunkStore,
    config: &ExtractConfig,
) -> Result<(Extraction, PathBuf), LeserError> {
    let extraction = extract(input_str, name, &store.downloads_dir(), config).await?;
    let path = store.save(&extraction.chunks, Namespace::Parsed, &extraction.name)?;
    Ok((extraction, path))
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    name: Option<&str>,
    cache_dir: &Path,
    config: &ExtractConfig,
) -> Result<Extraction, LeserError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| LeserError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, name, cache_dir, config))
}

async fn read_layout(
    resolved: &ResolvedInput,
    config: &ExtractConfig,
) -> Result<Vec<PageRead>, LeserError> {
    match resolved.kind {
        InputKind::LayoutDump => layout::read_dump(resolved.path())?.select(config),
        InputKind::Pdf => {
            let path = resolved.path().to_path_buf();
            let config = config.clone();
            tokio::task::spawn_blocking(move || layout::read_pdf(&path, &config))
                .await
                .map_err(|e| LeserError::Internal(format!("Layout task panicked: {}", e)))?
        }
    }
}
