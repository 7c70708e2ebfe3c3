//! Turn one page's raw primitives into typed chunks.
//!
//! Per page, in this order:
//!
//! 1. **text**: at most one chunk. Words are bucketed into lines by their
//!    top edge quantised with [`ExtractConfig::line_key`], lines run top to
//!    bottom, words in a line left to right. The bbox is the union over all
//!    words. Status `auto`.
//! 2. **table**: one chunk per non-empty raw table, rows verbatim (ragged
//!    rows and absent cells pass through untouched). Status `needs_review`.
//! 3. **figure**: one placeholder chunk per image, bbox copied. Status
//!    `needs_review`.
//!
//! Pages are independent: no state crosses page boundaries, and a document's
//! chunks are the concatenation of its pages' chunks in page order.

use crate::chunk::{BBox, Chunk};
use crate::config::ExtractConfig;
use crate::pipeline::layout::{PageLayout, Word};
use std::collections::BTreeMap;

/// Chunk one page. `page_num` is 1-based.
pub fn chunk_page(
    page_num: u32,
    layout: &PageLayout,
    source: &str,
    config: &ExtractConfig,
) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(1 + layout.tables.len() + layout.images.len());

    if let Some((content, bbox)) = page_text(&layout.words, config) {
        chunks.push(Chunk::text(page_num, content, bbox, source));
    }

    for (table_index, rows) in layout.tables.iter().enumerate() {
        if rows.is_empty() {
            continue;
        }
        chunks.push(Chunk::table(page_num, table_index, rows.clone(), source));
    }

    for (i, image) in layout.images.iter().enumerate() {
        chunks.push(Chunk::figure(page_num, i + 1, image.bbox, source));
    }

    chunks
}

/// Reconstruct a page's text and its bounding box, or `None` without words.
pub fn page_text(words: &[Word], config: &ExtractConfig) -> Option<(String, BBox)> {
    let first = words.first()?;

    let mut lines: BTreeMap<i64, Vec<&Word>> = BTreeMap::new();
    let mut bbox = first.bbox;
    for word in words {
        lines
            .entry(config.line_key(word.bbox.y_min))
            .or_default()
            .push(word);
        bbox = bbox.union(&word.bbox);
    }

    let text = lines
        .into_values()
        .map(|mut line| {
            line.sort_by(|a, b| a.bbox.x_min.total_cmp(&b.bbox.x_min));
            line.iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some((text, bbox))
}
