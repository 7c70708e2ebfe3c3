//! Plain-text rendering of chunk content for the review prompt.
//!
//! Tables are laid out in aligned columns with a separator under the first
//! row. Rows shorter than the widest row are padded with empty cells, so
//! ragged tables render as rectangles instead of failing on a missing column.

use crate::chunk::{Chunk, ChunkBody, Row, TableContent};

/// Render any chunk's content for display.
pub fn format_content(chunk: &Chunk) -> String {
    match &chunk.body {
        ChunkBody::Text { content, .. } | ChunkBody::Figure { content, .. } => content.clone(),
        ChunkBody::Table {
            content: TableContent::Rows(rows),
            ..
        } => format_table(rows),
        ChunkBody::Table {
            content: TableContent::Text(text),
            ..
        } => text.clone(),
    }
}

/// Render rows as `a | b` lines, columns padded to their widest cell.
pub fn format_table(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "(empty table)".to_string();
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, width) in widths.iter_mut().enumerate() {
            *width = (*width).max(cell(row, i).chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (r, row) in rows.iter().enumerate() {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| format!("{:<w$}", cell(row, i)))
            .collect();
        lines.push(cells.join(" | "));
        if r == 0 {
            let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
            lines.push(rule.join("-+-"));
        }
    }
    lines.join("\n")
}

/// Cell `i` of `row`; absent and missing cells are empty.
fn cell(row: &Row, i: usize) -> &str {
    row.get(i).and_then(|c| c.as_deref()).unwrap_or("")
}
