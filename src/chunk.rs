//! Chunk data model: one typed fragment of extracted content plus its trust status.
//!
//! A chunk's `type` is fixed at construction: the variant of [`ChunkBody`]
//! carries the type tag and exactly the fields that type owns, so a text chunk
//! can never acquire a `table_index` and a table never carries a `bbox`.
//!
//! ## Serialised shape
//!
//! ```json
//! {"page": 1, "type": "text", "content": "Hello world",
//!  "bbox": [72.0, 10.04, 140.5, 22.0], "source": "doc.pdf", "status": "auto"}
//! {"page": 2, "type": "table", "content": [["a", "b"], ["c"]],
//!  "table_index": 0, "source": "doc.pdf", "status": "needs_review"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One table row; cells may be absent (`null`).
pub type Row = Vec<Option<String>>;

/// Axis-aligned rectangle in page coordinates, origin top-left.
///
/// Serialised as `[x_min, y_min, x_max, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

impl From<[f64; 4]> for BBox {
    fn from([x_min, y_min, x_max, y_max]: [f64; 4]) -> Self {
        Self::new(x_min, y_min, x_max, y_max)
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

/// Content of a table chunk.
///
/// Freshly extracted tables hold their raw rows. Once an operator edits a
/// table the replacement is free text; the chunk stays a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableContent {
    Rows(Vec<Row>),
    Text(String),
}

/// Type-specific payload of a chunk, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChunkBody {
    /// All text on a page, one line per typographic line.
    Text { content: String, bbox: BBox },
    /// One raw table; `table_index` is its 0-based position on the page.
    Table {
        content: TableContent,
        table_index: usize,
    },
    /// Placeholder for an image; only its location is carried.
    Figure { content: String, bbox: BBox },
}

/// The chunk type, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Text,
    Table,
    Figure,
}

impl ChunkKind {
    /// Reporting order.
    pub const ALL: [ChunkKind; 3] = [ChunkKind::Text, ChunkKind::Table, ChunkKind::Figure];

    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Text => "text",
            ChunkKind::Table => "table",
            ChunkKind::Figure => "figure",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trust status of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    /// Believed accurate; never shown for review.
    Auto,
    /// Untrusted until an operator decides.
    NeedsReview,
    Approved,
    Edited,
    Discarded,
}

impl ChunkStatus {
    /// Reporting order.
    pub const ALL: [ChunkStatus; 5] = [
        ChunkStatus::Auto,
        ChunkStatus::NeedsReview,
        ChunkStatus::Approved,
        ChunkStatus::Edited,
        ChunkStatus::Discarded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChunkStatus::Auto => "auto",
            ChunkStatus::NeedsReview => "needs_review",
            ChunkStatus::Approved => "approved",
            ChunkStatus::Edited => "edited",
            ChunkStatus::Discarded => "discarded",
        }
    }
}

impl fmt::Display for ChunkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator's terminal verdict on a flagged chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    /// Replace the content with this text.
    Edit(String),
    Discard,
}

/// One content fragment of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// 1-based page number.
    pub page: u32,
    #[serde(flatten)]
    pub body: ChunkBody,
    /// File name of the originating document.
    pub source: String,
    pub status: ChunkStatus,
}

impl Chunk {
    /// A page's text. Text extraction is trusted.
    pub fn text(page: u32, content: String, bbox: BBox, source: impl Into<String>) -> Self {
        Self {
            page,
            body: ChunkBody::Text { content, bbox },
            source: source.into(),
            status: ChunkStatus::Auto,
        }
    }

    /// A raw table, always flagged for review.
    pub fn table(page: u32, table_index: usize, rows: Vec<Row>, source: impl Into<String>) -> Self {
        Self {
            page,
            body: ChunkBody::Table {
                content: TableContent::Rows(rows),
                table_index,
            },
            source: source.into(),
            status: ChunkStatus::NeedsReview,
        }
    }

    /// A figure placeholder for the `ordinal`-th (1-based) image on the page,
    /// always flagged for review.
    pub fn figure(page: u32, ordinal: usize, bbox: BBox, source: impl Into<String>) -> Self {
        Self {
            page,
            body: ChunkBody::Figure {
                content: format!("[figure on page {page}, image {ordinal}]"),
                bbox,
            },
            source: source.into(),
            status: ChunkStatus::NeedsReview,
        }
    }

    pub fn kind(&self) -> ChunkKind {
        match self.body {
            ChunkBody::Text { .. } => ChunkKind::Text,
            ChunkBody::Table { .. } => ChunkKind::Table,
            ChunkBody::Figure { .. } => ChunkKind::Figure,
        }
    }

    pub fn bbox(&self) -> Option<&BBox> {
        match &self.body {
            ChunkBody::Text { bbox, .. } | ChunkBody::Figure { bbox, .. } => Some(bbox),
            ChunkBody::Table { .. } => None,
        }
    }

    pub fn needs_review(&self) -> bool {
        self.status == ChunkStatus::NeedsReview
    }

    /// Apply an operator decision.
    ///
    /// Only chunks currently `needs_review` can be decided; for any other
    /// status this is a no-op returning `false`.
    pub fn apply(&mut self, decision: Decision) -> bool {
        if !self.needs_review() {
            return false;
        }
        self.status = match decision {
            Decision::Approve => ChunkStatus::Approved,
            Decision::Discard => ChunkStatus::Discarded,
            Decision::Edit(text) => {
                self.replace_content(text);
                ChunkStatus::Edited
            }
        };
        true
    }

    fn replace_content(&mut self, text: String) {
        match &mut self.body {
            ChunkBody::Text { content, .. } | ChunkBody::Figure { content, .. } => *content = text,
            ChunkBody::Table { content, .. } => *content = TableContent::Text(text),
        }
    }
}
