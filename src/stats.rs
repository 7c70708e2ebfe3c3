//! Aggregate statistics over a record and the plain-text report built from them.

use crate::chunk::{Chunk, ChunkKind, ChunkStatus};
use crate::error::LeserError;
use std::collections::BTreeSet;
use std::fmt;

/// Chunk counts by type and by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    kinds: [usize; 3],
    statuses: [usize; 5],
}

impl Tally {
    pub fn of(chunks: &[Chunk]) -> Self {
        let mut tally = Self::default();
        for chunk in chunks {
            tally.kinds[chunk.kind() as usize] += 1;
            tally.statuses[chunk.status as usize] += 1;
        }
        tally
    }

    pub fn kind(&self, kind: ChunkKind) -> usize {
        self.kinds[kind as usize]
    }

    pub fn status(&self, status: ChunkStatus) -> usize {
        self.statuses[status as usize]
    }

    /// Non-zero type counts, in `text, table, figure` order.
    pub fn kinds(&self) -> impl Iterator<Item = (ChunkKind, usize)> + '_ {
        ChunkKind::ALL
            .into_iter()
            .map(|k| (k, self.kind(k)))
            .filter(|(_, n)| *n > 0)
    }

    /// Non-zero status counts, in lifecycle order.
    pub fn statuses(&self) -> impl Iterator<Item = (ChunkStatus, usize)> + '_ {
        ChunkStatus::ALL
            .into_iter()
            .map(|s| (s, self.status(s)))
            .filter(|(_, n)| *n > 0)
    }
}

impl fmt::Display for Tally {
    /// One line, e.g. `text: 3, table: 1, auto: 3, needs_review: 1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .kinds()
            .map(|(k, n)| format!("{k}: {n}"))
            .chain(self.statuses().map(|(s, n)| format!("{s}: {n}")))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Statistics for one non-empty record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStats {
    pub min_page: u32,
    pub max_page: u32,
    /// Number of distinct pages that produced at least one chunk.
    pub distinct_pages: usize,
    pub total: usize,
    pub tally: Tally,
}

impl RecordStats {
    /// Compute statistics; `name` only labels the error for an empty record.
    pub fn compute(name: &str, chunks: &[Chunk]) -> Result<Self, LeserError> {
        let pages: BTreeSet<u32> = chunks.iter().map(|c| c.page).collect();
        let (Some(&min_page), Some(&max_page)) = (pages.first(), pages.last()) else {
            return Err(LeserError::EmptyRecord {
                name: name.to_string(),
            });
        };
        Ok(Self {
            min_page,
            max_page,
            distinct_pages: pages.len(),
            total: chunks.len(),
            tally: Tally::of(chunks),
        })
    }

    /// Multi-line report: page range, then non-zero counts by type and status.
    pub fn report(&self, label: &str) -> String {
        let mut out = format!(
            "{label}\n  pages: {}-{} ({} total)\n",
            self.min_page, self.max_page, self.distinct_pages
        );
        for (kind, n) in self.tally.kinds() {
            out.push_str(&format!("  {kind}: {n}\n"));
        }
        for (status, n) in self.tally.statuses() {
            out.push_str(&format!("  {status}: {n}\n"));
        }
        out
    }
}
