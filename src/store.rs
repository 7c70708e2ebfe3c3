//! Chunk Store: one JSON record per document name per namespace.
//!
//! ```text
//! <root>/
//!   pdfs/             download cache
//!   parsed/<name>.json    extractor output, written once per extraction
//!   reviewed/<name>.json  review output, authoritative once present
//! ```
//!
//! Every save is a full overwrite through a temp file in the target
//! directory followed by a rename, so readers only ever see a complete
//! record. There is no locking; one operator and one process at a time.

use crate::chunk::Chunk;
use crate::error::LeserError;
use crate::stats::Tally;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage area for records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Freshly extracted.
    Parsed,
    /// After (possibly partial) human review.
    Reviewed,
}

impl Namespace {
    /// Listing order.
    pub const ALL: [Namespace; 2] = [Namespace::Parsed, Namespace::Reviewed];

    pub fn dir_name(self) -> &'static str {
        match self {
            Namespace::Parsed => "parsed",
            Namespace::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// File-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where fetched documents are cached.
    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("pdfs")
    }

    pub fn namespace_dir(&self, ns: Namespace) -> PathBuf {
        self.root.join(ns.dir_name())
    }

    pub fn record_path(&self, ns: Namespace, name: &str) -> PathBuf {
        self.namespace_dir(ns).join(format!("{name}.json"))
    }

    pub fn exists(&self, ns: Namespace, name: &str) -> bool {
        self.record_path(ns, name).is_file()
    }

    /// Write `chunks` as the record `ns/name`, replacing any previous record.
    pub fn save(&self, chunks: &[Chunk], ns: Namespace, name: &str) -> Result<PathBuf, LeserError> {
        let dir = self.namespace_dir(ns);
        let path = self.record_path(ns, name);
        let write_err = |source| LeserError::RecordWriteFailed {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&dir).map_err(write_err)?;

        let json = serde_json::to_string_pretty(chunks)
            .map_err(|e| LeserError::Internal(format!("record serialisation: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        info!("saved {}: {}", path.display(), Tally::of(chunks));
        Ok(path)
    }

    /// Read the record `ns/name`.
    pub fn load(&self, ns: Namespace, name: &str) -> Result<Vec<Chunk>, LeserError> {
        let path = self.record_path(ns, name);
        if !path.is_file() {
            return Err(self.not_found(name)?);
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| LeserError::RecordReadFailed {
            path: path.clone(),
            source,
        })?;
        let chunks: Vec<Chunk> =
            serde_json::from_str(&raw).map_err(|source| LeserError::RecordMalformed {
                path: path.clone(),
                source,
            })?;
        debug!("loaded {} chunks from {}", chunks.len(), path.display());
        Ok(chunks)
    }

    /// Load the authoritative record for `name`: reviewed if it exists,
    /// otherwise parsed.
    pub fn resolve(&self, name: &str) -> Result<(Namespace, Vec<Chunk>), LeserError> {
        for ns in [Namespace::Reviewed, Namespace::Parsed] {
            if self.exists(ns, name) {
                return Ok((ns, self.load(ns, name)?));
            }
        }
        Err(self.not_found(name)?)
    }

    /// Record names in one namespace, sorted. A missing directory is empty.
    pub fn names(&self, ns: Namespace) -> Result<Vec<String>, LeserError> {
        let dir = self.namespace_dir(ns);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(LeserError::RecordReadFailed { path: dir, source }),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| LeserError::RecordReadFailed {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Every record name across both namespaces, sorted and deduplicated.
    pub fn available(&self) -> Result<Vec<String>, LeserError> {
        let mut names = self.names(Namespace::Parsed)?;
        names.extend(self.names(Namespace::Reviewed)?);
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn not_found(&self, name: &str) -> Result<LeserError, LeserError> {
        Ok(LeserError::NotFound {
            name: name.to_string(),
            available: self.available()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{BBox, ChunkStatus, Decision};
    use tempfile::TempDir;

    fn sample() -> Vec<Chunk> {
        vec![
            Chunk::text(
                1,
                "Hello world\nsæt ø".into(),
                BBox::new(10.5, 10.0, 99.25, 30.0),
                "doc.pdf",
            ),
            Chunk::table(
                2,
                0,
                vec![vec![Some("a".into()), None], vec![Some("c".into())]],
                "doc.pdf",
            ),
        ]
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path());
        let path = store.save(&sample(), Namespace::Parsed, "doc").unwrap();
        assert_eq!(path, dir.path().join("parsed/doc.json"));
        assert_eq!(store.load(Namespace::Parsed, "doc").unwrap(), sample());
    }

    #[test]
    fn full_precision_coordinates_round_trip_exactly() {
        // xorshift over page-sized coordinates, plus one value the default
        // float parser reads back one ulp off
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64 * 842.0
        };
        let mut chunks = vec![Chunk::text(
            1,
            "x".into(),
            BBox::new(29.453259532846662, 0.1 + 0.2, 595.2755905511812, 841.8897637795276),
            "doc.pdf",
        )];
        for i in 0..2000 {
            let bbox = BBox::new(next(), next(), next(), next());
            chunks.push(Chunk::figure(1, i + 1, bbox, "doc.pdf"));
        }

        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path());
        store.save(&chunks, Namespace::Parsed, "doc").unwrap();
        let loaded = store.load(Namespace::Parsed, "doc").unwrap();
        for (saved, back) in chunks.iter().zip(&loaded) {
            assert_eq!(saved.bbox(), back.bbox());
        }
        assert_eq!(loaded, chunks);
    }

    #[test]
    fn records_are_written_unescaped() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path());
        let path = store.save(&sample(), Namespace::Parsed, "doc").unwrap();
        let raw = std::fs::read_to_string(path).unwrap();
        assert!(raw.contains("sæt ø"));
    }

    #[test]
    fn save_overwrites_without_merging() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path());
        store.save(&sample(), Namespace::Parsed, "doc").unwrap();
        store.save(&sample()[..1], Namespace::Parsed, "doc").unwrap();
        assert_eq!(store.load(Namespace::Parsed, "doc").unwrap().len(), 1);
    }

    #[test]
    fn resolve_prefers_reviewed() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path());
        let mut reviewed = sample();
        reviewed[1].apply(Decision::Approve);
        store.save(&sample(), Namespace::Parsed, "doc").unwrap();

        let (ns, _) = store.resolve("doc").unwrap();
        assert_eq!(ns, Namespace::Parsed);

        store.save(&reviewed, Namespace::Reviewed, "doc").unwrap();
        let (ns, chunks) = store.resolve("doc").unwrap();
        assert_eq!(ns, Namespace::Reviewed);
        assert_eq!(chunks[1].status, ChunkStatus::Approved);
    }

    #[test]
    fn missing_record_reports_available_names() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path());
        store.save(&sample(), Namespace::Parsed, "beta").unwrap();
        store.save(&sample(), Namespace::Parsed, "alpha").unwrap();
        store.save(&sample(), Namespace::Reviewed, "beta").unwrap();

        match store.resolve("gamma") {
            Err(LeserError::NotFound { name, available }) => {
                assert_eq!(name, "gamma");
                assert_eq!(available, vec!["alpha", "beta"]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(matches!(
            store.load(Namespace::Reviewed, "alpha"),
            Err(LeserError::NotFound { .. })
        ));
    }

    #[test]
    fn names_ignore_other_files_and_missing_dirs() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path());
        assert!(store.names(Namespace::Reviewed).unwrap().is_empty());

        store.save(&sample(), Namespace::Parsed, "doc").unwrap();
        std::fs::write(dir.path().join("parsed/notes.txt"), "x").unwrap();
        assert_eq!(store.names(Namespace::Parsed).unwrap(), vec!["doc"]);
    }

    #[test]
    fn malformed_record_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("parsed")).unwrap();
        std::fs::write(dir.path().join("parsed/bad.json"), "[{\"page\":1}]").unwrap();
        assert!(matches!(
            store.load(Namespace::Parsed, "bad"),
            Err(LeserError::RecordMalformed { .. })
        ));
    }
}
