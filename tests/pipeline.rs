//! Integration tests: layout dump → extraction → store → review.
//!
//! Everything runs against JSON layout dumps in a temporary data directory,
//! so no pdfium library or network access is needed.

use leser::{
    extract_to_store, review_record, BBox, ChunkBody, ChunkKind, ChunkStatus, ChunkStore,
    DocumentLayout, ExtractConfig, ExtractionProgressCallback, LeserError, Namespace,
    PageLayout, RawImage, RecordStats, TableContent, Word,
};
use serde_json::json;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn cell(s: &str) -> Option<String> {
    Some(s.to_string())
}

/// Page 1: "Hello world" on one line. Page 2: one ragged table.
fn hello_table() -> DocumentLayout {
    DocumentLayout {
        pages: vec![
            PageLayout {
                words: vec![
                    Word::new("world", BBox::new(40.0, 10.04, 70.0, 20.0)),
                    Word::new("Hello", BBox::new(5.0, 10.0, 35.0, 20.0)),
                ],
                ..Default::default()
            },
            PageLayout {
                tables: vec![vec![vec![cell("a"), cell("b")], vec![cell("c")]]],
                ..Default::default()
            },
        ],
    }
}

/// Two pages, four flagged chunks: two tables and two figures.
fn busy() -> DocumentLayout {
    let image = |y: f64| RawImage {
        bbox: BBox::new(0.0, y, 100.0, y + 50.0),
    };
    DocumentLayout {
        pages: vec![
            PageLayout {
                words: vec![Word::new("Intro", BBox::new(0.0, 5.0, 20.0, 12.0))],
                tables: vec![vec![vec![cell("k"), cell("v")], vec![cell("x"), cell("1")]]],
                images: vec![image(100.0)],
            },
            PageLayout {
                tables: vec![vec![vec![cell("only")]]],
                images: vec![image(300.0)],
                ..Default::default()
            },
        ],
    }
}

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
    store: ChunkStore,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let store = ChunkStore::new(root.join("data"));
        Self {
            _dir: dir,
            root,
            store,
        }
    }

    fn dump(&self, file: &str, layout: &DocumentLayout) -> PathBuf {
        let path = self.root.join(file);
        std::fs::write(&path, serde_json::to_vec(layout).unwrap()).unwrap();
        path
    }

    async fn extract(&self, path: &Path, name: Option<&str>) -> Vec<leser::Chunk> {
        let (extraction, _) = extract_to_store(
            path.to_string_lossy(),
            name,
            &self.store,
            &ExtractConfig::default(),
        )
        .await
        .unwrap();
        extraction.chunks
    }

    fn review(&self, name: &str, script: &str) -> (leser::ReviewOutcome, String) {
        let mut out = Vec::new();
        let outcome =
            review_record(&self.store, name, Cursor::new(script.to_string()), &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    fn reviewed(&self, name: &str) -> Vec<leser::Chunk> {
        self.store.load(Namespace::Reviewed, name).unwrap()
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn hello_world_and_ragged_table() {
    let ws = Workspace::new();
    let path = ws.dump("letter.json", &hello_table());
    let chunks = ws.extract(&path, None).await;

    assert_eq!(chunks.len(), 2);
    let raw = std::fs::read_to_string(ws.store.record_path(Namespace::Parsed, "letter")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        stored,
        json!([
            {
                "page": 1,
                "type": "text",
                "content": "Hello world",
                "bbox": [5.0, 10.0, 70.0, 20.0],
                "source": "letter.json",
                "status": "auto"
            },
            {
                "page": 2,
                "type": "table",
                "content": [["a", "b"], ["c"]],
                "table_index": 0,
                "source": "letter.json",
                "status": "needs_review"
            }
        ])
    );

    let stats = RecordStats::compute("letter", &chunks).unwrap();
    assert_eq!(stats.tally.to_string(), "text: 1, table: 1, auto: 1, needs_review: 1");
    assert_eq!((stats.min_page, stats.max_page), (1, 2));
}

#[tokio::test]
async fn flagged_kinds_and_page_order() {
    let ws = Workspace::new();
    let path = ws.dump("busy.json", &busy());
    let chunks = ws.extract(&path, Some("busy")).await;

    let shape: Vec<(u32, ChunkKind, ChunkStatus)> =
        chunks.iter().map(|c| (c.page, c.kind(), c.status)).collect();
    assert_eq!(
        shape,
        vec![
            (1, ChunkKind::Text, ChunkStatus::Auto),
            (1, ChunkKind::Table, ChunkStatus::NeedsReview),
            (1, ChunkKind::Figure, ChunkStatus::NeedsReview),
            (2, ChunkKind::Table, ChunkStatus::NeedsReview),
            (2, ChunkKind::Figure, ChunkStatus::NeedsReview),
        ]
    );
    match &chunks[4].body {
        ChunkBody::Figure { content, .. } => assert_eq!(content, "[figure on page 2, image 1]"),
        other => panic!("expected figure, got {other:?}"),
    }
}

#[tokio::test]
async fn progress_events_follow_pages() {
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ExtractionProgressCallback for Recorder {
        fn on_extraction_start(&self, total_pages: usize) {
            self.0.lock().unwrap().push(format!("start {total_pages}"));
        }
        fn on_page_extracted(&self, page_num: usize, _total: usize, chunk_count: usize) {
            self.0
                .lock()
                .unwrap()
                .push(format!("page {page_num}: {chunk_count}"));
        }
        fn on_extraction_complete(&self, _total: usize, chunk_count: usize) {
            self.0.lock().unwrap().push(format!("done {chunk_count}"));
        }
    }

    let ws = Workspace::new();
    let path = ws.dump("busy.json", &busy());
    let recorder = Arc::new(Recorder::default());
    let config = ExtractConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    extract_to_store(path.to_string_lossy(), None, &ws.store, &config)
        .await
        .unwrap();
    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec!["start 2", "page 1: 3", "page 2: 2", "done 5"]
    );
}

#[tokio::test]
async fn malformed_dump_is_reported() {
    let ws = Workspace::new();
    let path = ws.root.join("bad.json");
    std::fs::write(&path, "{\"pages\": 3}").unwrap();
    let result = extract_to_store(
        path.to_string_lossy(),
        None,
        &ws.store,
        &ExtractConfig::default(),
    )
    .await;
    assert!(matches!(result, Err(LeserError::LayoutDumpInvalid { .. })));
    assert!(!ws.store.exists(Namespace::Parsed, "bad"));
}

// ── Review ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn discard_then_quit_keeps_text_untouched() {
    let ws = Workspace::new();
    let path = ws.dump("letter.json", &hello_table());
    let parsed = ws.extract(&path, None).await;

    let (outcome, out) = ws.review("letter", "d\nq\n");
    assert_eq!(outcome.discarded, 1);
    assert!(out.contains("--- [1/1] page 2 | table ---\na | b\n--+--\nc |  \n"));

    let reviewed = ws.reviewed("letter");
    assert_eq!(reviewed[0], parsed[0]);
    assert_eq!(reviewed[0].status, ChunkStatus::Auto);
    assert_eq!(reviewed[1].status, ChunkStatus::Discarded);
    assert_eq!(reviewed[1].body, parsed[1].body);
}

#[tokio::test]
async fn quit_after_k_decisions_keeps_the_rest_flagged() {
    let ws = Workspace::new();
    let path = ws.dump("busy.json", &busy());
    ws.extract(&path, None).await;

    let (outcome, _) = ws.review("busy", "a\ne\nfixed caption\n\nq\n");
    assert!(outcome.quit);
    assert_eq!(outcome.decided(), 2);

    let statuses: Vec<ChunkStatus> = ws.reviewed("busy").iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            ChunkStatus::Auto,
            ChunkStatus::Approved,
            ChunkStatus::Edited,
            ChunkStatus::NeedsReview,
            ChunkStatus::NeedsReview,
        ]
    );
}

#[tokio::test]
async fn later_runs_resume_where_the_last_one_stopped() {
    let ws = Workspace::new();
    let path = ws.dump("busy.json", &busy());
    ws.extract(&path, None).await;

    ws.review("busy", "s\na\nq\n");
    let (outcome, out) = ws.review("busy", "e\nk | v\n\nd\nd\n");
    assert_eq!(outcome.flagged, 3);
    assert!(!outcome.quit);
    assert!(out.ends_with("\ndone. reviewed file saved.\n"));

    let reviewed = ws.reviewed("busy");
    assert_eq!(
        reviewed[1].body,
        ChunkBody::Table {
            content: TableContent::Text("k | v".into()),
            table_index: 0,
        }
    );
    assert_eq!(reviewed[1].status, ChunkStatus::Edited);
    assert_eq!(reviewed[2].status, ChunkStatus::Approved);
    assert!(reviewed[3..].iter().all(|c| c.status == ChunkStatus::Discarded));

    let (outcome, out) = ws.review("busy", "");
    assert_eq!(outcome.flagged, 0);
    assert_eq!(out, "nothing to review\n");
}

#[tokio::test]
async fn skip_is_idempotent() {
    let ws = Workspace::new();
    let path = ws.dump("busy.json", &busy());
    let parsed = ws.extract(&path, None).await;

    for _ in 0..3 {
        let (outcome, _) = ws.review("busy", "s\ns\ns\ns\n");
        assert_eq!(outcome.skipped, 4);
    }
    assert_eq!(ws.reviewed("busy"), parsed);
}

#[test]
fn reviewing_an_unknown_name_lists_what_exists() {
    let ws = Workspace::new();
    let chunk = leser::Chunk::text(1, "x".into(), BBox::new(0.0, 0.0, 1.0, 1.0), "a.pdf");
    ws.store.save(&[chunk], Namespace::Parsed, "alpha").unwrap();

    let err = review_record(&ws.store, "omega", Cursor::new(""), Vec::new()).unwrap_err();
    assert_eq!(err.to_string(), "not found: omega\navailable: alpha");
}
