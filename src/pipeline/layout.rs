//! Layout source: raw per-page primitives (words, tables, images).
//!
//! Two readers produce a [`DocumentLayout`]:
//!
//! * [`read_pdf`] walks a PDF's glyphs and page objects through pdfium.
//!   pdfium exposes no table structure, so PDF layouts carry words and
//!   images only.
//! * [`read_dump`] loads a JSON layout dump written by another extractor,
//!   which may include tables.
//!
//! Coordinates are normalised to a top-left origin (y grows downwards) so
//! that sorting by `y_min` gives reading order.
//!
//! pdfium keeps thread-local state and must not run on a Tokio worker; the
//! async entry points call [`read_pdf`] from `spawn_blocking`.

use crate::chunk::{BBox, Row};
use crate::config::ExtractConfig;
use crate::error::{LayoutError, LeserError};
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// A word and its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Location of an image on the page. The pixels are never carried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawImage {
    pub bbox: BBox,
}

/// Raw primitives of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    #[serde(default)]
    pub words: Vec<Word>,
    /// Tables as rows of cells; rows may be ragged, cells may be absent.
    #[serde(default)]
    pub tables: Vec<Vec<Row>>,
    #[serde(default)]
    pub images: Vec<RawImage>,
}

/// Layout of a whole document; page `n` (1-based) is `pages[n - 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

/// Outcome of reading one page: its 1-based number and layout or error.
pub type PageRead = (usize, Result<PageLayout, LayoutError>);

impl DocumentLayout {
    /// Pair each page selected by `config.pages` with its 1-based number.
    pub fn select(self, config: &ExtractConfig) -> Result<Vec<PageRead>, LeserError> {
        let indices = selected_indices(config, self.pages.len())?;
        let mut pages: Vec<Option<PageLayout>> = self.pages.into_iter().map(Some).collect();
        Ok(indices
            .into_iter()
            .filter_map(|idx| {
                pages
                    .get_mut(idx)
                    .and_then(Option::take)
                    .map(|p| (idx + 1, Ok(p)))
            })
            .collect())
    }
}

fn selected_indices(config: &ExtractConfig, total_pages: usize) -> Result<Vec<usize>, LeserError> {
    let indices = config.pages.to_indices(total_pages);
    if indices.is_empty() {
        return Err(LeserError::PageOutOfRange {
            page: config.pages.first_requested(),
            total: total_pages,
        });
    }
    debug!("Selected {} of {} pages", indices.len(), total_pages);
    Ok(indices)
}

/// Load a JSON layout dump.
pub fn read_dump(path: &Path) -> Result<DocumentLayout, LeserError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LeserError::RecordReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let layout: DocumentLayout =
        serde_json::from_str(&raw).map_err(|source| LeserError::LayoutDumpInvalid {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Layout dump loaded: {} pages", layout.pages.len());
    Ok(layout)
}

/// Bind to a pdfium library.
///
/// `PDFIUM_LIB_PATH` wins when set; otherwise a library next to the working
/// directory, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, LeserError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => Pdfium::bind_to_library(&p),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| LeserError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

/// Read the layout of the pages of a PDF selected by `config.pages`. Blocking.
///
/// Per-page failures are returned in place; only failures to open the
/// document at all, or a selection matching no page, are fatal.
pub fn read_pdf(pdf_path: &Path, config: &ExtractConfig) -> Result<Vec<PageRead>, LeserError> {
    let pdfium = bind_pdfium()?;
    let document = open_pdf(&pdfium, pdf_path, config.password.as_deref())?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let page_indices = selected_indices(config, total_pages)?;
    let mut results = Vec::with_capacity(page_indices.len());

    for idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page_num = idx + 1;
        let read = pages
            .get(idx as u16)
            .map_err(|e| LayoutError::PageLoad {
                page: page_num,
                detail: format!("{:?}", e),
            })
            .and_then(|page| read_page(&page, page_num, config.word_gap));

        if let Ok(layout) = &read {
            debug!(
                "Read page {} → {} words, {} images",
                page_num,
                layout.words.len(),
                layout.images.len()
            );
        }
        results.push((page_num, read));
    }

    Ok(results)
}

fn open_pdf<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, LeserError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                LeserError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                LeserError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            LeserError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

fn read_page(page: &PdfPage, page_num: usize, word_gap: f64) -> Result<PageLayout, LayoutError> {
    let height = page.height().value as f64;
    let flip = |left: f32, top: f32, right: f32, bottom: f32| {
        BBox::new(
            left as f64,
            height - top as f64,
            right as f64,
            height - bottom as f64,
        )
    };

    let text = page.text().map_err(|e| LayoutError::Text {
        page: page_num,
        detail: format!("{:?}", e),
    })?;

    let mut glyphs = Vec::new();
    for ch in text.chars().iter() {
        let Some(value) = ch.unicode_char() else {
            continue;
        };
        if value.is_whitespace() || value == '\u{0}' {
            glyphs.push(Glyph::Break);
            continue;
        }
        let rect = ch
            .tight_bounds()
            .or_else(|primary| ch.loose_bounds().map_err(|_| primary))
            .map_err(|e| LayoutError::Text {
                page: page_num,
                detail: format!("{:?}", e),
            })?;
        glyphs.push(Glyph::Char(
            value,
            flip(
                rect.left().value,
                rect.top().value,
                rect.right().value,
                rect.bottom().value,
            ),
        ));
    }

    let mut images = Vec::new();
    for object in page.objects().iter() {
        if object.object_type() != PdfPageObjectType::Image {
            continue;
        }
        match object.bounds() {
            Ok(b) => images.push(RawImage {
                bbox: flip(b.left().value, b.top().value, b.right().value, b.bottom().value),
            }),
            Err(e) => warn!("Page {}: image without bounds skipped: {:?}", page_num, e),
        }
    }

    Ok(PageLayout {
        words: group_words(&glyphs, word_gap),
        tables: Vec::new(),
        images,
    })
}

/// A glyph in content-stream order, or a whitespace break.
#[derive(Debug, Clone, Copy)]
enum Glyph {
    Char(char, BBox),
    Break,
}

/// Join glyphs into words: whitespace ends a word, and so does a jump of more
/// than `gap` from the previous glyph (forwards, backwards, or vertically).
fn group_words(glyphs: &[Glyph], gap: f64) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<Word> = None;

    for glyph in glyphs {
        let (ch, bbox) = match *glyph {
            Glyph::Char(ch, bbox) => (ch, bbox),
            Glyph::Break => {
                words.extend(current.take());
                continue;
            }
        };

        if let Some(word) = current.as_mut() {
            let dx = bbox.x_min - word.bbox.x_max;
            let dy = (bbox.y_min - word.bbox.y_min).abs();
            if dx <= gap && dx >= -gap && dy <= gap {
                word.text.push(ch);
                word.bbox = word.bbox.union(&bbox);
                continue;
            }
            words.extend(current.take());
        }
        current = Some(Word::new(ch.to_string(), bbox));
    }

    words.extend(current);
    words
}
