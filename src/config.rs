//! Configuration types for extraction.
//!
//! All extraction behaviour is controlled through [`ExtractConfig`], built via
//! its [`ExtractConfigBuilder`]. The line-clustering precision lives here
//! rather than in the chunker so it can be tuned per document.

use crate::error::LeserError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for turning a document into chunks.
///
/// # Example
/// ```rust
/// use leser::{ExtractConfig, PageSelection};
///
/// let config = ExtractConfig::builder()
///     .line_precision(1)
///     .pages(PageSelection::Range(1, 10))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractConfig {
    /// Decimal places kept when rounding a word's top edge into a line key. Default: 1.
    ///
    /// Words whose rounded top edges are equal form one line. One decimal
    /// absorbs sub-unit jitter between glyph runs on the same baseline; zero
    /// decimals starts merging tightly spaced lines, two or more starts
    /// splitting lines set in mixed fonts.
    pub line_precision: u32,

    /// Distance (page units) between consecutive glyphs that ends a word. Default: 3.0.
    ///
    /// Applies horizontally and vertically. Only used by the pdfium layout
    /// reader; layout dumps already carry words.
    pub word_gap: f64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            line_precision: 1,
            word_gap: 3.0,
            password: None,
            pages: PageSelection::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("line_precision", &self.line_precision)
            .field("word_gap", &self.word_gap)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractConfig {
    /// Create a new builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }

    /// Quantise a top-edge coordinate into its line key: `top` rounded to
    /// `line_precision` decimals, scaled to an integer.
    ///
    /// Rounding goes through decimal formatting, which rounds the exact
    /// binary value, so `10.35` (stored as `10.3499…`) keys with `10.3`.
    /// Scaling first would push it over the half and onto `10.4`.
    pub fn line_key(&self, top: f64) -> i64 {
        let prec = self.line_precision as usize;
        let rounded = format!("{top:.prec$}");
        rounded
            .replace('.', "")
            .parse()
            .unwrap_or_else(|_| (top * 10f64.powi(prec as i32)).round() as i64)
    }
}

/// Builder for [`ExtractConfig`].
#[derive(Debug)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn line_precision(mut self, decimals: u32) -> Self {
        self.config.line_precision = decimals;
        self
    }

    pub fn word_gap(mut self, gap: f64) -> Self {
        self.config.word_gap = gap;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, LeserError> {
        let c = &self.config;
        if c.line_precision > 6 {
            return Err(LeserError::InvalidConfig(format!(
                "line precision must be 0–6 decimal places, got {}",
                c.line_precision
            )));
        }
        if !(c.word_gap.is_finite() && c.word_gap > 0.0) {
            return Err(LeserError::InvalidConfig(format!(
                "word gap must be a positive number, got {}",
                c.word_gap
            )));
        }
        Ok(self.config)
    }
}

/// Specifies which pages of the document to extract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Extract all pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// First page this selection asks for (1-indexed), for error reporting.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) | PageSelection::Range(p, _) => *p,
            PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
        }
    }
}
