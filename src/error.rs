//! Error types for the leser library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LeserError`]: **Fatal** for the operation that returned it: the
//!   document cannot be read, a record cannot be written, the operator's
//!   terminal went away. Returned as `Err(LeserError)` from the top-level
//!   functions.
//!
//! * [`LayoutError`]: **Non-fatal**: one page's layout could not be read but
//!   the other pages are fine. The page contributes no chunks and extraction
//!   carries on; only when every selected page fails does extraction give up.
//!
//! `NotFound` and `EmptyRecord` are fatal for the single call but not for the
//! process: the CLI reports them and moves on to the next record.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the leser library.
#[derive(Debug, Error)]
pub enum LeserError {
    // ── Record lookup ─────────────────────────────────────────────────────
    /// No record with this name exists in either namespace.
    #[error("not found: {name}\navailable: {}", available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    /// Stats were requested for a record holding zero chunks.
    #[error("record '{name}' has no chunks; page range is undefined")]
    EmptyRecord { name: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a usable file path or URL.
    #[error("Invalid input '{input}': not a PDF, a layout dump (.json), or an HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Every selected page failed layout extraction.
    #[error("All {total} pages failed layout extraction.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// A JSON layout dump could not be parsed.
    #[error("Layout dump '{path}' is invalid: {source}")]
    LayoutDumpInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Record I/O ────────────────────────────────────────────────────────
    /// Could not read a stored record or list a namespace.
    #[error("Failed to read '{path}': {source}")]
    RecordReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write a record file.
    #[error("Failed to write record '{path}': {source}")]
    RecordWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored record exists but does not deserialize into chunks.
    #[error("Record '{path}' is malformed: {source}")]
    RecordMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Operator I/O ──────────────────────────────────────────────────────
    /// Reading a command from, or writing a prompt to, the operator failed.
    #[error("Operator I/O failed: {0}")]
    Prompt(#[from] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum LayoutError {
    /// pdfium could not open the page.
    #[error("Page {page}: could not be loaded: {detail}")]
    PageLoad { page: usize, detail: String },

    /// The page's text layer could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    Text { page: usize, detail: String },
}
