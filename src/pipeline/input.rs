//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! URLs are downloaded once into a cache directory under a stable name and
//! reused on later runs, so re-extracting a document never refetches it.
//! Local inputs are either a PDF (checked for the `%PDF` magic bytes) or a
//! JSON layout dump (`.json`).

use crate::error::LeserError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// What kind of layout source a resolved file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    LayoutDump,
}

/// A local file ready for layout reading.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub kind: InputKind,
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name recorded as each chunk's `source`.
    pub fn source_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// File stem, the default record name.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_name())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local file.
///
/// URLs are fetched into `cache_dir` as [`download_name`]`(url, name)`,
/// unless that file is already there.
pub async fn resolve_input(
    input: &str,
    name: Option<&str>,
    cache_dir: &Path,
    timeout_secs: u64,
) -> Result<ResolvedInput, LeserError> {
    if is_url(input) {
        let dest = cache_dir.join(download_name(input, name));
        fetch_cached(input, &dest, timeout_secs).await?;
        Ok(ResolvedInput {
            path: dest,
            kind: InputKind::Pdf,
        })
    } else {
        resolve_local(input)
    }
}

/// File name a URL is cached under: the explicit `name` or the URL's last
/// path segment, with `.pdf` appended when missing.
pub fn download_name(url: &str, name: Option<&str>) -> String {
    let base = match name {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => reqwest::Url::parse(url)
            .ok()
            .and_then(|parsed| {
                parsed
                    .path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .filter(|last| !last.is_empty())
            .unwrap_or_else(|| "downloaded".to_string()),
    };
    if base.ends_with(".pdf") {
        base
    } else {
        format!("{base}.pdf")
    }
}

/// Resolve a local file path, validating existence and kind.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, LeserError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(LeserError::FileNotFound { path });
    }

    let is_dump = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    match std::fs::File::open(&path) {
        Ok(f) => {
            if !is_dump {
                let mut head = Vec::with_capacity(PDF_MAGIC.len());
                f.take(PDF_MAGIC.len() as u64)
                    .read_to_end(&mut head)
                    .map_err(|_| LeserError::InvalidInput {
                        input: path_str.to_string(),
                    })?;
                check_magic(&head, &path)?;
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(LeserError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(LeserError::FileNotFound { path });
        }
    }

    let kind = if is_dump {
        InputKind::LayoutDump
    } else {
        InputKind::Pdf
    };
    debug!("Resolved local input: {} ({:?})", path.display(), kind);
    Ok(ResolvedInput { path, kind })
}

/// Download `url` to `dest` unless `dest` already exists.
///
/// The body is streamed to a `.part` file and renamed into place only once
/// it is complete and starts with `%PDF`, so neither an interrupted download
/// nor an error page ever lands in the cache.
async fn fetch_cached(url: &str, dest: &Path, timeout_secs: u64) -> Result<(), LeserError> {
    if dest.exists() {
        info!("Already downloaded: {}", dest.display());
        return Ok(());
    }

    info!("Downloading {} -> {}", url, dest.display());

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LeserError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_error(url, timeout_secs, e))?;

    if !response.status().is_success() {
        return Err(LeserError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| LeserError::RecordWriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let part = dest.with_extension("pdf.part");
    let size = match stream_body(response, url, timeout_secs, dest, &part).await {
        Ok(size) => size,
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }
    };
    tokio::fs::rename(&part, dest)
        .await
        .map_err(|source| LeserError::RecordWriteFailed {
            path: dest.to_path_buf(),
            source,
        })?;

    info!("Saved {} ({} kb)", dest.display(), size / 1024);
    Ok(())
}

/// Copy the response body into `part` chunk by chunk, checking the magic
/// bytes as soon as they arrive. Returns the body size.
async fn stream_body(
    mut response: reqwest::Response,
    url: &str,
    timeout_secs: u64,
    dest: &Path,
    part: &Path,
) -> Result<u64, LeserError> {
    let write_err = |source| LeserError::RecordWriteFailed {
        path: part.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::create(part).await.map_err(write_err)?;
    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    let mut size = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| request_error(url, timeout_secs, e))?
    {
        if head.len() < PDF_MAGIC.len() {
            let take = (PDF_MAGIC.len() - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
            if head.len() == PDF_MAGIC.len() {
                check_magic(&head, dest)?;
            }
        }
        file.write_all(&chunk).await.map_err(write_err)?;
        size += chunk.len() as u64;
    }

    // bodies shorter than the magic never reached the check above
    check_magic(&head, dest)?;
    file.flush().await.map_err(write_err)?;
    debug!("Streamed {} bytes into {}", size, part.display());
    Ok(size)
}

fn request_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> LeserError {
    if e.is_timeout() {
        LeserError::DownloadTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        LeserError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// `NotAPdf` unless `head` starts with `%PDF`. Short input fails too; the
/// reported magic is zero-padded.
fn check_magic(head: &[u8], path: &Path) -> Result<(), LeserError> {
    if head.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(magic.len());
    magic[..n].copy_from_slice(&head[..n]);
    Err(LeserError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn download_name_prefers_explicit_name() {
        assert_eq!(
            download_name("https://example.com/a/report.pdf", Some("annual")),
            "annual.pdf"
        );
        assert_eq!(
            download_name("https://example.com/x", Some("kept.pdf")),
            "kept.pdf"
        );
    }

    #[test]
    fn download_name_from_last_segment() {
        assert_eq!(
            download_name("https://example.com/a/report.pdf", None),
            "report.pdf"
        );
        assert_eq!(
            download_name("https://arxiv.org/pdf/1706.03762", None),
            "1706.03762.pdf"
        );
        assert_eq!(download_name("https://example.com/", None), "downloaded.pdf");
    }

    #[test]
    fn local_json_is_a_layout_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, "{\"pages\":[]}").unwrap();
        let resolved = resolve_local(path.to_str().unwrap()).unwrap();
        assert_eq!(resolved.kind, InputKind::LayoutDump);
        assert_eq!(resolved.stem(), "scan");
        assert_eq!(resolved.source_name(), "scan.json");
    }

    #[test]
    fn local_non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"GIF89a").unwrap();
        match resolve_local(path.to_str().unwrap()) {
            Err(LeserError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"GIF8"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        assert!(matches!(
            resolve_local("/definitely/not/here.pdf"),
            Err(LeserError::FileNotFound { .. })
        ));
    }

    /// Answer one request on a loopback port with `body`; returns its URL.
    async fn serve_once(body: &'static [u8]) -> String {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/files/report.pdf")
    }

    #[tokio::test]
    async fn download_streams_into_cache() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once(b"%PDF-1.7\n%%EOF\n").await;

        let resolved = resolve_input(&url, None, dir.path(), 5).await.unwrap();
        assert_eq!(resolved.path, dir.path().join("report.pdf"));
        assert_eq!(std::fs::read(&resolved.path).unwrap(), b"%PDF-1.7\n%%EOF\n");
        assert!(!dir.path().join("report.pdf.part").exists());
    }

    #[tokio::test]
    async fn body_shorter_than_magic_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once(b"%P").await;

        match resolve_input(&url, None, dir.path(), 5).await {
            Err(LeserError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"%P\0\0"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
        assert!(!dir.path().join("report.pdf").exists());
        assert!(!dir.path().join("report.pdf.part").exists());
    }

    #[tokio::test]
    async fn error_page_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let url = serve_once(b"<html>moved</html>").await;

        assert!(matches!(
            resolve_input(&url, Some("kept"), dir.path(), 5).await,
            Err(LeserError::NotAPdf { .. })
        ));
        assert!(!dir.path().join("kept.pdf").exists());
    }

    #[test]
    fn empty_local_file_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            resolve_local(path.to_str().unwrap()),
            Err(LeserError::NotAPdf { .. })
        ));
    }

    #[tokio::test]
    async fn cached_download_is_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cached.pdf"), b"%PDF-1.7").unwrap();
        // the URL is unroutable; success proves the cache short-circuits
        let resolved = resolve_input("http://127.0.0.1:9/cached.pdf", None, dir.path(), 1)
            .await
            .unwrap();
        assert_eq!(resolved.path, dir.path().join("cached.pdf"));
        assert_eq!(resolved.kind, InputKind::Pdf);
    }
}
