//! Download and cache PDFs referenced by URL.
//!
//! The cache is deliberately simple: the derived filename in the working
//! directory IS the cache key. If that file exists the network is never
//! touched — no TTL, no integrity check against the remote. Papers on arxiv
//! do not change under a fixed identifier, and a stale local copy can always
//! be discarded by deleting the file.
//!
//! arxiv abstract links (`/abs/<id>`) are rewritten to the direct PDF link
//! (`/pdf/<id>`) before fetching, so users can paste whichever URL their
//! browser shows. The response must look like a PDF (content-type or `%PDF-`
//! magic) before a single byte lands on disk — an HTML error page must never
//! be cached under a `.pdf` name.

use crate::error::FluffCutterError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for the whole download, connect included.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Fallback name for URLs whose path carries no usable last segment.
const FALLBACK_FILENAME: &str = "downloaded_paper.pdf";

/// Check whether the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Rewrite an arxiv abstract URL to its PDF counterpart.
///
/// Non-arxiv hosts pass through unchanged, as do arxiv URLs that already
/// point at `/pdf/`.
pub fn normalize_arxiv_url(url: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return url.to_string();
    };
    let is_arxiv = parsed
        .host_str()
        .is_some_and(|h| h == "arxiv.org" || h.ends_with(".arxiv.org"));
    if !is_arxiv {
        return url.to_string();
    }
    let path = parsed.path().replacen("/abs/", "/pdf/", 1);
    parsed.set_path(&path);
    parsed.to_string()
}

/// Derive the cache filename for a URL: last path segment, `.pdf` enforced.
///
/// `https://arxiv.org/pdf/2411.19870` → `2411.19870.pdf`
/// `https://example.com/paper.pdf`    → `paper.pdf`
pub fn filename_from_url(url: &str) -> String {
    let name = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty());

    match name {
        Some(n) if n.to_ascii_lowercase().ends_with(".pdf") => n,
        Some(n) => format!("{n}.pdf"),
        None => FALLBACK_FILENAME.to_string(),
    }
}

/// Decide whether an HTTP response body is acceptable as a PDF.
///
/// Either signal suffices: a `application/pdf` content-type, or the `%PDF-`
/// magic prefix. Some hosts serve PDFs as `application/octet-stream`; the
/// magic check keeps those working.
pub fn looks_like_pdf(content_type: &str, body: &[u8]) -> bool {
    content_type.contains("application/pdf") || body.starts_with(b"%PDF-")
}

/// Materialize a URL as a local PDF file in `dir`, using the cache.
///
/// Returns the local path. On a cache hit no request is issued at all.
pub async fn fetch_pdf(url: &str, dir: &Path) -> Result<PathBuf, FluffCutterError> {
    let url = normalize_arxiv_url(url);
    let filename = filename_from_url(&url);
    let target = dir.join(&filename);

    if target.exists() {
        info!("cache hit: {} (skipping download)", target.display());
        return Ok(target);
    }

    info!("downloading {}", url);
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| FluffCutterError::DownloadFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| FluffCutterError::DownloadFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FluffCutterError::DownloadFailed {
            url,
            reason: format!("HTTP {status}"),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FluffCutterError::DownloadFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    // Validate before touching disk: a rejected response leaves no file.
    if !looks_like_pdf(&content_type, &bytes) {
        return Err(FluffCutterError::NotPdfContent { url, content_type });
    }

    tokio::fs::write(&target, &bytes)
        .await
        .map_err(|e| FluffCutterError::OutputWriteFailed {
            path: target.clone(),
            source: e,
        })?;
    debug!("saved {} bytes to {}", bytes.len(), target.display());

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(is_url("https://arxiv.org/abs/2411.19870"));
        assert!(is_url("http://example.com/p.pdf"));
        assert!(!is_url("paper.pdf"));
        assert!(!is_url("/tmp/paper.pdf"));
        assert!(!is_url("ftp://example.com/p.pdf"));
    }

    #[test]
    fn arxiv_abs_rewrites_to_pdf() {
        assert_eq!(
            normalize_arxiv_url("https://arxiv.org/abs/2411.19870"),
            "https://arxiv.org/pdf/2411.19870"
        );
        assert_eq!(
            normalize_arxiv_url("https://arxiv.org/abs/2411.19870v2"),
            "https://arxiv.org/pdf/2411.19870v2"
        );
    }

    #[test]
    fn arxiv_pdf_url_unchanged() {
        assert_eq!(
            normalize_arxiv_url("https://arxiv.org/pdf/2411.19870"),
            "https://arxiv.org/pdf/2411.19870"
        );
    }

    #[test]
    fn non_arxiv_hosts_pass_through() {
        // Even with /abs/ in the path — only arxiv gets rewritten.
        assert_eq!(
            normalize_arxiv_url("https://example.com/abs/paper.pdf"),
            "https://example.com/abs/paper.pdf"
        );
    }

    #[test]
    fn filename_derivation() {
        assert_eq!(
            filename_from_url("https://arxiv.org/pdf/2411.19870"),
            "2411.19870.pdf"
        );
        assert_eq!(
            filename_from_url("https://example.com/dir/paper.pdf"),
            "paper.pdf"
        );
        assert_eq!(
            filename_from_url("https://example.com/PAPER.PDF"),
            "PAPER.PDF"
        );
        assert_eq!(filename_from_url("https://example.com/"), FALLBACK_FILENAME);
    }

    #[test]
    fn pdf_sniffing() {
        assert!(looks_like_pdf("application/pdf", b""));
        assert!(looks_like_pdf("application/pdf; charset=binary", b""));
        assert!(looks_like_pdf("application/octet-stream", b"%PDF-1.7 rest"));
        assert!(!looks_like_pdf("text/html", b"<!DOCTYPE html>"));
        assert!(!looks_like_pdf("text/html; charset=utf-8", b"%PDX"));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_network() {
        // The file already exists, so fetch_pdf must return without issuing
        // a request; this test passes with no network available.
        let tmp = tempfile::tempdir().unwrap();
        let cached = tmp.path().join("2411.19870.pdf");
        std::fs::write(&cached, b"%PDF-1.4 cached").unwrap();

        let path = fetch_pdf("https://arxiv.org/abs/2411.19870", tmp.path())
            .await
            .expect("cache hit must not fail");
        assert_eq!(path, cached);
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 cached");
    }
}
