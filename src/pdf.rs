//! PDF handling: read, validate, base64-encode, and cut to N pages.
//!
//! Providers ingest the PDF natively, so no rendering or text extraction
//! happens here. The only structural operation is the truncation cut: parse
//! the page tree with lopdf, drop every page past the limit, and
//! re-serialize. "Pages" means literal page count — not an estimated token
//! budget.

use crate::error::FluffCutterError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::Path;
use tracing::{debug, info};

/// Page limit applied when a provider reports a token-limit failure and the
/// user gave no `--max-pages`.
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// A possibly page-reduced PDF, ready for encoding.
#[derive(Debug, Clone)]
pub struct PreparedPdf {
    pub bytes: Vec<u8>,
    /// Page count of the document before any cut.
    pub total_pages: usize,
    pub truncated: bool,
}

/// Read a local PDF, validating existence, extension, and magic bytes.
pub fn read_pdf(path: &Path) -> Result<Vec<u8>, FluffCutterError> {
    if !path.exists() {
        return Err(FluffCutterError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let is_pdf_ext = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf_ext {
        return Err(FluffCutterError::NotAPdf {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|_| FluffCutterError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    if !bytes.starts_with(b"%PDF") {
        return Err(FluffCutterError::NotAPdf {
            path: path.to_path_buf(),
        });
    }
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Base64-encode PDF bytes for embedding in a provider request.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// The filename component of a PDF path, for provider request metadata.
pub fn pdf_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "paper.pdf".to_string())
}

/// Cut a PDF down to its first `max_pages` pages.
///
/// A document already at or under the limit is passed through unchanged
/// (`truncated = false`) without re-serialization, so well-formed input
/// bytes stay byte-identical on the common path.
pub fn truncate_to_pages(
    bytes: &[u8],
    path: &Path,
    max_pages: u32,
) -> Result<PreparedPdf, FluffCutterError> {
    let mut doc = lopdf::Document::load_mem(bytes).map_err(|e| FluffCutterError::PdfParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let total_pages = doc.get_pages().len();
    if total_pages <= max_pages as usize {
        debug!("{total_pages} pages, within the {max_pages}-page limit");
        return Ok(PreparedPdf {
            bytes: bytes.to_vec(),
            total_pages,
            truncated: false,
        });
    }

    let dropped: Vec<u32> = (max_pages + 1..=total_pages as u32).collect();
    doc.delete_pages(&dropped);
    doc.prune_objects();

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| FluffCutterError::PdfParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    info!(
        "truncated {} from {} to {} pages",
        path.display(),
        total_pages,
        max_pages
    );
    Ok(PreparedPdf {
        bytes: out,
        total_pages,
        truncated: true,
    })
}

/// Count the pages of an in-memory PDF. Used by tests and status output.
pub fn page_count(bytes: &[u8], path: &Path) -> Result<usize, FluffCutterError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| FluffCutterError::PdfParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(doc.get_pages().len())
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a minimal valid PDF with `n` empty pages.
    pub fn pdf_with_pages(n: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..n)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                });
                Object::Reference(page_id)
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => n as i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("in-memory save");
        buf
    }
}
