//! Analysis orchestration: resolve the input, call the provider, recover
//! from token-limit rejections.
//!
//! ## Why
//!
//! The truncate-and-retry policy lives here, not in the providers. Backends
//! only classify their own errors; this module decides what to do about
//! them, so the recovery behaviour is identical across vendors and testable
//! against a scripted fake. The policy:
//!
//! * `--max-pages N` given: cut to N pages before the first attempt. A
//!   token-limit failure after an explicit cut is fatal — the user already
//!   chose the trade-off.
//! * no flag: send the full document first. On a token-limit rejection, cut
//!   to [`DEFAULT_MAX_PAGES`] and retry exactly once.

use crate::config::EffectiveConfig;
use crate::download::{fetch_pdf, is_url};
use crate::error::FluffCutterError;
use crate::pdf::{self, PreparedPdf, DEFAULT_MAX_PAGES};
use crate::prompts::{extract_title, ANALYSIS_PROMPT};
use crate::providers::{build_provider, PaperProvider};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The result of one paper analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub title: String,
    /// The model's answers, with the `TITLE:` line already removed.
    pub body: String,
    /// `"Anthropic (claude-opus-4-5)"` — recorded in the output footer.
    pub model_info: String,
    /// Whether the analyzed document was cut down before the successful call.
    pub truncated: bool,
}

/// Turn the positional argument into a local PDF path.
///
/// URLs are downloaded (or served from the cache) into `download_dir`;
/// anything else is taken as a filesystem path verbatim.
pub async fn resolve_input(
    input: &str,
    download_dir: &Path,
) -> Result<PathBuf, FluffCutterError> {
    if is_url(input) {
        fetch_pdf(input, download_dir).await
    } else {
        Ok(PathBuf::from(input))
    }
}

/// Analyze a local PDF with the backend named by the configuration.
pub async fn analyze(
    config: &EffectiveConfig,
    pdf_path: &Path,
) -> Result<Analysis, FluffCutterError> {
    let provider = build_provider(config)?;
    analyze_with_provider(provider.as_ref(), pdf_path, config.max_pages).await
}

/// Analyze a local PDF against any [`PaperProvider`].
pub async fn analyze_with_provider(
    provider: &dyn PaperProvider,
    pdf_path: &Path,
    max_pages: Option<u32>,
) -> Result<Analysis, FluffCutterError> {
    let bytes = pdf::read_pdf(pdf_path)?;
    let filename = pdf::pdf_filename(pdf_path);

    // Explicit limit: cut up front, no retry.
    if let Some(limit) = max_pages {
        let prepared = pdf::truncate_to_pages(&bytes, pdf_path, limit)?;
        let raw = attempt(provider, &prepared, &filename).await?;
        return Ok(finish(provider, raw, prepared.truncated));
    }

    let full = PreparedPdf {
        bytes,
        total_pages: 0,
        truncated: false,
    };
    match attempt(provider, &full, &filename).await {
        Ok(raw) => Ok(finish(provider, raw, false)),
        Err(original) if original.is_token_limit() => {
            let prepared = pdf::truncate_to_pages(&full.bytes, pdf_path, DEFAULT_MAX_PAGES)?;
            if !prepared.truncated {
                // Already at or under the cut; resending the same bytes
                // cannot succeed.
                return Err(original);
            }
            warn!(
                "token limit hit; retrying with the first {DEFAULT_MAX_PAGES} of {} pages",
                prepared.total_pages
            );
            match attempt(provider, &prepared, &filename).await {
                Ok(raw) => Ok(finish(provider, raw, true)),
                Err(retry) => Err(FluffCutterError::TruncatedRetryFailed {
                    max_pages: DEFAULT_MAX_PAGES,
                    original: original.to_string(),
                    retry: retry.to_string(),
                }),
            }
        }
        Err(other) => Err(other),
    }
}

async fn attempt(
    provider: &dyn PaperProvider,
    prepared: &PreparedPdf,
    filename: &str,
) -> Result<String, FluffCutterError> {
    let encoded = pdf::encode_base64(&prepared.bytes);
    info!(
        provider = provider.provider_name(),
        model = provider.model(),
        truncated = prepared.truncated,
        "submitting paper for analysis"
    );
    provider
        .analyze_paper(&encoded, filename, ANALYSIS_PROMPT)
        .await
}

fn finish(provider: &dyn PaperProvider, raw: String, truncated: bool) -> Analysis {
    let (title, body) = extract_title(&raw);
    Analysis {
        title,
        body,
        model_info: provider.model_info(),
        truncated,
    }
}
