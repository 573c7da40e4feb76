//! Error types for the fluff-cutter library.
//!
//! Every variant is fatal except [`FluffCutterError::TokenLimit`], which the
//! analyzer recovers from exactly once by cutting the PDF down to its first
//! 50 pages and resubmitting. The taxonomy mirrors the stages of a run:
//!
//! * configuration (before any I/O),
//! * input resolution (local path or download),
//! * the provider call itself,
//! * writing the result.
//!
//! Messages include the corrective action where one exists — a user seeing
//! `MissingApiKey` should not have to look up what to do next.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the fluff-cutter library.
#[derive(Debug, Error)]
pub enum FluffCutterError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key is configured for the selected provider.
    #[error(
        "No API key configured for {provider}.\n\
         Run `fluff-cutter init` or set {env_var}."
    )]
    MissingApiKey { provider: String, env_var: String },

    /// No provider has a key at all — the tool has never been set up.
    #[error(
        "No API keys configured.\n\
         Run `fluff-cutter init` to set up your API keys, or set one of:\n\
         \x20 export OPENAI_API_KEY=sk-...\n\
         \x20 export ANTHROPIC_API_KEY=sk-ant-...\n\
         \x20 export OPENROUTER_API_KEY=sk-or-..."
    )]
    NotConfigured,

    /// The config file exists but cannot be parsed.
    #[error("Malformed config file '{path}': {detail}\nFix it by hand or re-run `fluff-cutter init`.")]
    MalformedConfig { path: PathBuf, detail: String },

    /// An unrecognised provider name was supplied.
    #[error("Unknown provider '{name}'. Expected one of: openai, anthropic, openrouter")]
    UnknownProvider { name: String },

    /// Could not write the config file during `init` or migration.
    #[error("Failed to write config file '{path}': {source}")]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a PDF: '{path}'")]
    NotAPdf { path: PathBuf },

    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// The URL responded, but with something other than a PDF.
    #[error(
        "URL did not return a PDF (content-type: {content_type}): '{url}'\n\
         Provide a direct link to a PDF file."
    )]
    NotPdfContent { url: String, content_type: String },

    /// The PDF could not be parsed at the page level.
    #[error("Could not read PDF pages from '{path}': {detail}")]
    PdfParse { path: PathBuf, detail: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The provider rejected the request because the document exceeds its
    /// context window. Recoverable exactly once via truncation.
    #[error("{provider}: document exceeds the model's token limit: {detail}")]
    TokenLimit { provider: String, detail: String },

    /// Authentication failure (401/403) — a retry cannot help.
    #[error(
        "{provider}: authentication failed: {detail}\n\
         Check the API key (run `fluff-cutter init` to update it)."
    )]
    Auth { provider: String, detail: String },

    /// The provider API returned a non-retryable error.
    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Network-level failure talking to the provider.
    #[error("{provider}: request failed: {reason}")]
    Network { provider: String, reason: String },

    /// The provider responded 2xx but the envelope did not parse.
    #[error("{provider}: unexpected response shape: {detail}")]
    MalformedResponse { provider: String, detail: String },

    /// Both the full-document attempt and the truncated retry failed.
    #[error(
        "Analysis failed even after truncating to {max_pages} pages.\n\
         Original attempt: {original}\n\
         Truncated attempt: {retry}"
    )]
    TruncatedRetryFailed {
        max_pages: u32,
        original: String,
        retry: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write the analysis to the destination path.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FluffCutterError {
    /// Whether the truncate-and-retry controller may recover from this error.
    pub fn is_token_limit(&self) -> bool {
        matches!(self, FluffCutterError::TokenLimit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_display_suggests_init() {
        let e = FluffCutterError::MissingApiKey {
            provider: "anthropic".into(),
            env_var: "ANTHROPIC_API_KEY".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("fluff-cutter init"), "got: {msg}");
        assert!(msg.contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn token_limit_is_recoverable() {
        let e = FluffCutterError::TokenLimit {
            provider: "openai".into(),
            detail: "context_length_exceeded".into(),
        };
        assert!(e.is_token_limit());
    }

    #[test]
    fn api_error_is_not_recoverable() {
        let e = FluffCutterError::Api {
            provider: "openrouter".into(),
            status: 500,
            message: "internal".into(),
        };
        assert!(!e.is_token_limit());
        assert!(e.to_string().contains("HTTP 500"));
    }

    #[test]
    fn truncated_retry_display_carries_both_contexts() {
        let e = FluffCutterError::TruncatedRetryFailed {
            max_pages: 50,
            original: "too long".into(),
            retry: "still too long".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("too long"));
        assert!(msg.contains("still too long"));
        assert!(msg.contains("50 pages"));
    }
}
