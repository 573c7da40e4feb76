//! # fluff-cutter
//!
//! Cut through academic-paper fluff: send a PDF to a multimodal LLM and get
//! back a short, critical three-question analysis.
//!
//! ## Why this crate?
//!
//! Most papers bury one idea under twenty pages of framing. Instead of
//! extracting text locally (and losing figures, tables, and layout), this
//! crate sends the PDF itself to a model that reads documents natively and
//! asks exactly three questions: why should I care, what is the actual
//! innovation, and is the evidence convincing.
//!
//! ## Pipeline Overview
//!
//! ```text
//! paper (path or URL)
//!  │
//!  ├─ 1. Config    CLI flags > env vars > config file > defaults
//!  ├─ 2. Input     resolve local file or download (cached by filename)
//!  ├─ 3. Provider  OpenAI / Anthropic / OpenRouter, PDF embedded natively
//!  ├─ 4. Recover   token-limit rejection → cut to 50 pages, retry once
//!  └─ 5. Output    markdown with title heading and model/date footer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fluff_cutter::{analyze, config, resolve_input};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = config::ConfigStore::default_location();
//!     let cfg = config::resolve(&config::CliOverrides::default(), &store.load()?)?;
//!     let pdf = resolve_input("https://arxiv.org/abs/2411.19870", Path::new(".")).await?;
//!     let analysis = analyze(&cfg, &pdf).await?;
//!     println!("{}", fluff_cutter::format_analysis(&analysis));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fluff-cutter` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! fluff-cutter = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod download;
pub mod error;
pub mod output;
pub mod pdf;
pub mod prompts;
pub mod providers;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_with_provider, resolve_input, Analysis};
pub use config::{CliOverrides, ConfigFile, ConfigStore, EffectiveConfig, Provider};
pub use error::FluffCutterError;
pub use output::{default_output_path, format_analysis, print_analysis, save_analysis};
pub use pdf::DEFAULT_MAX_PAGES;
pub use providers::{build_provider, PaperProvider};
