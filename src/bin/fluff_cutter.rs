//! CLI binary for fluff-cutter.
//!
//! A thin shim over the library crate: `init` runs the interactive setup
//! wizard, `analyze` resolves configuration and input, runs the analysis,
//! and delivers the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fluff_cutter::{
    analyze, config, default_output_path, print_analysis, resolve_input, save_analysis,
    CliOverrides, ConfigFile, ConfigStore, Provider, DEFAULT_MAX_PAGES,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One-time setup (API keys, default provider, models)
  fluff-cutter init

  # Analyze a local paper (writes paper.md next to it)
  fluff-cutter analyze paper.pdf

  # Analyze straight from arxiv (abstract links work too)
  fluff-cutter analyze https://arxiv.org/abs/2411.19870

  # Pick a provider and model for this run only
  fluff-cutter analyze paper.pdf -p openai -m gpt-5.2

  # Print to stdout instead of writing a file
  fluff-cutter analyze paper.pdf --print

  # Cap the pages sent to the model up front
  fluff-cutter analyze thesis.pdf --max-pages 30

SUPPORTED PROVIDERS & DEFAULT MODELS:
  Provider     Default model              Auth env var
  ─────────    ─────────────────────────  ──────────────────
  openai       gpt-5.2                    OPENAI_API_KEY
  anthropic    claude-opus-4-5 (default)  ANTHROPIC_API_KEY
  openrouter   anthropic/claude-sonnet-4-5  OPENROUTER_API_KEY

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY                 OpenAI API key
  ANTHROPIC_API_KEY              Anthropic API key
  OPENROUTER_API_KEY             OpenRouter API key
  FLUFF_CUTTER_PROVIDER          Override the default provider
  FLUFF_CUTTER_OPENAI_MODEL      Override the OpenAI model
  FLUFF_CUTTER_ANTHROPIC_MODEL   Override the Anthropic model
  FLUFF_CUTTER_OPENROUTER_MODEL  Override the OpenRouter model

CONFIG FILE:
  ~/.config/fluff-cutter/config.json  (written by `fluff-cutter init`)
  Precedence: CLI flags > environment > config file > built-in defaults.
"#;

/// Extract the core value from academic papers.
#[derive(Parser, Debug)]
#[command(
    name = "fluff-cutter",
    version,
    about = "Extract the core value from academic papers",
    long_about = "Send an academic paper (local PDF or URL) to a multimodal LLM and get back \
a short, critical analysis: why should I care, what's the actual innovation, and is the \
evidence convincing. Supports OpenAI, Anthropic, and OpenRouter.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "FLUFF_CUTTER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the analysis itself.
    #[arg(short, long, global = true, env = "FLUFF_CUTTER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure API keys and default settings interactively.
    Init,

    /// Analyze an academic paper and extract its core value.
    Analyze {
        /// Local PDF file path or HTTP/HTTPS URL (arxiv links welcome).
        paper: String,

        /// LLM provider for this run: openai, anthropic, openrouter.
        #[arg(short, long, env = "FLUFF_CUTTER_PROVIDER")]
        provider: Option<String>,

        /// Specific model to use (overrides the provider default).
        #[arg(short, long)]
        model: Option<String>,

        /// Output file path (default: input name with .md extension).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print to stdout. Skips the output file unless -o is also given.
        #[arg(long)]
        print: bool,

        /// Maximum pages to send. Without this flag the full document goes
        /// first and a token-limit rejection triggers one retry at 50 pages.
        #[arg(long)]
        max_pages: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let store = ConfigStore::default_location();
    if store.migrate_deprecated()? && !cli.quiet {
        eprintln!(
            "{} moved config to {}",
            dim("note:"),
            store.path().display()
        );
    }

    match cli.command {
        Command::Init => run_init(&store),
        Command::Analyze {
            paper,
            provider,
            model,
            output,
            print,
            max_pages,
        } => {
            run_analyze(
                &store,
                &paper,
                provider,
                model,
                output,
                print,
                max_pages,
                cli.quiet,
            )
            .await
        }
    }
}

// ── analyze ──────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn run_analyze(
    store: &ConfigStore,
    paper: &str,
    provider: Option<String>,
    model: Option<String>,
    output: Option<PathBuf>,
    print: bool,
    max_pages: Option<u32>,
    quiet: bool,
) -> Result<()> {
    let file = store.load()?;
    if !config::is_configured(&file) {
        return Err(fluff_cutter::FluffCutterError::NotConfigured.into());
    }

    let overrides = CliOverrides {
        provider: provider.as_deref().map(|s| s.parse::<Provider>()).transpose()?,
        model,
        max_pages,
    };
    let cfg = config::resolve(&overrides, &file)?;

    if !quiet {
        eprintln!("Analyzing paper: {}", bold(paper));
        eprintln!("Using: {}", cfg.model_info());
    }

    let pdf_path = resolve_input(paper, Path::new("."))
        .await
        .context("Failed to resolve input")?;

    let spinner = (!quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Analyzing paper (this may take a minute)…");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = analyze(&cfg, &pdf_path).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let analysis = result?;

    if !quiet && analysis.truncated {
        let limit = max_pages.unwrap_or(DEFAULT_MAX_PAGES);
        eprintln!("{} analyzed the first {limit} pages only", dim("note:"));
    }

    if print {
        print_analysis(&analysis);
    }
    if !print || output.is_some() {
        let out = output.unwrap_or_else(|| default_output_path(&pdf_path));
        save_analysis(&analysis, &out)?;
        if !quiet {
            eprintln!(
                "{} Analysis saved to {}",
                green("✔"),
                bold(&out.display().to_string())
            );
        }
    }
    Ok(())
}

// ── init ─────────────────────────────────────────────────────────────────

/// Mask an API key for display, showing only the first and last 4 chars.
fn mask_key(key: &str) -> String {
    if key.len() <= 12 {
        "*".repeat(key.len())
    } else {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    }
}

/// Prompt on stderr, read one trimmed line, fall back to `default`.
fn prompt_with_default(prompt: &str, default: &str, mask: bool) -> Result<String> {
    if default.is_empty() {
        eprint!("{prompt}: ");
    } else if mask {
        eprint!("{prompt} [{}]: ", mask_key(default));
    } else {
        eprint!("{prompt} [{default}]: ");
    }
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    let value = line.trim();
    Ok(if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    })
}

fn run_init(store: &ConfigStore) -> Result<()> {
    println!("Paper Fluff Cutter Configuration");
    println!("{}", "=".repeat(40));
    println!();

    let existing = store.load()?;
    let configured: Vec<Provider> = Provider::ALL
        .into_iter()
        .filter(|p| existing.api_key(*p).is_some())
        .collect();
    if !configured.is_empty() {
        println!("Current configuration:");
        for p in &configured {
            println!(
                "  {} API Key: {}",
                p.display_name(),
                mask_key(existing.api_key(*p).unwrap_or(""))
            );
        }
        println!();
    }

    println!("Enter your API keys (press Enter to keep existing or skip):");
    println!();

    let mut new = ConfigFile::default();
    for p in Provider::ALL {
        let current = existing.api_key(p).unwrap_or("");
        let key = prompt_with_default(&format!("{} API Key", p.display_name()), current, true)?;
        if key.is_empty() {
            continue;
        }
        if key == current {
            println!("  {} API key kept", p.display_name());
        } else {
            println!("  {} API key updated", p.display_name());
        }
        new.set_api_key(p, key);
    }

    let available: Vec<Provider> = Provider::ALL
        .into_iter()
        .filter(|p| new.api_key(*p).is_some())
        .collect();
    if available.is_empty() {
        println!();
        println!("No API keys provided. Configuration not saved.");
        println!("You can set keys via environment variables instead:");
        println!("  export OPENAI_API_KEY=sk-...");
        println!("  export ANTHROPIC_API_KEY=sk-ant-...");
        println!("  export OPENROUTER_API_KEY=sk-or-...");
        return Ok(());
    }

    // Default provider: only ask when there is a real choice.
    println!();
    let default_provider = if available.len() == 1 {
        available[0]
    } else {
        let names: Vec<&str> = available.iter().map(|p| p.key()).collect();
        let suggested = existing
            .default_provider
            .as_deref()
            .and_then(|n| n.parse::<Provider>().ok())
            .filter(|p| available.contains(p))
            .unwrap_or(if available.contains(&Provider::Anthropic) {
                Provider::Anthropic
            } else {
                available[0]
            });

        println!("Available providers: {}", names.join(", "));
        loop {
            let answer = prompt_with_default("Default provider", suggested.key(), false)?;
            match answer.parse::<Provider>() {
                Ok(p) if available.contains(&p) => break p,
                _ => println!("Please choose from: {}", names.join(", ")),
            }
        }
    };
    new.default_provider = Some(default_provider.key().to_string());

    println!();
    println!("Configure default models (press Enter for provider defaults):");
    println!();
    for p in available {
        let current = existing.model(p).unwrap_or_else(|| p.default_model());
        let model = prompt_with_default(&format!("{} model", p.display_name()), current, false)?;
        if model == p.default_model() {
            println!("  Using default: {}", p.default_model());
        } else {
            println!("  {} model set to: {model}", p.display_name());
            new.set_model(p, model);
        }
    }

    store.save(&new)?;
    println!();
    println!("Configuration saved to: {}", store.path().display());
    println!("Default provider: {default_provider}");
    println!();
    println!("You're ready to analyze papers!");
    println!("  fluff-cutter analyze <paper.pdf>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_keys_are_fully_masked() {
        assert_eq!(mask_key("sk-short"), "********");
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn long_keys_show_only_the_edges() {
        assert_eq!(mask_key("sk-ant-api03-abcdef1234"), "sk-a...1234");
    }

    #[test]
    fn cli_parses_the_analyze_subcommand() {
        let cli = Cli::try_parse_from([
            "fluff-cutter",
            "analyze",
            "paper.pdf",
            "-p",
            "openai",
            "-m",
            "gpt-5.2",
            "--max-pages",
            "30",
            "--print",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                paper,
                provider,
                model,
                print,
                max_pages,
                ..
            } => {
                assert_eq!(paper, "paper.pdf");
                assert_eq!(provider.as_deref(), Some("openai"));
                assert_eq!(model.as_deref(), Some("gpt-5.2"));
                assert!(print);
                assert_eq!(max_pages, Some(30));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["fluff-cutter"]).is_err());
    }
}
