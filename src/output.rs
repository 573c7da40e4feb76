//! Render an [`Analysis`] as markdown and deliver it.

use crate::analyze::Analysis;
use crate::error::FluffCutterError;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Format the analysis as a markdown document.
///
/// Layout: a title heading, the analysis body, and a footer recording which
/// model produced it and when.
pub fn format_analysis(analysis: &Analysis) -> String {
    format_analysis_dated(analysis, &Local::now().format("%Y-%m-%d").to_string())
}

fn format_analysis_dated(analysis: &Analysis, date: &str) -> String {
    format!(
        "# Paper Analysis: {title}\n\n{body}\n\n---\n*Analyzed with {model} on {date}*\n",
        title = analysis.title,
        body = analysis.body,
        model = analysis.model_info,
    )
}

/// Print the formatted analysis to stdout.
pub fn print_analysis(analysis: &Analysis) {
    println!("{}", format_analysis(analysis));
}

/// Write the formatted analysis to `path`.
pub fn save_analysis(analysis: &Analysis, path: &Path) -> Result<(), FluffCutterError> {
    let content = format_analysis(analysis);
    std::fs::write(path, content).map_err(|e| FluffCutterError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("analysis saved to {}", path.display());
    Ok(())
}

/// Default output path for a given input PDF: same location, `.md` extension.
///
/// `papers/attention.pdf` → `papers/attention.md`
pub fn default_output_path(pdf_path: &Path) -> PathBuf {
    pdf_path.with_extension("md")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Analysis {
        Analysis {
            title: "Attention Is All You Need".into(),
            body: "1. WHY SHOULD I CARE?\nSequence models were slow.".into(),
            model_info: "Anthropic (claude-opus-4-5)".into(),
            truncated: false,
        }
    }

    #[test]
    fn markdown_layout_is_heading_body_footer() {
        let md = format_analysis_dated(&sample(), "2026-08-25");
        assert_eq!(
            md,
            "# Paper Analysis: Attention Is All You Need\n\n\
             1. WHY SHOULD I CARE?\nSequence models were slow.\n\n\
             ---\n*Analyzed with Anthropic (claude-opus-4-5) on 2026-08-25*\n"
        );
    }

    #[test]
    fn footer_carries_a_current_date() {
        let md = format_analysis(&sample());
        let expected = Local::now().format("%Y-%m-%d").to_string();
        assert!(md.contains(&expected));
    }

    #[test]
    fn save_writes_the_formatted_document() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("analysis.md");
        save_analysis(&sample(), &out).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.starts_with("# Paper Analysis: Attention Is All You Need"));
    }

    #[test]
    fn save_into_a_missing_directory_is_an_output_error() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("no/such/dir/analysis.md");
        let err = save_analysis(&sample(), &out).unwrap_err();
        assert!(matches!(err, FluffCutterError::OutputWriteFailed { .. }));
    }

    #[test]
    fn default_output_swaps_the_extension_in_place() {
        assert_eq!(
            default_output_path(Path::new("papers/attention.pdf")),
            PathBuf::from("papers/attention.md")
        );
        assert_eq!(
            default_output_path(Path::new("2411.19870.pdf")),
            PathBuf::from("2411.19870.md")
        );
    }
}
