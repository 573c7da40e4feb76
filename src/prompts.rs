//! The analysis prompt and the parsing of its TITLE contract.
//!
//! ## Why
//!
//! Keeping the prompt in one place (rather than inline in each backend)
//! guarantees every provider asks exactly the same three questions, and the
//! `TITLE:` extraction stays next to the instruction that produces it.

/// The single prompt sent to every provider along with the PDF.
///
/// The leading `TITLE:` line is a contract: [`extract_title`] relies on it
/// to name the output document.
pub const ANALYSIS_PROMPT: &str = "\
You are analyzing an academic paper. Your job is to cut through all the fluff and extract only what matters.

Answer these three questions concisely and critically:

1. WHY SHOULD I CARE?
   - What problem does this address?
   - Why does it matter to the world (not just academia)?

2. WHAT'S THE ACTUAL INNOVATION?
   - What is the core idea or proposal?
   - What makes it different from existing work?
   - Describe it in plain terms, no jargon.

3. IS THE EVIDENCE CONVINCING?
   - What experiments or evidence do they provide?
   - Are there obvious gaps or weaknesses?
   - Does the evidence actually support their claims?

Be brutally honest. If the paper is weak, say so.
If it's mostly fluff with a tiny kernel of insight, identify that kernel.

Also extract the paper's title at the beginning of your response in this format:
TITLE: [Paper Title]

Then provide your analysis.";

/// Title used when the model ignores the `TITLE:` instruction.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Split a raw model response into `(title, analysis_body)`.
///
/// Scans for the first line starting with `TITLE:` (case-insensitive),
/// takes everything after the colon as the title, and drops that line from
/// the body. When no such line exists the whole response is the body and
/// the title falls back to [`UNKNOWN_TITLE`].
pub fn extract_title(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    let lines: Vec<&str> = trimmed.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let candidate = line.trim();
        let Some(prefix) = candidate.get(..6) else {
            continue;
        };
        if prefix.eq_ignore_ascii_case("TITLE:") {
            let title = candidate[6..].trim();
            let title = if title.is_empty() {
                UNKNOWN_TITLE.to_string()
            } else {
                title.to_string()
            };
            let body = lines[i + 1..].join("\n").trim().to_string();
            return (title, body);
        }
    }

    (UNKNOWN_TITLE.to_string(), trimmed.to_string())
}
