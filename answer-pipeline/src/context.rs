use crate::ScoredEntry;

pub const CONTEXT_HEADER: &str = "**knowledge bases**";

/// Formats the ranked entries into the grounding block inserted into the
/// prompt: a fixed header, then one bullet per entry, separated by blank
/// lines. Pure; an empty ranking yields a header-only block and generation
/// proceeds without grounding.
pub fn build_context(ranked: &[ScoredEntry]) -> String {
    let bullets = ranked
        .iter()
        .map(|scored| format!("- {}", scored.entry.content))
        .collect::<Vec<String>>()
        .join("\n\n");

    format!("{CONTEXT_HEADER}\n\n{bullets}")
}
