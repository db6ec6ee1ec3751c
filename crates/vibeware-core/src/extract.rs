//! Code extraction from model output.
//!
//! Models are told to answer with bare source, but frequently wrap it anyway:
//! ````text
//! ```typescript
//! export default class SwatGame extends BaseMicrogame { ... }
//! ```
//! ````
//! Only the interior of the first fenced block is kept. Output without any
//! fence is used verbatim after trimming.

const FENCE: &str = "```";

/// Extracts source text from raw model output.
///
/// Returns the trimmed interior of the first fenced block, or the trimmed
/// input when there is no fence. An unterminated fence runs to the end of
/// the text.
pub fn extract_code(raw: &str) -> String {
    let trimmed = raw.trim();

    let Some(open_idx) = trimmed.find(FENCE) else {
        return trimmed.to_string();
    };

    let after_open = &trimmed[open_idx + FENCE.len()..];

    // Skip the info string (`typescript`, `json`, ...) on the fence line
    let body_start = match after_open.find('\n') {
        Some(newline) if is_info_string(&after_open[..newline]) => newline + 1,
        Some(_) => 0,
        None if is_info_string(after_open) => after_open.len(),
        None => 0,
    };
    let body = &after_open[body_start..];

    let interior = match body.find(FENCE) {
        Some(close_idx) => &body[..close_idx],
        None => body,
    };

    interior.trim().to_string()
}

/// Returns true if the text after an opening fence is a language tag rather
/// than code.
fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '.' | '#'))
}
