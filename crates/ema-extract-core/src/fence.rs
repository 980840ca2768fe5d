//! Code-fence unwrapping for model completions.
//!
//! Generation APIs frequently wrap JSON output in a Markdown fenced block
//! (` ```json ... ``` `). The helpers here peel those markers off so the
//! remainder can be handed to `serde_json`.

use serde_json::Value;

/// Opening marker with a JSON language tag.
pub const JSON_FENCE: &str = "```json";

/// Bare triple-backtick marker.
pub const FENCE: &str = "```";

/// Strip leading/trailing fence markers and surrounding whitespace.
///
/// Text without markers comes back trimmed but otherwise unchanged. Stripping
/// repeats until neither end carries a marker, so the function is idempotent.
pub fn unwrap_code_fence(text: &str) -> &str {
    let mut cleaned = text.trim();

    loop {
        if let Some(rest) = cleaned.strip_prefix(JSON_FENCE) {
            cleaned = rest.trim();
        } else if let Some(rest) = cleaned.strip_prefix(FENCE) {
            cleaned = rest.trim();
        } else if let Some(rest) = cleaned.strip_suffix(FENCE) {
            cleaned = rest.trim();
        } else {
            return cleaned;
        }
    }
}

/// Unwrap a completion and parse what remains as JSON.
pub fn parse_completion(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(unwrap_code_fence(text))
}

/// Whether the completion carried any fence marker at either end.
pub fn is_fenced(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with(FENCE) || trimmed.ends_with(FENCE)
}
