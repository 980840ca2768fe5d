//! Extraction instruction for EMA therapeutic indications.
//!
//! The instruction is sent unchanged next to the user's label text on every
//! call. All extraction rules (treatment line, modality, population banding,
//! confidence scoring) live in this text and are carried out by the model.

use std::fs;
use std::path::Path;

/// Built-in instruction: role, extraction rules, scoring guidelines and a
/// one-shot OPDIVO example with the expected JSON array.
pub const EMA_INDICATIONS_PROMPT: &str = include_str!("../prompts/ema_indications.md");

/// Fields every record in the requested output should carry.
pub const REQUESTED_FIELDS: &[&str] = &[
    "Primary Disease_category",
    "Disease_level_full_text",
    "Indication #",
    "Indication_text",
    "Treatment line",
    "Treatment modality",
    "Population",
    "Disease + sybtypes",
];

/// Two-part request payload: the source text first, then the instruction.
pub fn build_contents(text: &str, prompt: &str) -> [String; 2] {
    [text.to_string(), prompt.to_string()]
}

/// Read a replacement instruction from disk.
pub fn load_prompt_override(path: &Path) -> std::io::Result<String> {
    let prompt = fs::read_to_string(path)?;
    if prompt.trim().is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("prompt file {} is empty", path.display()),
        ));
    }
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_all_fields() {
        for field in REQUESTED_FIELDS {
            assert!(
                EMA_INDICATIONS_PROMPT.contains(field),
                "prompt is missing field {}",
                field
            );
        }
    }

    #[test]
    fn test_prompt_has_one_shot_example() {
        assert!(EMA_INDICATIONS_PROMPT.contains("# One-Shot Example"));
        assert!(EMA_INDICATIONS_PROMPT.contains("confidence_score"));
        assert!(EMA_INDICATIONS_PROMPT.contains("OPDIVO"));
    }

    #[test]
    fn test_prompt_bytes_preserved() {
        assert!(EMA_INDICATIONS_PROMPT.starts_with("\n# Role and Persona\n"));
        assert!(EMA_INDICATIONS_PROMPT.ends_with("]\n"));
        // the label excerpt keeps its mis-encoded "≥"
        assert!(EMA_INDICATIONS_PROMPT.contains("tumours have PD-L1 expression â‰¥ 1% (see s"));
        assert!(EMA_INDICATIONS_PROMPT.contains("(or \"≥ 1\")"));
    }

    #[test]
    fn test_build_contents_order() {
        let contents = build_contents("Melanoma OPDIVO as monotherapy...", "Extract it");
        assert_eq!(contents[0], "Melanoma OPDIVO as monotherapy...");
        assert_eq!(contents[1], "Extract it");
    }

    #[test]
    fn test_load_prompt_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.md");

        fs::write(&path, "Return a JSON array.").unwrap();
        assert_eq!(load_prompt_override(&path).unwrap(), "Return a JSON array.");

        fs::write(&path, "  \n").unwrap();
        assert!(load_prompt_override(&path).is_err());

        assert!(load_prompt_override(&dir.path().join("missing.md")).is_err());
    }
}
