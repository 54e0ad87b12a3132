use anyhow::{Result, anyhow};
use isolang::Language;
use regex::Regex;
use std::sync::LazyLock;

/// Language utilities for target language handling
///
/// The translation API accepts a fixed set of upper-case target codes. Each
/// code has a display name used in progress messages and output column names.
pub const TARGET_LANGUAGES: &[(&str, &str)] = &[
    ("EN", "English"),
    ("JA", "Japanese"),
    ("DE", "German"),
    ("ES", "Spanish"),
    ("FR", "French"),
    ("IT", "Italian"),
    ("PT", "Portuguese"),
    ("NL", "Dutch"),
    ("RU", "Russian"),
    ("PL", "Polish"),
    ("UK", "Ukrainian"),
    ("RO", "Romanian"),
    ("CS", "Czech"),
    ("HU", "Hungarian"),
    ("EL", "Greek"),
    ("SV", "Swedish"),
    ("DA", "Danish"),
    ("FI", "Finnish"),
    ("TR", "Turkish"),
    ("KO", "Korean"),
    ("ID", "Indonesian"),
    ("HI", "Hindi"),
];

/// Parenthesized part of a column name (`French(FR)` -> `FR`)
static BRACKET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((.*?)\)").unwrap()
});

/// Marker written into output cells whose translation failed
pub const ERROR_MARKER: &str = "[ERROR]";

/// All target codes in table order
pub fn all_target_codes() -> Vec<String> {
    TARGET_LANGUAGES.iter().map(|(code, _)| code.to_string()).collect()
}

/// Check whether a code belongs to the target table (case-insensitive)
pub fn is_supported_target(code: &str) -> bool {
    lookup(code).is_some()
}

/// Get the display name of a target language code
pub fn get_language_name(code: &str) -> Result<&'static str> {
    lookup(code)
        .map(|(_, name)| *name)
        .ok_or_else(|| anyhow!("Unsupported target language code: {}", code))
}

/// Output column header for a target language, e.g. `French(FR)`
pub fn column_name(code: &str) -> String {
    let code = code.trim().to_uppercase();
    match lookup(&code) {
        Some((_, name)) => format!("{}({})", name, code),
        None => format!("{}({})", code, code),
    }
}

/// Extract the text between the first pair of parentheses of a column name
///
/// Returns an empty string when the name carries no parenthesized part.
pub fn extract_bracket_text(column: &str) -> &str {
    BRACKET_REGEX
        .captures(column)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

/// Validate a source language code as ISO 639-1 (2-letter) or ISO 639-3 (3-letter)
pub fn validate_source_code(code: &str) -> Result<()> {
    let normalized = code.trim().to_lowercase();
    let known = match normalized.len() {
        2 => Language::from_639_1(&normalized).is_some(),
        3 => Language::from_639_3(&normalized).is_some(),
        _ => false,
    };

    if known {
        Ok(())
    } else {
        Err(anyhow!("Invalid source language code: {}", code))
    }
}

fn lookup(code: &str) -> Option<&'static (&'static str, &'static str)> {
    let code = code.trim();
    TARGET_LANGUAGES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
}
