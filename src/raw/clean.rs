use anyhow::{bail, Result};

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Cleaned cell, or `None` when nothing is left after cleaning.
pub fn clean_opt(raw: Option<&str>) -> Option<String> {
    raw.map(clean_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a boolean staging flag. Blank reads as `false`.
pub fn parse_flag(raw: Option<&str>) -> Result<bool> {
    let cleaned = raw.map(clean_str).unwrap_or_default();
    match cleaned.to_ascii_lowercase().as_str() {
        "" | "false" | "f" | "no" | "n" | "0" => Ok(false),
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        other => bail!("not a boolean: {:?}", other),
    }
}
