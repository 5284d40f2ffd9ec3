use once_cell::sync::Lazy;
use regex::Regex;

/// Cell spellings that read as a missing value, on top of the empty cell.
pub static NA_VALUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:|NA|N/A|n/a|NaN|-NaN|nan|-nan|null|NULL|None|<NA>|#N/A|#N/A N/A|#NA|1\.#IND|-1\.#IND|1\.#QNAN|-1\.#QNAN)$",
    )
    .expect("NA regex should compile")
});

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// True if the cell is one of the missing-value spellings once cleaned.
pub fn is_na(raw: &str) -> bool {
    NA_VALUES.is_match(clean_str(raw))
}

/// Parse a numeric cell. Missing, non-numeric and non-finite cells
/// (`NaN`, `inf`, overflow such as `1e400`) give `None`.
pub fn parse_value(raw: &str) -> Option<f64> {
    if is_na(raw) {
        return None;
    }
    clean_str(raw)
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
