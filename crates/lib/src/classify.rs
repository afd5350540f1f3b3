//! Message classification: which brand a message is about and which tokens look like promo codes.
//!
//! Both steps are pure functions of the input text and the (immutable) rule set, so classifying
//! the same message twice always gives the same result.

use crate::brands::{BrandId, BrandRule};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Uppercase/digit run of 4+, optionally continued by `-`/`_`-joined segments ending in an
/// uppercase letter or digit. ASCII word boundaries.
const CODE_PATTERN: &str = r"(?-u:\b)[A-Z0-9]{4,}(?:[A-Z0-9_-]*[A-Z0-9])?(?-u:\b)";

/// Common words that match the pattern but are never codes.
pub const STOPLIST: [&str; 7] = ["HTTP", "HTTPS", "HTML", "CODE", "BONUS", "PROMO", "FREE"];

static CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CODE_PATTERN).expect("code pattern is a valid regex"));

/// Brand (if any) and candidate codes for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub brand: Option<BrandId>,
    pub codes: Vec<String>,
}

/// First rule (in declaration order) with a keyword contained in `text`, case-insensitively.
pub fn detect_brand(text: &str, rules: &[BrandRule]) -> Option<BrandId> {
    if text.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find(|r| r.matches_lowered(&lowered))
        .map(|r| r.brand)
}

/// All code-looking tokens, left to right, duplicates kept, stoplist removed.
pub fn extract_codes(text: &str) -> Vec<String> {
    CODE_REGEX
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|code| !STOPLIST.contains(code))
        .map(str::to_string)
        .collect()
}

/// Run detection and extraction. Extraction does not depend on a brand match.
pub fn classify(text: &str, rules: &[BrandRule]) -> ClassificationResult {
    ClassificationResult {
        brand: detect_brand(text, rules),
        codes: extract_codes(text),
    }
}
