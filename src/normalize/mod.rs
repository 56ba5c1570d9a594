//! Product label normalization.
//!
//! Maps a raw product label to its canonical name via an ordered rule list.
//! Rules 1-3 short-circuit with a fixed canonical name; rules 4-5 rewrite
//! the label in place and may each fire independently.
//!
//! `normalize` is pure, total and idempotent: feeding its output back in
//! yields the same string.

use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Canonical Vocabulary
// =============================================================================

/// Canonical name for the olive-flavored product.
pub const OLIVE_CHIABATA: &str = "olive-chiabata";

/// Canonical name for the jalapeno-flavored product.
pub const JALAPENO_CHIABATA: &str = "jalapeno-chiabata";

/// Canonical token for the five-flavor sampler bundle.
pub const FIVE_FLAVOR_SET: &str = "5-flavor-set";

/// Flavor category tokens recognized by the spacing-collapse rule.
///
/// `halapeno` is an accepted misspelling; it is collapsed here and respelled
/// by the final rule.
pub const FLAVOR_CATEGORIES: [&str; 6] =
    ["olive", "cheese", "jalapeno", "halapeno", "napoli", "plain"];

/// Accepted spellings of the five-flavor sampler bundle label.
const FIVE_FLAVOR_SPELLINGS: [&str; 4] =
    ["5-flavor set", "5-flavor-set", "5 flavor set", "5 flavor-set"];

// =============================================================================
// Rule Patterns
// =============================================================================

/// Rule 1: "vegan olive [chiabata] <N>-pack ..." listings.
static VEGAN_OLIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)vegan\s+olive(\s+chiabata)?\s+\d+-pack").unwrap());

/// Rule 2: brand prefix of the jalapeno listing.
static BRAND_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)woody[\s-]*bakeshop").unwrap());

/// Rule 4: "<category> chiabata" with interior whitespace, per category.
static SPACED_CATEGORIES: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    FLAVOR_CATEGORIES
        .iter()
        .map(|cat| {
            let pattern = Regex::new(&format!(r"{cat}\s+chiabata")).unwrap();
            (pattern, format!("{cat}-chiabata"))
        })
        .collect()
});

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a raw product label to its canonical name.
///
/// Rule order is load-bearing; the first short-circuit rule that matches
/// wins, and the rewrite rules apply only when none did.
///
/// # Example
/// ```
/// use ordertally::normalize::normalize;
///
/// assert_eq!(normalize("vegan olive chiabata 5-pack good-value"), "olive-chiabata");
/// assert_eq!(normalize("olive chiabata"), "olive-chiabata");
/// assert_eq!(normalize("spicy halapeno-chiabata"), "spicy jalapeno-chiabata");
/// ```
pub fn normalize(label: &str) -> String {
    // Rule 1: vegan olive listings collapse to the plain olive product.
    if VEGAN_OLIVE.is_match(label) {
        return OLIVE_CHIABATA.to_string();
    }

    // Rule 2: brand-prefixed jalapeno listings, substrings in any order.
    let lowered = label.to_lowercase();
    if BRAND_PREFIX.is_match(label) && lowered.contains("jalapeno") && lowered.contains("chiabata")
    {
        return JALAPENO_CHIABATA.to_string();
    }

    // Rule 3: the four accepted sampler-bundle spellings.
    let trimmed = label.trim();
    if FIVE_FLAVOR_SPELLINGS.iter().any(|s| trimmed == *s) {
        return FIVE_FLAVOR_SET.to_string();
    }

    // Rule 4: collapse "<category> chiabata" spacing, each category
    // independently.
    let mut name = label.to_string();
    for (pattern, replacement) in SPACED_CATEGORIES.iter() {
        if pattern.is_match(&name) {
            name = pattern.replace_all(&name, replacement.as_str()).into_owned();
        }
    }

    // Rule 5: respell the accepted misspelling.
    if name.contains("halapeno") {
        name = name.replace("halapeno", "jalapeno");
    }

    name
}

// =============================================================================
// Tests
// =============================================================================
