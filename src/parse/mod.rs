//! Option-string parsing.
//!
//! Decomposes one raw option string (label + quantity descriptor, separated
//! by the first comma) into zero or more [`ItemCount`] pairs, scaled by the
//! row's purchase multiplier.
//!
//! The cascade is an explicit ordered list of matcher units
//! ([`Branch`]), each a try-match returning either items or "no match",
//! evaluated first-match-wins. Exactly one branch fires per call; the final
//! fallback always matches, so an empty result only ever means the option
//! carried no comma and was ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::{BundlePolicy, ItemCount, ParseMode};
use crate::normalize::normalize;

// =============================================================================
// Patterns
// =============================================================================

/// Canonical sub-products of the five-flavor sampler bundle.
pub const BUNDLE_FLAVORS: [&str; 5] = [
    "plain-chiabata",
    "olive-chiabata",
    "cheese-chiabata",
    "jalapeno-chiabata",
    "napoli-chiabata",
];

/// Five-flavor sampler marker, spacing/hyphen insensitive.
static FIVE_FLAVOR_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)5[\s-]?flavor[\s-]?set").unwrap());

/// 10-pack variety set marker, spacing/hyphen insensitive.
static VARIETY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)10[\s-]?pack[\s-]?variety[\s-]?set").unwrap());

/// Variety descriptor, shape 1: quantity precedes flavor.
static QTY_THEN_FLAVOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)-pack\s+([a-z]+)-?\s*chiabata").unwrap());

/// Variety descriptor, shape 2: "+"-joined flavor-then-quantity segments.
static FLAVOR_THEN_QTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z]+)-?\s*chiabata\s*(\d+)-pack").unwrap());

/// Sub-option descriptor: "<N>ea <word>[chiabata|cookie]"; the trailing word
/// is the actual product and N is a unit size, not an order count.
static SUB_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+ea\s+([a-z]+(?:[-\s]chiabata)?(?:[-\s]cookie)?)").unwrap());

/// Plain quantity: "<N>ea" not extended by a "-pack" suffix, which would be a
/// pack size rather than an order count.
static PLAIN_QUANTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)ea(?![\s-]*pack)").unwrap());

/// Hyphens acting as separators: standalone " - " tokens and a leading or
/// trailing dash. Hyphens interior to compound tokens are kept.
static SEPARATOR_HYPHENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s*|\s+-\s+|\s*-$").unwrap());

// =============================================================================
// Parser
// =============================================================================

/// Parses raw option strings into canonical (product, quantity) pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionParser {
    policy: BundlePolicy,
}

impl OptionParser {
    pub fn new(policy: BundlePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> BundlePolicy {
        self.policy
    }

    /// Parse one raw option string.
    ///
    /// An empty result means the option carried no parseable quantity
    /// information (no comma) and is ignored; it is never an error.
    ///
    /// # Example
    /// ```
    /// use ordertally::models::ParseMode;
    /// use ordertally::parse::OptionParser;
    ///
    /// let parser = OptionParser::default();
    /// let items = parser.parse("olive chiabata,120g 3ea", 2, ParseMode::Aggregate);
    /// assert_eq!(items.len(), 1);
    /// assert_eq!(items[0].name, "olive-chiabata");
    /// assert_eq!(items[0].quantity, 6);
    /// ```
    pub fn parse(&self, raw: &str, multiplier: u32, mode: ParseMode) -> Vec<ItemCount> {
        let Some((label, descriptor)) = raw.split_once(',') else {
            debug!(option = raw, "option without comma ignored");
            return Vec::new();
        };

        let label = label.trim();
        let descriptor = strip_separator_hyphens(descriptor.trim());

        let ctx = OptionContext {
            raw,
            label,
            normalized_label: normalize(label),
            descriptor: &descriptor,
            multiplier: u64::from(multiplier.max(1)),
            mode,
            policy: self.policy,
        };

        for branch in CASCADE {
            if let Some(items) = branch.try_match(&ctx) {
                debug!(?branch, option = raw, items = items.len(), "option matched");
                return items;
            }
        }

        // The fallback branch matches unconditionally.
        Vec::new()
    }
}

/// Everything a branch needs to decide whether it applies.
struct OptionContext<'a> {
    raw: &'a str,
    /// Label as written; bundle markers are checked before normalization.
    label: &'a str,
    /// Label after [`normalize`], used by the non-bundle branches.
    normalized_label: String,
    descriptor: &'a str,
    multiplier: u64,
    mode: ParseMode,
    policy: BundlePolicy,
}

// =============================================================================
// Cascade Branches
// =============================================================================

/// One matcher unit of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    /// Five-flavor sampler bundle: expands into the five fixed flavors.
    FiveFlavorSet,
    /// 10-pack variety set: per-flavor decomposition, or the raw string
    /// verbatim in per-recipient mode.
    VarietyPack,
    /// Descriptor names the actual product after a unit size.
    SubOption,
    /// Descriptor carries a plain "<N>ea" order count.
    PlainQuantity,
    /// One unit of the normalized label.
    Fallback,
}

/// Evaluation order; earlier branches win. Load-bearing.
const CASCADE: [Branch; 5] = [
    Branch::FiveFlavorSet,
    Branch::VarietyPack,
    Branch::SubOption,
    Branch::PlainQuantity,
    Branch::Fallback,
];

impl Branch {
    fn try_match(self, ctx: &OptionContext<'_>) -> Option<Vec<ItemCount>> {
        match self {
            Branch::FiveFlavorSet => try_five_flavor_set(ctx),
            Branch::VarietyPack => try_variety_pack(ctx),
            Branch::SubOption => try_sub_option(ctx),
            Branch::PlainQuantity => try_plain_quantity(ctx),
            Branch::Fallback => Some(vec![ItemCount::new(
                ctx.normalized_label.clone(),
                ctx.multiplier,
            )]),
        }
    }
}

fn try_five_flavor_set(ctx: &OptionContext<'_>) -> Option<Vec<ItemCount>> {
    if !FIVE_FLAVOR_MARKER.is_match(ctx.label) {
        return None;
    }

    let units = match ctx.policy {
        BundlePolicy::FixedPerSet => ctx.multiplier,
        BundlePolicy::DescriptorScaled => {
            ctx.multiplier * descriptor_quantity(ctx.descriptor).unwrap_or(1)
        }
    };

    Some(
        BUNDLE_FLAVORS
            .iter()
            .map(|flavor| ItemCount::new(*flavor, units))
            .collect(),
    )
}

fn try_variety_pack(ctx: &OptionContext<'_>) -> Option<Vec<ItemCount>> {
    if !VARIETY_MARKER.is_match(ctx.label) {
        return None;
    }

    // Per-recipient tallies keep the whole option opaque so the shipping
    // list shows the set exactly as ordered.
    if ctx.mode == ParseMode::PerRecipient {
        return Some(vec![ItemCount::new(ctx.raw, ctx.multiplier)]);
    }

    // Shape 1: "<qty>-pack <flavor>chiabata", quantity precedes flavor.
    let items: Vec<ItemCount> = QTY_THEN_FLAVOR
        .captures_iter(ctx.descriptor)
        .filter_map(|cap| {
            let qty: u64 = cap[1].parse().ok()?;
            Some(ItemCount::new(flavored_name(&cap[2]), qty * ctx.multiplier))
        })
        .collect();
    if !items.is_empty() {
        return Some(items);
    }

    // Shape 2: "+"-joined "<flavor>chiabata <qty>-pack" segments.
    if ctx.descriptor.contains('+') {
        let items: Vec<ItemCount> = FLAVOR_THEN_QTY
            .captures_iter(ctx.descriptor)
            .filter_map(|cap| {
                let qty: u64 = cap[2].parse().ok()?;
                Some(ItemCount::new(flavored_name(&cap[1]), qty * ctx.multiplier))
            })
            .collect();
        if !items.is_empty() {
            return Some(items);
        }
    }

    // Neither descriptor shape applies; later branches see the original
    // label and descriptor.
    None
}

fn try_sub_option(ctx: &OptionContext<'_>) -> Option<Vec<ItemCount>> {
    let cap = SUB_OPTION.captures(ctx.descriptor)?;
    // The unit size before the word is not an order count.
    Some(vec![ItemCount::new(normalize(&cap[1]), ctx.multiplier)])
}

fn try_plain_quantity(ctx: &OptionContext<'_>) -> Option<Vec<ItemCount>> {
    let qty = descriptor_quantity(ctx.descriptor)?;
    Some(vec![ItemCount::new(
        ctx.normalized_label.clone(),
        qty * ctx.multiplier,
    )])
}

// =============================================================================
// Helpers
// =============================================================================

/// First plain "<N>ea" order count in a descriptor.
fn descriptor_quantity(descriptor: &str) -> Option<u64> {
    let cap = PLAIN_QUANTITY.captures(descriptor)?;
    cap[1].parse().ok()
}

/// Canonical flavored name for a captured flavor token.
fn flavored_name(flavor: &str) -> String {
    format!("{}-chiabata", normalize(flavor))
}

fn strip_separator_hyphens(descriptor: &str) -> String {
    SEPARATOR_HYPHENS
        .replace_all(descriptor, " ")
        .trim()
        .to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(items: &[ItemCount]) -> u64 {
        items.iter().map(|i| i.quantity).sum()
    }

    #[test]
    fn test_no_comma_is_ignored() {
        let parser = OptionParser::default();
        let items = parser.parse("random-item-with-no-comma", 1, ParseMode::Aggregate);
        assert!(items.is_empty());
    }

    #[test]
    fn test_variety_pack_qty_then_flavor() {
        let parser = OptionParser::default();
        let items = parser.parse(
            "10-pack-variety-set,10-pack olive-chiabata 10ea",
            1,
            ParseMode::Aggregate,
        );
        assert_eq!(items, vec![ItemCount::new("olive-chiabata", 10)]);
    }

    #[test]
    fn test_variety_pack_per_recipient_stays_opaque() {
        let parser = OptionParser::default();
        let raw = "10-pack-variety-set,10-pack olive-chiabata 10ea";
        let items = parser.parse(raw, 1, ParseMode::PerRecipient);
        assert_eq!(items, vec![ItemCount::new(raw, 1)]);
    }

    #[test]
    fn test_variety_pack_joined_segments() {
        let parser = OptionParser::default();
        let items = parser.parse(
            "10-pack variety set,olive-chiabata 5-pack + cheese-chiabata 5-pack",
            1,
            ParseMode::Aggregate,
        );
        assert_eq!(
            items,
            vec![
                ItemCount::new("olive-chiabata", 5),
                ItemCount::new("cheese-chiabata", 5),
            ]
        );
    }

    #[test]
    fn test_variety_pack_falls_through_when_shapes_miss() {
        let parser = OptionParser::default();
        let items = parser.parse("10-pack-variety-set,gift note", 1, ParseMode::Aggregate);
        // Falls to the fallback branch with the original label.
        assert_eq!(items, vec![ItemCount::new("10-pack-variety-set", 1)]);
    }

    #[test]
    fn test_variety_pack_respells_flavor() {
        let parser = OptionParser::default();
        let items = parser.parse(
            "10 pack variety set,10-pack halapeno-chiabata",
            1,
            ParseMode::Aggregate,
        );
        assert_eq!(items, vec![ItemCount::new("jalapeno-chiabata", 10)]);
    }

    #[test]
    fn test_five_flavor_set_fixed_policy() {
        let parser = OptionParser::new(BundlePolicy::FixedPerSet);
        let items = parser.parse("5-flavor-set,120g 5ea", 2, ParseMode::Aggregate);
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| i.quantity == 2));
        assert_eq!(items[0].name, "plain-chiabata");
        assert_eq!(items[3].name, "jalapeno-chiabata");
    }

    #[test]
    fn test_five_flavor_set_scaled_policy() {
        let parser = OptionParser::new(BundlePolicy::DescriptorScaled);
        let items = parser.parse("5-flavor-set,120g 5ea", 1, ParseMode::Aggregate);
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| i.quantity == 5));

        // Without a descriptor quantity the scale defaults to 1.
        let items = parser.parse("5 flavor set,gift wrap", 3, ParseMode::Aggregate);
        assert!(items.iter().all(|i| i.quantity == 3));
    }

    #[test]
    fn test_five_flavor_set_beats_plain_quantity() {
        // The label matches the bundle marker AND the descriptor matches the
        // plain-quantity shape; the earlier branch must win.
        let parser = OptionParser::default();
        let items = parser.parse("5-flavor-set,3ea", 1, ParseMode::Aggregate);
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| i.quantity == 1));
    }

    #[test]
    fn test_label_normalized_before_descriptor() {
        let parser = OptionParser::default();
        let items = parser.parse(
            "vegan olive chiabata 5-pack good-value,1ea",
            1,
            ParseMode::Aggregate,
        );
        assert_eq!(items, vec![ItemCount::new("olive-chiabata", 1)]);
    }

    #[test]
    fn test_sub_option_names_the_product() {
        let parser = OptionParser::default();
        let items = parser.parse("gift box,120g 1ea choco-cookie", 2, ParseMode::Aggregate);
        // The unit size (1ea here) is not an order count.
        assert_eq!(items, vec![ItemCount::new("choco-cookie", 2)]);

        let items = parser.parse("gift box,120g 1ea olive chiabata", 1, ParseMode::Aggregate);
        assert_eq!(items, vec![ItemCount::new("olive-chiabata", 1)]);
    }

    #[test]
    fn test_plain_quantity() {
        let parser = OptionParser::default();
        let items = parser.parse("olive chiabata,120g 3ea", 1, ParseMode::Aggregate);
        assert_eq!(items, vec![ItemCount::new("olive-chiabata", 3)]);
    }

    #[test]
    fn test_fallback_single_unit() {
        let parser = OptionParser::default();
        let items = parser.parse("cheese chiabata,gift wrap", 4, ParseMode::Aggregate);
        assert_eq!(items, vec![ItemCount::new("cheese-chiabata", 4)]);
    }

    #[test]
    fn test_separator_hyphens_stripped() {
        let parser = OptionParser::default();
        let items = parser.parse("olive chiabata,- 3ea", 1, ParseMode::Aggregate);
        assert_eq!(items, vec![ItemCount::new("olive-chiabata", 3)]);

        let items = parser.parse("olive chiabata,120g - 3ea", 1, ParseMode::Aggregate);
        assert_eq!(items, vec![ItemCount::new("olive-chiabata", 3)]);
    }

    #[test]
    fn test_multiplier_linearity_non_bundle_branches() {
        let parser = OptionParser::default();
        let options = [
            "gift box,120g 1ea choco-cookie", // sub-option
            "olive chiabata,120g 3ea",        // plain quantity
            "cheese chiabata,gift wrap",      // fallback
        ];
        for raw in options {
            let once = totals(&parser.parse(raw, 3, ParseMode::Aggregate));
            let twice = totals(&parser.parse(raw, 6, ParseMode::Aggregate));
            assert_eq!(twice, once * 2, "not linear for {raw:?}");
        }
    }

    #[test]
    fn test_zero_multiplier_clamped_to_one() {
        let parser = OptionParser::default();
        let items = parser.parse("olive chiabata,3ea", 0, ParseMode::Aggregate);
        assert_eq!(items, vec![ItemCount::new("olive-chiabata", 3)]);
    }

    #[test]
    fn test_descriptor_commas_stay_in_descriptor() {
        // Only the first comma splits label from descriptor.
        let parser = OptionParser::default();
        let items = parser.parse("olive chiabata,120g, 2ea", 1, ParseMode::Aggregate);
        assert_eq!(items, vec![ItemCount::new("olive-chiabata", 2)]);
    }
}
