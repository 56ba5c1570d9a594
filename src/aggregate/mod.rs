//! Accumulation of parsed items into tallies.
//!
//! [`ProductCounts`] is the flat per-product tally; [`RecipientLedger`]
//! buckets one tally per recipient together with recipient metadata.
//!
//! Accumulation is commutative and associative: the final totals never
//! depend on row-processing order, and two tallies computed over disjoint
//! row partitions merge by pointwise summation.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{ItemCount, RecipientFields, RecipientKey};

// =============================================================================
// Flat Tally
// =============================================================================

/// Per-product quantity tally.
///
/// Entries are created zero-initialized on first use and never removed.
/// Iteration order is by product name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductCounts(BTreeMap<String, u64>);

impl ProductCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `name`.
    pub fn add(&mut self, name: impl Into<String>, quantity: u64) {
        *self.0.entry(name.into()).or_insert(0) += quantity;
    }

    /// Fold a stream of parsed items into the tally.
    pub fn accumulate<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = ItemCount>,
    {
        for item in items {
            self.add(item.name, item.quantity);
        }
    }

    /// Pointwise sum over the union of keys.
    ///
    /// This is the merge step for tallies computed over independent row
    /// partitions.
    pub fn merge(&mut self, other: ProductCounts) {
        for (name, quantity) in other.0 {
            self.add(name, quantity);
        }
    }

    /// Quantity for `name`, zero when absent.
    pub fn get(&self, name: &str) -> u64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in product-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    /// Total units across all products.
    pub fn total_units(&self) -> u64 {
        self.0.values().sum()
    }
}

impl FromIterator<ItemCount> for ProductCounts {
    fn from_iter<I: IntoIterator<Item = ItemCount>>(iter: I) -> Self {
        let mut counts = Self::new();
        counts.accumulate(iter);
        counts
    }
}

// =============================================================================
// Per-Recipient Ledger
// =============================================================================

/// One recipient's tally plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientEntry {
    /// Display name, first-seen wins.
    pub name: String,
    /// Phone number, first-seen wins.
    pub phone: String,
    /// Shipping address (also the bucketing identity).
    pub address: String,
    /// Earliest observed order timestamp.
    pub first_order: Option<NaiveDateTime>,
    /// This recipient's product tally.
    pub counts: ProductCounts,
}

impl RecipientEntry {
    fn new(fields: &RecipientFields) -> Self {
        Self {
            name: fields.name.clone(),
            phone: fields.phone.clone(),
            address: fields.address.clone(),
            first_order: fields.order_date,
            counts: ProductCounts::new(),
        }
    }

    fn observe(&mut self, fields: &RecipientFields) {
        // Keep the earliest timestamp; name and phone stay first-seen.
        self.first_order = earliest(self.first_order, fields.order_date);
    }
}

/// Per-recipient tallies, keyed by [`RecipientKey`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipientLedger(BTreeMap<RecipientKey, RecipientEntry>);

impl RecipientLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one row's parsed items under the recipient derived from its
    /// address.
    pub fn record<I>(&mut self, fields: &RecipientFields, items: I)
    where
        I: IntoIterator<Item = ItemCount>,
    {
        let key = RecipientKey::from_address(&fields.address);
        let entry = self
            .0
            .entry(key)
            .and_modify(|e| e.observe(fields))
            .or_insert_with(|| RecipientEntry::new(fields));
        entry.counts.accumulate(items);
    }

    /// Merge a ledger computed over an independent row partition.
    pub fn merge(&mut self, other: RecipientLedger) {
        for (key, incoming) in other.0 {
            match self.0.entry(key) {
                std::collections::btree_map::Entry::Vacant(slot) => {
                    slot.insert(incoming);
                }
                std::collections::btree_map::Entry::Occupied(mut slot) => {
                    let entry = slot.get_mut();
                    entry.first_order = earliest(entry.first_order, incoming.first_order);
                    entry.counts.merge(incoming.counts);
                }
            }
        }
    }

    pub fn get(&self, key: &RecipientKey) -> Option<&RecipientEntry> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecipientKey, &RecipientEntry)> {
        self.0.iter()
    }

    /// All tallies summed into one flat tally.
    pub fn grand_total(&self) -> ProductCounts {
        let mut total = ProductCounts::new();
        for entry in self.0.values() {
            total.merge(entry.counts.clone());
        }
        total
    }
}

fn earliest(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn items(pairs: &[(&str, u64)]) -> Vec<ItemCount> {
        pairs
            .iter()
            .map(|(name, qty)| ItemCount::new(*name, *qty))
            .collect()
    }

    fn fields(name: &str, address: &str, date: Option<NaiveDateTime>) -> RecipientFields {
        RecipientFields {
            name: name.into(),
            phone: "010-0000-0000".into(),
            address: address.into(),
            order_date: date,
        }
    }

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_accumulate_sums_per_name() {
        let mut counts = ProductCounts::new();
        counts.accumulate(items(&[("olive-chiabata", 10)]));
        counts.accumulate(items(&[("olive-chiabata", 5)]));
        assert_eq!(counts.get("olive-chiabata"), 15);
        assert_eq!(counts.get("missing"), 0);
    }

    #[test]
    fn test_accumulate_order_independent() {
        let rows = items(&[
            ("olive-chiabata", 10),
            ("cheese-chiabata", 2),
            ("olive-chiabata", 5),
            ("plain-chiabata", 1),
        ]);

        let forward: ProductCounts = rows.clone().into_iter().collect();
        let reversed: ProductCounts = rows.clone().into_iter().rev().collect();
        let mut rotated = rows.clone();
        rotated.rotate_left(2);
        let rotated: ProductCounts = rotated.into_iter().collect();

        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);
        assert_eq!(forward.get("olive-chiabata"), 15);
    }

    #[test]
    fn test_merge_equals_sequential_accumulation() {
        let rows = items(&[
            ("olive-chiabata", 3),
            ("cheese-chiabata", 7),
            ("olive-chiabata", 4),
            ("napoli-chiabata", 1),
        ]);

        let sequential: ProductCounts = rows.clone().into_iter().collect();

        // Two disjoint partitions, merged afterwards.
        let mut left: ProductCounts = rows[..2].to_vec().into_iter().collect();
        let right: ProductCounts = rows[2..].to_vec().into_iter().collect();
        left.merge(right);

        assert_eq!(left, sequential);
        assert_eq!(left.total_units(), 15);
    }

    #[test]
    fn test_iteration_sorted_by_name() {
        let counts: ProductCounts =
            items(&[("napoli-chiabata", 1), ("cheese-chiabata", 2)]).into_iter().collect();
        let names: Vec<&str> = counts.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["cheese-chiabata", "napoli-chiabata"]);
    }

    #[test]
    fn test_ledger_buckets_by_address() {
        let mut ledger = RecipientLedger::new();
        ledger.record(&fields("Kim", "1 Elm Road", None), items(&[("olive-chiabata", 2)]));
        ledger.record(&fields("Kim", "9 Oak Lane", None), items(&[("olive-chiabata", 1)]));

        assert_eq!(ledger.len(), 2);
        let key = RecipientKey::from_address("1 Elm Road");
        assert_eq!(ledger.get(&key).unwrap().counts.get("olive-chiabata"), 2);
    }

    #[test]
    fn test_ledger_keeps_earliest_order_and_first_seen_name() {
        let mut ledger = RecipientLedger::new();
        ledger.record(&fields("Kim", "1 Elm Road", Some(at(20))), items(&[("a", 1)]));
        ledger.record(&fields("Kim C.", "1 Elm Road", Some(at(5))), items(&[("a", 1)]));
        ledger.record(&fields("K.", "1 Elm Road", Some(at(12))), items(&[("a", 1)]));

        let entry = ledger.get(&RecipientKey::from_address("1 Elm Road")).unwrap();
        assert_eq!(entry.first_order, Some(at(5)));
        assert_eq!(entry.name, "Kim");
        assert_eq!(entry.counts.get("a"), 3);
    }

    #[test]
    fn test_ledger_missing_timestamp_does_not_mask_known_one() {
        let mut ledger = RecipientLedger::new();
        ledger.record(&fields("Kim", "1 Elm Road", None), items(&[("a", 1)]));
        ledger.record(&fields("Kim", "1 Elm Road", Some(at(7))), items(&[("a", 1)]));

        let entry = ledger.get(&RecipientKey::from_address("1 Elm Road")).unwrap();
        assert_eq!(entry.first_order, Some(at(7)));
    }

    #[test]
    fn test_ledger_merge_pointwise() {
        let mut left = RecipientLedger::new();
        left.record(&fields("Kim", "1 Elm Road", Some(at(9))), items(&[("a", 2)]));

        let mut right = RecipientLedger::new();
        right.record(&fields("Kim", "1 Elm Road", Some(at(3))), items(&[("a", 1), ("b", 4)]));
        right.record(&fields("Lee", "9 Oak Lane", None), items(&[("a", 1)]));

        left.merge(right);

        assert_eq!(left.len(), 2);
        let entry = left.get(&RecipientKey::from_address("1 Elm Road")).unwrap();
        assert_eq!(entry.counts.get("a"), 3);
        assert_eq!(entry.counts.get("b"), 4);
        assert_eq!(entry.first_order, Some(at(3)));

        assert_eq!(left.grand_total().get("a"), 4);
    }
}
