//! Domain models for the ordertally analysis pipeline.
//!
//! This module contains the core data structures used throughout the
//! pipeline:
//!
//! - [`ParseMode`] - aggregate vs. per-recipient analysis
//! - [`BundlePolicy`] - how the 5-flavor-set bundle scales quantities
//! - [`ItemCount`] - one (canonical product, quantity) pair from the parser
//! - [`OrderRecord`] - one order row as handed to the analysis layer
//! - [`RecipientFields`] - recipient columns of a row
//! - [`RecipientKey`] - identity under which per-recipient tallies bucket

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// =============================================================================
// Analysis Mode
// =============================================================================

/// Which kind of analysis a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// One flat product tally across all rows.
    #[default]
    Aggregate,
    /// One tally per recipient, plus recipient metadata.
    PerRecipient,
}

// =============================================================================
// Bundle Policy
// =============================================================================

/// How the 5-flavor-set bundle credits its five sub-products.
///
/// Two variants exist in the observed rule history and disagree; the choice
/// is an explicit configuration knob until the owner settles it (see
/// DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundlePolicy {
    /// Each flavor gets exactly the purchase multiplier.
    #[default]
    FixedPerSet,
    /// Each flavor gets the multiplier scaled by the quantity parsed out of
    /// the descriptor (defaulting to 1 when none is present).
    DescriptorScaled,
}

// =============================================================================
// Parsed Items
// =============================================================================

/// One (canonical product name, quantity) pair extracted from an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
    /// Canonical product name.
    pub name: String,
    /// Units credited, already scaled by the purchase multiplier.
    pub quantity: u64,
}

impl ItemCount {
    pub fn new(name: impl Into<String>, quantity: u64) -> Self {
        Self { name: name.into(), quantity }
    }
}

// =============================================================================
// Order Rows
// =============================================================================

/// Recipient columns of one order row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientFields {
    /// Display name.
    pub name: String,
    /// Phone number, kept verbatim.
    pub phone: String,
    /// Shipping address; this is the per-recipient bucketing identity.
    pub address: String,
    /// Order timestamp; `None` when the cell was absent or unparseable.
    pub order_date: Option<NaiveDateTime>,
}

/// One order row as handed to the analysis layer.
///
/// Row sources produce these; the core never sees the sheet itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Raw option text, absent when the cell was empty or non-text.
    pub option: Option<String>,
    /// Purchase multiplier; defaults to 1 when absent or non-numeric.
    pub multiplier: u32,
    /// Recipient columns; required in per-recipient mode.
    pub recipient: Option<RecipientFields>,
}

impl OrderRecord {
    /// Row carrying only an option string, multiplier 1.
    pub fn bare(option: impl Into<String>) -> Self {
        Self {
            option: Some(option.into()),
            multiplier: 1,
            recipient: None,
        }
    }
}

// =============================================================================
// Recipient Identity
// =============================================================================

/// Identity under which per-recipient tallies are bucketed.
///
/// Keyed by the shipping address alone; name and phone are metadata. This is
/// the single invariant for recipient identity across the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipientKey(String);

impl RecipientKey {
    /// Derive the key from a shipping address.
    pub fn from_address(address: &str) -> Self {
        Self(address.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecipientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
