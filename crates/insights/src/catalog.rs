//! Bundle display catalog
//!
//! Maps class labels to presentation metadata. The catalog only affects
//! display: labels missing from it still take part in every statistic.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::warn;

/// Class labels in display order, as emitted by the classification service.
pub const CLASS_ORDER: [&str; 10] = [
    "Auto_Comprehensive",
    "Auto_Liability_Basic",
    "Basic_Health",
    "Family_Comprehensive",
    "Health_Dental_Vision",
    "Home_Premium",
    "Home_Standard",
    "Premium_Health_Life",
    "Renter_Basic",
    "Renter_Premium",
];

const FALLBACK_COLOR: &str = "#6366f1";
const FALLBACK_ICON: &str = "📋";

/// Coverage tier of a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Basic,
    Standard,
    Premium,
    /// Label not present in the catalog
    Unclassified,
}

/// Presentation metadata for one bundle label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDisplay {
    /// Class label as emitted by the service
    pub label: String,
    /// Human-readable name
    pub name: String,
    pub tier: Tier,
    /// Accent color (CSS hex)
    pub color: String,
    pub icon: String,
}

impl BundleDisplay {
    fn new(label: &str, name: &str, tier: Tier, color: &str, icon: &str) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            tier,
            color: color.to_string(),
            icon: icon.to_string(),
        }
    }

    /// Neutral entry for a label the catalog does not know
    pub fn fallback(label: &str) -> Self {
        Self::new(label, label, Tier::Unclassified, FALLBACK_COLOR, FALLBACK_ICON)
    }

    pub fn is_fallback(&self) -> bool {
        self.tier == Tier::Unclassified
    }
}

/// Ordered set of known bundles
#[derive(Debug, Clone, PartialEq)]
pub struct BundleCatalog {
    entries: Vec<BundleDisplay>,
}

impl Default for BundleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BundleCatalog {
    /// The ten coverage bundles the service predicts among
    pub fn builtin() -> Self {
        let entries = vec![
            BundleDisplay::new(CLASS_ORDER[0], "Auto Comprehensive", Tier::Premium, "#3b82f6", "🚗"),
            BundleDisplay::new(CLASS_ORDER[1], "Auto Liability Basic", Tier::Basic, "#64748b", "🚙"),
            BundleDisplay::new(CLASS_ORDER[2], "Basic Health", Tier::Basic, "#10b981", "🩺"),
            BundleDisplay::new(CLASS_ORDER[3], "Family Comprehensive", Tier::Premium, "#8b5cf6", "👪"),
            BundleDisplay::new(CLASS_ORDER[4], "Health + Dental + Vision", Tier::Standard, "#14b8a6", "🦷"),
            BundleDisplay::new(CLASS_ORDER[5], "Home Premium", Tier::Premium, "#f59e0b", "🏡"),
            BundleDisplay::new(CLASS_ORDER[6], "Home Standard", Tier::Standard, "#f97316", "🏠"),
            BundleDisplay::new(CLASS_ORDER[7], "Premium Health & Life", Tier::Premium, "#ec4899", "❤️"),
            BundleDisplay::new(CLASS_ORDER[8], "Renter Basic", Tier::Basic, "#06b6d4", "🔑"),
            BundleDisplay::new(CLASS_ORDER[9], "Renter Premium", Tier::Standard, "#a855f7", "🏢"),
        ];
        Self { entries }
    }

    /// Build a catalog from explicit entries, in the given order
    pub fn from_entries(entries: Vec<BundleDisplay>) -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(entries.len()),
        };
        catalog.extend(entries);
        catalog
    }

    /// Replace entries with a matching label in place; append the rest
    pub fn with_overrides(mut self, overrides: Vec<BundleDisplay>) -> Self {
        self.extend(overrides);
        self
    }

    fn extend(&mut self, entries: Vec<BundleDisplay>) {
        for entry in entries {
            match self.position(&entry.label) {
                Some(i) => self.entries[i] = entry,
                None => self.entries.push(entry),
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&BundleDisplay> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn is_known(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Display position of a known label
    pub fn position(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.label == label)
    }

    /// Labels in display order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display metadata for `label`, falling back to a neutral entry
    pub fn resolve(&self, label: &str) -> Cow<'_, BundleDisplay> {
        match self.get(label) {
            Some(entry) => Cow::Borrowed(entry),
            None => {
                warn!(label, "unrecognized bundle label, using fallback display");
                Cow::Owned(BundleDisplay::fallback(label))
            }
        }
    }
}
