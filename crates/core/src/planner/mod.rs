//! Budget-constrained menu-set planner.
//!
//! Given a parsed guest request, the planner assembles three candidate meal
//! bundles (balanced / hearty / light) with a greedy multi-pass heuristic:
//! style-biased category quotas, a per-addition budget guard, and a
//! closest-price top-up aiming the total at 90-110% of the budget. The
//! problem is small (one fixed ~40-item catalog) and interactive, so an
//! explainable greedy pass is used instead of a knapsack solver.
//!
//! The planner never fails: an infeasible budget degrades to smaller or empty
//! bundles. Randomness is confined to two documented choice points and comes
//! from an injected [`rand::Rng`], so tests pin a seed and assert exact output.

pub mod generator;
pub mod replacement;

use serde::{Deserialize, Serialize};

use crate::domain::menu::{Category, MenuItem, Tag};

pub use generator::generate_bundles;
pub use replacement::replacements;

/// Structured interpretation of a free-text ordering request.
/// Every field has a default; parsing never fails, it only degrades.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestIntent {
    pub people: u32,
    pub budget_kzt: i64,
    pub must_have: Vec<Category>,
    /// Carries the upstream "exclude" list. Behavior is an allow-filter:
    /// bundled items must have every listed tag (see `Catalog::retain_tagged`).
    pub exclude_tags: Vec<Tag>,
    /// Advisory only; carried through but not consumed by bundle scoring.
    pub preference_tags: Vec<Tag>,
}

impl Default for GuestIntent {
    fn default() -> Self {
        Self {
            people: 2,
            budget_kzt: 30_000,
            must_have: Vec::new(),
            exclude_tags: Vec::new(),
            preference_tags: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleStyle {
    Balanced,
    Hearty,
    Light,
}

impl BundleStyle {
    pub const GENERATION_ORDER: [BundleStyle; 3] =
        [BundleStyle::Balanced, BundleStyle::Hearty, BundleStyle::Light];

    pub fn display_name(&self) -> &'static str {
        match self {
            BundleStyle::Balanced => "Набор A — Сбалансированный",
            BundleStyle::Hearty => "Набор B — Сытный",
            BundleStyle::Light => "Набор C — Лёгкий",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BundleStyle::Balanced => "Оптимальный микс закусок, горячего и напитков",
            BundleStyle::Hearty => "Больше горячего и закусок для плотного ужина",
            BundleStyle::Light => "Акцент на салаты и лёгкие блюда",
        }
    }
}

/// One generated candidate meal set. The upsell, when present, is a suggested
/// add-on and is not part of `items` or `total_kzt`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub name: String,
    pub description: String,
    pub style: BundleStyle,
    pub items: Vec<MenuItem>,
    pub total_kzt: i64,
    pub upsell: Option<MenuItem>,
}

impl Bundle {
    pub fn recompute_total(&mut self) {
        self.total_kzt = self.items.iter().map(|item| item.price_kzt).sum();
    }

    /// Swaps one item for a manually chosen replacement and recomputes the
    /// total. Returns false when the outgoing id is not in the bundle.
    pub fn replace_item(
        &mut self,
        outgoing: &crate::domain::menu::MenuItemId,
        incoming: MenuItem,
    ) -> bool {
        let Some(position) = self.items.iter().position(|item| &item.id == outgoing) else {
            return false;
        };
        self.items[position] = incoming;
        self.recompute_total();
        true
    }
}
