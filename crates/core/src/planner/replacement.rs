use crate::catalog::Catalog;
use crate::domain::menu::{MenuItem, Tag};

/// Candidate cap for the manual swap picker.
const MAX_CANDIDATES: usize = 6;

/// Ranks same-category substitutes for a manual swap: the dietary filter is
/// applied first (same require-all semantics as generation), the item itself
/// is excluded, and survivors are ordered by absolute price distance,
/// catalog order breaking ties. Never errors; an empty list is a legal
/// answer.
pub fn replacements(catalog: &Catalog, current: &MenuItem, exclude: &[Tag]) -> Vec<MenuItem> {
    let mut candidates: Vec<&MenuItem> = catalog
        .retain_tagged(exclude)
        .into_iter()
        .filter(|item| item.id != current.id && item.category == current.category)
        .collect();
    candidates.sort_by_key(|item| (item.price_kzt - current.price_kzt).abs());
    candidates.into_iter().take(MAX_CANDIDATES).cloned().collect()
}
