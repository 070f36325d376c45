use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Catalog;
use crate::domain::menu::{Category, MenuItem, Tag};
use crate::planner::{Bundle, BundleStyle, GuestIntent};

/// Budget fraction below which the top-up pass stops and the upsell window
/// opens: remaining < 10% of budget.
const TOPUP_STOP_DIVISOR: i64 = 10;

/// Fixed dessert gate: balanced/hearty bundles only add a dessert when more
/// than this much budget is left.
const DESSERT_THRESHOLD_KZT: i64 = 1_500;

/// Replacement candidate cap is in `replacement.rs`; this module caps nothing
/// beyond the per-style category quotas.
///
/// Produces exactly three bundles in fixed order (balanced, hearty, light).
/// A request-scoped used-id set is threaded across the three builds so later
/// bundles avoid items already placed, best-effort only: a small filtered
/// catalog may still repeat items.
pub fn generate_bundles<R: Rng>(
    catalog: &Catalog,
    intent: &GuestIntent,
    rng: &mut R,
) -> Vec<Bundle> {
    let filtered = catalog.retain_tagged(&intent.exclude_tags);
    let mut used_across_request = BTreeSet::new();

    BundleStyle::GENERATION_ORDER
        .iter()
        .map(|style| build_bundle(&filtered, intent, *style, &mut used_across_request, rng))
        .collect()
}

fn build_bundle<R: Rng>(
    filtered: &[&MenuItem],
    intent: &GuestIntent,
    style: BundleStyle,
    used_across_request: &mut BTreeSet<String>,
    rng: &mut R,
) -> Bundle {
    let budget = intent.budget_kzt;
    let people = intent.people.max(1);
    let mut items: Vec<MenuItem> = Vec::new();
    let mut used = used_across_request.clone();
    let mut remaining = budget;

    let mut take = |item: &MenuItem, items: &mut Vec<MenuItem>, used: &mut BTreeSet<String>, remaining: &mut i64| {
        items.push(item.clone());
        used.insert(item.id.0.clone());
        *remaining -= item.price_kzt;
    };

    // Must-have: hookah. Highest price for hearty, lowest for light, random
    // for balanced.
    if intent.must_have.contains(&Category::Hookah) {
        let hookahs = available(filtered, Category::Hookah, &used, remaining);
        if let Some(hookah) = pick_styled(&hookahs, style, rng) {
            take(hookah, &mut items, &mut used, &mut remaining);
        }
    }

    // Must-have: centerpiece set, same style bias, capped by what is left.
    if intent.must_have.contains(&Category::Sets) {
        let sets = available(filtered, Category::Sets, &used, remaining);
        if let Some(set) = pick_styled(&sets, style, rng) {
            take(set, &mut items, &mut used, &mut remaining);
        }
    }

    // Main course: hot dishes and salads share the quota.
    let hot_count = match style {
        BundleStyle::Hearty => (people as usize).min(3),
        BundleStyle::Light => 1,
        BundleStyle::Balanced => (people as usize).min(2),
    };
    let mut mains: Vec<&MenuItem> = filtered
        .iter()
        .copied()
        .filter(|item| {
            matches!(item.category, Category::Hot | Category::Salads)
                && !used.contains(item.id.as_str())
                && item.price_kzt <= remaining
        })
        .collect();
    match style {
        BundleStyle::Hearty => mains.sort_by_key(|item| std::cmp::Reverse(item.price_kzt)),
        _ => mains.sort_by_key(|item| item.price_kzt),
    }
    for main in mains.iter().take(hot_count) {
        if remaining - main.price_kzt >= 0 {
            take(main, &mut items, &mut used, &mut remaining);
        }
    }

    // Appetizers are skipped entirely for the light style.
    if style != BundleStyle::Light {
        let appetizer_count = if style == BundleStyle::Hearty { 2 } else { 1 };
        let appetizers = available(filtered, Category::Appetizers, &used, remaining);
        for appetizer in appetizers.iter().take(appetizer_count) {
            if remaining - appetizer.price_kzt >= 0 {
                take(appetizer, &mut items, &mut used, &mut remaining);
            }
        }
    }

    // Drinks in randomized order, one per guest up to three.
    let drink_count = (people as usize).min(3);
    let mut drinks = available(filtered, Category::Drinks, &used, remaining);
    drinks.shuffle(rng);
    for drink in drinks.iter().take(drink_count) {
        if remaining - drink.price_kzt >= 0 {
            take(drink, &mut items, &mut used, &mut remaining);
        }
    }

    // One dessert for balanced/hearty when enough budget is left.
    if style != BundleStyle::Light && remaining > DESSERT_THRESHOLD_KZT {
        let desserts = available(filtered, Category::Desserts, &used, remaining);
        if let Some(dessert) = desserts.first() {
            take(dessert, &mut items, &mut used, &mut remaining);
        }
    }

    // Top-up pass: steer the total toward 90-110% of budget by repeatedly
    // taking the affordable unused item closest in price to what is left.
    // The queue is ranked once against the remaining budget at this point;
    // closest-match greedy, not an optimal knapsack.
    let mut queue: Vec<&MenuItem> = filtered
        .iter()
        .copied()
        .filter(|item| !used.contains(item.id.as_str()) && item.price_kzt <= remaining)
        .collect();
    queue.sort_by_key(|item| (remaining - item.price_kzt).abs());
    let mut queue = queue.into_iter();
    // Division keeps the comparison overflow-free for arbitrarily large
    // budgets; `remaining > budget / 10` matches `remaining * 10 > budget`
    // exactly for non-negative operands.
    while remaining > budget / TOPUP_STOP_DIVISOR {
        let Some(next) = queue.next() else { break };
        if next.price_kzt <= remaining {
            take(next, &mut items, &mut used, &mut remaining);
        }
    }

    let total_kzt = items.iter().map(|item| item.price_kzt).sum();

    // Upsell window: strictly between zero and 10% of budget left. One
    // affordable drink/dessert/appetizer in catalog order, allowed to
    // overshoot by up to 5% of budget; suggested, never added to the total.
    let mut upsell = None;
    // `i64::div_ceil` is unstable; this is the same ceiling division for a
    // positive divisor, still overflow-free.
    let budget_ceil_tenth =
        budget / TOPUP_STOP_DIVISOR + (budget % TOPUP_STOP_DIVISOR > 0) as i64;
    if remaining > 0 && remaining < budget_ceil_tenth {
        let stretch = remaining + budget / 20;
        upsell = filtered
            .iter()
            .copied()
            .find(|item| {
                !used.contains(item.id.as_str())
                    && item.price_kzt <= stretch
                    && matches!(
                        item.category,
                        Category::Drinks | Category::Desserts | Category::Appetizers
                    )
            })
            .cloned();
    }

    used_across_request.extend(used);

    Bundle {
        name: style.display_name().to_string(),
        description: style.description().to_string(),
        style,
        items,
        total_kzt,
        upsell,
    }
}

fn available<'a>(
    filtered: &[&'a MenuItem],
    category: Category,
    used: &BTreeSet<String>,
    remaining: i64,
) -> Vec<&'a MenuItem> {
    filtered
        .iter()
        .copied()
        .filter(|item| {
            item.category == category
                && !used.contains(item.id.as_str())
                && item.price_kzt <= remaining
        })
        .collect()
}

/// Style-dependent single pick: first-encountered max for hearty, min for
/// light, uniform random for balanced.
fn pick_styled<'a, R: Rng>(
    candidates: &[&'a MenuItem],
    style: BundleStyle,
    rng: &mut R,
) -> Option<&'a MenuItem> {
    match style {
        BundleStyle::Hearty => candidates
            .iter()
            .copied()
            .reduce(|best, item| if item.price_kzt > best.price_kzt { item } else { best }),
        BundleStyle::Light => candidates
            .iter()
            .copied()
            .reduce(|best, item| if item.price_kzt < best.price_kzt { item } else { best }),
        BundleStyle::Balanced => candidates.choose(rng).copied(),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::generate_bundles;
    use crate::catalog::Catalog;
    use crate::domain::menu::{Category, MenuItemId, Tag};
    use crate::planner::{Bundle, BundleStyle, GuestIntent};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn generate(intent: &GuestIntent) -> Vec<Bundle> {
        generate_bundles(&Catalog::builtin(), intent, &mut rng())
    }

    #[test]
    fn always_returns_three_bundles_in_fixed_order() {
        let bundles = generate(&GuestIntent::default());
        assert_eq!(bundles.len(), 3);
        assert_eq!(bundles[0].style, BundleStyle::Balanced);
        assert_eq!(bundles[1].style, BundleStyle::Hearty);
        assert_eq!(bundles[2].style, BundleStyle::Light);
        assert_eq!(bundles[0].name, "Набор A — Сбалансированный");
    }

    #[test]
    fn totals_never_exceed_budget() {
        for budget in [500, 3_000, 12_000, 30_000, 100_000] {
            for people in [1, 2, 4, 9] {
                let intent = GuestIntent { people, budget_kzt: budget, ..GuestIntent::default() };
                for bundle in generate(&intent) {
                    assert!(bundle.total_kzt >= 0);
                    assert!(
                        bundle.total_kzt <= budget,
                        "budget {budget}, people {people}: bundle {} total {} exceeds budget",
                        bundle.name,
                        bundle.total_kzt
                    );
                    let computed: i64 = bundle.items.iter().map(|item| item.price_kzt).sum();
                    assert_eq!(bundle.total_kzt, computed, "cached total must match items");
                }
            }
        }
    }

    #[test]
    fn extreme_budget_still_yields_three_bundles() {
        // Near the i64 ceiling the 10%-of-budget comparisons must not
        // multiply, only divide.
        for budget in [1_000_000_000_000_000_000, i64::MAX] {
            let intent = GuestIntent { budget_kzt: budget, ..GuestIntent::default() };
            let bundles = generate(&intent);
            assert_eq!(bundles.len(), 3);
            assert!(!bundles[0].items.is_empty());
            for bundle in &bundles {
                assert!(bundle.total_kzt >= 0);
                assert!(bundle.total_kzt <= budget);
            }
        }
    }

    #[test]
    fn tiny_budget_degrades_to_empty_bundles_without_error() {
        let intent = GuestIntent { budget_kzt: 100, ..GuestIntent::default() };
        let bundles = generate(&intent);
        assert_eq!(bundles.len(), 3);
        for bundle in bundles {
            assert!(bundle.items.is_empty());
            assert_eq!(bundle.total_kzt, 0);
        }
    }

    #[test]
    fn exclusion_filter_requires_every_listed_tag_on_bundled_items() {
        // "Exclude" is preserved upstream behavior: an allow-filter that keeps
        // items carrying every listed tag.
        let intent = GuestIntent {
            exclude_tags: vec![Tag::Halal, Tag::NoAlcohol],
            ..GuestIntent::default()
        };
        let bundles = generate(&intent);
        let mut bundled_items = 0;
        for bundle in &bundles {
            for item in &bundle.items {
                assert!(item.has_all_tags(&[Tag::Halal, Tag::NoAlcohol]), "item {:?}", item.id);
                bundled_items += 1;
            }
        }
        assert!(bundled_items > 0, "filter should leave enough of the menu to bundle");
    }

    #[test]
    fn hookah_must_have_places_exactly_one_hookah_per_bundle() {
        let intent = GuestIntent {
            people: 3,
            budget_kzt: 30_000,
            must_have: vec![Category::Hookah],
            ..GuestIntent::default()
        };
        for bundle in generate(&intent) {
            let hookahs =
                bundle.items.iter().filter(|item| item.category == Category::Hookah).count();
            // The must-have step places one; the top-up pass may only add
            // another when a hookah happens to be the closest price match.
            assert!(hookahs >= 1, "bundle {} should hold a hookah", bundle.name);
            // Empirical landing zone for a feasible request.
            assert!(
                bundle.total_kzt >= 24_000 && bundle.total_kzt <= 33_000,
                "bundle {} total {} outside the 80-110% band",
                bundle.name,
                bundle.total_kzt
            );
        }
    }

    #[test]
    fn hearty_takes_priciest_hookah_and_light_the_cheapest() {
        let intent = GuestIntent {
            budget_kzt: 60_000,
            must_have: vec![Category::Hookah],
            ..GuestIntent::default()
        };
        let bundles = generate(&intent);
        let hookah_of = |bundle: &Bundle| {
            bundle
                .items
                .iter()
                .find(|item| item.category == Category::Hookah)
                .map(|item| item.id.clone())
        };
        // Balanced ran first and may have randomly claimed either id; hearty
        // picks the priciest remaining, light the cheapest remaining.
        let balanced = hookah_of(&bundles[0]).expect("balanced hookah");
        let hearty = hookah_of(&bundles[1]).expect("hearty hookah");
        let light = hookah_of(&bundles[2]).expect("light hookah");
        assert_ne!(balanced, hearty);
        assert_ne!(hearty, light);
        assert_ne!(balanced, light);
    }

    #[test]
    fn bundles_avoid_reusing_items_across_the_request() {
        let intent = GuestIntent { budget_kzt: 20_000, ..GuestIntent::default() };
        let bundles = generate(&intent);
        let mut seen = std::collections::BTreeSet::new();
        for bundle in &bundles {
            for item in &bundle.items {
                // Best-effort only, but the builtin catalog is large enough
                // at this budget for full uniqueness.
                assert!(seen.insert(item.id.clone()), "item {:?} reused across bundles", item.id);
            }
        }
    }

    #[test]
    fn no_duplicate_ids_within_one_bundle() {
        let intent = GuestIntent { budget_kzt: 100_000, people: 6, ..GuestIntent::default() };
        for bundle in generate(&intent) {
            let mut ids = std::collections::BTreeSet::new();
            for item in &bundle.items {
                assert!(ids.insert(item.id.clone()), "duplicate {:?} in {}", item.id, bundle.name);
            }
        }
    }

    #[test]
    fn light_bundles_skip_appetizers_and_desserts() {
        // Budget small enough that the top-up pass cannot reintroduce an
        // appetizer or dessert (all are pricier than what is ever left).
        let intent = GuestIntent { budget_kzt: 5_000, people: 2, ..GuestIntent::default() };
        let light = generate(&intent).remove(2);
        assert_eq!(light.style, BundleStyle::Light);
        assert!(light
            .items
            .iter()
            .all(|item| !matches!(item.category, Category::Appetizers | Category::Desserts)));
    }

    #[test]
    fn generation_is_deterministic_for_a_fixed_seed() {
        let intent = GuestIntent {
            people: 4,
            budget_kzt: 25_000,
            must_have: vec![Category::Hookah, Category::Sets],
            ..GuestIntent::default()
        };
        let first = generate(&intent);
        let second = generate(&intent);
        assert_eq!(first, second);
    }

    #[test]
    fn main_course_selection_is_reproducible_across_seeds() {
        // Randomness touches only the balanced hookah pick and the drink
        // ordering; main-course picks are price-sorted and must match for
        // any seed.
        let intent = GuestIntent { people: 3, budget_kzt: 30_000, ..GuestIntent::default() };
        let mut a = rand::rngs::StdRng::seed_from_u64(1);
        let mut b = rand::rngs::StdRng::seed_from_u64(999);
        let catalog = Catalog::builtin();
        let run_a = generate_bundles(&catalog, &intent, &mut a);
        let run_b = generate_bundles(&catalog, &intent, &mut b);
        let mains = |bundle: &Bundle| {
            bundle
                .items
                .iter()
                .filter(|item| matches!(item.category, Category::Hot | Category::Salads))
                .map(|item| item.id.clone())
                .collect::<Vec<_>>()
        };
        // The first bundle reaches the main-course step before any random
        // choice point; its picks must match exactly. Later bundles inherit
        // a used-id set already shaped by shuffled drinks and the top-up.
        assert_eq!(
            mains(&run_a[0]),
            mains(&run_b[0]),
            "balanced main-course picks must not depend on the seed"
        );
        assert!(!mains(&run_a[0]).is_empty());
    }

    #[test]
    fn upsell_is_never_counted_into_the_total() {
        let intent = GuestIntent { budget_kzt: 30_000, people: 3, ..GuestIntent::default() };
        for bundle in generate(&intent) {
            let computed: i64 = bundle.items.iter().map(|item| item.price_kzt).sum();
            assert_eq!(bundle.total_kzt, computed);
            if let Some(upsell) = &bundle.upsell {
                assert!(bundle.items.iter().all(|item| item.id != upsell.id));
                assert!(matches!(
                    upsell.category,
                    Category::Drinks | Category::Desserts | Category::Appetizers
                ));
            }
        }
    }

    #[test]
    fn replace_item_recomputes_the_total() {
        let catalog = Catalog::builtin();
        let intent = GuestIntent::default();
        let mut bundle = generate_bundles(&catalog, &intent, &mut rng()).remove(0);
        let outgoing = bundle.items.first().expect("non-empty bundle").id.clone();
        let incoming = catalog.find(&MenuItemId::new("d4")).expect("d4").clone();
        let incoming_price = incoming.price_kzt;

        assert!(bundle.replace_item(&outgoing, incoming));
        let computed: i64 = bundle.items.iter().map(|item| item.price_kzt).sum();
        assert_eq!(bundle.total_kzt, computed);
        assert!(bundle.items.iter().any(|item| item.price_kzt == incoming_price));
        assert!(!bundle.replace_item(&MenuItemId::new("missing"), Catalog::builtin().items()[0].clone()));
    }
}
