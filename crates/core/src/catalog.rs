//! Static, read-only menu catalog. Loaded once at process start and never
//! mutated; every bundle and order line references items by catalog id.

use crate::domain::menu::{Category, MenuItem, MenuItemId, Tag};

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: Vec<MenuItem>,
}

impl Catalog {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn find(&self, id: &MenuItemId) -> Option<&MenuItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    /// Applies the guest dietary filter. NOTE: the upstream contract calls
    /// these "exclude" tags, but the preserved behavior is an allow-filter —
    /// an item survives only when it carries *every* listed tag (asking to
    /// "exclude" halal keeps halal-tagged items only). Kept as-is for wire
    /// compatibility with the voice agent prompts.
    pub fn retain_tagged<'a>(&'a self, required: &[Tag]) -> Vec<&'a MenuItem> {
        if required.is_empty() {
            return self.items.iter().collect();
        }
        self.items.iter().filter(|item| item.has_all_tags(required)).collect()
    }

    /// The Aurora Lounge menu shipped with the app.
    pub fn builtin() -> Self {
        use Category::*;
        use Tag::*;

        fn entry(
            id: &str,
            name: &str,
            description: &str,
            price_kzt: i64,
            category: Category,
            tags: &[Tag],
            allergens: &[&str],
        ) -> MenuItem {
            MenuItem {
                id: MenuItemId::new(id),
                name: name.to_string(),
                description: description.to_string(),
                price_kzt,
                category,
                tags: tags.to_vec(),
                allergens: allergens.iter().map(|a| a.to_string()).collect(),
            }
        }

        Self::new(vec![
            // Кальяны
            entry("h1", "Классический кальян", "Табак на выбор, свежий уголь", 7000, Hookah, &[ForHookah], &[]),
            entry("h2", "Премиум кальян", "Авторский микс, ледяная колба", 9500, Hookah, &[ForHookah], &[]),
            entry("h3", "Фруктовый кальян", "На грейпфруте с мятой", 11000, Hookah, &[ForHookah], &[]),
            // Сеты в центр
            entry("s1", "Сет «Алматы»", "Хумус, бабагануш, лепёшки, овощная нарезка", 5500, Sets, &[Halal, NotSpicy, NoAlcohol, Vegan], &["глютен"]),
            entry("s2", "Сет «Мясной»", "Казы, жужук, конская колбаса, лепёшки", 8500, Sets, &[Halal, NotSpicy], &["глютен"]),
            entry("s3", "Сет «Сырный»", "Брынза, камамбер, чеддер, мёд, орехи", 7000, Sets, &[NotSpicy, NoAlcohol], &["молоко", "орехи"]),
            entry("s4", "Сет «Морской»", "Креветки, кальмар, мидии, лимон", 9500, Sets, &[NotSpicy, NoAlcohol], &["морепродукты"]),
            entry("s5", "Сет «Микс»", "Хумус, куриные крылья, сырные палочки", 6500, Sets, &[Halal, NotSpicy], &["глютен", "молоко"]),
            // Закуски
            entry("a1", "Хумус с лепёшкой", "Классический хумус с тёплой лепёшкой", 2200, Appetizers, &[Halal, Vegan, NotSpicy, NoAlcohol], &["глютен"]),
            entry("a2", "Брускетты с томатом", "3 шт., чиабатта, базилик, пармезан", 2800, Appetizers, &[NotSpicy, NoAlcohol], &["глютен", "молоко"]),
            entry("a3", "Куриные крылья BBQ", "6 крыльев, фирменный BBQ соус", 3200, Appetizers, &[Halal], &[]),
            entry("a4", "Сырные палочки", "Моцарелла во фритюре, томатный дип", 2500, Appetizers, &[NotSpicy, NoAlcohol], &["молоко", "глютен"]),
            entry("a5", "Эдамаме", "С морской солью и чили хлопьями", 1800, Appetizers, &[Vegan, NoAlcohol, Halal], &["соя"]),
            entry("a6", "Начос с гуакамоле", "Кукурузные чипсы, гуакамоле, сальса", 2600, Appetizers, &[Vegan, NotSpicy, NoAlcohol], &[]),
            // Горячее
            entry("g1", "Стейк рибай", "300 г, medium rare, овощи гриль", 8900, Hot, &[Halal, NotSpicy], &[]),
            entry("g2", "Лосось на гриле", "250 г, спаржа, лимонный соус", 7500, Hot, &[NotSpicy, NoAlcohol], &["рыба"]),
            entry("g3", "Паста карбонара", "Спагетти, бекон, пармезан, яйцо", 4200, Hot, &[NotSpicy], &["глютен", "молоко", "яйцо"]),
            entry("g4", "Бургер классический", "Говядина 200 г, чеддер, овощи, картофель фри", 4500, Hot, &[Halal], &["глютен", "молоко"]),
            entry("g5", "Том Ям с креветками", "Острый тайский суп, грибы, лемонграсс", 4800, Hot, &[NoAlcohol], &["морепродукты"]),
            entry("g6", "Плов по-алматински", "Баранина, морковь, нут, специи", 3800, Hot, &[Halal, NotSpicy, NoAlcohol], &[]),
            entry("g7", "Куриный шашлык", "4 шампура, маринад, лаваш, лук", 4200, Hot, &[Halal, NotSpicy, NoAlcohol], &["глютен"]),
            // Салаты
            entry("sl1", "Цезарь с курицей", "Романо, пармезан, гренки, соус цезарь", 3500, Salads, &[NotSpicy], &["глютен", "молоко", "яйцо"]),
            entry("sl2", "Греческий салат", "Огурцы, томаты, оливки, фета", 2800, Salads, &[NotSpicy, NoAlcohol, Halal], &["молоко"]),
            entry("sl3", "Салат с тунцом", "Тунец, авокадо, микрогрин, кунжут", 4200, Salads, &[NotSpicy, NoAlcohol], &["рыба"]),
            entry("sl4", "Овощной боул", "Киноа, авокадо, эдамаме, тахини", 3200, Salads, &[Vegan, NotSpicy, NoAlcohol, Halal], &["соя"]),
            entry("sl5", "Тёплый салат с говядиной", "Говядина, руккола, черри, бальзамик", 4500, Salads, &[Halal, NotSpicy], &[]),
            // Десерты
            entry("d1", "Чизкейк Нью-Йорк", "Классический, ягодный соус", 2500, Desserts, &[NotSpicy, NoAlcohol, Sweet], &["молоко", "глютен", "яйцо"]),
            entry("d2", "Тирамису", "Маскарпоне, эспрессо, какао", 2800, Desserts, &[NotSpicy, Sweet], &["молоко", "глютен", "яйцо"]),
            entry("d3", "Панна-котта", "Ваниль, манго-маракуйя", 2200, Desserts, &[NotSpicy, NoAlcohol, Sweet], &["молоко"]),
            entry("d4", "Фруктовая тарелка", "Сезонные фрукты и ягоды", 3500, Desserts, &[Vegan, NotSpicy, NoAlcohol, NoSugar, Halal], &[]),
            entry("d5", "Шоколадный фондан", "Тёплый, с шариком мороженого", 3000, Desserts, &[NotSpicy, NoAlcohol, Sweet], &["молоко", "глютен", "яйцо"]),
            entry("d6", "Мороженое (3 шарика)", "Ваниль, шоколад, фисташка", 1800, Desserts, &[NotSpicy, NoAlcohol, Sweet], &["молоко", "орехи"]),
            // Напитки
            entry("n1", "Лимонад домашний", "Лимон, мята, тростниковый сахар", 1200, Drinks, &[NoAlcohol, Halal, ForHookah], &[]),
            entry("n2", "Морс облепиховый", "Облепиха, мёд", 1400, Drinks, &[NoAlcohol, Halal, ForHookah], &[]),
            entry("n3", "Айран", "Кисломолочный, охлаждённый", 800, Drinks, &[NoAlcohol, Halal, NotSpicy], &["молоко"]),
            entry("n4", "Капучино", "Двойной эспрессо, молочная пенка", 1500, Drinks, &[NoAlcohol, NotSpicy], &["молоко"]),
            entry("n5", "Чай зелёный (чайник)", "Улун с жасмином, 500 мл", 1200, Drinks, &[NoAlcohol, Halal, Vegan, NoSugar, ForHookah], &[]),
            entry("n6", "Смузи манго-банан", "Свежие фрукты, йогурт", 1800, Drinks, &[NoAlcohol, Sweet, ForHookah], &["молоко"]),
            entry("n7", "Кола 0.5 л", "Coca-Cola", 700, Drinks, &[NoAlcohol], &[]),
            entry("n8", "Вода газ. 0.5 л", "Минеральная", 500, Drinks, &[NoAlcohol, Halal, Vegan, NoSugar], &[]),
            entry("n9", "Свежевыжатый апельсин", "300 мл, без сахара", 1600, Drinks, &[NoAlcohol, Halal, Vegan, NoSugar, ForHookah], &[]),
            entry("n10", "Молочный коктейль", "Ваниль / шоколад / клубника", 1800, Drinks, &[NoAlcohol, Sweet], &["молоко"]),
        ])
    }
}

/// Guest-facing price formatting: thousands separated by spaces, tenge sign.
pub fn format_price_kzt(price: i64) -> String {
    let negative = price < 0;
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped} ₸")
    } else {
        format!("{grouped} ₸")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_price_kzt, Catalog};
    use crate::domain::menu::{Category, MenuItemId, Tag};

    #[test]
    fn builtin_catalog_has_every_category_populated() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.items().len(), 42);
        for category in Category::ALL {
            assert!(
                catalog.in_category(category).next().is_some(),
                "category {category:?} must not be empty"
            );
        }
    }

    #[test]
    fn ids_are_unique_and_prices_positive() {
        let catalog = Catalog::builtin();
        let mut seen = std::collections::BTreeSet::new();
        for item in catalog.items() {
            assert!(seen.insert(item.id.clone()), "duplicate id {:?}", item.id);
            assert!(item.price_kzt > 0);
        }
    }

    #[test]
    fn retain_tagged_keeps_only_items_with_every_tag() {
        let catalog = Catalog::builtin();
        let filtered = catalog.retain_tagged(&[Tag::Halal, Tag::Vegan]);
        assert!(!filtered.is_empty());
        for item in &filtered {
            assert!(item.has_all_tags(&[Tag::Halal, Tag::Vegan]));
        }
        // "Exclude halal" keeps halal items — the inverted semantics under test.
        let halal_only = catalog.retain_tagged(&[Tag::Halal]);
        assert!(halal_only.iter().all(|item| item.has_tag(Tag::Halal)));
    }

    #[test]
    fn empty_filter_returns_whole_catalog() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.retain_tagged(&[]).len(), catalog.items().len());
    }

    #[test]
    fn finds_items_by_id() {
        let catalog = Catalog::builtin();
        let cheesecake = catalog.find(&MenuItemId::new("d1")).expect("d1 exists");
        assert_eq!(cheesecake.price_kzt, 2500);
        assert_eq!(cheesecake.category, Category::Desserts);
        assert!(catalog.find(&MenuItemId::new("zz")).is_none());
    }

    #[test]
    fn price_formatting_groups_thousands() {
        assert_eq!(format_price_kzt(0), "0 ₸");
        assert_eq!(format_price_kzt(700), "700 ₸");
        assert_eq!(format_price_kzt(7000), "7 000 ₸");
        assert_eq!(format_price_kzt(1250000), "1 250 000 ₸");
    }
}
