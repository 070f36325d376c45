use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MenuItemId(pub String);

impl MenuItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hookah,
    Sets,
    Appetizers,
    Hot,
    Salads,
    Desserts,
    Drinks,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Hookah,
        Category::Sets,
        Category::Appetizers,
        Category::Hot,
        Category::Salads,
        Category::Desserts,
        Category::Drinks,
    ];

    /// Guest-facing Russian label, matching the wording the voice agent
    /// is prompted with.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Hookah => "Кальяны",
            Category::Sets => "Сеты в центр",
            Category::Appetizers => "Закуски",
            Category::Hot => "Горячее",
            Category::Salads => "Салаты",
            Category::Desserts => "Десерты",
            Category::Drinks => "Напитки",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Category::Hookah => "hookah",
            Category::Sets => "sets",
            Category::Appetizers => "appetizers",
            Category::Hot => "hot",
            Category::Salads => "salads",
            Category::Desserts => "desserts",
            Category::Drinks => "drinks",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    Halal,
    NotSpicy,
    NoAlcohol,
    Vegan,
    ForHookah,
    Sweet,
    NoSugar,
}

impl Tag {
    pub fn label(&self) -> &'static str {
        match self {
            Tag::Halal => "Халяль",
            Tag::NotSpicy => "Не острое",
            Tag::NoAlcohol => "Без алкоголя",
            Tag::Vegan => "Веган",
            Tag::ForHookah => "Под кальян",
            Tag::Sweet => "Сладкое",
            Tag::NoSugar => "Без сахара",
        }
    }
}

/// Immutable catalog entry. Prices are whole tenge; there is no minor unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    pub price_kzt: i64,
    pub category: Category,
    pub tags: Vec<Tag>,
    pub allergens: Vec<String>,
}

impl MenuItem {
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn has_all_tags(&self, tags: &[Tag]) -> bool {
        tags.iter().all(|tag| self.has_tag(*tag))
    }
}
