//! Grounding text sent to the external conversational agent.
//!
//! The agent on the other side of the voice transport was prompted against
//! these exact line shapes; both renderers must stay byte-compatible with the
//! deployed prompts.

use smartmenu_core::{Catalog, Category};

/// One reference line per item, used by the in-page food-info panel and as a
/// per-item drill-down for the agent.
pub fn menu_reference_lines(catalog: &Catalog) -> Vec<String> {
    catalog
        .items()
        .iter()
        .map(|item| {
            let allergens = if item.allergens.is_empty() {
                "нет".to_string()
            } else {
                item.allergens.join(", ")
            };
            format!(
                "- {} (id:{}): {}. Аллергены: {}. Категория: {}.",
                item.name,
                item.id.as_str(),
                item.description,
                allergens,
                item.category.label()
            )
        })
        .collect()
}

/// Full system context for a voice session: the grouped menu plus the
/// instructions that make the agent emit a picker action block.
pub fn build_menu_context(catalog: &Catalog) -> String {
    let mut groups = Vec::new();
    for category in Category::ALL {
        let entries: Vec<String> = catalog
            .in_category(category)
            .map(|item| format!("{} (id:{}, {}₸)", item.name, item.id.as_str(), item.price_kzt))
            .collect();
        if !entries.is_empty() {
            groups.push(format!("{}: {}", category.label(), entries.join(", ")));
        }
    }
    let menu_lines = groups.join("\n");

    format!(
        r#"Ты — голосовой помощник ресторана Aurora Lounge в Алматы. Помогаешь гостям подобрать заказ по бюджету и предпочтениям.

МЕНЮ РЕСТОРАНА:
{menu_lines}

ВАЖНО: Когда пользователь просит подобрать меню (указывает бюджет, количество людей, предпочтения), ты ДОЛЖЕН в своём ответе включить блок:

<UI_ACTION>
{{
  "action": "OPEN_MENU_PICKER",
  "title": "Подбор меню на [бюджет] для [кол-во] человек",
  "variants": [
    {{
      "name": "Вариант A — Сбалансированный",
      "items": [{{"id": "h1", "name": "Классический кальян", "price": 7000}}, ...],
      "total": 25000
    }},
    {{
      "name": "Вариант B — Сытный",
      "items": [...],
      "total": 28000
    }},
    {{
      "name": "Вариант C — Лёгкий",
      "items": [...],
      "total": 22000
    }}
  ]
}}
</UI_ACTION>

Правила подбора:
- Создавай ровно 3 варианта (Сбалансированный, Сытный, Лёгкий)
- Итого каждого варианта должно быть 80-100% от бюджета
- Используй ТОЛЬКО id из меню выше
- Учитывай пожелания (халяль, без алкоголя, веган и т.д.)
- Отвечай на русском языке
- Блок <UI_ACTION> автоматически откроет модалку выбора на экране пользователя"#
    )
}
