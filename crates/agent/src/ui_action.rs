//! Delimited action blocks embedded in agent free text.
//!
//! The wire contract with the conversational agent is textual: a JSON payload
//! wrapped in `<UI_ACTION>...</UI_ACTION>` anywhere in a reply. Extraction is
//! deliberately forgiving: a missing block and a malformed one are both
//! "nothing to do", never an error, and only the first block counts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use smartmenu_core::Bundle;

const BLOCK_START: &str = "<UI_ACTION>";
const BLOCK_END: &str = "</UI_ACTION>";

/// The only action name the picker modal responds to.
pub const OPEN_MENU_PICKER: &str = "OPEN_MENU_PICKER";

/// Parses the first delimited block as raw JSON. Shape validation is the
/// consumer's job; this only guarantees syntactic well-formedness.
pub fn extract_ui_action(text: &str) -> Option<Value> {
    let start = text.find(BLOCK_START)?;
    let rest = &text[start + BLOCK_START.len()..];
    let end = rest.find(BLOCK_END)?;
    serde_json::from_str(rest[..end].trim()).ok()
}

/// Removes every action block, leaving the text meant for the guest.
pub fn strip_ui_actions(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut remainder = text;
    while let Some(start) = remainder.find(BLOCK_START) {
        output.push_str(&remainder[..start]);
        let after_start = &remainder[start + BLOCK_START.len()..];
        match after_start.find(BLOCK_END) {
            Some(end) => remainder = &after_start[end + BLOCK_END.len()..],
            None => {
                remainder = "";
                break;
            }
        }
    }
    output.push_str(remainder);
    output.trim().to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerItem {
    pub id: String,
    pub name: String,
    pub price: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerVariant {
    pub name: String,
    pub items: Vec<PickerItem>,
    pub total: i64,
}

/// View model for the menu picker modal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuPicker {
    pub title: String,
    pub variants: Vec<PickerVariant>,
}

impl MenuPicker {
    /// Lenient conversion from a raw extracted payload. Agents drift on field
    /// names (`price` vs `priceKZT`, `total` vs `totalKZT`), so each field
    /// falls back through the known spellings before defaulting. Returns
    /// `None` unless the action name is [`OPEN_MENU_PICKER`].
    pub fn from_action(payload: &Value) -> Option<Self> {
        if payload.get("action").and_then(Value::as_str) != Some(OPEN_MENU_PICKER) {
            return None;
        }

        let title = payload
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Подобранное меню")
            .to_string();

        let variants = payload
            .get("variants")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().map(variant_from_value).collect())
            .unwrap_or_default();

        Some(Self { title, variants })
    }
}

fn variant_from_value(raw: &Value) -> PickerVariant {
    let name = raw
        .get("name")
        .or_else(|| raw.get("key"))
        .and_then(Value::as_str)
        .unwrap_or("Вариант")
        .to_string();

    let items: Vec<PickerItem> = raw
        .get("items")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(item_from_value).collect())
        .unwrap_or_default();

    let total = raw
        .get("total")
        .or_else(|| raw.get("totalKZT"))
        .and_then(Value::as_i64)
        .unwrap_or_else(|| items.iter().map(|item| item.price).sum());

    PickerVariant { name, items, total }
}

fn item_from_value(raw: &Value) -> PickerItem {
    let id = raw.get("id").and_then(Value::as_str);
    let name = raw.get("name").and_then(Value::as_str);
    let price = raw
        .get("price")
        .or_else(|| raw.get("priceKZT"))
        .or_else(|| raw.get("totalKZT"))
        .and_then(Value::as_i64)
        .unwrap_or(0);

    PickerItem {
        id: id.or(name).unwrap_or_default().to_string(),
        name: name.or(id).unwrap_or_default().to_string(),
        price,
    }
}

/// Renders generated bundles as the same block shape the agent emits, so the
/// text-chat path and the voice path feed one picker implementation.
pub fn render_picker_action(title: &str, bundles: &[Bundle]) -> String {
    let variants: Vec<PickerVariant> = bundles
        .iter()
        .map(|bundle| PickerVariant {
            name: bundle.name.clone(),
            items: bundle
                .items
                .iter()
                .map(|item| PickerItem {
                    id: item.id.as_str().to_string(),
                    name: item.name.clone(),
                    price: item.price_kzt,
                })
                .collect(),
            total: bundle.total_kzt,
        })
        .collect();

    let payload = serde_json::json!({
        "action": OPEN_MENU_PICKER,
        "title": title,
        "variants": variants,
    });

    format!("{BLOCK_START}\n{payload}\n{BLOCK_END}")
}
