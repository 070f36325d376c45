use serde::{Deserialize, Serialize};

use crate::domain::menu::{MenuItem, MenuItemId};
use crate::domain::order::OrderLine;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: MenuItem,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total_kzt(&self) -> i64 {
        self.item.price_kzt.saturating_mul(i64::from(self.quantity))
    }
}

/// Session-scoped cart. Mutations replace lines wholesale so readers always
/// see a consistent snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn add(&mut self, item: MenuItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|line| line.item.id == item.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            return;
        }
        self.lines.push(CartLine { item, quantity });
    }

    pub fn remove(&mut self, id: &MenuItemId) {
        self.lines.retain(|line| &line.item.id != id);
    }

    pub fn set_quantity(&mut self, id: &MenuItemId, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|line| &line.item.id == id) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total_kzt(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total_kzt).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_order_lines(self) -> Vec<OrderLine> {
        self.lines
            .into_iter()
            .map(|line| OrderLine {
                item_id: line.item.id,
                name: line.item.name,
                price_kzt: line.item.price_kzt,
                quantity: line.quantity,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Cart;
    use crate::catalog::Catalog;
    use crate::domain::menu::MenuItemId;

    fn catalog_item(id: &str) -> crate::domain::menu::MenuItem {
        Catalog::builtin().find(&MenuItemId::new(id)).expect("builtin item").clone()
    }

    #[test]
    fn adding_same_item_merges_quantities() {
        let mut cart = Cart::new();
        cart.add(catalog_item("n1"), 1);
        cart.add(catalog_item("n1"), 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total_kzt(), 3600);
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let mut cart = Cart::new();
        cart.add(catalog_item("d1"), 2);
        cart.set_quantity(&MenuItemId::new("d1"), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn checkout_preserves_prices_and_quantities() {
        let mut cart = Cart::new();
        cart.add(catalog_item("g1"), 1);
        cart.add(catalog_item("n3"), 4);

        let lines = cart.into_order_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].price_kzt, 8900);
        assert_eq!(lines[1].quantity, 4);
        assert_eq!(lines.iter().map(|line| line.line_total_kzt()).sum::<i64>(), 8900 + 3200);
    }
}
