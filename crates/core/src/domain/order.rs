use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::menu::MenuItemId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Cooking,
    Served,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Cooking => "cooking",
            OrderStatus::Served => "served",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(OrderStatus::New),
            "cooking" => Some(OrderStatus::Cooking),
            "served" => Some(OrderStatus::Served),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: MenuItemId,
    pub name: String,
    pub price_kzt: i64,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total_kzt(&self) -> i64 {
        self.price_kzt.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub table: String,
    pub lines: Vec<OrderLine>,
    pub total_kzt: i64,
    pub comment: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn create(table: impl Into<String>, lines: Vec<OrderLine>, comment: impl Into<String>) -> Self {
        let total_kzt = lines.iter().map(OrderLine::line_total_kzt).sum();
        Self {
            id: OrderId::generate(),
            table: table.into(),
            lines,
            total_kzt,
            comment: comment.into(),
            status: OrderStatus::New,
            created_at: Utc::now(),
        }
    }

    /// Kitchen statuses only move forward: new -> cooking -> served.
    /// No regression, no skipping.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self.status, next),
            (OrderStatus::New, OrderStatus::Cooking) | (OrderStatus::Cooking, OrderStatus::Served)
        )
    }

    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidOrderTransition { from: self.status, to: next })
    }
}

#[cfg(test)]
mod tests {
    use super::{Order, OrderLine, OrderStatus};
    use crate::domain::menu::MenuItemId;

    fn order(status: OrderStatus) -> Order {
        let mut order = Order::create(
            "Стол 7",
            vec![OrderLine {
                item_id: MenuItemId::new("g6"),
                name: "Плов по-алматински".to_string(),
                price_kzt: 3800,
                quantity: 2,
            }],
            "",
        );
        order.status = status;
        order
    }

    #[test]
    fn create_computes_total_from_lines() {
        let order = order(OrderStatus::New);
        assert_eq!(order.total_kzt, 7600);
        assert_eq!(order.status, OrderStatus::New);
    }

    #[test]
    fn allows_forward_transitions_only() {
        let mut order = order(OrderStatus::New);
        order.transition_to(OrderStatus::Cooking).expect("new -> cooking");
        order.transition_to(OrderStatus::Served).expect("cooking -> served");
        assert_eq!(order.status, OrderStatus::Served);
    }

    #[test]
    fn blocks_skipping_ahead() {
        let mut order = order(OrderStatus::New);
        let error = order.transition_to(OrderStatus::Served).expect_err("new -> served must fail");
        assert!(matches!(
            error,
            crate::errors::DomainError::InvalidOrderTransition { .. }
        ));
        assert_eq!(order.status, OrderStatus::New);
    }

    #[test]
    fn served_orders_never_regress() {
        let mut order = order(OrderStatus::Served);
        assert!(order.transition_to(OrderStatus::Cooking).is_err());
        assert!(order.transition_to(OrderStatus::New).is_err());
        assert!(order.transition_to(OrderStatus::Served).is_err());
        assert_eq!(order.status, OrderStatus::Served);
    }

    #[test]
    fn status_round_trips_through_storage_strings() {
        for status in [OrderStatus::New, OrderStatus::Cooking, OrderStatus::Served] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("cancelled"), None);
    }
}
