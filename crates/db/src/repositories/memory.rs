use std::collections::HashMap;

use tokio::sync::RwLock;

use smartmenu_core::{Order, OrderId, OrderStatus};

use super::{OrderRepository, RepositoryError};

/// Test double and offline-mode store. Shares the transition rules with the
/// SQL repository because both delegate to the domain type.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id.0.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id.0).cloned())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn update_status(
        &self,
        id: &OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.write().await;
        let order =
            orders.get_mut(&id.0).ok_or_else(|| RepositoryError::NotFound(id.0.clone()))?;
        order.transition_to(next)?;
        Ok(order.clone())
    }
}
