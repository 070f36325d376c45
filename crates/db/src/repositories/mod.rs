use async_trait::async_trait;
use thiserror::Error;

use smartmenu_core::errors::DomainError;
use smartmenu_core::{Order, OrderId, OrderStatus};

pub mod memory;
pub mod order;

pub use memory::InMemoryOrderRepository;
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("order not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Persistence seam for the order board. The kitchen-status invariant lives
/// in the domain type; `update_status` must route through it so storage can
/// never record a backwards transition.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Newest first, capped at `limit`.
    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError>;

    /// Applies a forward-only status transition and returns the updated
    /// order. Invalid transitions surface as [`RepositoryError::Domain`].
    async fn update_status(
        &self,
        id: &OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError>;
}
