pub mod connection;
pub mod feed;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use feed::{snapshot_digest, OrderFeed, OrderSnapshot};
pub use fixtures::{seed_demo_orders, verify_demo_orders, SeedResult, VerificationResult};
pub use repositories::{
    InMemoryOrderRepository, OrderRepository, RepositoryError, SqlOrderRepository,
};
