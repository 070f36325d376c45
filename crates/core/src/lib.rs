pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod planner;

pub use catalog::{format_price_kzt, Catalog};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::cart::{Cart, CartLine};
pub use domain::menu::{Category, MenuItem, MenuItemId, Tag};
pub use domain::order::{Order, OrderId, OrderLine, OrderStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use planner::{generate_bundles, replacements, Bundle, BundleStyle, GuestIntent};
