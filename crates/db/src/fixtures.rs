//! Demo dataset for local development and smoke checks: one order per
//! kitchen status, built from real catalog items.

use smartmenu_core::{Catalog, MenuItemId, Order, OrderLine, OrderStatus};

use crate::repositories::{OrderRepository, RepositoryError};

/// Per-status seed contract: table, comment, item ids, target status.
const SEED_ORDERS: &[SeedOrderContract] = &[
    SeedOrderContract {
        table: "Стол 2",
        comment: "кальян покрепче",
        item_ids: &["h2", "s1", "n6"],
        status: OrderStatus::New,
    },
    SeedOrderContract {
        table: "Стол 5",
        comment: "",
        item_ids: &["g6", "sl2", "n4", "n4"],
        status: OrderStatus::Cooking,
    },
    SeedOrderContract {
        table: "VIP 1",
        comment: "десерт принести позже",
        item_ids: &["h3", "s3", "a2", "d1", "n9"],
        status: OrderStatus::Served,
    },
];

struct SeedOrderContract {
    table: &'static str,
    comment: &'static str,
    item_ids: &'static [&'static str],
    status: OrderStatus,
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub orders_inserted: usize,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub orders_found: usize,
    pub issues: Vec<String>,
}

impl VerificationResult {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Inserts the demo orders. Not idempotent by design: seeding an already
/// seeded database duplicates the board, so callers seed fresh databases.
pub async fn seed_demo_orders(
    repository: &dyn OrderRepository,
) -> Result<SeedResult, RepositoryError> {
    let catalog = Catalog::builtin();

    for contract in SEED_ORDERS {
        let lines = contract
            .item_ids
            .iter()
            .map(|raw_id| {
                let id = MenuItemId::new(*raw_id);
                let item = catalog.find(&id).ok_or_else(|| {
                    RepositoryError::Decode(format!("seed references unknown item `{raw_id}`"))
                })?;
                Ok(OrderLine {
                    item_id: id,
                    name: item.name.clone(),
                    price_kzt: item.price_kzt,
                    quantity: 1,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        let lines = merge_duplicate_lines(lines);
        let order = Order::create(contract.table, lines, contract.comment);
        repository.insert(&order).await?;

        // Walk the pipeline instead of writing the status directly, so seeds
        // can never contain an unreachable state.
        if contract.status != OrderStatus::New {
            repository.update_status(&order.id, OrderStatus::Cooking).await?;
        }
        if contract.status == OrderStatus::Served {
            repository.update_status(&order.id, OrderStatus::Served).await?;
        }
    }

    Ok(SeedResult { orders_inserted: SEED_ORDERS.len() })
}

/// Checks that the seeded board is present and in the promised states.
pub async fn verify_demo_orders(
    repository: &dyn OrderRepository,
) -> Result<VerificationResult, RepositoryError> {
    let orders = repository.list_recent(100).await?;
    let mut issues = Vec::new();

    for contract in SEED_ORDERS {
        match orders.iter().find(|order| order.table == contract.table) {
            None => issues.push(format!("missing seeded order for `{}`", contract.table)),
            Some(order) => {
                if order.status != contract.status {
                    issues.push(format!(
                        "order for `{}` is `{}`, expected `{}`",
                        contract.table,
                        order.status.as_str(),
                        contract.status.as_str()
                    ));
                }
                if order.total_kzt <= 0 {
                    issues.push(format!("order for `{}` has a non-positive total", contract.table));
                }
            }
        }
    }

    Ok(VerificationResult { orders_found: orders.len(), issues })
}

fn merge_duplicate_lines(lines: Vec<OrderLine>) -> Vec<OrderLine> {
    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|existing| existing.item_id == line.item_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line),
        }
    }
    merged
}
