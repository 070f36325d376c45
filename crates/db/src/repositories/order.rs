use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use smartmenu_core::{MenuItemId, Order, OrderId, OrderLine, OrderStatus};

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn lines_for(&self, order_id: &str) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT item_id, name, price_kzt, quantity
             FROM order_line
             WHERE order_id = ?
             ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(line_from_row).collect()
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, table_label, total_kzt, comment, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id.0)
        .bind(&order.table)
        .bind(order.total_kzt)
        .bind(&order.comment)
        .bind(order.status.as_str())
        .bind(order.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for line in &order.lines {
            sqlx::query(
                "INSERT INTO order_line (order_id, item_id, name, price_kzt, quantity)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&order.id.0)
            .bind(line.item_id.as_str())
            .bind(&line.name)
            .bind(line.price_kzt)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, table_label, total_kzt, comment, status, created_at
             FROM orders
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = self.lines_for(&id.0).await?;
        order_from_row(row, lines).map(Some)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, table_label, total_kzt, comment, status, created_at
             FROM orders
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id = row.get::<String, _>("id");
            let lines = self.lines_for(&order_id).await?;
            orders.push(order_from_row(row, lines)?);
        }
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: &OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut order =
            self.find_by_id(id).await?.ok_or_else(|| RepositoryError::NotFound(id.0.clone()))?;

        order.transition_to(next)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE orders
             SET status = ?
             WHERE id = ? AND status = ?",
        )
        .bind(next.as_str())
        .bind(&id.0)
        // Guards against a concurrent transition between read and write.
        .bind(previous_status(next).as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound(id.0.clone()));
        }

        tx.commit().await?;
        Ok(order)
    }
}

/// The only legal predecessor of each reachable status.
fn previous_status(next: OrderStatus) -> OrderStatus {
    match next {
        OrderStatus::New | OrderStatus::Cooking => OrderStatus::New,
        OrderStatus::Served => OrderStatus::Cooking,
    }
}

fn order_from_row(row: SqliteRow, lines: Vec<OrderLine>) -> Result<Order, RepositoryError> {
    let status_raw = row.get::<String, _>("status");
    let status = OrderStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown order status `{status_raw}`")))?;

    let created_raw = row.get::<String, _>("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|error| RepositoryError::Decode(format!("bad created_at timestamp: {error}")))?
        .with_timezone(&Utc);

    Ok(Order {
        id: OrderId(row.get::<String, _>("id")),
        table: row.get::<String, _>("table_label"),
        lines,
        total_kzt: row.get::<i64, _>("total_kzt"),
        comment: row.get::<String, _>("comment"),
        status,
        created_at,
    })
}

fn line_from_row(row: SqliteRow) -> Result<OrderLine, RepositoryError> {
    let quantity = row.get::<i64, _>("quantity");
    let quantity = u32::try_from(quantity)
        .map_err(|_| RepositoryError::Decode(format!("bad line quantity `{quantity}`")))?;

    Ok(OrderLine {
        item_id: MenuItemId::new(row.get::<String, _>("item_id")),
        name: row.get::<String, _>("name"),
        price_kzt: row.get::<i64, _>("price_kzt"),
        quantity,
    })
}
