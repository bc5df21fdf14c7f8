//! 订单仓储
//!
//! 订单与订单明细的写入只发生在结算事务内，
//! 状态流转由服务层校验后落库。

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::error::Result;
use crate::models::{NewOrder, NewOrderItem, Order, OrderExportRow, OrderItem, OrderStatus};

/// 订单仓储实现
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在结算事务中创建订单头，返回订单 ID
    pub async fn create_in_tx(tx: &mut sqlx::PgConnection, order: &NewOrder) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (order_no, user_id, status, total_points, delivery_method,
                                recipient_name, recipient_phone, recipient_address, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&order.order_no)
        .bind(&order.user_id)
        .bind(OrderStatus::New)
        .bind(order.total_points)
        .bind(order.delivery_method)
        .bind(order.recipient_name.as_deref())
        .bind(order.recipient_phone.as_deref())
        .bind(order.recipient_address.as_deref())
        .bind(order.notes.as_deref())
        .fetch_one(tx)
        .await?;

        Ok(row.get("id"))
    }

    /// 在结算事务中批量写入订单明细
    pub async fn create_items_in_tx(
        tx: &mut sqlx::PgConnection,
        order_id: i64,
        items: &[NewOrderItem],
    ) -> Result<()> {
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, variant_id, product_name,
                                         variant_name, quantity, points_per_item, total_points)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.variant_id)
            .bind(&item.product_name)
            .bind(item.variant_name.as_deref())
            .bind(item.quantity)
            .bind(item.points_per_item)
            .bind(item.total_points())
            .execute(&mut *tx)
            .await?;
        }

        Ok(())
    }

    /// 按 ID 查询订单
    pub async fn get(&self, order_id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_no, user_id, status, total_points, delivery_method,
                   recipient_name, recipient_phone, recipient_address,
                   tracking_number, notes, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 在事务中锁定并读取订单行
    ///
    /// FOR UPDATE 串行化同一订单上的并发退款，幂等检查在锁内完成。
    pub async fn get_for_update_in_tx(
        tx: &mut sqlx::PgConnection,
        order_id: i64,
    ) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_no, user_id, status, total_points, delivery_method,
                   recipient_name, recipient_phone, recipient_address,
                   tracking_number, notes, created_at, updated_at
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_optional(tx)
        .await?;

        Ok(order)
    }

    /// 查询订单明细
    pub async fn list_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, variant_id, product_name,
                   variant_name, quantity, points_per_item, total_points
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// 更新订单状态，可同时补写运单号
    ///
    /// tracking_number 传 None 时保留原值。
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2,
                tracking_number = COALESCE($3, tracking_number),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(tracking_number)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 事务内更新状态（退款流程置为 cancelled）
    pub async fn update_status_in_tx(
        tx: &mut sqlx::PgConnection,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(status)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 导出窗口内的订单明细行，按下单时间升序
    ///
    /// 每个订单明细产出一行，联表取下单人邮箱。
    pub async fn list_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OrderExportRow>> {
        let rows = sqlx::query_as::<_, OrderExportRow>(
            r#"
            SELECT o.order_no, o.user_id, p.email, o.status, o.delivery_method,
                   i.product_name, i.variant_name, i.quantity, i.points_per_item,
                   i.total_points, o.created_at
            FROM orders o
            JOIN order_items i ON i.order_id = o.id
            JOIN profiles p ON p.id = o.user_id
            WHERE o.created_at >= $1 AND o.created_at < $2
            ORDER BY o.created_at ASC, o.id ASC, i.id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
