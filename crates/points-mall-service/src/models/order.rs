//! 订单相关实体定义
//!
//! 订单与其明细、扣减流水在同一事务内一次性创建，创建后明细不可变更

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{DeliveryMethod, OrderStatus};

/// 兑换订单
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    /// 订单号（对外展示）
    pub order_no: String,
    /// 买家用户 ID
    pub user_id: String,
    pub status: OrderStatus,
    /// 订单总积分，始终等于下单扣减流水的绝对值
    pub total_points: i64,
    pub delivery_method: DeliveryMethod,
    /// 收货人（配送单必填）
    #[sqlx(default)]
    pub recipient_name: Option<String>,
    #[sqlx(default)]
    pub recipient_phone: Option<String>,
    #[sqlx(default)]
    pub recipient_address: Option<String>,
    /// 运单号（发货后由运营填写）
    #[sqlx(default)]
    pub tracking_number: Option<String>,
    #[sqlx(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待创建的订单
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_no: String,
    pub user_id: String,
    pub total_points: i64,
    pub delivery_method: DeliveryMethod,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub recipient_address: Option<String>,
    pub notes: Option<String>,
}

/// 订单明细
///
/// 商品与规格名称冗余快照，商品后续改名不影响历史订单
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    #[sqlx(default)]
    pub variant_id: Option<i64>,
    pub product_name: String,
    #[sqlx(default)]
    pub variant_name: Option<String>,
    /// 数量（> 0）
    pub quantity: i32,
    /// 单件积分
    pub points_per_item: i64,
    /// 小计 = points_per_item * quantity
    pub total_points: i64,
}

/// 待创建的订单明细
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub points_per_item: i64,
}

impl NewOrderItem {
    /// 行小计
    pub fn total_points(&self) -> i64 {
        self.points_per_item * self.quantity as i64
    }
}

/// 订单导出行（每条订单明细一行，带订单上下文）
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderExportRow {
    pub order_no: String,
    pub user_id: String,
    pub email: String,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub points_per_item: i64,
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}
