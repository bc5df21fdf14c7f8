//! 商品与规格实体定义

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 商品
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 基础价格（美元），计价时乘积分汇率
    pub base_price_usd: Decimal,
    /// 是否在架
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 商品规格
///
/// 库存记在规格上；inventory_count 为 NULL 表示不限量
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    /// 规格价差（美元，可为负）
    pub price_adjustment_usd: Decimal,
    /// 库存（NULL = 不限量；永不为负，只在结算内扣减、退货内回补）
    #[sqlx(default)]
    pub inventory_count: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// 库存是否足以覆盖请求数量（不限量视为充足）
    pub fn has_inventory_for(&self, quantity: i32) -> bool {
        match self.inventory_count {
            Some(count) => count >= quantity,
            None => true,
        }
    }
}
