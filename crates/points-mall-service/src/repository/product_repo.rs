//! 商品与规格仓储
//!
//! 库存增减全部走条件 UPDATE，由数据库保证不会超卖，
//! 应用层绝不做读改写。

use sqlx::PgPool;
use tracing::instrument;

use crate::error::Result;
use crate::models::{Product, ProductVariant};

/// 商品仓储实现
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按 ID 查询商品
    pub async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, base_price_usd, active, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// 按 ID 查询规格
    pub async fn get_variant(&self, variant_id: i64) -> Result<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, name, price_adjustment_usd, inventory_count,
                   active, created_at, updated_at
            FROM product_variants
            WHERE id = $1
            "#,
        )
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// 在结算事务中扣减库存
    ///
    /// 条件 UPDATE：库存足够才扣，返回 false 表示库存不足（或规格不限量，
    /// 调用方对不限量规格不应调用本方法）。
    #[instrument(skip(tx))]
    pub async fn decrement_inventory_in_tx(
        tx: &mut sqlx::PgConnection,
        variant_id: i64,
        quantity: i32,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE product_variants
            SET inventory_count = inventory_count - $2, updated_at = NOW()
            WHERE id = $1
              AND inventory_count IS NOT NULL
              AND inventory_count >= $2
            "#,
        )
        .bind(variant_id)
        .bind(quantity)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 退货回补库存
    ///
    /// 不限量规格（inventory_count 为 NULL）无需回补，返回 false。
    pub async fn increment_inventory(&self, variant_id: i64, quantity: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE product_variants
            SET inventory_count = inventory_count + $2, updated_at = NOW()
            WHERE id = $1 AND inventory_count IS NOT NULL
            "#,
        )
        .bind(variant_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
