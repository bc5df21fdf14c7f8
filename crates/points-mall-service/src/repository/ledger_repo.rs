//! 积分流水仓储
//!
//! 流水表只追加、不更新、不删除，余额永远是对 delta_points 的实时求和。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use super::traits::LedgerRepositoryTrait;
use crate::error::Result;
use crate::models::{LedgerEntryKind, LedgerExportRow, LedgerFilter, NewLedgerEntry, PointsLedgerEntry};

/// 积分流水仓储实现
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 追加一条流水记录
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, delta = entry.delta_points))]
    pub async fn create(&self, entry: &NewLedgerEntry) -> Result<i64> {
        entry.validate()?;

        let row = sqlx::query(
            r#"
            INSERT INTO points_ledger (user_id, delta_points, reason, order_id, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&entry.user_id)
        .bind(entry.delta_points)
        .bind(&entry.reason)
        .bind(entry.order_id)
        .bind(&entry.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    /// 在事务中追加流水（用于订单结算、退款）
    pub async fn create_in_tx(tx: &mut sqlx::PgConnection, entry: &NewLedgerEntry) -> Result<i64> {
        entry.validate()?;

        let row = sqlx::query(
            r#"
            INSERT INTO points_ledger (user_id, delta_points, reason, order_id, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&entry.user_id)
        .bind(entry.delta_points)
        .bind(&entry.reason)
        .bind(entry.order_id)
        .bind(&entry.created_by)
        .fetch_one(tx)
        .await?;

        Ok(row.get("id"))
    }

    /// 查询用户当前余额
    ///
    /// SUM(BIGINT) 在 PostgreSQL 中返回 NUMERIC，必须显式转回 BIGINT。
    pub async fn get_balance(&self, user_id: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(delta_points), 0)::BIGINT AS balance
            FROM points_ledger
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("balance"))
    }

    /// 在事务中查询余额（配合 profiles 行锁使用，保证扣减前读到的余额不过期）
    pub async fn get_balance_in_tx(tx: &mut sqlx::PgConnection, user_id: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(delta_points), 0)::BIGINT AS balance
            FROM points_ledger
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(tx)
        .await?;

        Ok(row.get("balance"))
    }

    /// 指定订单是否已有正向流水（即已退款）
    pub async fn has_refund_entry(&self, order_id: i64) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM points_ledger
                WHERE order_id = $1 AND delta_points > 0
            ) AS has_refund
            "#,
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("has_refund"))
    }

    /// 事务内版本，用于退款流程在订单行锁内做幂等检查
    pub async fn has_refund_entry_in_tx(tx: &mut sqlx::PgConnection, order_id: i64) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM points_ledger
                WHERE order_id = $1 AND delta_points > 0
            ) AS has_refund
            "#,
        )
        .bind(order_id)
        .fetch_one(tx)
        .await?;

        Ok(row.get("has_refund"))
    }

    /// 多条件分页查询
    ///
    /// 所有条件都用 `($n IS NULL OR ...)` 形式下推到 SQL，
    /// 未给出的维度由数据库直接短路，避免在应用层拼接 SQL。
    #[instrument(skip(self, filter))]
    pub async fn list_filtered(
        &self,
        filter: &LedgerFilter,
    ) -> Result<(i64, Vec<PointsLedgerEntry>)> {
        let earned = filter
            .kind
            .map(|kind| matches!(kind, LedgerEntryKind::Earned));
        let reason_keyword = filter.reason_contains.as_deref();

        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM points_ledger
            WHERE ($1::TEXT IS NULL OR user_id = $1)
              AND ($2::TIMESTAMPTZ IS NULL OR created_at >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at <= $3)
              AND ($4::BIGINT IS NULL OR delta_points >= $4)
              AND ($5::BIGINT IS NULL OR delta_points <= $5)
              AND ($6::TEXT IS NULL OR reason ILIKE '%' || $6 || '%')
              AND ($7::BOOLEAN IS NULL
                   OR CASE WHEN $7 THEN delta_points > 0 ELSE delta_points < 0 END)
            "#,
        )
        .bind(filter.user_id.as_deref())
        .bind(filter.start_time)
        .bind(filter.end_time)
        .bind(filter.min_delta)
        .bind(filter.max_delta)
        .bind(reason_keyword)
        .bind(earned)
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = count_row.get("total");

        let entries = sqlx::query_as::<_, PointsLedgerEntry>(
            r#"
            SELECT id, user_id, delta_points, reason, order_id, created_by, created_at
            FROM points_ledger
            WHERE ($1::TEXT IS NULL OR user_id = $1)
              AND ($2::TIMESTAMPTZ IS NULL OR created_at >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at <= $3)
              AND ($4::BIGINT IS NULL OR delta_points >= $4)
              AND ($5::BIGINT IS NULL OR delta_points <= $5)
              AND ($6::TEXT IS NULL OR reason ILIKE '%' || $6 || '%')
              AND ($7::BOOLEAN IS NULL
                   OR CASE WHEN $7 THEN delta_points > 0 ELSE delta_points < 0 END)
            ORDER BY created_at DESC, id DESC
            LIMIT $8 OFFSET $9
            "#,
        )
        .bind(filter.user_id.as_deref())
        .bind(filter.start_time)
        .bind(filter.end_time)
        .bind(filter.min_delta)
        .bind(filter.max_delta)
        .bind(reason_keyword)
        .bind(earned)
        .bind(filter.limit())
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((total, entries))
    }

    /// 导出窗口内的全部流水，按发生时间升序，联表取邮箱
    pub async fn list_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerExportRow>> {
        let rows = sqlx::query_as::<_, LedgerExportRow>(
            r#"
            SELECT l.id, l.user_id, p.email, l.delta_points, l.reason,
                   l.order_id, l.created_by, l.created_at
            FROM points_ledger l
            JOIN profiles p ON p.id = l.user_id
            WHERE l.created_at >= $1 AND l.created_at < $2
            ORDER BY l.created_at ASC, l.id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    async fn create(&self, entry: &NewLedgerEntry) -> Result<i64> {
        self.create(entry).await
    }

    async fn get_balance(&self, user_id: &str) -> Result<i64> {
        self.get_balance(user_id).await
    }

    async fn has_refund_entry(&self, order_id: i64) -> Result<bool> {
        self.has_refund_entry(order_id).await
    }

    async fn list_filtered(
        &self,
        filter: &LedgerFilter,
    ) -> Result<(i64, Vec<PointsLedgerEntry>)> {
        self.list_filtered(filter).await
    }
}
