//! 导出记录仓储
//!
//! 每次成功生成导出文件都会留档一条记录，行数与字节数在生成时快照。

use sqlx::{PgPool, Row};

use crate::error::Result;
use crate::models::{ExportRecord, NewExportRecord};

/// 导出记录仓储实现
#[derive(Clone)]
pub struct ExportRepository {
    pool: PgPool,
}

impl ExportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 留档一次导出，返回记录 ID
    pub async fn create(&self, record: &NewExportRecord) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO point_exports (export_type, period_label, file_name,
                                       row_count, byte_size, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(record.export_type)
        .bind(&record.period_label)
        .bind(&record.file_name)
        .bind(record.row_count)
        .bind(record.byte_size)
        .bind(&record.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    /// 按 ID 查询导出记录
    pub async fn get(&self, export_id: i64) -> Result<Option<ExportRecord>> {
        let record = sqlx::query_as::<_, ExportRecord>(
            r#"
            SELECT id, export_type, period_label, file_name, row_count,
                   byte_size, created_by, created_at
            FROM point_exports
            WHERE id = $1
            "#,
        )
        .bind(export_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// 最近的导出记录，按生成时间倒序
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ExportRecord>> {
        let records = sqlx::query_as::<_, ExportRecord>(
            r#"
            SELECT id, export_type, period_label, file_name, row_count,
                   byte_size, created_by, created_at
            FROM point_exports
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
