//! 导出记录实体定义
//!
//! 每次导出生成时落一条元数据：行数与字节数在生成时刻采集，之后不再重算

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::ExportType;

/// 导出记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: i64,
    pub export_type: ExportType,
    /// 周期标签，如 "2025-02" 或 "2025-01_2025-03"
    pub period_label: String,
    pub file_name: String,
    pub row_count: i64,
    pub byte_size: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// 待写入的导出记录
#[derive(Debug, Clone)]
pub struct NewExportRecord {
    pub export_type: ExportType,
    pub period_label: String,
    pub file_name: String,
    pub row_count: i64,
    pub byte_size: i64,
    pub created_by: String,
}
