//! 导出服务
//!
//! 把指定月份（或跨月区间）的订单明细/积分流水快照成 CSV 文件，
//! 写入存储后换取带时效的下载链接，并留档导出记录。
//!
//! ## 导出流程
//!
//! 1. 月份参数严格校验（YYYY-MM） -> 2. 计算 UTC 半开窗口
//!    -> 3. 拉取窗口内全部行（升序） -> 4. 零行即 `NoExportData`
//!    -> 5. CSV 序列化 -> 6. 写存储、签发链接 -> 7. 留档元数据
//!
//! 行数与字节数在生成时刻快照入档，之后不再重算。

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mall_shared::config::ExportConfig;
use tracing::{info, instrument};

use crate::csv;
use crate::error::{MallError, Result};
use crate::models::{ExportRecord, ExportType, NewExportRecord};
use crate::repository::{ExportRepository, LedgerRepository, OrderRepository};
use crate::service::dto::ExportResult;
use crate::storage::ExportStorage;

/// 导出服务
pub struct ExportService<S>
where
    S: ExportStorage,
{
    ledger_repo: Arc<LedgerRepository>,
    order_repo: Arc<OrderRepository>,
    export_repo: Arc<ExportRepository>,
    storage: Arc<S>,
    config: ExportConfig,
}

impl<S> ExportService<S>
where
    S: ExportStorage,
{
    pub fn new(
        ledger_repo: Arc<LedgerRepository>,
        order_repo: Arc<OrderRepository>,
        export_repo: Arc<ExportRepository>,
        storage: Arc<S>,
        config: ExportConfig,
    ) -> Self {
        Self {
            ledger_repo,
            order_repo,
            export_repo,
            storage,
            config,
        }
    }

    /// 单月导出
    ///
    /// 窗口为 `[月初, 下月初)`，UTC。区间内零行返回 [`MallError::NoExportData`]。
    #[instrument(skip(self), fields(export_type = ?export_type, month = %month))]
    pub async fn export_monthly(
        &self,
        export_type: ExportType,
        month: &str,
        operator: &str,
    ) -> Result<ExportResult> {
        let (start, end) = month_range(month)?;
        self.generate(export_type, month, start, end, operator).await
    }

    /// 跨月合并导出
    ///
    /// 窗口为 `[起始月初, 结束月的下月初)`。区间次序由调用方保证，
    /// 这里不重排：end 早于 start 时窗口为空，结果就是 `NoExportData`。
    #[instrument(skip(self), fields(export_type = ?export_type, start_month = %start_month, end_month = %end_month))]
    pub async fn export_combined(
        &self,
        export_type: ExportType,
        start_month: &str,
        end_month: &str,
        operator: &str,
    ) -> Result<ExportResult> {
        let (start, _) = month_range(start_month)?;
        let (_, end) = month_range(end_month)?;
        let label = format!("{start_month}_{end_month}");

        self.generate(export_type, &label, start, end, operator).await
    }

    /// 查询单条导出记录
    pub async fn get_export(&self, export_id: i64) -> Result<ExportRecord> {
        self.export_repo
            .get(export_id)
            .await?
            .ok_or(MallError::ExportNotFound(export_id))
    }

    /// 最近的导出记录
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ExportRecord>> {
        self.export_repo.list_recent(limit).await
    }

    // ==================== 私有方法 ====================

    /// 生成并留档一次导出
    async fn generate(
        &self,
        export_type: ExportType,
        label: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        operator: &str,
    ) -> Result<ExportResult> {
        // 拉取窗口内全部行并序列化；零行是业务结果而非故障
        let (bytes, row_count) = match export_type {
            ExportType::Orders => {
                let rows = self.order_repo.list_created_between(start, end).await?;
                if rows.is_empty() {
                    return Err(MallError::NoExportData);
                }
                (csv::write_order_rows(&rows)?, rows.len())
            }
            ExportType::Points => {
                let rows = self.ledger_repo.list_created_between(start, end).await?;
                if rows.is_empty() {
                    return Err(MallError::NoExportData);
                }
                (csv::write_ledger_rows(&rows)?, rows.len())
            }
        };

        let file_name = build_export_file_name(export_type, label);
        let byte_size = bytes.len() as i64;
        let ttl = self.config.signed_url_ttl_seconds;

        self.storage.put(&file_name, bytes).await?;
        let download_url = self.storage.signed_url(&file_name, ttl).await?;

        let record = NewExportRecord {
            export_type,
            period_label: label.to_string(),
            file_name: file_name.clone(),
            row_count: row_count as i64,
            byte_size,
            created_by: operator.to_string(),
        };
        let export_id = self.export_repo.create(&record).await?;

        info!(
            export_id = export_id,
            file_name = %file_name,
            row_count = row_count,
            byte_size = byte_size,
            "导出文件生成完成"
        );

        Ok(ExportResult {
            export_id,
            file_name,
            row_count: row_count as i64,
            byte_size,
            download_url,
            expires_in_seconds: ttl,
            generated_at: Utc::now(),
        })
    }
}

/// 解析 `YYYY-MM` 并计算 UTC 半开窗口 `[月初, 下月初)`
///
/// 只接受四位年-两位月的字面形状，其余一律拒绝。
fn month_range(month: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = || MallError::Validation(format!("月份格式必须为 YYYY-MM: {month}"));

    let (year_part, month_part) = month.split_once('-').ok_or_else(invalid)?;
    if year_part.len() != 4
        || month_part.len() != 2
        || !year_part.chars().all(|c| c.is_ascii_digit())
        || !month_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let year: i32 = year_part.parse().map_err(|_| invalid())?;
    let month_num: u32 = month_part.parse().map_err(|_| invalid())?;

    // 非法月份（00、13 等）由日历构造兜底拒绝
    let start_date = NaiveDate::from_ymd_opt(year, month_num, 1).ok_or_else(invalid)?;
    let next_date = if month_num == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_num + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok((
        start_date.and_time(NaiveTime::MIN).and_utc(),
        next_date.and_time(NaiveTime::MIN).and_utc(),
    ))
}

/// 生成导出文件名：类型前缀 + 区间标签 + 生成时间戳
///
/// 同一区间多次导出靠时间戳区分，不会互相覆盖。
fn build_export_file_name(export_type: ExportType, label: &str) -> String {
    format!(
        "{}_{}_{}.csv",
        export_type.file_prefix(),
        label,
        Utc::now().format("%Y%m%d%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_month_range_regular_month() {
        let (start, end) = month_range("2025-02").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_range_december_rolls_to_next_year() {
        let (start, end) = month_range("2025-12").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_range_leap_february() {
        // 闰年二月窗口同样是 [02-01, 03-01)，2 月 29 日自然包含在内
        let (start, end) = month_range("2024-02").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_range_rejects_malformed_input() {
        for bad in [
            "2025-2", "25-02", "2025/02", "2025-13", "2025-00", "abcd-ef", "2025-02-03", "",
            "2025-", "-02", "２025-02",
        ] {
            assert!(month_range(bad).is_err(), "应当拒绝输入: {bad:?}");
        }
    }

    #[test]
    fn test_export_file_name_shape() {
        let name = build_export_file_name(ExportType::Orders, "2025-01");
        assert!(name.starts_with("orders_2025-01_"));
        assert!(name.ends_with(".csv"));

        let name = build_export_file_name(ExportType::Points, "2025-01_2025-03");
        assert!(name.starts_with("points_2025-01_2025-03_"));
    }
}
