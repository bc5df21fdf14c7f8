//! 积分调整服务
//!
//! 管理员手工调整单个用户积分，以及按 CSV 文件批量调整。
//!
//! ## 批量导入流程
//!
//! 1. 字节流解析为行（容忍 CRLF/LF/CR 与 RFC4180 引号）
//! 2. 识别并剥离表头
//! 3. 逐行校验 -> 按邮箱定位用户 -> 追加流水
//! 4. 单行失败记入明细并继续，任何一行的失败都不会中止批次
//!
//! 行号按文件中的非空行从 1 计数，表头占第 1 行，
//! 失败明细里的行号与运营拿到的原始文件对得上。

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::csv::{self, CsvRow};
use crate::error::{MallError, Result};
use crate::models::{DEFAULT_BULK_REASON, NewLedgerEntry};
use crate::notification::NotificationSender;
use crate::repository::{LedgerRepositoryTrait, ProfileRepositoryTrait};
use crate::service::dto::{
    AdjustPointsRequest, AdjustPointsResponse, BulkImportReport, ImportRowFailure,
};

/// 积分调整服务
pub struct AdjustmentService<P, L>
where
    P: ProfileRepositoryTrait,
    L: LedgerRepositoryTrait,
{
    profile_repo: Arc<P>,
    ledger_repo: Arc<L>,
    sender: NotificationSender,
}

impl<P, L> AdjustmentService<P, L>
where
    P: ProfileRepositoryTrait,
    L: LedgerRepositoryTrait,
{
    pub fn new(profile_repo: Arc<P>, ledger_repo: Arc<L>, sender: NotificationSender) -> Self {
        Self {
            profile_repo,
            ledger_repo,
            sender,
        }
    }

    /// 手工调整单个用户的积分
    #[instrument(skip(self, request), fields(user_id = %request.user_id, delta = request.delta_points))]
    pub async fn adjust_points(&self, request: AdjustPointsRequest) -> Result<AdjustPointsResponse> {
        request
            .validate()
            .map_err(|e| MallError::Validation(e.to_string()))?;

        let profile = self
            .profile_repo
            .find_by_id(&request.user_id)
            .await?
            .ok_or_else(|| MallError::UserNotFound(request.user_id.clone()))?;

        let entry = NewLedgerEntry::manual(
            &request.user_id,
            request.delta_points,
            &request.reason,
            &request.operator,
        );
        entry.validate()?;

        let entry_id = self.ledger_repo.create(&entry).await?;
        let balance_after = self.ledger_repo.get_balance(&request.user_id).await?;

        self.sender.notify_points_adjusted(
            &profile.email,
            request.delta_points,
            &request.reason,
            balance_after,
        );

        info!(
            user_id = %request.user_id,
            entry_id = entry_id,
            delta = request.delta_points,
            balance_after = balance_after,
            "手工积分调整完成"
        );

        Ok(AdjustPointsResponse {
            entry_id,
            user_id: request.user_id,
            delta_points: request.delta_points,
            balance_after,
        })
    }

    /// 批量积分导入
    ///
    /// 每行格式 `email,delta_points[,reason]`，原因缺省为
    /// [`DEFAULT_BULK_REASON`]。校验、定位用户、落库任何一步失败都
    /// 只记入该行的失败明细，批次继续处理后续行，绝不整体上抛。
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn import_points_csv(&self, bytes: &[u8], operator: &str) -> Result<BulkImportReport> {
        let rows = csv::strip_header(csv::parse(bytes));

        let total = rows.len();
        let mut successful = 0usize;
        let mut failures = Vec::new();

        for row in &rows {
            let email = row
                .fields
                .first()
                .map(|f| f.trim().to_string())
                .unwrap_or_default();

            match self.apply_row(row, operator).await {
                Ok(()) => successful += 1,
                Err(e) => {
                    failures.push(ImportRowFailure {
                        row: row.line_no,
                        email,
                        error: e.to_string(),
                    });
                }
            }
        }

        let report = BulkImportReport {
            total,
            successful,
            failed: failures.len(),
            failures,
        };

        info!(
            total = report.total,
            successful = report.successful,
            failed = report.failed,
            "批量积分导入完成"
        );

        Ok(report)
    }

    // ==================== 私有方法 ====================

    /// 处理单行：校验 -> 定位用户 -> 追加流水
    async fn apply_row(&self, row: &CsvRow, operator: &str) -> Result<()> {
        if row.fields.len() < 2 {
            return Err(MallError::Validation(
                "行格式错误: 至少需要邮箱和积分两列".to_string(),
            ));
        }

        let email = row.fields[0].trim();
        if email.is_empty() || !email.contains('@') {
            return Err(MallError::Validation(format!("邮箱格式非法: {email}")));
        }

        let delta_raw = row.fields[1].trim();
        let delta_points: i64 = delta_raw
            .parse()
            .map_err(|_| MallError::Validation(format!("积分数值非法: {delta_raw}")))?;
        if delta_points == 0 {
            return Err(MallError::Validation("积分变动不能为 0".to_string()));
        }

        let reason = row
            .fields
            .get(2)
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_BULK_REASON);

        let profile = self
            .profile_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| MallError::UserNotFound(email.to_string()))?;

        let entry = NewLedgerEntry::manual(&profile.id, delta_points, reason, operator);
        self.ledger_repo.create(&entry).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mall_shared::config::NotificationConfig;

    use crate::models::Profile;
    use crate::notification::LogNotifier;
    use crate::repository::{MockLedgerRepositoryTrait, MockProfileRepositoryTrait};

    fn test_profile(id: &str, email: &str) -> Profile {
        Profile {
            id: id.to_string(),
            email: email.to_string(),
            full_name: None,
            created_at: Utc::now(),
        }
    }

    fn silent_sender() -> NotificationSender {
        NotificationSender::new(
            Arc::new(LogNotifier),
            NotificationConfig {
                enabled: false,
                admin_recipients: vec![],
                from_name: "积分商城".to_string(),
            },
        )
    }

    fn service(
        profiles: MockProfileRepositoryTrait,
        ledger: MockLedgerRepositoryTrait,
    ) -> AdjustmentService<MockProfileRepositoryTrait, MockLedgerRepositoryTrait> {
        AdjustmentService::new(Arc::new(profiles), Arc::new(ledger), silent_sender())
    }

    #[tokio::test]
    async fn test_adjust_points_success() {
        let mut profiles = MockProfileRepositoryTrait::new();
        profiles
            .expect_find_by_id()
            .returning(|_| Ok(Some(test_profile("user-1", "u1@example.com"))));

        let mut ledger = MockLedgerRepositoryTrait::new();
        ledger.expect_create().returning(|_| Ok(7));
        ledger.expect_get_balance().returning(|_| Ok(1100));

        let response = service(profiles, ledger)
            .adjust_points(AdjustPointsRequest {
                user_id: "user-1".to_string(),
                delta_points: 100,
                reason: "活动奖励".to_string(),
                operator: "admin-1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.entry_id, 7);
        assert_eq!(response.balance_after, 1100);
    }

    #[tokio::test]
    async fn test_adjust_points_unknown_user() {
        let mut profiles = MockProfileRepositoryTrait::new();
        profiles.expect_find_by_id().returning(|_| Ok(None));

        let mut ledger = MockLedgerRepositoryTrait::new();
        ledger.expect_create().times(0);

        let result = service(profiles, ledger)
            .adjust_points(AdjustPointsRequest {
                user_id: "ghost".to_string(),
                delta_points: 100,
                reason: "活动奖励".to_string(),
                operator: "admin-1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(MallError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_adjust_points_rejects_zero_delta() {
        let mut profiles = MockProfileRepositoryTrait::new();
        profiles
            .expect_find_by_id()
            .returning(|_| Ok(Some(test_profile("user-1", "u1@example.com"))));

        let mut ledger = MockLedgerRepositoryTrait::new();
        ledger.expect_create().times(0);

        let result = service(profiles, ledger)
            .adjust_points(AdjustPointsRequest {
                user_id: "user-1".to_string(),
                delta_points: 0,
                reason: "无效".to_string(),
                operator: "admin-1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(MallError::Validation(_))));
    }

    #[tokio::test]
    async fn test_import_partial_failure_keeps_row_numbers() {
        // 5 行数据，无表头：第 3 行邮箱非法，第 5 行积分为 0
        let input = "ok1@example.com,100,活动奖励\nok2@example.com,-50\nbad-email,100\nok3@example.com,25\nok4@example.com,0\n"
            .as_bytes();

        let mut profiles = MockProfileRepositoryTrait::new();
        profiles.expect_find_by_email().times(3).returning(|email| {
            let id = email.split('@').next().unwrap_or("user").to_string();
            Ok(Some(test_profile(&id, email)))
        });

        let mut ledger = MockLedgerRepositoryTrait::new();
        ledger.expect_create().times(3).returning(|_| Ok(1));

        let report = service(profiles, ledger)
            .import_points_csv(input, "admin-1")
            .await
            .unwrap();

        assert_eq!(report.total, 5);
        assert_eq!(report.successful, 3);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failures[0].row, 3);
        assert_eq!(report.failures[0].email, "bad-email");
        assert_eq!(report.failures[1].row, 5);
    }

    #[tokio::test]
    async fn test_import_header_shifts_row_numbers() {
        let input = "email,points,reason\nok1@example.com,100\nghost@example.com,50\n".as_bytes();

        let mut profiles = MockProfileRepositoryTrait::new();
        profiles.expect_find_by_email().returning(|email| {
            if email.starts_with("ghost") {
                Ok(None)
            } else {
                Ok(Some(test_profile("user-1", email)))
            }
        });

        let mut ledger = MockLedgerRepositoryTrait::new();
        ledger.expect_create().times(1).returning(|_| Ok(1));

        let report = service(profiles, ledger)
            .import_points_csv(input, "admin-1")
            .await
            .unwrap();

        // 表头占第 1 行，数据从第 2 行开始
        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 1);
        assert_eq!(report.failures[0].row, 3);
        assert!(report.failures[0].error.contains("用户不存在"));
    }

    #[tokio::test]
    async fn test_import_empty_file() {
        let profiles = MockProfileRepositoryTrait::new();
        let ledger = MockLedgerRepositoryTrait::new();

        let report = service(profiles, ledger)
            .import_points_csv(b"", "admin-1")
            .await
            .unwrap();

        assert_eq!(report.total, 0);
        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_import_defaults_reason_and_keeps_quoted_comma() {
        let input =
            "ok1@example.com,10\nok2@example.com,20,\"补发,活动\"\n".as_bytes();

        let mut profiles = MockProfileRepositoryTrait::new();
        profiles.expect_find_by_email().returning(|email| {
            Ok(Some(test_profile("user-x", email)))
        });

        let mut ledger = MockLedgerRepositoryTrait::new();
        ledger
            .expect_create()
            .withf(|entry| entry.delta_points == 10 && entry.reason == DEFAULT_BULK_REASON)
            .times(1)
            .returning(|_| Ok(1));
        ledger
            .expect_create()
            .withf(|entry| entry.delta_points == 20 && entry.reason == "补发,活动")
            .times(1)
            .returning(|_| Ok(2));

        let report = service(profiles, ledger)
            .import_points_csv(input, "admin-1")
            .await
            .unwrap();

        assert_eq!(report.successful, 2);
    }

    #[tokio::test]
    async fn test_import_records_database_error_and_continues() {
        let input = "down@example.com,100\nok2@example.com,50\n".as_bytes();

        let mut profiles = MockProfileRepositoryTrait::new();
        profiles.expect_find_by_email().returning(|email| {
            if email.starts_with("down") {
                Err(MallError::Database(sqlx::Error::PoolClosed))
            } else {
                Ok(Some(test_profile("user-2", email)))
            }
        });

        let mut ledger = MockLedgerRepositoryTrait::new();
        ledger.expect_create().times(1).returning(|_| Ok(1));

        let report = service(profiles, ledger)
            .import_points_csv(input, "admin-1")
            .await
            .unwrap();

        // 落库失败同样只记入该行明细，后续行照常处理
        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].row, 1);
        assert!(report.failures[0].error.contains("数据库错误"));
    }
}
