//! 积分账本实体定义
//!
//! 账本是余额的唯一事实来源：只追加、不更新、不删除，
//! 余额永远由流水求和得出，不单独落库。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::LedgerEntryKind;
use crate::error::{MallError, Result};

/// 批量导入未填写原因时的默认值
pub const DEFAULT_BULK_REASON: &str = "批量积分调整";

/// 积分流水（一经写入不可变更）
///
/// 修正错误记录的方式是追加一条反向流水，而非修改原记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointsLedgerEntry {
    pub id: i64,
    /// 用户 ID
    pub user_id: String,
    /// 积分变动（带符号，非零）
    pub delta_points: i64,
    /// 变动原因
    pub reason: String,
    /// 关联订单 ID（仅回溯用，不构成所有权）
    #[sqlx(default)]
    pub order_id: Option<i64>,
    /// 操作人
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl PointsLedgerEntry {
    /// 是否为收入流水
    pub fn is_earned(&self) -> bool {
        self.delta_points > 0
    }
}

/// 待写入的流水
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: String,
    pub delta_points: i64,
    pub reason: String,
    pub order_id: Option<i64>,
    pub created_by: String,
}

impl NewLedgerEntry {
    /// 手动调整流水
    pub fn manual(
        user_id: impl Into<String>,
        delta_points: i64,
        reason: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            delta_points,
            reason: reason.into(),
            order_id: None,
            created_by: operator.into(),
        }
    }

    /// 下单扣减流水（负向），操作人即买家本人
    pub fn order_debit(user_id: impl Into<String>, total_points: i64, order_id: i64, order_no: &str) -> Self {
        let user_id = user_id.into();
        Self {
            user_id: user_id.clone(),
            delta_points: -total_points,
            reason: format!("积分兑换订单 {}", order_no),
            order_id: Some(order_id),
            created_by: user_id,
        }
    }

    /// 退款返还流水（正向）
    pub fn order_refund(
        user_id: impl Into<String>,
        total_points: i64,
        order_id: i64,
        order_no: &str,
        with_return: bool,
        operator: impl Into<String>,
    ) -> Self {
        let reason = if with_return {
            format!("订单退款（含退货）: {}", order_no)
        } else {
            format!("订单退款: {}", order_no)
        };
        Self {
            user_id: user_id.into(),
            delta_points: total_points,
            reason,
            order_id: Some(order_id),
            created_by: operator.into(),
        }
    }

    /// 写入前校验：变动非零、原因非空
    pub fn validate(&self) -> Result<()> {
        if self.delta_points == 0 {
            return Err(MallError::Validation("积分变动不能为 0".to_string()));
        }
        if self.reason.trim().is_empty() {
            return Err(MallError::Validation("变动原因不能为空".to_string()));
        }
        Ok(())
    }
}

/// 积分流水查询条件，所有维度可选，未给出的维度不参与过滤
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFilter {
    pub user_id: Option<String>,
    /// 起始时间（含）
    pub start_time: Option<DateTime<Utc>>,
    /// 截止时间（含）
    pub end_time: Option<DateTime<Utc>>,
    pub min_delta: Option<i64>,
    pub max_delta: Option<i64>,
    /// 原因关键字，模糊匹配
    pub reason_contains: Option<String>,
    /// 按收支方向过滤
    pub kind: Option<LedgerEntryKind>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for LedgerFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            start_time: None,
            end_time: None,
            min_delta: None,
            max_delta: None,
            reason_contains: None,
            kind: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl LedgerFilter {
    /// 页大小钳制到 1..=200
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

/// 积分流水导出行
///
/// 关联 profiles 取邮箱，与批量导入用同一套用户标识口径
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LedgerExportRow {
    pub id: i64,
    pub user_id: String,
    pub email: String,
    pub delta_points: i64,
    pub reason: String,
    pub order_id: Option<i64>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
