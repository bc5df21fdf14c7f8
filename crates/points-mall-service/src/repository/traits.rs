//! 仓储 trait 定义
//!
//! 服务层对档案与流水仓储的依赖通过 trait 注入，
//! 便于在单元测试中用 mockall 替换真实数据库。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{LedgerFilter, NewLedgerEntry, PointsLedgerEntry, Profile};

/// 用户档案仓储接口
///
/// 档案数据由上游账号体系写入，本服务只读。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepositoryTrait: Send + Sync {
    /// 按用户 ID 查询档案
    async fn find_by_id(&self, user_id: &str) -> Result<Option<Profile>>;

    /// 按邮箱查询档案（忽略大小写）
    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>>;
}

/// 积分流水仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// 追加一条流水，返回新记录 ID
    async fn create(&self, entry: &NewLedgerEntry) -> Result<i64>;

    /// 当前余额（全量流水求和，无流水时为 0）
    async fn get_balance(&self, user_id: &str) -> Result<i64>;

    /// 指定订单是否已存在正向（退款）流水
    async fn has_refund_entry(&self, order_id: i64) -> Result<bool>;

    /// 多条件分页查询，返回（总数，当前页记录）
    async fn list_filtered(&self, filter: &LedgerFilter)
    -> Result<(i64, Vec<PointsLedgerEntry>)>;
}
