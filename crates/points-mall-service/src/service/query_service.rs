//! 积分查询服务
//!
//! 余额与流水的只读查询。余额永远是流水实时求和，
//! 没有任何流水的用户余额为 0，不是错误。

use std::sync::Arc;

use crate::error::Result;
use crate::models::LedgerFilter;
use crate::repository::LedgerRepository;
use crate::service::dto::LedgerPage;

/// 积分查询服务
pub struct QueryService {
    ledger_repo: Arc<LedgerRepository>,
}

impl QueryService {
    pub fn new(ledger_repo: Arc<LedgerRepository>) -> Self {
        Self { ledger_repo }
    }

    /// 用户当前余额
    pub async fn balance_of(&self, user_id: &str) -> Result<i64> {
        self.ledger_repo.get_balance(user_id).await
    }

    /// 多条件分页查询流水
    pub async fn list_ledger(&self, filter: &LedgerFilter) -> Result<LedgerPage> {
        let (total, entries) = self.ledger_repo.list_filtered(filter).await?;

        Ok(LedgerPage {
            total,
            page: filter.page.max(1),
            page_size: filter.limit(),
            entries,
        })
    }
}
