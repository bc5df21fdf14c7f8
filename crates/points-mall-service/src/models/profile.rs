//! 用户档案实体
//!
//! 档案由上游账号体系维护，这里只做按 ID / 邮箱的只读查询

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户档案
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    #[sqlx(default)]
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
