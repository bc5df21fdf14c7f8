//! 用户档案仓储
//!
//! 档案由上游账号体系维护，本服务只读；
//! 结算事务通过档案行锁串行化同一用户的并发下单。

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::ProfileRepositoryTrait;
use crate::error::Result;
use crate::models::Profile;

/// 用户档案仓储实现
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按用户 ID 查询档案
    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, full_name, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// 按邮箱查询档案，忽略大小写（批量导入按邮箱定位用户）
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, full_name, created_at
            FROM profiles
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// 在事务中锁定用户档案行
    ///
    /// 同一用户的并发结算在此排队，锁内读到的余额直到提交都不会被
    /// 其他结算事务改写。返回 false 表示用户不存在。
    pub async fn lock_in_tx(tx: &mut sqlx::PgConnection, user_id: &str) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT id FROM profiles WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(tx)
        .await?;

        Ok(row.is_some())
    }
}

#[async_trait]
impl ProfileRepositoryTrait for ProfileRepository {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<Profile>> {
        self.find_by_id(user_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>> {
        self.find_by_email(email).await
    }
}
