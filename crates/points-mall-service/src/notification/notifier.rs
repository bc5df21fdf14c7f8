//! 通知投递渠道
//!
//! 定义投递 trait 并提供日志渠道实现。
//! 当前为模拟实现，生产环境需要接入真实的邮件服务（如 SendGrid、AWS SES）。

use async_trait::async_trait;
use tracing::info;

use super::types::Notification;
use crate::error::Result;

/// 通知投递接口
///
/// 实现应当是无状态的，便于并发调用。
/// 投递失败返回 Err，由发送器记录日志，不会传播到业务流程。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 投递一封通知
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// 日志投递渠道
///
/// 把通知内容写进结构化日志，用于开发环境和集成测试。
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        // 模拟投递耗时
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        info!(
            notification_id = %notification.notification_id,
            recipients = ?notification.recipients,
            title = %notification.title,
            body = %notification.body,
            "通知已投递"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_delivers() {
        let notifier = LogNotifier;
        let notification = Notification::new(
            vec!["user@example.com".to_string()],
            "测试标题",
            "测试内容",
        );

        assert!(notifier.deliver(&notification).await.is_ok());
        assert_eq!(notifier.name(), "log");
    }
}
