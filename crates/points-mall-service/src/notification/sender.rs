//! 通知发送器
//!
//! 业务服务持有发送器，在事务提交之后触发通知。
//!
//! ## 设计说明
//!
//! 通知是尽力而为的旁路：发送在独立任务中异步执行，
//! 失败只记录日志，任何情况下都不影响已提交的业务结果。

use std::sync::Arc;

use mall_shared::config::NotificationConfig;
use tracing::{debug, error, info};

use super::notifier::Notifier;
use super::types::{Notification, NotificationBuilder};

/// 通知发送器
#[derive(Clone)]
pub struct NotificationSender {
    notifier: Arc<dyn Notifier>,
    config: NotificationConfig,
}

impl NotificationSender {
    pub fn new(notifier: Arc<dyn Notifier>, config: NotificationConfig) -> Self {
        Self { notifier, config }
    }

    /// 下单成功：通知买家，并提醒管理员处理
    pub fn notify_order_placed(
        &self,
        buyer_email: &str,
        order_no: &str,
        total_points: i64,
        balance_after: i64,
    ) {
        self.send_async(NotificationBuilder::order_placed(
            buyer_email,
            order_no,
            total_points,
            balance_after,
        ));

        if !self.config.admin_recipients.is_empty() {
            self.send_async(NotificationBuilder::order_placed_admin(
                self.config.admin_recipients.clone(),
                order_no,
                buyer_email,
                total_points,
            ));
        }
    }

    /// 退款完成：通知买家
    pub fn notify_order_refunded(
        &self,
        buyer_email: &str,
        order_no: &str,
        refunded_points: i64,
        with_return: bool,
    ) {
        self.send_async(NotificationBuilder::order_refunded(
            buyer_email,
            order_no,
            refunded_points,
            with_return,
        ));
    }

    /// 积分调整：通知用户
    pub fn notify_points_adjusted(
        &self,
        user_email: &str,
        delta_points: i64,
        reason: &str,
        balance_after: i64,
    ) {
        self.send_async(NotificationBuilder::points_adjusted(
            user_email,
            delta_points,
            reason,
            balance_after,
        ));
    }

    /// 异步投递（fire-and-forget）
    fn send_async(&self, notification: Notification) {
        if !self.config.enabled {
            debug!(title = %notification.title, "通知未启用，跳过发送");
            return;
        }

        let notifier = self.notifier.clone();
        let channel = notifier.name().to_string();
        let notification_id = notification.notification_id.clone();
        let title = notification.title.clone();

        tokio::spawn(async move {
            match notifier.deliver(&notification).await {
                Ok(()) => {
                    info!(
                        notification_id = %notification_id,
                        channel = %channel,
                        title = %title,
                        "通知发送成功"
                    );
                }
                Err(e) => {
                    error!(
                        notification_id = %notification_id,
                        channel = %channel,
                        title = %title,
                        error = %e,
                        "通知发送失败"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::notifier::{LogNotifier, MockNotifier};

    fn test_config(enabled: bool) -> NotificationConfig {
        NotificationConfig {
            enabled,
            admin_recipients: vec!["ops@example.com".to_string()],
            from_name: "积分商城".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_does_not_block_or_panic() {
        let sender = NotificationSender::new(Arc::new(LogNotifier), test_config(true));

        sender.notify_order_placed("buyer@example.com", "PM20250101120000000001", 600, 400);
        sender.notify_order_refunded("buyer@example.com", "PM20250101120000000001", 600, true);
        sender.notify_points_adjusted("buyer@example.com", 100, "活动奖励", 500);

        // 等待异步任务完成
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_disabled_config_skips_delivery() {
        let mut mock = MockNotifier::new();
        mock.expect_deliver().times(0);

        let sender = NotificationSender::new(Arc::new(mock), test_config(false));
        sender.notify_points_adjusted("buyer@example.com", 100, "活动奖励", 500);

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_order_placed_notifies_buyer_and_admin() {
        let mut mock = MockNotifier::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_deliver()
            .times(2)
            .returning(|_| Ok(()));

        let sender = NotificationSender::new(Arc::new(mock), test_config(true));
        sender.notify_order_placed("buyer@example.com", "PM1", 600, 400);

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
