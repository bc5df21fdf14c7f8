//! 通知数据结构与业务模板
//!
//! 通知正文在构建时就渲染完成，投递层只管发送。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 一封待投递的通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// 通知唯一标识（UUID v7，按时间有序）
    pub notification_id: String,
    /// 收件人邮箱列表
    pub recipients: Vec<String>,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipients: Vec<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            notification_id: Uuid::now_v7().to_string(),
            recipients,
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// 业务通知模板
///
/// 每个业务事件一个构建函数，文案集中在这里维护。
pub struct NotificationBuilder;

impl NotificationBuilder {
    /// 下单成功 - 发给买家
    pub fn order_placed(
        buyer_email: &str,
        order_no: &str,
        total_points: i64,
        balance_after: i64,
    ) -> Notification {
        Notification::new(
            vec![buyer_email.to_string()],
            "兑换成功",
            format!(
                "您的兑换订单 {order_no} 已创建，共消耗 {total_points} 积分，当前余额 {balance_after} 积分。"
            ),
        )
    }

    /// 新订单提醒 - 发给管理员
    pub fn order_placed_admin(
        admin_recipients: Vec<String>,
        order_no: &str,
        buyer_email: &str,
        total_points: i64,
    ) -> Notification {
        Notification::new(
            admin_recipients,
            "新兑换订单",
            format!("用户 {buyer_email} 创建了订单 {order_no}，消耗 {total_points} 积分，请及时处理。"),
        )
    }

    /// 订单退款 - 发给买家
    pub fn order_refunded(
        buyer_email: &str,
        order_no: &str,
        refunded_points: i64,
        with_return: bool,
    ) -> Notification {
        let body = if with_return {
            format!("您的订单 {order_no} 已退款（含退货），{refunded_points} 积分已退回账户。")
        } else {
            format!("您的订单 {order_no} 已退款，{refunded_points} 积分已退回账户。")
        };
        Notification::new(vec![buyer_email.to_string()], "订单已退款", body)
    }

    /// 积分调整 - 发给用户
    pub fn points_adjusted(
        user_email: &str,
        delta_points: i64,
        reason: &str,
        balance_after: i64,
    ) -> Notification {
        let direction = if delta_points > 0 { "增加" } else { "扣减" };
        Notification::new(
            vec![user_email.to_string()],
            "积分变动提醒",
            format!(
                "您的积分{direction} {} 分（{reason}），当前余额 {balance_after} 积分。",
                delta_points.abs()
            ),
        )
    }
}
