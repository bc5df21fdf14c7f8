//! 通知模块
//!
//! 在订单创建、退款、积分调整之后向用户和管理员发送提醒。
//!
//! ## 功能特性
//!
//! - **异步发送**：通知在独立任务中投递，不阻塞业务事务
//! - **失败容忍**：投递失败只记录日志，业务结果不受影响
//! - **模板集中**：所有文案在 [`types::NotificationBuilder`] 统一维护
//! - **渠道可替换**：通过 [`Notifier`] trait 注入投递实现

pub mod notifier;
pub mod sender;
pub mod types;

pub use notifier::{LogNotifier, Notifier};
pub use sender::NotificationSender;
pub use types::{Notification, NotificationBuilder};
