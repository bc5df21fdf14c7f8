//! 积分商城服务
//!
//! 用户以积分余额兑换商品的核心服务：积分流水账本、订单结算、
//! 退款补偿、批量积分调整与报表导出。
//!
//! ## 核心功能
//!
//! - **积分账本**：只追加的流水表是余额的唯一事实来源，余额实时求和
//! - **订单结算**：购物车 -> 订单 + 明细 + 负向流水 + 库存扣减，单事务全有或全无
//! - **退款补偿**：正向流水退回积分，可选回补库存，同一订单只能退一次
//! - **批量调整**：容错 CSV 解析，逐行独立落账，失败行不拖垮批次
//! - **报表导出**：按月/跨月把订单与流水快照成 CSV 并留档元数据
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `csv`: CSV 行编解码（容错读取、严格写出）
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层
//! - `notification`: 通知发送
//! - `storage`: 导出文件存储
//! - `bootstrap`: 服务装配

pub mod bootstrap;
pub mod csv;
pub mod error;
pub mod models;
pub mod notification;
pub mod repository;
pub mod service;
pub mod storage;

pub use bootstrap::{AppContext, MutationServices, run_migrations};
pub use error::{MallError, Result};
pub use models::*;
pub use notification::{LogNotifier, Notification, NotificationBuilder, NotificationSender, Notifier};
pub use repository::{
    ExportRepository, LedgerRepository, OrderRepository, ProductRepository, ProfileRepository,
};
pub use service::{
    AdjustmentService, ExportService, OrderService, QueryService, RefundService,
    SettlementService, dto,
};
pub use storage::{ExportStorage, MemoryExportStorage};
