//! 服务层
//!
//! 实现积分商城业务逻辑，协调仓储、存储与通知。
//!
//! ## 模块结构
//!
//! - `dto`: 数据传输对象定义
//! - `settlement_service`: 订单结算（下单扣分、扣库存）
//! - `refund_service`: 订单退款（补偿流水、回补库存）
//! - `adjustment_service`: 手工/批量积分调整
//! - `export_service`: 订单与流水的 CSV 导出
//! - `order_service`: 订单查询与状态流转
//! - `query_service`: 余额与流水查询（只读操作）

pub mod adjustment_service;
pub mod dto;
pub mod export_service;
pub mod order_service;
pub mod query_service;
pub mod refund_service;
pub mod settlement_service;

pub use adjustment_service::AdjustmentService;
pub use dto::*;
pub use export_service::ExportService;
pub use order_service::OrderService;
pub use query_service::QueryService;
pub use refund_service::RefundService;
pub use settlement_service::SettlementService;
