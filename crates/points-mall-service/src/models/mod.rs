//! 积分商城领域模型
//!
//! 包含账本、订单、商品、用户档案、导出记录等核心实体定义

pub mod enums;
pub mod export;
pub mod ledger;
pub mod order;
pub mod product;
pub mod profile;

// 重新导出常用类型
pub use enums::{DeliveryMethod, ExportType, LedgerEntryKind, OrderStatus};
pub use export::{ExportRecord, NewExportRecord};
pub use ledger::{
    DEFAULT_BULK_REASON, LedgerExportRow, LedgerFilter, NewLedgerEntry, PointsLedgerEntry,
};
pub use order::{NewOrder, NewOrderItem, Order, OrderExportRow, OrderItem};
pub use product::{Product, ProductVariant};
pub use profile::Profile;
