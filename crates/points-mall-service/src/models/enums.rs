//! 积分商城枚举类型定义
//!
//! 所有入库枚举都支持数据库（sqlx）和 JSON（serde）序列化，
//! 数据库与 JSON 统一使用小写值。

use serde::{Deserialize, Serialize};

/// 订单状态
///
/// 运营侧可在非取消状态间自由流转；取消只能经退款流程进入，且不可逆
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum OrderStatus {
    /// 新建 - 下单完成，待处理
    #[default]
    New,
    /// 处理中 - 备货/打包
    Processing,
    /// 已发货
    Shipped,
    /// 已送达
    Delivered,
    /// 已取消 - 仅由退款流程写入，终态
    Cancelled,
}

impl OrderStatus {
    /// 运营侧状态流转是否允许
    ///
    /// 非取消状态间可任意移动（允许回退修正），取消态只进不出，
    /// 进入取消态必须走退款流程而非状态接口。
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        if *self == OrderStatus::Cancelled || target == OrderStatus::Cancelled {
            return false;
        }
        *self != target
    }

    /// 小写文本值，与数据库存储一致
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

/// 配送方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// 自提 - 无需收货信息
    #[default]
    Pickup,
    /// 快递配送 - 必须填写收货信息
    Delivery,
}

impl DeliveryMethod {
    /// 是否需要收货信息
    pub fn requires_shipping(&self) -> bool {
        matches!(self, Self::Delivery)
    }
}

/// 导出类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ExportType {
    /// 订单导出 - 每个订单明细行一条记录
    Orders,
    /// 积分流水导出
    Points,
}

impl ExportType {
    /// 导出文件名前缀
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Points => "points",
        }
    }
}

/// 流水方向筛选
///
/// 不入库，仅用于查询条件：按 delta_points 的符号区分收入/支出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    /// 收入（delta > 0）
    Earned,
    /// 支出（delta < 0）
    Spent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_serialization() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"cancelled\"").unwrap(),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::New);
    }

    #[test]
    fn test_order_status_transitions() {
        // 非取消状态间自由流转，包括回退
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));

        // 原状态不算流转
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Shipped));

        // 取消态只能经退款流程进入，且为终态
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::New));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_delivery_method_requires_shipping() {
        assert!(DeliveryMethod::Delivery.requires_shipping());
        assert!(!DeliveryMethod::Pickup.requires_shipping());
    }

    #[test]
    fn test_delivery_method_serialization() {
        assert_eq!(
            serde_json::to_string(&DeliveryMethod::Pickup).unwrap(),
            "\"pickup\""
        );
        assert_eq!(
            serde_json::from_str::<DeliveryMethod>("\"delivery\"").unwrap(),
            DeliveryMethod::Delivery
        );
    }

    #[test]
    fn test_export_type_file_prefix() {
        assert_eq!(ExportType::Orders.file_prefix(), "orders");
        assert_eq!(ExportType::Points.file_prefix(), "points");
    }
}
