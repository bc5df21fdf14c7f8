//! 服务层数据传输对象
//!
//! 定义服务层与外部交互使用的 DTO，与内部领域模型解耦

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{DeliveryMethod, Order, OrderItem, OrderStatus, PointsLedgerEntry};

/// 购物车行输入
///
/// 同一商品规格允许出现多行，结算前会按 (productId, variantId) 合并
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub product_id: i64,
    #[serde(default)]
    pub variant_id: Option<i64>,
    pub quantity: i32,
}

/// 下单请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, message = "用户 ID 不能为空"))]
    pub user_id: String,

    #[validate(length(min = 1, message = "购物车不能为空"))]
    pub lines: Vec<CartLineInput>,

    #[serde(default)]
    pub delivery_method: DeliveryMethod,

    #[validate(length(max = 100, message = "收货人姓名不能超过100个字符"))]
    #[serde(default)]
    pub recipient_name: Option<String>,

    #[validate(length(max = 30, message = "联系电话不能超过30个字符"))]
    #[serde(default)]
    pub recipient_phone: Option<String>,

    #[validate(length(max = 500, message = "收货地址不能超过500个字符"))]
    #[serde(default)]
    pub recipient_address: Option<String>,

    #[validate(length(max = 500, message = "备注不能超过500个字符"))]
    #[serde(default)]
    pub notes: Option<String>,
}

/// 下单结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: i64,
    pub order_no: String,
    pub total_points: i64,
    pub balance_after: i64,
}

/// 退款结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOutcome {
    pub order_id: i64,
    pub order_no: String,
    pub refunded_points: i64,
    /// 本次退款是否包含退货（库存回补）
    pub with_return: bool,
}

/// 手工积分调整请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustPointsRequest {
    #[validate(length(min = 1, message = "用户 ID 不能为空"))]
    pub user_id: String,

    /// 正数加分，负数扣分，不允许为 0
    pub delta_points: i64,

    #[validate(length(min = 1, max = 200, message = "调整原因长度必须在1-200个字符之间"))]
    pub reason: String,

    #[validate(length(min = 1, message = "操作人不能为空"))]
    pub operator: String,
}

/// 手工积分调整结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustPointsResponse {
    pub entry_id: i64,
    pub user_id: String,
    pub delta_points: i64,
    pub balance_after: i64,
}

/// 批量导入中单行的失败详情
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowFailure {
    /// 文件中的行号（1 起始，按非空行计数，表头占第 1 行）
    pub row: usize,
    pub email: String,
    pub error: String,
}

/// 批量积分导入汇总
///
/// 单行失败不会中断批次，失败明细逐行列出
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<ImportRowFailure>,
}

impl BulkImportReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// 流水分页结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPage {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub entries: Vec<PointsLedgerEntry>,
}

/// 订单状态更新请求
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    /// 发货时补写运单号，留空保持原值
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// 订单详情（订单头 + 明细行）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// 导出结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub export_id: i64,
    pub file_name: String,
    pub row_count: i64,
    pub byte_size: i64,
    pub download_url: String,
    pub expires_in_seconds: u64,
    pub generated_at: DateTime<Utc>,
}
