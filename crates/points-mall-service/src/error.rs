//! 积分商城服务错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

/// 积分商城服务错误类型
#[derive(Debug, Error)]
pub enum MallError {
    // === 用户/商品相关错误 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("商品不存在: {0}")]
    ProductNotFound(i64),

    #[error("商品规格不存在: {0}")]
    VariantNotFound(i64),

    #[error("商品已下架: {0}")]
    ProductInactive(i64),

    #[error("商品规格已下架: {0}")]
    VariantInactive(i64),

    // === 订单/结算相关错误 ===
    #[error("订单不存在: {0}")]
    OrderNotFound(i64),

    #[error("积分余额不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("库存不足: variant_id={variant_id}, 需要 {requested}")]
    InsufficientInventory { variant_id: i64, requested: i32 },

    #[error("订单已退款: {0}")]
    AlreadyRefunded(i64),

    #[error("订单状态不允许此操作: order_id={order_id}, current_status={current_status}")]
    InvalidOrderStatus {
        order_id: i64,
        current_status: String,
    },

    // === 导出相关错误 ===
    #[error("导出记录不存在: {0}")]
    ExportNotFound(i64),

    #[error("所选区间没有可导出的数据")]
    NoExportData,

    #[error("文件存储错误: {0}")]
    Storage(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error("参数校验失败: {0}")]
    Validation(String),
}

/// 积分商城服务 Result 类型别名
pub type Result<T> = std::result::Result<T, MallError>;

impl MallError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Storage(_))
    }

    /// 检查是否为业务错误（非系统错误）
    ///
    /// 业务错误是操作的正常预期结果，返回给调用方而非当作故障处理
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Storage(_) | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::VariantNotFound(_) => "VARIANT_NOT_FOUND",
            Self::ProductInactive(_) => "PRODUCT_INACTIVE",
            Self::VariantInactive(_) => "VARIANT_INACTIVE",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::InsufficientInventory { .. } => "INSUFFICIENT_INVENTORY",
            Self::AlreadyRefunded(_) => "ALREADY_REFUNDED",
            Self::InvalidOrderStatus { .. } => "INVALID_ORDER_STATUS",
            Self::ExportNotFound(_) => "EXPORT_NOT_FOUND",
            Self::NoExportData => "NO_EXPORT_DATA",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = MallError::InsufficientPoints {
            required: 1200,
            available: 1000,
        };
        assert_eq!(err.error_code(), "INSUFFICIENT_POINTS");

        let err = MallError::NoExportData;
        assert_eq!(err.error_code(), "NO_EXPORT_DATA");
    }

    #[test]
    fn test_is_business_error() {
        assert!(MallError::AlreadyRefunded(1).is_business_error());
        assert!(MallError::NoExportData.is_business_error());
        assert!(MallError::Validation("bad".to_string()).is_business_error());
        assert!(!MallError::Database(sqlx::Error::PoolTimedOut).is_business_error());
        assert!(!MallError::Storage("oss 超时".to_string()).is_business_error());
    }

    #[test]
    fn test_is_retryable() {
        assert!(MallError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!MallError::InsufficientPoints { required: 1, available: 0 }.is_retryable());
    }

    #[test]
    fn test_error_message_contains_detail() {
        let err = MallError::InsufficientPoints {
            required: 1200,
            available: 1000,
        };
        let msg = err.to_string();
        assert!(msg.contains("1200"));
        assert!(msg.contains("1000"));
    }
}
