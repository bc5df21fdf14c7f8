//! 服务装配
//!
//! 在进程启动时一次性完成配置解析、数据库连接与服务构建。
//!
//! ## 能力模型
//!
//! 是否允许写入在装配时由 [`Capabilities`] 决定一次：
//! 只读实例根本不会构造结算/退款/调整等写入服务，
//! 业务代码里不存在任何运行期的开关判断。

use std::sync::Arc;

use mall_shared::config::{AppConfig, Capabilities};
use mall_shared::database::Database;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::{MallError, Result};
use crate::notification::{LogNotifier, NotificationSender};
use crate::repository::{
    ExportRepository, LedgerRepository, OrderRepository, ProductRepository, ProfileRepository,
};
use crate::service::{
    AdjustmentService, ExportService, OrderService, QueryService, RefundService,
    SettlementService,
};
use crate::storage::MemoryExportStorage;

/// 写入侧服务集合
///
/// 只在 `mutations_enabled` 的实例上装配。
pub struct MutationServices {
    pub settlement_service: Arc<SettlementService>,
    pub refund_service: Arc<RefundService>,
    pub adjustment_service: Arc<AdjustmentService<ProfileRepository, LedgerRepository>>,
    pub order_service: Arc<OrderService>,
}

/// 应用上下文
///
/// 持有全部已装配的服务，进程内共享。
pub struct AppContext {
    pub config: AppConfig,
    pub capabilities: Capabilities,
    pub db: Database,
    pub query_service: Arc<QueryService>,
    pub export_service: Arc<ExportService<MemoryExportStorage>>,
    /// 导出文件存储（内存实现，生产部署替换为对象存储）
    pub storage: Arc<MemoryExportStorage>,
    /// 写入侧服务，只读实例为 None
    pub mutations: Option<MutationServices>,
}

impl AppContext {
    /// 装配应用上下文
    ///
    /// 流程：
    /// 1. 由配置推导能力（此后不再检查任何开关）
    /// 2. 建立数据库连接池
    /// 3. 构建仓储
    /// 4. 构建存储与通知发送器
    /// 5. 装配只读服务；可写实例追加装配写入服务
    #[instrument(skip(config), fields(service = %config.service_name, environment = %config.environment))]
    pub async fn init(config: AppConfig) -> Result<Self> {
        // 1. 能力推导，只在这里发生一次
        let capabilities = config.capabilities();

        // 2. 数据库
        let db = Database::connect(&config.database)
            .await
            .map_err(|e| MallError::Internal(format!("数据库初始化失败: {e}")))?;
        let pool = db.pool().clone();
        info!("数据库连接已建立");

        // 3. 仓储
        let profile_repo = Arc::new(ProfileRepository::new(pool.clone()));
        let product_repo = Arc::new(ProductRepository::new(pool.clone()));
        let order_repo = Arc::new(OrderRepository::new(pool.clone()));
        let ledger_repo = Arc::new(LedgerRepository::new(pool.clone()));
        let export_repo = Arc::new(ExportRepository::new(pool.clone()));

        // 4. 导出存储与通知
        let storage = Arc::new(MemoryExportStorage::new());
        let sender = NotificationSender::new(Arc::new(LogNotifier), config.notification.clone());

        // 5. 只读服务
        let query_service = Arc::new(QueryService::new(ledger_repo.clone()));
        let export_service = Arc::new(ExportService::new(
            ledger_repo.clone(),
            order_repo.clone(),
            export_repo,
            storage.clone(),
            config.export.clone(),
        ));

        // 可写实例追加装配写入服务
        let mutations = if capabilities.mutations_enabled {
            let conversion_rate = parse_conversion_rate(config.points.conversion_rate)?;

            let settlement_service = Arc::new(SettlementService::new(
                profile_repo.clone(),
                product_repo.clone(),
                sender.clone(),
                conversion_rate,
                pool.clone(),
            ));
            let refund_service = Arc::new(RefundService::new(
                profile_repo.clone(),
                product_repo,
                order_repo.clone(),
                sender.clone(),
                pool.clone(),
            ));
            let adjustment_service = Arc::new(AdjustmentService::new(
                profile_repo,
                ledger_repo,
                sender,
            ));
            let order_service = Arc::new(OrderService::new(order_repo));

            info!("写入服务已装配");
            Some(MutationServices {
                settlement_service,
                refund_service,
                adjustment_service,
                order_service,
            })
        } else {
            info!("只读实例，跳过写入服务装配");
            None
        };

        Ok(Self {
            config,
            capabilities,
            db,
            query_service,
            export_service,
            storage,
            mutations,
        })
    }
}

/// 执行数据库迁移
///
/// 由部署脚本或集成测试在装配前显式调用；
/// 只读实例的数据库账号通常没有 DDL 权限，因此不放进 [`AppContext::init`]。
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| MallError::Internal(format!("数据库迁移失败: {e}")))?;
    info!("数据库迁移已完成");
    Ok(())
}

/// 汇率配置转为定点数，非正值直接拒绝启动
fn parse_conversion_rate(rate: f64) -> Result<Decimal> {
    Decimal::from_f64_retain(rate)
        .filter(|r| *r > Decimal::ZERO)
        .ok_or_else(|| MallError::Validation(format!("积分汇率配置非法: {rate}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conversion_rate() {
        assert_eq!(parse_conversion_rate(100.0).unwrap(), Decimal::from(100));
        assert!(parse_conversion_rate(0.0).is_err());
        assert!(parse_conversion_rate(-5.0).is_err());
        assert!(parse_conversion_rate(f64::NAN).is_err());
    }
}
