//! 订单退款服务
//!
//! 补偿性流程：把订单消耗的积分退回账户，按需回补库存，订单置为取消。
//!
//! ## 幂等保证
//!
//! 同一订单的并发退款只能成功一次。事务内先对订单行加锁，
//! 在锁内检查"已取消"与"已存在正向流水"，再追加退款流水并改状态，
//! 检查与写入不可能被另一个退款事务穿插。
//!
//! ## 部分失败策略
//!
//! 退款流水落库即是不可回退点。之后的库存回补逐行尽力而为，
//! 单行失败只记日志并继续，绝不把已提交的退款变成半失败。

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::error::{MallError, Result};
use crate::models::{NewLedgerEntry, Order, OrderStatus};
use crate::notification::NotificationSender;
use crate::repository::{
    LedgerRepository, OrderRepository, ProductRepository, ProfileRepository,
};
use crate::service::dto::RefundOutcome;

/// 订单退款服务
pub struct RefundService {
    profile_repo: Arc<ProfileRepository>,
    product_repo: Arc<ProductRepository>,
    order_repo: Arc<OrderRepository>,
    sender: NotificationSender,
    pool: PgPool,
}

impl RefundService {
    pub fn new(
        profile_repo: Arc<ProfileRepository>,
        product_repo: Arc<ProductRepository>,
        order_repo: Arc<OrderRepository>,
        sender: NotificationSender,
        pool: PgPool,
    ) -> Self {
        Self {
            profile_repo,
            product_repo,
            order_repo,
            sender,
            pool,
        }
    }

    /// 退款
    ///
    /// 流程：
    /// 1. 事务内锁定订单行
    /// 2. 已取消或已有正向流水 -> `AlreadyRefunded`
    /// 3. 追加正向流水（金额 = 订单总积分）
    /// 4. 订单状态置为 cancelled，提交
    /// 5. `with_return` 时逐行回补库存（尽力而为）
    /// 6. 异步通知买家
    #[instrument(skip(self), fields(order_id = order_id, with_return = with_return))]
    pub async fn refund_order(
        &self,
        order_id: i64,
        with_return: bool,
        operator: &str,
    ) -> Result<RefundOutcome> {
        let order = self.execute_refund(order_id, with_return, operator).await?;

        // 提交之后的步骤全部尽力而为
        if with_return {
            self.restore_inventory(&order).await;
        }
        self.notify_refunded(&order, with_return).await;

        info!(
            order_id = order.id,
            order_no = %order.order_no,
            refunded_points = order.total_points,
            with_return = with_return,
            "订单退款完成"
        );

        Ok(RefundOutcome {
            order_id: order.id,
            order_no: order.order_no.clone(),
            refunded_points: order.total_points,
            with_return,
        })
    }

    // ==================== 私有方法 ====================

    /// 执行退款事务，返回退款前读取的订单
    async fn execute_refund(
        &self,
        order_id: i64,
        with_return: bool,
        operator: &str,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // 1. 锁定订单行，并发退款在此排队
        let order = OrderRepository::get_for_update_in_tx(&mut tx, order_id)
            .await?
            .ok_or(MallError::OrderNotFound(order_id))?;

        // 2. 取消态是退款的终态，二次退款直接拒绝
        if order.status == OrderStatus::Cancelled {
            return Err(MallError::AlreadyRefunded(order_id));
        }
        // 正向流水存在同样视为已退款（锁内检查，杜绝检查-写入竞态）
        if LedgerRepository::has_refund_entry_in_tx(&mut tx, order_id).await? {
            return Err(MallError::AlreadyRefunded(order_id));
        }

        // 3. 退款流水
        let credit = NewLedgerEntry::order_refund(
            &order.user_id,
            order.total_points,
            order_id,
            &order.order_no,
            with_return,
            operator,
        );
        LedgerRepository::create_in_tx(&mut tx, &credit).await?;

        // 4. 状态置为取消，提交
        OrderRepository::update_status_in_tx(&mut tx, order_id, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// 逐行回补库存
    ///
    /// 只处理带规格且有限库存的明细行；不限量规格跳过；
    /// 单行失败记日志继续，不影响已提交的退款。
    async fn restore_inventory(&self, order: &Order) {
        let items = match self.order_repo.list_items(order.id).await {
            Ok(items) => items,
            Err(e) => {
                warn!(order_id = order.id, error = %e, "读取订单明细失败，跳过库存回补");
                return;
            }
        };

        for item in items {
            let Some(variant_id) = item.variant_id else {
                continue;
            };

            match self
                .product_repo
                .increment_inventory(variant_id, item.quantity)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    // 规格不限量或已被删除，无需回补
                }
                Err(e) => {
                    warn!(
                        order_id = order.id,
                        variant_id = variant_id,
                        quantity = item.quantity,
                        error = %e,
                        "库存回补失败，跳过该行"
                    );
                }
            }
        }
    }

    /// 查邮箱并发送退款通知，档案缺失只记日志
    async fn notify_refunded(&self, order: &Order, with_return: bool) {
        match self.profile_repo.find_by_id(&order.user_id).await {
            Ok(Some(profile)) => {
                self.sender.notify_order_refunded(
                    &profile.email,
                    &order.order_no,
                    order.total_points,
                    with_return,
                );
            }
            Ok(None) => {
                warn!(order_id = order.id, user_id = %order.user_id, "用户档案不存在，跳过退款通知");
            }
            Err(e) => {
                warn!(order_id = order.id, error = %e, "查询用户档案失败，跳过退款通知");
            }
        }
    }
}
