//! 订单管理服务
//!
//! 运营侧的订单查询与状态流转。取消不走这里：
//! 进入取消态唯一的入口是退款流程，这里对取消目标一律拒绝。

use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::{MallError, Result};
use crate::models::Order;
use crate::repository::OrderRepository;
use crate::service::dto::{OrderDetail, UpdateOrderStatusRequest};

/// 订单管理服务
pub struct OrderService {
    order_repo: Arc<OrderRepository>,
}

impl OrderService {
    pub fn new(order_repo: Arc<OrderRepository>) -> Self {
        Self { order_repo }
    }

    /// 订单详情（订单头 + 明细行）
    pub async fn get_detail(&self, order_id: i64) -> Result<OrderDetail> {
        let order = self
            .order_repo
            .get(order_id)
            .await?
            .ok_or(MallError::OrderNotFound(order_id))?;
        let items = self.order_repo.list_items(order_id).await?;

        Ok(OrderDetail { order, items })
    }

    /// 更新订单状态
    ///
    /// 非取消状态间自由流转；发货时可同时补写运单号。
    /// 目标为 cancelled 一律拒绝（退款流程才能取消订单）。
    #[instrument(skip(self, request), fields(order_id = order_id, target = ?request.status))]
    pub async fn update_status(
        &self,
        order_id: i64,
        request: UpdateOrderStatusRequest,
    ) -> Result<Order> {
        let order = self
            .order_repo
            .get(order_id)
            .await?
            .ok_or(MallError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(request.status) {
            return Err(MallError::InvalidOrderStatus {
                order_id,
                current_status: order.status.as_str().to_string(),
            });
        }

        let tracking = request
            .tracking_number
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        self.order_repo
            .update_status(order_id, request.status, tracking)
            .await?;

        info!(
            order_id = order_id,
            from = order.status.as_str(),
            to = request.status.as_str(),
            "订单状态已更新"
        );

        // 返回更新后的订单
        self.order_repo
            .get(order_id)
            .await?
            .ok_or(MallError::OrderNotFound(order_id))
    }
}
