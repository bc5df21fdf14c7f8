//! 订单结算服务
//!
//! 把购物车变成订单的核心流程，包括：
//! - 购物车规范化（合并重复行、拒绝非法数量）
//! - 商品/规格有效性与库存预检
//! - 美元价格到积分价格的换算
//! - 事务性落库（订单 + 明细 + 积分扣减 + 库存扣减）
//!
//! ## 结算流程
//!
//! 1. 请求校验 -> 2. 购物车规范化 -> 3. 用户档案 -> 4. 逐行解析定价
//!    -> 5. 事务写入（锁档案、验余额、建订单、记流水、扣库存） -> 6. 通知
//!
//! ## 定价规则
//!
//! 单件积分 = round(基础价 × 汇率) + round(规格调价 × 汇率)，
//! 两个分量各自四舍五入后再相加。先加后舍在半分钱边界会差 1 积分，
//! 历史账单都按先舍后加生成，这个顺序不能改。

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::error::{MallError, Result};
use crate::models::{NewLedgerEntry, NewOrder, NewOrderItem};
use crate::notification::NotificationSender;
use crate::repository::{
    LedgerRepository, OrderRepository, ProductRepository, ProfileRepository,
};
use crate::service::dto::{CartLineInput, PlaceOrderRequest, PlaceOrderResponse};

/// 解析完成的购物车行：明细草稿 + 需要扣减的库存
struct ResolvedLine {
    item: NewOrderItem,
    /// (variant_id, quantity)，只有有限库存的规格才需要事务内扣减
    decrement: Option<(i64, i32)>,
}

/// 订单结算服务
///
/// 负责下单的完整流程：校验、定价、事务落库、通知
pub struct SettlementService {
    profile_repo: Arc<ProfileRepository>,
    product_repo: Arc<ProductRepository>,
    sender: NotificationSender,
    conversion_rate: Decimal,
    pool: PgPool,
}

impl SettlementService {
    pub fn new(
        profile_repo: Arc<ProfileRepository>,
        product_repo: Arc<ProductRepository>,
        sender: NotificationSender,
        conversion_rate: Decimal,
        pool: PgPool,
    ) -> Self {
        Self {
            profile_repo,
            product_repo,
            sender,
            conversion_rate,
            pool,
        }
    }

    /// 下单结算
    ///
    /// 完整事务流程：
    /// 1. 校验请求（配送订单必须有收货信息）
    /// 2. 规范化购物车（合并重复行）
    /// 3. 校验用户存在
    /// 4. 逐行解析商品/规格、预检库存、计算积分价
    /// 5. 事务内：锁定档案行、校验余额、创建订单与明细、
    ///    追加负向流水、条件扣减库存
    /// 6. 提交后异步通知买家与管理员
    #[instrument(skip(self, request), fields(user_id = %request.user_id, lines = request.lines.len()))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<PlaceOrderResponse> {
        // 1. 基础校验
        request
            .validate()
            .map_err(|e| MallError::Validation(e.to_string()))?;
        validate_shipping(&request)?;

        // 2. 规范化购物车
        let lines = normalize_cart(&request.lines)?;

        // 3. 校验用户存在，顺带拿到通知邮箱
        let profile = self
            .profile_repo
            .find_by_id(&request.user_id)
            .await?
            .ok_or_else(|| MallError::UserNotFound(request.user_id.clone()))?;

        // 4. 解析商品与定价，库存不足在这里就拒绝
        let (resolved, total_points) = self.resolve_lines(&lines).await?;

        // 5. 事务写入
        let (order_id, order_no, balance_after) = self
            .execute_settlement(&request, &resolved, total_points)
            .await?;

        // 6. 通知（fire-and-forget）
        self.sender
            .notify_order_placed(&profile.email, &order_no, total_points, balance_after);

        info!(
            user_id = %request.user_id,
            order_id = order_id,
            order_no = %order_no,
            total_points = total_points,
            balance_after = balance_after,
            "订单结算成功"
        );

        Ok(PlaceOrderResponse {
            order_id,
            order_no,
            total_points,
            balance_after,
        })
    }

    // ==================== 私有方法 ====================

    /// 逐行解析商品/规格并计算积分价
    ///
    /// 返回（解析结果，订单总积分）。任何一行失败整个购物车拒绝。
    async fn resolve_lines(
        &self,
        lines: &[CartLineInput],
    ) -> Result<(Vec<ResolvedLine>, i64)> {
        let mut resolved = Vec::with_capacity(lines.len());
        let mut total_points: i64 = 0;

        for line in lines {
            let product = self
                .product_repo
                .get_product(line.product_id)
                .await?
                .ok_or(MallError::ProductNotFound(line.product_id))?;
            if !product.active {
                return Err(MallError::ProductInactive(product.id));
            }

            let variant = match line.variant_id {
                Some(variant_id) => {
                    let variant = self
                        .product_repo
                        .get_variant(variant_id)
                        .await?
                        // 规格必须属于行里声明的商品
                        .filter(|v| v.product_id == line.product_id)
                        .ok_or(MallError::VariantNotFound(variant_id))?;
                    if !variant.active {
                        return Err(MallError::VariantInactive(variant.id));
                    }
                    // 库存预检：不够就在产生任何副作用之前拒绝
                    if !variant.has_inventory_for(line.quantity) {
                        return Err(MallError::InsufficientInventory {
                            variant_id: variant.id,
                            requested: line.quantity,
                        });
                    }
                    Some(variant)
                }
                None => None,
            };

            let adjustment = variant
                .as_ref()
                .map(|v| v.price_adjustment_usd)
                .unwrap_or(Decimal::ZERO);
            let points_per_item =
                compute_points_per_item(product.base_price_usd, adjustment, self.conversion_rate)?;
            if points_per_item <= 0 {
                return Err(MallError::Validation(format!(
                    "商品积分价格必须为正: product_id={}",
                    product.id
                )));
            }

            let item = NewOrderItem {
                product_id: product.id,
                variant_id: variant.as_ref().map(|v| v.id),
                product_name: product.name.clone(),
                variant_name: variant.as_ref().map(|v| v.name.clone()),
                quantity: line.quantity,
                points_per_item,
            };
            total_points += item.total_points();

            // 只有有限库存的规格需要事务内扣减
            let decrement = variant
                .as_ref()
                .filter(|v| v.inventory_count.is_some())
                .map(|v| (v.id, line.quantity));

            resolved.push(ResolvedLine { item, decrement });
        }

        Ok((resolved, total_points))
    }

    /// 执行结算事务
    ///
    /// 在单个事务内完成：
    /// - 锁定用户档案行（同一用户的并发结算在此排队）
    /// - 校验余额充足
    /// - 创建订单与明细
    /// - 追加负向积分流水
    /// - 条件扣减每个有限库存规格
    ///
    /// 任何一步失败整个事务回滚，不会留下部分状态。
    async fn execute_settlement(
        &self,
        request: &PlaceOrderRequest,
        resolved: &[ResolvedLine],
        total_points: i64,
    ) -> Result<(i64, String, i64)> {
        let mut tx = self.pool.begin().await?;

        // 5.1 锁定档案行，串行化同一用户的并发结算
        let locked = ProfileRepository::lock_in_tx(&mut tx, &request.user_id).await?;
        if !locked {
            return Err(MallError::UserNotFound(request.user_id.clone()));
        }

        // 5.2 锁内读余额，校验充足
        let balance = LedgerRepository::get_balance_in_tx(&mut tx, &request.user_id).await?;
        if balance < total_points {
            return Err(MallError::InsufficientPoints {
                required: total_points,
                available: balance,
            });
        }

        // 5.3 创建订单头
        let order_no = generate_order_no();
        let order = NewOrder {
            order_no: order_no.clone(),
            user_id: request.user_id.clone(),
            total_points,
            delivery_method: request.delivery_method,
            recipient_name: request.recipient_name.clone(),
            recipient_phone: request.recipient_phone.clone(),
            recipient_address: request.recipient_address.clone(),
            notes: request.notes.clone(),
        };
        let order_id = OrderRepository::create_in_tx(&mut tx, &order).await?;

        // 5.4 写入订单明细
        let items: Vec<NewOrderItem> = resolved.iter().map(|line| line.item.clone()).collect();
        OrderRepository::create_items_in_tx(&mut tx, order_id, &items).await?;

        // 5.5 追加负向流水，订单总额与流水绝对值天然一致
        let debit =
            NewLedgerEntry::order_debit(&request.user_id, total_points, order_id, &order_no);
        LedgerRepository::create_in_tx(&mut tx, &debit).await?;

        // 5.6 条件扣减库存，数据库保证不会扣成负数
        for line in resolved {
            if let Some((variant_id, quantity)) = line.decrement {
                let decremented =
                    ProductRepository::decrement_inventory_in_tx(&mut tx, variant_id, quantity)
                        .await?;
                if !decremented {
                    // 预检之后被并发订单抢走，回滚整单
                    return Err(MallError::InsufficientInventory {
                        variant_id,
                        requested: quantity,
                    });
                }
            }
        }

        // 5.7 提交
        tx.commit().await?;

        Ok((order_id, order_no, balance - total_points))
    }
}

/// 配送订单必须填写收货人与地址
fn validate_shipping(request: &PlaceOrderRequest) -> Result<()> {
    if !request.delivery_method.requires_shipping() {
        return Ok(());
    }

    let name_ok = request
        .recipient_name
        .as_deref()
        .is_some_and(|v| !v.trim().is_empty());
    let address_ok = request
        .recipient_address
        .as_deref()
        .is_some_and(|v| !v.trim().is_empty());

    if !name_ok || !address_ok {
        return Err(MallError::Validation(
            "配送订单必须填写收货人姓名和收货地址".to_string(),
        ));
    }
    Ok(())
}

/// 规范化购物车
///
/// 按 (product_id, variant_id) 合并重复行并累加数量，保持首次出现的顺序；
/// 任何一行数量不为正则整体拒绝。
fn normalize_cart(lines: &[CartLineInput]) -> Result<Vec<CartLineInput>> {
    let mut merged: Vec<CartLineInput> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.quantity <= 0 {
            return Err(MallError::Validation(format!(
                "商品数量必须大于 0: product_id={}",
                line.product_id
            )));
        }

        match merged
            .iter_mut()
            .find(|m| m.product_id == line.product_id && m.variant_id == line.variant_id)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line.clone()),
        }
    }

    Ok(merged)
}

/// 计算单件积分价
///
/// 基础价和规格调价各自乘汇率、各自四舍五入（远离零）后相加。
pub fn compute_points_per_item(
    base_price_usd: Decimal,
    price_adjustment_usd: Decimal,
    rate: Decimal,
) -> Result<i64> {
    let base_points = (base_price_usd * rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let adjustment_points = (price_adjustment_usd * rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    (base_points + adjustment_points)
        .to_i64()
        .ok_or_else(|| MallError::Internal("积分价格超出可表示范围".to_string()))
}

/// 生成订单号
///
/// 格式：PM + 14位时间戳 + 6位随机数
fn generate_order_no() -> String {
    let now = chrono::Utc::now();
    let uuid = Uuid::new_v4();
    let random = uuid.as_u128() % 1_000_000;
    format!("PM{}{:06}", now.format("%Y%m%d%H%M%S"), random)
}
