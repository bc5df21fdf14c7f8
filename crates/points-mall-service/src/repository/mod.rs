//! 数据库仓储层
//!
//! 封装所有 SQL 操作，仓储不包含业务逻辑。
//!
//! ## 设计原则
//!
//! - 事务边界由服务层决定，事务内操作以 `*_in_tx` 关联函数提供
//! - 余额、退款判定等派生状态一律实时查询，不做缓存
//! - 库存扣减用条件 UPDATE 下推到数据库，杜绝读改写竞态
//! - 档案与流水仓储定义 trait 接口以支持 mock 测试

mod export_repo;
mod ledger_repo;
mod order_repo;
mod product_repo;
mod profile_repo;
mod traits;

pub use export_repo::ExportRepository;
pub use ledger_repo::LedgerRepository;
pub use order_repo::OrderRepository;
pub use product_repo::ProductRepository;
pub use profile_repo::ProfileRepository;
pub use traits::*;
