//! 日志初始化模块
//!
//! 基于 tracing-subscriber 提供统一的日志初始化：环境过滤 + pretty/JSON 输出。
//! 所有进程入口（含集成测试）通过单一入口点完成初始化。

use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;
use crate::error::{MallError, Result};

/// 初始化日志
///
/// RUST_LOG 环境变量优先于配置中的 log_level。重复初始化返回错误，
/// 测试场景可忽略该错误。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if config.log_format == "json" {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| MallError::Observability(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_failure() {
        let config = ObservabilityConfig::default();
        // 第一次初始化成功或已被其他测试初始化，第二次必然报错
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}
