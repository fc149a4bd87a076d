//! 日志系统配置模块
//! 支持结构化日志和日志级别配置

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::error::{WalletError, WalletResult};

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置中的级别；重复初始化返回错误
pub fn init_logging(config: &LoggingConfig) -> WalletResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = if config.format == "json" {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(true).with_ansi(true))
            .try_init()
    };

    result.map_err(|e| WalletError::Config(format!("Failed to initialise logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let config = LoggingConfig {
            level: "warn".into(),
            format: "json".into(),
        };
        // 同一进程中可能已有其他测试安装了订阅者，只断言第二次一定失败
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
