//! 配置管理模块
//! 支持从环境变量和配置文件加载配置
//!
//! 库本身不读取全局状态：`FlowClient` 只使用调用方传入的 `NetworkConfig`。
//! 这里的 `Default` 实现读取环境变量，仅供二进制和测试组装配置时使用。

use std::{fmt, path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

pub const MAINNET_ACCESS_NODE: &str = "https://rest-mainnet.onflow.org";
pub const TESTNET_ACCESS_NODE: &str = "https://rest-testnet.onflow.org";
pub const EMULATOR_ACCESS_NODE: &str = "http://127.0.0.1:8888";

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    #[serde(default)]
    pub seal: SealConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Flow 网络
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowNetwork {
    Mainnet,
    Testnet,
    Emulator,
}

impl FlowNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Emulator => "emulator",
        }
    }

    /// REST Access API 默认入口
    pub fn access_node_url(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_ACCESS_NODE,
            Self::Testnet => TESTNET_ACCESS_NODE,
            Self::Emulator => EMULATOR_ACCESS_NODE,
        }
    }
}

impl fmt::Display for FlowNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowNetwork {
    type Err = WalletError;

    fn from_str(s: &str) -> WalletResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "emulator" | "local" => Ok(Self::Emulator),
            other => Err(WalletError::Config(format!("Unknown Flow network: {}", other))),
        }
    }
}

/// 网络配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network: FlowNetwork,
    /// 覆盖默认 Access 节点（自建节点或 mock）
    #[serde(default)]
    pub access_node_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl NetworkConfig {
    pub fn new(network: FlowNetwork) -> Self {
        Self {
            network,
            access_node_url: None,
            request_timeout_secs: 30,
        }
    }

    pub fn mainnet() -> Self {
        Self::new(FlowNetwork::Mainnet)
    }

    pub fn testnet() -> Self {
        Self::new(FlowNetwork::Testnet)
    }

    pub fn emulator() -> Self {
        Self::new(FlowNetwork::Emulator)
    }

    pub fn with_access_node(mut self, url: impl Into<String>) -> Self {
        self.access_node_url = Some(url.into());
        self
    }

    /// 实际使用的 Access 节点地址（去掉末尾斜杠）
    pub fn access_node_url(&self) -> String {
        self.access_node_url
            .as_deref()
            .unwrap_or_else(|| self.network.access_node_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network: std::env::var("FLOW_NETWORK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(FlowNetwork::Testnet),
            access_node_url: std::env::var("FLOW_ACCESS_NODE_URL").ok(),
            request_timeout_secs: std::env::var("FLOW_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// 等待 Sealed 的轮询参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealConfig {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

impl SealConfig {
    pub fn new(poll_interval_ms: u64, timeout_secs: u64) -> Self {
        Self {
            poll_interval_ms,
            timeout_secs,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: std::env::var("FLOW_SEAL_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            timeout_secs: std::env::var("FLOW_SEAL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> WalletResult<Self> {
        Ok(Self {
            network: NetworkConfig::default(),
            seal: SealConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> WalletResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WalletError::Config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| WalletError::Config(format!("Failed to parse config file as TOML: {}", e)))
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> WalletResult<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> WalletResult<()> {
        let url = self.network.access_node_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WalletError::Config(format!(
                "Access node URL must start with http:// or https://: {}",
                url
            )));
        }

        if self.network.request_timeout_secs == 0 {
            return Err(WalletError::Config(
                "FLOW_REQUEST_TIMEOUT_SECS must be greater than 0".into(),
            ));
        }

        if self.seal.poll_interval_ms == 0 {
            return Err(WalletError::Config(
                "FLOW_SEAL_POLL_INTERVAL_MS must be greater than 0".into(),
            ));
        }

        if self.seal.timeout() < self.seal.poll_interval() {
            return Err(WalletError::Config(
                "FLOW_SEAL_TIMEOUT_SECS must not be shorter than the poll interval".into(),
            ));
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(WalletError::Config(format!(
                "LOG_LEVEL must be one of: {:?}",
                valid_levels
            )));
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            return Err(WalletError::Config(
                "LOG_FORMAT must be 'json' or 'text'".into(),
            ));
        }

        Ok(())
    }
}
