//! 统一错误类型
//!
//! 所有失败都原样返回给直接调用方，本层不做吞错、不做自动重试

use std::time::Duration;

use thiserror::Error;

use crate::domain::{CurveType, TransactionId, TransactionStatus};

pub type WalletResult<T> = std::result::Result<T, WalletError>;

#[derive(Debug, Error)]
pub enum WalletError {
    /// 助记词、口令或派生路径无效
    #[error("Key derivation failed: {0}")]
    Derivation(String),

    /// 私钥曲线与签名算法不匹配（调用方编程错误）
    #[error("Curve mismatch: expected {expected}, got {actual}")]
    CurveMismatch {
        expected: CurveType,
        actual: CurveType,
    },

    /// 签名原语拒绝输入（摘要长度错误、私钥无效等）
    #[error("Signing failed: {0}")]
    Signing(String),

    /// 节点拒绝交易（序列号错误、权重不足、脚本错误）
    #[error("Transaction submission failed: {0}")]
    Submission(String),

    /// 等待 Sealed 超时，与明确拒绝区分开
    #[error("Transaction {id} not sealed after {waited:?} (last status: {last_status})")]
    SealTimeout {
        id: TransactionId,
        last_status: TransactionStatus,
        waited: Duration,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl WalletError {
    /// 稳定的错误码，便于上层映射
    pub fn code(&self) -> &'static str {
        match self {
            Self::Derivation(_) => "derivation_failure",
            Self::CurveMismatch { .. } => "curve_mismatch",
            Self::Signing(_) => "signing_failure",
            Self::Submission(_) => "submission_failure",
            Self::SealTimeout { .. } => "seal_timeout",
            Self::Config(_) => "config_error",
            Self::Network(_) => "network_error",
            Self::Decode(_) => "decode_error",
        }
    }

    /// 调用方是否可以考虑重试（本 crate 自身从不重试）
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::SealTimeout { .. })
    }

    pub(crate) fn derivation(msg: impl Into<String>) -> Self {
        Self::Derivation(msg.into())
    }

    pub(crate) fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    pub(crate) fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            WalletError::derivation("bad mnemonic").code(),
            "derivation_failure"
        );
        assert_eq!(
            WalletError::CurveMismatch {
                expected: CurveType::P256,
                actual: CurveType::Secp256k1,
            }
            .code(),
            "curve_mismatch"
        );
        assert_eq!(WalletError::signing("x").code(), "signing_failure");
        assert_eq!(WalletError::submission("x").code(), "submission_failure");
    }

    #[test]
    fn test_retryable() {
        let timeout = WalletError::SealTimeout {
            id: TransactionId::from_bytes([0u8; 32]),
            last_status: TransactionStatus::Pending,
            waited: Duration::from_secs(60),
        };
        assert!(timeout.is_retryable());
        assert!(!WalletError::submission("invalid sequence number").is_retryable());
        assert!(!WalletError::signing("bad digest").is_retryable());
    }

    #[test]
    fn test_curve_mismatch_message() {
        let err = WalletError::CurveMismatch {
            expected: CurveType::P256,
            actual: CurveType::Secp256k1,
        };
        assert_eq!(
            err.to_string(),
            "Curve mismatch: expected p256, got secp256k1"
        );
    }
}
