//! Flow 交易状态与交易 ID
//!
//! 状态推进顺序：Pending → Finalized → Executed → Sealed，
//! 或在引用区块过期后直接进入 Expired。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

pub const TRANSACTION_ID_LENGTH: usize = 32;

/// 节点上报的交易状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// 节点尚未见到该交易
    Unknown,

    /// 已进入内存池，等待打包
    Pending,

    /// 已打包进区块
    Finalized,

    /// 已执行，执行结果尚未被验证节点封存
    Executed,

    /// 已封存，结果不可逆
    Sealed,

    /// 引用区块过旧，交易不会再被打包
    Expired,
}

impl TransactionStatus {
    /// 是否为最终状态（不会再变化）
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Sealed | Self::Expired)
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::Sealed)
    }

    /// 从节点返回的字符串解析，大小写不敏感
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pending" => Self::Pending,
            "finalized" => Self::Finalized,
            "executed" => Self::Executed,
            "sealed" => Self::Sealed,
            "expired" => Self::Expired,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Pending => "pending",
            Self::Finalized => "finalized",
            Self::Executed => "executed",
            Self::Sealed => "sealed",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 32 字节交易 ID（RLP 编码交易的 SHA3-256）
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId([u8; TRANSACTION_ID_LENGTH]);

impl TransactionId {
    pub fn from_bytes(bytes: [u8; TRANSACTION_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(hex_str: &str) -> WalletResult<Self> {
        let raw = hex::decode(hex_str.trim().trim_start_matches("0x"))
            .map_err(|e| WalletError::decode(format!("Invalid transaction id: {}", e)))?;
        let bytes: [u8; TRANSACTION_ID_LENGTH] = raw.as_slice().try_into().map_err(|_| {
            WalletError::decode(format!(
                "Invalid transaction id length: expected {}, got {}",
                TRANSACTION_ID_LENGTH,
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; TRANSACTION_ID_LENGTH] {
        &self.0
    }

    /// 无前缀 hex，与 REST API 路径一致
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(TransactionStatus::from_str("Sealed"), TransactionStatus::Sealed);
        assert_eq!(TransactionStatus::from_str("PENDING"), TransactionStatus::Pending);
        assert_eq!(TransactionStatus::from_str("Expired"), TransactionStatus::Expired);
        assert_eq!(TransactionStatus::from_str("bogus"), TransactionStatus::Unknown);
    }

    #[test]
    fn test_final_states() {
        use TransactionStatus::*;

        assert!(Sealed.is_final());
        assert!(Expired.is_final());
        assert!(!Executed.is_final());
        assert!(Sealed.is_sealed());
        assert!(!Expired.is_sealed());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransactionStatus::Executed.to_string(), "executed");
        assert_eq!(TransactionStatus::Expired.as_str(), "expired");
    }

    #[test]
    fn test_transaction_id_hex() {
        let hex_id = "b3ea2fe3c9a0e6f6b5f4f1a6e3e1e5c1a0e0d5e0c8a2f0a1b2c3d4e5f6a7b8c9";
        let id = TransactionId::from_hex(hex_id).unwrap();
        assert_eq!(id.to_hex(), hex_id);
        assert_eq!(TransactionId::from_hex(&format!("0x{}", hex_id)).unwrap(), id);
        assert!(TransactionId::from_hex("abcd").is_err());
        assert!(TransactionId::from_hex("zz").is_err());
    }
}
