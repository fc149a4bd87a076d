//! 签名格式
//!
//! 原生签名输出为 r(32) ‖ s(32) ‖ v(1)，Flow 只接受 r ‖ s。
//! 截断前必须先校验长度，长度不符时报错而不是静默截断。

use std::fmt;

use base64::Engine;

use crate::error::{WalletError, WalletResult};

pub const RAW_SIGNATURE_LENGTH: usize = 65;
pub const CHAIN_SIGNATURE_LENGTH: usize = 64;

/// 原生签名输出 r ‖ s ‖ recovery
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawSignature([u8; RAW_SIGNATURE_LENGTH]);

impl RawSignature {
    pub fn new(bytes: [u8; RAW_SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; RAW_SIGNATURE_LENGTH] {
        &self.0
    }

    /// 丢弃 recovery 字节
    pub fn truncate(&self) -> ChainSignature {
        let mut out = [0u8; CHAIN_SIGNATURE_LENGTH];
        out.copy_from_slice(&self.0[..CHAIN_SIGNATURE_LENGTH]);
        ChainSignature(out)
    }
}

impl fmt::Debug for RawSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSignature({})", hex::encode(self.0))
    }
}

/// 链上签名格式 r ‖ s，大端
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainSignature([u8; CHAIN_SIGNATURE_LENGTH]);

impl ChainSignature {
    /// 从原生输出构造：长度必须恰好 65
    pub fn from_raw(raw: &[u8]) -> WalletResult<Self> {
        let fixed: [u8; RAW_SIGNATURE_LENGTH] = raw.try_into().map_err(|_| {
            WalletError::signing(format!(
                "Native signer returned {} bytes, expected {} (r ‖ s ‖ v)",
                raw.len(),
                RAW_SIGNATURE_LENGTH
            ))
        })?;
        Ok(RawSignature::new(fixed).truncate())
    }

    /// 已是 64 字节 r ‖ s 的签名（例如从节点读回）
    pub fn from_slice(bytes: &[u8]) -> WalletResult<Self> {
        let fixed: [u8; CHAIN_SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            WalletError::decode(format!(
                "Invalid signature length: expected {}, got {}",
                CHAIN_SIGNATURE_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(fixed))
    }

    pub fn as_bytes(&self) -> &[u8; CHAIN_SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// REST Access API 使用 base64
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }
}

impl fmt::Debug for ChainSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainSignature({})", self.to_hex())
    }
}

impl fmt::Display for ChainSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
