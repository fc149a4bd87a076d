//! Cadence 脚本与 JSON-Cadence 参数编码

use serde::{Deserialize, Serialize};

use crate::domain::account::{AccountKey, FlowAddress};
use crate::error::{WalletError, WalletResult};

/// 仅输出一条日志的交易，用于连通性与签名验证
pub const SIMPLE_TRANSACTION: &str = r#"transaction {
  execute {
    log("A transaction happened")
  }
}"#;

/// 为签名账户添加一把公钥（Cadence 1.0）
pub const ADD_ACCOUNT_KEY: &str = r#"transaction(publicKey: String, signatureAlgorithm: UInt8, hashAlgorithm: UInt8, weight: UFix64) {
  prepare(signer: auth(AddKey) &Account) {
    let key = PublicKey(
      publicKey: publicKey.decodeHex(),
      signatureAlgorithm: SignatureAlgorithm(rawValue: signatureAlgorithm)!
    )
    signer.keys.add(
      publicKey: key,
      hashAlgorithm: HashAlgorithm(rawValue: hashAlgorithm)!,
      weight: weight
    )
  }
}"#;

/// UFix64 的小数精度
const UFIX64_DECIMALS: u32 = 8;
const UFIX64_SCALE: u64 = 10u64.pow(UFIX64_DECIMALS);

/// JSON-Cadence 参数值
///
/// 所有数值都按字符串编码，与 Access API 的要求一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CadenceValue {
    String(String),
    UInt8(String),
    UInt64(String),
    UFix64(String),
    Address(String),
}

impl CadenceValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn uint8(value: u8) -> Self {
        Self::UInt8(value.to_string())
    }

    pub fn uint64(value: u64) -> Self {
        Self::UInt64(value.to_string())
    }

    /// 以 10^-8 为单位的原始值
    pub fn ufix64_raw(raw: u64) -> Self {
        Self::UFix64(format!(
            "{}.{:08}",
            raw / UFIX64_SCALE,
            raw % UFIX64_SCALE
        ))
    }

    /// 整数值，如权重 1000 → "1000.00000000"
    pub fn ufix64(whole: u64) -> WalletResult<Self> {
        let raw = whole
            .checked_mul(UFIX64_SCALE)
            .ok_or_else(|| WalletError::decode(format!("UFix64 overflow: {}", whole)))?;
        Ok(Self::ufix64_raw(raw))
    }

    pub fn address(address: FlowAddress) -> Self {
        Self::Address(address.to_hex())
    }

    /// 编码为 Access API 期望的 JSON 字节
    pub fn to_json_bytes(&self) -> WalletResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| WalletError::decode(format!("Failed to encode Cadence value: {}", e)))
    }
}

/// ADD_ACCOUNT_KEY 的参数：公钥 hex（无 04）、签名算法、哈希算法、权重
pub fn add_key_arguments(key: &AccountKey) -> WalletResult<Vec<CadenceValue>> {
    Ok(vec![
        CadenceValue::string(key.public_key_hex()),
        CadenceValue::uint8(key.sign_algo.cadence_raw_value()),
        CadenceValue::uint8(key.hash_algo.cadence_raw_value()),
        CadenceValue::ufix64(u64::from(key.weight))?,
    ])
}
