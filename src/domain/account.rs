//! Flow 账户模型：地址、提议者 key、账户 key 注册记录

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{
    algorithms::{HashAlgorithm, SignatureAlgorithm},
    keys::PublicKey,
};
use crate::error::{WalletError, WalletResult};

pub const ADDRESS_LENGTH: usize = 8;

/// 满权重（单 key 即可签名）
pub const FULL_WEIGHT: u32 = 1000;

/// 8 字节 Flow 地址
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowAddress([u8; ADDRESS_LENGTH]);

impl FlowAddress {
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// 解析 hex 地址，可带 0x，不足 8 字节左侧补零
    pub fn from_hex(hex_str: &str) -> WalletResult<Self> {
        let trimmed = hex_str.trim().trim_start_matches("0x");
        if trimmed.is_empty() || trimmed.len() > ADDRESS_LENGTH * 2 {
            return Err(WalletError::decode(format!("Invalid Flow address: {}", hex_str)));
        }

        let padded = format!("{:0>16}", trimmed);
        let raw = hex::decode(&padded)
            .map_err(|e| WalletError::decode(format!("Invalid Flow address {}: {}", hex_str, e)))?;

        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// 0x 前缀 hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// REST Access API 使用的无前缀形式
    pub fn to_rest_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FlowAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FlowAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowAddress({})", self.to_hex())
    }
}

impl FromStr for FlowAddress {
    type Err = WalletError;

    fn from_str(s: &str) -> WalletResult<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for FlowAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FlowAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// 交易提议者 key
///
/// `sequence_number == None` 表示提交前从链上读取当前序列号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalKey {
    pub address: FlowAddress,
    pub key_index: u32,
    pub sequence_number: Option<u64>,
}

impl ProposalKey {
    /// 兼容 `-1` 约定：负数序列号表示由网络获取
    pub fn new(address: FlowAddress, key_index: u32, sequence_number: i64) -> Self {
        Self {
            address,
            key_index,
            sequence_number: u64::try_from(sequence_number).ok(),
        }
    }

    pub fn latest(address: FlowAddress, key_index: u32) -> Self {
        Self {
            address,
            key_index,
            sequence_number: None,
        }
    }

    pub fn with_sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }
}

/// 账户 key 注册记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
    /// 链上 key 列表中的位置（新建时为 None）
    pub index: Option<u32>,
    pub public_key: PublicKey,
    pub sign_algo: SignatureAlgorithm,
    pub hash_algo: HashAlgorithm,
    pub weight: u32,
    pub sequence_number: u64,
    pub revoked: bool,
}

impl AccountKey {
    /// 新 key，公钥曲线必须与签名算法一致
    pub fn new(
        public_key: PublicKey,
        sign_algo: SignatureAlgorithm,
        hash_algo: HashAlgorithm,
        weight: u32,
    ) -> WalletResult<Self> {
        if public_key.curve() != sign_algo.curve() {
            return Err(WalletError::CurveMismatch {
                expected: sign_algo.curve(),
                actual: public_key.curve(),
            });
        }

        Ok(Self {
            index: None,
            public_key,
            sign_algo,
            hash_algo,
            weight,
            sequence_number: 0,
            revoked: false,
        })
    }

    /// 上链格式的公钥 hex（无 04 前缀）
    pub fn public_key_hex(&self) -> String {
        self.public_key.to_flow_hex()
    }
}

/// 链上账户快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: FlowAddress,
    /// 余额（UFix64 原始值，10^-8 FLOW）
    pub balance: u64,
    pub keys: Vec<AccountKey>,
}

impl Account {
    pub fn key(&self, index: u32) -> Option<&AccountKey> {
        self.keys.iter().find(|k| k.index == Some(index))
    }
}
