//! Flow REST Access API 数据结构
//!
//! uint64 字段在 JSON 中以字符串编码；脚本、参数与签名使用 base64，
//! 区块 ID 与地址使用无前缀 hex。

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::domain::{
    account::{Account, AccountKey, FlowAddress},
    algorithms::{HashAlgorithm, SignatureAlgorithm},
    keys::PublicKey,
    transaction_status::{TransactionId, TransactionStatus},
};
use crate::error::{WalletError, WalletResult};
use crate::service::transaction_builder::{FlowTransaction, TransactionSignature};

/// 字符串编码的 u64，反序列化时同时接受数字
pub mod u64_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
            Raw::Num(n) => Ok(n),
        }
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn base64_decode(value: &str) -> WalletResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| WalletError::decode(format!("Invalid base64: {}", e)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 区块
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeaderDto {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(with = "u64_string")]
    pub height: u64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDto {
    pub header: BlockHeaderDto,
}

impl BlockHeaderDto {
    pub fn id_bytes(&self) -> WalletResult<[u8; 32]> {
        let raw = hex::decode(self.id.trim_start_matches("0x"))
            .map_err(|e| WalletError::decode(format!("Invalid block id: {}", e)))?;
        raw.as_slice().try_into().map_err(|_| {
            WalletError::decode(format!("Invalid block id length: {} bytes", raw.len()))
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 账户
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountKeyDto {
    #[serde(with = "u64_string")]
    pub index: u64,
    pub public_key: String,
    pub signing_algorithm: String,
    pub hashing_algorithm: String,
    #[serde(with = "u64_string")]
    pub sequence_number: u64,
    #[serde(with = "u64_string")]
    pub weight: u64,
    #[serde(default)]
    pub revoked: bool,
}

impl AccountKeyDto {
    pub fn into_domain(self) -> WalletResult<AccountKey> {
        let sign_algo: SignatureAlgorithm = self.signing_algorithm.parse()?;
        let hash_algo: HashAlgorithm = self.hashing_algorithm.parse()?;
        let public_key = PublicKey::from_flow_hex(&self.public_key, sign_algo.curve())?;

        let index = u32::try_from(self.index)
            .map_err(|_| WalletError::decode(format!("Key index out of range: {}", self.index)))?;
        let weight = u32::try_from(self.weight)
            .map_err(|_| WalletError::decode(format!("Key weight out of range: {}", self.weight)))?;

        Ok(AccountKey {
            index: Some(index),
            public_key,
            sign_algo,
            hash_algo,
            weight,
            sequence_number: self.sequence_number,
            revoked: self.revoked,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDto {
    pub address: String,
    #[serde(with = "u64_string")]
    pub balance: u64,
    #[serde(default)]
    pub keys: Vec<AccountKeyDto>,
}

impl AccountDto {
    pub fn into_domain(self) -> WalletResult<Account> {
        let address = FlowAddress::from_hex(&self.address)?;
        let keys = self
            .keys
            .into_iter()
            .map(AccountKeyDto::into_domain)
            .collect::<WalletResult<Vec<_>>>()?;

        Ok(Account {
            address,
            balance: self.balance,
            keys,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 交易提交
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalKeyDto {
    pub address: String,
    #[serde(with = "u64_string")]
    pub key_index: u64,
    #[serde(with = "u64_string")]
    pub sequence_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignatureDto {
    pub address: String,
    #[serde(with = "u64_string")]
    pub key_index: u64,
    pub signature: String,
}

impl From<&TransactionSignature> for TransactionSignatureDto {
    fn from(sig: &TransactionSignature) -> Self {
        Self {
            address: sig.address.to_rest_hex(),
            key_index: u64::from(sig.key_index),
            signature: sig.signature.to_base64(),
        }
    }
}

/// POST /v1/transactions 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBodyDto {
    pub script: String,
    pub arguments: Vec<String>,
    pub reference_block_id: String,
    #[serde(with = "u64_string")]
    pub gas_limit: u64,
    pub payer: String,
    pub proposal_key: ProposalKeyDto,
    pub authorizers: Vec<String>,
    pub payload_signatures: Vec<TransactionSignatureDto>,
    pub envelope_signatures: Vec<TransactionSignatureDto>,
}

impl From<&FlowTransaction> for TransactionBodyDto {
    fn from(tx: &FlowTransaction) -> Self {
        Self {
            script: base64_encode(&tx.script),
            arguments: tx.arguments.iter().map(|a| base64_encode(a)).collect(),
            reference_block_id: hex::encode(tx.reference_block_id),
            gas_limit: tx.gas_limit,
            payer: tx.payer.to_rest_hex(),
            proposal_key: ProposalKeyDto {
                address: tx.proposer.to_rest_hex(),
                key_index: u64::from(tx.proposer_key_index),
                sequence_number: tx.proposer_sequence_number,
            },
            authorizers: tx.authorizers.iter().map(FlowAddress::to_rest_hex).collect(),
            payload_signatures: tx.payload_signatures.iter().map(Into::into).collect(),
            envelope_signatures: tx.envelope_signatures.iter().map(Into::into).collect(),
        }
    }
}

impl TransactionBodyDto {
    pub fn decoded_script(&self) -> WalletResult<String> {
        String::from_utf8(base64_decode(&self.script)?)
            .map_err(|e| WalletError::decode(format!("Script is not UTF-8: {}", e)))
    }

    pub fn decoded_arguments(&self) -> WalletResult<Vec<serde_json::Value>> {
        self.arguments
            .iter()
            .map(|a| {
                let bytes = base64_decode(a)?;
                serde_json::from_slice(&bytes)
                    .map_err(|e| WalletError::decode(format!("Invalid argument JSON: {}", e)))
            })
            .collect()
    }
}

/// POST /v1/transactions 响应（只关心 id）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedTransactionDto {
    pub id: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 交易结果
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDto {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResultDto {
    #[serde(default)]
    pub block_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub status_code: u32,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub execution: Option<String>,
    #[serde(default, with = "u64_string")]
    pub computation_used: u64,
    #[serde(default)]
    pub events: Vec<EventDto>,
}

/// 已封存（或最后一次观察到）的交易结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub id: TransactionId,
    pub status: TransactionStatus,
    pub status_code: u32,
    pub error_message: String,
    pub computation_used: u64,
    pub events: Vec<EventDto>,
}

impl TransactionResult {
    pub fn from_dto(id: TransactionId, dto: TransactionResultDto) -> Self {
        Self {
            id,
            status: TransactionStatus::from_str(&dto.status),
            status_code: dto.status_code,
            error_message: dto.error_message,
            computation_used: dto.computation_used,
            events: dto.events,
        }
    }

    /// 执行是否出错（status_code 非零或带错误信息）
    pub fn is_failed(&self) -> bool {
        self.status_code != 0 || !self.error_message.is_empty()
    }
}

/// 非 2xx 响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBodyDto {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_dto_parsing() {
        let json = r#"{
            "address": "0x4f05d22690e07938",
            "balance": "100100000",
            "keys": [{
                "index": "0",
                "public_key": "0xad94008dea1505863fc92bd2db5b9fbf52a57f2a05d34fedb693c714bdc731cca57be95775517a9df788a564f2d7491d2c9716d1c0411a5a64155895749d47bc",
                "signing_algorithm": "ECDSA_secp256k1",
                "hashing_algorithm": "SHA3_256",
                "sequence_number": "42",
                "weight": "1000",
                "revoked": false
            }],
            "_expandable": {}
        }"#;

        let dto: AccountDto = serde_json::from_str(json).unwrap();
        let account = dto.into_domain().unwrap();
        assert_eq!(account.address.to_hex(), "0x4f05d22690e07938");
        assert_eq!(account.balance, 100_100_000);

        let key = account.key(0).unwrap();
        assert_eq!(key.sequence_number, 42);
        assert_eq!(key.weight, 1000);
        assert_eq!(key.sign_algo, SignatureAlgorithm::EcdsaSecp256k1);
        assert_eq!(key.hash_algo, HashAlgorithm::Sha3_256);
    }

    #[test]
    fn test_u64_string_accepts_numbers() {
        let header: BlockHeaderDto =
            serde_json::from_str(r#"{"id":"00","height":12}"#).unwrap();
        assert_eq!(header.height, 12);

        let header: BlockHeaderDto =
            serde_json::from_str(r#"{"id":"00","height":"13"}"#).unwrap();
        assert_eq!(header.height, 13);

        let json = serde_json::to_value(&ProposalKeyDto {
            address: "01".into(),
            key_index: 1,
            sequence_number: 2,
        })
        .unwrap();
        assert_eq!(json["sequence_number"], "2");
    }

    #[test]
    fn test_block_id_bytes() {
        let header = BlockHeaderDto {
            id: "f0e4c2f76c58916ec258f246851bea091d14d4247a2fc3e18694461b1816e13b".into(),
            parent_id: None,
            height: 1,
            timestamp: None,
        };
        assert_eq!(header.id_bytes().unwrap()[0], 0xf0);

        let short = BlockHeaderDto {
            id: "abcd".into(),
            ..header
        };
        assert!(short.id_bytes().is_err());
    }

    #[test]
    fn test_transaction_result_failure() {
        let dto: TransactionResultDto = serde_json::from_str(
            r#"{"status":"Sealed","status_code":1,"error_message":"[Error Code: 1101] cadence runtime error","computation_used":"10","events":[]}"#,
        )
        .unwrap();
        let result = TransactionResult::from_dto(TransactionId::from_bytes([1u8; 32]), dto);
        assert_eq!(result.status, TransactionStatus::Sealed);
        assert!(result.is_failed());
    }
}
