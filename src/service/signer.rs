//! 签名适配层（Signer Adapter）
//!
//! 对 {P-256, secp256k1} × {SHA2-256, SHA3-256} 四种组合做单点分发：
//! 先按哈希算法计算 32 字节摘要，再调用曲线原语签名，
//! 最后把原生 r ‖ s ‖ v 输出截断为链上要求的 r ‖ s。

use async_trait::async_trait;
use k256::ecdsa::signature::hazmat::PrehashVerifier;

use crate::domain::{
    account::FlowAddress,
    algorithms::{SigningScheme, DIGEST_LENGTH},
    keys::{PrivateKey, PublicKey},
    signature::{ChainSignature, RAW_SIGNATURE_LENGTH},
};
use crate::error::{WalletError, WalletResult};

/// 一次签名的结果：签名本身 + 归属的账户与 key 序号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySignature {
    pub address: FlowAddress,
    pub key_index: u32,
    pub signature: ChainSignature,
}

/// 链客户端消费的签名接口
///
/// 实现方可以是本地私钥，也可以是硬件或远程签名服务
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn address(&self) -> FlowAddress;

    fn key_index(&self) -> u32;

    /// 对完整消息签名（哈希由实现方负责）
    async fn sign(&self, message: &[u8]) -> WalletResult<KeySignature>;
}

/// 持有私钥的本地签名器
#[derive(Debug, Clone)]
pub struct KeySigner {
    address: FlowAddress,
    key_index: u32,
    scheme: SigningScheme,
    key: PrivateKey,
}

impl KeySigner {
    /// 私钥曲线必须与签名方案一致，否则直接拒绝构造
    pub fn new(
        address: FlowAddress,
        key_index: u32,
        scheme: SigningScheme,
        key: PrivateKey,
    ) -> WalletResult<Self> {
        if key.curve() != scheme.curve() {
            return Err(WalletError::CurveMismatch {
                expected: scheme.curve(),
                actual: key.curve(),
            });
        }

        Ok(Self {
            address,
            key_index,
            scheme,
            key,
        })
    }

    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    pub fn public_key(&self) -> WalletResult<PublicKey> {
        self.key.public_key()
    }

    /// 同步签名，供不需要 async 的调用方使用
    pub fn sign_message(&self, message: &[u8]) -> WalletResult<ChainSignature> {
        let digest = self.scheme.hash_algorithm().digest(message);
        sign_digest(self.scheme, &self.key, &digest)
    }
}

#[async_trait]
impl TransactionSigner for KeySigner {
    fn address(&self) -> FlowAddress {
        self.address
    }

    fn key_index(&self) -> u32 {
        self.key_index
    }

    async fn sign(&self, message: &[u8]) -> WalletResult<KeySignature> {
        let signature = self.sign_message(message)?;
        tracing::debug!(
            address = %self.address,
            key_index = self.key_index,
            scheme = %self.scheme,
            "Signed message"
        );

        Ok(KeySignature {
            address: self.address,
            key_index: self.key_index,
            signature,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 分发点
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 对 32 字节摘要签名，返回 64 字节 r ‖ s
pub fn sign_digest(
    scheme: SigningScheme,
    key: &PrivateKey,
    digest: &[u8],
) -> WalletResult<ChainSignature> {
    if key.curve() != scheme.curve() {
        return Err(WalletError::CurveMismatch {
            expected: scheme.curve(),
            actual: key.curve(),
        });
    }
    if digest.len() != DIGEST_LENGTH {
        return Err(WalletError::signing(format!(
            "Digest must be {} bytes, got {}",
            DIGEST_LENGTH,
            digest.len()
        )));
    }

    let raw = match scheme {
        SigningScheme::Secp256k1Sha2 | SigningScheme::Secp256k1Sha3 => {
            sign_secp256k1(key, digest)?
        }
        SigningScheme::P256Sha2 | SigningScheme::P256Sha3 => sign_p256(key, digest)?,
    };

    ChainSignature::from_raw(&raw)
}

fn sign_secp256k1(key: &PrivateKey, digest: &[u8]) -> WalletResult<Vec<u8>> {
    let signing_key = k256::ecdsa::SigningKey::from_slice(key.as_bytes())
        .map_err(|e| WalletError::signing(format!("Invalid secp256k1 key: {}", e)))?;
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|e| WalletError::signing(format!("secp256k1 signing failed: {}", e)))?;

    let mut raw = Vec::with_capacity(RAW_SIGNATURE_LENGTH);
    raw.extend_from_slice(&signature.to_bytes());
    raw.push(recovery_id.to_byte());
    Ok(raw)
}

fn sign_p256(key: &PrivateKey, digest: &[u8]) -> WalletResult<Vec<u8>> {
    let signing_key = p256::ecdsa::SigningKey::from_slice(key.as_bytes())
        .map_err(|e| WalletError::signing(format!("Invalid P-256 key: {}", e)))?;
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|e| WalletError::signing(format!("P-256 signing failed: {}", e)))?;

    let mut raw = Vec::with_capacity(RAW_SIGNATURE_LENGTH);
    raw.extend_from_slice(&signature.to_bytes());
    raw.push(recovery_id.to_byte());
    Ok(raw)
}

/// 验证消息签名（内部按方案哈希）
pub fn verify(
    scheme: SigningScheme,
    public_key: &PublicKey,
    message: &[u8],
    signature: &ChainSignature,
) -> WalletResult<bool> {
    let digest = scheme.hash_algorithm().digest(message);
    verify_digest(scheme, public_key, &digest, signature)
}

/// 验证摘要签名；签名不匹配返回 Ok(false)，输入格式错误返回 Err
pub fn verify_digest(
    scheme: SigningScheme,
    public_key: &PublicKey,
    digest: &[u8],
    signature: &ChainSignature,
) -> WalletResult<bool> {
    if public_key.curve() != scheme.curve() {
        return Err(WalletError::CurveMismatch {
            expected: scheme.curve(),
            actual: public_key.curve(),
        });
    }
    if digest.len() != DIGEST_LENGTH {
        return Err(WalletError::signing(format!(
            "Digest must be {} bytes, got {}",
            DIGEST_LENGTH,
            digest.len()
        )));
    }

    let valid = match scheme {
        SigningScheme::Secp256k1Sha2 | SigningScheme::Secp256k1Sha3 => {
            let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(public_key.as_bytes())
                .map_err(|e| WalletError::decode(format!("Invalid secp256k1 public key: {}", e)))?;
            let sig = k256::ecdsa::Signature::from_slice(signature.as_bytes())
                .map_err(|e| WalletError::decode(format!("Invalid signature: {}", e)))?;
            verifying_key.verify_prehash(digest, &sig).is_ok()
        }
        SigningScheme::P256Sha2 | SigningScheme::P256Sha3 => {
            let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key.as_bytes())
                .map_err(|e| WalletError::decode(format!("Invalid P-256 public key: {}", e)))?;
            let sig = p256::ecdsa::Signature::from_slice(signature.as_bytes())
                .map_err(|e| WalletError::decode(format!("Invalid signature: {}", e)))?;
            verifying_key.verify_prehash(digest, &sig).is_ok()
        }
    };

    Ok(valid)
}
