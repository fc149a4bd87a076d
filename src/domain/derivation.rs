//! HD 钱包派生（Key Provider）
//!
//! 助记词 → BIP39 种子 → 按曲线派生私钥：
//! - secp256k1: 标准 BIP32（coins-bip32）
//! - P-256:     SLIP-0010，master secret 为 "Nist256p1 seed"
//!
//! 两者对相同输入都是确定性的纯函数。

use std::fmt;

use bip39::{Language, Mnemonic};
use coins_bip32::path::DerivationPath;
use hmac::{Hmac, Mac};
use p256::elliptic_curve::{
    ff::{Field, PrimeField},
    sec1::ToEncodedPoint,
};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::domain::{
    algorithms::CurveType,
    derivation_path_validator::{ChildIndex, DerivationPathValidator, FLOW_DERIVATION_PATH},
    keys::PrivateKey,
};
use crate::error::{WalletError, WalletResult};

type HmacSha512 = Hmac<Sha512>;

const SEED_LENGTH: usize = 64;

/// 由助记词恢复的 HD 钱包
pub struct HdWallet {
    seed: Zeroizing<[u8; SEED_LENGTH]>,
}

impl fmt::Debug for HdWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdWallet").finish_non_exhaustive()
    }
}

impl HdWallet {
    /// 校验助记词并生成种子
    pub fn new(mnemonic: &str, passphrase: &str) -> WalletResult<Self> {
        let parsed = Mnemonic::parse_in(Language::English, mnemonic)
            .map_err(|e| WalletError::derivation(format!("Invalid mnemonic: {}", e)))?;

        let seed = Zeroizing::new(parsed.to_seed(passphrase));

        Ok(Self { seed })
    }

    pub fn is_valid_mnemonic(mnemonic: &str) -> bool {
        Mnemonic::parse_in(Language::English, mnemonic).is_ok()
    }

    /// 按曲线与路径派生私钥
    pub fn derive(&self, curve: CurveType, path: &str) -> WalletResult<PrivateKey> {
        let components = DerivationPathValidator::parse(path)?;

        let key = match curve {
            CurveType::Secp256k1 => self.derive_secp256k1(&components)?,
            CurveType::P256 => derive_slip10_p256(self.seed.as_ref(), &components)?,
        };

        let private_key = PrivateKey::from_bytes(key.as_ref(), curve)?;
        tracing::debug!(curve = %curve, path = %path, "Derived private key");
        Ok(private_key)
    }

    /// 使用 Flow 默认路径 m/44'/539'/0'/0/0
    pub fn derive_default(&self, curve: CurveType) -> WalletResult<PrivateKey> {
        self.derive(curve, FLOW_DERIVATION_PATH)
    }

    /// 两条曲线共用同一份解析结果，路径语法保持一致
    fn derive_secp256k1(&self, components: &[ChildIndex]) -> WalletResult<Zeroizing<[u8; 32]>> {
        use coins_bip32::prelude::*;
        use k256::ecdsa::SigningKey;

        let derivation_path =
            DerivationPath::from(components.iter().map(ChildIndex::raw).collect::<Vec<u32>>());

        let master_key = XPriv::root_from_seed(self.seed.as_ref(), None)
            .map_err(|e| WalletError::derivation(format!("Failed to derive master key: {}", e)))?;

        let derived_key = master_key
            .derive_path(&derivation_path)
            .map_err(|e| WalletError::derivation(format!("Failed to derive key: {}", e)))?;

        // XPriv 实现 AsRef<SigningKey>
        let signing_key: &SigningKey = derived_key.as_ref();
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&signing_key.to_bytes());
        Ok(out)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SLIP-0010 (NIST P-256)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const P256_MASTER_SECRET: &[u8] = b"Nist256p1 seed";

fn derive_slip10_p256(seed: &[u8], path: &[ChildIndex]) -> WalletResult<Zeroizing<[u8; 32]>> {
    let (mut key, mut chain_code) = p256_master_key(seed)?;

    for index in path {
        let (child_key, child_chain) = p256_child_key(&key, &chain_code, *index)?;
        key.zeroize();
        chain_code.zeroize();
        key = child_key;
        chain_code = child_chain;
    }

    chain_code.zeroize();
    Ok(Zeroizing::new(key))
}

/// I = HMAC-SHA512(Key = "Nist256p1 seed", Data = seed)，IL 无效时以 I 为新数据重算
fn p256_master_key(seed: &[u8]) -> WalletResult<([u8; 32], [u8; 32])> {
    let mut data = Zeroizing::new(seed.to_vec());

    loop {
        let mut buf = hmac_sha512(P256_MASTER_SECRET, &[data.as_slice()])?;
        let (key, chain_code) = split_hmac(&buf);
        buf.zeroize();

        if p256_scalar(&key).map(|k| !bool::from(k.is_zero())).unwrap_or(false) {
            return Ok((key, chain_code));
        }

        let mut next = Vec::with_capacity(64);
        next.extend_from_slice(&key);
        next.extend_from_slice(&chain_code);
        *data = next;
    }
}

/// 子密钥派生
///
/// hardened:  Data = 0x00 ‖ k_par ‖ ser32(i)
/// normal:    Data = serP(K_par) ‖ ser32(i)
/// IL ≥ n 或 k_i = 0 时：Data = 0x01 ‖ IR ‖ ser32(i) 重算
fn p256_child_key(
    parent_key: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: ChildIndex,
) -> WalletResult<([u8; 32], [u8; 32])> {
    let parent_scalar = p256_scalar(parent_key)
        .ok_or_else(|| WalletError::derivation("Parent key is not a valid P-256 scalar"))?;
    let index_bytes = index.raw().to_be_bytes();

    let mut head: Vec<u8> = if index.is_hardened() {
        let mut v = Vec::with_capacity(33);
        v.push(0x00);
        v.extend_from_slice(parent_key);
        v
    } else {
        let secret = p256::SecretKey::from_slice(parent_key)
            .map_err(|e| WalletError::derivation(e.to_string()))?;
        secret
            .public_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    };

    loop {
        let mut buf = hmac_sha512(parent_chain_code, &[head.as_slice(), &index_bytes])?;
        let (il, ir) = split_hmac(&buf);
        buf.zeroize();

        if let Some(tweak) = p256_scalar(&il) {
            let child = tweak + parent_scalar;
            if !bool::from(child.is_zero()) {
                head.zeroize();
                let mut child_key = [0u8; 32];
                child_key.copy_from_slice(&child.to_repr());
                return Ok((child_key, ir));
            }
        }

        tracing::debug!("SLIP-0010 child key out of range, retrying");
        head.zeroize();
        head = Vec::with_capacity(33);
        head.push(0x01);
        head.extend_from_slice(&ir);
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> WalletResult<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| WalletError::derivation(format!("HMAC init failed: {}", e)))?;
    for part in parts {
        mac.update(part);
    }

    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn split_hmac(buf: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&buf[..32]);
    right.copy_from_slice(&buf[32..]);
    (left, right)
}

/// 大端字节 → 标量，≥ n 返回 None
fn p256_scalar(bytes: &[u8; 32]) -> Option<p256::Scalar> {
    Option::from(p256::Scalar::from_repr(p256::FieldBytes::clone_from_slice(
        bytes,
    )))
}
