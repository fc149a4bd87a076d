//! 曲线 / 哈希 / 签名算法选择器
//!
//! Flow 账户上的每把 key 都绑定一个 {签名算法, 哈希算法} 组合，
//! 这里把它建模成封闭的 2x2 枚举，所有分派都必须穷尽匹配。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use crate::error::{WalletError, WalletResult};

/// 摘要长度（SHA2-256 与 SHA3-256 均为 32 字节）
pub const DIGEST_LENGTH: usize = 32;

/// 加密曲线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// secp256k1 曲线
    Secp256k1,
    /// NIST P-256 (secp256r1 / nist256p1)
    P256,
}

impl CurveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secp256k1 => "secp256k1",
            Self::P256 => "p256",
        }
    }
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 哈希算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA2_256")]
    Sha2_256,
    #[serde(rename = "SHA3_256")]
    Sha3_256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha2_256 => "SHA2_256",
            Self::Sha3_256 => "SHA3_256",
        }
    }

    /// 计算 32 字节摘要
    pub fn digest(&self, message: &[u8]) -> [u8; DIGEST_LENGTH] {
        let mut out = [0u8; DIGEST_LENGTH];
        match self {
            Self::Sha2_256 => out.copy_from_slice(&Sha256::digest(message)),
            Self::Sha3_256 => out.copy_from_slice(&Sha3_256::digest(message)),
        }
        out
    }

    /// Cadence `HashAlgorithm(rawValue:)` 取值
    pub fn cadence_raw_value(&self) -> u8 {
        match self {
            Self::Sha2_256 => 1,
            Self::Sha3_256 => 3,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = WalletError;

    fn from_str(s: &str) -> WalletResult<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "SHA2_256" | "SHA256" => Ok(Self::Sha2_256),
            "SHA3_256" => Ok(Self::Sha3_256),
            _ => Err(WalletError::Config(format!("Unsupported hash algorithm: {}", s))),
        }
    }
}

/// 签名算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    #[serde(rename = "ECDSA_P256")]
    EcdsaP256,
    #[serde(rename = "ECDSA_secp256k1")]
    EcdsaSecp256k1,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EcdsaP256 => "ECDSA_P256",
            Self::EcdsaSecp256k1 => "ECDSA_secp256k1",
        }
    }

    pub fn curve(&self) -> CurveType {
        match self {
            Self::EcdsaP256 => CurveType::P256,
            Self::EcdsaSecp256k1 => CurveType::Secp256k1,
        }
    }

    /// Cadence `SignatureAlgorithm(rawValue:)` 取值
    pub fn cadence_raw_value(&self) -> u8 {
        match self {
            Self::EcdsaP256 => 1,
            Self::EcdsaSecp256k1 => 2,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = WalletError;

    fn from_str(s: &str) -> WalletResult<Self> {
        match s.to_uppercase().as_str() {
            "ECDSA_P256" => Ok(Self::EcdsaP256),
            "ECDSA_SECP256K1" => Ok(Self::EcdsaSecp256k1),
            _ => Err(WalletError::Config(format!(
                "Unsupported signature algorithm: {}",
                s
            ))),
        }
    }
}

/// {曲线 × 哈希} 的四种组合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningScheme {
    P256Sha2,
    P256Sha3,
    Secp256k1Sha2,
    Secp256k1Sha3,
}

impl SigningScheme {
    pub const ALL: [SigningScheme; 4] = [
        Self::P256Sha2,
        Self::P256Sha3,
        Self::Secp256k1Sha2,
        Self::Secp256k1Sha3,
    ];

    pub fn new(sign_algo: SignatureAlgorithm, hash_algo: HashAlgorithm) -> Self {
        match (sign_algo, hash_algo) {
            (SignatureAlgorithm::EcdsaP256, HashAlgorithm::Sha2_256) => Self::P256Sha2,
            (SignatureAlgorithm::EcdsaP256, HashAlgorithm::Sha3_256) => Self::P256Sha3,
            (SignatureAlgorithm::EcdsaSecp256k1, HashAlgorithm::Sha2_256) => Self::Secp256k1Sha2,
            (SignatureAlgorithm::EcdsaSecp256k1, HashAlgorithm::Sha3_256) => Self::Secp256k1Sha3,
        }
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::P256Sha2 | Self::P256Sha3 => SignatureAlgorithm::EcdsaP256,
            Self::Secp256k1Sha2 | Self::Secp256k1Sha3 => SignatureAlgorithm::EcdsaSecp256k1,
        }
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        match self {
            Self::P256Sha2 | Self::Secp256k1Sha2 => HashAlgorithm::Sha2_256,
            Self::P256Sha3 | Self::Secp256k1Sha3 => HashAlgorithm::Sha3_256,
        }
    }

    pub fn curve(&self) -> CurveType {
        self.signature_algorithm().curve()
    }
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.signature_algorithm(), self.hash_algorithm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_roundtrip_through_selectors() {
        for scheme in SigningScheme::ALL {
            let rebuilt = SigningScheme::new(scheme.signature_algorithm(), scheme.hash_algorithm());
            assert_eq!(rebuilt, scheme);
        }
    }

    #[test]
    fn test_scheme_curve() {
        assert_eq!(SigningScheme::P256Sha3.curve(), CurveType::P256);
        assert_eq!(SigningScheme::Secp256k1Sha2.curve(), CurveType::Secp256k1);
    }

    #[test]
    fn test_digest_known_vectors() {
        // 空消息的标准摘要
        assert_eq!(
            hex::encode(HashAlgorithm::Sha2_256.digest(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(HashAlgorithm::Sha3_256.digest(b"")),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(SignatureAlgorithm::EcdsaSecp256k1.to_string(), "ECDSA_secp256k1");
        assert_eq!(
            "ECDSA_secp256k1".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::EcdsaSecp256k1
        );
        assert_eq!(
            "SHA3_256".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha3_256
        );
        assert!("SHA1".parse::<HashAlgorithm>().is_err());

        let json = serde_json::to_string(&SignatureAlgorithm::EcdsaP256).unwrap();
        assert_eq!(json, "\"ECDSA_P256\"");
    }

    #[test]
    fn test_protocol_codes() {
        assert_eq!(SignatureAlgorithm::EcdsaP256.cadence_raw_value(), 1);
        assert_eq!(SignatureAlgorithm::EcdsaSecp256k1.cadence_raw_value(), 2);
        assert_eq!(HashAlgorithm::Sha2_256.cadence_raw_value(), 1);
        assert_eq!(HashAlgorithm::Sha3_256.cadence_raw_value(), 3);
    }
}
