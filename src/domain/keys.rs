//! 私钥 / 公钥值类型
//!
//! 私钥只在签名期间驻留内存，drop 时自动清零

use std::fmt;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroizing;

use crate::domain::algorithms::CurveType;
use crate::error::{WalletError, WalletResult};

pub const PRIVATE_KEY_LENGTH: usize = 32;
/// x963 未压缩公钥长度：04 ‖ X(32) ‖ Y(32)
pub const PUBLIC_KEY_LENGTH: usize = 65;

/// 单条曲线上的私钥标量
#[derive(Clone)]
pub struct PrivateKey {
    bytes: Zeroizing<[u8; PRIVATE_KEY_LENGTH]>,
    curve: CurveType,
}

// 永远不输出私钥内容
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

impl PrivateKey {
    /// 从原始字节构造，校验 0 < k < n
    pub fn from_bytes(bytes: &[u8], curve: CurveType) -> WalletResult<Self> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(WalletError::derivation(format!(
                "Invalid private key length: expected {}, got {}",
                PRIVATE_KEY_LENGTH,
                bytes.len()
            )));
        }

        let valid = match curve {
            CurveType::Secp256k1 => k256::SecretKey::from_slice(bytes).is_ok(),
            CurveType::P256 => p256::SecretKey::from_slice(bytes).is_ok(),
        };
        if !valid {
            return Err(WalletError::derivation(format!(
                "Private key is not a valid {} scalar",
                curve
            )));
        }

        let mut buf = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        buf.copy_from_slice(bytes);
        Ok(Self { bytes: buf, curve })
    }

    pub fn from_hex(hex_str: &str, curve: CurveType) -> WalletResult<Self> {
        let bytes = Zeroizing::new(
            hex::decode(hex_str.trim_start_matches("0x"))
                .map_err(|e| WalletError::derivation(format!("Invalid private key hex: {}", e)))?,
        );
        Self::from_bytes(&bytes, curve)
    }

    pub fn curve(&self) -> CurveType {
        self.curve
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LENGTH] {
        &self.bytes
    }

    /// 仅用于测试向量比对和导出
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes.as_ref())
    }

    /// 派生对应公钥（x963 未压缩格式）
    pub fn public_key(&self) -> WalletResult<PublicKey> {
        let encoded = match self.curve {
            CurveType::Secp256k1 => {
                let secret = k256::SecretKey::from_slice(self.bytes.as_ref())
                    .map_err(|e| WalletError::derivation(e.to_string()))?;
                secret.public_key().to_encoded_point(false).as_bytes().to_vec()
            }
            CurveType::P256 => {
                let secret = p256::SecretKey::from_slice(self.bytes.as_ref())
                    .map_err(|e| WalletError::derivation(e.to_string()))?;
                secret.public_key().to_encoded_point(false).as_bytes().to_vec()
            }
        };
        PublicKey::from_x963(&encoded, self.curve)
    }
}

/// 对应的验签公钥，x963 未压缩格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
    curve: CurveType,
}

impl PublicKey {
    /// 解析带 04 前缀的 65 字节公钥，并校验点在曲线上
    pub fn from_x963(bytes: &[u8], curve: CurveType) -> WalletResult<Self> {
        if bytes.len() != PUBLIC_KEY_LENGTH || bytes[0] != 0x04 {
            return Err(WalletError::decode(format!(
                "Expected {}-byte uncompressed public key with 04 prefix, got {} bytes",
                PUBLIC_KEY_LENGTH,
                bytes.len()
            )));
        }

        let on_curve = match curve {
            CurveType::Secp256k1 => k256::PublicKey::from_sec1_bytes(bytes).is_ok(),
            CurveType::P256 => p256::PublicKey::from_sec1_bytes(bytes).is_ok(),
        };
        if !on_curve {
            return Err(WalletError::decode(format!(
                "Public key is not a point on {}",
                curve
            )));
        }

        let mut buf = [0u8; PUBLIC_KEY_LENGTH];
        buf.copy_from_slice(bytes);
        Ok(Self { bytes: buf, curve })
    }

    /// 解析链上格式（64 字节 X ‖ Y，无 04 前缀，可带 0x）
    pub fn from_flow_hex(hex_str: &str, curve: CurveType) -> WalletResult<Self> {
        let raw = hex::decode(hex_str.trim_start_matches("0x"))
            .map_err(|e| WalletError::decode(format!("Invalid public key hex: {}", e)))?;

        match raw.len() {
            64 => {
                let mut x963 = Vec::with_capacity(PUBLIC_KEY_LENGTH);
                x963.push(0x04);
                x963.extend_from_slice(&raw);
                Self::from_x963(&x963, curve)
            }
            PUBLIC_KEY_LENGTH => Self::from_x963(&raw, curve),
            n => Err(WalletError::decode(format!(
                "Invalid public key length: {} bytes",
                n
            ))),
        }
    }

    pub fn curve(&self) -> CurveType {
        self.curve
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// 130 位 hex，含 04 前缀
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// 上链注册格式：去掉 04 前缀后的 128 位 hex
    pub fn to_flow_hex(&self) -> String {
        hex::encode(&self.bytes[1..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECP_KEY: &str = "9c33a65806715a537d7f67cf7bf8a020cbdac8a1019664a2fa34da42d1ddbc7d";
    const SECP_PUB: &str = "04ad94008dea1505863fc92bd2db5b9fbf52a57f2a05d34fedb693c714bdc731cca57be95775517a9df788a564f2d7491d2c9716d1c0411a5a64155895749d47bc";

    #[test]
    fn test_public_key_from_private() {
        let key = PrivateKey::from_hex(SECP_KEY, CurveType::Secp256k1).unwrap();
        let public = key.public_key().unwrap();
        assert_eq!(public.to_hex(), SECP_PUB);
        assert_eq!(public.to_flow_hex(), &SECP_PUB[2..]);
        assert_eq!(public.to_flow_hex().len(), 128);
    }

    #[test]
    fn test_flow_hex_roundtrip() {
        let public = PublicKey::from_flow_hex(&SECP_PUB[2..], CurveType::Secp256k1).unwrap();
        assert_eq!(public.to_hex(), SECP_PUB);

        let with_prefix =
            PublicKey::from_flow_hex(&format!("0x{}", &SECP_PUB[2..]), CurveType::Secp256k1)
                .unwrap();
        assert_eq!(with_prefix, public);
    }

    #[test]
    fn test_point_must_be_on_curve() {
        // secp256k1 的点不在 P-256 上
        assert!(PublicKey::from_flow_hex(&SECP_PUB[2..], CurveType::P256).is_err());
    }

    #[test]
    fn test_invalid_private_keys() {
        assert!(PrivateKey::from_bytes(&[0u8; 32], CurveType::Secp256k1).is_err());
        assert!(PrivateKey::from_bytes(&[0xffu8; 32], CurveType::P256).is_err());
        assert!(PrivateKey::from_bytes(&[1u8; 31], CurveType::P256).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let key = PrivateKey::from_hex(SECP_KEY, CurveType::Secp256k1).unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(SECP_KEY));
        assert!(debug.contains("Secp256k1"));
    }
}
