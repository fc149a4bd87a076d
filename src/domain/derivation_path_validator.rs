//! BIP32 派生路径解析与校验
//!
//! Flow 使用 SLIP-44 coin type 539：m/44'/539'/account'/0/index

use crate::error::{WalletError, WalletResult};

/// Flow 的 SLIP-44 coin type
pub const FLOW_COIN_TYPE: u32 = 539;

/// 默认派生路径（第 0 个账户第 0 把 key）
pub const FLOW_DERIVATION_PATH: &str = "m/44'/539'/0'/0/0";

pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// 路径中的单级索引（含 hardened 位）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildIndex(u32);

impl ChildIndex {
    pub fn normal(index: u32) -> Self {
        Self(index)
    }

    pub fn hardened(index: u32) -> Self {
        Self(index | HARDENED_OFFSET)
    }

    pub fn is_hardened(&self) -> bool {
        self.0 >= HARDENED_OFFSET
    }

    /// 序列化用的原始 u32（hardened 已含偏移）
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// 派生路径验证器
pub struct DerivationPathValidator;

impl DerivationPathValidator {
    /// 解析路径，支持 `'` 与 `h` 两种 hardened 标记
    pub fn parse(path: &str) -> WalletResult<Vec<ChildIndex>> {
        let path = path.trim();
        let rest = match path {
            "m" | "M" => return Ok(Vec::new()),
            _ => path
                .strip_prefix("m/")
                .or_else(|| path.strip_prefix("M/"))
                .ok_or_else(|| {
                    WalletError::derivation(format!("Path must start with 'm/': {}", path))
                })?,
        };

        rest.split('/')
            .map(|component| {
                let (digits, hardened) = match component
                    .strip_suffix('\'')
                    .or_else(|| component.strip_suffix('h'))
                    .or_else(|| component.strip_suffix('H'))
                {
                    Some(d) => (d, true),
                    None => (component, false),
                };

                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(WalletError::derivation(format!(
                        "Invalid path component '{}' in {}",
                        component, path
                    )));
                }

                let index: u32 = digits.parse().map_err(|_| {
                    WalletError::derivation(format!("Path index out of range: {}", component))
                })?;
                if index >= HARDENED_OFFSET {
                    return Err(WalletError::derivation(format!(
                        "Path index must be below 2^31: {}",
                        component
                    )));
                }

                Ok(if hardened {
                    ChildIndex::hardened(index)
                } else {
                    ChildIndex::normal(index)
                })
            })
            .collect()
    }

    /// 是否符合 m/44'/539'/account'/0/index 约定
    pub fn is_flow_standard(path: &str) -> bool {
        let Ok(components) = Self::parse(path) else {
            return false;
        };

        components.len() == 5
            && components[0] == ChildIndex::hardened(44)
            && components[1] == ChildIndex::hardened(FLOW_COIN_TYPE)
            && components[2].is_hardened()
            && components[3] == ChildIndex::normal(0)
            && !components[4].is_hardened()
    }

    /// 构建标准 Flow 路径
    pub fn flow_path(account: u32, index: u32) -> String {
        format!("m/44'/{}'/{}'/0/{}", FLOW_COIN_TYPE, account, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flow_path() {
        let components = DerivationPathValidator::parse(FLOW_DERIVATION_PATH).unwrap();
        assert_eq!(
            components,
            vec![
                ChildIndex::hardened(44),
                ChildIndex::hardened(539),
                ChildIndex::hardened(0),
                ChildIndex::normal(0),
                ChildIndex::normal(0),
            ]
        );
        assert_eq!(components[1].raw(), 539 | HARDENED_OFFSET);
    }

    #[test]
    fn test_h_marker_equivalent() {
        assert_eq!(
            DerivationPathValidator::parse("m/44h/539h/0h/0/0").unwrap(),
            DerivationPathValidator::parse(FLOW_DERIVATION_PATH).unwrap()
        );
    }

    #[test]
    fn test_master_path() {
        assert!(DerivationPathValidator::parse("m").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_paths() {
        for bad in ["44'/539'", "m/", "m/44'/x", "m/44''", "m/2147483648", "m//0"] {
            assert!(
                DerivationPathValidator::parse(bad).is_err(),
                "path should be rejected: {}",
                bad
            );
        }
    }

    #[test]
    fn test_flow_standard() {
        assert!(DerivationPathValidator::is_flow_standard(FLOW_DERIVATION_PATH));
        assert!(DerivationPathValidator::is_flow_standard(
            &DerivationPathValidator::flow_path(2, 7)
        ));
        assert!(!DerivationPathValidator::is_flow_standard("m/44'/60'/0'/0/0"));
        assert!(!DerivationPathValidator::is_flow_standard("m/44'/539'/0'/0'/0'"));
    }
}
