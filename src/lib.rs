//! flow-wallet-kit - Flow 链多曲线 HD 钱包 SDK
//!
//! 助记词派生 P-256 / secp256k1 私钥，按 {曲线 × 哈希} 签名，
//! 通过 REST Access API 提交交易并等待 Sealed

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

// 重新导出常用类型
pub use error::{WalletError, WalletResult};

pub mod prelude {
    pub use crate::{
        config::{Config, FlowNetwork, NetworkConfig, SealConfig},
        domain::{
            AccountKey, CurveType, FlowAddress, HashAlgorithm, HdWallet, PrivateKey, ProposalKey,
            PublicKey, SignatureAlgorithm, SigningScheme, TransactionId, TransactionStatus,
        },
        error::{WalletError, WalletResult},
        service::{
            CadenceValue, ChainClient, FlowClient, KeySigner, TransactionRequest,
            TransactionResult, TransactionSigner,
        },
    };
}
