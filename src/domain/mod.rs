//! Domain 模块
//!
//! 曲线与算法定义、密钥与签名值类型、HD 派生、Flow 账户与交易状态

pub mod account;
pub mod algorithms;
pub mod derivation;
pub mod derivation_path_validator;
pub mod keys;
pub mod signature;
pub mod transaction_status;

// 重新导出常用类型
pub use account::{Account, AccountKey, FlowAddress, ProposalKey, FULL_WEIGHT};
pub use algorithms::{CurveType, HashAlgorithm, SignatureAlgorithm, SigningScheme, DIGEST_LENGTH};
pub use derivation::HdWallet;
pub use derivation_path_validator::{DerivationPathValidator, FLOW_DERIVATION_PATH};
pub use keys::{PrivateKey, PublicKey};
pub use signature::{ChainSignature, RawSignature};
pub use transaction_status::{TransactionId, TransactionStatus};
