pub mod access_api;
pub mod cadence;
pub mod flow_client; // 链客户端：提交 + 等待 Sealed
pub mod signer; // 签名适配层
pub mod transaction_builder;

pub use access_api::TransactionResult;
pub use cadence::CadenceValue;
pub use flow_client::{ChainClient, FlowClient};
pub use signer::{KeySignature, KeySigner, TransactionSigner};
pub use transaction_builder::{FlowTransaction, TransactionBuilder, TransactionRequest};
