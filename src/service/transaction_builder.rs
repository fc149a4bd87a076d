//! Flow 交易构建与签名
//!
//! 负责 RLP 编码（payload / envelope）、域标签、签名者序号以及交易 ID 计算。
//! 签名顺序：先由提议者与授权者对 payload 签名，再由付款方对 envelope 签名。

use rlp::RlpStream;
use sha3::{Digest, Sha3_256};

use crate::domain::{
    account::{FlowAddress, ProposalKey},
    signature::ChainSignature,
    transaction_status::TransactionId,
};
use crate::error::{WalletError, WalletResult};
use crate::service::{cadence::CadenceValue, signer::TransactionSigner};

pub const DEFAULT_GAS_LIMIT: u64 = 9999;

const TRANSACTION_DOMAIN_TAG: &[u8] = b"FLOW-V0.0-transaction";
const DOMAIN_TAG_LENGTH: usize = 32;

/// 右侧补零到 32 字节的交易域标签
pub fn transaction_domain_tag() -> [u8; DOMAIN_TAG_LENGTH] {
    let mut tag = [0u8; DOMAIN_TAG_LENGTH];
    tag[..TRANSACTION_DOMAIN_TAG.len()].copy_from_slice(TRANSACTION_DOMAIN_TAG);
    tag
}

/// 待提交的交易请求（尚未绑定参考区块）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub script: String,
    pub arguments: Vec<CadenceValue>,
    pub gas_limit: u64,
    pub proposal_key: ProposalKey,
    pub payer: FlowAddress,
    pub authorizers: Vec<FlowAddress>,
}

impl TransactionRequest {
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::new()
    }

    /// 绑定参考区块与确定的序列号
    pub fn resolve(
        &self,
        reference_block_id: [u8; 32],
        sequence_number: u64,
    ) -> WalletResult<FlowTransaction> {
        let arguments = self
            .arguments
            .iter()
            .map(CadenceValue::to_json_bytes)
            .collect::<WalletResult<Vec<_>>>()?;

        Ok(FlowTransaction {
            script: self.script.as_bytes().to_vec(),
            arguments,
            reference_block_id,
            gas_limit: self.gas_limit,
            proposer: self.proposal_key.address,
            proposer_key_index: self.proposal_key.key_index,
            proposer_sequence_number: sequence_number,
            payer: self.payer,
            authorizers: self.authorizers.clone(),
            payload_signatures: Vec::new(),
            envelope_signatures: Vec::new(),
        })
    }
}

/// 交易请求构建器
///
/// 未指定 payer 时默认等于提议者地址
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    script: Option<String>,
    arguments: Vec<CadenceValue>,
    gas_limit: Option<u64>,
    proposal_key: Option<ProposalKey>,
    payer: Option<FlowAddress>,
    authorizers: Vec<FlowAddress>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn argument(mut self, argument: CadenceValue) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn arguments(mut self, arguments: impl IntoIterator<Item = CadenceValue>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn proposer(mut self, proposal_key: ProposalKey) -> Self {
        self.proposal_key = Some(proposal_key);
        self
    }

    pub fn payer(mut self, payer: FlowAddress) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn authorizer(mut self, authorizer: FlowAddress) -> Self {
        self.authorizers.push(authorizer);
        self
    }

    pub fn build(self) -> WalletResult<TransactionRequest> {
        let script = self
            .script
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| WalletError::submission("Transaction script is required"))?;
        let proposal_key = self
            .proposal_key
            .ok_or_else(|| WalletError::submission("Proposal key is required"))?;

        Ok(TransactionRequest {
            script,
            arguments: self.arguments,
            gas_limit: self.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
            payer: self.payer.unwrap_or(proposal_key.address),
            proposal_key,
            authorizers: self.authorizers,
        })
    }
}

/// 交易中的一条签名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    pub address: FlowAddress,
    pub signer_index: u32,
    pub key_index: u32,
    pub signature: ChainSignature,
}

/// 已绑定参考区块、可签名的交易
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowTransaction {
    pub script: Vec<u8>,
    /// JSON-Cadence 编码后的参数
    pub arguments: Vec<Vec<u8>>,
    pub reference_block_id: [u8; 32],
    pub gas_limit: u64,
    pub proposer: FlowAddress,
    pub proposer_key_index: u32,
    pub proposer_sequence_number: u64,
    pub payer: FlowAddress,
    pub authorizers: Vec<FlowAddress>,
    pub payload_signatures: Vec<TransactionSignature>,
    pub envelope_signatures: Vec<TransactionSignature>,
}

impl FlowTransaction {
    /// 去重后的签名者列表：提议者、付款方、授权者
    pub fn signer_list(&self) -> Vec<FlowAddress> {
        let mut signers = Vec::with_capacity(2 + self.authorizers.len());
        for address in std::iter::once(self.proposer)
            .chain(std::iter::once(self.payer))
            .chain(self.authorizers.iter().copied())
        {
            if !signers.contains(&address) {
                signers.push(address);
            }
        }
        signers
    }

    fn signer_index(&self, address: &FlowAddress) -> WalletResult<u32> {
        self.signer_list()
            .iter()
            .position(|a| a == address)
            .map(|i| i as u32)
            .ok_or_else(|| {
                WalletError::signing(format!("Address {} is not a signer of this transaction", address))
            })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // RLP 编码
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn append_payload(&self, stream: &mut RlpStream) {
        stream.begin_list(9);
        stream.append(&self.script);
        stream.begin_list(self.arguments.len());
        for argument in &self.arguments {
            stream.append(argument);
        }
        stream.append(&self.reference_block_id.to_vec());
        stream.append(&self.gas_limit);
        stream.append(&self.proposer.as_bytes().to_vec());
        stream.append(&u64::from(self.proposer_key_index));
        stream.append(&self.proposer_sequence_number);
        stream.append(&self.payer.as_bytes().to_vec());
        stream.begin_list(self.authorizers.len());
        for authorizer in &self.authorizers {
            stream.append(&authorizer.as_bytes().to_vec());
        }
    }

    fn append_signatures(stream: &mut RlpStream, signatures: &[TransactionSignature]) {
        stream.begin_list(signatures.len());
        for sig in signatures {
            stream.begin_list(3);
            stream.append(&u64::from(sig.signer_index));
            stream.append(&u64::from(sig.key_index));
            stream.append(&sig.signature.as_bytes().to_vec());
        }
    }

    pub fn payload_rlp(&self) -> Vec<u8> {
        let mut stream = RlpStream::new();
        self.append_payload(&mut stream);
        stream.out().to_vec()
    }

    pub fn envelope_rlp(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(2);
        self.append_payload(&mut stream);
        Self::append_signatures(&mut stream, &self.payload_signatures);
        stream.out().to_vec()
    }

    /// 域标签 ‖ RLP(payload)
    pub fn payload_message(&self) -> Vec<u8> {
        let mut message = transaction_domain_tag().to_vec();
        message.extend_from_slice(&self.payload_rlp());
        message
    }

    /// 域标签 ‖ RLP([payload, payload_signatures])
    pub fn envelope_message(&self) -> Vec<u8> {
        let mut message = transaction_domain_tag().to_vec();
        message.extend_from_slice(&self.envelope_rlp());
        message
    }

    /// 交易 ID：SHA3-256(RLP([payload, payload_signatures, envelope_signatures]))
    pub fn id(&self) -> TransactionId {
        let mut stream = RlpStream::new_list(3);
        self.append_payload(&mut stream);
        Self::append_signatures(&mut stream, &self.payload_signatures);
        Self::append_signatures(&mut stream, &self.envelope_signatures);

        let hash = Sha3_256::digest(stream.out());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        TransactionId::from_bytes(bytes)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 签名
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 按角色收集签名
    ///
    /// 付款方签 envelope；其余属于提议者或授权者的签名者签 payload
    pub async fn sign(&mut self, signers: &[&dyn TransactionSigner]) -> WalletResult<()> {
        let mut payload_signers = Vec::new();
        let mut envelope_signers = Vec::new();

        for signer in signers {
            let address = signer.address();
            if address == self.payer {
                envelope_signers.push(*signer);
            } else if address == self.proposer || self.authorizers.contains(&address) {
                payload_signers.push(*signer);
            } else {
                return Err(WalletError::signing(format!(
                    "Signer {} (key {}) is neither proposer, authorizer nor payer",
                    address,
                    signer.key_index()
                )));
            }
        }

        if envelope_signers.is_empty() {
            return Err(WalletError::signing(format!(
                "No signer provided for payer {}",
                self.payer
            )));
        }

        let payload_message = self.payload_message();
        for signer in payload_signers {
            let signed = signer.sign(&payload_message).await?;
            self.add_payload_signature(signed.address, signed.key_index, signed.signature)?;
        }

        let envelope_message = self.envelope_message();
        for signer in envelope_signers {
            let signed = signer.sign(&envelope_message).await?;
            self.add_envelope_signature(signed.address, signed.key_index, signed.signature)?;
        }

        tracing::debug!(
            payload_signatures = self.payload_signatures.len(),
            envelope_signatures = self.envelope_signatures.len(),
            "Transaction signed"
        );
        Ok(())
    }

    pub fn add_payload_signature(
        &mut self,
        address: FlowAddress,
        key_index: u32,
        signature: ChainSignature,
    ) -> WalletResult<()> {
        let signer_index = self.signer_index(&address)?;
        self.payload_signatures.push(TransactionSignature {
            address,
            signer_index,
            key_index,
            signature,
        });
        sort_signatures(&mut self.payload_signatures);
        Ok(())
    }

    pub fn add_envelope_signature(
        &mut self,
        address: FlowAddress,
        key_index: u32,
        signature: ChainSignature,
    ) -> WalletResult<()> {
        let signer_index = self.signer_index(&address)?;
        self.envelope_signatures.push(TransactionSignature {
            address,
            signer_index,
            key_index,
            signature,
        });
        sort_signatures(&mut self.envelope_signatures);
        Ok(())
    }
}

fn sort_signatures(signatures: &mut [TransactionSignature]) {
    signatures.sort_by_key(|s| (s.signer_index, s.key_index));
}
