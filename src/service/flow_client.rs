//! Flow 链客户端（Chain Client）
//!
//! 通过 REST Access API 提交交易并轮询直至 Sealed。
//! 客户端只使用构造时传入的网络配置；不做自动重试，失败原样返回调用方。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::{Config, NetworkConfig, SealConfig};
use crate::domain::{
    account::{Account, AccountKey, FlowAddress, ProposalKey},
    transaction_status::{TransactionId, TransactionStatus},
};
use crate::error::{WalletError, WalletResult};
use crate::service::{
    access_api::{
        AccountDto, BlockDto, BlockHeaderDto, ErrorBodyDto, SubmittedTransactionDto,
        TransactionBodyDto, TransactionResult, TransactionResultDto,
    },
    cadence::{self, ADD_ACCOUNT_KEY},
    signer::TransactionSigner,
    transaction_builder::{FlowTransaction, TransactionRequest},
};

/// 添加 key 交易使用的 gas 上限
pub const ADD_KEY_GAS_LIMIT: u64 = 1000;

/// 链客户端边界
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// 签名并提交，返回交易 ID（不等待上链）
    async fn submit(
        &self,
        request: &TransactionRequest,
        signers: &[&dyn TransactionSigner],
    ) -> WalletResult<TransactionId>;

    /// 轮询直至 Sealed；执行失败或过期返回 Submission，超时返回 SealTimeout
    async fn await_sealed(&self, id: &TransactionId) -> WalletResult<TransactionResult>;
}

/// 单次轮询的结果
enum PollOutcome {
    Found(TransactionResult),
    NotFound,
    Transient(String),
}

/// REST Access API 客户端
#[derive(Debug, Clone)]
pub struct FlowClient {
    http_client: reqwest::Client,
    base_url: String,
    network: NetworkConfig,
    seal: SealConfig,
}

impl FlowClient {
    pub fn new(network: NetworkConfig) -> WalletResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(network.request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| WalletError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: network.access_node_url(),
            network,
            seal: SealConfig::new(1000, 120),
        })
    }

    pub fn from_config(config: &Config) -> WalletResult<Self> {
        Ok(Self::new(config.network.clone())?.with_seal_config(config.seal.clone()))
    }

    pub fn with_seal_config(mut self, seal: SealConfig) -> Self {
        self.seal = seal;
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn seal_config(&self) -> &SealConfig {
        &self.seal
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 查询
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 最新已封存区块头（作为交易的参考区块）
    pub async fn latest_sealed_block(&self) -> WalletResult<BlockHeaderDto> {
        let url = format!("{}/v1/blocks", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("height", "sealed")])
            .send()
            .await?;

        let blocks: Vec<BlockDto> = read_json(response, "latest sealed block").await?;
        blocks
            .into_iter()
            .next()
            .map(|b| b.header)
            .ok_or_else(|| WalletError::decode("Access node returned no sealed block"))
    }

    pub async fn get_account(&self, address: &FlowAddress) -> WalletResult<Account> {
        let url = format!("{}/v1/accounts/{}", self.base_url, address.to_rest_hex());
        let response = self
            .http_client
            .get(&url)
            .query(&[("expand", "keys")])
            .send()
            .await?;

        let dto: AccountDto = read_json(response, "account").await?;
        dto.into_domain()
    }

    /// 查询交易结果；节点尚不可见时返回 None
    pub async fn transaction_result(
        &self,
        id: &TransactionId,
    ) -> WalletResult<Option<TransactionResult>> {
        match self.poll_once(id).await? {
            PollOutcome::Found(result) => Ok(Some(result)),
            PollOutcome::NotFound => Ok(None),
            PollOutcome::Transient(message) => Err(WalletError::submission(message)),
        }
    }

    async fn poll_once(&self, id: &TransactionId) -> WalletResult<PollOutcome> {
        let url = format!("{}/v1/transaction_results/{}", self.base_url, id.to_hex());
        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(PollOutcome::NotFound);
        }
        if status.is_server_error() {
            let message = error_message(response).await;
            return Ok(PollOutcome::Transient(format!(
                "Access node returned {} for transaction result: {}",
                status, message
            )));
        }

        let dto: TransactionResultDto = read_json(response, "transaction result").await?;
        Ok(PollOutcome::Found(TransactionResult::from_dto(*id, dto)))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 提交
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 提交并等待 Sealed
    pub async fn send_transaction(
        &self,
        request: &TransactionRequest,
        signers: &[&dyn TransactionSigner],
    ) -> WalletResult<TransactionResult> {
        let id = self.submit(request, signers).await?;
        self.await_sealed(&id).await
    }

    /// 为账户添加一把 key
    ///
    /// 第一个签名者作为提议者，账户自身同时是付款方与授权者
    pub async fn add_key_to_account(
        &self,
        address: FlowAddress,
        key: &AccountKey,
        signers: &[&dyn TransactionSigner],
    ) -> WalletResult<TransactionResult> {
        let proposer = signers
            .first()
            .ok_or_else(|| WalletError::signing("At least one signer is required"))?;

        let request = TransactionRequest::builder()
            .script(ADD_ACCOUNT_KEY)
            .arguments(cadence::add_key_arguments(key)?)
            .gas_limit(ADD_KEY_GAS_LIMIT)
            .proposer(ProposalKey::latest(proposer.address(), proposer.key_index()))
            .payer(address)
            .authorizer(address)
            .build()?;

        tracing::info!(
            address = %address,
            sign_algo = %key.sign_algo,
            hash_algo = %key.hash_algo,
            weight = key.weight,
            "Adding key to account"
        );
        self.send_transaction(&request, signers).await
    }

    async fn resolve_sequence_number(&self, proposal_key: &ProposalKey) -> WalletResult<u64> {
        if let Some(sequence_number) = proposal_key.sequence_number {
            return Ok(sequence_number);
        }

        let account = self.get_account(&proposal_key.address).await?;
        let key = account.key(proposal_key.key_index).ok_or_else(|| {
            WalletError::submission(format!(
                "Proposal key {} not found on account {}",
                proposal_key.key_index, proposal_key.address
            ))
        })?;
        if key.revoked {
            return Err(WalletError::submission(format!(
                "Proposal key {} on account {} is revoked",
                proposal_key.key_index, proposal_key.address
            )));
        }

        tracing::debug!(
            address = %proposal_key.address,
            key_index = proposal_key.key_index,
            sequence_number = key.sequence_number,
            "Resolved proposal key sequence number"
        );
        Ok(key.sequence_number)
    }

    async fn post_transaction(&self, tx: &FlowTransaction) -> WalletResult<TransactionId> {
        let url = format!("{}/v1/transactions", self.base_url);
        let body = TransactionBodyDto::from(tx);
        let response = self.http_client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            tracing::warn!(status = %status, error = %message, "Transaction rejected by access node");
            return Err(WalletError::submission(format!(
                "Access node rejected transaction ({}): {}",
                status, message
            )));
        }

        let text = response.text().await?;
        let submitted: SubmittedTransactionDto = serde_json::from_str(&text).map_err(|e| {
            WalletError::submission(format!("Malformed submission response: {}", e))
        })?;
        TransactionId::from_hex(&submitted.id)
            .map_err(|e| WalletError::submission(format!("Malformed transaction id: {}", e)))
    }
}

#[async_trait]
impl ChainClient for FlowClient {
    async fn submit(
        &self,
        request: &TransactionRequest,
        signers: &[&dyn TransactionSigner],
    ) -> WalletResult<TransactionId> {
        if signers.is_empty() {
            return Err(WalletError::signing("At least one signer is required"));
        }

        let block = self.latest_sealed_block().await?;
        let reference_block_id = block.id_bytes()?;
        let sequence_number = self.resolve_sequence_number(&request.proposal_key).await?;

        let mut tx = request.resolve(reference_block_id, sequence_number)?;
        tx.sign(signers).await?;
        let local_id = tx.id();

        let id = self.post_transaction(&tx).await?;
        if id != local_id {
            tracing::warn!(
                tx_id = %id,
                local_id = %local_id,
                "Access node returned a different transaction id"
            );
        }

        tracing::info!(
            tx_id = %id,
            network = %self.network.network,
            proposer = %request.proposal_key.address,
            sequence_number = sequence_number,
            reference_height = block.height,
            "Transaction submitted"
        );
        Ok(id)
    }

    async fn await_sealed(&self, id: &TransactionId) -> WalletResult<TransactionResult> {
        let started = Instant::now();
        let timeout = self.seal.timeout();
        let poll_interval = self.seal.poll_interval();
        let mut last_status = TransactionStatus::Unknown;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            // 单次轮询也受剩余预算约束
            let remaining = timeout.saturating_sub(started.elapsed());
            match tokio::time::timeout(remaining, self.poll_once(id)).await {
                Ok(Ok(PollOutcome::Found(result))) => {
                    if result.status != last_status {
                        tracing::info!(
                            tx_id = %id,
                            status = %result.status,
                            attempt = attempt,
                            "Transaction status changed"
                        );
                    }
                    last_status = result.status;

                    if result.status.is_final() {
                        return self.finish(id, result, started, attempt);
                    }
                }
                Ok(Ok(PollOutcome::NotFound)) => {
                    tracing::debug!(tx_id = %id, attempt = attempt, "Transaction not visible yet");
                }
                Ok(Ok(PollOutcome::Transient(message))) => {
                    tracing::warn!(tx_id = %id, attempt = attempt, error = %message, "Poll failed");
                }
                Ok(Err(WalletError::Network(e))) => {
                    tracing::warn!(tx_id = %id, attempt = attempt, error = %e, "Poll failed");
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    tracing::debug!(tx_id = %id, attempt = attempt, "Poll cut off by seal deadline");
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                tracing::warn!(
                    tx_id = %id,
                    last_status = %last_status,
                    attempt = attempt,
                    "Timed out waiting for seal"
                );
                return Err(WalletError::SealTimeout {
                    id: *id,
                    last_status,
                    waited: elapsed,
                });
            }

            tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
        }
    }
}

impl FlowClient {
    /// 终态结果：Sealed 且执行成功返回 Ok，执行失败或 Expired 为 SubmissionFailure
    fn finish(
        &self,
        id: &TransactionId,
        result: TransactionResult,
        started: Instant,
        attempt: u32,
    ) -> WalletResult<TransactionResult> {
        if !result.status.is_sealed() {
            return Err(WalletError::submission(format!(
                "Transaction {} {} before being sealed",
                id, result.status
            )));
        }
        if result.is_failed() {
            return Err(WalletError::submission(format!(
                "Transaction {} failed (status code {}): {}",
                id, result.status_code, result.error_message
            )));
        }

        tracing::info!(
            tx_id = %id,
            network = %self.network.network,
            attempt = attempt,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transaction sealed"
        );
        Ok(result)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 响应处理
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> WalletResult<T> {
    let status = response.status();
    if !status.is_success() {
        let message = error_message(response).await;
        return Err(WalletError::submission(format!(
            "Access node returned {} for {}: {}",
            status, what, message
        )));
    }

    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| WalletError::decode(format!("Malformed {} response: {}", what, e)))
}

/// 提取 `{code, message}` 中的 message，解析失败时退回原始响应体
async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBodyDto>(&text)
        .ok()
        .map(|body| body.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(text)
}
