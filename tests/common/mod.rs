//! 测试辅助模块
//! 提供固定测试向量和基于 axum 的 Access 节点 mock

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use flow_wallet_kit::{
    config::{NetworkConfig, SealConfig},
    domain::{CurveType, FlowAddress, HdWallet, PrivateKey, SigningScheme},
    service::{access_api::TransactionBodyDto, FlowClient, KeySigner},
};
use serde_json::{json, Value};

pub const TEST_MNEMONIC: &str =
    "normal dune pole key case cradle unfold require tornado mercy hospital buyer";

pub const P256_PRIVATE_KEY: &str =
    "638dc9ad0eee91d09249f0fd7c5323a11600e20d5b9105b66b782a96236e74cf";
pub const P256_PUBLIC_KEY: &str = "04dbe5b4b4416ad9158339dd692002ceddab895e11bd87d90ce7e3e745efef28d2ad6e736fe3d57d52213f397a7ba9f0bc8c65620a872aefedbc1ddd74c605cf58";

pub const SECP256K1_PRIVATE_KEY: &str =
    "9c33a65806715a537d7f67cf7bf8a020cbdac8a1019664a2fa34da42d1ddbc7d";
pub const SECP256K1_PUBLIC_KEY: &str = "04ad94008dea1505863fc92bd2db5b9fbf52a57f2a05d34fedb693c714bdc731cca57be95775517a9df788a564f2d7491d2c9716d1c0411a5a64155895749d47bc";

pub const TEST_ACCOUNT: &str = "0x4f05d22690e07938";

pub const REFERENCE_BLOCK_ID: &str =
    "f0e4c2f76c58916ec258f246851bea091d14d4247a2fc3e18694461b1816e13b";
pub const MOCK_TX_ID: &str = "2a1d7b6c5e4f3a2918070605040302010f0e0d0c0b0a09080706050403020100";

pub fn test_wallet() -> HdWallet {
    HdWallet::new(TEST_MNEMONIC, "").unwrap()
}

pub fn test_account() -> FlowAddress {
    FlowAddress::from_hex(TEST_ACCOUNT).unwrap()
}

pub fn key_for(curve: CurveType) -> PrivateKey {
    match curve {
        CurveType::P256 => PrivateKey::from_hex(P256_PRIVATE_KEY, CurveType::P256).unwrap(),
        CurveType::Secp256k1 => {
            PrivateKey::from_hex(SECP256K1_PRIVATE_KEY, CurveType::Secp256k1).unwrap()
        }
    }
}

pub fn signer_for(scheme: SigningScheme, key_index: u32) -> KeySigner {
    KeySigner::new(test_account(), key_index, scheme, key_for(scheme.curve())).unwrap()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Access 节点 mock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 一次 transaction_results 查询的应答
#[derive(Debug, Clone)]
pub enum ResultReply {
    NotFound,
    ServerError,
    /// 延迟后返回 Pending
    Delayed(Duration),
    Status {
        status: &'static str,
        status_code: u32,
        error_message: &'static str,
    },
}

impl ResultReply {
    pub fn status(status: &'static str) -> Self {
        Self::Status {
            status,
            status_code: 0,
            error_message: "",
        }
    }

    pub fn failed(error_message: &'static str) -> Self {
        Self::Status {
            status: "Sealed",
            status_code: 1,
            error_message,
        }
    }
}

#[derive(Debug)]
pub struct MockState {
    pub account: FlowAddress,
    /// 链上 key 列表（index, scheme, sequence_number）
    pub keys: Vec<(u32, SigningScheme, u64)>,
    pub submitted: Vec<TransactionBodyDto>,
    pub reject: Option<(StatusCode, String)>,
    /// 按顺序返回，最后一项重复
    pub results: VecDeque<ResultReply>,
    pub result_polls: usize,
}

impl MockState {
    pub fn new() -> Self {
        Self {
            account: test_account(),
            keys: vec![
                (0, SigningScheme::Secp256k1Sha3, 11),
                (1, SigningScheme::P256Sha2, 22),
                (2, SigningScheme::P256Sha3, 33),
                (3, SigningScheme::Secp256k1Sha2, 44),
            ],
            submitted: Vec::new(),
            reject: None,
            results: VecDeque::from(vec![ResultReply::status("Sealed")]),
            result_polls: 0,
        }
    }

    pub fn with_results(mut self, results: Vec<ResultReply>) -> Self {
        self.results = results.into();
        self
    }

    pub fn with_rejection(mut self, status: StatusCode, message: &str) -> Self {
        self.reject = Some((status, message.to_string()));
        self
    }
}

pub type SharedState = Arc<Mutex<MockState>>;

pub struct MockAccessNode {
    pub url: String,
    pub state: SharedState,
}

impl MockAccessNode {
    pub async fn start(state: MockState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/v1/blocks", get(latest_block))
            .route("/v1/accounts/:address", get(account))
            .route("/v1/transactions", post(submit_transaction))
            .route("/v1/transaction_results/:id", get(transaction_result))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn client(&self, seal: SealConfig) -> FlowClient {
        FlowClient::new(NetworkConfig::emulator().with_access_node(self.url.clone()))
            .unwrap()
            .with_seal_config(seal)
    }

    pub fn submitted(&self) -> Vec<TransactionBodyDto> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn result_polls(&self) -> usize {
        self.state.lock().unwrap().result_polls
    }
}

async fn latest_block() -> Json<Value> {
    Json(json!([{
        "header": {
            "id": REFERENCE_BLOCK_ID,
            "parent_id": "00",
            "height": "123456",
            "timestamp": "2024-01-01T00:00:00Z"
        }
    }]))
}

async fn account(
    State(state): State<SharedState>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let state = state.lock().unwrap();
    if FlowAddress::from_hex(&address).ok() != Some(state.account) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 404, "message": "account not found"})),
        );
    }

    let keys: Vec<Value> = state
        .keys
        .iter()
        .map(|(index, scheme, sequence_number)| {
            let public = key_for(scheme.curve()).public_key().unwrap();
            json!({
                "index": index.to_string(),
                "public_key": format!("0x{}", public.to_flow_hex()),
                "signing_algorithm": scheme.signature_algorithm().to_string(),
                "hashing_algorithm": scheme.hash_algorithm().to_string(),
                "sequence_number": sequence_number.to_string(),
                "weight": "1000",
                "revoked": false
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "address": state.account.to_rest_hex(),
            "balance": "100000000",
            "keys": keys
        })),
    )
}

async fn submit_transaction(
    State(state): State<SharedState>,
    Json(body): Json<TransactionBodyDto>,
) -> impl IntoResponse {
    let mut state = state.lock().unwrap();
    if let Some((status, message)) = state.reject.clone() {
        return (
            status,
            Json(json!({"code": status.as_u16(), "message": message})),
        );
    }

    state.submitted.push(body);
    (StatusCode::OK, Json(json!({"id": MOCK_TX_ID})))
}

async fn transaction_result(
    State(state): State<SharedState>,
    Path(_id): Path<String>,
) -> impl IntoResponse {
    let reply = {
        let mut state = state.lock().unwrap();
        state.result_polls += 1;

        if state.results.len() > 1 {
            state.results.pop_front()
        } else {
            state.results.front().cloned()
        }
    };

    let reply = match reply.unwrap_or(ResultReply::NotFound) {
        ResultReply::Delayed(delay) => {
            tokio::time::sleep(delay).await;
            ResultReply::status("Pending")
        }
        other => other,
    };

    match reply {
        ResultReply::NotFound | ResultReply::Delayed(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 404, "message": "transaction not found"})),
        ),
        ResultReply::ServerError => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"code": 503, "message": "node syncing"})),
        ),
        ResultReply::Status {
            status,
            status_code,
            error_message,
        } => {
            let execution = if status_code == 0 { "Success" } else { "Failure" };
            (
                StatusCode::OK,
                Json(json!({
                    "block_id": REFERENCE_BLOCK_ID,
                    "status": status,
                    "status_code": status_code,
                    "error_message": error_message,
                    "execution": execution,
                    "computation_used": "17",
                    "events": []
                })),
            )
        }
    }
}
