//! Flow 测试网冒烟检查
//!
//! 用同一助记词派生的四把 key（{P-256, secp256k1} × {SHA2, SHA3}）
//! 依次作为提议者/付款方发送一笔仅输出日志的交易，并等待 Sealed。
//!
//! 用法: flow_testnet_smoke [--slot N] [--config path.toml]

use anyhow::{Context, Result};
use flow_wallet_kit::{
    config::{Config, FlowNetwork},
    domain::{FlowAddress, HdWallet, ProposalKey, SigningScheme},
    infrastructure::logging::init_logging,
    service::{cadence::SIMPLE_TRANSACTION, ChainClient, FlowClient, KeySigner, TransactionRequest},
};

const DEFAULT_ACCOUNT: &str = "0x4f05d22690e07938";
const DEFAULT_MNEMONIC: &str =
    "normal dune pole key case cradle unfold require tornado mercy hospital buyer";
const SMOKE_GAS_LIMIT: u64 = 1000;

/// 测试账户上的 key 槽位
const KEY_SLOTS: [(u32, SigningScheme); 4] = [
    (0, SigningScheme::Secp256k1Sha3),
    (1, SigningScheme::P256Sha2),
    (2, SigningScheme::P256Sha3),
    (3, SigningScheme::Secp256k1Sha2),
];

#[derive(Debug, Default)]
struct Args {
    slot: Option<u32>,
    config_path: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--slot" => {
                let value = args.next().context("--slot requires a value")?;
                parsed.slot = Some(value.parse().context("--slot must be a number")?);
            }
            "--config" => {
                parsed.config_path = Some(args.next().context("--config requires a path")?);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = parse_args()?;
    let config = Config::from_env_and_file(args.config_path.as_deref())?;
    config.validate()?;
    init_logging(&config.logging)?;

    if config.network.network != FlowNetwork::Testnet {
        tracing::warn!(network = %config.network.network, "Smoke check is meant for testnet");
    }

    let mnemonic = std::env::var("FLOW_MNEMONIC").unwrap_or_else(|_| DEFAULT_MNEMONIC.into());
    let account = FlowAddress::from_hex(
        &std::env::var("FLOW_ACCOUNT").unwrap_or_else(|_| DEFAULT_ACCOUNT.into()),
    )?;

    let wallet = HdWallet::new(&mnemonic, "").context("Failed to restore wallet")?;
    let client = FlowClient::from_config(&config)?;

    let slots: Vec<(u32, SigningScheme)> = KEY_SLOTS
        .iter()
        .copied()
        .filter(|(index, _)| args.slot.map_or(true, |s| s == *index))
        .collect();
    if slots.is_empty() {
        anyhow::bail!("No key slot matches {:?}", args.slot);
    }

    let mut failures = 0usize;
    for (key_index, scheme) in slots {
        let key = wallet.derive_default(scheme.curve())?;
        let signer = KeySigner::new(account, key_index, scheme, key)?;

        let request = TransactionRequest::builder()
            .script(SIMPLE_TRANSACTION)
            .gas_limit(SMOKE_GAS_LIMIT)
            .proposer(ProposalKey::new(account, key_index, -1))
            .payer(account)
            .build()?;

        let outcome = async {
            let id = client.submit(&request, &[&signer]).await?;
            client.await_sealed(&id).await
        }
        .await;

        match outcome {
            Ok(result) => {
                println!(
                    "{:<26} key {}  sealed  {}  computation={}",
                    scheme.to_string(),
                    key_index,
                    result.id,
                    result.computation_used
                );
            }
            Err(e) => {
                failures += 1;
                println!(
                    "{:<26} key {}  FAILED  [{}] {}",
                    scheme.to_string(),
                    key_index,
                    e.code(),
                    e
                );
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} key slot(s) failed", failures);
    }
    Ok(())
}
