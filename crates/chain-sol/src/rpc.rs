//! Minimal Solana JSON-RPC client.
//!
//! Only the three calls the wallet session needs are implemented:
//! `getBalance`, `getLatestBlockhash` and `sendTransaction`. They sit behind
//! the [`SolanaRpc`] trait so the session can be driven by a scripted RPC in
//! tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::address::Pubkey;
use crate::cluster::Cluster;
use crate::error::SolError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The Solana RPC calls the wallet session relies on.
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Balance of `pubkey` in lamports.
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, SolError>;

    /// The latest blockhash, decoded to its 32 raw bytes.
    async fn get_latest_blockhash(&self) -> Result<[u8; 32], SolError>;

    /// Broadcast a signed wire transaction. Returns its Base58 signature.
    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<String, SolError>;
}

/// Commitment level attached to every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
    #[allow(dead_code)]
    last_valid_block_height: u64,
}

/// JSON-RPC 2.0 client over HTTP.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: Url,
    commitment: Commitment,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Client for `url` with the given request timeout.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SolError> {
        let url = Url::parse(url).map_err(|e| SolError::InvalidRpcUrl(format!("{url}: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url,
            commitment: Commitment::default(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Client for a cluster's public endpoint.
    pub fn for_cluster(cluster: Cluster) -> Result<Self, SolError> {
        Self::new(cluster.rpc_url(), DEFAULT_TIMEOUT)
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, SolError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, url = %self.url, "solana rpc request");

        let envelope: RpcEnvelope<T> = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = envelope.error {
            return Err(SolError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| SolError::UnexpectedResponse(format!("{method}: missing result")))
    }
}

#[async_trait]
impl SolanaRpc for RpcClient {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, SolError> {
        let balance: WithContext<u64> = self
            .call(
                "getBalance",
                json!([pubkey.to_address(), { "commitment": self.commitment }]),
            )
            .await?;
        Ok(balance.value)
    }

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], SolError> {
        let latest: WithContext<LatestBlockhash> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await?;

        let bytes = bs58::decode(&latest.value.blockhash)
            .into_vec()
            .map_err(|e| SolError::UnexpectedResponse(format!("blockhash is not base58: {e}")))?;
        bytes.try_into().map_err(|v: Vec<u8>| {
            SolError::UnexpectedResponse(format!("blockhash has {} bytes", v.len()))
        })
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<String, SolError> {
        self.call(
            "sendTransaction",
            json!([
                BASE64.encode(wire),
                { "encoding": "base64", "preflightCommitment": self.commitment },
            ]),
        )
        .await
    }
}
