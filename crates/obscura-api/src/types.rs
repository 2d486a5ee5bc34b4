//! Request and response bodies of the Obscura backend.
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How much of a transfer or swap the backend reveals on-chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Transparent,
    #[default]
    Shielded,
    Compliant,
}

/// Chains the backend accepts as a transfer source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceChain {
    Ethereum,
    Solana,
    Polygon,
    Arbitrum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub recipient: String,
    pub asset: String,
    pub amount: String,
    pub source_chain: SourceChain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_level: Option<PrivacyLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub min_amount_out: String,
    /// Unix seconds after which the swap must not execute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_level: Option<PrivacyLevel>,
}

/// The backend's handle on a submitted transfer or swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub intent_id: String,
    pub stealth_address: String,
    pub commitment: String,
    pub expires_at: u64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthServices {
    pub auth: String,
    pub aggregator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub services: HealthServices,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub source_chain: String,
    pub target_chain: String,
    pub input_asset: String,
    pub output_asset: String,
    pub amount: String,
}

/// Quote listing. The quote objects themselves are backend-defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotesResponse {
    #[serde(default)]
    pub quotes: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
