//! Signed transfer and swap submission.
//!
//! The wallet signs the intent first, then the backend is asked to build
//! it. Nothing reaches the backend unless the wallet produced a signature.

use std::sync::Arc;

use obscura_api::{IntentResponse, ObscuraClient, PrivacyLevel, SwapRequest, TransferRequest};
use serde_json::json;
use tracing::info;

use crate::error::WalletError;
use crate::session::WalletSession;
use crate::types::Chain;

/// User input for a private transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferForm {
    pub recipient: String,
    pub amount: String,
    pub asset: String,
    /// Source chain of the funds.
    pub chain: Chain,
    pub privacy_level: PrivacyLevel,
}

impl Default for TransferForm {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            amount: String::new(),
            asset: "ETH".into(),
            chain: Chain::Ethereum,
            privacy_level: PrivacyLevel::default(),
        }
    }
}

/// User input for a private swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapForm {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub min_amount_out: String,
    pub privacy_level: PrivacyLevel,
}

impl Default for SwapForm {
    fn default() -> Self {
        Self {
            token_in: "ETH".into(),
            token_out: "USDC".into(),
            amount_in: String::new(),
            min_amount_out: String::new(),
            privacy_level: PrivacyLevel::default(),
        }
    }
}

impl SwapForm {
    /// Swap the input and output tokens.
    pub fn flip(&mut self) {
        std::mem::swap(&mut self.token_in, &mut self.token_out);
    }
}

pub struct IntentSubmitter {
    session: Arc<WalletSession>,
    api: ObscuraClient,
}

impl IntentSubmitter {
    pub fn new(session: Arc<WalletSession>, api: ObscuraClient) -> Self {
        Self { session, api }
    }

    pub async fn submit_transfer(&self, form: &TransferForm) -> Result<IntentResponse, WalletError> {
        self.require_connected()?;
        require("recipient", &form.recipient)?;
        require("amount", &form.amount)?;

        let intent = json!({
            "type": "transfer",
            "recipient": form.recipient,
            "amount": form.amount,
            "asset": form.asset,
            "chain": form.chain,
            "privacyLevel": form.privacy_level,
        });
        self.sign(intent).await?;

        let response = self
            .api
            .transfer(&TransferRequest {
                recipient: form.recipient.clone(),
                asset: form.asset.clone(),
                amount: form.amount.clone(),
                source_chain: form.chain.into(),
                target_chain: None,
                privacy_level: Some(form.privacy_level),
            })
            .await?;
        info!(intent_id = %response.intent_id, "transfer intent created");
        Ok(response)
    }

    pub async fn submit_swap(&self, form: &SwapForm) -> Result<IntentResponse, WalletError> {
        self.require_connected()?;
        require("amountIn", &form.amount_in)?;
        require("minAmountOut", &form.min_amount_out)?;

        let intent = json!({
            "type": "swap",
            "tokenIn": form.token_in,
            "tokenOut": form.token_out,
            "amountIn": form.amount_in,
            "minAmountOut": form.min_amount_out,
            "privacyLevel": form.privacy_level,
        });
        self.sign(intent).await?;

        let response = self
            .api
            .swap(&SwapRequest {
                token_in: form.token_in.clone(),
                token_out: form.token_out.clone(),
                amount_in: form.amount_in.clone(),
                min_amount_out: form.min_amount_out.clone(),
                deadline: None,
                privacy_level: Some(form.privacy_level),
            })
            .await?;
        info!(intent_id = %response.intent_id, "swap intent created");
        Ok(response)
    }

    fn require_connected(&self) -> Result<(), WalletError> {
        if self.session.state().connected {
            Ok(())
        } else {
            Err(WalletError::WalletNotConnected)
        }
    }

    async fn sign(&self, intent: serde_json::Value) -> Result<String, WalletError> {
        self.session
            .sign_transaction(intent)
            .await
            .ok_or_else(|| WalletError::SigningFailed("wallet did not sign the intent".into()))
    }
}

fn require(field: &'static str, value: &str) -> Result<(), WalletError> {
    if value.trim().is_empty() {
        Err(WalletError::MissingField(field))
    } else {
        Ok(())
    }
}
