use std::sync::Mutex;

use async_trait::async_trait;
use chain_sol::{Cluster, Pubkey};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::transport::{
    AppIdentity, AuthToken, AuthorizationResult, AuthorizedAccount, WalletTransport,
};

/// An in-process wallet holding a single Ed25519 keypair.
///
/// Approves every authorize request without prompting. Tokens it did not
/// issue are refused on reauthorize, and it only signs for its own account.
pub struct LocalWalletTransport {
    signing_key: SigningKey,
    issued: Mutex<Vec<AuthToken>>,
}

impl LocalWalletTransport {
    /// Wallet with a fresh random keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Wallet for a known 32-byte secret key. The caller's copy is zeroed.
    pub fn from_secret_key(secret: &mut [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        secret.zeroize();
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            issued: Mutex::new(Vec::new()),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.signing_key.verifying_key().to_bytes())
    }

    fn account(&self) -> AuthorizedAccount {
        AuthorizedAccount {
            address: self.pubkey().to_bytes().to_vec(),
            label: Some("Local wallet".into()),
        }
    }

    fn issue_token(&self) -> Result<AuthToken, WalletError> {
        let mut raw = [0u8; 16];
        OsRng.fill_bytes(&mut raw);
        let token = AuthToken::new(hex::encode(raw));
        raw.zeroize();

        self.issued
            .lock()
            .map_err(|_| WalletError::Transport("token store poisoned".into()))?
            .push(token.clone());
        Ok(token)
    }

    fn is_issued(&self, token: &AuthToken) -> Result<bool, WalletError> {
        let issued = self
            .issued
            .lock()
            .map_err(|_| WalletError::Transport("token store poisoned".into()))?;
        Ok(issued.iter().any(|t| t == token))
    }
}

#[async_trait]
impl WalletTransport for LocalWalletTransport {
    async fn authorize(
        &self,
        cluster: Cluster,
        identity: &AppIdentity,
    ) -> Result<AuthorizationResult, WalletError> {
        debug!(%cluster, app = %identity.name, "local wallet authorize");
        Ok(AuthorizationResult {
            accounts: vec![self.account()],
            auth_token: self.issue_token()?,
        })
    }

    async fn reauthorize(
        &self,
        auth_token: &AuthToken,
        identity: &AppIdentity,
    ) -> Result<AuthorizationResult, WalletError> {
        if !self.is_issued(auth_token)? {
            return Err(WalletError::Declined(format!(
                "unknown auth token for {}",
                identity.name
            )));
        }
        Ok(AuthorizationResult {
            accounts: vec![self.account()],
            auth_token: auth_token.clone(),
        })
    }

    async fn sign_messages(
        &self,
        addresses: &[Vec<u8>],
        payloads: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, WalletError> {
        let ours = self.pubkey();
        if let Some(foreign) = addresses.iter().find(|a| a.as_slice() != ours.as_bytes()) {
            return Err(WalletError::SigningFailed(format!(
                "account {} is not held by this wallet",
                bs58::encode(foreign).into_string()
            )));
        }

        Ok(payloads
            .iter()
            .map(|payload| self.signing_key.sign(payload).to_bytes().to_vec())
            .collect())
    }

    async fn sign_transactions(
        &self,
        transactions: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, WalletError> {
        let mut secret = self.signing_key.to_bytes();
        let signed = transactions
            .iter()
            .map(|tx| chain_sol::sign_wire_transaction(&secret, tx))
            .collect::<Result<Vec<_>, _>>();
        secret.zeroize();
        Ok(signed?)
    }
}
