//! The seam between the session and an external Solana wallet.
//!
//! A mobile wallet adapter, a browser extension bridge or the in-process
//! [`LocalWalletTransport`](crate::local::LocalWalletTransport) all sit
//! behind [`WalletTransport`]. Every call is a separate round trip to the
//! wallet and may wait on the user.

use std::fmt;

use async_trait::async_trait;
use chain_sol::Cluster;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::WalletError;

/// Opaque credential issued by the wallet on authorize. Zeroed on drop and
/// never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for handing back to the wallet.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// How the app presents itself in the wallet's approval prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub name: String,
    pub uri: String,
    pub icon: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            name: "Obscura".into(),
            uri: "https://obscura.app".into(),
            icon: "favicon.ico".into(),
        }
    }
}

/// An account the wallet exposed to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedAccount {
    /// Raw 32-byte public key.
    pub address: Vec<u8>,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthorizationResult {
    pub accounts: Vec<AuthorizedAccount>,
    pub auth_token: AuthToken,
}

#[async_trait]
pub trait WalletTransport: Send + Sync {
    /// Ask the user to approve the app on `cluster`.
    async fn authorize(
        &self,
        cluster: Cluster,
        identity: &AppIdentity,
    ) -> Result<AuthorizationResult, WalletError>;

    /// Refresh a previously issued token without a full approval prompt.
    async fn reauthorize(
        &self,
        auth_token: &AuthToken,
        identity: &AppIdentity,
    ) -> Result<AuthorizationResult, WalletError>;

    /// Sign each payload with the given accounts. Returns one Ed25519
    /// signature per payload.
    async fn sign_messages(
        &self,
        addresses: &[Vec<u8>],
        payloads: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, WalletError>;

    /// Sign wire-format transactions. Returns them with the wallet's
    /// signature slot filled in.
    async fn sign_transactions(
        &self,
        transactions: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, WalletError>;
}
