use std::sync::Arc;

use chain_sol::{format_sol, Cluster, NativeTransaction, Pubkey, SolanaRpc};
use tracing::{debug, warn};

use crate::error::WalletError;
use crate::transport::{AppIdentity, AuthToken, AuthorizationResult, WalletTransport};

/// Shown when the balance cannot be fetched.
pub const ZERO_BALANCE: &str = "0 SOL";

/// An authorized Solana wallet account.
#[derive(Debug, Clone)]
pub struct SolanaSession {
    pub pubkey: Pubkey,
    pub auth_token: AuthToken,
    pub balance: String,
}

/// Output of a wallet signing round trip.
#[derive(Debug)]
pub struct Signed {
    /// Base58 signature.
    pub signature: String,
    /// Token returned by the reauthorize that preceded the signature.
    pub auth_token: AuthToken,
}

/// Drives a [`WalletTransport`] and a [`SolanaRpc`] on behalf of the
/// session.
pub struct SolanaBackend {
    transport: Arc<dyn WalletTransport>,
    rpc: Arc<dyn SolanaRpc>,
    cluster: Cluster,
    identity: AppIdentity,
}

impl SolanaBackend {
    pub fn new(
        transport: Arc<dyn WalletTransport>,
        rpc: Arc<dyn SolanaRpc>,
        cluster: Cluster,
        identity: AppIdentity,
    ) -> Self {
        Self {
            transport,
            rpc,
            cluster,
            identity,
        }
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    /// Authorize with the wallet and load the first account's balance.
    pub async fn connect(&self) -> Result<SolanaSession, WalletError> {
        let AuthorizationResult {
            accounts,
            auth_token,
        } = self.transport.authorize(self.cluster, &self.identity).await?;

        let account = accounts.first().ok_or(WalletError::NoAccounts)?;
        let pubkey = Pubkey::try_from_slice(&account.address)
            .map_err(|e| WalletError::InvalidAccount(e.to_string()))?;
        let balance = self.balance(&pubkey).await;

        Ok(SolanaSession {
            pubkey,
            auth_token,
            balance,
        })
    }

    /// Display balance of `pubkey`, or [`ZERO_BALANCE`] if the RPC fails.
    pub async fn balance(&self, pubkey: &Pubkey) -> String {
        match self.rpc.get_balance(pubkey).await {
            Ok(lamports) => format_sol(lamports),
            Err(e) => {
                warn!(%pubkey, error = %e, "balance fetch failed");
                ZERO_BALANCE.to_string()
            }
        }
    }

    /// Refresh the session's token. A wallet that lists accounts must still
    /// list the session's one. An empty list is accepted.
    async fn reauthorize(&self, session: &SolanaSession) -> Result<AuthToken, WalletError> {
        let AuthorizationResult {
            accounts,
            auth_token,
        } = self
            .transport
            .reauthorize(&session.auth_token, &self.identity)
            .await?;

        if !accounts.is_empty()
            && !accounts
                .iter()
                .any(|a| a.address.as_slice() == session.pubkey.as_bytes())
        {
            return Err(WalletError::InvalidAccount(format!(
                "{} is no longer authorized",
                session.pubkey
            )));
        }
        Ok(auth_token)
    }

    pub async fn sign_message(
        &self,
        session: &SolanaSession,
        message: &[u8],
    ) -> Result<Signed, WalletError> {
        let auth_token = self.reauthorize(session).await?;
        let signatures = self
            .transport
            .sign_messages(&[session.pubkey.to_bytes().to_vec()], &[message.to_vec()])
            .await?;
        let signature = signatures
            .first()
            .ok_or_else(|| WalletError::SigningFailed("wallet returned no signature".into()))?;

        Ok(Signed {
            signature: bs58::encode(signature).into_string(),
            auth_token,
        })
    }

    /// Bind `tx` to the session key and the latest blockhash, have the
    /// wallet sign it and broadcast it.
    pub async fn sign_and_send(
        &self,
        session: &SolanaSession,
        tx: &NativeTransaction,
    ) -> Result<Signed, WalletError> {
        let auth_token = self.reauthorize(session).await?;
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let unsigned = tx
            .compile(session.pubkey.as_bytes(), &blockhash)?
            .to_unsigned_wire()?;

        let signed = self.transport.sign_transactions(&[unsigned]).await?;
        let wire = signed
            .first()
            .ok_or_else(|| WalletError::SigningFailed("wallet returned no transaction".into()))?;

        let signature = self.rpc.send_raw_transaction(wire).await?;
        debug!(%signature, "transaction broadcast");
        Ok(Signed {
            signature,
            auth_token,
        })
    }
}
