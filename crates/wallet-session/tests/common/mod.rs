//! Scripted wallet, RPC and EVM doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chain_sol::{Cluster, Pubkey, SolError, SolanaRpc};
use tokio::sync::watch;
use wallet_session::{
    AppIdentity, AuthToken, AuthorizationResult, AuthorizedAccount, EvmAccount, EvmConnector,
    WalletError, WalletSession, WalletState, WalletTransport,
};

pub const MESSAGE_SIGNATURE: [u8; 64] = [1u8; 64];
pub const BLOCKHASH: [u8; 32] = [5u8; 32];
pub const BROADCAST_SIGNATURE: &str = "broadcast-signature";

/// Records what the session published while a wallet call was in flight.
#[derive(Default)]
pub struct Observer {
    rx: Mutex<Option<watch::Receiver<WalletState>>>,
    seen: Mutex<Vec<WalletState>>,
}

impl Observer {
    pub fn watch(&self, session: &WalletSession) {
        *self.rx.lock().unwrap() = Some(session.subscribe());
    }

    fn record(&self) {
        if let Some(rx) = self.rx.lock().unwrap().as_ref() {
            let state = rx.borrow().clone();
            self.seen.lock().unwrap().push(state);
        }
    }

    pub fn seen(&self) -> Vec<WalletState> {
        self.seen.lock().unwrap().clone()
    }
}

/// A Solana wallet that approves, signs and counts, as scripted.
pub struct ScriptedWallet {
    pub accounts: Vec<Vec<u8>>,
    pub fail_authorize: AtomicBool,
    pub fail_signing: AtomicBool,
    pub authorize_delay: Duration,
    pub authorize_calls: AtomicUsize,
    pub sign_message_calls: AtomicUsize,
    pub sign_transaction_calls: AtomicUsize,
    pub reauthorized_with: Mutex<Vec<String>>,
    /// Accounts listed on reauthorize, when different from `accounts`.
    pub reauthorize_accounts: Mutex<Option<Vec<Vec<u8>>>>,
    pub signed_payloads: Mutex<Vec<Vec<u8>>>,
    pub observer: Observer,
    next_token: AtomicUsize,
}

impl ScriptedWallet {
    pub fn with_account(account: [u8; 32]) -> Self {
        Self::with_accounts(vec![account.to_vec()])
    }

    pub fn with_accounts(accounts: Vec<Vec<u8>>) -> Self {
        Self {
            accounts,
            fail_authorize: AtomicBool::new(false),
            fail_signing: AtomicBool::new(false),
            authorize_delay: Duration::ZERO,
            authorize_calls: AtomicUsize::new(0),
            sign_message_calls: AtomicUsize::new(0),
            sign_transaction_calls: AtomicUsize::new(0),
            reauthorized_with: Mutex::new(Vec::new()),
            reauthorize_accounts: Mutex::new(None),
            signed_payloads: Mutex::new(Vec::new()),
            observer: Observer::default(),
            next_token: AtomicUsize::new(1),
        }
    }

    fn issue(&self, accounts: &[Vec<u8>]) -> AuthorizationResult {
        let n = self.next_token.fetch_add(1, Ordering::SeqCst);
        AuthorizationResult {
            accounts: accounts
                .iter()
                .map(|address| AuthorizedAccount {
                    address: address.clone(),
                    label: None,
                })
                .collect(),
            auth_token: AuthToken::new(format!("token-{n}")),
        }
    }
}

#[async_trait]
impl WalletTransport for ScriptedWallet {
    async fn authorize(
        &self,
        _cluster: Cluster,
        _identity: &AppIdentity,
    ) -> Result<AuthorizationResult, WalletError> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        self.observer.record();
        tokio::time::sleep(self.authorize_delay).await;
        if self.fail_authorize.load(Ordering::SeqCst) {
            return Err(WalletError::Declined("user rejected".into()));
        }
        Ok(self.issue(&self.accounts))
    }

    async fn reauthorize(
        &self,
        auth_token: &AuthToken,
        _identity: &AppIdentity,
    ) -> Result<AuthorizationResult, WalletError> {
        self.reauthorized_with
            .lock()
            .unwrap()
            .push(auth_token.expose().to_string());
        let listed = self.reauthorize_accounts.lock().unwrap().clone();
        Ok(self.issue(listed.as_deref().unwrap_or(&self.accounts)))
    }

    async fn sign_messages(
        &self,
        _addresses: &[Vec<u8>],
        payloads: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, WalletError> {
        self.sign_message_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(WalletError::SigningFailed("user rejected".into()));
        }
        self.signed_payloads
            .lock()
            .unwrap()
            .extend(payloads.iter().cloned());
        Ok(payloads.iter().map(|_| MESSAGE_SIGNATURE.to_vec()).collect())
    }

    async fn sign_transactions(
        &self,
        transactions: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, WalletError> {
        self.sign_transaction_calls.fetch_add(1, Ordering::SeqCst);
        Ok(transactions
            .iter()
            .map(|tx| {
                let mut signed = tx.clone();
                signed[1..65].copy_from_slice(&[0xAB; 64]);
                signed
            })
            .collect())
    }
}

/// An RPC with a settable balance that records broadcasts.
pub struct ScriptedRpc {
    balance: AtomicU64,
    balance_fails: AtomicBool,
    pub blockhash_fails: AtomicBool,
    pub send_fails: AtomicBool,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedRpc {
    pub fn with_balance(lamports: u64) -> Self {
        Self {
            balance: AtomicU64::new(lamports),
            balance_fails: AtomicBool::new(false),
            blockhash_fails: AtomicBool::new(false),
            send_fails: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_balance() -> Self {
        let rpc = Self::with_balance(0);
        rpc.balance_fails.store(true, Ordering::SeqCst);
        rpc
    }

    pub fn set_balance(&self, lamports: u64) {
        self.balance.store(lamports, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SolanaRpc for ScriptedRpc {
    async fn get_balance(&self, _pubkey: &Pubkey) -> Result<u64, SolError> {
        if self.balance_fails.load(Ordering::SeqCst) {
            return Err(SolError::Rpc {
                code: -32005,
                message: "node is behind".into(),
            });
        }
        Ok(self.balance.load(Ordering::SeqCst))
    }

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], SolError> {
        if self.blockhash_fails.load(Ordering::SeqCst) {
            return Err(SolError::UnexpectedResponse("missing blockhash".into()));
        }
        Ok(BLOCKHASH)
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<String, SolError> {
        if self.send_fails.load(Ordering::SeqCst) {
            return Err(SolError::Rpc {
                code: -32002,
                message: "Transaction simulation failed".into(),
            });
        }
        self.sent.lock().unwrap().push(wire.to_vec());
        Ok(BROADCAST_SIGNATURE.to_string())
    }
}

/// An EVM connector that answers immediately, or fails when told to.
#[derive(Default)]
pub struct ScriptedEvm {
    pub fail_connect: AtomicBool,
    pub connect_calls: AtomicUsize,
    pub observer: Observer,
}

#[async_trait]
impl EvmConnector for ScriptedEvm {
    async fn connect(
        &self,
        network: &'static chain_eth::EvmNetwork,
    ) -> Result<EvmAccount, WalletError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.observer.record();
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(WalletError::Transport(format!(
                "no wallet for {}",
                network.name
            )));
        }
        Ok(EvmAccount {
            address: "0x52908400098527886e0f7030069857d2e4169ee7".into(),
            balance: format!("0.15 {}", network.symbol),
        })
    }

    async fn sign_message(
        &self,
        _account: &EvmAccount,
        _message: &[u8],
    ) -> Result<String, WalletError> {
        Ok(format!("0x{}", "ab".repeat(65)))
    }
}

pub fn session(wallet: &Arc<ScriptedWallet>, rpc: &Arc<ScriptedRpc>) -> WalletSession {
    WalletSession::builder(wallet.clone(), rpc.clone()).build()
}

pub fn session_with_evm(
    wallet: &Arc<ScriptedWallet>,
    rpc: &Arc<ScriptedRpc>,
    evm: &Arc<ScriptedEvm>,
) -> WalletSession {
    WalletSession::builder(wallet.clone(), rpc.clone())
        .evm_connector(evm.clone())
        .build()
}
