//! The wallet session state machine.
//!
//! A [`WalletSession`] owns the single active connection, Solana or EVM, and
//! publishes a [`WalletState`] snapshot after every change. Connect,
//! disconnect, chain switches and balance refreshes run one at a time under
//! an async mutex, so a second tap waits for the first to finish instead of
//! racing it. Signing only takes the lock long enough to copy the session,
//! then talks to the wallet without holding it.

use std::sync::Arc;

use chain_sol::{Cluster, RpcClient, SolanaRpc};
use tokio::sync::{watch, Mutex};
use tracing::{error, info};

use crate::backend::evm::{EvmAccount, EvmConnector, SimulatedEvmConnector};
use crate::backend::solana::{Signed, SolanaBackend, SolanaSession};
use crate::config::SessionConfig;
use crate::error::WalletError;
use crate::payload::SignPayload;
use crate::transport::{AppIdentity, WalletTransport};
use crate::types::{Chain, WalletState, WalletType};

#[derive(Debug, Clone)]
struct EvmSession {
    chain: Chain,
    account: EvmAccount,
}

#[derive(Debug, Clone, Default)]
enum Connection {
    #[default]
    Disconnected,
    Solana(SolanaSession),
    Evm(EvmSession),
}

impl Connection {
    fn wallet_type(&self) -> WalletType {
        match self {
            Connection::Disconnected => WalletType::None,
            Connection::Solana(_) => WalletType::Solana,
            Connection::Evm(_) => WalletType::Evm,
        }
    }

    fn snapshot(&self, loading: bool) -> WalletState {
        match self {
            Connection::Disconnected => WalletState {
                loading,
                ..WalletState::default()
            },
            Connection::Solana(session) => WalletState {
                connected: true,
                address: Some(session.pubkey.to_address()),
                chain: Chain::Solana,
                wallet_type: WalletType::Solana,
                balance: Some(session.balance.clone()),
                loading,
            },
            Connection::Evm(session) => WalletState {
                connected: true,
                address: Some(session.account.address.clone()),
                chain: session.chain,
                wallet_type: WalletType::Evm,
                balance: Some(session.account.balance.clone()),
                loading,
            },
        }
    }
}

/// Handle to the app's wallet connection. Share it behind an `Arc`.
pub struct WalletSession {
    solana: SolanaBackend,
    evm: Arc<dyn EvmConnector>,
    connection: Mutex<Connection>,
    state: watch::Sender<WalletState>,
}

pub struct WalletSessionBuilder {
    transport: Arc<dyn WalletTransport>,
    rpc: Arc<dyn SolanaRpc>,
    evm: Option<Arc<dyn EvmConnector>>,
    cluster: Cluster,
    identity: AppIdentity,
}

impl WalletSessionBuilder {
    pub fn evm_connector(mut self, connector: Arc<dyn EvmConnector>) -> Self {
        self.evm = Some(connector);
        self
    }

    pub fn cluster(mut self, cluster: Cluster) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn identity(mut self, identity: AppIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn build(self) -> WalletSession {
        let (state, _) = watch::channel(WalletState::default());
        WalletSession {
            solana: SolanaBackend::new(self.transport, self.rpc, self.cluster, self.identity),
            evm: self
                .evm
                .unwrap_or_else(|| Arc::new(SimulatedEvmConnector::default())),
            connection: Mutex::new(Connection::Disconnected),
            state,
        }
    }
}

impl WalletSession {
    pub fn builder(
        transport: Arc<dyn WalletTransport>,
        rpc: Arc<dyn SolanaRpc>,
    ) -> WalletSessionBuilder {
        WalletSessionBuilder {
            transport,
            rpc,
            evm: None,
            cluster: Cluster::default(),
            identity: AppIdentity::default(),
        }
    }

    /// Session talking to the configured RPC endpoint, with the simulated
    /// EVM connector.
    pub fn from_config(
        config: &SessionConfig,
        transport: Arc<dyn WalletTransport>,
    ) -> Result<Self, WalletError> {
        let rpc = RpcClient::new(config.rpc_url(), config.http_timeout)?
            .with_commitment(config.commitment);
        let evm = SimulatedEvmConnector::new(
            config.evm.connect_delay,
            config.evm.sign_delay,
            config.evm.balance.clone(),
        );
        Ok(Self::builder(transport, Arc::new(rpc))
            .cluster(config.cluster)
            .identity(config.identity.clone())
            .evm_connector(Arc::new(evm))
            .build())
    }

    /// Current snapshot.
    pub fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }

    pub fn cluster(&self) -> Cluster {
        self.solana.cluster()
    }

    fn publish(&self, connection: &Connection) {
        self.state.send_replace(connection.snapshot(false));
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_modify(|state| state.loading = loading);
    }

    /// Connect a wallet for `chain`.
    ///
    /// Always runs a full connect, even on a connected session, and replaces
    /// the connection only on success. On failure the previous state is
    /// kept, apart from `loading` being cleared, and the error returned.
    pub async fn connect(&self, chain: Chain) -> Result<(), WalletError> {
        let mut connection = self.connection.lock().await;
        self.connect_locked(&mut connection, chain).await
    }

    async fn connect_locked(
        &self,
        connection: &mut Connection,
        chain: Chain,
    ) -> Result<(), WalletError> {
        self.set_loading(true);

        let result = match chain.evm_network() {
            None => self.solana.connect().await.map(Connection::Solana),
            Some(network) => self
                .evm
                .connect(network)
                .await
                .map(|account| Connection::Evm(EvmSession { chain, account })),
        };

        match result {
            Ok(next) => {
                *connection = next;
                self.publish(connection);
                info!(%chain, address = ?self.state.borrow().address, "wallet connected");
                Ok(())
            }
            Err(e) => {
                self.set_loading(false);
                error!(%chain, error = %e, "wallet connect failed");
                Err(e)
            }
        }
    }

    /// Forget the wallet and publish the default state. Safe to call when
    /// already disconnected.
    pub async fn disconnect(&self) {
        let mut connection = self.connection.lock().await;
        self.disconnect_locked(&mut connection);
    }

    fn disconnect_locked(&self, connection: &mut Connection) {
        let previous = connection.wallet_type();
        *connection = Connection::Disconnected;
        self.state.send_replace(WalletState::default());
        if previous != WalletType::None {
            info!(wallet_type = ?previous, "wallet disconnected");
        }
    }

    /// Move the session to `chain`.
    ///
    /// Within the EVM family only the selected chain changes. Crossing
    /// families disconnects first and then connects. If that connect fails
    /// the session stays disconnected. Does nothing when disconnected.
    pub async fn switch_chain(&self, chain: Chain) -> Result<(), WalletError> {
        let mut connection = self.connection.lock().await;
        match (connection.wallet_type(), chain.wallet_type()) {
            (WalletType::None, _) | (WalletType::Solana, WalletType::Solana) => Ok(()),
            (WalletType::Evm, WalletType::Evm) => {
                if let Connection::Evm(session) = &mut *connection {
                    session.chain = chain;
                }
                self.publish(&connection);
                info!(%chain, "evm chain switched");
                Ok(())
            }
            _ => {
                info!(%chain, "switching wallet family");
                self.disconnect_locked(&mut connection);
                self.connect_locked(&mut connection, chain).await
            }
        }
    }

    /// Sign a UTF-8 message with the connected wallet.
    ///
    /// Returns the Base58 (Solana) or hex (EVM) signature, or `None` when
    /// disconnected or when the wallet fails. Failures are logged.
    pub async fn sign_message(&self, message: &str) -> Option<String> {
        let connection = self.connection.lock().await.clone();
        let result = match &connection {
            Connection::Disconnected => return None,
            Connection::Solana(session) => {
                let signed = self.solana.sign_message(session, message.as_bytes()).await;
                self.settle(session, signed).await
            }
            Connection::Evm(session) => {
                self.evm
                    .sign_message(&session.account, message.as_bytes())
                    .await
            }
        };
        logged("sign message", result)
    }

    /// Sign a transaction or a structured payload.
    ///
    /// A native transaction on a Solana session is bound to the session key
    /// and the latest blockhash, signed by the wallet and broadcast. The
    /// broadcast signature is returned. Everything else is signed as a
    /// message over its compact JSON form and never broadcast.
    pub async fn sign_transaction(&self, payload: impl Into<SignPayload>) -> Option<String> {
        let payload = payload.into();
        let connection = self.connection.lock().await.clone();
        match (&connection, &payload) {
            (Connection::Disconnected, _) => None,
            (Connection::Solana(session), SignPayload::Native(tx)) => {
                let signed = self.solana.sign_and_send(session, tx).await;
                let result = self.settle(session, signed).await;
                logged("sign transaction", result)
            }
            _ => match payload.to_message() {
                Ok(message) => self.sign_message(&message).await,
                Err(e) => logged("sign transaction", Err(e.into())),
            },
        }
    }

    /// Keep the token returned by a signing round trip, unless the session
    /// changed while the wallet was busy.
    async fn settle(
        &self,
        session: &SolanaSession,
        signed: Result<Signed, WalletError>,
    ) -> Result<String, WalletError> {
        let Signed {
            signature,
            auth_token,
        } = signed?;

        let mut connection = self.connection.lock().await;
        if let Connection::Solana(current) = &mut *connection {
            if current.pubkey == session.pubkey && current.auth_token == session.auth_token {
                current.auth_token = auth_token;
            }
        }
        Ok(signature)
    }

    /// Re-fetch the Solana balance. Does nothing for EVM or when
    /// disconnected.
    pub async fn refresh_balance(&self) {
        let mut connection = self.connection.lock().await;
        let Connection::Solana(session) = &mut *connection else {
            return;
        };

        self.set_loading(true);
        session.balance = self.solana.balance(&session.pubkey).await;
        self.publish(&connection);
    }
}

fn logged(operation: &str, result: Result<String, WalletError>) -> Option<String> {
    match result {
        Ok(signature) => Some(signature),
        Err(e) => {
            error!(operation, error = %e, "wallet signing failed");
            None
        }
    }
}
