use std::time::Duration;

use async_trait::async_trait;
use chain_eth::EvmNetwork;
use tracing::debug;

use crate::error::WalletError;

/// An EVM account as reported by the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmAccount {
    /// `0x`-prefixed hex address.
    pub address: String,
    /// Display balance, e.g. `"0.15 ETH"`.
    pub balance: String,
}

/// Connects to an EVM wallet and signs with it.
#[async_trait]
pub trait EvmConnector: Send + Sync {
    async fn connect(&self, network: &'static EvmNetwork) -> Result<EvmAccount, WalletError>;

    /// Sign `message` with `account`. Returns a `0x`-prefixed hex signature.
    async fn sign_message(
        &self,
        account: &EvmAccount,
        message: &[u8],
    ) -> Result<String, WalletError>;
}

pub const DEFAULT_CONNECT_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_SIGN_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_BALANCE: &str = "0.15 ETH";

/// Stand-in for a WalletConnect session. Waits like a wallet round trip
/// would, then returns a random address and signature.
#[derive(Debug, Clone)]
pub struct SimulatedEvmConnector {
    connect_delay: Duration,
    sign_delay: Duration,
    balance: String,
}

impl SimulatedEvmConnector {
    pub fn new(connect_delay: Duration, sign_delay: Duration, balance: impl Into<String>) -> Self {
        Self {
            connect_delay,
            sign_delay,
            balance: balance.into(),
        }
    }
}

impl Default for SimulatedEvmConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_DELAY, DEFAULT_SIGN_DELAY, DEFAULT_BALANCE)
    }
}

#[async_trait]
impl EvmConnector for SimulatedEvmConnector {
    async fn connect(&self, network: &'static EvmNetwork) -> Result<EvmAccount, WalletError> {
        debug!(network = network.name, chain_id = network.chain_id, "simulated evm connect");
        tokio::time::sleep(self.connect_delay).await;

        let address = chain_eth::random_address();
        chain_eth::validate_address(&address)?;
        Ok(EvmAccount {
            address,
            balance: self.balance.clone(),
        })
    }

    async fn sign_message(
        &self,
        account: &EvmAccount,
        message: &[u8],
    ) -> Result<String, WalletError> {
        debug!(address = %account.address, len = message.len(), "simulated evm sign");
        tokio::time::sleep(self.sign_delay).await;
        Ok(chain_eth::random_signature())
    }
}
