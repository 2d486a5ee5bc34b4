use std::fmt;
use std::str::FromStr;

use chain_eth::EvmNetwork;
use obscura_api::SourceChain;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Chains a session can be connected to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Solana,
    Ethereum,
    Polygon,
    Arbitrum,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Solana, Chain::Ethereum, Chain::Polygon, Chain::Arbitrum];

    /// Wallet family that serves this chain.
    pub fn wallet_type(&self) -> WalletType {
        match self {
            Chain::Solana => WalletType::Solana,
            Chain::Ethereum | Chain::Polygon | Chain::Arbitrum => WalletType::Evm,
        }
    }

    pub fn is_evm(&self) -> bool {
        self.wallet_type() == WalletType::Evm
    }

    /// Network definition for EVM chains. `None` for Solana.
    pub fn evm_network(&self) -> Option<&'static EvmNetwork> {
        chain_eth::network_by_key(self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Ethereum => "ethereum",
            Chain::Polygon => "polygon",
            Chain::Arbitrum => "arbitrum",
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self.evm_network() {
            Some(network) => network.name,
            None => "Solana",
        }
    }

    /// Native token symbol
    pub fn symbol(&self) -> &'static str {
        match self.evm_network() {
            Some(network) => network.symbol,
            None => "SOL",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WalletError::UnsupportedChain(s.to_string()))
    }
}

impl From<Chain> for SourceChain {
    fn from(chain: Chain) -> Self {
        match chain {
            Chain::Solana => SourceChain::Solana,
            Chain::Ethereum => SourceChain::Ethereum,
            Chain::Polygon => SourceChain::Polygon,
            Chain::Arbitrum => SourceChain::Arbitrum,
        }
    }
}

/// Wallet family of the active connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    Solana,
    Evm,
    #[default]
    None,
}

/// Read-only snapshot of the session, as published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub connected: bool,
    pub address: Option<String>,
    pub chain: Chain,
    pub wallet_type: WalletType,
    pub balance: Option<String>,
    pub loading: bool,
}

impl WalletState {
    /// Abbreviated address for display, if connected.
    pub fn short_address(&self) -> Option<String> {
        self.address.as_deref().map(short_address)
    }
}

/// First 6 and last 4 characters joined by `...`. Addresses of 10
/// characters or fewer are returned unchanged.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
