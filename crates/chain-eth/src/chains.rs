use serde::Serialize;

use crate::error::EthError;

/// Definition of an EVM-compatible network a session can connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvmNetwork {
    /// Short lowercase key used in API payloads (`"ethereum"`, ...).
    pub key: &'static str,
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub rpc_url: &'static str,
    pub explorer_url: &'static str,
}

/// Ethereum Mainnet (chain ID 1).
pub const ETHEREUM: EvmNetwork = EvmNetwork {
    key: "ethereum",
    chain_id: 1,
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
    rpc_url: "https://eth.llamarpc.com",
    explorer_url: "https://etherscan.io",
};

/// Polygon PoS (chain ID 137).
pub const POLYGON: EvmNetwork = EvmNetwork {
    key: "polygon",
    chain_id: 137,
    name: "Polygon",
    symbol: "MATIC",
    decimals: 18,
    rpc_url: "https://polygon-rpc.com",
    explorer_url: "https://polygonscan.com",
};

/// Arbitrum One (chain ID 42161).
pub const ARBITRUM: EvmNetwork = EvmNetwork {
    key: "arbitrum",
    chain_id: 42161,
    name: "Arbitrum One",
    symbol: "ETH",
    decimals: 18,
    rpc_url: "https://arb1.arbitrum.io/rpc",
    explorer_url: "https://arbiscan.io",
};

const ALL_NETWORKS: &[&EvmNetwork] = &[&ETHEREUM, &POLYGON, &ARBITRUM];

/// Network definition for a chain ID.
pub fn get_network(chain_id: u64) -> Result<&'static EvmNetwork, EthError> {
    ALL_NETWORKS
        .iter()
        .find(|n| n.chain_id == chain_id)
        .copied()
        .ok_or(EthError::UnsupportedChain(chain_id))
}

/// Network definition for a lowercase key such as `"polygon"`.
pub fn network_by_key(key: &str) -> Option<&'static EvmNetwork> {
    ALL_NETWORKS.iter().find(|n| n.key == key).copied()
}

/// All supported EVM networks.
pub fn supported_networks() -> Vec<&'static EvmNetwork> {
    ALL_NETWORKS.to_vec()
}
