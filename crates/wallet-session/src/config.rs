//! Runtime configuration of a wallet session.
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OBSCURA_CLUSTER` | `devnet`, `testnet` or `mainnet-beta` | `devnet` |
//! | `OBSCURA_SOLANA_RPC_URL` | Solana JSON-RPC endpoint | the cluster's public endpoint |
//! | `OBSCURA_API_URL` | Obscura backend base URL | production backend |
//! | `OBSCURA_HTTP_TIMEOUT_SECS` | Request timeout for RPC and backend calls | `30` |
//! | `OBSCURA_LOG_FORMAT` | `json` or `pretty` | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::time::Duration;

use chain_sol::{Cluster, Commitment};

use crate::backend::evm::{DEFAULT_BALANCE, DEFAULT_CONNECT_DELAY, DEFAULT_SIGN_DELAY};
use crate::error::WalletError;
use crate::logging::LogFormat;
use crate::transport::AppIdentity;

pub const CLUSTER_ENV: &str = "OBSCURA_CLUSTER";
pub const SOLANA_RPC_URL_ENV: &str = "OBSCURA_SOLANA_RPC_URL";
pub const API_URL_ENV: &str = "OBSCURA_API_URL";
pub const HTTP_TIMEOUT_ENV: &str = "OBSCURA_HTTP_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "OBSCURA_LOG_FORMAT";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Timing and balance of the simulated EVM connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedEvmConfig {
    pub connect_delay: Duration,
    pub sign_delay: Duration,
    pub balance: String,
}

impl Default for SimulatedEvmConfig {
    fn default() -> Self {
        Self {
            connect_delay: DEFAULT_CONNECT_DELAY,
            sign_delay: DEFAULT_SIGN_DELAY,
            balance: DEFAULT_BALANCE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cluster: Cluster,
    /// Overrides the cluster's public endpoint.
    pub solana_rpc_url: Option<String>,
    pub commitment: Commitment,
    pub identity: AppIdentity,
    pub api_url: String,
    pub http_timeout: Duration,
    pub evm: SimulatedEvmConfig,
    pub log_format: LogFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            solana_rpc_url: None,
            commitment: Commitment::default(),
            identity: AppIdentity::default(),
            api_url: obscura_api::DEFAULT_BASE_URL.into(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            evm: SimulatedEvmConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl SessionConfig {
    /// Load from `OBSCURA_*` environment variables. Unset variables keep
    /// their defaults. Set but unparseable values are errors.
    pub fn from_env() -> Result<Self, WalletError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WalletError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(cluster) = get(CLUSTER_ENV) {
            config.cluster = cluster
                .parse()
                .map_err(|e| WalletError::Config(format!("{CLUSTER_ENV}: {e}")))?;
        }
        config.solana_rpc_url = get(SOLANA_RPC_URL_ENV);
        if let Some(api_url) = get(API_URL_ENV) {
            config.api_url = api_url;
        }
        if let Some(secs) = get(HTTP_TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                WalletError::Config(format!("{HTTP_TIMEOUT_ENV}: not a number of seconds: {secs}"))
            })?;
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(format) = get(LOG_FORMAT_ENV) {
            config.log_format = format.parse()?;
        }

        Ok(config)
    }

    /// Effective Solana RPC endpoint.
    pub fn rpc_url(&self) -> &str {
        self.solana_rpc_url
            .as_deref()
            .unwrap_or_else(|| self.cluster.rpc_url())
    }
}
