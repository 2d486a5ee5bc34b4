//! Wallet session core for the Obscura app.
//!
//! One [`WalletSession`] per app holds the active Solana or EVM connection
//! and publishes [`WalletState`] snapshots to whoever subscribes. Solana
//! wallets are reached through a [`WalletTransport`], EVM wallets through an
//! [`EvmConnector`]. [`IntentSubmitter`] signs transfers and swaps and hands
//! them to the Obscura backend.

pub mod backend;
pub mod config;
pub mod error;
pub mod intents;
pub mod local;
pub mod logging;
pub mod payload;
pub mod session;
pub mod transport;
pub mod types;

pub use backend::{EvmAccount, EvmConnector, SimulatedEvmConnector, ZERO_BALANCE};
pub use config::SessionConfig;
pub use error::WalletError;
pub use intents::{IntentSubmitter, SwapForm, TransferForm};
pub use local::LocalWalletTransport;
pub use logging::{init_tracing, LogFormat};
pub use payload::SignPayload;
pub use session::{WalletSession, WalletSessionBuilder};
pub use transport::{
    AppIdentity, AuthToken, AuthorizationResult, AuthorizedAccount, WalletTransport,
};
pub use types::{short_address, Chain, WalletState, WalletType};
