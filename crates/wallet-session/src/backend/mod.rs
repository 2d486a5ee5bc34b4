//! Chain-family specific halves of the session.

pub mod evm;
pub mod solana;

pub use evm::{EvmAccount, EvmConnector, SimulatedEvmConnector};
pub use solana::{SolanaBackend, SolanaSession, ZERO_BALANCE};
