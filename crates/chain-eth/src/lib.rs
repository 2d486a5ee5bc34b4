//! EVM chain support for the Obscura wallet.
//!
//! This crate provides:
//! - The EVM networks a session can be connected to
//! - Address validation with EIP-55 checksums
//! - Random address and signature generation for the simulated connector

pub mod address;
pub mod chains;
pub mod error;
pub mod random;

pub use address::{checksum_address, parse_address, validate_address};
pub use chains::{
    get_network, network_by_key, supported_networks, EvmNetwork, ARBITRUM, ETHEREUM, POLYGON,
};
pub use error::EthError;
pub use random::{random_address, random_signature};
