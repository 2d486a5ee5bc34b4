//! Solana chain support for the Obscura wallet.
//!
//! This crate handles Solana addresses, the native transaction wire format
//! and the handful of JSON-RPC calls the wallet session needs, all without
//! pulling in `solana-sdk`. Ed25519 comes from `ed25519-dalek`, Base58 from
//! `bs58`, and RPC goes over `reqwest`.

pub mod address;
pub mod cluster;
pub mod error;
pub mod lamports;
pub mod rpc;
pub mod transaction;

pub use address::{validate_address, Pubkey};
pub use cluster::Cluster;
pub use error::SolError;
pub use lamports::{format_sol, LAMPORTS_PER_SOL};
pub use rpc::{Commitment, RpcClient, SolanaRpc};
pub use transaction::{
    decode_compact_u16, encode_compact_u16, sign_wire_transaction, AccountMeta,
    CompiledInstruction, CompiledMessage, Instruction, NativeTransaction, SIGNATURE_LEN,
    SYSTEM_PROGRAM_ID,
};
