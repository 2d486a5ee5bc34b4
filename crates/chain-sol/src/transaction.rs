//! Solana native transactions and their wire format.
//!
//! A [`NativeTransaction`] is a list of instructions with no fee payer and no
//! blockhash yet, the same shape a dApp hands to a wallet. The session binds
//! both at signing time via [`NativeTransaction::compile`], which produces a
//! [`CompiledMessage`] that can be serialized with empty signature slots and
//! passed to the wallet.
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```

use ed25519_dalek::Signer;
use zeroize::Zeroize;

use crate::error::SolError;

/// The Solana System Program public key: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System Program `Transfer` instruction index (little-endian u32).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

/// Size of one Ed25519 signature slot.
pub const SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in Solana's compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 value from the front of a byte slice.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    let mut shift = 0u32;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            SolError::SerializationError(
                "unexpected end of data while decoding compact-u16".into(),
            )
        })?;
        consumed += 1;

        value |= ((byte & 0x7f) as u32) << shift;
        shift += 7;

        if byte & 0x80 == 0 || consumed >= 3 {
            break;
        }
    }

    let value = u16::try_from(value)
        .map_err(|_| SolError::SerializationError("compact-u16 value overflow".into()))?;

    Ok((value, consumed))
}

fn compact_len(len: usize, what: &str) -> Result<Vec<u8>, SolError> {
    let len = u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("too many {what}: {len}")))?;
    Ok(encode_compact_u16(len))
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// A single account reference in an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

/// An instruction before it is compiled against a message's account table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    /// System Program `Transfer` of `lamports` from `from` to `to`.
    pub fn system_transfer(from: &[u8; 32], to: &[u8; 32], lamports: u64) -> Self {
        // u32 LE instruction index (2 = Transfer) + u64 LE lamports.
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
        data.extend_from_slice(&lamports.to_le_bytes());

        Self {
            program_id: SYSTEM_PROGRAM_ID,
            accounts: vec![
                AccountMeta {
                    pubkey: *from,
                    is_signer: true,
                    is_writable: true,
                },
                AccountMeta {
                    pubkey: *to,
                    is_signer: false,
                    is_writable: true,
                },
            ],
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Native transaction
// ---------------------------------------------------------------------------

/// A Solana transaction that has not yet been bound to a fee payer or a
/// recent blockhash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeTransaction {
    instructions: Vec<Instruction>,
}

impl NativeTransaction {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Single native SOL transfer. Zero-lamport transfers are rejected.
    pub fn transfer(from: &[u8; 32], to: &[u8; 32], lamports: u64) -> Result<Self, SolError> {
        if lamports == 0 {
            return Err(SolError::TransactionBuildError(
                "lamports must be > 0".into(),
            ));
        }
        Ok(Self::new(vec![Instruction::system_transfer(from, to, lamports)]))
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Bind the transaction to `fee_payer` and `recent_blockhash`.
    ///
    /// The fee payer is always a writable signer at account index 0. The
    /// remaining accounts follow Solana's canonical order: writable signers,
    /// read-only signers, writable non-signers, read-only non-signers.
    pub fn compile(
        &self,
        fee_payer: &[u8; 32],
        recent_blockhash: &[u8; 32],
    ) -> Result<CompiledMessage, SolError> {
        if self.instructions.is_empty() {
            return Err(SolError::TransactionBuildError(
                "transaction has no instructions".into(),
            ));
        }

        struct AccountEntry {
            pubkey: [u8; 32],
            is_signer: bool,
            is_writable: bool,
        }

        let mut entries: Vec<AccountEntry> = Vec::new();
        let mut upsert = |pubkey: [u8; 32], signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(AccountEntry {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        upsert(*fee_payer, true, true);
        for ix in &self.instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // Stable sort keeps insertion order inside a category, so the fee
        // payer stays first among writable signers.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        // Header counts and instruction indices are single bytes.
        if entries.len() > usize::from(u8::MAX) {
            return Err(SolError::TransactionBuildError(format!(
                "too many accounts: {}",
                entries.len()
            )));
        }

        let count = |pred: fn(&AccountEntry) -> bool| entries.iter().filter(|e| pred(e)).count() as u8;
        let num_required_signatures = count(|e| e.is_signer);
        let num_readonly_signed = count(|e| e.is_signer && !e.is_writable);
        let num_readonly_unsigned = count(|e| !e.is_signer && !e.is_writable);

        let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();
        let index_of = |key: &[u8; 32], what: &str| -> Result<u8, SolError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| SolError::TransactionBuildError(format!("{what} not in account keys")))
        };

        let mut instructions = Vec::with_capacity(self.instructions.len());
        for ix in &self.instructions {
            let program_id_index = index_of(&ix.program_id, "program_id")?;
            let account_indices = ix
                .accounts
                .iter()
                .map(|meta| index_of(&meta.pubkey, "account"))
                .collect::<Result<Vec<_>, _>>()?;

            instructions.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data: ix.data.clone(),
            });
        }

        Ok(CompiledMessage {
            account_keys,
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            recent_blockhash: *recent_blockhash,
            instructions,
        })
    }
}

// ---------------------------------------------------------------------------
// Compiled message
// ---------------------------------------------------------------------------

/// An instruction whose account references are indices into the message's
/// `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// A transaction message bound to a fee payer and blockhash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMessage {
    pub account_keys: Vec<[u8; 32]>,
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
}

impl CompiledMessage {
    /// The fee payer, always the first account key.
    pub fn fee_payer(&self) -> Option<&[u8; 32]> {
        self.account_keys.first()
    }

    /// Serialize the message (the bytes that get signed).
    pub fn serialize(&self) -> Result<Vec<u8>, SolError> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.num_required_signatures);
        buf.push(self.num_readonly_signed);
        buf.push(self.num_readonly_unsigned);

        buf.extend_from_slice(&compact_len(self.account_keys.len(), "account keys")?);
        for key in &self.account_keys {
            buf.extend_from_slice(key);
        }

        buf.extend_from_slice(&self.recent_blockhash);

        buf.extend_from_slice(&compact_len(self.instructions.len(), "instructions")?);
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            buf.extend_from_slice(&compact_len(ix.account_indices.len(), "instruction accounts")?);
            buf.extend_from_slice(&ix.account_indices);
            buf.extend_from_slice(&compact_len(ix.data.len(), "instruction data bytes")?);
            buf.extend_from_slice(&ix.data);
        }

        Ok(buf)
    }

    /// Wire transaction with every signature slot zeroed, ready to be handed
    /// to a wallet for signing.
    pub fn to_unsigned_wire(&self) -> Result<Vec<u8>, SolError> {
        let message = self.serialize()?;
        let num_sigs = usize::from(self.num_required_signatures);

        let mut wire = Vec::with_capacity(3 + num_sigs * SIGNATURE_LEN + message.len());
        wire.extend_from_slice(&encode_compact_u16(u16::from(self.num_required_signatures)));
        wire.resize(wire.len() + num_sigs * SIGNATURE_LEN, 0);
        wire.extend_from_slice(&message);

        Ok(wire)
    }
}

// ---------------------------------------------------------------------------
// Wire transaction signing
// ---------------------------------------------------------------------------

/// Sign a wire-format transaction with an Ed25519 secret key.
///
/// Locates the signer slot whose account key matches the key's public half,
/// signs the message and writes the signature into that slot. Every other
/// byte is preserved. Fails if the key is not one of the required signers.
pub fn sign_wire_transaction(
    private_key: &[u8; 32],
    raw_tx: &[u8],
) -> Result<Vec<u8>, SolError> {
    let mut seed = *private_key;
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
    seed.zeroize();
    let our_pubkey = signing_key.verifying_key().to_bytes();

    let (num_sigs, sigs_start) = decode_compact_u16(raw_tx)?;
    if num_sigs == 0 {
        return Err(SolError::TransactionBuildError(
            "transaction has zero signatures".into(),
        ));
    }

    let sigs_end = sigs_start + usize::from(num_sigs) * SIGNATURE_LEN;
    if sigs_end > raw_tx.len() {
        return Err(SolError::SerializationError(
            "transaction too short: signature slots exceed length".into(),
        ));
    }

    let message = &raw_tx[sigs_end..];
    if message.len() < 4 {
        return Err(SolError::SerializationError(
            "transaction message too short".into(),
        ));
    }

    let num_required_sigs = usize::from(message[0]);
    let (num_accounts, accounts_compact_len) = decode_compact_u16(&message[3..])?;
    let accounts_start = 3 + accounts_compact_len;
    let accounts_end = accounts_start + usize::from(num_accounts) * 32;
    if accounts_end > message.len() {
        return Err(SolError::SerializationError(
            "transaction message too short for account keys".into(),
        ));
    }

    let signer_idx = message[accounts_start..accounts_end]
        .chunks_exact(32)
        .take(num_required_sigs.min(usize::from(num_sigs)))
        .position(|key| key == our_pubkey)
        .ok_or_else(|| {
            SolError::SigningError("wallet pubkey not found in transaction signers".into())
        })?;

    let signature = signing_key.sign(message);

    let mut signed = raw_tx.to_vec();
    let offset = sigs_start + signer_idx * SIGNATURE_LEN;
    signed[offset..offset + SIGNATURE_LEN].copy_from_slice(&signature.to_bytes());

    Ok(signed)
}
