use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chain_sol::NativeTransaction;
use serde_json::{json, Value};

/// Something to pass to [`WalletSession::sign_transaction`](crate::WalletSession::sign_transaction).
#[derive(Debug, Clone, PartialEq)]
pub enum SignPayload {
    /// A Solana transaction. Broadcast after signing on a Solana session.
    Native(NativeTransaction),
    /// Any other structured payload, such as a transfer or swap intent.
    /// Signed as a message over its compact JSON form.
    Intent(Value),
}

impl SignPayload {
    /// Compact JSON text that is signed when the payload is not broadcast.
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        match self {
            SignPayload::Intent(value) => serde_json::to_string(value),
            SignPayload::Native(tx) => serde_json::to_string(&native_json(tx)),
        }
    }
}

impl From<NativeTransaction> for SignPayload {
    fn from(tx: NativeTransaction) -> Self {
        SignPayload::Native(tx)
    }
}

impl From<Value> for SignPayload {
    fn from(value: Value) -> Self {
        SignPayload::Intent(value)
    }
}

fn native_json(tx: &NativeTransaction) -> Value {
    let instructions: Vec<Value> = tx
        .instructions()
        .iter()
        .map(|ix| {
            let keys: Vec<Value> = ix
                .accounts
                .iter()
                .map(|meta| {
                    json!({
                        "pubkey": bs58::encode(meta.pubkey).into_string(),
                        "isSigner": meta.is_signer,
                        "isWritable": meta.is_writable,
                    })
                })
                .collect();
            json!({
                "programId": bs58::encode(ix.program_id).into_string(),
                "keys": keys,
                "data": BASE64.encode(&ix.data),
            })
        })
        .collect();
    json!({ "instructions": instructions })
}
