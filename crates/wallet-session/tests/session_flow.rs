//! End-to-end session behavior against scripted wallets and RPCs.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chain_sol::{decode_compact_u16, NativeTransaction, Pubkey};
use common::*;
use serde_json::json;
use wallet_session::{
    Chain, LocalWalletTransport, SignPayload, SimulatedEvmConnector, WalletError, WalletSession,
    WalletState, WalletType,
};

const SYSTEM_ADDRESS: &str = "11111111111111111111111111111111";

fn is_lower_hex(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

// ─── connect ───────────────────────────────────────────────────────

#[tokio::test]
async fn solana_connect_formats_balance() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(2_500_000_000));
    let session = session(&wallet, &rpc);

    session.connect(Chain::Solana).await.unwrap();

    let state = session.state();
    assert_eq!(
        state,
        WalletState {
            connected: true,
            address: Some(SYSTEM_ADDRESS.into()),
            chain: Chain::Solana,
            wallet_type: WalletType::Solana,
            balance: Some("2.5000 SOL".into()),
            loading: false,
        }
    );
    assert_eq!(state.short_address().as_deref(), Some("111111...1111"));
}

#[tokio::test]
async fn balance_failure_does_not_fail_connect() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::failing_balance());
    let session = session(&wallet, &rpc);

    session.connect(Chain::Solana).await.unwrap();

    let state = session.state();
    assert!(state.connected);
    assert_eq!(state.balance.as_deref(), Some("0 SOL"));
}

#[tokio::test(start_paused = true)]
async fn ethereum_connect_uses_simulated_wallet() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(0));
    let session = session(&wallet, &rpc);

    session.connect(Chain::Ethereum).await.unwrap();

    let state = session.state();
    let address = state.address.unwrap();
    assert!(state.connected);
    assert_eq!(state.wallet_type, WalletType::Evm);
    assert_eq!(state.chain, Chain::Ethereum);
    assert_eq!(state.balance.as_deref(), Some("0.15 ETH"));
    assert_eq!(address.len(), 42);
    assert!(address.starts_with("0x"));
    assert!(is_lower_hex(&address[2..]));
    assert_eq!(wallet.authorize_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_connect_keeps_previous_state() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    wallet.fail_authorize.store(true, Ordering::SeqCst);
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);

    let err = session.connect(Chain::Solana).await.unwrap_err();
    assert!(matches!(err, WalletError::Declined(_)));
    assert_eq!(session.state(), WalletState::default());
}

#[tokio::test]
async fn loading_is_published_while_wallet_is_asked() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    wallet.observer.watch(&session);

    session.connect(Chain::Solana).await.unwrap();

    let seen = wallet.observer.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].loading);
    assert!(!seen[0].connected);
    assert!(!session.state().loading);
}

#[tokio::test]
async fn wallet_without_accounts_is_an_error() {
    let wallet = Arc::new(ScriptedWallet::with_accounts(Vec::new()));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);

    let err = session.connect(Chain::Solana).await.unwrap_err();
    assert!(matches!(err, WalletError::NoAccounts));
    assert_eq!(session.state(), WalletState::default());
}

#[tokio::test]
async fn malformed_account_is_rejected() {
    let wallet = Arc::new(ScriptedWallet::with_accounts(vec![vec![1, 2, 3]]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);

    let err = session.connect(Chain::Solana).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidAccount(_)));
    assert!(!session.state().connected);
}

#[tokio::test(start_paused = true)]
async fn concurrent_connects_are_serialized() {
    let mut wallet = ScriptedWallet::with_account([0u8; 32]);
    wallet.authorize_delay = Duration::from_secs(2);
    let wallet = Arc::new(wallet);
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = Arc::new(session(&wallet, &rpc));

    let start = tokio::time::Instant::now();
    let (first, second) = tokio::join!(
        session.connect(Chain::Solana),
        session.connect(Chain::Solana)
    );

    first.unwrap();
    second.unwrap();
    assert_eq!(wallet.authorize_calls.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() >= Duration::from_secs(4));
    assert!(session.state().connected);
}

#[tokio::test]
async fn failed_connect_keeps_existing_connection() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(2_500_000_000));
    let evm = Arc::new(ScriptedEvm::default());
    evm.fail_connect.store(true, Ordering::SeqCst);
    let session = session_with_evm(&wallet, &rpc, &evm);

    session.connect(Chain::Solana).await.unwrap();
    let before = session.state();
    let err = session.connect(Chain::Ethereum).await.unwrap_err();

    assert!(matches!(err, WalletError::Transport(_)));
    assert_eq!(session.state(), before);
    assert!(session.sign_message("still here").await.is_some());
}

#[tokio::test]
async fn reconnect_runs_a_full_connect() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1_000_000_000));
    let evm = Arc::new(ScriptedEvm::default());
    let session = session_with_evm(&wallet, &rpc, &evm);

    session.connect(Chain::Solana).await.unwrap();
    rpc.set_balance(3_000_000_000);
    session.connect(Chain::Solana).await.unwrap();
    assert_eq!(wallet.authorize_calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.state().balance.as_deref(), Some("3.0000 SOL"));

    session.connect(Chain::Ethereum).await.unwrap();
    session.connect(Chain::Polygon).await.unwrap();
    let state = session.state();
    assert_eq!(evm.connect_calls.load(Ordering::SeqCst), 2);
    assert_eq!(state.chain, Chain::Polygon);
    assert_eq!(state.balance.as_deref(), Some("0.15 MATIC"));
}

#[tokio::test]
async fn subscribers_see_connect_and_disconnect() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    let mut rx = session.subscribe();

    session.connect(Chain::Solana).await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().connected);

    session.disconnect().await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), WalletState::default());
}

// ─── disconnect ────────────────────────────────────────────────────

#[tokio::test]
async fn disconnect_restores_default_and_is_idempotent() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);

    session.disconnect().await;
    assert_eq!(session.state(), WalletState::default());

    session.connect(Chain::Solana).await.unwrap();
    session.disconnect().await;
    assert_eq!(session.state(), WalletState::default());
    session.disconnect().await;
    assert_eq!(session.state(), WalletState::default());
}

// ─── switch_chain ──────────────────────────────────────────────────

#[tokio::test]
async fn switch_when_disconnected_does_nothing() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let evm = Arc::new(ScriptedEvm::default());
    let session = session_with_evm(&wallet, &rpc, &evm);

    session.switch_chain(Chain::Polygon).await.unwrap();

    assert_eq!(session.state(), WalletState::default());
    assert_eq!(evm.connect_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn switch_across_families_disconnects_first() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let evm = Arc::new(ScriptedEvm::default());
    let session = session_with_evm(&wallet, &rpc, &evm);

    session.connect(Chain::Solana).await.unwrap();
    evm.observer.watch(&session);
    session.switch_chain(Chain::Ethereum).await.unwrap();

    let during = evm.observer.seen();
    assert_eq!(during.len(), 1);
    assert!(!during[0].connected);
    assert_eq!(during[0].address, None);
    assert_eq!(during[0].wallet_type, WalletType::None);
    assert!(during[0].loading);

    let state = session.state();
    assert_eq!(state.wallet_type, WalletType::Evm);
    assert_eq!(state.chain, Chain::Ethereum);
    assert_ne!(state.address.as_deref(), Some(SYSTEM_ADDRESS));
}

#[tokio::test]
async fn switch_back_to_solana_reauthorizes() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let evm = Arc::new(ScriptedEvm::default());
    let session = session_with_evm(&wallet, &rpc, &evm);

    session.connect(Chain::Arbitrum).await.unwrap();
    wallet.observer.watch(&session);
    session.switch_chain(Chain::Solana).await.unwrap();

    let during = wallet.observer.seen();
    assert_eq!(during.len(), 1);
    assert!(!during[0].connected);
    assert_eq!(session.state().address.as_deref(), Some(SYSTEM_ADDRESS));
    assert_eq!(wallet.authorize_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn switch_within_evm_keeps_the_account() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let evm = Arc::new(ScriptedEvm::default());
    let session = session_with_evm(&wallet, &rpc, &evm);

    session.connect(Chain::Ethereum).await.unwrap();
    let before = session.state();
    session.switch_chain(Chain::Polygon).await.unwrap();
    let after = session.state();

    assert_eq!(after.chain, Chain::Polygon);
    assert_eq!(after.address, before.address);
    assert_eq!(after.wallet_type, WalletType::Evm);
    assert_eq!(evm.connect_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn switch_to_same_solana_family_is_a_no_op() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);

    session.connect(Chain::Solana).await.unwrap();
    let before = session.state();
    session.switch_chain(Chain::Solana).await.unwrap();

    assert_eq!(session.state(), before);
    assert_eq!(wallet.authorize_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_switch_leaves_session_disconnected() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let evm = Arc::new(ScriptedEvm::default());
    evm.fail_connect.store(true, Ordering::SeqCst);
    let session = session_with_evm(&wallet, &rpc, &evm);

    session.connect(Chain::Solana).await.unwrap();
    let err = session.switch_chain(Chain::Ethereum).await.unwrap_err();

    assert!(matches!(err, WalletError::Transport(_)));
    assert_eq!(session.state(), WalletState::default());
}

// ─── signing ───────────────────────────────────────────────────────

#[tokio::test]
async fn signing_while_disconnected_returns_none() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);

    assert_eq!(session.sign_message("hello").await, None);
    assert_eq!(session.sign_transaction(json!({ "type": "transfer" })).await, None);
    let tx = NativeTransaction::transfer(&[7u8; 32], &[2u8; 32], 10).unwrap();
    assert_eq!(session.sign_transaction(tx).await, None);

    assert_eq!(wallet.sign_message_calls.load(Ordering::SeqCst), 0);
    assert_eq!(wallet.sign_transaction_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn solana_message_signature_is_base58() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();

    let signature = session.sign_message("hello").await.unwrap();

    assert_eq!(signature, bs58::encode(MESSAGE_SIGNATURE).into_string());
    assert_eq!(wallet.signed_payloads.lock().unwrap()[0], b"hello".to_vec());
}

#[tokio::test]
async fn reauthorize_token_is_carried_forward() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();

    session.sign_message("one").await.unwrap();
    session.sign_message("two").await.unwrap();

    assert_eq!(
        *wallet.reauthorized_with.lock().unwrap(),
        vec!["token-1".to_string(), "token-2".to_string()]
    );
}

#[tokio::test]
async fn wallet_rejection_yields_none() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    wallet.fail_signing.store(true, Ordering::SeqCst);
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();

    assert_eq!(session.sign_message("hello").await, None);
    assert!(session.state().connected);
}

#[tokio::test]
async fn json_payload_on_solana_is_signed_as_message() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();

    let intent = json!({ "type": "transfer", "recipient": "abc", "amount": "1" });
    let signature = session.sign_transaction(intent.clone()).await.unwrap();

    assert_eq!(signature, bs58::encode(MESSAGE_SIGNATURE).into_string());
    assert_eq!(wallet.sign_transaction_calls.load(Ordering::SeqCst), 0);
    assert!(rpc.sent().is_empty());
    let signed = wallet.signed_payloads.lock().unwrap()[0].clone();
    assert_eq!(signed, serde_json::to_vec(&intent).unwrap());
}

#[tokio::test]
async fn native_transaction_is_compiled_signed_and_broadcast() {
    let payer = [7u8; 32];
    let wallet = Arc::new(ScriptedWallet::with_account(payer));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();

    let tx = NativeTransaction::transfer(&payer, &[2u8; 32], 1_000).unwrap();
    let signature = session.sign_transaction(SignPayload::Native(tx)).await;

    assert_eq!(signature.as_deref(), Some(BROADCAST_SIGNATURE));
    let sent = rpc.sent();
    assert_eq!(sent.len(), 1);

    let wire = &sent[0];
    let (num_sigs, offset) = decode_compact_u16(wire).unwrap();
    assert_eq!(num_sigs, 1);
    assert_eq!(&wire[offset..offset + 64], &[0xAB; 64][..]);

    // signatures | header (3) | key count (1) | keys (3 * 32) | blockhash
    let keys_start = offset + 64 + 3 + 1;
    assert_eq!(&wire[keys_start..keys_start + 32], &payer[..]);
    let blockhash_start = keys_start + 3 * 32;
    assert_eq!(&wire[blockhash_start..blockhash_start + 32], &BLOCKHASH[..]);
}

#[tokio::test]
async fn blockhash_failure_yields_none_without_broadcast() {
    let payer = [7u8; 32];
    let wallet = Arc::new(ScriptedWallet::with_account(payer));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();
    let before = session.state();
    rpc.blockhash_fails.store(true, Ordering::SeqCst);

    let tx = NativeTransaction::transfer(&payer, &[2u8; 32], 1_000).unwrap();
    assert_eq!(session.sign_transaction(tx).await, None);

    assert_eq!(session.state(), before);
    assert_eq!(wallet.sign_transaction_calls.load(Ordering::SeqCst), 0);
    assert!(rpc.sent().is_empty());
}

#[tokio::test]
async fn broadcast_failure_yields_none_and_stays_connected() {
    let payer = [7u8; 32];
    let wallet = Arc::new(ScriptedWallet::with_account(payer));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();
    let before = session.state();
    rpc.send_fails.store(true, Ordering::SeqCst);

    let tx = NativeTransaction::transfer(&payer, &[2u8; 32], 1_000).unwrap();
    assert_eq!(session.sign_transaction(tx).await, None);

    assert_eq!(session.state(), before);
    assert_eq!(wallet.sign_transaction_calls.load(Ordering::SeqCst), 1);
    assert!(rpc.sent().is_empty());

    rpc.send_fails.store(false, Ordering::SeqCst);
    let tx = NativeTransaction::transfer(&payer, &[2u8; 32], 1_000).unwrap();
    assert_eq!(
        session.sign_transaction(tx).await.as_deref(),
        Some(BROADCAST_SIGNATURE)
    );
}

#[tokio::test]
async fn reauthorize_without_accounts_still_signs() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();

    *wallet.reauthorize_accounts.lock().unwrap() = Some(Vec::new());
    assert!(session.sign_message("hello").await.is_some());

    *wallet.reauthorize_accounts.lock().unwrap() = Some(vec![vec![9u8; 32]]);
    assert_eq!(session.sign_message("hello").await, None);
    assert_eq!(wallet.sign_message_calls.load(Ordering::SeqCst), 1);
    assert!(session.state().connected);
}

#[tokio::test(start_paused = true)]
async fn evm_signatures_are_hex() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Polygon).await.unwrap();

    let signature = session.sign_message("hello").await.unwrap();
    assert_eq!(signature.len(), 132);
    assert!(signature.starts_with("0x"));
    assert!(is_lower_hex(&signature[2..]));

    let tx = NativeTransaction::transfer(&[7u8; 32], &[2u8; 32], 10).unwrap();
    let from_native = session.sign_transaction(tx).await.unwrap();
    assert_eq!(from_native.len(), 132);
    assert_eq!(wallet.sign_message_calls.load(Ordering::SeqCst), 0);
}

// ─── refresh_balance ───────────────────────────────────────────────

#[tokio::test]
async fn refresh_balance_refetches_for_solana() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1_000_000_000));
    let session = session(&wallet, &rpc);
    session.connect(Chain::Solana).await.unwrap();
    assert_eq!(session.state().balance.as_deref(), Some("1.0000 SOL"));

    rpc.set_balance(250_000_000);
    session.refresh_balance().await;

    let state = session.state();
    assert_eq!(state.balance.as_deref(), Some("0.2500 SOL"));
    assert!(!state.loading);
}

#[tokio::test]
async fn refresh_balance_ignores_evm_and_disconnected() {
    let wallet = Arc::new(ScriptedWallet::with_account([0u8; 32]));
    let rpc = Arc::new(ScriptedRpc::with_balance(1));
    let evm = Arc::new(ScriptedEvm::default());
    let session = session_with_evm(&wallet, &rpc, &evm);

    session.refresh_balance().await;
    assert_eq!(session.state(), WalletState::default());

    session.connect(Chain::Ethereum).await.unwrap();
    let before = session.state();
    session.refresh_balance().await;
    assert_eq!(session.state(), before);
}

// ─── local wallet ──────────────────────────────────────────────────

#[tokio::test]
async fn local_wallet_signs_broadcast_transactions() {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let local = Arc::new(LocalWalletTransport::generate());
    let pubkey: Pubkey = local.pubkey();
    let rpc = Arc::new(ScriptedRpc::with_balance(42));
    let session = WalletSession::builder(local.clone(), rpc.clone())
        .evm_connector(Arc::new(SimulatedEvmConnector::default()))
        .build();

    session.connect(Chain::Solana).await.unwrap();
    assert_eq!(session.state().address, Some(pubkey.to_address()));

    let tx = NativeTransaction::transfer(pubkey.as_bytes(), &[9u8; 32], 5_000).unwrap();
    session.sign_transaction(tx).await.unwrap();

    let wire = rpc.sent().remove(0);
    let signature = Signature::from_slice(&wire[1..65]).unwrap();
    let key = VerifyingKey::from_bytes(pubkey.as_bytes()).unwrap();
    key.verify(&wire[65..], &signature).unwrap();
}
