use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet transport failed: {0}")]
    Transport(String),

    #[error("Authorization declined: {0}")]
    Declined(String),

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Solana: {0}")]
    Solana(#[from] chain_sol::SolError),

    #[error("EVM: {0}")]
    Evm(#[from] chain_eth::EthError),

    #[error(transparent)]
    Api(#[from] obscura_api::ApiError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
