use thiserror::Error;

/// Solana chain operation errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("invalid rpc url: {0}")]
    InvalidRpcUrl(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected rpc response: {0}")]
    UnexpectedResponse(String),
}
