//! Client for the Obscura backend, which builds private transfers and swaps.
//!
//! Intents, stealth addresses and commitments are produced server-side and
//! are opaque here. This crate only moves them over HTTP with typed bodies.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ObscuraClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use types::{
    HealthResponse, HealthServices, IntentResponse, PrivacyLevel, QuoteRequest, QuotesResponse,
    SourceChain, SwapRequest, TransferRequest,
};
