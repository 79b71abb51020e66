//! Error types for the batch transaction signer.
//!
//! Wraps the core crypto errors and adds the orchestration-level failure
//! modes: unrecognized chains, transport failures, malformed chain
//! responses, and serializer-contract errors.
//!
//! Only [`Error::UnidentifiedChain`] aborts a whole batch; every other
//! error arising while one action item is processed becomes a `failed`
//! entry and the batch continues.

use core::result::Result as CoreResult;

use thiserror::Error;

/// The main error type for batch transaction signing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A core cryptographic operation failed.
    #[error(transparent)]
    Core(#[from] fio_core::Error),

    /// The chain id returned by the API is not a known FIO environment.
    ///
    /// This is the one whole-batch-fatal condition.
    #[error("cannot identify FIO chain: {0}")]
    UnidentifiedChain(String),

    /// An HTTP request to the chain API failed.
    #[error("chain API request failed: {0}")]
    Rpc(#[from] reqwest::Error),

    /// The chain API returned a response the signer cannot use.
    #[error("invalid chain response: {0}")]
    Chain(String),

    /// The external ABI serializer reported a failure.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// A stable machine-readable name for the error kind, used in batch
    /// failure entries.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Error::Core(inner) => inner.name(),
            Error::UnidentifiedChain(_) => "UnidentifiedChain",
            Error::Rpc(_) => "Rpc",
            Error::Chain(_) => "Chain",
            Error::Serialization(_) => "Serialization",
        }
    }
}

/// A specialized [`Result`] type for batch signing operations.
pub type Result<T> = CoreResult<T, Error>;
