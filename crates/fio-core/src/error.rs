//! Error types for the FIO cryptographic core.
//!
//! This module provides a closed error enumeration [`enum@Error`] covering
//! every failure mode of the core primitives: key decoding, deterministic
//! signing, signature parsing, and content encryption.
//!
//! # Error Categories
//!
//! - **Encoding errors**: checksum mismatches, wrong byte lengths, and
//!   malformed base58/signature strings
//! - **Cryptographic errors**: invalid curve points and failed public-key
//!   recovery
//! - **Cipher errors**: authentication-tag failures and content-schema
//!   mismatches on decrypt
//!
//! Primitive-level errors are always surfaced to the immediate caller;
//! nothing here is silently defaulted.
//!
//! # Example
//!
//! ```
//! use fio_core::Error;
//!
//! let err = Error::InvalidChecksum;
//! assert_eq!(err.to_string(), "invalid checksum");
//! ```

use core::result::Result as CoreResult;

use thiserror::Error;

/// The main error type for the FIO cryptographic core.
///
/// Callers pattern-match on these variants rather than inspecting error
/// message strings; the set is closed by design.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Parameter Errors
    // =========================================================================
    /// A required argument was absent or empty.
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    // =========================================================================
    // Encoding Errors
    // =========================================================================
    /// A decoded string's trailing checksum did not match the payload.
    #[error("invalid checksum")]
    InvalidChecksum,

    /// A decoded key had the wrong byte length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// The byte length the decoder required.
        expected: usize,
        /// The byte length actually decoded.
        actual: usize,
    },

    /// An encoded signature string or binary signature was malformed.
    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    // =========================================================================
    // Cryptographic Errors
    // =========================================================================
    /// Key bytes did not decode to a valid curve point.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// No recovery id in `0..=3` reproduced the signer's public key.
    ///
    /// For a signature produced by this crate's signer this is an internal
    /// consistency violation, never a user error.
    #[error("unable to find valid public key recovery factor")]
    UnrecoverablePublicKey,

    // =========================================================================
    // Content Cipher Errors
    // =========================================================================
    /// The integrity check failed while decrypting a content envelope.
    #[error("content authentication failed")]
    AuthenticationFailure,

    /// Decrypted bytes did not parse per the declared content type.
    #[error("content does not match schema: {0}")]
    SchemaMismatch(String),

    /// The content-type tag is not one of the supported schemas.
    #[error("unknown content type: {0}")]
    UnknownContentType(String),
}

impl Error {
    /// A stable machine-readable name for the error kind.
    ///
    /// Used by batch-signing consumers that report failures as
    /// `{name, message}` objects.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Error::MissingParameter(_) => "MissingParameter",
            Error::InvalidChecksum => "InvalidChecksum",
            Error::InvalidKeyLength { .. } => "InvalidKeyLength",
            Error::InvalidSignatureFormat(_) => "InvalidSignatureFormat",
            Error::InvalidPublicKey(_) => "InvalidPublicKey",
            Error::UnrecoverablePublicKey => "UnrecoverablePublicKey",
            Error::AuthenticationFailure => "AuthenticationFailure",
            Error::SchemaMismatch(_) => "SchemaMismatch",
            Error::UnknownContentType(_) => "UnknownContentType",
        }
    }
}

/// A specialized [`Result`] type for FIO core operations.
pub type Result<T> = CoreResult<T, Error>;
