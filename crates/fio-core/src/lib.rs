//! FIO Cryptographic Core Library
//!
//! This crate provides the pure cryptographic core of a FIO protocol
//! signer: key handling, deterministic ECDSA, and memo-content
//! encryption — everything below the network layer.
//!
//! # Overview
//!
//! - **Key encoding**: base58check encodings with the two on-wire
//!   checksum conventions (RIPEMD-160 for public keys and signatures,
//!   double-SHA-256 for WIF private keys)
//! - **Key derivation**: `FIO...` public-key strings from private scalars
//! - **Deterministic signing**: RFC 6979 nonces, low-S canonical
//!   signatures, recovery-id computation, and `SIG_K1_...` encoding
//! - **Content encryption**: ECDH shared secrets driving an
//!   AES-256-CBC + HMAC-SHA-256 envelope around schema-serialized memo
//!   payloads
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Public API                          │
//! ├──────────────┬──────────────┬──────────────┬─────────────┤
//! │    keys      │    ecdsa     │  signature   │   cipher    │
//! │  encode /    │  RFC 6979    │  SIG_K1      │  ECDH +     │
//! │  derive      │  sign/verify │  encoding    │  AES-CBC    │
//! ├──────────────┴──────────────┴──────────────┼─────────────┤
//! │          secp256k1 arithmetic (k256)       │   content   │
//! │     shared immutable curve constants       │   schemas   │
//! └────────────────────────────────────────────┴─────────────┘
//! ```
//!
//! Everything here is synchronous, allocation-light, and free of shared
//! mutable state; the only process-wide values are the curve constants,
//! which are immutable and safe to read concurrently.
//!
//! # Quick Start
//!
//! ```
//! use fio_core::{ecdsa, PrivateKey};
//!
//! let key = PrivateKey::from_wif("5J4dcetRm56y1DLYLwCnrsaH8tCQ14u2wwzPZoTfUPx3FNzmPzG")?;
//! println!("public key: {}", key.public_key());
//!
//! let signature = ecdsa::sign_nonce("6d2242964fbf8a611c26b5cdabec56ff", &key)?;
//! assert!(signature.starts_with("SIG_K1_"));
//! # Ok::<(), fio_core::Error>(())
//! ```
//!
//! # Security Considerations
//!
//! - Signing nonces are derived per RFC 6979; no RNG failure can repeat
//!   a nonce across messages
//! - Signatures are always canonical (low-S) at creation
//! - Content envelopes are encrypt-then-MAC; the tag is verified before
//!   any decryption

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cipher;
pub mod content;
pub mod ecdsa;
pub mod error;
pub mod keys;
pub mod signature;

pub use cipher::{decrypt_content, encrypt_content, shared_secret};
pub use content::{ContentPayload, ContentType};
pub use error::{Error, Result};
pub use keys::{check_decode, check_decode_wif, check_encode, PrivateKey, PublicKey};
pub use signature::{Signature, SignatureInput};
