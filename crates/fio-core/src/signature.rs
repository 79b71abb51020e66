//! Canonical ECDSA signature type and its wire encodings.
//!
//! A signature carries `(r, s, recovery_id)` where both scalars are
//! non-zero, `s` is in low-S form, and the recovery id selects which of
//! the four candidate public keys a verifier should reconstruct.
//!
//! # Wire Format
//!
//! The textual form is `SIG_K1_<base58check(payload, tag "K1")>` where the
//! 65-byte payload is:
//!
//! ```text
//! recovery_byte (1) || r (32, big-endian) || s (32, big-endian)
//! ```
//!
//! with `recovery_byte = recovery_id + 4 + 27` — the fixed offsets marking
//! a compact signature over a compressed public key. A 130-character hex
//! string or the raw 65 bytes are accepted as alternate input forms,
//! selected explicitly through [`SignatureInput`] rather than sniffed from
//! the value's shape.

use std::fmt;
use std::str::FromStr;

use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, Scalar};

use crate::error::{Error, Result};
use crate::keys::{check_decode, check_encode};

/// Signature type tag for secp256k1 compact signatures.
const CURVE_TAG: &str = "K1";

/// Textual prefix of an encoded signature string.
const SIG_PREFIX: &str = "SIG_";

/// Fixed offset marking a compressed public key.
const COMPRESSED_OFFSET: u8 = 4;

/// Fixed offset marking a compact (recoverable) signature.
const COMPACT_OFFSET: u8 = 27;

/// Length of the binary signature payload.
const COMPACT_LEN: usize = 65;

/// A canonical secp256k1 ECDSA signature with its recovery id.
///
/// Invariants: `0 < r < n`, `0 < s <= n/2`, `recovery_id` in `0..=3`.
/// Values are canonicalized at creation; a high-S signature cannot be
/// constructed through this type's public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    r: Scalar,
    s: Scalar,
    recovery_id: u8,
}

impl Signature {
    /// Assembles a signature from its parts.
    ///
    /// Intended for the signer and the compact decoders; range checks on
    /// the scalars happen at those boundaries.
    pub(crate) fn from_parts(r: Scalar, s: Scalar, recovery_id: u8) -> Self {
        debug_assert!(recovery_id <= 3);
        Self { r, s, recovery_id }
    }

    /// The `r` scalar.
    #[must_use]
    pub fn r(&self) -> &Scalar {
        &self.r
    }

    /// The `s` scalar.
    #[must_use]
    pub fn s(&self) -> &Scalar {
        &self.s
    }

    /// The recovery id in `0..=3`.
    #[must_use]
    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }

    /// Parses a signature from one of the supported input forms.
    ///
    /// The variant is chosen by the caller at the API boundary; no shape
    /// sniffing happens here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignatureFormat`] for any malformed input.
    pub fn parse(input: SignatureInput<'_>) -> Result<Self> {
        match input {
            SignatureInput::Encoded(text) => text.parse(),
            SignatureInput::Hex(text) => {
                let bytes = hex::decode(text).map_err(|e| {
                    Error::InvalidSignatureFormat(format!("invalid hex: {e}"))
                })?;
                Self::from_compact(&bytes)
            }
            SignatureInput::Bytes(bytes) => Self::from_compact(bytes),
        }
    }

    /// Decodes the 65-byte compact form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignatureFormat`] on a wrong length, an
    /// out-of-range recovery byte, or scalars outside `[1, n-1]`.
    pub fn from_compact(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPACT_LEN {
            return Err(Error::InvalidSignatureFormat(format!(
                "expected {COMPACT_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let header = bytes[0];
        if header < COMPACT_OFFSET || (header - COMPACT_OFFSET) & 7 != header - COMPACT_OFFSET {
            return Err(Error::InvalidSignatureFormat(format!(
                "invalid recovery byte {header:#04x}"
            )));
        }
        let recovery_id = (header - COMPACT_OFFSET) & 3;

        let r = scalar_from_slice(&bytes[1..33])?;
        let s = scalar_from_slice(&bytes[33..65])?;
        Ok(Self { r, s, recovery_id })
    }

    /// The 65-byte compact encoding.
    #[must_use]
    pub fn to_compact(&self) -> [u8; COMPACT_LEN] {
        let mut buf = [0u8; COMPACT_LEN];
        buf[0] = self.recovery_id + COMPRESSED_OFFSET + COMPACT_OFFSET;
        buf[1..33].copy_from_slice(&self.r.to_bytes());
        buf[33..65].copy_from_slice(&self.s.to_bytes());
        buf
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SIG_PREFIX}{CURVE_TAG}_{}",
            check_encode(&self.to_compact(), Some(CURVE_TAG))
        )
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let rest = text.strip_prefix(SIG_PREFIX).ok_or_else(|| {
            Error::InvalidSignatureFormat(
                "expecting signature like: SIG_K1_base58signature..".to_string(),
            )
        })?;
        let (tag, body) = rest.split_once('_').ok_or_else(|| {
            Error::InvalidSignatureFormat(
                "expecting signature like: SIG_K1_base58signature..".to_string(),
            )
        })?;
        if tag != CURVE_TAG {
            return Err(Error::InvalidSignatureFormat(format!(
                "expected {CURVE_TAG} signature, got {tag}"
            )));
        }
        let payload = check_decode(body, Some(CURVE_TAG))?;
        Self::from_compact(&payload)
    }
}

/// The supported signature input forms, decided once at the API boundary.
#[derive(Debug, Clone, Copy)]
pub enum SignatureInput<'a> {
    /// A `SIG_K1_...` encoded string.
    Encoded(&'a str),
    /// A 130-character hex string of the compact form.
    Hex(&'a str),
    /// The raw 65-byte compact form.
    Bytes(&'a [u8]),
}

fn scalar_from_slice(bytes: &[u8]) -> Result<Scalar> {
    let mut repr = FieldBytes::default();
    repr.copy_from_slice(bytes);
    Option::<Scalar>::from(Scalar::from_repr(repr))
        .filter(|v| v != &Scalar::ZERO)
        .ok_or_else(|| Error::InvalidSignatureFormat("scalar out of range [1, n-1]".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Produced by the deterministic signer for wallet-one's key over the
    // SHA-256 of a fixed nonce string; see tests/fio_vectors.rs.
    const SIG_1: &str = "SIG_K1_K6vBtDrxRZGL4ynBRdZoR3ZDAv2PqUEgyXUMZuY3LBn6cZbxDPLjree6mG8Mh6qoeUWrNKT8DnQPF9aixeA85JKrRX9ifu";

    #[test]
    fn encoded_roundtrip() {
        let sig: Signature = SIG_1.parse().unwrap();
        assert_eq!(sig.to_string(), SIG_1);
        assert!(sig.recovery_id() <= 3);
    }

    #[test]
    fn compact_roundtrip() {
        let sig: Signature = SIG_1.parse().unwrap();
        let compact = sig.to_compact();
        let decoded = Signature::from_compact(&compact).unwrap();
        assert_eq!(decoded, sig);
    }

    #[test]
    fn hex_input_form() {
        let sig: Signature = SIG_1.parse().unwrap();
        let hex_form = hex::encode(sig.to_compact());
        assert_eq!(hex_form.len(), 130);
        let parsed = Signature::parse(SignatureInput::Hex(&hex_form)).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn rejects_wrong_curve_tag() {
        let swapped = SIG_1.replace("SIG_K1_", "SIG_R1_");
        let err = swapped.parse::<Signature>().unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = "K1_garbage".parse::<Signature>().unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
    }

    #[test]
    fn rejects_corrupted_body() {
        let mut text = SIG_1.to_string();
        text.pop();
        text.push('1');
        assert!(text.parse::<Signature>().is_err());
    }

    #[test]
    fn rejects_wrong_length() {
        let err = Signature::from_compact(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
    }

    #[test]
    fn rejects_bad_recovery_byte() {
        let sig: Signature = SIG_1.parse().unwrap();
        let mut compact = sig.to_compact();
        compact[0] = 0x10; // below the compact offset
        assert!(Signature::from_compact(&compact).is_err());
    }
}
