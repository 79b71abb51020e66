//! FIO key encoding, decoding, and derivation on secp256k1.
//!
//! This module covers the two checksum conventions used on the wire:
//!
//! 1. **Generic check-encoding** for public keys and signatures: a 4-byte
//!    checksum is the leading bytes of `RIPEMD-160(payload || type_tag)`,
//!    appended to the payload before base58 encoding.
//! 2. **WIF decoding** for private-key strings: the 4-byte checksum is the
//!    leading bytes of `SHA-256(SHA-256(payload))`, and the decoded payload
//!    carries a `0x80` version byte ahead of the 32-byte scalar.
//!
//! Public keys render as `FIO<base58check(compressed SEC1 point)>`.
//!
//! # Example
//!
//! ```
//! use fio_core::PrivateKey;
//!
//! let key = PrivateKey::from_wif("5J4dcetRm56y1DLYLwCnrsaH8tCQ14u2wwzPZoTfUPx3FNzmPzG").unwrap();
//! let public = key.public_key();
//! assert!(public.to_encoded().starts_with("FIO"));
//! ```

use std::fmt;

use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// The chain-name prefix carried by encoded public keys.
pub const FIO_CHAIN_PREFIX: &str = "FIO";

/// WIF version byte for private-key strings.
const WIF_VERSION_BYTE: u8 = 0x80;

/// Length of the appended checksum in bytes.
const CHECKSUM_LEN: usize = 4;

/// Length of a raw private scalar in bytes.
const SCALAR_LEN: usize = 32;

/// Encodes a payload as base58 with a RIPEMD-160 checksum.
///
/// The checksum is the first four bytes of `RIPEMD-160(payload || key_type)`,
/// where the optional `key_type` tag salts the checksum (the signature
/// encoding uses tag `"K1"`; plain public keys use no tag).
#[must_use]
pub fn check_encode(payload: &[u8], key_type: Option<&str>) -> String {
    let mut hasher = Ripemd160::new();
    hasher.update(payload);
    if let Some(tag) = key_type {
        hasher.update(tag.as_bytes());
    }
    let checksum = hasher.finalize();

    let mut buf = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    bs58::encode(buf).into_string()
}

/// Decodes a base58 string and validates its RIPEMD-160 checksum.
///
/// # Errors
///
/// Returns [`Error::InvalidChecksum`] if the string is not valid base58,
/// is too short to carry a checksum, or the recomputed checksum differs
/// from the trailing four bytes.
pub fn check_decode(text: &str, key_type: Option<&str>) -> Result<Vec<u8>> {
    let buf = bs58::decode(text)
        .into_vec()
        .map_err(|_| Error::InvalidChecksum)?;
    if buf.len() < CHECKSUM_LEN {
        return Err(Error::InvalidChecksum);
    }
    let (payload, checksum) = buf.split_at(buf.len() - CHECKSUM_LEN);

    let mut hasher = Ripemd160::new();
    hasher.update(payload);
    if let Some(tag) = key_type {
        hasher.update(tag.as_bytes());
    }
    let expected = hasher.finalize();

    if checksum != &expected[..CHECKSUM_LEN] {
        return Err(Error::InvalidChecksum);
    }
    Ok(payload.to_vec())
}

/// Decodes a WIF private-key string, validating its double-SHA-256 checksum.
///
/// The returned payload still carries the leading version byte; callers
/// strip it before scalar conversion.
///
/// # Errors
///
/// Returns [`Error::InvalidChecksum`] on base58 or checksum failure.
pub fn check_decode_wif(text: &str) -> Result<Vec<u8>> {
    let buf = bs58::decode(text)
        .into_vec()
        .map_err(|_| Error::InvalidChecksum)?;
    if buf.len() < CHECKSUM_LEN {
        return Err(Error::InvalidChecksum);
    }
    let (payload, checksum) = buf.split_at(buf.len() - CHECKSUM_LEN);

    let expected = Sha256::digest(Sha256::digest(payload));
    if checksum != &expected[..CHECKSUM_LEN] {
        return Err(Error::InvalidChecksum);
    }
    Ok(payload.to_vec())
}

/// A secp256k1 private key.
///
/// The wrapped scalar is guaranteed to lie in `[1, n-1]` where `n` is the
/// curve order. Construction is from a WIF string or raw scalar bytes;
/// the scalar itself is never displayed or serialized by this type.
#[derive(Clone)]
pub struct PrivateKey {
    scalar: Scalar,
}

impl PrivateKey {
    /// Parses a private key from its WIF string form.
    ///
    /// The decoded payload must be a `0x80` version byte followed by a
    /// 32-byte scalar, with an optional trailing `0x01` compression flag
    /// which is stripped before conversion.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingParameter`] if the string is empty
    /// - [`Error::InvalidChecksum`] on a checksum mismatch
    /// - [`Error::InvalidKeyLength`] if the payload is not exactly 32 bytes
    ///   after version and compression bytes are stripped
    /// - [`Error::InvalidPublicKey`] if the bytes are zero or exceed the
    ///   curve order
    pub fn from_wif(wif: &str) -> Result<Self> {
        if wif.is_empty() {
            return Err(Error::MissingParameter("private key"));
        }

        let payload = check_decode_wif(wif)?;
        let mut key = payload.as_slice();

        if key.first() == Some(&WIF_VERSION_BYTE) {
            key = &key[1..];
        }
        // Legacy WIF strings append 0x01 to mark a compressed public key.
        if key.len() == SCALAR_LEN + 1 && key.last() == Some(&0x01) {
            key = &key[..SCALAR_LEN];
        }
        if key.len() != SCALAR_LEN {
            return Err(Error::InvalidKeyLength {
                expected: SCALAR_LEN,
                actual: key.len(),
            });
        }

        let mut bytes = [0u8; SCALAR_LEN];
        bytes.copy_from_slice(key);
        Self::from_scalar_bytes(&bytes)
    }

    /// Builds a private key from raw big-endian scalar bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPublicKey`] if the value is zero or not less
    /// than the curve order.
    pub fn from_scalar_bytes(bytes: &[u8; SCALAR_LEN]) -> Result<Self> {
        let repr = FieldBytes::from(*bytes);
        let scalar = Option::<Scalar>::from(Scalar::from_repr(repr))
            .filter(|s| s != &Scalar::ZERO)
            .ok_or_else(|| {
                Error::InvalidPublicKey("private scalar out of range [1, n-1]".to_string())
            })?;
        Ok(Self { scalar })
    }

    /// The private scalar.
    #[must_use]
    pub fn scalar(&self) -> &Scalar {
        &self.scalar
    }

    /// Derives the corresponding public key: `Q = d * G`.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        let point = (ProjectivePoint::GENERATOR * self.scalar).to_affine();
        PublicKey { point }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.write_str("PrivateKey(..)")
    }
}

/// A secp256k1 public key.
///
/// Wraps an affine curve point; the point at infinity is unrepresentable
/// by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: AffinePoint,
}

impl PublicKey {
    /// Parses a public key from its check-encoded string form.
    ///
    /// The `FIO` chain prefix is optional on input; both
    /// `FIO5Js4SY...` and the bare base58 body are accepted, matching the
    /// forms seen on the wire.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingParameter`] if the string is empty
    /// - [`Error::InvalidChecksum`] on a checksum mismatch
    /// - [`Error::InvalidKeyLength`] if the payload is not a 33-byte
    ///   compressed point
    /// - [`Error::InvalidPublicKey`] if the bytes are not a curve point
    pub fn from_encoded(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(Error::MissingParameter("public key"));
        }
        let body = text.strip_prefix(FIO_CHAIN_PREFIX).unwrap_or(text);
        let payload = check_decode(body, None)?;
        Self::from_sec1_bytes(&payload)
    }

    /// Builds a public key from SEC1-encoded point bytes (compressed or
    /// uncompressed).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`] for a malformed encoding length
    /// and [`Error::InvalidPublicKey`] for bytes that are not on the curve
    /// or encode the identity.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| Error::InvalidKeyLength {
            expected: 33,
            actual: bytes.len(),
        })?;
        let point = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| Error::InvalidPublicKey("point is not on the curve".to_string()))?;
        if point == AffinePoint::IDENTITY {
            return Err(Error::InvalidPublicKey(
                "point at infinity is not a valid public key".to_string(),
            ));
        }
        Ok(Self { point })
    }

    /// The affine curve point.
    #[must_use]
    pub fn point(&self) -> &AffinePoint {
        &self.point
    }

    /// The compressed SEC1 encoding (33 bytes).
    #[must_use]
    pub fn to_compressed_bytes(&self) -> Vec<u8> {
        self.point.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Renders the chain-prefixed encoded string form.
    #[must_use]
    pub fn to_encoded(&self) -> String {
        format!(
            "{FIO_CHAIN_PREFIX}{}",
            check_encode(&self.to_compressed_bytes(), None)
        )
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_encoded())
    }
}

impl From<AffinePoint> for PublicKey {
    fn from(point: AffinePoint) -> Self {
        Self { point }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIF_1: &str = "5J4dcetRm56y1DLYLwCnrsaH8tCQ14u2wwzPZoTfUPx3FNzmPzG";
    const PUB_1: &str = "FIO5Js4SY4x6yPreViD5Q8vN4WgjZWbmduYZ94zfPRji2py4G6g1S";

    #[test]
    fn check_encode_roundtrip() {
        let payload = [0xde, 0xad, 0xbe, 0xef];
        let encoded = check_encode(&payload, None);
        assert_eq!(encoded, "eFGDJPcBvaM");
        assert_eq!(check_decode(&encoded, None).unwrap(), payload);
    }

    #[test]
    fn check_encode_type_tag_changes_checksum() {
        let payload = [0xde, 0xad, 0xbe, 0xef];
        let tagged = check_encode(&payload, Some("K1"));
        assert_eq!(tagged, "eFGDJUtX6Hq");
        assert_eq!(check_decode(&tagged, Some("K1")).unwrap(), payload);
        // Decoding with the wrong tag must fail the checksum.
        assert!(matches!(
            check_decode(&tagged, None),
            Err(Error::InvalidChecksum)
        ));
    }

    #[test]
    fn check_decode_rejects_corruption() {
        let payload = b"some key material";
        let encoded = check_encode(payload, None);
        // Flip one character (base58 has no '0'; swap a known char).
        let mut corrupted: Vec<char> = encoded.chars().collect();
        let i = corrupted.len() / 2;
        corrupted[i] = if corrupted[i] == '2' { '3' } else { '2' };
        let corrupted: String = corrupted.into_iter().collect();
        assert!(matches!(
            check_decode(&corrupted, None),
            Err(Error::InvalidChecksum)
        ));
    }

    #[test]
    fn private_key_from_wif() {
        let key = PrivateKey::from_wif(WIF_1).unwrap();
        assert_eq!(key.public_key().to_encoded(), PUB_1);
    }

    #[test]
    fn private_key_rejects_empty_string() {
        assert!(matches!(
            PrivateKey::from_wif(""),
            Err(Error::MissingParameter("private key"))
        ));
    }

    #[test]
    fn private_key_rejects_bad_checksum() {
        let mut wif = WIF_1.to_string();
        wif.pop();
        wif.push('x');
        assert!(matches!(
            PrivateKey::from_wif(&wif),
            Err(Error::InvalidChecksum)
        ));
    }

    #[test]
    fn private_key_rejects_zero_scalar() {
        assert!(PrivateKey::from_scalar_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn public_key_roundtrip() {
        let key = PublicKey::from_encoded(PUB_1).unwrap();
        assert_eq!(key.to_encoded(), PUB_1);
    }

    #[test]
    fn public_key_parses_without_prefix() {
        let bare = PUB_1.strip_prefix("FIO").unwrap();
        let key = PublicKey::from_encoded(bare).unwrap();
        assert_eq!(key.to_encoded(), PUB_1);
    }

    #[test]
    fn public_key_rejects_corruption() {
        let mut text = PUB_1.to_string();
        text.pop();
        text.push('1');
        assert!(PublicKey::from_encoded(&text).is_err());
    }

    #[test]
    fn debug_never_prints_key_material() {
        let key = PrivateKey::from_wif(WIF_1).unwrap();
        assert_eq!(format!("{key:?}"), "PrivateKey(..)");
    }
}
