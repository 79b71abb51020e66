//! Deterministic ECDSA signing, verification, and public-key recovery.
//!
//! Signing follows RFC 6979: the per-signature nonce is derived from the
//! private scalar and message digest through an HMAC-SHA-256 chain, so the
//! same `(key, message)` pair always yields the same signature on every
//! platform. Two rejection layers sit on top of the raw math:
//!
//! - candidates whose `R` point is the identity or whose `r`/`s` scalar is
//!   zero advance the HMAC state and try again (RFC 6979 step H3);
//! - after low-S canonicalization, both `r` and `s` must minimally encode
//!   to exactly 32 bytes (top byte non-zero, high bit clear). A value that
//!   fails this gate restarts the whole derivation with an incremented
//!   attempt counter folded into the seed digest.
//!
//! The recovery id is found by brute force: each candidate in `0..=3` runs
//! the SEC 1 §4.1.6 public-key recovery procedure and is compared against
//! the signer's actual point. Exactly one candidate must match.
//!
//! # Example
//!
//! ```
//! use fio_core::{ecdsa, PrivateKey};
//!
//! let key = PrivateKey::from_wif("5J4dcetRm56y1DLYLwCnrsaH8tCQ14u2wwzPZoTfUPx3FNzmPzG").unwrap();
//! let signature = ecdsa::sign_message(b"hello fio", &key).unwrap();
//! assert!(ecdsa::verify_message(b"hello fio", &signature, &key.public_key()));
//! ```

use hmac::{Hmac, Mac};
use k256::elliptic_curve::bigint::{ArrayEncoding, CheckedAdd, U256};
use k256::elliptic_curve::ops::{LinearCombination, Reduce};
use k256::elliptic_curve::point::{AffineCoordinates, DecompressPoint};
use k256::elliptic_curve::subtle::Choice;
use k256::elliptic_curve::{Curve, Group, PrimeField};
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar, Secp256k1};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::signature::Signature;

type HmacSha256 = Hmac<Sha256>;

/// Half the curve order, for low-S canonicalization.
const HALF_ORDER: U256 =
    U256::from_be_hex("7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0");

/// The secp256k1 field prime, for recovery-candidate range checks.
const FIELD_MODULUS: U256 =
    U256::from_be_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F");

/// Signs a 32-byte message digest, producing a canonical signature.
///
/// # Errors
///
/// Returns [`Error::UnrecoverablePublicKey`] if no recovery id reproduces
/// the signer's public key — an internal consistency violation that cannot
/// happen for a correctly computed signature.
pub fn sign_digest(digest: &[u8; 32], key: &PrivateKey) -> Result<Signature> {
    let d = key.scalar();
    let e = reduce_digest(digest);
    let public = (ProjectivePoint::GENERATOR * d).to_affine();

    let mut attempt: u32 = 0;
    loop {
        let (r, s) = generate_candidate(d, &e, digest, attempt);

        // The wire format requires both scalars to DER-encode to exactly
        // 32 bytes; otherwise rerun the derivation with a fresh nonce.
        if encodes_to_32_bytes(&r.to_bytes()) && encodes_to_32_bytes(&s.to_bytes()) {
            let recovery_id = find_recovery_id(&e, &r, &s, &public)?;
            return Ok(Signature::from_parts(r, s, recovery_id));
        }

        attempt += 1;
        if attempt % 10 == 0 {
            tracing::warn!(attempt, "still searching for a canonical signature");
        }
    }
}

/// Verifies a signature over a 32-byte message digest.
///
/// Returns `false` (never an error) on any failure: a zero inverse, an
/// identity verification point, or an `x`-coordinate mismatch. Range
/// checks on `r` and `s` are structural — [`Signature`] cannot hold a
/// scalar outside `[1, n-1]`.
#[must_use]
pub fn verify_digest(digest: &[u8; 32], signature: &Signature, public: &PublicKey) -> bool {
    let r = signature.r();
    let s = signature.s();

    let s_inv = match Option::<Scalar>::from(s.invert()) {
        Some(inv) => inv,
        None => return false,
    };
    let e = reduce_digest(digest);
    let u1 = e * s_inv;
    let u2 = *r * s_inv;

    let point = ProjectivePoint::lincomb(
        &ProjectivePoint::GENERATOR,
        &u1,
        &ProjectivePoint::from(*public.point()),
        &u2,
    );
    if bool::from(point.is_identity()) {
        return false;
    }
    x_mod_n(&point.to_affine()) == *r
}

/// Recovers the signer's public key from a digest and signature.
///
/// # Errors
///
/// Returns [`Error::UnrecoverablePublicKey`] if the signature's recovery
/// id does not yield a valid curve point for this digest.
pub fn recover(digest: &[u8; 32], signature: &Signature) -> Result<PublicKey> {
    let e = reduce_digest(digest);
    recover_candidate(&e, signature.r(), signature.s(), signature.recovery_id())
        .map(PublicKey::from)
        .ok_or(Error::UnrecoverablePublicKey)
}

/// Signs arbitrary bytes; the message is SHA-256 hashed first.
///
/// # Errors
///
/// Propagates [`sign_digest`] errors.
pub fn sign_message(data: &[u8], key: &PrivateKey) -> Result<Signature> {
    sign_digest(&sha256(data), key)
}

/// Verifies a signature over arbitrary bytes (SHA-256 hashed first).
#[must_use]
pub fn verify_message(data: &[u8], signature: &Signature, public: &PublicKey) -> bool {
    verify_digest(&sha256(data), signature, public)
}

/// Signs a nonce string, returning the encoded signature text.
///
/// # Errors
///
/// Returns [`Error::MissingParameter`] for an empty nonce.
pub fn sign_nonce(nonce: &str, key: &PrivateKey) -> Result<String> {
    if nonce.is_empty() {
        return Err(Error::MissingParameter("nonce"));
    }
    Ok(sign_message(nonce.as_bytes(), key)?.to_string())
}

/// Runs RFC 6979 nonce generation and the ECDSA equations until a
/// candidate passes the step-H3 checks, then canonicalizes `s`.
fn generate_candidate(d: &Scalar, e: &Scalar, digest: &[u8; 32], attempt: u32) -> (Scalar, Scalar) {
    let mut nonces = NonceGenerator::new(&d.to_bytes().into(), digest, attempt);
    loop {
        if let Some(k) = scalar_in_range(nonces.value()) {
            let big_r = ProjectivePoint::GENERATOR * k;
            if !bool::from(big_r.is_identity()) {
                let r = x_mod_n(&big_r.to_affine());
                if r != Scalar::ZERO {
                    // k is non-zero here, so the inversion cannot fail.
                    let k_inv = k.invert().unwrap_or(Scalar::ZERO);
                    let s = k_inv * (*e + *d * r);
                    if s != Scalar::ZERO {
                        return (r, normalize_s(s));
                    }
                }
            }
        }
        nonces.advance();
    }
}

/// Replaces a high `s` with `n - s`, per the low-S canonical form.
fn normalize_s(s: Scalar) -> Scalar {
    let s_int = U256::from_be_byte_array(s.to_bytes());
    if s_int > HALF_ORDER {
        -s
    } else {
        s
    }
}

/// Brute-forces the recovery id over `0..=3`.
fn find_recovery_id(e: &Scalar, r: &Scalar, s: &Scalar, public: &AffinePoint) -> Result<u8> {
    for recovery_id in 0u8..4u8 {
        if let Some(candidate) = recover_candidate(e, r, s, recovery_id) {
            if candidate == *public {
                return Ok(recovery_id);
            }
        }
    }
    Err(Error::UnrecoverablePublicKey)
}

/// SEC 1 §4.1.6 public-key recovery: `Q = r⁻¹(sR - eG)` for the candidate
/// `R` selected by the recovery id.
fn recover_candidate(e: &Scalar, r: &Scalar, s: &Scalar, recovery_id: u8) -> Option<AffinePoint> {
    // The high bit selects x = r + n; only usable when that sum is still a
    // valid field element.
    let x_bytes: FieldBytes = if recovery_id >> 1 == 1 {
        let sum = Option::<U256>::from(
            U256::from_be_byte_array(r.to_bytes()).checked_add(&Secp256k1::ORDER),
        )?;
        if sum >= FIELD_MODULUS {
            return None;
        }
        sum.to_be_byte_array()
    } else {
        r.to_bytes()
    };

    let y_is_odd = Choice::from(recovery_id & 1);
    let big_r = Option::<AffinePoint>::from(AffinePoint::decompress(&x_bytes, y_is_odd))?;

    let r_inv = Option::<Scalar>::from(r.invert())?;
    let u1 = *s * r_inv;
    let u2 = -(r_inv * e);
    let q = ProjectivePoint::lincomb(
        &ProjectivePoint::from(big_r),
        &u1,
        &ProjectivePoint::GENERATOR,
        &u2,
    );
    if bool::from(q.is_identity()) {
        return None;
    }
    Some(q.to_affine())
}

/// RFC 6979 §3.2 HMAC-DRBG state.
///
/// An `attempt` greater than zero folds that many zero bytes into the seed
/// digest, diversifying the derivation when the canonical-length gate
/// rejects an earlier attempt.
struct NonceGenerator {
    k: [u8; 32],
    v: [u8; 32],
}

impl NonceGenerator {
    fn new(scalar_bytes: &[u8; 32], digest: &[u8; 32], attempt: u32) -> Self {
        let seed: [u8; 32] = if attempt > 0 {
            let mut hasher = Sha256::new();
            hasher.update(digest);
            hasher.update(vec![0u8; attempt as usize]);
            hasher.finalize().into()
        } else {
            *digest
        };

        let v = [0x01u8; 32];
        let k = [0x00u8; 32];

        // Steps D through G, then the first extraction round.
        let k = hmac_sha256(&k, &[&v, &[0x00], scalar_bytes, &seed]);
        let v = hmac_sha256(&k, &[&v]);
        let k = hmac_sha256(&k, &[&v, &[0x01], scalar_bytes, &seed]);
        let v = hmac_sha256(&k, &[&v]);
        let v = hmac_sha256(&k, &[&v]);

        Self { k, v }
    }

    /// The current candidate bytes.
    fn value(&self) -> &[u8; 32] {
        &self.v
    }

    /// Advances the HMAC state after a rejected candidate (step H3).
    fn advance(&mut self) {
        self.k = hmac_sha256(&self.k, &[&self.v, &[0x00]]);
        self.v = hmac_sha256(&self.k, &[&self.v]);
        self.v = hmac_sha256(&self.k, &[&self.v]);
    }
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    // HMAC accepts keys of any length; this cannot fail.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// Interprets candidate bytes as a scalar, rejecting values outside
/// `[1, n-1]` without reduction.
fn scalar_in_range(bytes: &[u8; 32]) -> Option<Scalar> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes)))
        .filter(|s| s != &Scalar::ZERO)
}

/// True when the big-endian value minimally DER-encodes to 32 bytes.
fn encodes_to_32_bytes(bytes: &FieldBytes) -> bool {
    bytes[0] != 0 && bytes[0] & 0x80 == 0
}

fn x_mod_n(point: &AffinePoint) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&point.x())
}

fn reduce_digest(digest: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*digest))
}

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}
