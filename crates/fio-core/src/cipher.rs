//! Shared-secret encryption of memo content between two key pairs.
//!
//! The construction is the one the deployed network decrypts:
//!
//! 1. **ECDH**: `S = d · Q_other`; the 32-byte affine x-coordinate of `S`
//!    is hashed with SHA-512 into a 64-byte shared secret. By the identity
//!    `a·(b·G) = b·(a·G)` either party derives the same secret from their
//!    own scalar and the counterparty's point.
//! 2. **KDF**: `K = SHA-512(shared_secret)`; the first 32 bytes are the
//!    AES key, the last 32 the HMAC key.
//! 3. **Encrypt-then-MAC**: the content serializes per its schema
//!    ([`ContentPayload::to_schema_bytes`]), is encrypted with AES-256-CBC
//!    under a fresh random 16-byte IV, and the envelope
//!    `IV || ciphertext || HMAC-SHA-256(IV || ciphertext)` is emitted as
//!    base64.
//!
//! Decryption verifies the MAC before touching the ciphertext and fails
//! loudly on a bad tag or a layout that does not match the declared
//! content type.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use k256::elliptic_curve::point::AffineCoordinates;
use k256::ProjectivePoint;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

use crate::content::{ContentPayload, ContentType};
use crate::error::{Error, Result};
use crate::keys::{PrivateKey, PublicKey};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Byte length of the CBC initialization vector.
const IV_LEN: usize = 16;

/// Byte length of the trailing HMAC tag.
const MAC_LEN: usize = 32;

/// Derives the 64-byte ECDH shared secret between one party's private key
/// and the counterparty's public key.
///
/// Symmetric: `shared_secret(dA, QB) == shared_secret(dB, QA)`.
#[must_use]
pub fn shared_secret(private: &PrivateKey, counterparty: &PublicKey) -> [u8; 64] {
    let point = (ProjectivePoint::from(*counterparty.point()) * private.scalar()).to_affine();
    Sha512::digest(point.x()).into()
}

/// Encrypts a content payload for a counterparty, returning the opaque
/// base64 envelope.
///
/// # Errors
///
/// Returns [`Error::MissingParameter`] when the payload lacks a field the
/// content-type schema requires.
pub fn encrypt_content(
    content: &ContentPayload,
    content_type: ContentType,
    private: &PrivateKey,
    counterparty: &PublicKey,
) -> Result<String> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    encrypt_content_with_iv(content, content_type, private, counterparty, iv)
}

/// Deterministic variant taking an explicit IV, for vector tests.
pub(crate) fn encrypt_content_with_iv(
    content: &ContentPayload,
    content_type: ContentType,
    private: &PrivateKey,
    counterparty: &PublicKey,
    iv: [u8; IV_LEN],
) -> Result<String> {
    let plaintext = content.to_schema_bytes(content_type)?;
    let secret = shared_secret(private, counterparty);
    Ok(BASE64.encode(seal(&secret, &plaintext, iv)))
}

/// Decrypts an opaque envelope back into a content payload.
///
/// # Errors
///
/// - [`Error::AuthenticationFailure`] when the envelope is malformed, not
///   base64, or its MAC does not verify
/// - [`Error::SchemaMismatch`] when the decrypted bytes do not parse per
///   the declared content type
pub fn decrypt_content(
    envelope: &str,
    content_type: ContentType,
    private: &PrivateKey,
    counterparty: &PublicKey,
) -> Result<ContentPayload> {
    if envelope.is_empty() {
        return Err(Error::MissingParameter("content"));
    }
    let message = BASE64
        .decode(envelope)
        .map_err(|_| Error::AuthenticationFailure)?;
    let secret = shared_secret(private, counterparty);
    let plaintext = open(&secret, &message)?;
    ContentPayload::from_schema_bytes(&plaintext, content_type)
}

/// `IV || AES-256-CBC(plaintext) || HMAC-SHA-256(IV || ciphertext)`.
fn seal(secret: &[u8; 64], plaintext: &[u8], iv: [u8; IV_LEN]) -> Vec<u8> {
    let (enc_key, mac_key) = derive_keys(secret);

    let ciphertext = Aes256CbcEnc::new(&enc_key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut message = Vec::with_capacity(IV_LEN + ciphertext.len() + MAC_LEN);
    message.extend_from_slice(&iv);
    message.extend_from_slice(&ciphertext);
    let tag = hmac_tag(&mac_key, &message);
    message.extend_from_slice(&tag);
    message
}

/// Verifies the envelope MAC, then decrypts.
fn open(secret: &[u8; 64], message: &[u8]) -> Result<Vec<u8>> {
    // One IV, at least one cipher block, one tag.
    if message.len() < IV_LEN + 16 + MAC_LEN {
        return Err(Error::AuthenticationFailure);
    }
    let (body, tag) = message.split_at(message.len() - MAC_LEN);
    let (enc_key, mac_key) = derive_keys(secret);

    let mut mac = HmacSha256::new_from_slice(&mac_key).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(tag)
        .map_err(|_| Error::AuthenticationFailure)?;

    let (iv, ciphertext) = body.split_at(IV_LEN);
    let iv: [u8; IV_LEN] = iv.try_into().expect("split_at yields IV_LEN bytes");
    Aes256CbcDec::new(&enc_key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::SchemaMismatch("invalid padding".to_string()))
}

/// Splits `SHA-512(secret)` into the AES key and the HMAC key.
fn derive_keys(secret: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let derived = Sha512::digest(secret);
    let mut enc_key = [0u8; 32];
    let mut mac_key = [0u8; 32];
    enc_key.copy_from_slice(&derived[..32]);
    mac_key.copy_from_slice(&derived[32..]);
    (enc_key, mac_key)
}

fn hmac_tag(key: &[u8; 32], data: &[u8]) -> [u8; MAC_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIF_1: &str = "5J4dcetRm56y1DLYLwCnrsaH8tCQ14u2wwzPZoTfUPx3FNzmPzG";
    const WIF_2: &str = "5JyemLVVMc9PWepxgnXDsGvxzkuVHRZB9gqcG8WdMuANy77NgzZ";

    fn wallets() -> (PrivateKey, PrivateKey) {
        (
            PrivateKey::from_wif(WIF_1).unwrap(),
            PrivateKey::from_wif(WIF_2).unwrap(),
        )
    }

    fn obt_record(payer: &PublicKey, payee: &PublicKey) -> ContentPayload {
        ContentPayload {
            payer_public_address: Some(payer.to_encoded()),
            payee_public_address: payee.to_encoded(),
            amount: "20".to_string(),
            chain_code: "FIO".to_string(),
            token_code: "FIO".to_string(),
            status: Some("sent_to_blockchain".to_string()),
            obt_id: Some("1".to_string()),
            memo: Some("Hello FIO SDK Lite Encrypted".to_string()),
            hash: None,
            offline_url: None,
        }
    }

    #[test]
    fn shared_secret_is_symmetric() {
        let (a, b) = wallets();
        let ab = shared_secret(&a, &b.public_key());
        let ba = shared_secret(&b, &a.public_key());
        assert_eq!(ab, ba);
    }

    #[test]
    fn shared_secret_matches_reference() {
        // Independently generated ECDH vector for the two test wallets.
        let (a, b) = wallets();
        assert_eq!(
            hex::encode(shared_secret(&a, &b.public_key())),
            "ba90dc3e99c1b122c5e63f9836a64ee6ee670f0c6a4a0d370022bb8c183973ee\
             ba2146f81a435e332be51950d67ea26095b648669649209aa9c4212c6e1842c2"
        );
    }

    #[test]
    fn encrypt_decrypt_roundtrip_both_directions() {
        let (a, b) = wallets();
        let content = obt_record(&b.public_key(), &a.public_key());
        let envelope = encrypt_content(
            &content,
            ContentType::RecordObtDataContent,
            &a,
            &b.public_key(),
        )
        .unwrap();

        // Same party that encrypted.
        let decrypted = decrypt_content(
            &envelope,
            ContentType::RecordObtDataContent,
            &a,
            &b.public_key(),
        )
        .unwrap();
        assert_eq!(decrypted, content);

        // Counterparty with the mirrored pairing.
        let decrypted = decrypt_content(
            &envelope,
            ContentType::RecordObtDataContent,
            &b,
            &a.public_key(),
        )
        .unwrap();
        assert_eq!(decrypted, content);
        assert_eq!(decrypted.hash, None);
        assert_eq!(decrypted.offline_url, None);
    }

    #[test]
    fn fresh_iv_per_call() {
        let (a, b) = wallets();
        let content = obt_record(&b.public_key(), &a.public_key());
        let one = encrypt_content(
            &content,
            ContentType::RecordObtDataContent,
            &a,
            &b.public_key(),
        )
        .unwrap();
        let two = encrypt_content(
            &content,
            ContentType::RecordObtDataContent,
            &a,
            &b.public_key(),
        )
        .unwrap();
        assert_ne!(one, two);
    }

    #[test]
    fn tampered_envelope_fails_authentication() {
        let (a, b) = wallets();
        let content = obt_record(&b.public_key(), &a.public_key());
        let envelope = encrypt_content(
            &content,
            ContentType::RecordObtDataContent,
            &a,
            &b.public_key(),
        )
        .unwrap();

        let mut raw = BASE64.decode(&envelope).unwrap();
        raw[IV_LEN + 1] ^= 0x01;
        let tampered = BASE64.encode(raw);
        let err = decrypt_content(
            &tampered,
            ContentType::RecordObtDataContent,
            &a,
            &b.public_key(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailure));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let (a, b) = wallets();
        let content = obt_record(&b.public_key(), &a.public_key());
        let envelope = encrypt_content(
            &content,
            ContentType::RecordObtDataContent,
            &a,
            &b.public_key(),
        )
        .unwrap();

        // b decrypting against b's own public key derives a different secret.
        let err = decrypt_content(
            &envelope,
            ContentType::RecordObtDataContent,
            &b,
            &b.public_key(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailure));
    }

    #[test]
    fn wrong_content_type_is_schema_mismatch() {
        let (a, b) = wallets();
        let content = obt_record(&b.public_key(), &a.public_key());
        let envelope = encrypt_content(
            &content,
            ContentType::RecordObtDataContent,
            &a,
            &b.public_key(),
        )
        .unwrap();

        let err = decrypt_content(
            &envelope,
            ContentType::NewFundsContent,
            &a,
            &b.public_key(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn empty_envelope_is_missing_parameter() {
        let (a, b) = wallets();
        let err = decrypt_content("", ContentType::NewFundsContent, &a, &b.public_key())
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("content")));
    }

    #[test]
    fn truncated_envelope_fails_authentication() {
        let (a, b) = wallets();
        let err = decrypt_content(
            &BASE64.encode([0u8; 20]),
            ContentType::NewFundsContent,
            &a,
            &b.public_key(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailure));
    }

    #[test]
    fn fixed_iv_envelope_matches_reference() {
        // Independently generated vector: wallet one encrypting a funds
        // request to wallet two under IV 000102...0f.
        let (a, b) = wallets();
        let content = ContentPayload {
            payee_public_address: a.public_key().to_encoded(),
            amount: "12".to_string(),
            chain_code: "FIO".to_string(),
            token_code: "FIO".to_string(),
            memo: Some("Hello FIO SDK Lite".to_string()),
            hash: None,
            offline_url: None,
            ..ContentPayload::default()
        };
        let iv: [u8; 16] = (0u8..16).collect::<Vec<_>>().try_into().unwrap();
        let envelope = encrypt_content_with_iv(
            &content,
            ContentType::NewFundsContent,
            &a,
            &b.public_key(),
            iv,
        )
        .unwrap();
        assert_eq!(
            envelope,
            "AAECAwQFBgcICQoLDA0OD9LO5K7/Qkft76BeH1PLz62wVLnfvXYON18Nr3VQspkT\
             a/0yo8PCuIXCSOo9RsQLYQxLumXh3LFhF/+aiEYn+7dxBkHvMnuDMXNuXi0KIsU6\
             VXNzJDHuEBxnohQQiebGO5EN0brO4SPao0x9vaZn3EGH7uTizbPzojzH2zyJQp0D"
        );
    }
}
