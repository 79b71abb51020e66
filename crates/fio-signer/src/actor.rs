//! Actor (account name) derivation from an encoded public key.
//!
//! FIO accounts are named by a 12-character string in the chain's name
//! alphabet (`.12345a-z`), folded from the public key bytes: 5-bit
//! chunks are drawn from the key, skipping zero chunks, until a 64-bit
//! value is filled, and that value renders like any on-chain name.

use crate::error::{Error, Result};

/// The on-chain name alphabet, indexed by 5-bit value.
const NAME_CHARS: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Derives the actor name for an encoded public key.
///
/// The `FIO` prefix is optional on input.
///
/// # Errors
///
/// Returns [`Error::Chain`] if the key body is not base58 or is too
/// short to fold a name from.
pub fn actor_from_public_key(public_key: &str) -> Result<String> {
    let body = public_key.strip_prefix("FIO").unwrap_or(public_key);
    let decoded = bs58::decode(body)
        .into_vec()
        .map_err(|_| Error::Chain(format!("invalid public key for actor: {public_key}")))?;
    let folded = shorten_key(&decoded)?;
    Ok(name_from_u64(folded))
}

/// Folds key bytes into a 64-bit name value.
///
/// Starts past the point-format byte, takes 5-bit chunks (4 bits for the
/// 13th), and skips chunks that would render as the padding character.
fn shorten_key(key: &[u8]) -> Result<u64> {
    let mut result: u64 = 0;
    let mut i = 1;
    let mut len = 0u32;

    while len <= 12 {
        let byte = *key
            .get(i)
            .ok_or_else(|| Error::Chain("public key too short for actor".to_string()))?;
        let mut chunk = u64::from(byte) & if len == 12 { 0x0f } else { 0x1f };
        if chunk == 0 {
            i += 1;
            continue;
        }
        if len == 12 {
            chunk >>= 1;
        }
        let shift = if len == 12 { 0 } else { 5 * (12 - len) - 1 };
        result |= chunk << shift;
        len += 1;
        i += 1;
    }
    Ok(result)
}

/// Renders a 64-bit value in the on-chain name alphabet.
fn name_from_u64(mut value: u64) -> String {
    let mut chars = [0u8; 13];
    chars[12] = NAME_CHARS[(value & 0x0f) as usize];
    value >>= 4;
    for i in (0..12).rev() {
        chars[i] = NAME_CHARS[(value & 0x1f) as usize];
        value >>= 5;
    }
    // On-chain names are at most 12 characters.
    String::from_utf8_lossy(&chars[..12]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_known_actors() {
        assert_eq!(
            actor_from_public_key("FIO5Js4SY4x6yPreViD5Q8vN4WgjZWbmduYZ94zfPRji2py4G6g1S")
                .unwrap(),
            "rszkhtbbivdm"
        );
        assert_eq!(
            actor_from_public_key("FIO7yKH6podeBe37Tdt1QguYa5fwp3Kr1ecaUg4ZBTsLuNFe71HPo")
                .unwrap(),
            "qg5oc3lvkmmx"
        );
    }

    #[test]
    fn prefix_is_optional() {
        let with = actor_from_public_key("FIO5Js4SY4x6yPreViD5Q8vN4WgjZWbmduYZ94zfPRji2py4G6g1S")
            .unwrap();
        let without = actor_from_public_key("5Js4SY4x6yPreViD5Q8vN4WgjZWbmduYZ94zfPRji2py4G6g1S")
            .unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn actor_uses_name_alphabet() {
        let actor =
            actor_from_public_key("FIO7yKH6podeBe37Tdt1QguYa5fwp3Kr1ecaUg4ZBTsLuNFe71HPo")
                .unwrap();
        assert_eq!(actor.len(), 12);
        assert!(actor.bytes().all(|b| NAME_CHARS.contains(&b)));
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(actor_from_public_key("FIO0OIl").is_err());
        assert!(actor_from_public_key("FIO").is_err());
    }
}
