//! Structured memo payloads and their per-type binary schemas.
//!
//! Every encrypted memo is one of a closed set of content types, each with
//! a fixed, ordered field schema. The binary layout follows the chain's
//! ABI conventions so the deployed network can decode what this crate
//! encrypts:
//!
//! - a string is a varuint32 byte length followed by UTF-8 bytes;
//! - an optional field is a presence byte (`0` = absent/null, `1` =
//!   present) followed by the string when present.
//!
//! Null optional fields survive an encode/decode round trip as null — an
//! absent memo is never turned into an empty string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The closed set of memo content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// A peer-to-peer funds request (`newfundsreq`).
    NewFundsContent,
    /// A record of an off-chain transaction (`recordobt`).
    RecordObtDataContent,
}

impl ContentType {
    /// The wire tag for this content type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::NewFundsContent => "new_funds_content",
            ContentType::RecordObtDataContent => "record_obt_data_content",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "new_funds_content" => Ok(ContentType::NewFundsContent),
            "record_obt_data_content" => Ok(ContentType::RecordObtDataContent),
            other => Err(Error::UnknownContentType(other.to_string())),
        }
    }
}

/// A structured memo payload.
///
/// One struct carries the union of fields across content types; the
/// per-type schema decides which fields are required and in what order
/// they serialize. Optional fields distinguish "absent/null" from an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPayload {
    /// Payer's encoded public key (`record_obt_data_content` only).
    #[serde(default)]
    pub payer_public_address: Option<String>,
    /// Payee's encoded public key.
    pub payee_public_address: String,
    /// Token amount as a decimal string.
    pub amount: String,
    /// Chain code, e.g. `FIO`.
    pub chain_code: String,
    /// Token code, e.g. `FIO`.
    pub token_code: String,
    /// Settlement status (`record_obt_data_content` only).
    #[serde(default)]
    pub status: Option<String>,
    /// Off-chain transaction id (`record_obt_data_content` only).
    #[serde(default)]
    pub obt_id: Option<String>,
    /// Free-form memo, nullable.
    #[serde(default)]
    pub memo: Option<String>,
    /// Transaction hash, nullable.
    #[serde(default)]
    pub hash: Option<String>,
    /// Offline payment URL, nullable.
    #[serde(default)]
    pub offline_url: Option<String>,
}

impl ContentPayload {
    /// Serializes the payload per the ordered schema of `content_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] when a field the schema
    /// requires is absent.
    pub fn to_schema_bytes(&self, content_type: ContentType) -> Result<Vec<u8>> {
        let mut writer = SchemaWriter::default();
        match content_type {
            ContentType::NewFundsContent => {
                writer.string(&self.payee_public_address);
                writer.string(&self.amount);
                writer.string(&self.chain_code);
                writer.string(&self.token_code);
            }
            ContentType::RecordObtDataContent => {
                let payer = self
                    .payer_public_address
                    .as_deref()
                    .ok_or(Error::MissingParameter("payer_public_address"))?;
                let status = self
                    .status
                    .as_deref()
                    .ok_or(Error::MissingParameter("status"))?;
                let obt_id = self
                    .obt_id
                    .as_deref()
                    .ok_or(Error::MissingParameter("obt_id"))?;
                writer.string(payer);
                writer.string(&self.payee_public_address);
                writer.string(&self.amount);
                writer.string(&self.chain_code);
                writer.string(&self.token_code);
                writer.string(status);
                writer.string(obt_id);
            }
        }
        writer.optional_string(self.memo.as_deref());
        writer.optional_string(self.hash.as_deref());
        writer.optional_string(self.offline_url.as_deref());
        Ok(writer.into_bytes())
    }

    /// Parses bytes back into a payload per the schema of `content_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] on truncated input, invalid
    /// UTF-8, a malformed presence byte, or trailing bytes.
    pub fn from_schema_bytes(bytes: &[u8], content_type: ContentType) -> Result<Self> {
        let mut reader = SchemaReader::new(bytes);
        let mut payload = ContentPayload::default();

        match content_type {
            ContentType::NewFundsContent => {
                payload.payee_public_address = reader.string()?;
                payload.amount = reader.string()?;
                payload.chain_code = reader.string()?;
                payload.token_code = reader.string()?;
            }
            ContentType::RecordObtDataContent => {
                payload.payer_public_address = Some(reader.string()?);
                payload.payee_public_address = reader.string()?;
                payload.amount = reader.string()?;
                payload.chain_code = reader.string()?;
                payload.token_code = reader.string()?;
                payload.status = Some(reader.string()?);
                payload.obt_id = Some(reader.string()?);
            }
        }
        payload.memo = reader.optional_string()?;
        payload.hash = reader.optional_string()?;
        payload.offline_url = reader.optional_string()?;

        reader.finish()?;
        Ok(payload)
    }
}

/// Writes schema fields in the chain's binary conventions.
#[derive(Default)]
struct SchemaWriter {
    buf: Vec<u8>,
}

impl SchemaWriter {
    fn varuint32(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
    }

    fn string(&mut self, value: &str) {
        self.varuint32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    fn optional_string(&mut self, value: Option<&str>) {
        match value {
            Some(text) => {
                self.buf.push(1);
                self.string(text);
            }
            None => self.buf.push(0),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads schema fields, erroring on any layout violation.
struct SchemaReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SchemaReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8> {
        let byte = self
            .bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::SchemaMismatch("unexpected end of content".to_string()))?;
        self.pos += 1;
        Ok(byte)
    }

    fn varuint32(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        let mut shift = 0;
        loop {
            let byte = self.byte()?;
            value |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 32 {
                return Err(Error::SchemaMismatch("varuint32 overflow".to_string()));
            }
        }
    }

    fn string(&mut self) -> Result<String> {
        let len = self.varuint32()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| Error::SchemaMismatch("string length exceeds content".to_string()))?;
        let text = std::str::from_utf8(&self.bytes[self.pos..end])
            .map_err(|_| Error::SchemaMismatch("string is not valid UTF-8".to_string()))?
            .to_string();
        self.pos = end;
        Ok(text)
    }

    fn optional_string(&mut self) -> Result<Option<String>> {
        match self.byte()? {
            0 => Ok(None),
            1 => Ok(Some(self.string()?)),
            other => Err(Error::SchemaMismatch(format!(
                "invalid presence byte {other:#04x}"
            ))),
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(Error::SchemaMismatch(format!(
                "{} trailing bytes after content",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funds_request() -> ContentPayload {
        ContentPayload {
            payee_public_address: "FIO5Js4SY4x6yPreViD5Q8vN4WgjZWbmduYZ94zfPRji2py4G6g1S"
                .to_string(),
            amount: "12".to_string(),
            chain_code: "FIO".to_string(),
            token_code: "FIO".to_string(),
            memo: Some("Hello FIO SDK Lite".to_string()),
            hash: None,
            offline_url: None,
            ..ContentPayload::default()
        }
    }

    #[test]
    fn content_type_tags_roundtrip() {
        for tag in ["new_funds_content", "record_obt_data_content"] {
            let parsed: ContentType = tag.parse().unwrap();
            assert_eq!(parsed.as_str(), tag);
        }
    }

    #[test]
    fn content_type_rejects_unknown_tag() {
        let err = "bogus_content".parse::<ContentType>().unwrap_err();
        assert!(matches!(err, Error::UnknownContentType(_)));
    }

    #[test]
    fn new_funds_schema_bytes_match_reference() {
        // Independently generated from the chain's ABI conventions.
        let expected = "3546494f354a7334535934783679507265566944355138764e3457676a5a57626d6475595a39347a6650526a693270793447366731530231320346494f0346494f011248656c6c6f2046494f2053444b204c6974650000";
        let bytes = funds_request()
            .to_schema_bytes(ContentType::NewFundsContent)
            .unwrap();
        assert_eq!(hex::encode(&bytes), expected);
    }

    #[test]
    fn new_funds_roundtrip_preserves_nulls() {
        let original = funds_request();
        let bytes = original
            .to_schema_bytes(ContentType::NewFundsContent)
            .unwrap();
        let decoded =
            ContentPayload::from_schema_bytes(&bytes, ContentType::NewFundsContent).unwrap();
        assert_eq!(decoded.memo.as_deref(), Some("Hello FIO SDK Lite"));
        assert_eq!(decoded.hash, None);
        assert_eq!(decoded.offline_url, None);
        assert_eq!(decoded, original);
    }

    #[test]
    fn record_obt_roundtrip() {
        let original = ContentPayload {
            payer_public_address: Some("FIO7yKH6podeBe37Tdt1QguYa5fwp3Kr1ecaUg4ZBTsLuNFe71HPo".to_string()),
            payee_public_address: "FIO5Js4SY4x6yPreViD5Q8vN4WgjZWbmduYZ94zfPRji2py4G6g1S"
                .to_string(),
            amount: "20".to_string(),
            chain_code: "FIO".to_string(),
            token_code: "FIO".to_string(),
            status: Some("sent_to_blockchain".to_string()),
            obt_id: Some("1".to_string()),
            memo: Some("Hello FIO SDK Lite Encrypted".to_string()),
            hash: None,
            offline_url: None,
        };
        let bytes = original
            .to_schema_bytes(ContentType::RecordObtDataContent)
            .unwrap();
        let decoded =
            ContentPayload::from_schema_bytes(&bytes, ContentType::RecordObtDataContent).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn record_obt_requires_payer_fields() {
        let err = funds_request()
            .to_schema_bytes(ContentType::RecordObtDataContent)
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("payer_public_address")));
    }

    #[test]
    fn decode_rejects_truncation() {
        let bytes = funds_request()
            .to_schema_bytes(ContentType::NewFundsContent)
            .unwrap();
        let err = ContentPayload::from_schema_bytes(
            &bytes[..bytes.len() - 1],
            ContentType::NewFundsContent,
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = funds_request()
            .to_schema_bytes(ContentType::NewFundsContent)
            .unwrap();
        bytes.push(0);
        let err =
            ContentPayload::from_schema_bytes(&bytes, ContentType::NewFundsContent).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn decode_rejects_wrong_schema() {
        // new_funds bytes read with the record_obt schema must not parse.
        let bytes = funds_request()
            .to_schema_bytes(ContentType::NewFundsContent)
            .unwrap();
        assert!(ContentPayload::from_schema_bytes(&bytes, ContentType::RecordObtDataContent)
            .is_err());
    }

    #[test]
    fn null_fields_serialize_to_json_null() {
        let json = serde_json::to_value(funds_request()).unwrap();
        assert!(json["hash"].is_null());
        assert_eq!(json["memo"], "Hello FIO SDK Lite");
    }
}
