//! Batch transaction signing.
//!
//! [`TransactionSigner`] turns an ordered list of action items into a
//! [`BatchResult`]: chain metadata is fetched once, the signer's public
//! key and actor are derived once, then each item is processed strictly
//! in order. Any error while processing one item becomes a `failed`
//! entry and the batch continues; only an unrecognized chain id aborts
//! the whole call.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use fio_core::{ContentPayload, ContentType, PrivateKey, PublicKey};

use crate::actor::actor_from_public_key;
use crate::chain::{fetch_metadata, ChainApi, ChainEnvironment, ChainMetadata};
use crate::error::{Error, Result};
use crate::serialize::AbiSerializer;

/// Seconds added to the head block time when an item carries no
/// explicit timeout offset.
pub const DEFAULT_TIMEOUT_OFFSET: i64 = 180;

/// Chain timestamp format, e.g. `2026-08-29T12:00:00.000`.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Actions whose `content` field is encrypted toward a counterparty.
const ENCRYPTED_ACTIONS: [&str; 2] = ["newfundsreq", "recordobt"];

/// The account owning the transaction envelope ABI.
const TRANSACTION_ABI_ACCOUNT: &str = "eosio.msig";

/// Failure-entry id used when an item carries none.
const DEFAULT_ITEM_ID: &str = "0";

// ============================================================================
// Input and output types
// ============================================================================

/// One signable operation submitted in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    /// Contract account the action belongs to, e.g. `fio.reqobt`.
    pub account: String,
    /// Action name, e.g. `newfundsreq`.
    pub action: String,
    /// The action's data object, serialized against the account ABI.
    pub data: Value,
    /// Content schema name for actions with an encrypted `content` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Encryption counterparty: the payer's encoded public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_public_key: Option<String>,
    /// Encryption counterparty: the payee's encoded public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee_public_key: Option<String>,
    /// Caller-supplied correlation id, echoed in the result entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Overrides the authorization actor derived from the signing key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_actor: Option<String>,
    /// Overrides the `actor` injected into the data object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_actor: Option<String>,
    /// Seconds of validity past the head block time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_offset: Option<i64>,
}

/// An actor/permission pair authorizing an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authorization {
    /// The authorizing account name.
    pub actor: String,
    /// The permission level, normally `active`.
    pub permission: String,
}

/// One action inside a transaction.
///
/// Before ABI serialization `data` is the structured object; inside the
/// transaction envelope it is the hex string of the packed bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Contract account.
    pub account: String,
    /// Action name.
    pub name: String,
    /// Authorizing actors.
    pub authorization: Vec<Authorization>,
    /// Action data, structured or hex-packed.
    pub data: Value,
}

/// The transaction envelope handed to the ABI serializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Expiration timestamp, `%Y-%m-%dT%H:%M:%S%.3f`.
    pub expiration: String,
    /// Low 16 bits of the reference block number.
    pub ref_block_num: u16,
    /// Reference block prefix from the chain API.
    pub ref_block_prefix: u32,
    /// Always zero; the chain bills actual usage.
    pub max_net_usage_words: u32,
    /// Always zero; the chain bills actual usage.
    pub max_cpu_usage_ms: u32,
    /// Always zero; no deferred execution.
    pub delay_sec: u32,
    /// Always empty.
    pub context_free_actions: Vec<Value>,
    /// The actions to execute, data hex-packed.
    pub actions: Vec<Action>,
    /// Always empty.
    pub transaction_extensions: Vec<Value>,
}

/// A successfully signed transaction, ready for `push_transaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedAction {
    /// Correlation id of the originating item, if it carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Encoded `SIG_K1_...` signatures.
    pub signatures: Vec<String>,
    /// Always zero (no compression).
    pub compression: u32,
    /// Hex of the packed context-free data; always empty.
    pub packed_context_free_data: String,
    /// Hex of the packed transaction.
    pub packed_trx: String,
}

/// The error half of a failure entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Stable machine-readable error name.
    pub name: String,
    /// Human-readable message.
    pub message: String,
}

/// A per-item failure entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionFailure {
    /// Correlation id of the originating item, or `"0"`.
    pub id: String,
    /// What went wrong.
    pub error: FailureDetail,
}

/// The outcome of one batch, successes and failures each in input order.
///
/// The `successed` field name is a wire-compatibility contract with
/// existing consumers and is preserved as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    /// Signed transactions, in input order.
    pub successed: Vec<SignedAction>,
    /// Failure entries, in input order.
    pub failed: Vec<ActionFailure>,
}

// ============================================================================
// The signer
// ============================================================================

/// Signs batches of action items against one chain API and one ABI
/// serializer.
#[derive(Debug, Clone)]
pub struct TransactionSigner<C, S> {
    api: C,
    serializer: S,
}

impl<C: ChainApi, S: AbiSerializer> TransactionSigner<C, S> {
    /// Creates a signer over the given collaborators.
    pub fn new(api: C, serializer: S) -> Self {
        Self { api, serializer }
    }

    /// Signs a batch of action items with one private key.
    ///
    /// Items are processed strictly sequentially; a failing item is
    /// recorded in [`BatchResult::failed`] and the batch continues.
    ///
    /// # Errors
    ///
    /// The whole call fails only before any item is processed: when
    /// chain metadata cannot be fetched, when the chain id is not a
    /// known FIO environment ([`Error::UnidentifiedChain`]), or when
    /// the private key itself does not parse.
    pub async fn sign_batch(&self, items: &[ActionItem], wif: &str) -> Result<BatchResult> {
        let metadata = fetch_metadata(&self.api).await?;
        if ChainEnvironment::from_chain_id(&metadata.info.chain_id).is_none() {
            return Err(Error::UnidentifiedChain(metadata.info.chain_id.clone()));
        }
        let chain_id = hex::decode(&metadata.info.chain_id)
            .map_err(|_| Error::Chain("chain id is not hex".to_string()))?;
        let head_time = NaiveDateTime::parse_from_str(&metadata.info.head_block_time, TIME_FORMAT)
            .map_err(|e| Error::Chain(format!("unparseable head block time: {e}")))?;

        let private_key = PrivateKey::from_wif(wif)?;
        let public_key = private_key.public_key();
        let default_actor = actor_from_public_key(&public_key.to_encoded())?;

        let mut result = BatchResult::default();
        for item in items {
            match self
                .sign_item(item, &metadata, &chain_id, head_time, &private_key, &default_actor)
                .await
            {
                Ok(signed) => result.successed.push(signed),
                Err(error) => {
                    let id = item
                        .id
                        .clone()
                        .unwrap_or_else(|| DEFAULT_ITEM_ID.to_string());
                    tracing::debug!(%id, %error, "action item failed");
                    result.failed.push(ActionFailure {
                        id,
                        error: FailureDetail {
                            name: error.name().to_string(),
                            message: error.to_string(),
                        },
                    });
                }
            }
        }
        Ok(result)
    }

    async fn sign_item(
        &self,
        item: &ActionItem,
        metadata: &ChainMetadata,
        chain_id: &[u8],
        head_time: NaiveDateTime,
        private_key: &PrivateKey,
        default_actor: &str,
    ) -> Result<SignedAction> {
        let actor = item.auth_actor.clone().unwrap_or_else(|| default_actor.to_string());

        let mut data = item.data.clone();
        if let Some(object) = data.as_object_mut() {
            if !object.contains_key("actor") {
                let data_actor = item.data_actor.clone().unwrap_or_else(|| actor.clone());
                object.insert("actor".to_string(), Value::String(data_actor));
            }
        }
        if ENCRYPTED_ACTIONS.contains(&item.action.as_str()) {
            self.encrypt_content_field(item, &mut data, private_key)?;
        }

        let action = Action {
            account: item.account.clone(),
            name: item.action.clone(),
            authorization: vec![Authorization {
                actor,
                permission: "active".to_string(),
            }],
            data,
        };

        let account_abi = self.api.get_raw_abi(&item.account).await?;
        let packed_action = self.serializer.serialize_action(&account_abi, &action)?;

        let offset = item.timeout_offset.unwrap_or(DEFAULT_TIMEOUT_OFFSET);
        let expiration = (head_time + Duration::seconds(offset))
            .format(TIME_FORMAT)
            .to_string();
        let transaction = Transaction {
            expiration,
            ref_block_num: (metadata.ref_block.block_num & 0xFFFF) as u16,
            ref_block_prefix: metadata.ref_block.ref_block_prefix,
            max_net_usage_words: 0,
            max_cpu_usage_ms: 0,
            delay_sec: 0,
            context_free_actions: Vec::new(),
            actions: vec![Action {
                data: Value::String(hex::encode(packed_action)),
                ..action
            }],
            transaction_extensions: Vec::new(),
        };

        let envelope_abi = self.api.get_raw_abi(TRANSACTION_ABI_ACCOUNT).await?;
        let packed_trx = self
            .serializer
            .serialize_transaction(&envelope_abi, &transaction)?;

        let digest = signing_digest(chain_id, &packed_trx);
        let signature = fio_core::ecdsa::sign_digest(&digest, private_key)?;

        Ok(SignedAction {
            id: item.id.clone(),
            signatures: vec![signature.to_string()],
            compression: 0,
            packed_context_free_data: String::new(),
            packed_trx: hex::encode(packed_trx),
        })
    }

    /// Replaces `data.content` with the encrypted envelope.
    ///
    /// The counterparty key is the payer key if supplied, then the payee
    /// key, then the payee address inside the content itself.
    fn encrypt_content_field(
        &self,
        item: &ActionItem,
        data: &mut Value,
        private_key: &PrivateKey,
    ) -> Result<()> {
        let content_type: ContentType = item
            .content_type
            .as_deref()
            .ok_or(fio_core::Error::MissingParameter("content_type"))?
            .parse()
            .map_err(Error::Core)?;
        let content_value = data
            .get("content")
            .ok_or(fio_core::Error::MissingParameter("content"))?;
        let payload: ContentPayload = serde_json::from_value(content_value.clone())
            .map_err(|e| fio_core::Error::SchemaMismatch(e.to_string()))?;

        let counterparty = item
            .payer_public_key
            .clone()
            .or_else(|| item.payee_public_key.clone())
            .or_else(|| {
                let embedded = payload.payee_public_address.trim();
                (!embedded.is_empty()).then(|| embedded.to_string())
            })
            .ok_or(fio_core::Error::MissingParameter("encryption public key"))?;
        let counterparty = PublicKey::from_encoded(&counterparty)?;

        let envelope =
            fio_core::encrypt_content(&payload, content_type, private_key, &counterparty)?;
        data["content"] = Value::String(envelope);
        Ok(())
    }
}

/// `sha256(chain_id || packed_trx || 32 zero bytes)`; the trailing zeros
/// are the hash slot for the (empty) context-free data.
fn signing_digest(chain_id: &[u8], packed_trx: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(chain_id);
    hasher.update(packed_trx);
    hasher.update([0u8; 32]);
    hasher.finalize().into()
}
