//! Chain API types and the HTTP client collaborator.
//!
//! The signer needs three things from a FIO API node: the chain info
//! (chain id and head block time), a reference block for the transaction
//! header, and per-account raw ABIs for serialization. [`ChainApi`] is
//! the trait seam; [`HttpChainApi`] is the reqwest-backed implementation
//! speaking the node's `/v1/chain` endpoints.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};

/// FIO mainnet chain id.
pub const MAINNET_CHAIN_ID: &str =
    "21dcae42c0182200e93f954a074011f9048a7624c6fe81d3c9541a614a88bd1c";

/// FIO testnet chain id.
pub const TESTNET_CHAIN_ID: &str =
    "b20901380af44ef59c5918439a1f9a41d83669020319a80574b804a5f95cbd7e";

/// The FIO environments this signer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnvironment {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
}

impl ChainEnvironment {
    /// Resolves a chain id to a known environment.
    pub fn from_chain_id(chain_id: &str) -> Option<Self> {
        match chain_id {
            MAINNET_CHAIN_ID => Some(ChainEnvironment::Mainnet),
            TESTNET_CHAIN_ID => Some(ChainEnvironment::Testnet),
            _ => None,
        }
    }
}

/// Response of `/v1/chain/get_info` (the fields the signer reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Hex chain id identifying the network.
    pub chain_id: String,
    /// Head block timestamp, `%Y-%m-%dT%H:%M:%S%.3f`.
    pub head_block_time: String,
    /// Number of the last irreversible block.
    pub last_irreversible_block_num: u64,
}

/// Response of `/v1/chain/get_block` (the fields the signer reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Block number.
    pub block_num: u64,
    /// Reference prefix used in transaction headers.
    pub ref_block_prefix: u32,
}

/// Response of `/v1/chain/get_abi`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAbi {
    /// The account owning the ABI.
    pub account_name: String,
    /// The ABI document, kept opaque for the external serializer.
    pub abi: serde_json::Value,
}

/// Chain metadata fetched once per batch.
#[derive(Debug, Clone)]
pub struct ChainMetadata {
    /// Chain info at the time the batch started.
    pub info: ChainInfo,
    /// The reference block for transaction headers.
    pub ref_block: BlockInfo,
}

/// The chain API surface the batch signer consumes.
///
/// Implementations are expected to be cheap to call repeatedly; the
/// signer fetches chain info once per batch but may fetch several ABIs.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Fetches the chain info.
    async fn get_info(&self) -> Result<ChainInfo>;

    /// Fetches one block by number.
    async fn get_block(&self, block_num: u64) -> Result<BlockInfo>;

    /// Fetches the raw ABI of an account.
    async fn get_raw_abi(&self, account: &str) -> Result<RawAbi>;
}

/// Fetches the chain info plus the reference block derived from it.
pub async fn fetch_metadata(api: &dyn ChainApi) -> Result<ChainMetadata> {
    let info = api.get_info().await?;
    let ref_block = api.get_block(info.last_irreversible_block_num).await?;
    Ok(ChainMetadata { info, ref_block })
}

/// A reqwest-backed [`ChainApi`] speaking the `/v1/chain` endpoints.
#[derive(Debug, Clone)]
pub struct HttpChainApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChainApi {
    /// Creates a client for the given API base URL, e.g.
    /// `https://testnet.fioprotocol.io`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let response = self.client.post(url).json(body).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Pushes a signed transaction to the network.
    ///
    /// Not used by the batch signer itself; exposed for consumers that
    /// submit the signed results.
    pub async fn push_transaction(
        &self,
        signed: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.post("/v1/chain/push_transaction", signed).await
    }
}

#[async_trait]
impl ChainApi for HttpChainApi {
    async fn get_info(&self) -> Result<ChainInfo> {
        self.post("/v1/chain/get_info", &json!({})).await
    }

    async fn get_block(&self, block_num: u64) -> Result<BlockInfo> {
        self.post(
            "/v1/chain/get_block",
            &json!({ "block_num_or_id": block_num }),
        )
        .await
    }

    async fn get_raw_abi(&self, account: &str) -> Result<RawAbi> {
        if account.is_empty() {
            return Err(Error::Chain("account name is empty".to_string()));
        }
        self.post("/v1/chain/get_abi", &json!({ "account_name": account }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_chain_ids() {
        assert_eq!(
            ChainEnvironment::from_chain_id(MAINNET_CHAIN_ID),
            Some(ChainEnvironment::Mainnet)
        );
        assert_eq!(
            ChainEnvironment::from_chain_id(TESTNET_CHAIN_ID),
            Some(ChainEnvironment::Testnet)
        );
        assert_eq!(ChainEnvironment::from_chain_id("deadbeef"), None);
        assert_eq!(ChainEnvironment::from_chain_id(""), None);
    }

    #[test]
    fn chain_info_deserializes_extra_fields() {
        let info: ChainInfo = serde_json::from_value(json!({
            "chain_id": TESTNET_CHAIN_ID,
            "head_block_time": "2026-08-29T12:00:00.500",
            "head_block_num": 1000,
            "last_irreversible_block_num": 900,
            "server_version": "ignored"
        }))
        .unwrap();
        assert_eq!(info.last_irreversible_block_num, 900);
    }

    #[test]
    fn base_url_trailing_slash_is_tolerated() {
        let api = HttpChainApi::new("https://testnet.fioprotocol.io/");
        assert_eq!(api.base_url(), "https://testnet.fioprotocol.io/");
    }
}
