//! FIO Batch Transaction Signer
//!
//! Orchestrates signing of FIO chain transactions on top of
//! [`fio_core`]: fetches chain metadata, builds and (where required)
//! encrypts actions, delegates ABI packing to an external serializer,
//! signs the packed bytes, and aggregates per-item successes and
//! failures.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 TransactionSigner                   │
//! │   build action → encrypt content → pack → sign      │
//! ├──────────────────────────┬──────────────────────────┤
//! │   ChainApi (reqwest)     │  AbiSerializer (caller)  │
//! │   get_info / get_block   │  action + transaction    │
//! │   get_abi / push_trx     │  packing                 │
//! ├──────────────────────────┴──────────────────────────┤
//! │            fio-core (keys, ecdsa, cipher)           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Action items in one batch are processed strictly sequentially and
//! results keep input order. One failing item never aborts the batch;
//! the only whole-batch-fatal condition is an unrecognized chain id.
//!
//! # Quick Start
//!
//! ```no_run
//! use fio_signer::{ActionItem, HttpChainApi, TransactionSigner};
//! # use fio_signer::{AbiSerializer, Result, chain::RawAbi, transaction::{Action, Transaction}};
//! # struct MySerializer;
//! # impl AbiSerializer for MySerializer {
//! #     fn serialize_action(&self, _: &RawAbi, _: &Action) -> Result<Vec<u8>> { Ok(vec![]) }
//! #     fn serialize_transaction(&self, _: &RawAbi, _: &Transaction) -> Result<Vec<u8>> { Ok(vec![]) }
//! # }
//!
//! # async fn run() -> Result<()> {
//! let api = HttpChainApi::new("https://testnet.fioprotocol.io");
//! let signer = TransactionSigner::new(api, MySerializer);
//!
//! let items = vec![ActionItem {
//!     account: "fio.token".to_string(),
//!     action: "trnsfiopubky".to_string(),
//!     data: serde_json::json!({
//!         "payee_public_key": "FIO7yKH6podeBe37Tdt1QguYa5fwp3Kr1ecaUg4ZBTsLuNFe71HPo",
//!         "amount": "1000000000",
//!         "max_fee": 2_000_000_000u64,
//!         "tpid": "",
//!     }),
//!     content_type: None,
//!     payer_public_key: None,
//!     payee_public_key: None,
//!     id: Some("transfer-1".to_string()),
//!     auth_actor: None,
//!     data_actor: None,
//!     timeout_offset: None,
//! }];
//!
//! let result = signer
//!     .sign_batch(&items, "5J4dcetRm56y1DLYLwCnrsaH8tCQ14u2wwzPZoTfUPx3FNzmPzG")
//!     .await?;
//! println!("{} signed, {} failed", result.successed.len(), result.failed.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod actor;
pub mod chain;
pub mod error;
pub mod serialize;
pub mod transaction;

pub use actor::actor_from_public_key;
pub use chain::{ChainApi, ChainEnvironment, HttpChainApi, MAINNET_CHAIN_ID, TESTNET_CHAIN_ID};
pub use error::{Error, Result};
pub use serialize::AbiSerializer;
pub use transaction::{
    ActionItem, BatchResult, SignedAction, TransactionSigner, DEFAULT_TIMEOUT_OFFSET,
};
