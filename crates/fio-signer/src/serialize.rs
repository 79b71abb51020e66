//! ABI serialization seam.
//!
//! Packing an action's data and the transaction envelope to the chain's
//! binary form requires the account ABI fetched at runtime. The packing
//! itself is delegated through [`AbiSerializer`] so the signer stays
//! independent of any particular ABI engine; callers plug in whichever
//! implementation their deployment uses.

use crate::chain::RawAbi;
use crate::error::Result;
use crate::transaction::{Action, Transaction};

/// Packs actions and transactions against a runtime-fetched ABI.
///
/// Implementations receive the raw ABI document exactly as returned by
/// `/v1/chain/get_abi` and must produce the chain's binary encoding.
pub trait AbiSerializer: Send + Sync {
    /// Serializes one action's `data` object to its packed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if
    /// the action does not match the ABI.
    fn serialize_action(&self, abi: &RawAbi, action: &Action) -> Result<Vec<u8>>;

    /// Serializes a full transaction to its packed bytes.
    ///
    /// The actions inside `transaction` carry hex-packed data produced
    /// by [`serialize_action`](Self::serialize_action).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if
    /// the transaction does not match the ABI.
    fn serialize_transaction(&self, abi: &RawAbi, transaction: &Transaction) -> Result<Vec<u8>>;
}
