//! Fields shared by every transaction type.

use crate::transact::Address;
use crate::transact::constants::Byte32;
use crate::transact::encode::{
    is_empty_bytes32_opt, is_empty_string_opt, is_empty_vec_opt, is_zero, is_zero_addr,
    is_zero_opt,
};
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as, skip_serializing_none};

/// Common transaction header fields present on all Algorand transactions.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct TransactionHeader {
    /// The address of the account sending and paying for this transaction.
    #[serde(rename = "snd")]
    #[serde(skip_serializing_if = "is_zero_addr")]
    #[serde(default)]
    pub sender: Address,

    /// The fee paid by the sender, in microALGO.
    #[serde(rename = "fee")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub fee: Option<u64>,

    /// The first round this transaction is valid for.
    #[serde(rename = "fv")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub first_valid: u64,

    /// The last round this transaction is valid for.
    #[serde(rename = "lv")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub last_valid: u64,

    /// The human-readable name of the network genesis block.
    #[serde(rename = "gen")]
    #[serde(skip_serializing_if = "is_empty_string_opt")]
    #[serde(default)]
    pub genesis_id: Option<String>,

    /// The hash of the network genesis block.
    #[serde(rename = "gh")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_bytes32_opt")]
    #[serde(default)]
    pub genesis_hash: Option<Byte32>,

    /// The group id binding this transaction into an atomic group.
    #[serde(rename = "grp")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_bytes32_opt")]
    #[serde(default)]
    pub group: Option<Byte32>,

    /// A lease enforcing mutual exclusion of transactions within the
    /// validity window.
    #[serde(rename = "lx")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_bytes32_opt")]
    #[serde(default)]
    pub lease: Option<Byte32>,

    /// Arbitrary note data, max 1000 bytes.
    #[serde(rename = "note")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    pub note: Option<Vec<u8>>,

    /// Changes the authorized signing key of the sender to the given address.
    #[serde(rename = "rekey")]
    #[serde(skip_serializing_if = "crate::transact::encode::is_zero_addr_opt")]
    #[serde(default)]
    pub rekey_to: Option<Address>,
}
