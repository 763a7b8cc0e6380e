//! Transaction primitives: the transaction model, canonical msgpack
//! encoding, ids, fees and atomic grouping.

mod address;
mod application_call;
mod asset_config;
mod asset_freeze;
mod asset_transfer;
pub mod constants;
mod encode;
mod error;
mod header;
mod key_registration;
mod payment;

pub use address::Address;
use application_call::{application_call_deserializer, application_call_serializer};
pub use application_call::{
    ApplicationCallTransactionFields, BoxReference, OnApplicationComplete, StateSchema,
};
pub use asset_config::AssetConfigTransactionFields;
use asset_config::{asset_config_deserializer, asset_config_serializer};
pub use asset_freeze::AssetFreezeTransactionFields;
pub use asset_transfer::AssetTransferTransactionFields;
pub use encode::{AlgorandMsgpack, EstimateTransactionSize, TransactionId, hash};
pub use error::TransactError;
pub use header::TransactionHeader;
pub use key_registration::KeyRegistrationTransactionFields;
pub use payment::PaymentTransactionFields;

use constants::{
    ALGORAND_SIGNATURE_BYTE_LENGTH, ALGORAND_SIGNATURE_ENCODING_INCR, Byte32, MAX_NOTE_LENGTH,
    MAX_TX_GROUP_SIZE,
};
use encode::is_zero_addr_opt;
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as, skip_serializing_none};
use std::any::Any;

/// Structural validation applied before a transaction is encoded for
/// submission.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<String>>;
}

/// Enumeration of all transaction types.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "type")]
pub enum Transaction {
    #[serde(rename = "pay")]
    Payment(PaymentTransactionFields),

    #[serde(rename = "axfer")]
    AssetTransfer(AssetTransferTransactionFields),

    #[serde(serialize_with = "asset_config_serializer")]
    #[serde(deserialize_with = "asset_config_deserializer")]
    #[serde(rename = "acfg")]
    AssetConfig(AssetConfigTransactionFields),

    #[serde(rename = "afrz")]
    AssetFreeze(AssetFreezeTransactionFields),

    #[serde(serialize_with = "application_call_serializer")]
    #[serde(deserialize_with = "application_call_deserializer")]
    #[serde(rename = "appl")]
    ApplicationCall(ApplicationCallTransactionFields),

    #[serde(rename = "keyreg")]
    KeyRegistration(KeyRegistrationTransactionFields),
}

/// Inputs to the fee calculation performed by [`Transaction::assign_fee`].
pub struct FeeParams {
    pub fee_per_byte: u64,
    pub min_fee: u64,
    pub extra_fee: Option<u64>,
    pub max_fee: Option<u64>,
}

// Shared (mutable or immutable) projection of the variant's header field.
macro_rules! project_header {
    ($txn:expr, $($mutability:tt)*) => {
        match $txn {
            Transaction::Payment(fields) => & $($mutability)* fields.header,
            Transaction::AssetTransfer(fields) => & $($mutability)* fields.header,
            Transaction::AssetConfig(fields) => & $($mutability)* fields.header,
            Transaction::AssetFreeze(fields) => & $($mutability)* fields.header,
            Transaction::ApplicationCall(fields) => & $($mutability)* fields.header,
            Transaction::KeyRegistration(fields) => & $($mutability)* fields.header,
        }
    };
}

impl Transaction {
    pub fn header(&self) -> &TransactionHeader {
        project_header!(self,)
    }

    pub fn header_mut(&mut self) -> &mut TransactionHeader {
        project_header!(self, mut)
    }

    /// Calculates and assigns the fee for this transaction, returning the
    /// updated transaction.
    pub fn assign_fee(&self, request: FeeParams) -> Result<Transaction, TransactError> {
        let size_based_fee = match request.fee_per_byte {
            0 => 0,
            fee_per_byte => fee_per_byte * self.estimate_size()? as u64,
        };
        let fee = size_based_fee.max(request.min_fee) + request.extra_fee.unwrap_or(0);

        if let Some(max_fee) = request.max_fee {
            if fee > max_fee {
                return Err(TransactError::InputError {
                    message: format!(
                        "Transaction fee {} µALGO is greater than max fee {} µALGO",
                        fee, max_fee
                    ),
                });
            }
        }

        let mut tx = self.clone();
        tx.header_mut().fee = Some(fee);
        Ok(tx)
    }
}

impl AlgorandMsgpack for Transaction {
    const PREFIX: &'static [u8] = b"TX";
}

impl TransactionId for Transaction {}

impl EstimateTransactionSize for Transaction {
    fn estimate_size(&self) -> Result<usize, TransactError> {
        Ok(self.encode_raw()?.len() + ALGORAND_SIGNATURE_ENCODING_INCR)
    }
}

impl Validate for Transaction {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let header = self.header();
        if header.last_valid < header.first_valid {
            errors.push(format!(
                "Last valid round {} is before first valid round {}",
                header.last_valid, header.first_valid
            ));
        }
        if let Some(ref note) = header.note {
            if note.len() > MAX_NOTE_LENGTH {
                errors.push(format!(
                    "Note cannot exceed {MAX_NOTE_LENGTH} bytes, got {}",
                    note.len()
                ));
            }
        }

        let type_result = match self {
            Transaction::AssetTransfer(fields) => fields.validate(),
            Transaction::AssetConfig(fields) => fields.validate(),
            Transaction::AssetFreeze(fields) => fields.validate(),
            Transaction::KeyRegistration(fields) => fields.validate(),
            Transaction::Payment(_) | Transaction::ApplicationCall(_) => Ok(()),
        };
        if let Err(type_errors) = type_result {
            errors.extend(type_errors);
        }

        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }
}

/// A signed transaction.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct SignedTransaction {
    /// The transaction that has been signed.
    #[serde(rename = "txn")]
    pub transaction: Transaction,

    /// Optional Ed25519 signature authorizing the transaction.
    #[serde(rename = "sig")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(default)]
    pub signature: Option<[u8; ALGORAND_SIGNATURE_BYTE_LENGTH]>,

    /// Optional auth address applicable if the transaction sender is a
    /// rekeyed account.
    #[serde(rename = "sgnr")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub auth_address: Option<Address>,
}

impl AlgorandMsgpack for SignedTransaction {
    const PREFIX: &'static [u8] = b"";

    // Since all transaction fields carry defaults, serde cannot tell which
    // transaction variant the nested `txn` map corresponds with. Decode the
    // transaction separately through Transaction::decode (which checks the
    // type tag) and splice it into the rest of the struct.
    fn decode(bytes: &[u8]) -> Result<Self, TransactError> {
        let value: rmpv::Value = rmp_serde::from_slice(bytes)?;
        let rmpv::Value::Map(entries) = &value else {
            return Err(TransactError::InputError {
                message: format!(
                    "expected signed transaction to be a map, but got a: {:#?}",
                    value.type_id()
                ),
            });
        };

        let txn_value = entries
            .iter()
            .find_map(|(key, value)| (key.as_str() == Some("txn")).then_some(value))
            .ok_or_else(|| TransactError::InputError {
                message: "signed transaction is missing the txn field".to_string(),
            })?;

        let mut txn_buf = Vec::new();
        rmpv::encode::write_value(&mut txn_buf, txn_value)?;

        Ok(SignedTransaction {
            transaction: Transaction::decode(&txn_buf)?,
            ..rmp_serde::from_slice(bytes)?
        })
    }
}

impl TransactionId for SignedTransaction {
    fn id_raw(&self) -> Result<Byte32, TransactError> {
        self.transaction.id_raw()
    }
}

impl EstimateTransactionSize for SignedTransaction {
    fn estimate_size(&self) -> Result<usize, TransactError> {
        Ok(self.encode()?.len())
    }
}

// Only used internally for generating the group id
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct GroupedTransactions {
    #[serde(rename = "txlist")]
    #[serde_as(as = "Vec<Bytes>")]
    pub tx_hashes: Vec<Byte32>,
}

impl AlgorandMsgpack for GroupedTransactions {
    const PREFIX: &'static [u8] = b"TG";
}

/// Computes the group id of a set of transactions without mutating them.
pub fn compute_group(txs: &[Transaction]) -> Result<Byte32, TransactError> {
    if txs.is_empty() {
        return Err(TransactError::InputError {
            message: String::from("Transaction group size cannot be 0"),
        });
    }
    if txs.len() > MAX_TX_GROUP_SIZE {
        return Err(TransactError::InputError {
            message: format!(
                "Transaction group size exceeds the max limit of {}",
                MAX_TX_GROUP_SIZE
            ),
        });
    }

    let mut tx_hashes = Vec::with_capacity(txs.len());
    for tx in txs {
        if tx.header().group.is_some() {
            return Err(TransactError::InputError {
                message: "Transactions must not already be grouped".to_string(),
            });
        }
        tx_hashes.push(tx.id_raw()?);
    }

    Ok(hash(&GroupedTransactions { tx_hashes }.encode()?))
}

/// Operations over a slice of transactions forming an atomic group.
pub trait Transactions {
    fn assign_group(self) -> Result<Vec<Transaction>, TransactError>;
}

impl Transactions for &[Transaction] {
    /// Assigns the computed group id to every transaction in the slice.
    fn assign_group(self) -> Result<Vec<Transaction>, TransactError> {
        let group_id = compute_group(self)?;

        let mut grouped = self.to_vec();
        for tx in &mut grouped {
            tx.header_mut().group = Some(group_id);
        }
        Ok(grouped)
    }
}
