use crate::transact::{Address, SignedTransaction, Transaction};
use async_trait::async_trait;
use derive_more::Debug;
use ed25519_dalek::{Signer, SigningKey};
use std::sync::Arc;

/// Signs transactions selected by index out of a larger group.
///
/// A signer is handed the whole transaction list plus the indexes it owns so
/// implementations that can batch-sign (one key signing many transactions)
/// are invoked once rather than once per transaction.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        indexes: &[usize],
    ) -> Result<Vec<SignedTransaction>, String>;

    async fn sign_transaction(&self, transaction: &Transaction) -> Result<SignedTransaction, String> {
        let result = self
            .sign_transactions(&[transaction.clone()], &[0])
            .await?;
        Ok(result[0].clone())
    }
}

/// Resolves the signer responsible for a sender address when a queued
/// transaction carries none of its own.
#[async_trait]
pub trait SignerResolver: Send + Sync {
    async fn get_signer(&self, address: &Address) -> Option<Arc<dyn TransactionSigner>>;
}

/// A resolver that knows no signers. Useful when every queued transaction
/// carries its own signer, or for simulate-only composers.
pub struct DefaultSignerResolver;

#[async_trait]
impl SignerResolver for DefaultSignerResolver {
    async fn get_signer(&self, _address: &Address) -> Option<Arc<dyn TransactionSigner>> {
        None
    }
}

/// Produces structurally valid signed transactions carrying a zero signature.
///
/// The node accepts these for simulation when `allow_empty_signatures` is
/// set, which is how group analysis runs without real keys.
pub struct EmptySigner {}

#[async_trait]
impl TransactionSigner for EmptySigner {
    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        indexes: &[usize],
    ) -> Result<Vec<SignedTransaction>, String> {
        indexes
            .iter()
            .map(|&idx| {
                if idx < transactions.len() {
                    Ok(SignedTransaction {
                        transaction: transactions[idx].clone(),
                        signature: Some([0; 64]),
                        auth_address: None,
                    })
                } else {
                    Err(format!("Index {} out of bounds for transactions", idx))
                }
            })
            .collect()
    }
}

#[async_trait]
impl SignerResolver for EmptySigner {
    async fn get_signer(&self, _address: &Address) -> Option<Arc<dyn TransactionSigner>> {
        Some(Arc::new(EmptySigner {}))
    }
}

/// An ed25519 keypair signer.
pub struct KeyPairSigner {
    signing_key: SigningKey,
}

impl KeyPairSigner {
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// The address derived from the keypair's public key.
    pub fn address(&self) -> Address {
        Address(self.signing_key.verifying_key().to_bytes())
    }
}

#[async_trait]
impl TransactionSigner for KeyPairSigner {
    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        indexes: &[usize],
    ) -> Result<Vec<SignedTransaction>, String> {
        use crate::transact::AlgorandMsgpack;

        indexes
            .iter()
            .map(|&idx| {
                let transaction = transactions
                    .get(idx)
                    .ok_or_else(|| format!("Index {} out of bounds for transactions", idx))?;
                let encoded = transaction.encode().map_err(|e| e.to_string())?;
                let signature = self.signing_key.sign(&encoded);
                // Rekeyed senders report the actual signing address
                let auth_address = (transaction.header().sender != self.address())
                    .then(|| self.address());

                Ok(SignedTransaction {
                    transaction: transaction.clone(),
                    signature: Some(signature.to_bytes()),
                    auth_address,
                })
            })
            .collect()
    }
}

/// A transaction paired with the signer that will authorize it.
#[derive(Debug, Clone)]
pub struct TransactionWithSigner {
    pub transaction: Transaction,
    #[debug(skip)]
    pub signer: Arc<dyn TransactionSigner>,
}

/// Expands a parameter struct with the fields common to every transaction
/// kind, followed by the kind-specific fields.
#[macro_export]
macro_rules! create_transaction_params {
    (
        $(#[$struct_attr:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_attr:meta])*
                pub $field:ident: $field_type:ty,
            )*
        }
    ) => {
        $(#[$struct_attr])*
        #[derive(derive_more::Debug)]
        pub struct $name {
            /// The address of the account sending the transaction.
            pub sender: $crate::transact::Address,
            #[debug(skip)]
            /// A signer used to sign transaction(s); if not specified then
            /// an attempt will be made to resolve a signer for the given
            /// `sender` at build time.
            pub signer: Option<std::sync::Arc<dyn $crate::transactions::common::TransactionSigner>>,
            /// Change the signing key of the sender to the given address.
            pub rekey_to: Option<$crate::transact::Address>,
            /// Note to attach to the transaction. Max of 1000 bytes.
            pub note: Option<Vec<u8>>,
            /// Prevent multiple transactions with the same lease being
            /// included within the validity window.
            pub lease: Option<[u8; 32]>,
            /// The static transaction fee. In most cases you want to use
            /// extra fee unless setting the fee to 0 to be covered by
            /// another transaction.
            pub static_fee: Option<u64>,
            /// The fee to pay IN ADDITION to the suggested fee. Useful for
            /// manually covering inner transaction fees.
            pub extra_fee: Option<u64>,
            /// Throw an error if the fee for the transaction is more than
            /// this amount; prevents overspending on fees during high
            /// congestion periods.
            pub max_fee: Option<u64>,
            /// How many rounds the transaction should be valid for, if not
            /// specified then the default validity window will be used.
            pub validity_window: Option<u32>,
            /// Set the first round this transaction is valid.
            /// If left undefined, the value from algod will be used.
            pub first_valid_round: Option<u64>,
            /// The last round this transaction is valid. It is recommended
            /// to use validity window instead.
            pub last_valid_round: Option<u64>,
            // Specific fields
            $(
                $(#[$field_attr])*
                pub $field: $field_type,
            )*
        }
    };
}
