//! Canonical msgpack encoding, hashing and id computation.
//!
//! Algorand requires canonically encoded msgpack: map keys sorted
//! lexicographically and zero values omitted. Zero omission is handled by the
//! serde derives (`skip_serializing_if`); key ordering is enforced here by
//! round-tripping through [`rmpv::Value`].

use crate::transact::constants::{
    ALGORAND_CHECKSUM_BYTE_LENGTH, ALGORAND_PUBLIC_KEY_BYTE_LENGTH, Byte32, HASH_BYTES_LENGTH,
};
use crate::transact::error::TransactError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha512_256};
use std::collections::BTreeMap;

pub fn sort_msgpack_value(value: rmpv::Value) -> rmpv::Value {
    match value {
        rmpv::Value::Map(m) => {
            let mut sorted_map: BTreeMap<String, rmpv::Value> = BTreeMap::new();

            for (k, v) in m {
                if let rmpv::Value::String(key) = k {
                    let key_str = key.into_str().unwrap_or_default();
                    sorted_map.insert(key_str, sort_msgpack_value(v));
                }
            }

            rmpv::Value::Map(
                sorted_map
                    .into_iter()
                    .map(|(k, v)| (rmpv::Value::String(k.into()), v))
                    .collect(),
            )
        }
        rmpv::Value::Array(arr) => {
            rmpv::Value::Array(arr.into_iter().map(sort_msgpack_value).collect())
        }
        v => v,
    }
}

pub fn hash(bytes: &[u8]) -> Byte32 {
    let mut hasher = Sha512_256::new();
    hasher.update(bytes);

    let mut hash_bytes = [0u8; HASH_BYTES_LENGTH];
    hash_bytes.copy_from_slice(&hasher.finalize()[..HASH_BYTES_LENGTH]);
    hash_bytes
}

pub fn pub_key_to_checksum(
    pub_key: &[u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH],
) -> [u8; ALGORAND_CHECKSUM_BYTE_LENGTH] {
    let digest = hash(pub_key);
    let mut checksum = [0u8; ALGORAND_CHECKSUM_BYTE_LENGTH];
    checksum.copy_from_slice(&digest[(HASH_BYTES_LENGTH - ALGORAND_CHECKSUM_BYTE_LENGTH)..]);
    checksum
}

/// Canonical msgpack encoding with a domain-separation prefix for hashing.
pub trait AlgorandMsgpack: Serialize + DeserializeOwned {
    /// Domain separation prefix prepended by [`AlgorandMsgpack::encode`].
    const PREFIX: &'static [u8] = b"TX";

    /// Encodes to canonical msgpack (sorted keys, zero values omitted)
    /// without the domain prefix. This is the form sent over the wire.
    fn encode_raw(&self) -> Result<Vec<u8>, TransactError> {
        let unsorted = rmp_serde::to_vec_named(self)?;
        let value: rmpv::Value = rmp_serde::from_slice(&unsorted)?;
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &sort_msgpack_value(value))?;
        Ok(buf)
    }

    /// Encodes to canonical msgpack with the domain prefix prepended. This
    /// is the form that gets hashed for ids and signatures.
    fn encode(&self) -> Result<Vec<u8>, TransactError> {
        let encoded = self.encode_raw()?;
        let mut buf = Vec::with_capacity(Self::PREFIX.len() + encoded.len());
        buf.extend_from_slice(Self::PREFIX);
        buf.extend_from_slice(&encoded);
        Ok(buf)
    }

    /// Decodes msgpack bytes, tolerating a leading domain prefix.
    fn decode(bytes: &[u8]) -> Result<Self, TransactError> {
        if bytes.is_empty() {
            return Err(TransactError::InputError {
                message: "attempted to decode 0 bytes".to_string(),
            });
        }
        let raw = match bytes.starts_with(Self::PREFIX) && !Self::PREFIX.is_empty() {
            true => &bytes[Self::PREFIX.len()..],
            false => bytes,
        };
        Ok(rmp_serde::from_slice(raw)?)
    }
}

/// Transaction id derivation from the canonical encoding.
pub trait TransactionId: AlgorandMsgpack {
    /// The raw transaction id: SHA-512/256 over the prefixed canonical bytes.
    fn id_raw(&self) -> Result<Byte32, TransactError> {
        Ok(hash(&self.encode()?))
    }

    /// The base32 string form of the transaction id.
    fn id(&self) -> Result<String, TransactError> {
        Ok(base32::encode(
            base32::Alphabet::Rfc4648 { padding: false },
            &self.id_raw()?,
        ))
    }
}

pub trait EstimateTransactionSize {
    fn estimate_size(&self) -> Result<usize, TransactError>;
}

pub fn is_zero<T>(n: &T) -> bool
where
    T: PartialEq + From<u8>,
{
    *n == T::from(0u8)
}

pub fn is_zero_opt<T>(n: &Option<T>) -> bool
where
    T: PartialEq + From<u8>,
{
    n.as_ref().is_none_or(is_zero)
}

pub fn is_zero_addr(addr: &crate::transact::Address) -> bool {
    addr.as_bytes() == &[0u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH]
}

pub fn is_zero_addr_opt(addr: &Option<crate::transact::Address>) -> bool {
    addr.as_ref().is_none_or(is_zero_addr)
}

pub fn is_empty_bytes32_opt(bytes: &Option<Byte32>) -> bool {
    bytes.as_ref().is_none_or(|b| b == &[0u8; 32])
}

pub fn is_empty_string_opt(string: &Option<String>) -> bool {
    string.as_ref().is_none_or(String::is_empty)
}

pub fn is_empty_vec_opt<T>(vec: &Option<Vec<T>>) -> bool {
    vec.as_ref().is_none_or(Vec::is_empty)
}

pub fn is_false_opt(b: &Option<bool>) -> bool {
    b.as_ref().is_none_or(|b| !b)
}
