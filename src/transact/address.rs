//! Algorand addresses are base32-encoded strings representing 32 bytes of key
//! material plus a 4-byte checksum.

use crate::transact::constants::{
    ALGORAND_ADDRESS_LENGTH, ALGORAND_CHECKSUM_BYTE_LENGTH, ALGORAND_PUBLIC_KEY_BYTE_LENGTH,
    Byte32,
};
use crate::transact::encode::{hash, pub_key_to_checksum};
use crate::transact::error::TransactError;
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// An Algorand address: the 32 bytes of a public key (or hash digest for
/// application and multisig accounts), without the checksum.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Address(#[serde_as(as = "Bytes")] pub Byte32);

impl Address {
    pub fn as_bytes(&self) -> &Byte32 {
        &self.0
    }

    /// Computes the escrow address of an application.
    pub fn from_app_id(app_id: &u64) -> Self {
        let mut to_hash = b"appID".to_vec();
        to_hash.extend_from_slice(&app_id.to_be_bytes());
        Address(hash(&to_hash))
    }

    /// Returns the base32-encoded string representation, including the checksum.
    pub fn as_str(&self) -> String {
        let mut buffer = [0u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH + ALGORAND_CHECKSUM_BYTE_LENGTH];
        buffer[..ALGORAND_PUBLIC_KEY_BYTE_LENGTH].copy_from_slice(&self.0);
        buffer[ALGORAND_PUBLIC_KEY_BYTE_LENGTH..].copy_from_slice(&self.checksum());

        base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &buffer)
    }

    pub fn checksum(&self) -> [u8; ALGORAND_CHECKSUM_BYTE_LENGTH] {
        pub_key_to_checksum(&self.0)
    }
}

impl FromStr for Address {
    type Err = TransactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ALGORAND_ADDRESS_LENGTH {
            return Err(TransactError::InvalidAddress {
                message: "Algorand address must be exactly 58 characters".into(),
            });
        }
        let decoded = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, s).ok_or_else(
            || TransactError::InvalidAddress {
                message: "Invalid base32 encoding for Algorand address".into(),
            },
        )?;

        let pub_key: [u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH] = decoded
            [..ALGORAND_PUBLIC_KEY_BYTE_LENGTH]
            .try_into()
            .map_err(|_| TransactError::InvalidAddress {
                message: "Could not decode address into 32-byte public key".to_string(),
            })?;
        let checksum: [u8; ALGORAND_CHECKSUM_BYTE_LENGTH] = decoded
            [ALGORAND_PUBLIC_KEY_BYTE_LENGTH..]
            .try_into()
            .map_err(|_| TransactError::InvalidAddress {
                message: "Could not get 4-byte checksum from decoded address".to_string(),
            })?;

        if pub_key_to_checksum(&pub_key) != checksum {
            return Err(TransactError::InvalidAddress {
                message: "Checksum is invalid".to_string(),
            });
        }
        Ok(Address(pub_key))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_id() {
        let address = Address::from_app_id(&123u64);
        assert_eq!(
            address.to_string(),
            "WRBMNT66ECE2AOYKM76YVWIJMBW6Z3XCQZOKG5BL7NISAQC2LBGEKTZLRM"
        );
    }

    #[test]
    fn test_round_trip() {
        let address = Address([7u8; 32]);
        let parsed: Address = address.as_str().parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_invalid_checksum_rejected() {
        let mut encoded = Address([7u8; 32]).as_str();
        // Flip the first character to corrupt the key without changing length.
        let replacement = if encoded.starts_with('A') { "B" } else { "A" };
        encoded.replace_range(0..1, replacement);
        assert!(encoded.parse::<Address>().is_err());
    }
}
