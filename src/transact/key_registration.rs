//! Key registration transactions register accounts online or offline for
//! participation in Algorand consensus.

use crate::transact::Validate;
use crate::transact::encode::{is_false_opt, is_zero_opt};
use crate::transact::header::TransactionHeader;
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as, skip_serializing_none};

/// The fields of a key registration transaction.
///
/// An online registration carries the full participation key set; an offline
/// registration carries none of them. Setting `non_participation` marks the
/// account as permanently non-reward-earning.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct KeyRegistrationTransactionFields {
    /// Common transaction header fields.
    #[serde(flatten)]
    pub header: TransactionHeader,

    /// The 32-byte root participation key.
    #[serde(rename = "votekey")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub vote_key: Option<[u8; 32]>,

    /// The 32-byte VRF selection key.
    #[serde(rename = "selkey")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub selection_key: Option<[u8; 32]>,

    /// The 64-byte state proof key.
    #[serde(rename = "sprfkey")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub state_proof_key: Option<[u8; 64]>,

    /// First round the participation key is valid for.
    #[serde(rename = "votefst")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub vote_first: Option<u64>,

    /// Last round the participation key is valid for.
    #[serde(rename = "votelst")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub vote_last: Option<u64>,

    /// Dilution of the 2-level participation key.
    #[serde(rename = "votekd")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub vote_key_dilution: Option<u64>,

    /// Mark the account as non-reward earning.
    #[serde(rename = "nonpart")]
    #[serde(skip_serializing_if = "is_false_opt")]
    #[serde(default)]
    pub non_participation: Option<bool>,
}

impl KeyRegistrationTransactionFields {
    /// Which of the participation fields are present. An online
    /// registration requires all of them.
    fn participation_fields(&self) -> [(&'static str, bool); 6] {
        [
            ("Vote key", self.vote_key.is_some()),
            ("Selection key", self.selection_key.is_some()),
            ("State proof key", self.state_proof_key.is_some()),
            ("Vote first", self.vote_first.is_some()),
            ("Vote last", self.vote_last.is_some()),
            ("Vote key dilution", self.vote_key_dilution.is_some()),
        ]
    }

    fn validate_for_online(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (field, set) in self.participation_fields() {
            if !set {
                errors.push(format!("{field} is required"));
            }
        }

        if let (Some(first), Some(last)) = (self.vote_first, self.vote_last) {
            if first >= last {
                errors.push("Vote first must be less than vote last".to_string());
            }
        }

        if self.non_participation.is_some_and(|v| v) {
            errors
                .push("Online key registration cannot have non participation flag set".to_string());
        }

        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }
}

impl Validate for KeyRegistrationTransactionFields {
    fn validate(&self) -> Result<(), Vec<String>> {
        let is_online = self.participation_fields().iter().any(|(_, set)| *set);

        match is_online {
            true => self.validate_for_online(),
            // Offline (including non-participating) registration carries no
            // participation fields and is inherently valid
            false => Ok(()),
        }
    }
}
