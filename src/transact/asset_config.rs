//! Asset configuration transactions create, reconfigure, or destroy
//! Algorand Standard Assets.
//!
//! The wire format nests the asset parameters under an `apar` map while the
//! public struct keeps them flat, so serialization goes through a private
//! adapter struct.

use crate::transact::Address;
use crate::transact::Validate;
use crate::transact::encode::{is_false_opt, is_zero, is_zero_addr_opt, is_zero_opt};
use crate::transact::header::TransactionHeader;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{Bytes, serde_as, skip_serializing_none};

/// Applies a callback macro to the list of nested asset parameter fields,
/// so the flat/nested conversions spell the list out only once.
macro_rules! for_each_asset_param {
    ($callback:ident) => {
        $callback!(
            total,
            decimals,
            default_frozen,
            asset_name,
            unit_name,
            url,
            metadata_hash,
            manager,
            reserve,
            freeze,
            clawback
        )
    };
}

// The `apar` map of the wire format.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct AssetParams {
    #[serde(rename = "t")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub total: Option<u64>,

    #[serde(rename = "dc")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    pub decimals: Option<u32>,

    #[serde(rename = "df")]
    #[serde(skip_serializing_if = "is_false_opt")]
    #[serde(default)]
    pub default_frozen: Option<bool>,

    #[serde(rename = "an")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub asset_name: Option<String>,

    #[serde(rename = "un")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub unit_name: Option<String>,

    #[serde(rename = "au")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub url: Option<String>,

    #[serde(rename = "am")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub metadata_hash: Option<[u8; 32]>,

    #[serde(rename = "m")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub manager: Option<Address>,

    #[serde(rename = "r")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub reserve: Option<Address>,

    #[serde(rename = "f")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub freeze: Option<Address>,

    #[serde(rename = "c")]
    #[serde(skip_serializing_if = "is_zero_addr_opt")]
    #[serde(default)]
    pub clawback: Option<Address>,
}

/// The fields of an asset configuration transaction.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct AssetConfigTransactionFields {
    /// Common transaction header fields.
    pub header: TransactionHeader,

    /// ID of the asset to operate on. 0 for asset creation; the existing
    /// asset id for reconfigure or destroy.
    pub asset_id: u64,

    /// The total amount of the smallest divisible unit to create.
    /// Required when creating a new asset; immutable afterwards.
    pub total: Option<u64>,

    /// The amount of decimal places the asset should have, up to 19.
    /// Immutable after creation.
    pub decimals: Option<u32>,

    /// Whether the asset is frozen by default for all accounts.
    /// Immutable after creation.
    pub default_frozen: Option<bool>,

    /// The optional name of the asset. Max 32 bytes, immutable after
    /// creation.
    pub asset_name: Option<String>,

    /// The optional name of a unit of the asset. Max 8 bytes, immutable
    /// after creation.
    pub unit_name: Option<String>,

    /// Optional URL where more information about the asset can be found.
    /// Max 96 bytes, immutable after creation.
    pub url: Option<String>,

    /// 32-byte hash of metadata relevant to the asset. Immutable after
    /// creation.
    pub metadata_hash: Option<[u8; 32]>,

    /// The account that can reconfigure and destroy the asset.
    /// If unset the asset becomes permanently immutable.
    pub manager: Option<Address>,

    /// The account holding the uncirculated supply of the asset.
    pub reserve: Option<Address>,

    /// The account that can freeze or unfreeze holdings of this asset.
    pub freeze: Option<Address>,

    /// The account that can clawback holdings of this asset.
    pub clawback: Option<Address>,
}

#[serde_as]
#[derive(Serialize, Deserialize)]
struct AssetConfigWire {
    #[serde(flatten)]
    header: TransactionHeader,

    #[serde(rename = "caid")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    asset_id: u64,

    #[serde(rename = "apar")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    asset_params: Option<AssetParams>,
}

impl AssetConfigTransactionFields {
    /// The nested `apar` params, or `None` when every param field is unset
    /// (a destroy transaction).
    fn asset_params(&self) -> Option<AssetParams> {
        macro_rules! collect {
            ($($field:ident),*) => {{
                let any_set = $(self.$field.is_some())||*;
                any_set.then(|| AssetParams {
                    $($field: self.$field.clone(),)*
                })
            }};
        }
        for_each_asset_param!(collect)
    }

    fn apply_asset_params(&mut self, params: AssetParams) {
        macro_rules! apply {
            ($($field:ident),*) => {
                $(self.$field = params.$field;)*
            };
        }
        for_each_asset_param!(apply);
    }
}

pub fn asset_config_serializer<S>(
    fields: &AssetConfigTransactionFields,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    AssetConfigWire {
        header: fields.header.clone(),
        asset_id: fields.asset_id,
        asset_params: fields.asset_params(),
    }
    .serialize(serializer)
}

pub fn asset_config_deserializer<'de, D>(
    deserializer: D,
) -> Result<AssetConfigTransactionFields, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = AssetConfigWire::deserialize(deserializer)?;

    let mut fields = AssetConfigTransactionFields {
        header: wire.header,
        asset_id: wire.asset_id,
        ..Default::default()
    };
    if let Some(params) = wire.asset_params {
        fields.apply_asset_params(params);
    }

    Ok(fields)
}

impl AssetConfigTransactionFields {
    fn validate_for_creation(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.total.is_none() {
            errors.push("Total is required".to_string());
        }
        if self.decimals.is_some_and(|decimals| decimals > 19) {
            errors.push("Decimals cannot exceed 19 decimal places".to_string());
        }
        for (value, limit, what) in [
            (&self.unit_name, 8, "Unit name"),
            (&self.asset_name, 32, "Asset name"),
            (&self.url, 96, "URL"),
        ] {
            if value.as_ref().is_some_and(|v| v.len() > limit) {
                errors.push(format!("{} cannot exceed {} bytes", what, limit));
            }
        }

        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }

    fn validate_for_reconfigure(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (field, set) in [
            ("total", self.total.is_some()),
            ("decimals", self.decimals.is_some()),
            ("default_frozen", self.default_frozen.is_some()),
            ("asset_name", self.asset_name.is_some()),
            ("unit_name", self.unit_name.is_some()),
            ("url", self.url.is_some()),
            ("metadata_hash", self.metadata_hash.is_some()),
        ] {
            if set {
                errors.push(format!("Field {field} is immutable after asset creation"));
            }
        }

        match errors.is_empty() {
            true => Ok(()),
            false => Err(errors),
        }
    }
}

impl Validate for AssetConfigTransactionFields {
    fn validate(&self) -> Result<(), Vec<String>> {
        if self.asset_id == 0 {
            return self.validate_for_creation();
        }

        // Reconfigure may only touch the role addresses; destroy carries no
        // params at all
        let touches_immutable = self.total.is_some()
            || self.decimals.is_some()
            || self.default_frozen.is_some()
            || self.asset_name.is_some()
            || self.unit_name.is_some()
            || self.url.is_some()
            || self.metadata_hash.is_some();

        match touches_immutable {
            true => self.validate_for_reconfigure(),
            false => Ok(()),
        }
    }
}
