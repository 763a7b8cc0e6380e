use crate::create_transaction_params;
use crate::transact::{
    Address, AssetConfigTransactionFields, Transaction, TransactionHeader, Validate,
};

create_transaction_params!(
    /// Parameters for creating a new asset.
    #[derive(Clone)]
    pub struct AssetCreateParams {
        /// The total number of base units of the asset to create.
        pub total: u64,
        /// The number of digits after the decimal point, 0 for a
        /// non-divisible asset.
        pub decimals: Option<u32>,
        /// Whether accounts hold the asset frozen by default.
        pub default_frozen: Option<bool>,
        /// The full name of the asset, max 32 bytes.
        pub asset_name: Option<String>,
        /// The short ticker name of the asset, max 8 bytes.
        pub unit_name: Option<String>,
        /// A URL with more information about the asset, max 96 bytes.
        pub url: Option<String>,
        /// A 32-byte commitment to asset metadata.
        pub metadata_hash: Option<[u8; 32]>,
        /// The address that can reconfigure or destroy the asset.
        pub manager: Option<Address>,
        /// The address holding unminted units of the asset.
        pub reserve: Option<Address>,
        /// The address that can freeze or unfreeze holdings.
        pub freeze: Option<Address>,
        /// The address that can claw back holdings.
        pub clawback: Option<Address>,
    }
);

create_transaction_params!(
    /// Parameters for reconfiguring an existing asset's role addresses.
    ///
    /// Omitting a role address permanently removes that capability.
    #[derive(Clone)]
    pub struct AssetConfigParams {
        /// The id of the asset to reconfigure.
        pub asset_id: u64,
        pub manager: Option<Address>,
        pub reserve: Option<Address>,
        pub freeze: Option<Address>,
        pub clawback: Option<Address>,
    }
);

create_transaction_params!(
    /// Parameters for destroying an asset. The sender must be the asset's
    /// manager and must hold the entire supply.
    #[derive(Clone)]
    pub struct AssetDestroyParams {
        /// The id of the asset to destroy.
        pub asset_id: u64,
    }
);

pub fn build_asset_create(
    params: &AssetCreateParams,
    header: TransactionHeader,
) -> Result<Transaction, Vec<String>> {
    let fields = AssetConfigTransactionFields {
        header,
        asset_id: 0,
        total: Some(params.total),
        decimals: params.decimals,
        default_frozen: params.default_frozen,
        asset_name: params.asset_name.clone(),
        unit_name: params.unit_name.clone(),
        url: params.url.clone(),
        metadata_hash: params.metadata_hash,
        manager: params.manager.clone(),
        reserve: params.reserve.clone(),
        freeze: params.freeze.clone(),
        clawback: params.clawback.clone(),
    };
    fields.validate()?;
    Ok(Transaction::AssetConfig(fields))
}

pub fn build_asset_config(params: &AssetConfigParams, header: TransactionHeader) -> Transaction {
    Transaction::AssetConfig(AssetConfigTransactionFields {
        header,
        asset_id: params.asset_id,
        total: None,
        decimals: None,
        default_frozen: None,
        asset_name: None,
        unit_name: None,
        url: None,
        metadata_hash: None,
        manager: params.manager.clone(),
        reserve: params.reserve.clone(),
        freeze: params.freeze.clone(),
        clawback: params.clawback.clone(),
    })
}

pub fn build_asset_destroy(params: &AssetDestroyParams, header: TransactionHeader) -> Transaction {
    Transaction::AssetConfig(AssetConfigTransactionFields {
        header,
        asset_id: params.asset_id,
        total: None,
        decimals: None,
        default_frozen: None,
        asset_name: None,
        unit_name: None,
        url: None,
        metadata_hash: None,
        manager: None,
        reserve: None,
        freeze: None,
        clawback: None,
    })
}
