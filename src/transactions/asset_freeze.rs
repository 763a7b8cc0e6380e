use crate::create_transaction_params;
use crate::transact::{
    Address, AssetFreezeTransactionFields, Transaction, TransactionHeader,
};

create_transaction_params!(
    /// Parameters for freezing an asset held by an account. The sender must
    /// be the asset's freeze address.
    #[derive(Clone)]
    pub struct AssetFreezeParams {
        /// The id of the asset to freeze.
        pub asset_id: u64,
        /// The account whose holding is frozen.
        pub target_address: Address,
    }
);

create_transaction_params!(
    /// Parameters for unfreezing an asset held by an account.
    #[derive(Clone)]
    pub struct AssetUnfreezeParams {
        /// The id of the asset to unfreeze.
        pub asset_id: u64,
        /// The account whose holding is unfrozen.
        pub target_address: Address,
    }
);

pub fn build_asset_freeze(params: &AssetFreezeParams, header: TransactionHeader) -> Transaction {
    Transaction::AssetFreeze(AssetFreezeTransactionFields {
        header,
        asset_id: params.asset_id,
        freeze_target: params.target_address.clone(),
        frozen: true,
    })
}

pub fn build_asset_unfreeze(params: &AssetUnfreezeParams, header: TransactionHeader) -> Transaction {
    Transaction::AssetFreeze(AssetFreezeTransactionFields {
        header,
        asset_id: params.asset_id,
        freeze_target: params.target_address.clone(),
        frozen: false,
    })
}
