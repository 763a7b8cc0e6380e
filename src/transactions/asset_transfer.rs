use crate::create_transaction_params;
use crate::transact::{
    Address, AssetTransferTransactionFields, Transaction, TransactionHeader,
};

create_transaction_params!(
    /// Parameters for transferring an asset between accounts.
    #[derive(Clone)]
    pub struct AssetTransferParams {
        /// The id of the asset to transfer.
        pub asset_id: u64,
        /// The amount to transfer in base units of the asset.
        pub amount: u64,
        /// The address of the account receiving the asset.
        pub receiver: Address,
    }
);

create_transaction_params!(
    /// Parameters for opting an account into an asset.
    #[derive(Clone)]
    pub struct AssetOptInParams {
        /// The id of the asset to opt into.
        pub asset_id: u64,
    }
);

create_transaction_params!(
    /// Parameters for opting an account out of an asset, sending any held
    /// balance to the creator.
    #[derive(Clone)]
    pub struct AssetOptOutParams {
        /// The id of the asset to opt out of.
        pub asset_id: u64,
        /// The address to receive the remaining asset balance, usually the
        /// asset creator.
        pub close_remainder_to: Address,
    }
);

create_transaction_params!(
    /// Parameters for a clawback, moving an asset out of an arbitrary
    /// account. The sender must be the asset's clawback address.
    #[derive(Clone)]
    pub struct AssetClawbackParams {
        /// The id of the asset to claw back.
        pub asset_id: u64,
        /// The amount to transfer in base units of the asset.
        pub amount: u64,
        /// The address of the account receiving the asset.
        pub receiver: Address,
        /// The account the asset is moved out of.
        pub clawback_target: Address,
    }
);

pub fn build_asset_transfer(params: &AssetTransferParams, header: TransactionHeader) -> Transaction {
    Transaction::AssetTransfer(AssetTransferTransactionFields {
        header,
        asset_id: params.asset_id,
        amount: params.amount,
        receiver: params.receiver.clone(),
        asset_sender: None,
        close_remainder_to: None,
    })
}

/// An opt-in is a zero-amount transfer of the asset to the sender itself.
pub fn build_asset_opt_in(params: &AssetOptInParams, header: TransactionHeader) -> Transaction {
    Transaction::AssetTransfer(AssetTransferTransactionFields {
        header: TransactionHeader {
            sender: params.sender.clone(),
            ..header
        },
        asset_id: params.asset_id,
        amount: 0,
        receiver: params.sender.clone(),
        asset_sender: None,
        close_remainder_to: None,
    })
}

/// An opt-out is a zero-amount self-transfer with a close-to address.
pub fn build_asset_opt_out(params: &AssetOptOutParams, header: TransactionHeader) -> Transaction {
    Transaction::AssetTransfer(AssetTransferTransactionFields {
        header: TransactionHeader {
            sender: params.sender.clone(),
            ..header
        },
        asset_id: params.asset_id,
        amount: 0,
        receiver: params.sender.clone(),
        asset_sender: None,
        close_remainder_to: Some(params.close_remainder_to.clone()),
    })
}

pub fn build_asset_clawback(params: &AssetClawbackParams, header: TransactionHeader) -> Transaction {
    Transaction::AssetTransfer(AssetTransferTransactionFields {
        header,
        asset_id: params.asset_id,
        amount: params.amount,
        receiver: params.receiver.clone(),
        asset_sender: Some(params.clawback_target.clone()),
        close_remainder_to: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_for(sender: &Address) -> TransactionHeader {
        TransactionHeader {
            sender: sender.clone(),
            first_valid: 1,
            last_valid: 1000,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_asset_opt_in_targets_sender() {
        let sender = Address([1u8; 32]);
        let params = AssetOptInParams {
            sender: sender.clone(),
            signer: None,
            rekey_to: None,
            note: None,
            lease: None,
            static_fee: None,
            extra_fee: None,
            max_fee: None,
            validity_window: None,
            first_valid_round: None,
            last_valid_round: None,
            asset_id: 1234,
        };

        let txn = build_asset_opt_in(&params, header_for(&sender));
        match txn {
            Transaction::AssetTransfer(fields) => {
                assert_eq!(fields.asset_id, 1234);
                assert_eq!(fields.amount, 0);
                assert_eq!(fields.receiver, sender);
                assert!(fields.close_remainder_to.is_none());
            }
            other => panic!("expected asset transfer, got {:?}", other),
        }
    }

    #[test]
    fn test_build_asset_clawback_sets_asset_sender() {
        let sender = Address([1u8; 32]);
        let target = Address([5u8; 32]);
        let receiver = Address([6u8; 32]);
        let params = AssetClawbackParams {
            sender: sender.clone(),
            signer: None,
            rekey_to: None,
            note: None,
            lease: None,
            static_fee: None,
            extra_fee: None,
            max_fee: None,
            validity_window: None,
            first_valid_round: None,
            last_valid_round: None,
            asset_id: 1234,
            amount: 7,
            receiver: receiver.clone(),
            clawback_target: target.clone(),
        };

        let txn = build_asset_clawback(&params, header_for(&sender));
        match txn {
            Transaction::AssetTransfer(fields) => {
                assert_eq!(fields.asset_sender, Some(target));
                assert_eq!(fields.receiver, receiver);
                assert_eq!(fields.amount, 7);
            }
            other => panic!("expected asset transfer, got {:?}", other),
        }
    }

    #[test]
    fn test_build_asset_opt_out_closes_to_creator() {
        let sender = Address([1u8; 32]);
        let creator = Address([9u8; 32]);
        let params = AssetOptOutParams {
            sender: sender.clone(),
            signer: None,
            rekey_to: None,
            note: None,
            lease: None,
            static_fee: None,
            extra_fee: None,
            max_fee: None,
            validity_window: None,
            first_valid_round: None,
            last_valid_round: None,
            asset_id: 1234,
            close_remainder_to: creator.clone(),
        };

        let txn = build_asset_opt_out(&params, header_for(&sender));
        match txn {
            Transaction::AssetTransfer(fields) => {
                assert_eq!(fields.close_remainder_to, Some(creator));
                assert_eq!(fields.amount, 0);
                assert_eq!(fields.receiver, sender);
            }
            other => panic!("expected asset transfer, got {:?}", other),
        }
    }
}
