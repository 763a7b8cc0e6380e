use crate::create_transaction_params;
use crate::transact::{
    Address, PaymentTransactionFields, Transaction, TransactionHeader,
};

create_transaction_params!(
    /// Parameters for a payment transaction.
    #[derive(Clone)]
    pub struct PaymentParams {
        /// The address of the account receiving the payment.
        pub receiver: Address,
        /// The amount to pay in µALGO.
        pub amount: u64,
    }
);

create_transaction_params!(
    /// Parameters for closing an account, sending its full balance to
    /// another address.
    #[derive(Clone)]
    pub struct AccountCloseParams {
        /// The address to receive the remaining balance.
        pub close_remainder_to: Address,
    }
);

pub fn build_payment(params: &PaymentParams, header: TransactionHeader) -> Transaction {
    Transaction::Payment(PaymentTransactionFields {
        header,
        receiver: params.receiver.clone(),
        amount: params.amount,
        close_remainder_to: None,
    })
}

/// An account close is a zero-amount self-payment carrying a close-to
/// address.
pub fn build_account_close(params: &AccountCloseParams, header: TransactionHeader) -> Transaction {
    Transaction::Payment(PaymentTransactionFields {
        header: TransactionHeader {
            sender: params.sender.clone(),
            ..header
        },
        receiver: params.sender.clone(),
        amount: 0,
        close_remainder_to: Some(params.close_remainder_to.clone()),
    })
}
