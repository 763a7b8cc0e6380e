use crate::create_transaction_params;
use crate::transact::{
    KeyRegistrationTransactionFields, Transaction, TransactionHeader,
};

create_transaction_params!(
    /// Parameters for registering an account online for consensus
    /// participation.
    #[derive(Clone)]
    pub struct OnlineKeyRegistrationParams {
        /// The root participation public key.
        pub vote_key: [u8; 32],
        /// The VRF public key.
        pub selection_key: [u8; 32],
        /// The first round the participation keys are valid.
        pub vote_first: u64,
        /// The last round the participation keys are valid.
        pub vote_last: u64,
        /// The dilution of the second-level participation keys.
        pub vote_key_dilution: u64,
        /// The 64-byte state proof public key commitment.
        pub state_proof_key: Option<[u8; 64]>,
    }
);

create_transaction_params!(
    /// Parameters for taking an account offline from consensus.
    #[derive(Clone)]
    pub struct OfflineKeyRegistrationParams {}
);

create_transaction_params!(
    /// Parameters for permanently marking an account as non-participating.
    /// Unlike going offline, this cannot be reversed.
    #[derive(Clone)]
    pub struct NonParticipationKeyRegistrationParams {}
);

pub fn build_online_key_registration(
    params: &OnlineKeyRegistrationParams,
    header: TransactionHeader,
) -> Transaction {
    Transaction::KeyRegistration(KeyRegistrationTransactionFields {
        header,
        vote_key: Some(params.vote_key),
        selection_key: Some(params.selection_key),
        state_proof_key: params.state_proof_key,
        vote_first: Some(params.vote_first),
        vote_last: Some(params.vote_last),
        vote_key_dilution: Some(params.vote_key_dilution),
        non_participation: None,
    })
}

pub fn build_offline_key_registration(
    _params: &OfflineKeyRegistrationParams,
    header: TransactionHeader,
) -> Transaction {
    Transaction::KeyRegistration(KeyRegistrationTransactionFields {
        header,
        vote_key: None,
        selection_key: None,
        state_proof_key: None,
        vote_first: None,
        vote_last: None,
        vote_key_dilution: None,
        non_participation: None,
    })
}

pub fn build_non_participation_key_registration(
    _params: &NonParticipationKeyRegistrationParams,
    header: TransactionHeader,
) -> Transaction {
    Transaction::KeyRegistration(KeyRegistrationTransactionFields {
        header,
        vote_key: None,
        selection_key: None,
        state_proof_key: None,
        vote_first: None,
        vote_last: None,
        vote_key_dilution: None,
        non_participation: Some(true),
    })
}
