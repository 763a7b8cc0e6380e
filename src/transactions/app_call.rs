use super::composer::ComposerError;
use crate::abi::{ABIMethod, ABIMethodArgType, ABIReferenceValue, ABIType, ABIValue, BitSize};
use crate::create_transaction_params;
use crate::transact::{
    Address, ApplicationCallTransactionFields, BoxReference, OnApplicationComplete, StateSchema,
    Transaction, TransactionHeader,
};
use crate::transactions::common::{TransactionSigner, TransactionWithSigner};
use crate::transactions::{
    AccountCloseParams, AssetClawbackParams, AssetConfigParams, AssetCreateParams,
    AssetDestroyParams, AssetFreezeParams, AssetOptInParams, AssetOptOutParams,
    AssetTransferParams, AssetUnfreezeParams, NonParticipationKeyRegistrationParams,
    OfflineKeyRegistrationParams, OnlineKeyRegistrationParams, PaymentParams,
};
use derive_more::Debug;
use num_bigint::BigUint;
use std::str::FromStr;

/// An argument to an ABI method call.
///
/// Transaction-typed arguments (raw transactions, transactions with signers,
/// any params kind, nested method calls) are not encoded; they are lifted
/// into the group immediately before the method call transaction.
#[derive(Debug, Clone)]
pub enum AppMethodCallArg {
    ABIValue(ABIValue),
    ABIReference(ABIReferenceValue),
    /// Placeholder for a transaction-typed argument. Not encoded; satisfied
    /// by a transaction included in the same group (extracted from other
    /// method call arguments).
    TransactionPlaceholder,
    Transaction(Transaction),
    TransactionWithSigner(TransactionWithSigner),
    Payment(PaymentParams),
    AccountClose(AccountCloseParams),
    AssetTransfer(AssetTransferParams),
    AssetOptIn(AssetOptInParams),
    AssetOptOut(AssetOptOutParams),
    AssetClawback(AssetClawbackParams),
    AssetCreate(AssetCreateParams),
    AssetConfig(AssetConfigParams),
    AssetDestroy(AssetDestroyParams),
    AssetFreeze(AssetFreezeParams),
    AssetUnfreeze(AssetUnfreezeParams),
    AppCall(AppCallParams),
    AppCreateCall(AppCreateParams),
    AppUpdateCall(AppUpdateParams),
    AppDeleteCall(AppDeleteParams),
    AppCallMethodCall(AppCallMethodCallParams),
    AppCreateMethodCall(AppCreateMethodCallParams),
    AppUpdateMethodCall(AppUpdateMethodCallParams),
    AppDeleteMethodCall(AppDeleteMethodCallParams),
    OnlineKeyRegistration(OnlineKeyRegistrationParams),
    OfflineKeyRegistration(OfflineKeyRegistrationParams),
    NonParticipationKeyRegistration(NonParticipationKeyRegistrationParams),
}

/// A method call argument after transaction-typed arguments have been
/// extracted into the group.
#[derive(Debug, Clone)]
pub enum ProcessedAppMethodCallArg {
    ABIValue(ABIValue),
    ABIReference(ABIReferenceValue),
    TransactionPlaceholder,
}

/// Restricts the method call params argument type to the raw and processed
/// argument enums.
mod sealed {
    pub trait ValidMethodCallArgSealed {}
    impl ValidMethodCallArgSealed for super::AppMethodCallArg {}
    impl ValidMethodCallArgSealed for super::ProcessedAppMethodCallArg {}
}
pub trait ValidMethodCallArg: sealed::ValidMethodCallArgSealed {}

impl ValidMethodCallArg for AppMethodCallArg {}
impl ValidMethodCallArg for ProcessedAppMethodCallArg {}

create_transaction_params!(
    /// Parameters for calling an existing app.
    #[derive(Clone, Default)]
    pub struct AppCallParams {
        /// ID of the app being called.
        pub app_id: u64,
        /// Defines what additional actions occur with the transaction.
        pub on_complete: OnApplicationComplete,
        /// Transaction specific arguments available in the app's
        /// approval program and clear state program.
        pub args: Option<Vec<Vec<u8>>>,
        /// List of accounts in addition to the sender that may be accessed
        /// from the app's approval program and clear state program.
        pub account_references: Option<Vec<Address>>,
        /// List of apps in addition to the current app that may be called
        /// from the app's approval program and clear state program.
        pub app_references: Option<Vec<u64>>,
        /// Lists the assets whose parameters may be accessed by this app's
        /// approval program and clear state program.
        pub asset_references: Option<Vec<u64>>,
        /// The boxes that should be made available for the runtime of the program.
        pub box_references: Option<Vec<BoxReference>>,
    }
);

create_transaction_params!(
    /// Parameters for creating an app.
    #[derive(Clone, Default)]
    pub struct AppCreateParams {
        /// Defines what additional actions occur with the transaction.
        pub on_complete: OnApplicationComplete,
        /// Logic executed for every app call transaction, except when
        /// on-completion is set to "clear".
        pub approval_program: Vec<u8>,
        /// Logic executed for app call transactions with on-completion set
        /// to "clear". Clear state programs cannot reject the transaction.
        pub clear_state_program: Vec<u8>,
        /// Holds the maximum number of global state values.
        /// This cannot be changed after creation.
        pub global_state_schema: Option<StateSchema>,
        /// Holds the maximum number of local state values.
        /// This cannot be changed after creation.
        pub local_state_schema: Option<StateSchema>,
        /// Number of additional 2048-byte pages allocated to the app's
        /// programs. This cannot be changed after creation.
        pub extra_program_pages: Option<u64>,
        /// Transaction specific arguments available in the app's
        /// approval program and clear state program.
        pub args: Option<Vec<Vec<u8>>>,
        /// List of accounts in addition to the sender that may be accessed
        /// from the app's approval program and clear state program.
        pub account_references: Option<Vec<Address>>,
        /// List of apps in addition to the current app that may be called
        /// from the app's approval program and clear state program.
        pub app_references: Option<Vec<u64>>,
        /// Lists the assets whose parameters may be accessed by this app's
        /// approval program and clear state program.
        pub asset_references: Option<Vec<u64>>,
        /// The boxes that should be made available for the runtime of the program.
        pub box_references: Option<Vec<BoxReference>>,
    }
);

create_transaction_params!(
    /// Parameters for updating an app's programs.
    #[derive(Clone, Default)]
    pub struct AppUpdateParams {
        /// ID of the app being updated.
        pub app_id: u64,
        /// The new approval program.
        pub approval_program: Vec<u8>,
        /// The new clear state program.
        pub clear_state_program: Vec<u8>,
        /// Transaction specific arguments available in the app's
        /// approval program and clear state program.
        pub args: Option<Vec<Vec<u8>>>,
        /// List of accounts in addition to the sender that may be accessed
        /// from the app's approval program and clear state program.
        pub account_references: Option<Vec<Address>>,
        /// List of apps in addition to the current app that may be called
        /// from the app's approval program and clear state program.
        pub app_references: Option<Vec<u64>>,
        /// Lists the assets whose parameters may be accessed by this app's
        /// approval program and clear state program.
        pub asset_references: Option<Vec<u64>>,
        /// The boxes that should be made available for the runtime of the program.
        pub box_references: Option<Vec<BoxReference>>,
    }
);

create_transaction_params!(
    /// Parameters for deleting an app.
    #[derive(Clone, Default)]
    pub struct AppDeleteParams {
        /// ID of the app being deleted.
        pub app_id: u64,
        /// Transaction specific arguments available in the app's
        /// approval program and clear state program.
        pub args: Option<Vec<Vec<u8>>>,
        /// List of accounts in addition to the sender that may be accessed
        /// from the app's approval program and clear state program.
        pub account_references: Option<Vec<Address>>,
        /// List of apps in addition to the current app that may be called
        /// from the app's approval program and clear state program.
        pub app_references: Option<Vec<u64>>,
        /// Lists the assets whose parameters may be accessed by this app's
        /// approval program and clear state program.
        pub asset_references: Option<Vec<u64>>,
        /// The boxes that should be made available for the runtime of the program.
        pub box_references: Option<Vec<BoxReference>>,
    }
);

fn process_app_method_call_args(args: &[AppMethodCallArg]) -> Vec<ProcessedAppMethodCallArg> {
    args.iter()
        .map(|arg| match arg {
            AppMethodCallArg::ABIValue(value) => ProcessedAppMethodCallArg::ABIValue(value.clone()),
            AppMethodCallArg::ABIReference(value) => {
                ProcessedAppMethodCallArg::ABIReference(value.clone())
            }
            _ => ProcessedAppMethodCallArg::TransactionPlaceholder,
        })
        .collect()
}

/// Common behavior of the processed method call params kinds, as consumed by
/// the shared builder.
trait AppMethodCallCommonParams {
    /// The app the call targets on chain; zero for creation.
    fn app_id(&self) -> u64;
    fn method(&self) -> &ABIMethod;
    fn args(&self) -> &[ProcessedAppMethodCallArg];
    fn account_references(&self) -> Option<&Vec<Address>>;
    fn app_references(&self) -> Option<&Vec<u64>>;
    fn asset_references(&self) -> Option<&Vec<u64>>;
}

/// Defines a method call params struct: the shared transaction and method
/// fields plus the per-kind `$extra` fields, together with its `Default`,
/// the raw-to-processed `From` conversion and the common-params accessors.
macro_rules! create_method_call_params {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($(#[$extra_meta:meta])* pub $extra:ident: $extra_ty:ty,)*
        }
        app id is |$this:ident| $app_id:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name<T = AppMethodCallArg>
        where
            T: ValidMethodCallArg,
        {
            /// The address of the account sending the transaction.
            pub sender: Address,
            /// A signer used to sign transaction(s); if not specified then
            /// an attempt will be made to resolve a signer for the given
            /// `sender` at build time.
            #[debug(skip)]
            pub signer: Option<std::sync::Arc<dyn TransactionSigner>>,
            /// Change the signing key of the sender to the given address.
            pub rekey_to: Option<Address>,
            /// Note to attach to the transaction. Max of 1000 bytes.
            pub note: Option<Vec<u8>>,
            /// Prevent multiple transactions with the same lease being
            /// included within the validity window.
            pub lease: Option<[u8; 32]>,
            /// The static transaction fee.
            pub static_fee: Option<u64>,
            /// The fee to pay IN ADDITION to the suggested fee.
            pub extra_fee: Option<u64>,
            /// Throw an error if the fee for the transaction is more than
            /// this amount.
            pub max_fee: Option<u64>,
            /// How many rounds the transaction should be valid for.
            pub validity_window: Option<u32>,
            /// Set the first round this transaction is valid.
            pub first_valid_round: Option<u64>,
            /// The last round this transaction is valid.
            pub last_valid_round: Option<u64>,
            /// The ABI method to call.
            pub method: ABIMethod,
            /// The method arguments.
            pub args: Vec<T>,
            /// List of accounts in addition to the sender that may be
            /// accessed from the app's programs.
            pub account_references: Option<Vec<Address>>,
            /// List of apps in addition to the current app that may be
            /// called from the app's programs.
            pub app_references: Option<Vec<u64>>,
            /// Lists the assets whose parameters may be accessed by the
            /// app's programs.
            pub asset_references: Option<Vec<u64>>,
            /// The boxes that should be made available for the runtime of
            /// the program.
            pub box_references: Option<Vec<BoxReference>>,
            $($(#[$extra_meta])* pub $extra: $extra_ty,)*
        }

        impl<T: ValidMethodCallArg> Default for $name<T> {
            fn default() -> Self {
                Self {
                    sender: Address::default(),
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
                    method: ABIMethod::default(),
                    args: Vec::new(),
                    account_references: None,
                    app_references: None,
                    asset_references: None,
                    box_references: None,
                    $($extra: Default::default(),)*
                }
            }
        }

        impl From<&$name> for $name<ProcessedAppMethodCallArg> {
            fn from(params: &$name) -> Self {
                Self {
                    sender: params.sender.clone(),
                    signer: params.signer.clone(),
                    rekey_to: params.rekey_to.clone(),
                    note: params.note.clone(),
                    lease: params.lease,
                    static_fee: params.static_fee,
                    extra_fee: params.extra_fee,
                    max_fee: params.max_fee,
                    validity_window: params.validity_window,
                    first_valid_round: params.first_valid_round,
                    last_valid_round: params.last_valid_round,
                    method: params.method.clone(),
                    args: process_app_method_call_args(&params.args),
                    account_references: params.account_references.clone(),
                    app_references: params.app_references.clone(),
                    asset_references: params.asset_references.clone(),
                    box_references: params.box_references.clone(),
                    $($extra: params.$extra.clone(),)*
                }
            }
        }

        impl AppMethodCallCommonParams for $name<ProcessedAppMethodCallArg> {
            fn app_id(&self) -> u64 {
                let $this = self;
                $app_id
            }

            fn method(&self) -> &ABIMethod {
                &self.method
            }

            fn args(&self) -> &[ProcessedAppMethodCallArg] {
                &self.args
            }

            fn account_references(&self) -> Option<&Vec<Address>> {
                self.account_references.as_ref()
            }

            fn app_references(&self) -> Option<&Vec<u64>> {
                self.app_references.as_ref()
            }

            fn asset_references(&self) -> Option<&Vec<u64>> {
                self.asset_references.as_ref()
            }
        }
    };
}

create_method_call_params!(
    /// Parameters for calling an ABI method on an existing app.
    pub struct AppCallMethodCallParams {
        /// ID of the app being called.
        pub app_id: u64,
        /// Defines what additional actions occur with the transaction.
        pub on_complete: OnApplicationComplete,
    }
    app id is |this| this.app_id
);

create_method_call_params!(
    /// Parameters for creating an app via an ABI method call.
    pub struct AppCreateMethodCallParams {
        /// Defines what additional actions occur with the transaction.
        pub on_complete: OnApplicationComplete,
        /// Logic executed for every app call transaction, except when
        /// on-completion is set to "clear".
        pub approval_program: Vec<u8>,
        /// Logic executed for app call transactions with on-completion set
        /// to "clear".
        pub clear_state_program: Vec<u8>,
        /// Holds the maximum number of global state values.
        pub global_state_schema: Option<StateSchema>,
        /// Holds the maximum number of local state values.
        pub local_state_schema: Option<StateSchema>,
        /// Number of additional 2048-byte pages allocated to the app's
        /// programs.
        pub extra_program_pages: Option<u64>,
    }
    app id is |_this| 0
);

create_method_call_params!(
    /// Parameters for updating an app via an ABI method call.
    pub struct AppUpdateMethodCallParams {
        /// ID of the app being updated.
        pub app_id: u64,
        /// The new approval program.
        pub approval_program: Vec<u8>,
        /// The new clear state program.
        pub clear_state_program: Vec<u8>,
    }
    app id is |this| this.app_id
);

create_method_call_params!(
    /// Parameters for deleting an app via an ABI method call.
    pub struct AppDeleteMethodCallParams {
        /// ID of the app being deleted.
        pub app_id: u64,
    }
    app id is |this| this.app_id
);

// 14+ args trigger tuple packing, excluding the method selector (arg 0)
const ARGS_TUPLE_PACKING_THRESHOLD: usize = 14;

/// The account, app and asset reference arrays of an app call while they are
/// being assembled from caller-declared lists and reference-typed arguments.
struct ReferenceArrays {
    accounts: Vec<Address>,
    apps: Vec<u64>,
    assets: Vec<u64>,
}

impl ReferenceArrays {
    fn seeded_from<T: AppMethodCallCommonParams>(params: &T) -> Self {
        Self {
            accounts: params.account_references().cloned().unwrap_or_default(),
            apps: params.app_references().cloned().unwrap_or_default(),
            assets: params.asset_references().cloned().unwrap_or_default(),
        }
    }

    /// Folds every reference-typed argument into the arrays. The sender and
    /// the called app occupy implicit slots and are never added.
    fn collect(
        &mut self,
        sender: &Address,
        app_id: u64,
        args: &[ProcessedAppMethodCallArg],
    ) -> Result<(), ComposerError> {
        for arg in args {
            let ProcessedAppMethodCallArg::ABIReference(reference) = arg else {
                continue;
            };
            match reference {
                ABIReferenceValue::Account(raw) => {
                    let address = parse_account_reference(raw)?;
                    if address != *sender && !self.accounts.contains(&address) {
                        self.accounts.push(address);
                    }
                }
                ABIReferenceValue::Application(id) => {
                    if *id != app_id && !self.apps.contains(id) {
                        self.apps.push(*id);
                    }
                }
                ABIReferenceValue::Asset(id) => {
                    if !self.assets.contains(id) {
                        self.assets.push(*id);
                    }
                }
            }
        }
        Ok(())
    }

    /// The uint8 value a reference argument encodes to. The sender and the
    /// called app map to 0; other accounts and apps shift up by one, while
    /// assets index their array directly.
    fn index_of(
        &self,
        reference: &ABIReferenceValue,
        sender: &Address,
        app_id: u64,
    ) -> Result<u8, ComposerError> {
        match reference {
            ABIReferenceValue::Account(raw) => {
                let address = parse_account_reference(raw)?;
                if address == *sender {
                    return Ok(0);
                }
                self.accounts
                    .iter()
                    .position(|candidate| *candidate == address)
                    .map(|position| (position + 1) as u8)
                    .ok_or_else(|| reference_not_found("Account", raw))
            }
            ABIReferenceValue::Application(id) => {
                if *id == app_id {
                    return Ok(0);
                }
                self.apps
                    .iter()
                    .position(|candidate| candidate == id)
                    .map(|position| (position + 1) as u8)
                    .ok_or_else(|| reference_not_found("Application", id))
            }
            ABIReferenceValue::Asset(id) => self
                .assets
                .iter()
                .position(|candidate| candidate == id)
                .map(|position| position as u8)
                .ok_or_else(|| reference_not_found("Asset", id)),
        }
    }
}

fn parse_account_reference(raw: &str) -> Result<Address, ComposerError> {
    Address::from_str(raw).map_err(|_| ComposerError::TransactionError {
        message: format!("Invalid address {}", raw),
    })
}

fn reference_not_found(kind: &str, which: &dyn std::fmt::Display) -> ComposerError {
    ComposerError::ABIEncodingError {
        message: format!("{} {} not found in reference array", kind, which),
    }
}

/// Encodes the application arguments of a method call: the selector first,
/// then each non-transaction argument, with everything beyond the fourteenth
/// slot packed into a trailing tuple per ARC-4.
fn encode_call_args(
    method: &ABIMethod,
    args: &[ProcessedAppMethodCallArg],
    sender: &Address,
    app_id: u64,
    refs: &ReferenceArrays,
) -> Result<Vec<Vec<u8>>, ComposerError> {
    let selector = method
        .selector()
        .map_err(|e| ComposerError::ABIEncodingError {
            message: format!("Failed to get method selector: {}", e),
        })?;

    let uint8 = ABIType::Uint(BitSize::new(8).map_err(|e| ComposerError::ABIEncodingError {
        message: e.to_string(),
    })?);

    // Transaction-typed arguments travel as group members, not as encoded
    // bytes; reference-typed ones encode as uint8 indexes
    let mut types = Vec::new();
    for arg in &method.args {
        match &arg.arg_type {
            ABIMethodArgType::Value(abi_type) => types.push(abi_type.clone()),
            ABIMethodArgType::Reference(_) => types.push(uint8.clone()),
            ABIMethodArgType::Transaction(_) => {}
        }
    }

    let mut values = Vec::new();
    for arg in args {
        match arg {
            ProcessedAppMethodCallArg::ABIValue(value) => values.push(value.clone()),
            ProcessedAppMethodCallArg::ABIReference(reference) => {
                let index = refs.index_of(reference, sender, app_id)?;
                values.push(ABIValue::Uint(BigUint::from(index)));
            }
            ProcessedAppMethodCallArg::TransactionPlaceholder => {}
        }
    }

    if values.len() != types.len() {
        return Err(ComposerError::ABIEncodingError {
            message: "Mismatch in length of non-transaction arguments".to_string(),
        });
    }

    let mut encoded = vec![selector];
    if types.len() > ARGS_TUPLE_PACKING_THRESHOLD {
        // The threshold is 14 rather than 15 because the selector occupies
        // the first application argument slot
        let (head_types, tail_types) = types.split_at(ARGS_TUPLE_PACKING_THRESHOLD);
        let (head_values, tail_values) = values.split_at(ARGS_TUPLE_PACKING_THRESHOLD);
        encode_each(head_types, head_values, &mut encoded)?;

        let tuple_type = ABIType::Tuple(tail_types.to_vec());
        let tuple_value = ABIValue::Array(tail_values.to_vec());
        encoded.push(encode_abi_value(&tuple_type, &tuple_value)?);
    } else {
        encode_each(&types, &values, &mut encoded)?;
    }

    Ok(encoded)
}

fn encode_each(
    types: &[ABIType],
    values: &[ABIValue],
    out: &mut Vec<Vec<u8>>,
) -> Result<(), ComposerError> {
    for (abi_type, value) in types.iter().zip(values) {
        out.push(encode_abi_value(abi_type, value)?);
    }
    Ok(())
}

fn encode_abi_value(abi_type: &ABIType, value: &ABIValue) -> Result<Vec<u8>, ComposerError> {
    abi_type
        .encode(value)
        .map_err(|e| ComposerError::ABIEncodingError {
            message: format!("Failed to encode ABI value: {}", e),
        })
}

pub fn build_app_call(params: &AppCallParams, header: TransactionHeader) -> Transaction {
    Transaction::ApplicationCall(ApplicationCallTransactionFields {
        header,
        app_id: params.app_id,
        on_complete: params.on_complete,
        args: params.args.clone(),
        account_references: params.account_references.clone(),
        app_references: params.app_references.clone(),
        asset_references: params.asset_references.clone(),
        box_references: params.box_references.clone(),
        ..Default::default()
    })
}

pub fn build_app_create_call(params: &AppCreateParams, header: TransactionHeader) -> Transaction {
    Transaction::ApplicationCall(ApplicationCallTransactionFields {
        header,
        // 0 indicates app creation
        app_id: 0,
        on_complete: params.on_complete,
        approval_program: Some(params.approval_program.clone()),
        clear_state_program: Some(params.clear_state_program.clone()),
        global_state_schema: params.global_state_schema.clone(),
        local_state_schema: params.local_state_schema.clone(),
        extra_program_pages: params.extra_program_pages,
        args: params.args.clone(),
        account_references: params.account_references.clone(),
        app_references: params.app_references.clone(),
        asset_references: params.asset_references.clone(),
        box_references: params.box_references.clone(),
    })
}

pub fn build_app_update_call(params: &AppUpdateParams, header: TransactionHeader) -> Transaction {
    Transaction::ApplicationCall(ApplicationCallTransactionFields {
        header,
        app_id: params.app_id,
        on_complete: OnApplicationComplete::UpdateApplication,
        approval_program: Some(params.approval_program.clone()),
        clear_state_program: Some(params.clear_state_program.clone()),
        args: params.args.clone(),
        account_references: params.account_references.clone(),
        app_references: params.app_references.clone(),
        asset_references: params.asset_references.clone(),
        box_references: params.box_references.clone(),
        ..Default::default()
    })
}

pub fn build_app_delete_call(params: &AppDeleteParams, header: TransactionHeader) -> Transaction {
    Transaction::ApplicationCall(ApplicationCallTransactionFields {
        header,
        app_id: params.app_id,
        on_complete: OnApplicationComplete::DeleteApplication,
        args: params.args.clone(),
        account_references: params.account_references.clone(),
        app_references: params.app_references.clone(),
        asset_references: params.asset_references.clone(),
        box_references: params.box_references.clone(),
        ..Default::default()
    })
}

fn build_method_call_common<T, F>(
    header: TransactionHeader,
    params: &T,
    assemble: F,
) -> Result<Transaction, ComposerError>
where
    T: AppMethodCallCommonParams,
    F: FnOnce(TransactionHeader, ReferenceArrays, Vec<Vec<u8>>) -> Transaction,
{
    let mut refs = ReferenceArrays::seeded_from(params);
    refs.collect(&header.sender, params.app_id(), params.args())?;

    let encoded_args = encode_call_args(
        params.method(),
        params.args(),
        &header.sender,
        params.app_id(),
        &refs,
    )?;

    Ok(assemble(header, refs, encoded_args))
}

pub fn build_app_call_method_call(
    params: &AppCallMethodCallParams<ProcessedAppMethodCallArg>,
    header: TransactionHeader,
) -> Result<Transaction, ComposerError> {
    build_method_call_common(header, params, |header, refs, encoded_args| {
        Transaction::ApplicationCall(ApplicationCallTransactionFields {
            header,
            app_id: params.app_id,
            on_complete: params.on_complete,
            args: Some(encoded_args),
            account_references: Some(refs.accounts),
            app_references: Some(refs.apps),
            asset_references: Some(refs.assets),
            box_references: params.box_references.clone(),
            ..Default::default()
        })
    })
}

pub fn build_app_create_method_call(
    params: &AppCreateMethodCallParams<ProcessedAppMethodCallArg>,
    header: TransactionHeader,
) -> Result<Transaction, ComposerError> {
    build_method_call_common(header, params, |header, refs, encoded_args| {
        Transaction::ApplicationCall(ApplicationCallTransactionFields {
            header,
            // 0 indicates app creation
            app_id: 0,
            on_complete: params.on_complete,
            approval_program: Some(params.approval_program.clone()),
            clear_state_program: Some(params.clear_state_program.clone()),
            global_state_schema: params.global_state_schema.clone(),
            local_state_schema: params.local_state_schema.clone(),
            extra_program_pages: params.extra_program_pages,
            args: Some(encoded_args),
            account_references: Some(refs.accounts),
            app_references: Some(refs.apps),
            asset_references: Some(refs.assets),
            box_references: params.box_references.clone(),
        })
    })
}

pub fn build_app_update_method_call(
    params: &AppUpdateMethodCallParams<ProcessedAppMethodCallArg>,
    header: TransactionHeader,
) -> Result<Transaction, ComposerError> {
    build_method_call_common(header, params, |header, refs, encoded_args| {
        Transaction::ApplicationCall(ApplicationCallTransactionFields {
            header,
            app_id: params.app_id,
            on_complete: OnApplicationComplete::UpdateApplication,
            approval_program: Some(params.approval_program.clone()),
            clear_state_program: Some(params.clear_state_program.clone()),
            args: Some(encoded_args),
            account_references: Some(refs.accounts),
            app_references: Some(refs.apps),
            asset_references: Some(refs.assets),
            box_references: params.box_references.clone(),
            ..Default::default()
        })
    })
}

pub fn build_app_delete_method_call(
    params: &AppDeleteMethodCallParams<ProcessedAppMethodCallArg>,
    header: TransactionHeader,
) -> Result<Transaction, ComposerError> {
    build_method_call_common(header, params, |header, refs, encoded_args| {
        Transaction::ApplicationCall(ApplicationCallTransactionFields {
            header,
            app_id: params.app_id,
            on_complete: OnApplicationComplete::DeleteApplication,
            args: Some(encoded_args),
            account_references: Some(refs.accounts),
            app_references: Some(refs.apps),
            asset_references: Some(refs.assets),
            box_references: params.box_references.clone(),
            ..Default::default()
        })
    })
}
