//! Atomic transaction group composition.
//!
//! The [`Composer`] queues transaction intents, builds them into a fee-covered
//! and resource-populated group using node suggested parameters and a single
//! simulate pass, gathers signatures batched per signer, submits the group
//! atomically and waits for confirmation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use snafu::Snafu;

use crate::abi::{ABI_RETURN_PREFIX, ABIMethod, ABIReturn};
use crate::algod::{
    AlgodClient, AlgodError, PendingTransactionResponse, SimulateRequest,
    SimulateRequestTransactionGroup, SimulateResponse, SimulateTraceConfig,
    SimulateTransactionGroupResult, SimulateTransactionResult, TransactionParams,
};
use crate::config::{
    ComposerConfig, EventData, EventType, TxnGroupSimulatedEventData, genesis_id_is_localnet,
};
use crate::transact::constants::{Byte32, EMPTY_SIGNATURE, MAX_TX_GROUP_SIZE};
use crate::transact::{
    Address, AlgorandMsgpack, FeeParams, SignedTransaction, TransactError, Transaction,
    TransactionHeader, TransactionId, Transactions, Validate,
};

use super::app_call::{
    AppCallMethodCallParams, AppCallParams, AppCreateMethodCallParams, AppCreateParams,
    AppDeleteMethodCallParams, AppDeleteParams, AppMethodCallArg, AppUpdateMethodCallParams,
    AppUpdateParams, ProcessedAppMethodCallArg, build_app_call, build_app_call_method_call,
    build_app_create_call, build_app_create_method_call, build_app_delete_call,
    build_app_delete_method_call, build_app_update_call, build_app_update_method_call,
};
use super::asset_config::{
    AssetConfigParams, AssetCreateParams, AssetDestroyParams, build_asset_config,
    build_asset_create, build_asset_destroy,
};
use super::asset_freeze::{
    AssetFreezeParams, AssetUnfreezeParams, build_asset_freeze, build_asset_unfreeze,
};
use super::asset_transfer::{
    AssetClawbackParams, AssetOptInParams, AssetOptOutParams, AssetTransferParams,
    build_asset_clawback, build_asset_opt_in, build_asset_opt_out, build_asset_transfer,
};
use super::common::{SignerResolver, TransactionSigner, TransactionWithSigner};
use super::fee::{FeeDelta, FeePriority};
use super::key_registration::{
    NonParticipationKeyRegistrationParams, OfflineKeyRegistrationParams,
    OnlineKeyRegistrationParams, build_non_participation_key_registration,
    build_offline_key_registration, build_online_key_registration,
};
use super::payment::{AccountCloseParams, PaymentParams, build_account_close, build_payment};
use super::resources::{populate_group_resources, populate_transaction_resources};

const COVER_APP_CALL_INNER_TRANSACTION_FEES_DEFAULT: bool = false;

/// Configuration for application call resource population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourcePopulation {
    Disabled,
    Enabled,
}

impl ResourcePopulation {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ResourcePopulation::Enabled)
    }
}

impl Default for ResourcePopulation {
    fn default() -> Self {
        ResourcePopulation::Enabled
    }
}

/// Context captured alongside a failed send or simulate, so callers can
/// inspect what was on the wire and what the AVM reported.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// Best-effort AVM execution traces captured in debug mode.
    pub traces: Option<serde_json::Value>,
    /// The signed transactions that were (or would have been) submitted.
    pub sent_transactions: Option<Vec<SignedTransaction>>,
    /// The raw simulate response, when the failure came from simulation.
    pub simulate_response: Option<serde_json::Value>,
}

#[derive(Debug, Snafu)]
pub enum ComposerError {
    #[snafu(display("Algod client error: {source}"))]
    AlgodClientError { source: AlgodError },
    #[snafu(display("Transact error: {source}"))]
    TransactError { source: TransactError },
    #[snafu(display("Decode error: {message}"))]
    DecodeError { message: String },
    #[snafu(display("Transaction error: {message}"))]
    TransactionError { message: String },
    #[snafu(display("Signing error: {message}"))]
    SigningError { message: String },
    #[snafu(display("Composer state error: {message}"))]
    StateError { message: String },
    #[snafu(display("Transaction pool error: {message}"))]
    PoolError { message: String },
    #[snafu(display("Transaction group can hold at most {max} transactions", max = MAX_TX_GROUP_SIZE))]
    GroupSizeError,
    #[snafu(display("Max wait round expired: {message}"))]
    MaxWaitRoundExpired { message: String },
    #[snafu(display("ABI argument encoding error: {message}"))]
    ABIEncodingError { message: String },
    #[snafu(display("ABI argument decoding error: {message}"))]
    ABIDecodingError { message: String },
    /// The terminal error of a failed send or simulate. Carries the context
    /// needed to debug the failure and chains the underlying error as its
    /// source.
    #[snafu(display("{message}"))]
    SendError {
        message: String,
        context: Box<ErrorContext>,
        source: Box<ComposerError>,
    },
    #[snafu(display("Error transformer failed: {message}"))]
    TransformerFailed {
        message: String,
        original: Box<ComposerError>,
    },
}

impl From<AlgodError> for ComposerError {
    fn from(e: AlgodError) -> Self {
        Self::AlgodClientError { source: e }
    }
}

impl From<TransactError> for ComposerError {
    fn from(e: TransactError) -> Self {
        Self::TransactError { source: e }
    }
}

/// A hook that inspects a send/simulate failure and may replace it with a
/// richer, domain-specific error.
///
/// Returning `Ok(None)` leaves the error untouched. Returning `Err` aborts
/// the chain and surfaces [`ComposerError::TransformerFailed`], preserving
/// the in-flight error as the original.
#[async_trait]
pub trait ErrorTransformer: Send + Sync {
    async fn transform(&self, error: &ComposerError) -> Result<Option<ComposerError>, String>;
}

#[derive(Debug)]
pub struct SendTransactionComposerResults {
    pub group: Option<Byte32>,
    pub transaction_ids: Vec<String>,
    pub confirmations: Vec<PendingTransactionResponse>,
    pub abi_returns: Vec<Result<Option<ABIReturn>, ComposerError>>,
}

#[derive(Debug)]
pub struct SimulateComposerResults {
    pub group: Option<Byte32>,
    pub transaction_ids: Vec<String>,
    pub confirmations: Vec<PendingTransactionResponse>,
    pub abi_returns: Vec<Result<Option<ABIReturn>, ComposerError>>,
    pub simulate_response: SimulateResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendParams {
    pub max_rounds_to_wait_for_confirmation: Option<u32>,
    pub cover_app_call_inner_transaction_fees: bool,
    pub populate_app_call_resources: ResourcePopulation,
}

impl Default for SendParams {
    fn default() -> Self {
        Self {
            max_rounds_to_wait_for_confirmation: None,
            cover_app_call_inner_transaction_fees: COVER_APP_CALL_INNER_TRANSACTION_FEES_DEFAULT,
            populate_app_call_resources: ResourcePopulation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    pub cover_app_call_inner_transaction_fees: bool,
    pub populate_app_call_resources: ResourcePopulation,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            cover_app_call_inner_transaction_fees: COVER_APP_CALL_INNER_TRANSACTION_FEES_DEFAULT,
            populate_app_call_resources: ResourcePopulation::default(),
        }
    }
}

impl From<&SendParams> for BuildParams {
    fn from(send_params: &SendParams) -> Self {
        BuildParams {
            cover_app_call_inner_transaction_fees: send_params
                .cover_app_call_inner_transaction_fees,
            populate_app_call_resources: send_params.populate_app_call_resources.clone(),
        }
    }
}

/// Options for a simulate run against the node.
#[derive(Debug, Clone, Default)]
pub struct SimulateParams {
    pub allow_more_logs: Option<bool>,
    /// Simulate as if the group was submitted at this round.
    pub round: Option<u64>,
    /// Simulate with empty signatures instead of gathering real ones.
    pub skip_signatures: bool,
    pub allow_empty_signatures: Option<bool>,
    pub allow_unnamed_resources: Option<bool>,
    pub fix_signers: Option<bool>,
    pub exec_trace_config: Option<SimulateTraceConfig>,
    /// Return results instead of failing when the simulated group fails.
    pub result_on_failure: bool,
    /// Skip debug-mode trace capture for this run.
    pub suppress_trace: bool,
}

#[derive(Debug)]
struct TransactionAnalysis {
    /// The fee difference required for this transaction.
    required_fee_delta: Option<FeeDelta>,
    /// Resources this specific transaction accessed but did not declare.
    unnamed_resources_accessed: Option<crate::algod::SimulateUnnamedResourcesAccessed>,
}

#[derive(Debug)]
struct GroupAnalysis {
    /// Analysis of each transaction in the group.
    transactions: Vec<TransactionAnalysis>,
    /// Resources accessed by the group that qualify for group resource
    /// sharing.
    unnamed_resources_accessed: Option<crate::algod::SimulateUnnamedResourcesAccessed>,
}

/// A queued transaction intent. One case per operation kind, plus
/// passthrough cases for fully formed transactions.
#[derive(Debug, Clone)]
pub enum ComposerTransaction {
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
    AppCallMethodCall(AppCallMethodCallParams<ProcessedAppMethodCallArg>),
    AppCreateMethodCall(AppCreateMethodCallParams<ProcessedAppMethodCallArg>),
    AppUpdateMethodCall(AppUpdateMethodCallParams<ProcessedAppMethodCallArg>),
    AppDeleteMethodCall(AppDeleteMethodCallParams<ProcessedAppMethodCallArg>),
    OnlineKeyRegistration(OnlineKeyRegistrationParams),
    OfflineKeyRegistration(OfflineKeyRegistrationParams),
    NonParticipationKeyRegistration(NonParticipationKeyRegistrationParams),
}

/// Dispatches over every params-carrying case of [`ComposerTransaction`],
/// binding the params as `$p`, and evaluates `$fallback` for the two
/// passthrough cases.
macro_rules! with_params {
    ($target:expr, $p:ident => $body:expr, $fallback:expr) => {
        match $target {
            ComposerTransaction::Payment($p) => $body,
            ComposerTransaction::AccountClose($p) => $body,
            ComposerTransaction::AssetTransfer($p) => $body,
            ComposerTransaction::AssetOptIn($p) => $body,
            ComposerTransaction::AssetOptOut($p) => $body,
            ComposerTransaction::AssetClawback($p) => $body,
            ComposerTransaction::AssetCreate($p) => $body,
            ComposerTransaction::AssetConfig($p) => $body,
            ComposerTransaction::AssetDestroy($p) => $body,
            ComposerTransaction::AssetFreeze($p) => $body,
            ComposerTransaction::AssetUnfreeze($p) => $body,
            ComposerTransaction::AppCall($p) => $body,
            ComposerTransaction::AppCreateCall($p) => $body,
            ComposerTransaction::AppUpdateCall($p) => $body,
            ComposerTransaction::AppDeleteCall($p) => $body,
            ComposerTransaction::AppCallMethodCall($p) => $body,
            ComposerTransaction::AppCreateMethodCall($p) => $body,
            ComposerTransaction::AppUpdateMethodCall($p) => $body,
            ComposerTransaction::AppDeleteMethodCall($p) => $body,
            ComposerTransaction::OnlineKeyRegistration($p) => $body,
            ComposerTransaction::OfflineKeyRegistration($p) => $body,
            ComposerTransaction::NonParticipationKeyRegistration($p) => $body,
            ComposerTransaction::Transaction(_)
            | ComposerTransaction::TransactionWithSigner(_) => $fallback,
        }
    };
}

impl ComposerTransaction {
    pub fn sender(&self) -> Address {
        with_params!(self, p => p.sender.clone(), Address::default())
    }

    pub fn signer(&self) -> Option<Arc<dyn TransactionSigner>> {
        with_params!(self, p => p.signer.clone(), None)
    }

    pub fn rekey_to(&self) -> Option<Address> {
        with_params!(self, p => p.rekey_to.clone(), None)
    }

    pub fn note(&self) -> Option<Vec<u8>> {
        with_params!(self, p => p.note.clone(), None)
    }

    pub fn lease(&self) -> Option<[u8; 32]> {
        with_params!(self, p => p.lease, None)
    }

    pub fn static_fee(&self) -> Option<u64> {
        with_params!(self, p => p.static_fee, None)
    }

    pub fn extra_fee(&self) -> Option<u64> {
        with_params!(self, p => p.extra_fee, None)
    }

    pub fn max_fee(&self) -> Option<u64> {
        with_params!(self, p => p.max_fee, None)
    }

    pub fn validity_window(&self) -> Option<u32> {
        with_params!(self, p => p.validity_window, None)
    }

    pub fn first_valid_round(&self) -> Option<u64> {
        with_params!(self, p => p.first_valid_round, None)
    }

    pub fn last_valid_round(&self) -> Option<u64> {
        with_params!(self, p => p.last_valid_round, None)
    }

    /// The highest fee this transaction may carry, based on static_fee and
    /// max_fee.
    pub fn logical_max_fee(&self) -> Option<u64> {
        let max_fee = self.max_fee();
        let static_fee = self.static_fee();
        match (max_fee, static_fee) {
            (Some(max_fee_value), static_fee) if max_fee_value > static_fee.unwrap_or(0) => max_fee,
            _ => static_fee,
        }
    }

    fn set_max_fee(&mut self, value: u64) -> Result<(), ComposerError> {
        with_params!(
            self,
            p => {
                p.max_fee = Some(value);
                Ok(())
            },
            Err(ComposerError::TransactionError {
                message: "Cannot set max fee on a transaction that was added fully formed"
                    .to_string(),
            })
        )
    }

    fn is_app_call_kind(&self) -> bool {
        matches!(
            self,
            ComposerTransaction::AppCall(_)
                | ComposerTransaction::AppCreateCall(_)
                | ComposerTransaction::AppUpdateCall(_)
                | ComposerTransaction::AppDeleteCall(_)
                | ComposerTransaction::AppCallMethodCall(_)
                | ComposerTransaction::AppCreateMethodCall(_)
                | ComposerTransaction::AppUpdateMethodCall(_)
                | ComposerTransaction::AppDeleteMethodCall(_)
                | ComposerTransaction::Transaction(Transaction::ApplicationCall(_))
                | ComposerTransaction::TransactionWithSigner(TransactionWithSigner {
                    transaction: Transaction::ApplicationCall(_),
                    ..
                })
        )
    }
}

macro_rules! add_transaction_methods {
    ($($(#[$meta:meta])* $name:ident($params:ty) => $variant:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, params: $params) -> Result<(), ComposerError> {
                self.push(ComposerTransaction::$variant(params))
            }
        )*
    };
}

macro_rules! add_method_call_methods {
    ($($name:ident($params:ty) => $variant:ident;)*) => {
        $(
            pub fn $name(&mut self, params: $params) -> Result<(), ComposerError> {
                self.add_app_method_call_internal(&params.args, || {
                    ComposerTransaction::$variant((&params).into())
                })
            }
        )*
    };
}

/// Queues transaction intents and turns them into a signed, submitted and
/// confirmed atomic group.
#[derive(Clone)]
pub struct Composer {
    transactions: Vec<ComposerTransaction>,
    algod_client: Arc<dyn AlgodClient>,
    signer_resolver: Arc<dyn SignerResolver>,
    config: ComposerConfig,
    error_transformers: Vec<Arc<dyn ErrorTransformer>>,
    built_group: Option<Vec<TransactionWithSigner>>,
    built_params: Option<BuildParams>,
    signed_group: Option<Vec<SignedTransaction>>,
}

impl Composer {
    pub fn new(algod_client: Arc<dyn AlgodClient>, signer_resolver: Arc<dyn SignerResolver>) -> Self {
        Self::with_config(algod_client, signer_resolver, ComposerConfig::default())
    }

    pub fn with_config(
        algod_client: Arc<dyn AlgodClient>,
        signer_resolver: Arc<dyn SignerResolver>,
        config: ComposerConfig,
    ) -> Self {
        Composer {
            transactions: Vec::new(),
            algod_client,
            signer_resolver,
            config,
            error_transformers: Vec::new(),
            built_group: None,
            built_params: None,
            signed_group: None,
        }
    }

    /// Number of transactions currently queued.
    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    /// Registers a transformer applied, in registration order, to errors
    /// raised during submission, confirmation or simulation.
    pub fn register_error_transformer(&mut self, transformer: Arc<dyn ErrorTransformer>) {
        self.error_transformers.push(transformer);
    }

    fn ensure_mutable(&self) -> Result<(), ComposerError> {
        if self.built_group.is_some() {
            return Err(ComposerError::StateError {
                message: "Cannot modify the transaction group once it has been built".to_string(),
            });
        }
        Ok(())
    }

    fn push(&mut self, txn: ComposerTransaction) -> Result<(), ComposerError> {
        self.ensure_mutable()?;
        if self.transactions.len() >= MAX_TX_GROUP_SIZE {
            return Err(ComposerError::GroupSizeError);
        }
        self.transactions.push(txn);
        Ok(())
    }

    fn method_of(queued: &ComposerTransaction) -> Option<&ABIMethod> {
        match queued {
            ComposerTransaction::AppCallMethodCall(params) => Some(&params.method),
            ComposerTransaction::AppCreateMethodCall(params) => Some(&params.method),
            ComposerTransaction::AppUpdateMethodCall(params) => Some(&params.method),
            ComposerTransaction::AppDeleteMethodCall(params) => Some(&params.method),
            _ => None,
        }
    }

    add_transaction_methods! {
        add_payment(PaymentParams) => Payment;
        add_account_close(AccountCloseParams) => AccountClose;
        add_asset_transfer(AssetTransferParams) => AssetTransfer;
        add_asset_opt_in(AssetOptInParams) => AssetOptIn;
        add_asset_opt_out(AssetOptOutParams) => AssetOptOut;
        add_asset_clawback(AssetClawbackParams) => AssetClawback;
        add_asset_create(AssetCreateParams) => AssetCreate;
        add_asset_config(AssetConfigParams) => AssetConfig;
        add_asset_destroy(AssetDestroyParams) => AssetDestroy;
        add_asset_freeze(AssetFreezeParams) => AssetFreeze;
        add_asset_unfreeze(AssetUnfreezeParams) => AssetUnfreeze;
        add_app_call(AppCallParams) => AppCall;
        add_app_create(AppCreateParams) => AppCreateCall;
        add_app_update(AppUpdateParams) => AppUpdateCall;
        add_app_delete(AppDeleteParams) => AppDeleteCall;
        add_online_key_registration(OnlineKeyRegistrationParams) => OnlineKeyRegistration;
        add_offline_key_registration(OfflineKeyRegistrationParams) => OfflineKeyRegistration;
        add_non_participation_key_registration(NonParticipationKeyRegistrationParams) => NonParticipationKeyRegistration;
    }

    /// Adds a fully formed transaction to the group.
    ///
    /// The transaction is validated and any existing group id is stripped,
    /// since group membership is recomputed when the composer builds.
    pub fn add_transaction(
        &mut self,
        mut transaction: Transaction,
        signer: Option<Arc<dyn TransactionSigner>>,
    ) -> Result<(), ComposerError> {
        transaction
            .validate()
            .map_err(|errors| ComposerError::TransactionError {
                message: errors.join("; "),
            })?;
        transaction.header_mut().group = None;

        match signer {
            Some(signer) => self.push(ComposerTransaction::TransactionWithSigner(
                TransactionWithSigner {
                    transaction,
                    signer,
                },
            )),
            None => self.push(ComposerTransaction::Transaction(transaction)),
        }
    }

    /// Merges the queue of another composer into this one. The merge is
    /// all-or-nothing: if the combined queues would exceed the group size
    /// limit, neither queue is modified.
    pub fn add_composer(&mut self, other: Composer) -> Result<(), ComposerError> {
        self.ensure_mutable()?;
        if self.transactions.len() + other.transactions.len() > MAX_TX_GROUP_SIZE {
            return Err(ComposerError::GroupSizeError);
        }
        self.transactions.extend(other.transactions);
        Ok(())
    }

    /// Sets the max fee of the queued transactions at the given indexes.
    /// Rejected once the group has been built.
    pub fn set_max_fees(&mut self, max_fees: &HashMap<usize, u64>) -> Result<(), ComposerError> {
        self.ensure_mutable()?;

        let mut entries: Vec<(&usize, &u64)> = max_fees.iter().collect();
        entries.sort_by_key(|(index, _)| **index);

        for (&index, &max_fee) in entries {
            if index >= self.transactions.len() {
                return Err(ComposerError::StateError {
                    message: format!(
                        "Transaction index {} is out of range for a group of {}",
                        index,
                        self.transactions.len()
                    ),
                });
            }
            self.transactions[index].set_max_fee(max_fee)?;
        }

        Ok(())
    }

    /// Flattens the transaction-typed arguments of a method call into the
    /// queue, depth first, so nested method call transactions always precede
    /// the call that references them.
    fn flatten_method_call_args(args: &[AppMethodCallArg], queue: &mut Vec<ComposerTransaction>) {
        use AppMethodCallArg as Arg;
        use ComposerTransaction as Queued;

        for arg in args {
            match arg {
                Arg::Transaction(txn) => queue.push(Queued::Transaction(txn.clone())),
                Arg::TransactionWithSigner(tws) => {
                    queue.push(Queued::TransactionWithSigner(tws.clone()))
                }
                Arg::Payment(p) => queue.push(Queued::Payment(p.clone())),
                Arg::AccountClose(p) => queue.push(Queued::AccountClose(p.clone())),
                Arg::AssetTransfer(p) => queue.push(Queued::AssetTransfer(p.clone())),
                Arg::AssetOptIn(p) => queue.push(Queued::AssetOptIn(p.clone())),
                Arg::AssetOptOut(p) => queue.push(Queued::AssetOptOut(p.clone())),
                Arg::AssetClawback(p) => queue.push(Queued::AssetClawback(p.clone())),
                Arg::AssetCreate(p) => queue.push(Queued::AssetCreate(p.clone())),
                Arg::AssetConfig(p) => queue.push(Queued::AssetConfig(p.clone())),
                Arg::AssetDestroy(p) => queue.push(Queued::AssetDestroy(p.clone())),
                Arg::AssetFreeze(p) => queue.push(Queued::AssetFreeze(p.clone())),
                Arg::AssetUnfreeze(p) => queue.push(Queued::AssetUnfreeze(p.clone())),
                Arg::AppCall(p) => queue.push(Queued::AppCall(p.clone())),
                Arg::AppCreateCall(p) => queue.push(Queued::AppCreateCall(p.clone())),
                Arg::AppUpdateCall(p) => queue.push(Queued::AppUpdateCall(p.clone())),
                Arg::AppDeleteCall(p) => queue.push(Queued::AppDeleteCall(p.clone())),
                Arg::OnlineKeyRegistration(p) => {
                    queue.push(Queued::OnlineKeyRegistration(p.clone()))
                }
                Arg::OfflineKeyRegistration(p) => {
                    queue.push(Queued::OfflineKeyRegistration(p.clone()))
                }
                Arg::NonParticipationKeyRegistration(p) => {
                    queue.push(Queued::NonParticipationKeyRegistration(p.clone()))
                }
                Arg::AppCallMethodCall(p) => {
                    Self::flatten_method_call_args(&p.args, queue);
                    queue.push(Queued::AppCallMethodCall(p.into()));
                }
                Arg::AppCreateMethodCall(p) => {
                    Self::flatten_method_call_args(&p.args, queue);
                    queue.push(Queued::AppCreateMethodCall(p.into()));
                }
                Arg::AppUpdateMethodCall(p) => {
                    Self::flatten_method_call_args(&p.args, queue);
                    queue.push(Queued::AppUpdateMethodCall(p.into()));
                }
                Arg::AppDeleteMethodCall(p) => {
                    Self::flatten_method_call_args(&p.args, queue);
                    queue.push(Queued::AppDeleteMethodCall(p.into()));
                }
                Arg::ABIValue(_) | Arg::ABIReference(_) | Arg::TransactionPlaceholder => {}
            }
        }
    }

    fn add_app_method_call_internal(
        &mut self,
        args: &[AppMethodCallArg],
        create_transaction: impl FnOnce() -> ComposerTransaction,
    ) -> Result<(), ComposerError> {
        let mut expansion = Vec::new();
        Self::flatten_method_call_args(args, &mut expansion);
        expansion.push(create_transaction());

        // All-or-nothing: either the whole expansion fits or nothing is added
        if self.transactions.len() + expansion.len() > MAX_TX_GROUP_SIZE {
            return Err(ComposerError::GroupSizeError);
        }

        for queued in expansion {
            self.push(queued)?;
        }

        Ok(())
    }

    add_method_call_methods! {
        add_app_call_method_call(AppCallMethodCallParams) => AppCallMethodCall;
        add_app_create_method_call(AppCreateMethodCallParams) => AppCreateMethodCall;
        add_app_update_method_call(AppUpdateMethodCallParams) => AppUpdateMethodCall;
        add_app_delete_method_call(AppDeleteMethodCallParams) => AppDeleteMethodCall;
    }

    fn parse_abi_return_values(
        &self,
        confirmations: &[PendingTransactionResponse],
    ) -> Vec<Result<Option<ABIReturn>, ComposerError>> {
        self.transactions
            .iter()
            .zip(confirmations)
            .filter_map(|(queued, confirmation)| {
                Self::method_of(queued)
                    .map(|method| Self::extract_abi_return_from_logs(confirmation, method))
            })
            .collect()
    }

    fn extract_abi_return_from_logs(
        confirmation: &PendingTransactionResponse,
        method: &ABIMethod,
    ) -> Result<Option<ABIReturn>, ComposerError> {
        let Some(return_type) = method.returns.as_ref() else {
            return Ok(None);
        };

        // A non-void method logs its return value last
        let Some(last_log) = confirmation.logs.as_ref().and_then(|logs| logs.last()) else {
            return Err(ComposerError::ABIDecodingError {
                message: format!(
                    "No logs found for method {} which requires a return type",
                    method.name
                ),
            });
        };

        if !last_log.starts_with(&ABI_RETURN_PREFIX) {
            return Err(ComposerError::ABIDecodingError {
                message: format!(
                    "Transaction log for method {} doesn't match with ABI return value format",
                    method.name
                ),
            });
        }

        let return_bytes = &last_log[ABI_RETURN_PREFIX.len()..];

        match return_type.decode(return_bytes) {
            Ok(return_value) => Ok(Some(ABIReturn {
                method: method.clone(),
                raw_return_value: return_bytes.to_vec(),
                return_value: Some(return_value),
            })),
            Err(e) => Err(ComposerError::ABIDecodingError {
                message: format!(
                    "Failed to decode ABI return value for method {}: {}",
                    method.name, e
                ),
            }),
        }
    }

    async fn analyze_group_requirements(
        &self,
        suggested_params: &TransactionParams,
        default_validity_window: u32,
        build_params: &BuildParams,
    ) -> Result<GroupAnalysis, ComposerError> {
        let built_transactions = self
            .build_transactions(suggested_params, default_validity_window, None)
            .await?;

        // Simulate each app call at its fee ceiling so inner fee needs
        // surface in the result
        let mut missing_max_fees = Vec::new();
        let mut to_simulate = Vec::with_capacity(built_transactions.len());
        for (index, built) in built_transactions.iter().enumerate() {
            let mut candidate = built.clone();
            let header = candidate.header_mut();
            header.group = None;
            if build_params.cover_app_call_inner_transaction_fees
                && matches!(built, Transaction::ApplicationCall(_))
            {
                match self.transactions[index].logical_max_fee() {
                    Some(ceiling) => header.fee = Some(ceiling),
                    None => missing_max_fees.push(index.to_string()),
                }
            }
            to_simulate.push(candidate);
        }

        if build_params.cover_app_call_inner_transaction_fees && !missing_max_fees.is_empty() {
            return Err(ComposerError::StateError {
                message: format!(
                    "Please provide a max fee for each app call transaction when inner transaction fee coverage is enabled. Required for transaction {}",
                    missing_max_fees.join(", ")
                ),
            });
        }

        // Regroup, as the fees have likely been adjusted
        if to_simulate.len() > 1 {
            to_simulate = to_simulate.as_slice().assign_group().map_err(|e| {
                ComposerError::TransactionError {
                    message: format!("Failed to assign group: {}", e),
                }
            })?;
        }

        let placeholder_signed = to_simulate
            .into_iter()
            .map(|transaction| SignedTransaction {
                transaction,
                signature: Some(EMPTY_SIGNATURE),
                auth_address: None,
            })
            .collect();

        let request = SimulateRequest {
            txn_groups: vec![SimulateRequestTransactionGroup {
                txns: placeholder_signed,
            }],
            allow_empty_signatures: Some(true),
            allow_more_logging: Some(true),
            allow_unnamed_resources: Some(true),
            fix_signers: Some(true),
            exec_trace_config: Some(SimulateTraceConfig::all()),
            round: None,
        };

        let response = self.algod_client.simulate_transactions(request).await?;
        let group_result = &response.txn_groups[0];

        if let Some(failure_message) = &group_result.failure_message {
            return Err(Self::analysis_failure_error(
                group_result,
                failure_message,
                build_params,
            ));
        }

        let mut analyses = Vec::with_capacity(group_result.txn_results.len());
        for (index, txn_result) in group_result.txn_results.iter().enumerate() {
            let required_fee_delta = if build_params.cover_app_call_inner_transaction_fees {
                self.required_fee_delta_for(&built_transactions[index], txn_result, suggested_params)?
            } else {
                None
            };

            analyses.push(TransactionAnalysis {
                required_fee_delta,
                unnamed_resources_accessed: build_params
                    .populate_app_call_resources
                    .is_enabled()
                    .then(|| txn_result.unnamed_resources_accessed.clone())
                    .flatten(),
            });
        }

        Ok(GroupAnalysis {
            transactions: analyses,
            unnamed_resources_accessed: build_params
                .populate_app_call_resources
                .is_enabled()
                .then(|| group_result.unnamed_resources_accessed.clone())
                .flatten(),
        })
    }

    fn analysis_failure_error(
        group_result: &SimulateTransactionGroupResult,
        failure_message: &str,
        build_params: &BuildParams,
    ) -> ComposerError {
        if build_params.cover_app_call_inner_transaction_fees
            && failure_message.contains("fee too small")
        {
            return ComposerError::StateError {
                message: "Fees were too small to analyze group requirements via simulate. You may need to increase an app call transaction max fee.".to_string(),
            };
        }

        let failed_at = group_result
            .failed_at
            .as_ref()
            .map(|path| {
                path.iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|| "unknown".to_string());

        ComposerError::StateError {
            message: format!(
                "Error analyzing group requirements via simulate in transaction {}: {}",
                failed_at, failure_message
            ),
        }
    }

    /// The fee delta a transaction needs once its own minimum fee and, for
    /// app calls, the fees of its simulated inner transactions are accounted
    /// for.
    fn required_fee_delta_for(
        &self,
        built: &Transaction,
        txn_result: &SimulateTransactionResult,
        suggested_params: &TransactionParams,
    ) -> Result<Option<FeeDelta>, ComposerError> {
        let min_fee = built
            .assign_fee(FeeParams {
                fee_per_byte: suggested_params.fee,
                min_fee: suggested_params.min_fee,
                extra_fee: None,
                max_fee: None,
            })
            .map_err(|e| ComposerError::TransactionError {
                message: format!("Failed to calculate min transaction fee: {}", e),
            })?
            .header()
            .fee
            .unwrap_or(suggested_params.min_fee);

        let own_delta = FeeDelta::from_i64(min_fee as i64 - built.header().fee.unwrap_or(0) as i64);

        if !matches!(built, Transaction::ApplicationCall(_)) {
            return Ok(own_delta);
        }

        let inner_delta = Self::net_inner_fee_delta(
            &txn_result.txn_result.inner_txns,
            suggested_params.min_fee,
            None,
        );
        Ok(FeeDelta::from_i64(
            inner_delta.map(FeeDelta::to_i64).unwrap_or(0)
                + own_delta.map(FeeDelta::to_i64).unwrap_or(0),
        ))
    }

    fn net_inner_fee_delta(
        inner_transactions: &Option<Vec<PendingTransactionResponse>>,
        min_fee: u64,
        seed: Option<FeeDelta>,
    ) -> Option<FeeDelta> {
        let Some(inners) = inner_transactions else {
            return seed;
        };

        // Surplus inner fees do not pool up to the parent and only offset
        // siblings sent earlier, hence the reverse walk
        let mut net = seed;
        for inner in inners.iter().rev() {
            let nested = Self::net_inner_fee_delta(&inner.inner_txns, min_fee, net);
            // Inner transactions pay the flat minimum, never per-byte fees
            let own = FeeDelta::from_i64(
                min_fee as i64 - inner.txn.transaction.header().fee.unwrap_or(0) as i64,
            );
            net = FeeDelta::from_i64(
                nested.map(FeeDelta::to_i64).unwrap_or(0) + own.map(FeeDelta::to_i64).unwrap_or(0),
            );
            if matches!(net, Some(FeeDelta::Surplus(_))) {
                net = None;
            }
        }
        net
    }

    fn build_transaction_header(
        queued: &ComposerTransaction,
        suggested_params: &TransactionParams,
        default_validity_window: u32,
    ) -> Result<TransactionHeader, ComposerError> {
        let genesis_hash: Byte32 = suggested_params
            .genesis_hash
            .clone()
            .try_into()
            .map_err(|_| ComposerError::DecodeError {
                message: "Invalid genesis hash".to_string(),
            })?;

        let first_valid = queued
            .first_valid_round()
            .unwrap_or(suggested_params.last_round);
        let last_valid = queued.last_valid_round().unwrap_or_else(|| {
            first_valid + queued.validity_window().unwrap_or(default_validity_window) as u64
        });

        Ok(TransactionHeader {
            sender: queued.sender(),
            fee: queued.static_fee(),
            first_valid,
            last_valid,
            genesis_id: Some(suggested_params.genesis_id.clone()),
            genesis_hash: Some(genesis_hash),
            group: None,
            lease: queued.lease(),
            note: queued.note(),
            rekey_to: queued.rekey_to(),
        })
    }

    fn get_default_validity_window(genesis_id: &str) -> u32 {
        if genesis_id_is_localnet(genesis_id) {
            1000 // LocalNet gets a bigger window to avoid dead transactions
        } else {
            10
        }
    }

    async fn build_transactions(
        &self,
        suggested_params: &TransactionParams,
        default_validity_window: u32,
        group_analysis: Option<GroupAnalysis>,
    ) -> Result<Vec<Transaction>, ComposerError> {
        use ComposerTransaction as Queued;

        let mut transactions = Vec::with_capacity(self.transactions.len());
        for queued in &self.transactions {
            let header =
                Self::build_transaction_header(queued, suggested_params, default_validity_window)?;
            // Passthrough transactions already carry their final fee
            let needs_fee = header.fee.is_none()
                && !matches!(queued, Queued::Transaction(_) | Queued::TransactionWithSigner(_));

            let mut transaction = match queued {
                Queued::Transaction(txn) => txn.clone(),
                Queued::TransactionWithSigner(tws) => tws.transaction.clone(),
                Queued::Payment(p) => build_payment(p, header),
                Queued::AccountClose(p) => build_account_close(p, header),
                Queued::AssetTransfer(p) => build_asset_transfer(p, header),
                Queued::AssetOptIn(p) => build_asset_opt_in(p, header),
                Queued::AssetOptOut(p) => build_asset_opt_out(p, header),
                Queued::AssetClawback(p) => build_asset_clawback(p, header),
                Queued::AssetCreate(p) => build_asset_create(p, header).map_err(|errors| {
                    ComposerError::TransactionError {
                        message: errors.join("; "),
                    }
                })?,
                Queued::AssetConfig(p) => build_asset_config(p, header),
                Queued::AssetDestroy(p) => build_asset_destroy(p, header),
                Queued::AssetFreeze(p) => build_asset_freeze(p, header),
                Queued::AssetUnfreeze(p) => build_asset_unfreeze(p, header),
                Queued::AppCall(p) => build_app_call(p, header),
                Queued::AppCreateCall(p) => build_app_create_call(p, header),
                Queued::AppUpdateCall(p) => build_app_update_call(p, header),
                Queued::AppDeleteCall(p) => build_app_delete_call(p, header),
                Queued::AppCallMethodCall(p) => build_app_call_method_call(p, header)?,
                Queued::AppCreateMethodCall(p) => build_app_create_method_call(p, header)?,
                Queued::AppUpdateMethodCall(p) => build_app_update_method_call(p, header)?,
                Queued::AppDeleteMethodCall(p) => build_app_delete_method_call(p, header)?,
                Queued::OnlineKeyRegistration(p) => build_online_key_registration(p, header),
                Queued::OfflineKeyRegistration(p) => build_offline_key_registration(p, header),
                Queued::NonParticipationKeyRegistration(p) => {
                    build_non_participation_key_registration(p, header)
                }
            };

            if needs_fee {
                transaction = transaction
                    .assign_fee(FeeParams {
                        fee_per_byte: suggested_params.fee,
                        min_fee: suggested_params.min_fee,
                        extra_fee: queued.extra_fee(),
                        max_fee: queued.max_fee(),
                    })
                    .map_err(|e| ComposerError::TransactionError {
                        message: e.to_string(),
                    })?;
            }

            transactions.push(transaction);
        }

        if let Some(mut group_analysis) = group_analysis {
            self.apply_fee_and_resource_analysis(&mut transactions, &group_analysis)?;

            if let Some(group_resources) = group_analysis.unnamed_resources_accessed.take() {
                populate_group_resources(&mut transactions, group_resources)?;
            }
        }

        if transactions.len() > 1 {
            transactions = transactions.as_slice().assign_group().map_err(|e| {
                ComposerError::TransactionError {
                    message: format!("Failed to assign group: {}", e),
                }
            })?;
        }

        Ok(transactions)
    }

    /// Redistributes the group's fee surplus over its deficits, most
    /// constrained transactions first, then applies per-transaction resource
    /// population from the analysis.
    fn apply_fee_and_resource_analysis(
        &self,
        transactions: &mut [Transaction],
        group_analysis: &GroupAnalysis,
    ) -> Result<(), ComposerError> {
        let mut surplus_pool: u64 = 0;
        let mut ordered = Vec::with_capacity(group_analysis.transactions.len());

        for (index, analysis) in group_analysis.transactions.iter().enumerate() {
            if let Some(FeeDelta::Surplus(amount)) = analysis.required_fee_delta {
                surplus_pool += amount;
            }

            let txn = &transactions[index];
            let fee_is_maxed = self.transactions[index]
                .logical_max_fee()
                .is_some_and(|ceiling| ceiling == txn.header().fee.unwrap_or(0));
            let priority = match analysis.required_fee_delta {
                Some(FeeDelta::Deficit(amount))
                    if fee_is_maxed || !matches!(txn, Transaction::ApplicationCall(_)) =>
                {
                    FeePriority::ImmutableDeficit(amount)
                }
                Some(FeeDelta::Deficit(amount)) => FeePriority::ModifiableDeficit(amount),
                _ => FeePriority::Covered,
            };

            ordered.push((index, analysis, priority));
        }

        // Highest priority first; the sort is stable, so equal priorities
        // keep their original group order
        ordered.sort_by_key(|&(_, _, priority)| std::cmp::Reverse(priority));

        let mut skipped_population = Vec::new();
        for (index, analysis, _) in ordered {
            if let Some(FeeDelta::Deficit(deficit)) = analysis.required_fee_delta {
                // Draw on the group surplus first; whatever it doesn't cover
                // the transaction must cover by raising its own fee
                let drawn = deficit.min(surplus_pool);
                surplus_pool -= drawn;
                let uncovered = deficit - drawn;

                if uncovered > 0 {
                    if !matches!(transactions[index], Transaction::ApplicationCall(_)) {
                        return Err(ComposerError::TransactionError {
                            message: format!(
                                "An additional fee of {} µALGO is required for non app call transaction {}",
                                uncovered, index
                            ),
                        });
                    }

                    let ceiling = self.transactions[index].logical_max_fee();
                    let header = transactions[index].header_mut();
                    let raised_fee = header.fee.unwrap_or(0) + uncovered;
                    if ceiling.is_none() || raised_fee > ceiling.unwrap_or(0) {
                        return Err(ComposerError::TransactionError {
                            message: format!(
                                "Calculated transaction fee {} µALGO is greater than max of {} for transaction {}",
                                raised_fee,
                                ceiling.unwrap_or(0),
                                index
                            ),
                        });
                    }
                    header.fee = Some(raised_fee);
                }
            }

            if let Some(resources) = &analysis.unnamed_resources_accessed {
                // A transaction with hand-declared reference lists is left
                // exactly as the caller wrote it
                if has_explicit_references(&transactions[index]) {
                    skipped_population.push(index);
                } else {
                    populate_transaction_resources(transactions, index, resources)?;
                }
            }
        }

        if !skipped_population.is_empty() {
            skipped_population.sort_unstable();
            log::warn!(
                "Transactions at indexes {:?} declare explicit resource references and were not populated from simulate results",
                skipped_population
            );
        }

        Ok(())
    }

    async fn get_suggested_params(&self) -> Result<TransactionParams, ComposerError> {
        Ok(self.algod_client.suggested_params().await?)
    }

    /// Builds the queued transactions into a transaction group.
    ///
    /// The result is memoized; building again with the same parameters
    /// returns the cached group, while different parameters invalidate it.
    pub async fn build(
        &mut self,
        params: Option<BuildParams>,
    ) -> Result<&Vec<TransactionWithSigner>, ComposerError> {
        if self.built_group.is_some() {
            let invalidated = match (&params, &self.built_params) {
                (Some(requested), built) => built.as_ref() != Some(requested),
                (None, _) => false,
            };
            if invalidated {
                log::debug!("Build parameters changed; rebuilding the transaction group");
                self.built_group = None;
                self.signed_group = None;
            }
        }

        if self.built_group.is_none() {
            let suggested_params = self.get_suggested_params().await?;
            let default_validity_window =
                Self::get_default_validity_window(&suggested_params.genesis_id);

            let group_analysis = match params.as_ref() {
                Some(build_params)
                    if (build_params.cover_app_call_inner_transaction_fees
                        || build_params.populate_app_call_resources.is_enabled())
                        && self.transactions.iter().any(|t| t.is_app_call_kind()) =>
                {
                    Some(
                        self.analyze_group_requirements(
                            &suggested_params,
                            default_validity_window,
                            build_params,
                        )
                        .await?,
                    )
                }
                _ => None,
            };

            let transactions = self
                .build_transactions(&suggested_params, default_validity_window, group_analysis)
                .await?;

            log::debug!(
                "Built a transaction group of {} transaction(s)",
                transactions.len()
            );

            let transactions_with_signers = self.gather_signers(transactions).await?;

            self.built_params = params;
            self.built_group = Some(transactions_with_signers);
        }

        self.built_group.as_ref().ok_or(ComposerError::StateError {
            message: "Transaction group failed to build".to_string(),
        })
    }

    /// Discards any built or signed state and builds again from the queue.
    pub async fn rebuild(
        &mut self,
        params: Option<BuildParams>,
    ) -> Result<&Vec<TransactionWithSigner>, ComposerError> {
        self.built_group = None;
        self.built_params = None;
        self.signed_group = None;
        self.build(params).await
    }

    async fn gather_signers(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<TransactionWithSigner>, ComposerError> {
        let mut with_signers = Vec::with_capacity(transactions.len());

        for (queued, transaction) in self.transactions.iter().zip(transactions) {
            let signer = match queued.signer() {
                Some(signer) => signer,
                None => {
                    let sender = transaction.header().sender.clone();
                    self.signer_resolver
                        .get_signer(&sender)
                        .await
                        .ok_or_else(|| ComposerError::SigningError {
                            message: format!("No signer found for address {}", sender),
                        })?
                }
            };
            with_signers.push(TransactionWithSigner {
                transaction,
                signer,
            });
        }

        Ok(with_signers)
    }

    /// Signs the built group, invoking each distinct signer once with all
    /// the indexes it is responsible for.
    pub async fn gather_signatures(&mut self) -> Result<&Vec<SignedTransaction>, ComposerError> {
        if self.signed_group.is_none() {
            let group = self.built_group.as_ref().ok_or(ComposerError::StateError {
                message: "Cannot gather signatures before building the transaction group"
                    .to_string(),
            })?;

            // One signing call per distinct signer, batched by identity
            let transactions: Vec<Transaction> =
                group.iter().map(|tws| tws.transaction.clone()).collect();
            let mut batches: HashMap<*const dyn TransactionSigner, Vec<usize>> = HashMap::new();
            for (index, tws) in group.iter().enumerate() {
                batches.entry(Arc::as_ptr(&tws.signer)).or_default().push(index);
            }

            let mut slots: Vec<Option<SignedTransaction>> = vec![None; group.len()];
            for indexes in batches.into_values() {
                let signer = &group[indexes[0]].signer;
                let signed = signer
                    .sign_transactions(&transactions, &indexes)
                    .await
                    .map_err(|message| ComposerError::SigningError { message })?;
                for (&slot, stx) in indexes.iter().zip(signed) {
                    slots[slot] = Some(stx);
                }
            }

            let missing: Vec<usize> = slots
                .iter()
                .enumerate()
                .filter_map(|(index, slot)| slot.is_none().then_some(index))
                .collect();
            if !missing.is_empty() {
                return Err(ComposerError::SigningError {
                    message: format!("Transactions at indexes {:?} were not signed", missing),
                });
            }

            self.signed_group = Some(slots.into_iter().flatten().collect());
        }

        self.signed_group.as_ref().ok_or(ComposerError::StateError {
            message: "Transaction group failed to sign".to_string(),
        })
    }

    async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        max_rounds_to_wait: u32,
    ) -> Result<PendingTransactionResponse, ComposerError> {
        let status = self.algod_client.status().await?;
        let first_round = status.last_round + 1;
        let mut round = first_round;

        while round < first_round + max_rounds_to_wait as u64 {
            match self.algod_client.pending_transaction_information(tx_id).await {
                Ok(pending) => {
                    // A pool error means the transaction was kicked out and
                    // will never confirm
                    if !pending.pool_error.is_empty() {
                        return Err(ComposerError::PoolError {
                            message: format!(
                                "Transaction {} was rejected; pool error: {}",
                                tx_id, pending.pool_error
                            ),
                        });
                    }

                    if pending.confirmed_round.is_some() {
                        return Ok(pending);
                    }
                }
                // Not-found just means the transaction hasn't entered a
                // block yet; anything else is permanent
                Err(error) if error.is_not_found() => {}
                Err(error) => return Err(ComposerError::AlgodClientError { source: error }),
            }

            // Wait for a real round before burning wait budget
            let _ = self.algod_client.status_after_block(round).await;
            round += 1;
        }

        Err(ComposerError::MaxWaitRoundExpired {
            message: format!(
                "Transaction {} unconfirmed after {} rounds",
                tx_id, max_rounds_to_wait
            ),
        })
    }

    /// Builds (if needed), signs, submits the group atomically and waits for
    /// every transaction to confirm.
    pub async fn send(
        &mut self,
        params: Option<SendParams>,
    ) -> Result<SendTransactionComposerResults, ComposerError> {
        let build_params = params.as_ref().map(Into::into);

        self.build(build_params).await?;

        let group = {
            let transactions_with_signers =
                self.built_group.as_ref().ok_or(ComposerError::StateError {
                    message: "No transactions to send".to_string(),
                })?;

            if transactions_with_signers.is_empty() {
                return Err(ComposerError::StateError {
                    message: "No transactions to send".to_string(),
                });
            }
            transactions_with_signers[0].transaction.header().group
        };

        self.gather_signatures().await?;

        let signed_transactions = self
            .signed_group
            .clone()
            .ok_or(ComposerError::StateError {
                message: "No signed transactions to send".to_string(),
            })?;

        let wait_rounds = match params
            .as_ref()
            .and_then(|p| p.max_rounds_to_wait_for_confirmation)
        {
            Some(max_rounds) => max_rounds,
            None => {
                let suggested_params = self.get_suggested_params().await?;
                // The last round the node has seen is the first round this
                // group is valid in
                let first_round = suggested_params.last_round;
                let last_round = signed_transactions
                    .iter()
                    .map(|signed_transaction| signed_transaction.transaction.header().last_valid)
                    .max()
                    .ok_or(ComposerError::StateError {
                        message: "Failed to calculate last valid round".to_string(),
                    })?;
                (last_round + 1)
                    .saturating_sub(first_round)
                    .try_into()
                    .unwrap_or(u32::MAX)
            }
        };

        if self.config.debug && self.config.trace_all {
            let _ = self.capture_debug_trace(&signed_transactions).await;
        }

        match self
            .submit_and_confirm(&signed_transactions, wait_rounds)
            .await
        {
            Ok((transaction_ids, confirmations)) => {
                let abi_returns = self.parse_abi_return_values(&confirmations);

                Ok(SendTransactionComposerResults {
                    group,
                    transaction_ids,
                    confirmations,
                    abi_returns,
                })
            }
            Err(error) => Err(self
                .into_send_error(error, &signed_transactions, None)
                .await),
        }
    }

    async fn submit_and_confirm(
        &self,
        signed_transactions: &[SignedTransaction],
        wait_rounds: u32,
    ) -> Result<(Vec<String>, Vec<PendingTransactionResponse>), ComposerError> {
        let mut encoded_bytes = Vec::new();
        for signed_txn in signed_transactions {
            let encoded_txn = signed_txn
                .encode()
                .map_err(|e| ComposerError::TransactionError {
                    message: format!("Failed to encode signed transaction: {}", e),
                })?;
            encoded_bytes.extend_from_slice(&encoded_txn);
        }

        self.algod_client.send_raw_transaction(encoded_bytes).await?;

        let transaction_ids: Vec<String> = signed_transactions
            .iter()
            .map(|txn| txn.id())
            .collect::<Result<Vec<String>, _>>()?;

        match (transaction_ids.as_slice(), signed_transactions.first()) {
            ([id], _) => log::debug!("Sent transaction {}", id),
            (ids, Some(first)) => log::debug!(
                "Sent {} transactions as group {}",
                ids.len(),
                first
                    .transaction
                    .header()
                    .group
                    .map(|g| BASE64_STANDARD.encode(g))
                    .unwrap_or_else(|| "-".to_string())
            ),
            _ => {}
        }

        let mut confirmations = Vec::new();
        for id in &transaction_ids {
            confirmations.push(self.wait_for_confirmation(id, wait_rounds).await?);
        }

        Ok((transaction_ids, confirmations))
    }

    /// Simulates the group against current node state without committing.
    ///
    /// Reuses an already built group; otherwise builds fresh without the
    /// fee/resource analysis pass.
    pub async fn simulate(
        &mut self,
        params: Option<SimulateParams>,
    ) -> Result<SimulateComposerResults, ComposerError> {
        let params = params.unwrap_or_default();

        if self.built_group.is_none() {
            self.build(None).await?;
        }

        let transactions: Vec<Transaction> = self
            .built_group
            .as_ref()
            .ok_or(ComposerError::StateError {
                message: "No transactions to simulate".to_string(),
            })?
            .iter()
            .map(|txn_with_signer| txn_with_signer.transaction.clone())
            .collect();

        let group = transactions.first().and_then(|txn| txn.header().group);

        let mut allow_empty_signatures = params.allow_empty_signatures;
        let mut fix_signers = params.fix_signers;

        let signed_transactions: Vec<SignedTransaction> = if params.skip_signatures {
            // Empty signatures require the node to be told to accept them
            allow_empty_signatures = Some(true);
            fix_signers = Some(true);
            transactions
                .iter()
                .map(|txn| SignedTransaction {
                    transaction: txn.clone(),
                    signature: Some(EMPTY_SIGNATURE),
                    auth_address: None,
                })
                .collect()
        } else {
            self.gather_signatures().await?.clone()
        };

        let capture_trace = self.config.debug && !params.suppress_trace;
        let allow_more_logging = match params.allow_more_logs {
            Some(allow) => Some(allow),
            None if capture_trace => Some(true),
            None => None,
        };
        let exec_trace_config = match params.exec_trace_config {
            Some(config) => Some(config),
            None if capture_trace => Some(SimulateTraceConfig::all()),
            None => None,
        };

        let request = SimulateRequest {
            txn_groups: vec![SimulateRequestTransactionGroup {
                txns: signed_transactions.clone(),
            }],
            round: params.round,
            allow_empty_signatures,
            allow_more_logging,
            allow_unnamed_resources: params.allow_unnamed_resources,
            fix_signers,
            exec_trace_config,
        };

        let response = match self.algod_client.simulate_transactions(request).await {
            Ok(response) => response,
            Err(error) => {
                return Err(self
                    .into_send_error(error.into(), &signed_transactions, None)
                    .await);
            }
        };

        let response_value = serde_json::to_value(&response).ok();

        if capture_trace {
            if let Some(ref value) = response_value {
                self.config
                    .events
                    .emit(
                        EventType::TxnGroupSimulated,
                        EventData::TxnGroupSimulated(TxnGroupSimulatedEventData {
                            simulate_response: value.clone(),
                        }),
                    )
                    .await;
            }
        }

        let group_response = &response.txn_groups[0];

        if let Some(failure_message) = &group_response.failure_message {
            if !params.result_on_failure {
                let failed_at = group_response
                    .failed_at
                    .as_ref()
                    .map(|path| {
                        path.iter()
                            .map(|i| i.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_else(|| "unknown".to_string());
                let error = ComposerError::TransactionError {
                    message: format!(
                        "Transaction failed at transaction(s) {} in the group. {}",
                        failed_at, failure_message
                    ),
                };
                return Err(self
                    .into_send_error(error, &signed_transactions, response_value)
                    .await);
            }
            log::warn!("Simulation failed: {}", failure_message);
        }

        let transaction_ids: Vec<String> = signed_transactions
            .iter()
            .map(|txn| txn.id())
            .collect::<Result<Vec<String>, _>>()?;

        let confirmations: Vec<PendingTransactionResponse> = group_response
            .txn_results
            .iter()
            .map(|result| result.txn_result.clone())
            .collect();

        let abi_returns = self.parse_abi_return_values(&confirmations);

        Ok(SimulateComposerResults {
            group,
            transaction_ids,
            confirmations,
            abi_returns,
            simulate_response: response,
        })
    }

    /// Best-effort trace capture; failures are logged, never surfaced.
    async fn capture_debug_trace(
        &self,
        signed_transactions: &[SignedTransaction],
    ) -> Option<serde_json::Value> {
        let request = SimulateRequest {
            txn_groups: vec![SimulateRequestTransactionGroup {
                txns: signed_transactions.to_vec(),
            }],
            allow_empty_signatures: Some(true),
            allow_more_logging: Some(true),
            allow_unnamed_resources: Some(true),
            fix_signers: Some(true),
            exec_trace_config: Some(SimulateTraceConfig::all()),
            round: None,
        };

        match self.algod_client.simulate_transactions(request).await {
            Ok(response) => {
                let value = serde_json::to_value(&response).ok()?;
                self.config
                    .events
                    .emit(
                        EventType::TxnGroupSimulated,
                        EventData::TxnGroupSimulated(TxnGroupSimulatedEventData {
                            simulate_response: value.clone(),
                        }),
                    )
                    .await;
                Some(value)
            }
            Err(error) => {
                log::warn!("Failed to capture debug trace: {}", error);
                None
            }
        }
    }

    /// Wraps a submission/confirmation/simulation failure in a
    /// [`ComposerError::SendError`] carrying recovery context and the
    /// original error as its source, then runs the registered error
    /// transformers over it.
    async fn into_send_error(
        &self,
        error: ComposerError,
        signed_transactions: &[SignedTransaction],
        simulate_response: Option<serde_json::Value>,
    ) -> ComposerError {
        let message = match &error {
            ComposerError::AlgodClientError { source } => extract_algod_error_message(source),
            other => other.to_string(),
        };

        let traces = if self.config.debug && simulate_response.is_none() {
            self.capture_debug_trace(signed_transactions).await
        } else {
            None
        };

        let send_error = ComposerError::SendError {
            message,
            context: Box::new(ErrorContext {
                traces,
                sent_transactions: Some(signed_transactions.to_vec()),
                simulate_response,
            }),
            source: Box::new(error),
        };

        self.transform_error(send_error).await
    }

    async fn transform_error(&self, error: ComposerError) -> ComposerError {
        let mut current = error;
        for transformer in &self.error_transformers {
            match transformer.transform(&current).await {
                Ok(Some(next)) => current = next,
                Ok(None) => {}
                Err(message) => {
                    return ComposerError::TransformerFailed {
                        message,
                        original: Box::new(current),
                    };
                }
            }
        }
        current
    }
}

/// Whether the caller declared any non-empty resource reference list on an
/// app call. Method call builders always materialize the lists, so empty
/// ones do not count as declared.
fn has_explicit_references(transaction: &Transaction) -> bool {
    let Transaction::ApplicationCall(fields) = transaction else {
        return false;
    };
    fields
        .account_references
        .as_ref()
        .is_some_and(|refs| !refs.is_empty())
        || fields
            .app_references
            .as_ref()
            .is_some_and(|refs| !refs.is_empty())
        || fields
            .asset_references
            .as_ref()
            .is_some_and(|refs| !refs.is_empty())
}

/// Pulls the most useful human-readable message out of a node error. HTTP
/// error bodies are checked for the conventional message keys before falling
/// back to the raw body.
fn extract_algod_error_message(error: &AlgodError) -> String {
    match error {
        AlgodError::HttpStatus { body, .. } => extract_payload_message(body),
        other => other.to_string(),
    }
}

fn extract_payload_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => {
            for key in ["message", "msg", "error", "detail", "description"] {
                if let Some(serde_json::Value::String(message)) = map.get(key) {
                    return message.clone();
                }
            }
            body.to_string()
        }
        Ok(serde_json::Value::Array(items)) => items
            .first()
            .and_then(|item| item.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algod::NodeStatus;
    use crate::transact::PaymentTransactionFields;
    use crate::transactions::common::EmptySigner;
    use pretty_assertions::assert_eq;

    struct StaticAlgod {
        params: TransactionParams,
    }

    impl StaticAlgod {
        fn new() -> Self {
            Self {
                params: TransactionParams {
                    consensus_version: "future".to_string(),
                    fee: 0,
                    last_round: 1000,
                    genesis_id: "testnet-v1.0".to_string(),
                    genesis_hash: vec![7u8; 32],
                    min_fee: 1000,
                },
            }
        }
    }

    #[async_trait]
    impl AlgodClient for StaticAlgod {
        async fn suggested_params(&self) -> Result<TransactionParams, AlgodError> {
            Ok(self.params.clone())
        }

        async fn simulate_transactions(
            &self,
            _request: SimulateRequest,
        ) -> Result<SimulateResponse, AlgodError> {
            Err(AlgodError::Transport {
                message: "simulate not available in this test".to_string(),
            })
        }

        async fn send_raw_transaction(&self, _bytes: Vec<u8>) -> Result<String, AlgodError> {
            Err(AlgodError::Transport {
                message: "submit not available in this test".to_string(),
            })
        }

        async fn status(&self) -> Result<NodeStatus, AlgodError> {
            Ok(NodeStatus { last_round: 1000 })
        }

        async fn status_after_block(&self, round: u64) -> Result<NodeStatus, AlgodError> {
            Ok(NodeStatus { last_round: round })
        }

        async fn pending_transaction_information(
            &self,
            _tx_id: &str,
        ) -> Result<PendingTransactionResponse, AlgodError> {
            Err(AlgodError::HttpStatus {
                status: 404,
                body: "{}".to_string(),
            })
        }
    }

    fn test_composer() -> Composer {
        Composer::new(Arc::new(StaticAlgod::new()), Arc::new(EmptySigner {}))
    }

    fn payment_params(sender_byte: u8) -> PaymentParams {
        PaymentParams {
            sender: Address([sender_byte; 32]),
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
            receiver: Address([2u8; 32]),
            amount: 1000,
        }
    }

    fn payment_transaction() -> Transaction {
        Transaction::Payment(PaymentTransactionFields {
            header: TransactionHeader {
                sender: Address([1u8; 32]),
                first_valid: 1000,
                last_valid: 2000,
                ..Default::default()
            },
            receiver: Address([2u8; 32]),
            amount: 1,
            close_remainder_to: None,
        })
    }

    #[test]
    fn test_add_transaction() {
        let mut composer = test_composer();
        assert!(composer.add_transaction(payment_transaction(), None).is_ok());
        assert_eq!(composer.count(), 1);
    }

    #[test]
    fn test_add_transaction_rejects_invalid() {
        let mut composer = test_composer();
        let mut txn = payment_transaction();
        txn.header_mut().first_valid = 2000;
        txn.header_mut().last_valid = 1000;

        let result = composer.add_transaction(txn, None);
        assert!(matches!(
            result,
            Err(ComposerError::TransactionError { .. })
        ));
        assert_eq!(composer.count(), 0);
    }

    #[test]
    fn test_add_transaction_strips_group() {
        let mut composer = test_composer();
        let mut txn = payment_transaction();
        txn.header_mut().group = Some([9u8; 32]);

        composer.add_transaction(txn, None).unwrap();
        match &composer.transactions[0] {
            ComposerTransaction::Transaction(txn) => assert!(txn.header().group.is_none()),
            other => panic!("expected passthrough transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_add_too_many_transactions() {
        let mut composer = test_composer();
        for _ in 0..16 {
            assert!(composer.add_transaction(payment_transaction(), None).is_ok());
        }
        let result = composer.add_transaction(payment_transaction(), None);
        assert!(matches!(result, Err(ComposerError::GroupSizeError)));
    }

    #[test]
    fn test_add_payment() {
        let mut composer = test_composer();
        assert!(composer.add_payment(payment_params(1)).is_ok());
    }

    #[test]
    fn test_add_composer_merges_queues() {
        let mut first = test_composer();
        first.add_payment(payment_params(1)).unwrap();

        let mut second = test_composer();
        second.add_payment(payment_params(3)).unwrap();
        second.add_payment(payment_params(4)).unwrap();

        first.add_composer(second).unwrap();
        assert_eq!(first.count(), 3);
    }

    #[test]
    fn test_add_composer_is_all_or_nothing() {
        let mut first = test_composer();
        for _ in 0..15 {
            first.add_payment(payment_params(1)).unwrap();
        }

        let mut second = test_composer();
        second.add_payment(payment_params(3)).unwrap();
        second.add_payment(payment_params(4)).unwrap();

        let result = first.add_composer(second);
        assert!(matches!(result, Err(ComposerError::GroupSizeError)));
        assert_eq!(first.count(), 15);
    }

    #[test]
    fn test_logical_max_fee() {
        let mut params = payment_params(1);
        params.static_fee = Some(2000);
        params.max_fee = Some(5000);
        let ctxn = ComposerTransaction::Payment(params);
        assert_eq!(ctxn.logical_max_fee(), Some(5000));

        let mut params = payment_params(1);
        params.static_fee = Some(2000);
        params.max_fee = Some(1000);
        let ctxn = ComposerTransaction::Payment(params);
        assert_eq!(ctxn.logical_max_fee(), Some(2000));

        let ctxn = ComposerTransaction::Payment(payment_params(1));
        assert_eq!(ctxn.logical_max_fee(), None);
    }

    #[test]
    fn test_accessor_defaults_for_passthrough() {
        let ctxn = ComposerTransaction::Transaction(payment_transaction());
        assert_eq!(ctxn.sender(), Address::default());
        assert!(ctxn.signer().is_none());
        assert!(ctxn.static_fee().is_none());
        assert!(ctxn.max_fee().is_none());
    }

    #[test]
    fn test_set_max_fees() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();
        composer.add_payment(payment_params(3)).unwrap();

        let mut max_fees = HashMap::new();
        max_fees.insert(1usize, 4000u64);
        composer.set_max_fees(&max_fees).unwrap();

        assert_eq!(composer.transactions[0].max_fee(), None);
        assert_eq!(composer.transactions[1].max_fee(), Some(4000));
    }

    #[test]
    fn test_set_max_fees_rejects_out_of_range_index() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();

        let mut max_fees = HashMap::new();
        max_fees.insert(5usize, 4000u64);
        let result = composer.set_max_fees(&max_fees);
        assert!(matches!(result, Err(ComposerError::StateError { .. })));
    }

    #[test]
    fn test_set_max_fees_rejects_passthrough_transaction() {
        let mut composer = test_composer();
        composer.add_transaction(payment_transaction(), None).unwrap();

        let mut max_fees = HashMap::new();
        max_fees.insert(0usize, 4000u64);
        let result = composer.set_max_fees(&max_fees);
        assert!(matches!(
            result,
            Err(ComposerError::TransactionError { .. })
        ));
    }

    #[tokio::test]
    async fn test_build_assigns_header_and_fee() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();

        let built = composer.build(None).await.unwrap();
        assert_eq!(built.len(), 1);

        let header = built[0].transaction.header();
        assert_eq!(header.first_valid, 1000);
        assert_eq!(header.last_valid, 1010);
        assert_eq!(header.fee, Some(1000));
        assert_eq!(header.genesis_id.as_deref(), Some("testnet-v1.0"));
        assert!(header.group.is_none());
    }

    #[tokio::test]
    async fn test_build_groups_multiple_transactions() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();
        composer.add_payment(payment_params(3)).unwrap();

        let built = composer.build(None).await.unwrap();
        assert_eq!(built.len(), 2);

        let group_id = built[0].transaction.header().group.unwrap();
        assert_eq!(built[1].transaction.header().group.unwrap(), group_id);
    }

    #[tokio::test]
    async fn test_build_is_memoized() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();

        let first = composer.build(None).await.unwrap()[0].transaction.clone();
        let second = composer.build(None).await.unwrap()[0].transaction.clone();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_add_after_build_fails() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();
        composer.build(None).await.unwrap();

        let result = composer.add_payment(payment_params(3));
        assert!(matches!(result, Err(ComposerError::StateError { .. })));
    }

    #[tokio::test]
    async fn test_rebuild_allows_further_mutation() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();
        composer.build(None).await.unwrap();

        composer.rebuild(None).await.unwrap();
        // rebuild itself re-builds, so mutation is still locked afterwards
        assert!(composer.built_group.is_some());
    }

    #[tokio::test]
    async fn test_static_fee_is_used_verbatim() {
        let mut composer = test_composer();
        let mut params = payment_params(1);
        params.static_fee = Some(12_345);
        composer.add_payment(params).unwrap();

        let built = composer.build(None).await.unwrap();
        assert_eq!(built[0].transaction.header().fee, Some(12_345));
    }

    #[tokio::test]
    async fn test_validity_window_override() {
        let mut composer = test_composer();
        let mut params = payment_params(1);
        params.validity_window = Some(50);
        composer.add_payment(params).unwrap();

        let built = composer.build(None).await.unwrap();
        let header = built[0].transaction.header();
        assert_eq!(header.last_valid, header.first_valid + 50);
    }

    #[tokio::test]
    async fn test_gather_signatures_requires_build() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();

        let result = composer.gather_signatures().await;
        assert!(matches!(result, Err(ComposerError::StateError { .. })));
    }

    #[tokio::test]
    async fn test_gather_signatures() {
        let mut composer = test_composer();
        composer.add_payment(payment_params(1)).unwrap();
        composer.build(None).await.unwrap();

        let signed = composer.gather_signatures().await.unwrap();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].signature, Some(EMPTY_SIGNATURE));
    }

    #[test]
    fn test_extract_payload_message() {
        assert_eq!(
            extract_payload_message(r#"{"message":"overspend"}"#),
            "overspend"
        );
        assert_eq!(
            extract_payload_message(r#"{"error":"logic eval error"}"#),
            "logic eval error"
        );
        assert_eq!(extract_payload_message(r#"["first","second"]"#), "first");
        assert_eq!(extract_payload_message("plain text"), "plain text");
    }
}
