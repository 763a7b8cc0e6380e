pub mod app_call;
pub mod asset_config;
pub mod asset_freeze;
pub mod asset_transfer;
pub mod common;
pub mod composer;
pub mod fee;
pub mod key_registration;
pub mod payment;

mod resources;

// Re-export commonly used transaction types
pub use app_call::{
    AppCallMethodCallParams, AppCallParams, AppCreateMethodCallParams, AppCreateParams,
    AppDeleteMethodCallParams, AppDeleteParams, AppMethodCallArg, AppUpdateMethodCallParams,
    AppUpdateParams, ProcessedAppMethodCallArg,
};
pub use asset_config::{AssetConfigParams, AssetCreateParams, AssetDestroyParams};
pub use asset_freeze::{AssetFreezeParams, AssetUnfreezeParams};
pub use asset_transfer::{
    AssetClawbackParams, AssetOptInParams, AssetOptOutParams, AssetTransferParams,
};
pub use common::{
    DefaultSignerResolver, EmptySigner, KeyPairSigner, SignerResolver, TransactionSigner,
    TransactionWithSigner,
};
pub use composer::{
    BuildParams, Composer, ComposerError, ComposerTransaction, ErrorContext, ErrorTransformer,
    ResourcePopulation, SendParams, SendTransactionComposerResults, SimulateComposerResults,
    SimulateParams,
};
pub use fee::{FeeDelta, FeePriority};
pub use key_registration::{
    NonParticipationKeyRegistrationParams, OfflineKeyRegistrationParams,
    OnlineKeyRegistrationParams,
};
pub use payment::{AccountCloseParams, PaymentParams};
