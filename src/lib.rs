pub mod abi;
pub mod algod;
pub mod config;
pub mod transact;
pub mod transactions;

// Re-exports for a clean crate surface
pub use abi::{ABIMethod, ABIReturn, ABIType, ABIValue};
pub use algod::{AlgodClient, AlgodError};
pub use config::{ComposerConfig, genesis_id_is_localnet};
pub use transact::{Address, SignedTransaction, Transaction, TransactionHeader};
pub use transactions::{
    AppCallParams, AppCreateParams, AppDeleteParams, AppUpdateParams, AssetCreateParams,
    AssetDestroyParams, BuildParams, Composer, ComposerError, ComposerTransaction, EmptySigner,
    KeyPairSigner, PaymentParams, SendParams, SignerResolver, TransactionSigner,
};
