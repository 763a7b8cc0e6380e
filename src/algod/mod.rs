//! The node client contract consumed by the composer.
//!
//! Transport concerns (HTTP, retries, encoding negotiation) live behind this
//! trait; tests supply in-memory implementations.

mod models;

pub use models::{
    ApplicationLocalReference, AssetHoldingReference, NodeStatus, PendingTransactionResponse,
    SimulateBoxReference, SimulateRequest, SimulateRequestTransactionGroup, SimulateResponse,
    SimulateTraceConfig, SimulateTransactionGroupResult, SimulateTransactionResult,
    SimulateUnnamedResourcesAccessed, TransactionParams,
};

use async_trait::async_trait;
use snafu::Snafu;

/// Errors surfaced by an [`AlgodClient`] implementation.
#[derive(Debug, Snafu)]
pub enum AlgodError {
    /// The node responded with an unexpected HTTP status. The raw body is
    /// kept so callers can extract a human-readable message from it.
    #[snafu(display("Unexpected HTTP status {status}: {body}"))]
    HttpStatus { status: u16, body: String },

    /// The request could not be delivered to the node.
    #[snafu(display("Transport error: {message}"))]
    Transport { message: String },

    /// The node's response could not be decoded.
    #[snafu(display("Failed to decode node response: {message}"))]
    Decode { message: String },
}

impl AlgodError {
    /// True for errors worth retrying during confirmation polling, which is
    /// only the not-found case while a transaction has yet to enter a block.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AlgodError::HttpStatus { status: 404, .. })
    }
}

/// The six node operations the composer depends on.
#[async_trait]
pub trait AlgodClient: Send + Sync {
    /// Fetch suggested parameters for constructing new transactions.
    async fn suggested_params(&self) -> Result<TransactionParams, AlgodError>;

    /// Execute a transaction group against current state without committing.
    async fn simulate_transactions(
        &self,
        request: SimulateRequest,
    ) -> Result<SimulateResponse, AlgodError>;

    /// Broadcast concatenated signed transaction bytes atomically.
    /// Returns the id of the first transaction in the group.
    async fn send_raw_transaction(&self, bytes: Vec<u8>) -> Result<String, AlgodError>;

    async fn status(&self) -> Result<NodeStatus, AlgodError>;

    /// Block until the given round is reached, then return the node status.
    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, AlgodError>;

    async fn pending_transaction_information(
        &self,
        tx_id: &str,
    ) -> Result<PendingTransactionResponse, AlgodError>;
}
