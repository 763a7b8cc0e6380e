use std::collections::VecDeque;
use std::sync::{Mutex, Once};

use algokit_composer::algod::{
    AlgodClient, AlgodError, NodeStatus, PendingTransactionResponse, SimulateRequest,
    SimulateResponse, SimulateTransactionGroupResult, SimulateTransactionResult,
    SimulateUnnamedResourcesAccessed, TransactionParams,
};
use algokit_composer::transact::{
    Address, PaymentTransactionFields, SignedTransaction, Transaction, TransactionHeader,
};
use algokit_composer::transactions::{PaymentParams, TransactionSigner};
use async_trait::async_trait;

static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call multiple times; only the first
/// call across the suite takes effect.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .format_target(true)
            .format_module_path(false)
            .try_init();
    });
}

/// An in-memory node the composer runs against. Responses are queued ahead
/// of the test; every request is recorded for assertion.
pub struct MockAlgod {
    pub params: TransactionParams,
    pub simulate_responses: Mutex<VecDeque<SimulateResponse>>,
    pub simulate_requests: Mutex<Vec<SimulateRequest>>,
    pub submit_error: Mutex<Option<AlgodError>>,
    pub submitted: Mutex<Vec<Vec<u8>>>,
    pub pending_responses: Mutex<VecDeque<PendingTransactionResponse>>,
    pub round_waits: Mutex<Vec<u64>>,
}

impl MockAlgod {
    pub fn new() -> Self {
        Self {
            params: TransactionParams {
                consensus_version: "future".to_string(),
                fee: 0,
                last_round: 1000,
                genesis_id: "testnet-v1.0".to_string(),
                genesis_hash: vec![7u8; 32],
                min_fee: 1000,
            },
            simulate_responses: Mutex::new(VecDeque::new()),
            simulate_requests: Mutex::new(Vec::new()),
            submit_error: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            pending_responses: Mutex::new(VecDeque::new()),
            round_waits: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_simulate_response(&self, response: SimulateResponse) {
        self.simulate_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_pending_response(&self, response: PendingTransactionResponse) {
        self.pending_responses.lock().unwrap().push_back(response);
    }

    pub fn fail_submissions_with(&self, error: AlgodError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    pub fn simulate_request_count(&self) -> usize {
        self.simulate_requests.lock().unwrap().len()
    }

    /// The rounds the composer blocked on via `status_after_block`.
    pub fn round_wait_count(&self) -> usize {
        self.round_waits.lock().unwrap().len()
    }
}

#[async_trait]
impl AlgodClient for MockAlgod {
    async fn suggested_params(&self) -> Result<TransactionParams, AlgodError> {
        Ok(self.params.clone())
    }

    async fn simulate_transactions(
        &self,
        request: SimulateRequest,
    ) -> Result<SimulateResponse, AlgodError> {
        self.simulate_requests.lock().unwrap().push(request);
        self.simulate_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AlgodError::Transport {
                message: "no simulate response queued".to_string(),
            })
    }

    async fn send_raw_transaction(&self, bytes: Vec<u8>) -> Result<String, AlgodError> {
        if let Some(error) = self.submit_error.lock().unwrap().take() {
            return Err(error);
        }
        self.submitted.lock().unwrap().push(bytes);
        Ok(String::new())
    }

    async fn status(&self) -> Result<NodeStatus, AlgodError> {
        Ok(NodeStatus {
            last_round: self.params.last_round,
        })
    }

    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, AlgodError> {
        self.round_waits.lock().unwrap().push(round);
        Ok(NodeStatus { last_round: round })
    }

    async fn pending_transaction_information(
        &self,
        _tx_id: &str,
    ) -> Result<PendingTransactionResponse, AlgodError> {
        self.pending_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AlgodError::HttpStatus {
                status: 404,
                body: "{}".to_string(),
            })
    }
}

/// A signer that records every batch of indexes it is asked to sign.
pub struct CountingSigner {
    pub calls: Mutex<Vec<Vec<usize>>>,
}

impl CountingSigner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TransactionSigner for CountingSigner {
    async fn sign_transactions(
        &self,
        transactions: &[Transaction],
        indexes: &[usize],
    ) -> Result<Vec<SignedTransaction>, String> {
        self.calls.lock().unwrap().push(indexes.to_vec());
        Ok(indexes
            .iter()
            .map(|&idx| SignedTransaction {
                transaction: transactions[idx].clone(),
                signature: Some([0u8; 64]),
                auth_address: None,
            })
            .collect())
    }
}

pub fn payment_params(sender_byte: u8) -> PaymentParams {
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
        amount: 100_000,
    }
}

/// A minimal signed payment used to fill response bodies where the composer
/// only looks at specific fields.
pub fn dummy_signed_payment(fee: Option<u64>) -> SignedTransaction {
    SignedTransaction {
        transaction: Transaction::Payment(PaymentTransactionFields {
            header: TransactionHeader {
                sender: Address([1u8; 32]),
                fee,
                first_valid: 1000,
                last_valid: 2000,
                ..Default::default()
            },
            receiver: Address([2u8; 32]),
            amount: 1,
            close_remainder_to: None,
        }),
        signature: Some([0u8; 64]),
        auth_address: None,
    }
}

pub fn confirmed_response(round: u64) -> PendingTransactionResponse {
    PendingTransactionResponse {
        txn: dummy_signed_payment(Some(1000)),
        confirmed_round: Some(round),
        pool_error: String::new(),
        logs: None,
        inner_txns: None,
    }
}

/// A simulation result for one transaction whose execution spawned inner
/// transactions paying the given fees.
pub fn simulate_result_with_inners(inner_fees: &[u64]) -> SimulateTransactionResult {
    let inner_txns = if inner_fees.is_empty() {
        None
    } else {
        Some(
            inner_fees
                .iter()
                .map(|&fee| PendingTransactionResponse {
                    txn: dummy_signed_payment(Some(fee)),
                    confirmed_round: None,
                    pool_error: String::new(),
                    logs: None,
                    inner_txns: None,
                })
                .collect(),
        )
    };

    SimulateTransactionResult {
        txn_result: PendingTransactionResponse {
            txn: dummy_signed_payment(Some(1000)),
            confirmed_round: None,
            pool_error: String::new(),
            logs: None,
            inner_txns,
        },
        app_budget_consumed: None,
        unnamed_resources_accessed: None,
        exec_trace: None,
    }
}

pub fn simulate_response(
    txn_results: Vec<SimulateTransactionResult>,
    group_resources: Option<SimulateUnnamedResourcesAccessed>,
) -> SimulateResponse {
    SimulateResponse {
        version: 2,
        last_round: 1000,
        txn_groups: vec![SimulateTransactionGroupResult {
            txn_results,
            failure_message: None,
            failed_at: None,
            app_budget_added: None,
            app_budget_consumed: None,
            unnamed_resources_accessed: group_resources,
        }],
        exec_trace_config: None,
    }
}

pub fn failed_simulate_response(failure_message: &str, failed_at: u64) -> SimulateResponse {
    SimulateResponse {
        version: 2,
        last_round: 1000,
        txn_groups: vec![SimulateTransactionGroupResult {
            txn_results: vec![simulate_result_with_inners(&[])],
            failure_message: Some(failure_message.to_string()),
            failed_at: Some(vec![failed_at]),
            app_budget_added: None,
            app_budget_consumed: None,
            unnamed_resources_accessed: None,
        }],
        exec_trace_config: None,
    }
}
