mod common;

use std::str::FromStr;
use std::sync::Arc;

use algokit_composer::abi::ABIMethod;
use algokit_composer::algod::{AlgodError, SimulateTraceConfig, SimulateUnnamedResourcesAccessed};
use algokit_composer::transact::{Address, Transaction};
use algokit_composer::transactions::{
    AppCallMethodCallParams, AppCallParams, AppMethodCallArg, BuildParams, Composer, ComposerError,
    EmptySigner, ErrorTransformer, ResourcePopulation, SendParams, SimulateParams,
};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rstest::rstest;

use common::{
    CountingSigner, MockAlgod, confirmed_response, failed_simulate_response, init_test_logging,
    payment_params, simulate_response, simulate_result_with_inners,
};

fn composer_with(mock: &Arc<MockAlgod>) -> Composer {
    init_test_logging();
    Composer::new(mock.clone(), Arc::new(EmptySigner {}))
}

fn app_call_params(sender_byte: u8, max_fee: Option<u64>) -> AppCallParams {
    AppCallParams {
        sender: Address([sender_byte; 32]),
        app_id: 1234,
        max_fee,
        ..Default::default()
    }
}

fn cover_fees() -> Option<BuildParams> {
    Some(BuildParams {
        cover_app_call_inner_transaction_fees: true,
        populate_app_call_resources: ResourcePopulation::Disabled,
    })
}

#[tokio::test]
async fn test_build_preserves_queue_order() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(10)).unwrap();
    composer.add_payment(payment_params(11)).unwrap();
    composer.add_payment(payment_params(12)).unwrap();

    let built = composer.build(None).await.unwrap();
    let senders: Vec<u8> = built
        .iter()
        .map(|t| t.transaction.header().sender.0[0])
        .collect();
    assert_eq!(senders, vec![10, 11, 12]);

    let group_id = built[0].transaction.header().group.unwrap();
    assert!(built.iter().all(|t| t.transaction.header().group == Some(group_id)));
}

#[tokio::test]
async fn test_method_call_transaction_args_expand_in_order() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    let params = AppCallMethodCallParams {
        sender: Address([1u8; 32]),
        app_id: 1234,
        method: ABIMethod::from_str("deposit(pay)void").unwrap(),
        args: vec![AppMethodCallArg::Payment(payment_params(1))],
        ..Default::default()
    };

    composer.add_app_call_method_call(params).unwrap();
    assert_eq!(composer.count(), 2);

    let built = composer.build(None).await.unwrap();
    assert!(matches!(built[0].transaction, Transaction::Payment(_)));
    assert!(matches!(
        built[1].transaction,
        Transaction::ApplicationCall(_)
    ));
}

#[tokio::test]
async fn test_surplus_fees_cover_app_call_inner_deficit() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    // An app call that spawns one zero-fee inner transaction, alongside a
    // payment overpaying by 1000 µALGO
    composer.add_app_call(app_call_params(1, Some(2000))).unwrap();
    let mut payment = payment_params(3);
    payment.static_fee = Some(2000);
    composer.add_payment(payment).unwrap();

    mock.queue_simulate_response(simulate_response(
        vec![
            simulate_result_with_inners(&[0]),
            simulate_result_with_inners(&[]),
        ],
        None,
    ));

    let built = composer.build(cover_fees()).await.unwrap();

    // The payment's surplus funds the inner deficit; no fee is raised
    assert_eq!(built[0].transaction.header().fee, Some(1000));
    assert_eq!(built[1].transaction.header().fee, Some(2000));
    assert_eq!(mock.simulate_request_count(), 1);
}

#[tokio::test]
async fn test_app_call_raises_own_fee_when_no_surplus() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_app_call(app_call_params(1, Some(3000))).unwrap();

    mock.queue_simulate_response(simulate_response(
        vec![simulate_result_with_inners(&[0])],
        None,
    ));

    let built = composer.build(cover_fees()).await.unwrap();
    assert_eq!(built[0].transaction.header().fee, Some(2000));
}

#[tokio::test]
async fn test_fee_raise_rejected_above_max_fee() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_app_call(app_call_params(1, Some(1500))).unwrap();

    mock.queue_simulate_response(simulate_response(
        vec![simulate_result_with_inners(&[0])],
        None,
    ));

    let result = composer.build(cover_fees()).await;
    match result {
        Err(ComposerError::TransactionError { message }) => {
            assert!(message.contains("greater than max of 1500"), "{}", message);
        }
        other => panic!("expected transaction error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_app_call_deficit_cannot_be_raised() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    // A payment underpaying the min fee, with no surplus in the group
    let mut payment = payment_params(1);
    payment.static_fee = Some(500);
    composer.add_payment(payment).unwrap();
    composer.add_app_call(app_call_params(3, Some(1000))).unwrap();

    mock.queue_simulate_response(simulate_response(
        vec![
            simulate_result_with_inners(&[]),
            simulate_result_with_inners(&[]),
        ],
        None,
    ));

    let result = composer.build(cover_fees()).await;
    match result {
        Err(ComposerError::TransactionError { message }) => {
            assert!(
                message.contains("non app call transaction 0"),
                "{}",
                message
            );
        }
        other => panic!("expected transaction error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_max_fee_rejected_when_covering_inner_fees() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_app_call(app_call_params(1, None)).unwrap();

    let result = composer.build(cover_fees()).await;
    match result {
        Err(ComposerError::StateError { message }) => {
            assert!(message.contains("Please provide a max fee"), "{}", message);
        }
        other => panic!("expected state error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fee_too_small_failure_gets_dedicated_message() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_app_call(app_call_params(1, Some(2000))).unwrap();

    mock.queue_simulate_response(failed_simulate_response(
        "transaction 0 fee too small: 1000 < 2000",
        0,
    ));

    let result = composer.build(cover_fees()).await;
    match result {
        Err(ComposerError::StateError { message }) => {
            assert!(message.contains("Fees were too small"), "{}", message);
        }
        other => panic!("expected state error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resource_population_from_analysis() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_app_call(app_call_params(1, None)).unwrap();

    let mut txn_result = simulate_result_with_inners(&[]);
    txn_result.unnamed_resources_accessed = Some(SimulateUnnamedResourcesAccessed {
        accounts: Some(vec![Address([9u8; 32]).to_string()]),
        apps: Some(vec![123]),
        ..Default::default()
    });
    mock.queue_simulate_response(simulate_response(
        vec![txn_result],
        Some(SimulateUnnamedResourcesAccessed {
            assets: Some(vec![55]),
            ..Default::default()
        }),
    ));

    let built = composer
        .build(Some(BuildParams {
            cover_app_call_inner_transaction_fees: false,
            populate_app_call_resources: ResourcePopulation::Enabled,
        }))
        .await
        .unwrap();

    let Transaction::ApplicationCall(ref fields) = built[0].transaction else {
        panic!("expected app call");
    };
    assert_eq!(
        fields.account_references,
        Some(vec![Address([9u8; 32])])
    );
    assert_eq!(fields.app_references, Some(vec![123]));
    assert_eq!(fields.asset_references, Some(vec![55]));
}

#[tokio::test]
async fn test_declared_references_are_not_overwritten_by_population() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    let mut params = app_call_params(1, None);
    params.account_references = Some(vec![Address([8u8; 32])]);
    composer.add_app_call(params).unwrap();

    let mut txn_result = simulate_result_with_inners(&[]);
    txn_result.unnamed_resources_accessed = Some(SimulateUnnamedResourcesAccessed {
        accounts: Some(vec![Address([9u8; 32]).to_string()]),
        apps: Some(vec![123]),
        ..Default::default()
    });
    mock.queue_simulate_response(simulate_response(vec![txn_result], None));

    let built = composer
        .build(Some(BuildParams {
            cover_app_call_inner_transaction_fees: false,
            populate_app_call_resources: ResourcePopulation::Enabled,
        }))
        .await
        .unwrap();

    // Hand-declared reference lists disable population for the transaction
    let Transaction::ApplicationCall(ref fields) = built[0].transaction else {
        panic!("expected app call");
    };
    assert_eq!(fields.account_references, Some(vec![Address([8u8; 32])]));
    assert_eq!(fields.app_references, None);
}

#[tokio::test]
async fn test_analysis_simulate_request_flags() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_app_call(app_call_params(1, Some(2000))).unwrap();
    mock.queue_simulate_response(simulate_response(
        vec![simulate_result_with_inners(&[])],
        None,
    ));

    composer.build(cover_fees()).await.unwrap();

    let requests = mock.simulate_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].allow_unnamed_resources, Some(true));
    assert_eq!(requests[0].allow_empty_signatures, Some(true));
    assert_eq!(requests[0].fix_signers, Some(true));
    assert_eq!(requests[0].allow_more_logging, Some(true));
    assert_eq!(
        requests[0].exec_trace_config,
        Some(SimulateTraceConfig::all())
    );
    // Analysis runs against empty signatures, not real ones
    assert_eq!(
        requests[0].txn_groups[0].txns[0].signature,
        Some([0u8; 64])
    );
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn test_analysis_skipped_without_app_calls(#[case] cover_inner_fees: bool) {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();

    composer
        .build(Some(BuildParams {
            cover_app_call_inner_transaction_fees: cover_inner_fees,
            populate_app_call_resources: ResourcePopulation::Enabled,
        }))
        .await
        .unwrap();

    assert_eq!(mock.simulate_request_count(), 0);
}

#[tokio::test]
async fn test_send_waits_for_confirmation() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();
    mock.queue_pending_response(confirmed_response(1005));

    let results = composer.send(None).await.unwrap();

    assert_eq!(results.transaction_ids.len(), 1);
    assert_eq!(results.confirmations[0].confirmed_round, Some(1005));
    // A single transaction is not grouped
    assert!(results.group.is_none());
    assert_eq!(mock.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_send_times_out_when_never_confirmed() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();

    let result = composer
        .send(Some(SendParams {
            max_rounds_to_wait_for_confirmation: Some(2),
            ..Default::default()
        }))
        .await;

    match result {
        Err(ComposerError::SendError {
            message, context, ..
        }) => {
            assert!(message.contains("unconfirmed after 2 rounds"), "{}", message);
            assert!(context.sent_transactions.is_some());
        }
        other => panic!("expected send error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_confirmation_wait_blocks_on_each_round() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();

    // The node never reports the transaction, so every wait round must go
    // through status_after_block before giving up
    let result = composer
        .send(Some(SendParams {
            max_rounds_to_wait_for_confirmation: Some(3),
            ..Default::default()
        }))
        .await;

    match result {
        Err(ComposerError::SendError { message, .. }) => {
            assert!(message.contains("unconfirmed after 3 rounds"), "{}", message);
        }
        other => panic!("expected send error, got {:?}", other),
    }
    assert_eq!(mock.round_wait_count(), 3);
}

#[tokio::test]
async fn test_send_surfaces_pool_rejection() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();

    let mut rejected = confirmed_response(0);
    rejected.confirmed_round = None;
    rejected.pool_error = "overspend".to_string();
    mock.queue_pending_response(rejected);

    let result = composer.send(None).await;
    match result {
        Err(ComposerError::SendError { message, .. }) => {
            assert!(message.contains("pool error: overspend"), "{}", message);
        }
        other => panic!("expected send error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_extracts_message_from_node_error_body() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();
    mock.fail_submissions_with(AlgodError::HttpStatus {
        status: 400,
        body: r#"{"message":"account underfunded"}"#.to_string(),
    });

    let result = composer.send(None).await;
    match result {
        Err(ComposerError::SendError { message, .. }) => {
            assert_eq!(message, "account underfunded");
        }
        other => panic!("expected send error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_error_chains_underlying_cause() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();
    mock.fail_submissions_with(AlgodError::Transport {
        message: "connection reset".to_string(),
    });

    let error = composer.send(None).await.unwrap_err();
    assert!(matches!(error, ComposerError::SendError { .. }));

    // The originating error stays reachable through the std error chain
    let cause = std::error::Error::source(&error).expect("send error has a source");
    assert!(
        cause.to_string().contains("connection reset"),
        "{}",
        cause
    );
}

struct ReplacingTransformer;

#[async_trait]
impl ErrorTransformer for ReplacingTransformer {
    async fn transform(&self, error: &ComposerError) -> Result<Option<ComposerError>, String> {
        if error.to_string().contains("boom") {
            Ok(Some(ComposerError::TransactionError {
                message: "node unreachable, try again later".to_string(),
            }))
        } else {
            Ok(None)
        }
    }
}

struct FailingTransformer;

#[async_trait]
impl ErrorTransformer for FailingTransformer {
    async fn transform(&self, _error: &ComposerError) -> Result<Option<ComposerError>, String> {
        Err("transformer exploded".to_string())
    }
}

#[tokio::test]
async fn test_error_transformer_replaces_send_error() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);
    composer.register_error_transformer(Arc::new(ReplacingTransformer));

    composer.add_payment(payment_params(1)).unwrap();
    mock.fail_submissions_with(AlgodError::Transport {
        message: "boom".to_string(),
    });

    let result = composer.send(None).await;
    match result {
        Err(ComposerError::TransactionError { message }) => {
            assert_eq!(message, "node unreachable, try again later");
        }
        other => panic!("expected transformed error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failing_transformer_preserves_original_error() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);
    composer.register_error_transformer(Arc::new(FailingTransformer));

    composer.add_payment(payment_params(1)).unwrap();
    mock.fail_submissions_with(AlgodError::Transport {
        message: "boom".to_string(),
    });

    let result = composer.send(None).await;
    match result {
        Err(ComposerError::TransformerFailed { message, original }) => {
            assert_eq!(message, "transformer exploded");
            assert!(original.to_string().contains("boom"));
        }
        other => panic!("expected transformer failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_distinct_signers_are_each_invoked_once() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    let signer_a = Arc::new(CountingSigner::new());
    let signer_b = Arc::new(CountingSigner::new());

    let mut first = payment_params(1);
    first.signer = Some(signer_a.clone());
    let mut second = payment_params(3);
    second.signer = Some(signer_b.clone());
    let mut third = payment_params(4);
    third.signer = Some(signer_a.clone());

    composer.add_payment(first).unwrap();
    composer.add_payment(second).unwrap();
    composer.add_payment(third).unwrap();

    composer.build(None).await.unwrap();
    let signed = composer.gather_signatures().await.unwrap();
    assert_eq!(signed.len(), 3);

    let a_calls = signer_a.calls.lock().unwrap();
    assert_eq!(*a_calls, vec![vec![0, 2]]);
    let b_calls = signer_b.calls.lock().unwrap();
    assert_eq!(*b_calls, vec![vec![1]]);
}

#[tokio::test]
async fn test_simulate_with_skipped_signatures() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();
    mock.queue_simulate_response(simulate_response(
        vec![simulate_result_with_inners(&[])],
        None,
    ));

    let results = composer
        .simulate(Some(SimulateParams {
            skip_signatures: true,
            ..Default::default()
        }))
        .await
        .unwrap();

    assert_eq!(results.confirmations.len(), 1);
    assert_eq!(results.transaction_ids.len(), 1);

    let requests = mock.simulate_requests.lock().unwrap();
    assert_eq!(requests[0].allow_empty_signatures, Some(true));
    assert_eq!(requests[0].fix_signers, Some(true));
}

#[tokio::test]
async fn test_simulate_failure_is_an_error_by_default() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();
    mock.queue_simulate_response(failed_simulate_response("logic eval error", 0));

    let result = composer.simulate(None).await;
    match result {
        Err(ComposerError::SendError {
            message, context, ..
        }) => {
            assert!(message.contains("logic eval error"), "{}", message);
            assert!(context.simulate_response.is_some());
        }
        other => panic!("expected send error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_simulate_failure_with_result_on_failure() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_payment(payment_params(1)).unwrap();
    mock.queue_simulate_response(failed_simulate_response("logic eval error", 0));

    let results = composer
        .simulate(Some(SimulateParams {
            result_on_failure: true,
            ..Default::default()
        }))
        .await
        .unwrap();

    assert_eq!(
        results.simulate_response.txn_groups[0]
            .failure_message
            .as_deref(),
        Some("logic eval error")
    );
}

#[tokio::test]
async fn test_changed_build_params_invalidate_cached_group() {
    let mock = Arc::new(MockAlgod::new());
    let mut composer = composer_with(&mock);

    composer.add_app_call(app_call_params(1, Some(2000))).unwrap();

    composer
        .build(Some(BuildParams {
            cover_app_call_inner_transaction_fees: false,
            populate_app_call_resources: ResourcePopulation::Disabled,
        }))
        .await
        .unwrap();
    assert_eq!(mock.simulate_request_count(), 0);

    // Turning analysis on is a different build and triggers a rebuild
    mock.queue_simulate_response(simulate_response(
        vec![simulate_result_with_inners(&[])],
        None,
    ));
    composer.build(cover_fees()).await.unwrap();
    assert_eq!(mock.simulate_request_count(), 1);
}
