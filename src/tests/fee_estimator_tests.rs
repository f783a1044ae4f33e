//! FeeEstimator scenarios against a scripted chain

use std::sync::Arc;

use super::test_helpers::*;
use crate::chain::{ChainError, SampleTransaction};
use crate::config::FeeConfig;
use crate::errors::PlannerError;
use crate::estimator::{EstimateRequest, FeeEstimator};
use crate::tron::Trc20Method;
use crate::types::Token;

fn request() -> EstimateRequest {
    EstimateRequest {
        owner: sender(),
        contract: Token::tron_usdt().address,
        method: Trc20Method::Transfer,
        recipient: recipient(),
        amount: 50 * USDT,
    }
}

fn estimator(chain: &Arc<MockChain>) -> FeeEstimator {
    FeeEstimator::new(chain.clone(), &FeeConfig::default())
}

#[tokio::test]
async fn test_energy_lack_scenario() {
    let chain = Arc::new(
        MockChain::new()
            .with_simulation(Ok(30_000))
            .with_resources(vec![Ok(snapshot(40_000, 20_000))]),
    );

    let result = estimator(&chain).estimate(&request()).await.unwrap();

    assert_eq!(result.energy_required, 30_000);
    assert_eq!(result.energy_available, 20_000);
    assert_eq!(result.energy_lack, 10_000);
    assert_eq!(result.energy_fee, 4_200_000);
    // 344 bytes needed, 600 free
    assert_eq!(result.bandwidth_required, 344);
    assert_eq!(result.bandwidth_fee, 0);
    assert_eq!(result.total_fee, 4_620_000);
    assert!(result.needs_rental());
    assert!(result.owner_found);
}

#[tokio::test]
async fn test_new_recipient_revert_uses_fallback_energy() {
    let chain = Arc::new(MockChain::new().with_simulation(Err(reverted())));

    let result = estimator(&chain).estimate(&request()).await.unwrap();

    assert_eq!(result.energy_required, 31_895);
    assert_eq!(result.energy_lack, 31_895);
    assert_eq!(result.energy_fee, 31_895 * 420);
}

#[tokio::test]
async fn test_other_simulation_errors_fail() {
    let chain = Arc::new(MockChain::new().with_simulation(Err(transport_error())));

    let err = estimator(&chain).estimate(&request()).await.unwrap_err();

    assert!(matches!(
        err,
        PlannerError::SimulationFailed {
            source: ChainError::Transport { .. }
        }
    ));
    assert!(err.is_retryable());
    assert_eq!(chain.reads(), 0);
}

#[tokio::test]
async fn test_missing_owner_counts_as_zero_resources() {
    let chain = Arc::new(
        MockChain::new()
            .with_simulation(Ok(14_650))
            .with_resources(vec![Err(not_found(SENDER))])
            .with_sample(Err(not_found(SENDER))),
    );

    let result = estimator(&chain).estimate(&request()).await.unwrap();

    assert!(!result.owner_found);
    assert_eq!(result.energy_available, 0);
    assert_eq!(result.energy_lack, 14_650);
    assert!(result.bandwidth_fee_estimated);
    assert_eq!(result.bandwidth_fee, 3_000_000);
}

#[tokio::test]
async fn test_unmeasurable_sample_uses_default_bandwidth_fee() {
    let chain = Arc::new(MockChain::new().with_sample(Ok(SampleTransaction {
        raw_data: Vec::new(),
        signature_count: 1,
    })));

    let result = estimator(&chain).estimate(&request()).await.unwrap();

    assert!(result.bandwidth_fee_estimated);
    assert_eq!(result.bandwidth_fee, 3_000_000);
}

#[tokio::test]
async fn test_bandwidth_transport_errors_propagate() {
    let chain = Arc::new(MockChain::new().with_sample(Err(transport_error())));

    let err = estimator(&chain).estimate(&request()).await.unwrap_err();

    assert!(matches!(err, PlannerError::Chain(ChainError::Transport { .. })));
}

#[tokio::test]
async fn test_estimate_reads_fresh_snapshot_each_time() {
    let chain = Arc::new(MockChain::new().with_resources(vec![
        Ok(snapshot(0, 0)),
        Ok(snapshot(100_000, 0)),
    ]));
    let estimator = estimator(&chain);

    let first = estimator.estimate(&request()).await.unwrap();
    let second = estimator.estimate(&request()).await.unwrap();

    assert_eq!(chain.reads(), 2);
    assert!(first.needs_rental());
    assert!(!second.needs_rental());
}

#[tokio::test]
async fn test_estimate_is_idempotent_for_unchanged_state() {
    let chain = Arc::new(
        MockChain::new()
            .with_simulation(Ok(30_000))
            .with_resources(vec![Ok(snapshot(40_000, 20_000))]),
    );
    let estimator = estimator(&chain);

    let first = estimator.estimate(&request()).await.unwrap();
    let second = estimator.estimate(&request()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_invalid_recipient_is_rejected_before_simulation() {
    let chain = Arc::new(MockChain::new());
    let mut request = request();
    request.recipient = "not-an-address".into();

    let err = estimator(&chain).estimate(&request).await.unwrap_err();

    assert!(matches!(err, PlannerError::Chain(ChainError::InvalidAddress(_))));
    assert_eq!(chain.simulations(), 0);
}
