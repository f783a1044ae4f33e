//! EnergyRentalCoordinator state machine and polling
//!
//! Time is paused so the 5s poll interval and 60s maximum wait run
//! instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use super::test_helpers::*;
use crate::errors::{AbandonReason, PlannerError};
use crate::estimator::{BandwidthMeasure, EstimationResult, FeeSchedule};
use crate::rental::{cancel_pair, AutoApprove, CancelSignal, RentalError, RentalState, RentalStatus};
use crate::types::AccountResourceSnapshot;

fn estimate(energy_required: u64, available: u64) -> EstimationResult {
    EstimationResult::compute(
        &FeeSchedule::default(),
        energy_required,
        &snapshot(available, 0),
        BandwidthMeasure::Measured(344),
        true,
    )
}

#[tokio::test(start_paused = true)]
async fn test_no_shortfall_skips_rental() {
    let chain = Arc::new(MockChain::new());
    let market = Arc::new(MockMarket::new());

    let outcome = coordinator(&chain, &market)
        .acquire(&sender(), &estimate(14_650, 100_000), &AutoApprove, CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(outcome.state, RentalState::NoShortfall);
    assert_eq!(outcome.history, vec![RentalState::NoShortfall]);
    assert_eq!(market.quotes(), 0);
    assert_eq!(market.orders(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fulfilled_after_energy_arrives() {
    let chain = Arc::new(MockChain::new().with_resources(vec![
        Ok(snapshot(20_000, 0)),
        Ok(snapshot(20_000, 0)),
        Ok(snapshot(50_000, 0)),
    ]));
    let market = Arc::new(MockMarket::new());

    let outcome = coordinator(&chain, &market)
        .acquire(&sender(), &estimate(30_000, 20_000), &AutoApprove, CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(
        outcome.history,
        vec![
            RentalState::QuotePending,
            RentalState::AwaitingUserConfirmation,
            RentalState::OrderPlaced,
            RentalState::PollingForEnergy,
            RentalState::Fulfilled,
        ]
    );
    assert!(outcome.is_fulfilled());
    assert_eq!(outcome.observed_energy, 50_000);
    assert_eq!(outcome.waited, Duration::from_secs(15));
    assert_eq!(chain.reads(), 3);

    let order = outcome.order.unwrap();
    assert_eq!(order.order_id, "ord-1");
    assert_eq!(order.requested_energy, 30_000);
    assert_eq!(order.status, RentalStatus::Fulfilled);
    assert_eq!(outcome.quote.unwrap().energy, 30_000);
    assert_eq!(*market.placed.lock().unwrap(), vec![(sender(), 30_000)]);
}

#[tokio::test(start_paused = true)]
async fn test_declined_quote_places_no_order() {
    let chain = Arc::new(MockChain::new());
    let market = Arc::new(MockMarket::new());
    let approval = ScriptedApproval::new(false);

    let outcome = coordinator(&chain, &market)
        .acquire(&sender(), &estimate(30_000, 0), &approval, CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(outcome.state, RentalState::UserDeclined);
    assert_eq!(
        outcome.history,
        vec![
            RentalState::QuotePending,
            RentalState::AwaitingUserConfirmation,
            RentalState::UserDeclined,
        ]
    );
    assert!(outcome.quote.is_some());
    assert!(outcome.order.is_none());
    assert_eq!(market.orders(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_order_id_rejects_without_polling() {
    let chain = Arc::new(MockChain::new());
    let market = Arc::new(MockMarket::new().with_order(Ok(None)));

    let err = coordinator(&chain, &market)
        .acquire(&sender(), &estimate(30_000, 0), &AutoApprove, CancelSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, PlannerError::ProviderRejected { energy: 30_000 }));
    assert_eq!(chain.reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_quote_failure_propagates() {
    let chain = Arc::new(MockChain::new());
    let market = Arc::new(MockMarket::new().with_quote(Err(RentalError::Api {
        code: Some(503),
        message: "maintenance".to_string(),
    })));

    let err = coordinator(&chain, &market)
        .acquire(&sender(), &estimate(30_000, 0), &AutoApprove, CancelSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, PlannerError::Rental(RentalError::Api { .. })));
    assert!(err.is_retryable());
    assert_eq!(market.orders(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out() {
    let chain = Arc::new(MockChain::new().with_resources(vec![Ok(snapshot(1_000, 0))]));
    let market = Arc::new(MockMarket::new());

    let err = coordinator(&chain, &market)
        .acquire(&sender(), &estimate(30_000, 0), &AutoApprove, CancelSignal::never())
        .await
        .unwrap_err();

    match err {
        PlannerError::EnergyWaitAbandoned {
            order_id,
            reason,
            observed_energy,
            requested_energy,
            rental,
        } => {
            assert_eq!(order_id, "ord-1");
            assert_eq!(reason, AbandonReason::TimedOut);
            assert_eq!(observed_energy, 1_000);
            assert_eq!(requested_energy, 30_000);

            assert_eq!(rental.state, RentalState::TimedOut);
            assert_eq!(
                rental.history[rental.history.len() - 2..],
                [RentalState::PollingForEnergy, RentalState::TimedOut]
            );
            assert_eq!(rental.waited, Duration::from_secs(60));
            let order = rental.order.unwrap();
            assert_eq!(order.order_id, "ord-1");
            assert_eq!(order.status, RentalStatus::Failed);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // one read per 5s interval over 60s
    assert_eq!(chain.reads(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_waiting_and_leaves_order() {
    let chain = Arc::new(MockChain::new().with_resources(vec![Ok(snapshot(0, 0))]));
    let market = Arc::new(MockMarket::new());
    let coordinator = coordinator(&chain, &market);
    let (handle, signal) = cancel_pair();

    let task = tokio::spawn(async move {
        coordinator
            .acquire(&sender(), &estimate(30_000, 0), &AutoApprove, signal)
            .await
    });

    tokio::time::sleep(Duration::from_secs(12)).await;
    handle.cancel();
    let err = task.await.unwrap().unwrap_err();

    assert!(matches!(
        err,
        PlannerError::EnergyWaitAbandoned {
            reason: AbandonReason::Cancelled,
            ..
        }
    ));
    assert_eq!(chain.reads(), 2);
    assert_eq!(market.orders(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_order_places_nothing() {
    let chain = Arc::new(MockChain::new());
    let market = Arc::new(MockMarket::new());
    let (handle, signal) = cancel_pair();
    handle.cancel();

    let outcome = coordinator(&chain, &market)
        .acquire(&sender(), &estimate(30_000, 0), &AutoApprove, signal)
        .await
        .unwrap();

    assert_eq!(outcome.state, RentalState::UserDeclined);
    assert!(outcome.order.is_none());
    assert_eq!(market.quotes(), 1);
    assert_eq!(market.orders(), 0);
    assert_eq!(chain.reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_slow_energy_read() {
    let chain = Arc::new(
        MockChain::new()
            .with_resources(vec![Ok(snapshot(0, 0))])
            .with_read_delay(Duration::from_secs(30)),
    );
    let market = Arc::new(MockMarket::new());
    let coordinator = coordinator(&chain, &market);
    let (handle, signal) = cancel_pair();

    let task = tokio::spawn(async move {
        coordinator
            .acquire(&sender(), &estimate(30_000, 0), &AutoApprove, signal)
            .await
    });

    // first read starts at 5s and would finish at 35s
    tokio::time::sleep(Duration::from_secs(8)).await;
    let cancelled_at = tokio::time::Instant::now();
    handle.cancel();
    let err = task.await.unwrap().unwrap_err();

    assert!(cancelled_at.elapsed() < Duration::from_secs(1));
    match err {
        PlannerError::EnergyWaitAbandoned { reason, rental, .. } => {
            assert_eq!(reason, AbandonReason::Cancelled);
            assert_eq!(rental.state, RentalState::PollingForEnergy);
            assert_eq!(rental.order.unwrap().status, RentalStatus::Pending);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_transient_read_errors_keep_polling() {
    let chain = Arc::new(MockChain::new().with_resources(vec![
        Err(transport_error()),
        Err(not_found(SENDER)),
        Ok(AccountResourceSnapshot {
            energy_limit: 32_000,
            ..Default::default()
        }),
    ]));
    let market = Arc::new(MockMarket::new());

    let outcome = coordinator(&chain, &market)
        .acquire(&sender(), &estimate(30_000, 0), &AutoApprove, CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(outcome.state, RentalState::Fulfilled);
    assert_eq!(chain.reads(), 3);
}
