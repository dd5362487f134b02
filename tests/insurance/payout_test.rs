// Payout Tests
// Tests for the async withdrawal path through SuretyService

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use surety::insurance::{InsuranceError, MockPayoutTarget, Payout, PayoutTarget};
use surety::service::SuretyService;
use surety::{Address, FlightKey, FlightStatus, FlightSurety, LedgerEvent, SuretyConfig, SuretyError, UNIT};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Ledger where `passenger` holds 1.5 units of credit
fn credited_ledger(config: SuretyConfig) -> (FlightSurety, Address, FlightKey) {
    let first = Address::generate();
    let mut ledger = FlightSurety::new(config, Address::generate(), first, "Ozarka").unwrap();
    ledger.fund_airline(&first, 10 * UNIT).unwrap();
    let flight = ledger.register_flight(&first, "OA9231", 1_700_000_000).unwrap();
    let passenger = Address::generate();
    ledger.buy(passenger, &flight, UNIT).unwrap();

    let index = ledger.request_status(Address::generate(), &flight).unwrap();
    let mut reporters = Vec::new();
    while reporters.len() < 3 {
        let reporter = Address::generate();
        if ledger.register_oracle(reporter, UNIT).unwrap().contains(&index) {
            reporters.push(reporter);
        }
    }
    for reporter in &reporters {
        ledger
            .submit_status(reporter, index, &flight, FlightStatus::LateAirline)
            .unwrap();
    }
    (ledger, passenger, flight)
}

/// Target that tries to withdraw again while its transfer is in flight
struct ReentrantTarget {
    service: Mutex<Option<SuretyService>>,
    inner_result: Mutex<Option<Result<u64, String>>>,
}

#[async_trait]
impl PayoutTarget for ReentrantTarget {
    async fn transfer(&self, payout: &Payout) -> Result<String, String> {
        let service = self.service.lock().unwrap().clone();
        if let Some(service) = service {
            let inner = service
                .withdraw(*payout.passenger())
                .await
                .map(|r| r.amount())
                .map_err(|e| e.to_string());
            *self.inner_result.lock().unwrap() = Some(inner);
        }
        Ok("reentrant-0".to_string())
    }
}

/// Target that pauses the ledger mid-transfer, then fails
struct PausingTarget {
    service: Mutex<Option<SuretyService>>,
    owner: Address,
}

#[async_trait]
impl PayoutTarget for PausingTarget {
    async fn transfer(&self, _payout: &Payout) -> Result<String, String> {
        let service = self.service.lock().unwrap().clone();
        if let Some(service) = service {
            service
                .execute(|l| l.set_operational(&self.owner, false))
                .map_err(|e| e.to_string())?;
        }
        Err("declined".to_string())
    }
}

// ============================================================================
// SUCCESSFUL PAYOUT
// ============================================================================

#[tokio::test]
async fn test_withdraw_transfers_and_empties_credit() {
    let (ledger, passenger, _) = credited_ledger(SuretyConfig::default());
    let target = Arc::new(MockPayoutTarget::new());
    let service = SuretyService::new(ledger, target.clone());

    let receipt = service.withdraw(passenger).await.unwrap();

    assert_eq!(receipt.amount(), UNIT * 3 / 2);
    assert_eq!(receipt.reference(), "payout-mock-0");
    assert_eq!(target.total_transferred(), UNIT * 3 / 2);
    assert_eq!(service.query(|l| l.credit(&passenger)), 0);
}

#[tokio::test]
async fn test_second_withdraw_fails_with_no_credit() {
    let (ledger, passenger, _) = credited_ledger(SuretyConfig::default());
    let target = Arc::new(MockPayoutTarget::new());
    let service = SuretyService::new(ledger, target.clone());

    service.withdraw(passenger).await.unwrap();
    let result = service.withdraw(passenger).await;

    assert!(matches!(
        result,
        Err(SuretyError::Insurance(InsuranceError::NoCredit))
    ));
    assert_eq!(target.call_count(), 1);
}

#[tokio::test]
async fn test_reentrant_withdraw_sees_no_credit() {
    let (ledger, passenger, _) = credited_ledger(SuretyConfig::default());
    let target = Arc::new(ReentrantTarget {
        service: Mutex::new(None),
        inner_result: Mutex::new(None),
    });
    let service = SuretyService::new(ledger, target.clone());
    *target.service.lock().unwrap() = Some(service.clone());

    let receipt = service.withdraw(passenger).await.unwrap();

    assert_eq!(receipt.amount(), UNIT * 3 / 2);
    let inner = target.inner_result.lock().unwrap().clone().unwrap();
    assert_eq!(inner, Err(InsuranceError::NoCredit.to_string()));
    assert_eq!(service.query(|l| l.credit(&passenger)), 0);
}

// ============================================================================
// FAILED PAYOUT
// ============================================================================

#[tokio::test]
async fn test_failed_transfer_restores_credit() {
    let (mut ledger, passenger, _) = credited_ledger(SuretyConfig::default());
    ledger.poll_events();
    let target = Arc::new(MockPayoutTarget::new().with_failure("bank offline"));
    let service = SuretyService::new(ledger, target);
    let mut events = service.subscribe();

    let result = service.withdraw(passenger).await;

    assert!(matches!(result, Err(SuretyError::PayoutFailed(ref m)) if m == "bank offline"));
    assert_eq!(service.query(|l| l.credit(&passenger)), UNIT * 3 / 2);

    assert!(matches!(
        events.try_recv().unwrap(),
        LedgerEvent::CreditWithdrawn { .. }
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        LedgerEvent::CreditRestored { amount, .. } if amount == UNIT * 3 / 2
    ));
}

#[tokio::test]
async fn test_transfer_timeout_restores_credit() {
    let config = SuretyConfig::new().with_payout_timeout_ms(20);
    let (ledger, passenger, _) = credited_ledger(config);
    let target = Arc::new(MockPayoutTarget::new().with_delay_ms(500));
    let service = SuretyService::new(ledger, target);

    let result = service.withdraw(passenger).await;

    assert!(matches!(result, Err(SuretyError::PayoutFailed(ref m)) if m == "Timeout"));
    assert_eq!(service.query(|l| l.credit(&passenger)), UNIT * 3 / 2);
}

#[tokio::test]
async fn test_restore_survives_pause_during_transfer() {
    let (ledger, passenger, _) = credited_ledger(SuretyConfig::default());
    let owner = *ledger.owner();
    let target = Arc::new(PausingTarget {
        service: Mutex::new(None),
        owner,
    });
    let service = SuretyService::new(ledger, target.clone());
    *target.service.lock().unwrap() = Some(service.clone());

    let result = service.withdraw(passenger).await;

    assert!(matches!(result, Err(SuretyError::PayoutFailed(_))));
    assert!(!service.query(|l| l.is_operational()));
    assert_eq!(service.query(|l| l.credit(&passenger)), UNIT * 3 / 2);
}
