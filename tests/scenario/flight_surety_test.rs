// Flight Surety Scenario Tests
// End-to-end runs across governance, insurance and oracle consensus

use std::sync::Arc;
use surety::insurance::{InsuranceError, MockPayoutTarget};
use surety::service::SuretyService;
use surety::{Address, FlightKey, FlightStatus, FlightSurety, LedgerEvent, SuretyConfig, SuretyError, UNIT};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Drive every holder of the request's index to report `status`
fn settle(ledger: &mut FlightSurety, flight: &FlightKey, status: FlightStatus) -> Option<FlightStatus> {
    let index = ledger.request_status(Address::generate(), flight).unwrap();
    let min = ledger.config().min_responses;

    let mut outcome = None;
    let mut reported = 0;
    while reported < min {
        let reporter = Address::generate();
        if ledger.register_oracle(reporter, UNIT).unwrap().contains(&index) {
            outcome = ledger.submit_status(&reporter, index, flight, status).unwrap();
            reported += 1;
        }
    }
    outcome
}

// ============================================================================
// ADMISSION SCENARIO
// ============================================================================

#[test]
fn test_first_airline_admits_three_then_fifth_needs_votes() {
    let a = Address::generate();
    let mut ledger = FlightSurety::new(SuretyConfig::default(), Address::generate(), a, "A").unwrap();
    assert!(ledger.is_airline_registered(&a));
    assert!(!ledger.is_airline_funded(&a));

    ledger.fund_airline(&a, 10 * UNIT).unwrap();

    let mut others = Vec::new();
    for name in ["B", "C", "D"] {
        let airline = Address::generate();
        ledger.register_airline(airline, name, &a).unwrap();
        ledger.fund_airline(&airline, 10 * UNIT).unwrap();
        others.push(airline);
    }
    assert_eq!(ledger.registered_airline_count(), 4);
    assert_eq!(ledger.participating_airline_count(), 4);

    let e = Address::generate();
    assert!(ledger.register_airline(e, "E", &a).is_err());
    assert!(!ledger.is_airline_registered(&e));
    assert_eq!(ledger.votes_for(&e), 0);

    ledger.vote(&others[0], &e).unwrap();
    assert_eq!(ledger.votes_for(&e), 1);

    ledger.register_airline(e, "E", &a).unwrap();
    assert!(ledger.is_airline_registered(&e));
    assert!(!ledger.is_airline_funded(&e));
    assert_eq!(ledger.registered_airlines().last(), Some(&e));
}

// ============================================================================
// INSURANCE SCENARIO
// ============================================================================

#[test]
fn test_late_airline_credits_and_withdraws_once() {
    let a = Address::generate();
    let mut ledger = FlightSurety::new(SuretyConfig::default(), Address::generate(), a, "A").unwrap();
    ledger.fund_airline(&a, 10 * UNIT).unwrap();
    let flight = ledger.register_flight(&a, "ND1309", 1_700_000_000).unwrap();

    let passenger = Address::generate();
    ledger.buy(passenger, &flight, UNIT).unwrap();
    assert!(ledger.is_passenger_insured(&passenger, &flight));

    let outcome = settle(&mut ledger, &flight, FlightStatus::LateAirline);

    assert_eq!(outcome, Some(FlightStatus::LateAirline));
    assert_eq!(ledger.flight_status(&flight), Some(FlightStatus::LateAirline));
    assert_eq!(ledger.credit(&passenger), 3 * UNIT / 2);

    let payout = ledger.withdraw(&passenger).unwrap();
    assert_eq!(payout.amount(), 3 * UNIT / 2);
    assert_eq!(ledger.credit(&passenger), 0);

    assert!(matches!(
        ledger.withdraw(&passenger),
        Err(SuretyError::Insurance(InsuranceError::NoCredit))
    ));
}

#[test]
fn test_weather_delay_credits_nothing() {
    let a = Address::generate();
    let mut ledger = FlightSurety::new(SuretyConfig::default(), Address::generate(), a, "A").unwrap();
    ledger.fund_airline(&a, 10 * UNIT).unwrap();
    let flight = ledger.register_flight(&a, "ND1309", 1_700_000_000).unwrap();
    let passenger = Address::generate();
    ledger.buy(passenger, &flight, UNIT).unwrap();

    settle(&mut ledger, &flight, FlightStatus::LateWeather);

    assert_eq!(ledger.flight_status(&flight), Some(FlightStatus::LateWeather));
    assert_eq!(ledger.credit(&passenger), 0);
    assert!(ledger.withdraw(&passenger).is_err());
}

// ============================================================================
// SERVICE SCENARIO
// ============================================================================

#[tokio::test]
async fn test_service_publishes_events_and_pays_out() {
    let a = Address::generate();
    let mut ledger = FlightSurety::new(SuretyConfig::default(), Address::generate(), a, "A").unwrap();
    ledger.fund_airline(&a, 10 * UNIT).unwrap();
    let flight = ledger.register_flight(&a, "ND1309", 1_700_000_000).unwrap();
    ledger.poll_events();

    let target = Arc::new(MockPayoutTarget::new());
    let service = SuretyService::new(ledger, target.clone());
    let mut events = service.subscribe();

    let passenger = Address::generate();
    service.execute(|l| l.buy(passenger, &flight, UNIT)).unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        LedgerEvent::InsurancePurchased {
            passenger,
            flight: flight.clone(),
            premium: UNIT,
        }
    );

    service
        .execute(|l| {
            settle(l, &flight, FlightStatus::LateAirline);
            Ok(())
        })
        .unwrap();

    let mut saw_status = false;
    let mut saw_credit = false;
    while let Ok(event) = events.try_recv() {
        match event {
            LedgerEvent::FlightStatusInfo { status, .. } => {
                assert_eq!(status, FlightStatus::LateAirline);
                saw_status = true;
            }
            LedgerEvent::PassengerCredited { amount, .. } => {
                assert_eq!(amount, 3 * UNIT / 2);
                saw_credit = true;
            }
            _ => {}
        }
    }
    assert!(saw_status && saw_credit);

    let receipt = service.withdraw(passenger).await.unwrap();

    assert_eq!(receipt.amount(), 3 * UNIT / 2);
    assert_eq!(target.total_transferred(), 3 * UNIT / 2);
    assert_eq!(service.query(|l| l.credit(&passenger)), 0);
    assert!(matches!(
        events.recv().await.unwrap(),
        LedgerEvent::CreditWithdrawn { .. }
    ));
}
