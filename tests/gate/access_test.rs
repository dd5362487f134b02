// Access Tests
// Tests for the operational flag and caller authorization

use surety::gate::GateError;
use surety::{Address, FlightKey, FlightStatus, FlightSurety, LedgerEvent, SuretyConfig, SuretyError, UNIT};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

struct Fixture {
    ledger: FlightSurety,
    owner: Address,
    first: Address,
    flight: FlightKey,
    reporter: Address,
    passenger: Address,
}

fn setup() -> Fixture {
    let owner = Address::generate();
    let first = Address::generate();
    let mut ledger = FlightSurety::new(SuretyConfig::default(), owner, first, "Ozarka").unwrap();
    ledger.fund_airline(&first, 10 * UNIT).unwrap();
    let flight = ledger.register_flight(&first, "OA9231", 1_700_000_000).unwrap();
    let passenger = Address::generate();
    ledger.buy(passenger, &flight, UNIT).unwrap();
    let reporter = Address::generate();
    ledger.register_oracle(reporter, UNIT).unwrap();

    Fixture {
        ledger,
        owner,
        first,
        flight,
        reporter,
        passenger,
    }
}

fn gate_err<T: std::fmt::Debug>(result: Result<T, SuretyError>) -> GateError {
    match result {
        Err(SuretyError::Gate(e)) => e,
        other => panic!("expected gate error, got {:?}", other),
    }
}

/// Every mutating entry point, reduced to its gate outcome
fn all_mutations(f: &mut Fixture) -> Vec<GateError> {
    let candidate = Address::generate();
    let index = f.ledger.oracle_indexes(&f.reporter).unwrap()[0];
    vec![
        gate_err(f.ledger.register_airline(candidate, "Dasani", &f.first)),
        gate_err(f.ledger.fund_airline(&f.first, 10 * UNIT)),
        gate_err(f.ledger.vote(&f.first, &candidate)),
        gate_err(f.ledger.register_flight(&f.first, "OA1464", 1_700_000_100)),
        gate_err(f.ledger.buy(Address::generate(), &f.flight, UNIT)),
        gate_err(f.ledger.withdraw(&f.passenger)),
        gate_err(f.ledger.register_oracle(Address::generate(), UNIT)),
        gate_err(f.ledger.request_status(Address::generate(), &f.flight)),
        gate_err(f.ledger.submit_status(&f.reporter, index, &f.flight, FlightStatus::OnTime)),
        gate_err(f.ledger.expire_requests()),
    ]
}

// ============================================================================
// OPERATIONAL FLAG
// ============================================================================

#[test]
fn test_initially_operational() {
    let f = setup();

    assert!(f.ledger.is_operational());
    assert!(f.ledger.is_authorized(f.ledger.caller_id()));
}

#[test]
fn test_owner_can_pause_and_resume() {
    let mut f = setup();

    f.ledger.set_operational(&f.owner, false).unwrap();
    assert!(!f.ledger.is_operational());

    f.ledger.set_operational(&f.owner, true).unwrap();
    assert!(f.ledger.is_operational());
}

#[test]
fn test_non_owner_cannot_pause() {
    let mut f = setup();

    let err = gate_err(f.ledger.set_operational(&f.first, false));

    assert_eq!(err, GateError::NotOwner);
    assert!(f.ledger.is_operational());
}

#[test]
fn test_paused_ledger_rejects_every_mutation() {
    let mut f = setup();
    f.ledger.set_operational(&f.owner, false).unwrap();
    let version = f.ledger.version();
    let stats = f.ledger.statistics();

    let errors = all_mutations(&mut f);

    assert!(errors.iter().all(|e| *e == GateError::NotOperational));
    assert_eq!(f.ledger.version(), version);
    assert_eq!(f.ledger.statistics(), stats);
}

#[test]
fn test_queries_available_while_paused() {
    let mut f = setup();
    f.ledger.set_operational(&f.owner, false).unwrap();

    assert_eq!(f.ledger.registered_airlines(), vec![f.first]);
    assert!(f.ledger.is_airline_participating(&f.first));
    assert!(f.ledger.is_passenger_insured(&f.passenger, &f.flight));
    assert_eq!(f.ledger.credit(&f.passenger), 0);
    assert_eq!(f.ledger.flight_status(&f.flight), Some(FlightStatus::Unknown));
}

#[test]
fn test_pause_emits_event() {
    let mut f = setup();
    f.ledger.poll_events();

    f.ledger.set_operational(&f.owner, false).unwrap();

    assert_eq!(
        f.ledger.poll_events(),
        vec![LedgerEvent::OperationalStatusChanged { operational: false }]
    );
}

// ============================================================================
// AUTHORIZATION
// ============================================================================

#[test]
fn test_revoked_layer_is_unauthorized() {
    let mut f = setup();
    let caller = *f.ledger.caller_id();
    f.ledger.set_authorization(&f.owner, caller, false).unwrap();
    let version = f.ledger.version();

    let errors = all_mutations(&mut f);

    assert!(errors.iter().all(|e| *e == GateError::Unauthorized(caller)));
    assert_eq!(f.ledger.version(), version);
}

#[test]
fn test_operational_checked_before_authorization() {
    let mut f = setup();
    let caller = *f.ledger.caller_id();
    f.ledger.set_authorization(&f.owner, caller, false).unwrap();
    f.ledger.set_operational(&f.owner, false).unwrap();

    let err = gate_err(f.ledger.fund_airline(&f.first, 10 * UNIT));

    assert_eq!(err, GateError::NotOperational);
}

#[test]
fn test_reauthorized_layer_works_again() {
    let mut f = setup();
    let caller = *f.ledger.caller_id();
    f.ledger.set_authorization(&f.owner, caller, false).unwrap();
    f.ledger.set_authorization(&f.owner, caller, true).unwrap();

    assert!(f.ledger.register_airline(Address::generate(), "Dasani", &f.first).is_ok());
}

#[test]
fn test_non_owner_cannot_authorize() {
    let mut f = setup();
    let intruder = Address::generate();

    let err = gate_err(f.ledger.set_authorization(&intruder, intruder, true));

    assert_eq!(err, GateError::NotOwner);
    assert!(!f.ledger.is_authorized(&intruder));
}
