// Store Tests
// Tests for the sled key-value store wrapper

use surety::storage::{StoreError, SuretyStore};
use surety::{Address, FlightSurety, LedgerEvent, SuretyConfig, UNIT};
use tempfile::TempDir;

fn sample_ledger() -> (FlightSurety, Address, Address) {
    let first = Address::generate();
    let mut ledger =
        FlightSurety::new(SuretyConfig::default(), Address::generate(), first, "Ozarka").unwrap();
    ledger.fund_airline(&first, 10 * UNIT).unwrap();
    let flight = ledger.register_flight(&first, "OA9231", 1_700_000_000).unwrap();
    let passenger = Address::generate();
    ledger.buy(passenger, &flight, UNIT).unwrap();
    (ledger, first, passenger)
}

// ============================================================================
// STORE CREATION AND BASIC OPERATIONS
// ============================================================================

#[test]
fn test_store_open_new() {
    let temp_dir = TempDir::new().unwrap();
    let store = SuretyStore::open(temp_dir.path()).unwrap();

    assert!(store.is_empty().unwrap());
}

#[test]
fn test_store_open_existing() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = SuretyStore::open(temp_dir.path()).unwrap();
        store.put_raw(b"test_key", b"test_value").unwrap();
        store.flush().unwrap();
    }

    {
        let store = SuretyStore::open(temp_dir.path()).unwrap();
        let value = store.get_raw(b"test_key").unwrap();
        assert_eq!(value, Some(b"test_value".to_vec()));
    }
}

#[test]
fn test_store_delete_and_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let store = SuretyStore::open(temp_dir.path()).unwrap();

    store.put_raw(b"a:1", b"x").unwrap();
    store.put_raw(b"a:2", b"y").unwrap();
    store.put_raw(b"b:1", b"z").unwrap();
    assert_eq!(store.list_keys_with_prefix(b"a:").unwrap().len(), 2);

    store.delete(b"a:1").unwrap();
    assert!(store.get_raw(b"a:1").unwrap().is_none());
    assert_eq!(store.list_keys_with_prefix(b"a:").unwrap(), vec![b"a:2".to_vec()]);
}

// ============================================================================
// LEDGER SNAPSHOTS
// ============================================================================

#[test]
fn test_load_ledger_when_absent() {
    let temp_dir = TempDir::new().unwrap();
    let store = SuretyStore::open(temp_dir.path()).unwrap();

    assert!(store.load_ledger().unwrap().is_none());
}

#[test]
fn test_ledger_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let (ledger, first, passenger) = sample_ledger();

    {
        let store = SuretyStore::open(temp_dir.path()).unwrap();
        store.save_ledger(&ledger).unwrap();
        store.flush().unwrap();
    }

    let store = SuretyStore::open(temp_dir.path()).unwrap();
    let mut loaded = store.load_ledger().unwrap().unwrap();

    assert_eq!(loaded.version(), ledger.version());
    assert!(loaded.is_airline_funded(&first));
    assert_eq!(loaded.statistics(), ledger.statistics());
    assert_eq!(loaded.owner(), ledger.owner());

    // The restored layer is still authorized and can keep operating
    let flight = loaded.register_flight(&first, "OA1464", 1_700_000_100).unwrap();
    loaded.buy(passenger, &flight, UNIT).unwrap();
    assert_eq!(loaded.statistics().policies, 2);
}

#[test]
fn test_corrupted_snapshot_detected() {
    let temp_dir = TempDir::new().unwrap();
    let store = SuretyStore::open(temp_dir.path()).unwrap();
    let (ledger, _, _) = sample_ledger();
    store.save_ledger(&ledger).unwrap();

    let mut bytes = store.get_raw(b"ledger:snapshot").unwrap().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    store.put_raw(b"ledger:snapshot", &bytes).unwrap();

    assert!(matches!(store.load_ledger(), Err(StoreError::ChecksumMismatch)));
}

// ============================================================================
// EVENT LOG
// ============================================================================

#[test]
fn test_event_log_keeps_order() {
    let temp_dir = TempDir::new().unwrap();
    let store = SuretyStore::open(temp_dir.path()).unwrap();
    let (mut ledger, _, _) = sample_ledger();
    let events = ledger.poll_events();

    let first_batch = store.append_events(&events[..2]).unwrap();
    let total = store.append_events(&events[2..]).unwrap();

    assert_eq!(first_batch, 2);
    assert_eq!(total as usize, events.len());
    assert_eq!(store.load_events().unwrap(), events);
    assert!(matches!(
        store.load_events().unwrap()[0],
        LedgerEvent::AirlineRegistered { .. }
    ));
}

#[test]
fn test_stats_count_keys() {
    let temp_dir = TempDir::new().unwrap();
    let store = SuretyStore::open(temp_dir.path()).unwrap();
    let (ledger, _, _) = sample_ledger();

    store.save_ledger(&ledger).unwrap();

    assert_eq!(store.stats().unwrap().key_count, 2);
}
