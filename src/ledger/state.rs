// Ledger State - the single store every component reads and writes
//
// Holds records only; admission, accounting and consensus rules live in
// their own modules and reach the records through keyed lookups.

use crate::identity::Address;
use crate::ledger::{
    Airline, Flight, FlightKey, FlightStatus, InsurancePolicy, LedgerEvent, OracleRegistration,
    PolicyKey, RequestKey, StatusRequest,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Errors that can occur encoding or decoding ledger state
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed")]
    DeserializationFailed,
}

/// Statistics about the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerStatistics {
    pub registered_airlines: usize,
    pub participating_airlines: usize,
    pub flights: usize,
    pub finalized_flights: usize,
    pub policies: usize,
    pub total_premiums: u64,
    pub outstanding_credit: u64,
    pub oracles: usize,
    pub open_requests: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerState {
    /// The airline registered at construction
    first_airline: Address,
    airlines: HashMap<Address, Airline>,
    /// Registration order
    airline_order: Vec<Address>,
    /// Votes gathered by not-yet-admitted candidates
    candidacies: HashMap<Address, BTreeSet<Address>>,
    flights: HashMap<FlightKey, Flight>,
    policies: HashMap<PolicyKey, InsurancePolicy>,
    /// Index: flight -> insured passengers
    #[serde(skip)]
    flight_policies: HashMap<FlightKey, Vec<Address>>,
    /// Credited, not yet withdrawn balances
    credits: HashMap<Address, u64>,
    oracles: HashMap<Address, OracleRegistration>,
    requests: HashMap<RequestKey, StatusRequest>,
    /// Feeds index generation
    nonce: u64,
    /// Logical clock, advanced by every successful mutation
    version: u64,
    #[serde(skip)]
    events: Vec<LedgerEvent>,
}

impl LedgerState {
    /// Create a ledger with the first airline already registered (unfunded)
    pub fn new(first_airline: Address, name: &str) -> Self {
        let mut state = Self {
            first_airline,
            airlines: HashMap::new(),
            airline_order: Vec::new(),
            candidacies: HashMap::new(),
            flights: HashMap::new(),
            policies: HashMap::new(),
            flight_policies: HashMap::new(),
            credits: HashMap::new(),
            oracles: HashMap::new(),
            requests: HashMap::new(),
            nonce: 0,
            version: 0,
            events: Vec::new(),
        };
        state.insert_airline(Airline::new(
            first_airline,
            name,
            first_airline,
            BTreeSet::new(),
        ));
        state
    }

    pub fn first_airline(&self) -> &Address {
        &self.first_airline
    }

    /// Get the current version (logical clock)
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn tick(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub(crate) fn next_nonce(&mut self) -> u64 {
        self.nonce = self.nonce.wrapping_add(1);
        self.nonce
    }

    // ========================================================================
    // AIRLINES
    // ========================================================================

    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.airlines.get(address)
    }

    pub(crate) fn airline_mut(&mut self, address: &Address) -> Option<&mut Airline> {
        self.airlines.get_mut(address)
    }

    /// Store a newly admitted airline. Existing records are never replaced.
    pub(crate) fn insert_airline(&mut self, airline: Airline) -> bool {
        let address = *airline.address();
        if self.airlines.contains_key(&address) {
            return false;
        }
        self.candidacies.remove(&address);
        self.airlines.insert(address, airline);
        self.airline_order.push(address);
        true
    }

    /// Registered airlines in registration order
    pub fn registered_airlines(&self) -> Vec<Address> {
        self.airline_order.clone()
    }

    pub fn registered_count(&self) -> usize {
        self.airline_order.len()
    }

    pub fn participating_count(&self) -> usize {
        self.airlines.values().filter(|a| a.is_participating()).count()
    }

    pub fn candidate_votes(&self, candidate: &Address) -> Option<&BTreeSet<Address>> {
        self.candidacies.get(candidate)
    }

    /// Append a vote. Returns false if the voter already voted for the candidate.
    pub(crate) fn record_vote(&mut self, voter: Address, candidate: Address) -> bool {
        self.candidacies.entry(candidate).or_default().insert(voter)
    }

    // ========================================================================
    // FLIGHTS
    // ========================================================================

    pub fn flight(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    pub(crate) fn flight_mut(&mut self, key: &FlightKey) -> Option<&mut Flight> {
        self.flights.get_mut(key)
    }

    pub(crate) fn insert_flight(&mut self, flight: Flight) -> bool {
        if self.flights.contains_key(flight.key()) {
            return false;
        }
        self.flights.insert(flight.key().clone(), flight);
        true
    }

    pub fn flights(&self) -> impl Iterator<Item = &Flight> {
        self.flights.values()
    }

    // ========================================================================
    // POLICIES AND CREDIT
    // ========================================================================

    pub fn policy(&self, key: &PolicyKey) -> Option<&InsurancePolicy> {
        self.policies.get(key)
    }

    pub(crate) fn policy_mut(&mut self, key: &PolicyKey) -> Option<&mut InsurancePolicy> {
        self.policies.get_mut(key)
    }

    pub(crate) fn insert_policy(&mut self, policy: InsurancePolicy) -> bool {
        let key = policy.key();
        if self.policies.contains_key(&key) {
            return false;
        }
        self.index_policy(&policy);
        self.policies.insert(key, policy);
        true
    }

    fn index_policy(&mut self, policy: &InsurancePolicy) {
        self.flight_policies
            .entry(policy.flight().clone())
            .or_default()
            .push(*policy.passenger());
    }

    /// Passengers insured on a flight, in purchase order
    pub fn insured_passengers(&self, flight: &FlightKey) -> Vec<Address> {
        self.flight_policies.get(flight).cloned().unwrap_or_default()
    }

    pub fn credit(&self, passenger: &Address) -> u64 {
        self.credits.get(passenger).copied().unwrap_or(0)
    }

    pub(crate) fn add_credit(&mut self, passenger: Address, amount: u64) {
        let balance = self.credits.entry(passenger).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Zero a balance and return what it held
    pub(crate) fn take_credit(&mut self, passenger: &Address) -> u64 {
        self.credits.remove(passenger).unwrap_or(0)
    }

    // ========================================================================
    // ORACLES
    // ========================================================================

    pub fn oracle(&self, reporter: &Address) -> Option<&OracleRegistration> {
        self.oracles.get(reporter)
    }

    pub(crate) fn insert_oracle(&mut self, registration: OracleRegistration) -> bool {
        let reporter = *registration.reporter();
        if self.oracles.contains_key(&reporter) {
            return false;
        }
        self.oracles.insert(reporter, registration);
        true
    }

    pub fn oracle_count(&self) -> usize {
        self.oracles.len()
    }

    pub fn request(&self, key: &RequestKey) -> Option<&StatusRequest> {
        self.requests.get(key)
    }

    pub(crate) fn request_mut(&mut self, key: &RequestKey) -> Option<&mut StatusRequest> {
        self.requests.get_mut(key)
    }

    /// Start a round under the request's key. Callers decide whether an
    /// existing round may be discarded.
    pub(crate) fn open_request(&mut self, request: StatusRequest) {
        self.requests.insert(request.key().clone(), request);
    }

    /// Close every open round on a flight. Returns how many were closed.
    pub(crate) fn close_requests(&mut self, flight: &FlightKey, status: FlightStatus) -> usize {
        let mut closed = 0;
        for request in self.requests.values_mut() {
            if request.key().flight == *flight && request.is_open() {
                request.close(status);
                closed += 1;
            }
        }
        closed
    }

    pub(crate) fn remove_request(&mut self, key: &RequestKey) -> Option<StatusRequest> {
        self.requests.remove(key)
    }

    pub fn requests(&self) -> impl Iterator<Item = &StatusRequest> {
        self.requests.values()
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    /// Poll for events (clears the event queue)
    pub fn poll_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // STATISTICS AND ENCODING
    // ========================================================================

    pub fn statistics(&self) -> LedgerStatistics {
        LedgerStatistics {
            registered_airlines: self.registered_count(),
            participating_airlines: self.participating_count(),
            flights: self.flights.len(),
            finalized_flights: self.flights.values().filter(|f| f.is_finalized()).count(),
            policies: self.policies.len(),
            total_premiums: self
                .policies
                .values()
                .map(|p| p.premium())
                .fold(0, u64::saturating_add),
            outstanding_credit: self.credits.values().copied().fold(0, u64::saturating_add),
            oracles: self.oracles.len(),
            open_requests: self.requests.values().filter(|r| r.is_open()).count(),
        }
    }

    /// Rebuild indexes (after deserialization)
    pub(crate) fn rebuild_indexes(&mut self) {
        self.flight_policies.clear();
        let policies: Vec<InsurancePolicy> = self.policies.values().cloned().collect();
        for policy in &policies {
            self.index_policy(policy);
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        postcard::to_allocvec(self).map_err(|e| LedgerError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let mut state: LedgerState =
            postcard::from_bytes(bytes).map_err(|_| LedgerError::DeserializationFailed)?;
        state.rebuild_indexes();
        Ok(state)
    }
}
