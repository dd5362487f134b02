// FlightSurety - entry points for governance, insurance and oracle operations
//
// Each mutating call checks the operational flag and this layer's
// authorization before touching state, runs one component operation, and
// advances the ledger clock only on success. Component operations validate
// everything before they write, so a failed call leaves no trace.

use crate::config::{ConfigError, SuretyConfig};
use crate::gate::{AccessGate, GateError};
use crate::governance::{AirlineGovernance, GovernanceError};
use crate::identity::Address;
use crate::insurance::{InsuranceAccounting, InsuranceError, Payout};
use crate::ledger::{
    AdmissionState, Airline, Flight, FlightKey, FlightStatus, InsurancePolicy, LedgerError,
    LedgerEvent, LedgerState, LedgerStatistics, PolicyKey, RequestKey, StatusRequest,
};
use crate::oracle::{OracleConsensus, OracleError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuretyError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Insurance(#[from] InsuranceError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Payout transfer failed: {0}")]
    PayoutFailed(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlightSurety {
    config: SuretyConfig,
    gate: AccessGate,
    /// Identity this layer presents to the gate
    caller: Address,
    state: LedgerState,
}

impl FlightSurety {
    /// Create a ledger owned by `owner` with `first_airline` registered.
    /// The new layer starts authorized and operational.
    pub fn new(
        config: SuretyConfig,
        owner: Address,
        first_airline: Address,
        first_airline_name: &str,
    ) -> Result<Self, SuretyError> {
        config.validate()?;

        let caller = Address::generate();
        let mut gate = AccessGate::new(owner);
        gate.set_authorization(&owner, caller, true)?;

        let mut state = LedgerState::new(first_airline, first_airline_name);
        state.emit(LedgerEvent::AirlineRegistered {
            airline: first_airline,
            name: first_airline_name.to_string(),
            proposer: first_airline,
            votes: 0,
        });

        Ok(Self {
            config,
            gate,
            caller,
            state,
        })
    }

    fn check_gate(&self) -> Result<(), SuretyError> {
        self.gate.check(&self.caller)?;
        Ok(())
    }

    fn commit<T>(&mut self, value: T) -> Result<T, SuretyError> {
        self.state.tick();
        Ok(value)
    }

    // ========================================================================
    // OPERATIONAL CONTROL
    // ========================================================================

    /// Pause or resume the ledger. Owner only; allowed while paused.
    pub fn set_operational(&mut self, sender: &Address, operational: bool) -> Result<(), SuretyError> {
        self.gate.set_operational(sender, operational)?;
        self.state
            .emit(LedgerEvent::OperationalStatusChanged { operational });
        self.commit(())
    }

    /// Grant or revoke a calling layer. Owner only.
    pub fn set_authorization(
        &mut self,
        sender: &Address,
        caller: Address,
        authorized: bool,
    ) -> Result<(), SuretyError> {
        self.gate.set_authorization(sender, caller, authorized)?;
        self.state
            .emit(LedgerEvent::AuthorizationChanged { caller, authorized });
        self.commit(())
    }

    pub fn is_operational(&self) -> bool {
        self.gate.is_operational()
    }

    pub fn is_authorized(&self, caller: &Address) -> bool {
        self.gate.is_authorized(caller)
    }

    /// Identity of this calling layer
    pub fn caller_id(&self) -> &Address {
        &self.caller
    }

    pub fn owner(&self) -> &Address {
        self.gate.owner()
    }

    // ========================================================================
    // AIRLINE GOVERNANCE
    // ========================================================================

    /// Admit `airline`, proposed by `proposer`. Returns the votes counted.
    pub fn register_airline(
        &mut self,
        airline: Address,
        name: &str,
        proposer: &Address,
    ) -> Result<usize, SuretyError> {
        self.check_gate()?;
        let votes =
            AirlineGovernance::register(&mut self.state, &self.config, airline, name, proposer)?;
        self.commit(votes)
    }

    pub fn fund_airline(&mut self, airline: &Address, amount: u64) -> Result<(), SuretyError> {
        self.check_gate()?;
        AirlineGovernance::fund(&mut self.state, &self.config, airline, amount)?;
        self.commit(())
    }

    /// Vote for a candidate. Returns the candidate's tally.
    pub fn vote(&mut self, voter: &Address, candidate: &Address) -> Result<usize, SuretyError> {
        self.check_gate()?;
        let votes = AirlineGovernance::vote(&mut self.state, voter, candidate)?;
        self.commit(votes)
    }

    pub fn register_flight(
        &mut self,
        airline: &Address,
        code: &str,
        timestamp: u64,
    ) -> Result<FlightKey, SuretyError> {
        self.check_gate()?;
        let key = AirlineGovernance::register_flight(&mut self.state, airline, code, timestamp)?;
        self.commit(key)
    }

    // ========================================================================
    // INSURANCE
    // ========================================================================

    pub fn buy(&mut self, passenger: Address, flight: &FlightKey, premium: u64) -> Result<(), SuretyError> {
        self.check_gate()?;
        InsuranceAccounting::buy(&mut self.state, &self.config, passenger, flight, premium)?;
        self.commit(())
    }

    /// Take the passenger's whole credit out of the ledger. The returned
    /// payout is already debited; the caller performs the transfer.
    pub fn withdraw(&mut self, passenger: &Address) -> Result<Payout, SuretyError> {
        self.check_gate()?;
        let payout = InsuranceAccounting::withdraw(&mut self.state, passenger)?;
        self.commit(payout)
    }

    /// Undo a withdrawal whose transfer failed. Not gated: a pause between
    /// debit and transfer must not lose the credit.
    pub(crate) fn restore_payout(&mut self, payout: &Payout) {
        InsuranceAccounting::restore(&mut self.state, payout);
        self.state.tick();
    }

    // ========================================================================
    // ORACLES
    // ========================================================================

    /// Register a reporter. Returns its assigned indexes.
    pub fn register_oracle(&mut self, reporter: Address, stake: u64) -> Result<Vec<u8>, SuretyError> {
        self.check_gate()?;
        let indexes = OracleConsensus::register(&mut self.state, &self.config, reporter, stake)?;
        self.commit(indexes)
    }

    /// Open a status request. Reporters learn of it from the
    /// `OracleRequest` event; the answer arrives as `FlightStatusInfo`.
    pub fn request_status(&mut self, requester: Address, flight: &FlightKey) -> Result<u8, SuretyError> {
        self.check_gate()?;
        let index = OracleConsensus::request(&mut self.state, &self.config, requester, flight)?;
        self.commit(index)
    }

    /// Submit a report. Returns the final status when this report settled it.
    pub fn submit_status(
        &mut self,
        reporter: &Address,
        index: u8,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<Option<FlightStatus>, SuretyError> {
        self.check_gate()?;
        let outcome =
            OracleConsensus::submit(&mut self.state, &self.config, reporter, index, flight, status)?;
        self.commit(outcome)
    }

    /// Drop requests that outlived the ttl without agreement
    pub fn expire_requests(&mut self) -> Result<Vec<RequestKey>, SuretyError> {
        self.check_gate()?;
        let expired = OracleConsensus::expire_requests(&mut self.state, &self.config);
        self.commit(expired)
    }

    // ========================================================================
    // QUERIES (available while paused)
    // ========================================================================

    pub fn config(&self) -> &SuretyConfig {
        &self.config
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.state.version()
    }

    pub fn airline(&self, airline: &Address) -> Option<&Airline> {
        self.state.airline(airline)
    }

    pub fn airline_state(&self, airline: &Address) -> AdmissionState {
        self.state
            .airline(airline)
            .map(|a| a.state())
            .unwrap_or(AdmissionState::Unregistered)
    }

    pub fn is_airline_registered(&self, airline: &Address) -> bool {
        self.airline_state(airline).is_registered()
    }

    pub fn is_airline_funded(&self, airline: &Address) -> bool {
        self.airline_state(airline).is_funded()
    }

    pub fn is_airline_participating(&self, airline: &Address) -> bool {
        self.airline_state(airline).is_participating()
    }

    pub fn registered_airlines(&self) -> Vec<Address> {
        self.state.registered_airlines()
    }

    pub fn registered_airline_count(&self) -> usize {
        self.state.registered_count()
    }

    pub fn participating_airline_count(&self) -> usize {
        self.state.participating_count()
    }

    /// Votes recorded for a candidate that has not been admitted yet
    pub fn votes_for(&self, candidate: &Address) -> usize {
        self.state
            .candidate_votes(candidate)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub fn flight(&self, flight: &FlightKey) -> Option<&Flight> {
        self.state.flight(flight)
    }

    pub fn flight_status(&self, flight: &FlightKey) -> Option<FlightStatus> {
        self.state.flight(flight).map(|f| f.status())
    }

    pub fn is_passenger_insured(&self, passenger: &Address, flight: &FlightKey) -> bool {
        InsuranceAccounting::is_insured(&self.state, passenger, flight)
    }

    pub fn policy(&self, passenger: &Address, flight: &FlightKey) -> Option<&InsurancePolicy> {
        self.state.policy(&PolicyKey::new(*passenger, flight.clone()))
    }

    pub fn credit(&self, passenger: &Address) -> u64 {
        self.state.credit(passenger)
    }

    /// Indexes assigned to a reporter
    pub fn oracle_indexes(&self, reporter: &Address) -> Option<Vec<u8>> {
        self.state.oracle(reporter).map(|o| o.indexes().to_vec())
    }

    pub fn open_request(&self, index: u8, flight: &FlightKey) -> Option<&StatusRequest> {
        self.state
            .request(&RequestKey::new(index, flight.clone()))
            .filter(|r| r.is_open())
    }

    pub fn statistics(&self) -> LedgerStatistics {
        self.state.statistics()
    }

    /// Poll for events (clears the event queue)
    pub fn poll_events(&mut self) -> Vec<LedgerEvent> {
        self.state.poll_events()
    }

    // ========================================================================
    // ENCODING
    // ========================================================================

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, SuretyError> {
        postcard::to_allocvec(self)
            .map_err(|e| LedgerError::SerializationFailed(e.to_string()).into())
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SuretyError> {
        let mut ledger: FlightSurety =
            postcard::from_bytes(bytes).map_err(|_| LedgerError::DeserializationFailed)?;
        ledger.config.validate()?;
        ledger.state.rebuild_indexes();
        Ok(ledger)
    }
}
