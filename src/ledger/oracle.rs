// Oracle registrations and open status requests

use crate::identity::Address;
use crate::ledger::{FlightKey, FlightStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registered reporter. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRegistration {
    reporter: Address,
    indexes: Vec<u8>,
    stake: u64,
}

impl OracleRegistration {
    pub fn new(reporter: Address, indexes: Vec<u8>, stake: u64) -> Self {
        Self {
            reporter,
            indexes,
            stake,
        }
    }

    pub fn reporter(&self) -> &Address {
        &self.reporter
    }

    pub fn indexes(&self) -> &[u8] {
        &self.indexes
    }

    pub fn stake(&self) -> u64 {
        self.stake
    }

    pub fn has_index(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

/// Key of a status request: routing index plus flight
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: u8,
    pub flight: FlightKey,
}

impl RequestKey {
    pub fn new(index: u8, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

/// A round of status reports for one flight at one index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    key: RequestKey,
    requester: Address,
    /// Ledger tick the request was opened at
    opened_at: u64,
    /// Reporters grouped by the status they reported
    responses: BTreeMap<FlightStatus, Vec<Address>>,
    finalized: Option<FlightStatus>,
}

impl StatusRequest {
    pub fn new(key: RequestKey, requester: Address, opened_at: u64) -> Self {
        Self {
            key,
            requester,
            opened_at,
            responses: BTreeMap::new(),
            finalized: None,
        }
    }

    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    pub fn requester(&self) -> &Address {
        &self.requester
    }

    pub fn opened_at(&self) -> u64 {
        self.opened_at
    }

    pub fn is_open(&self) -> bool {
        self.finalized.is_none()
    }

    pub fn finalized_status(&self) -> Option<FlightStatus> {
        self.finalized
    }

    /// Whether the request has outlived `ttl` ticks at tick `now`
    pub fn is_expired(&self, now: u64, ttl: u64) -> bool {
        now.saturating_sub(self.opened_at) > ttl
    }

    /// Whether the reporter already answered this round
    pub fn has_reported(&self, reporter: &Address) -> bool {
        self.responses.values().any(|r| r.contains(reporter))
    }

    /// Number of reports for a status
    pub fn responses_for(&self, status: FlightStatus) -> usize {
        self.responses.get(&status).map(Vec::len).unwrap_or(0)
    }

    pub fn total_responses(&self) -> usize {
        self.responses.values().map(Vec::len).sum()
    }

    /// Append a report and return the new count for that status
    pub(crate) fn record(&mut self, reporter: Address, status: FlightStatus) -> usize {
        let reporters = self.responses.entry(status).or_default();
        reporters.push(reporter);
        reporters.len()
    }

    pub(crate) fn set_requester(&mut self, requester: Address) {
        self.requester = requester;
    }

    pub(crate) fn close(&mut self, status: FlightStatus) {
        self.finalized = Some(status);
    }
}
