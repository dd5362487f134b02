// Airline records and the admission state machine

use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Admission state of an airline. Ordered: a record only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdmissionState {
    /// Not admitted (candidates awaiting votes)
    Unregistered,
    /// Admitted, no stake yet
    Registered,
    /// Stake deposited; may vote and register flights
    Funded,
    /// Funded and operating at least one flight
    Participating,
}

impl AdmissionState {
    pub fn is_registered(&self) -> bool {
        *self >= AdmissionState::Registered
    }

    pub fn is_funded(&self) -> bool {
        *self >= AdmissionState::Funded
    }

    /// Funded implies participating for voting and flight registration
    pub fn is_participating(&self) -> bool {
        self.is_funded()
    }
}

/// An admitted airline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    address: Address,
    name: String,
    state: AdmissionState,
    /// Airline that proposed the admission
    proposer: Address,
    /// Affirmative votes counted at admission (empty below the multiparty threshold)
    voters: BTreeSet<Address>,
    /// Total stake deposited
    stake: u64,
}

impl Airline {
    /// Create a freshly registered airline
    pub fn new(address: Address, name: &str, proposer: Address, voters: BTreeSet<Address>) -> Self {
        Self {
            address,
            name: name.to_string(),
            state: AdmissionState::Registered,
            proposer,
            voters,
            stake: 0,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> AdmissionState {
        self.state
    }

    pub fn proposer(&self) -> &Address {
        &self.proposer
    }

    pub fn voters(&self) -> &BTreeSet<Address> {
        &self.voters
    }

    pub fn vote_count(&self) -> usize {
        self.voters.len()
    }

    pub fn stake(&self) -> u64 {
        self.stake
    }

    pub fn is_funded(&self) -> bool {
        self.state.is_funded()
    }

    pub fn is_participating(&self) -> bool {
        self.state.is_participating()
    }

    /// Record a deposit and move to funded
    pub(crate) fn fund(&mut self, amount: u64) {
        self.stake = self.stake.saturating_add(amount);
        self.advance(AdmissionState::Funded);
    }

    /// Move forward to `next`; moves backward are ignored
    pub(crate) fn advance(&mut self, next: AdmissionState) -> bool {
        if next > self.state {
            self.state = next;
            true
        } else {
            false
        }
    }
}
