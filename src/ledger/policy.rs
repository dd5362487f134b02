// Insurance policies, one per (passenger, flight)

use crate::identity::Address;
use crate::ledger::FlightKey;
use serde::{Deserialize, Serialize};

/// Policy key: (passenger, flight)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyKey {
    pub passenger: Address,
    pub flight: FlightKey,
}

impl PolicyKey {
    pub fn new(passenger: Address, flight: FlightKey) -> Self {
        Self { passenger, flight }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePolicy {
    passenger: Address,
    flight: FlightKey,
    premium: u64,
    /// Amount credited to the passenger for this policy
    credited: u64,
}

impl InsurancePolicy {
    pub fn new(passenger: Address, flight: FlightKey, premium: u64) -> Self {
        Self {
            passenger,
            flight,
            premium,
            credited: 0,
        }
    }

    pub fn key(&self) -> PolicyKey {
        PolicyKey::new(self.passenger, self.flight.clone())
    }

    pub fn passenger(&self) -> &Address {
        &self.passenger
    }

    pub fn flight(&self) -> &FlightKey {
        &self.flight
    }

    pub fn premium(&self) -> u64 {
        self.premium
    }

    pub fn credited(&self) -> u64 {
        self.credited
    }

    pub fn is_credited(&self) -> bool {
        self.credited > 0
    }

    pub(crate) fn set_credited(&mut self, amount: u64) {
        self.credited = amount;
    }
}
