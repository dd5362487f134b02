// Ledger events - observable outcomes of successful mutations

use crate::identity::Address;
use crate::ledger::{FlightKey, FlightStatus};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    AirlineRegistered {
        airline: Address,
        name: String,
        proposer: Address,
        votes: usize,
    },
    AirlineFunded {
        airline: Address,
        amount: u64,
    },
    AirlineVoted {
        voter: Address,
        candidate: Address,
        votes: usize,
    },
    FlightRegistered {
        flight: FlightKey,
    },
    InsurancePurchased {
        passenger: Address,
        flight: FlightKey,
        premium: u64,
    },
    OracleRegistered {
        reporter: Address,
        indexes: Vec<u8>,
    },
    /// Consumed by external reporters holding `index`
    OracleRequest {
        index: u8,
        flight: FlightKey,
    },
    OracleReport {
        reporter: Address,
        index: u8,
        flight: FlightKey,
        status: FlightStatus,
    },
    /// A status reached agreement and the flight is final
    FlightStatusInfo {
        flight: FlightKey,
        status: FlightStatus,
    },
    PassengerCredited {
        passenger: Address,
        flight: FlightKey,
        amount: u64,
    },
    CreditWithdrawn {
        passenger: Address,
        amount: u64,
    },
    CreditRestored {
        passenger: Address,
        amount: u64,
    },
    RequestExpired {
        index: u8,
        flight: FlightKey,
    },
    OperationalStatusChanged {
        operational: bool,
    },
    AuthorizationChanged {
        caller: Address,
        authorized: bool,
    },
}
