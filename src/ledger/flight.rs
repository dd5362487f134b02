// Flights, their composite key and status codes

use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flight status as reported by oracles. Codes match the reporter wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlightStatus {
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Unknown,
        FlightStatus::OnTime,
        FlightStatus::LateAirline,
        FlightStatus::LateWeather,
        FlightStatus::LateTechnical,
        FlightStatus::LateOther,
    ];

    /// Wire code (0, 10, 20, 30, 40, 50)
    pub fn code(&self) -> u8 {
        match self {
            FlightStatus::Unknown => 0,
            FlightStatus::OnTime => 10,
            FlightStatus::LateAirline => 20,
            FlightStatus::LateWeather => 30,
            FlightStatus::LateTechnical => 40,
            FlightStatus::LateOther => 50,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Delays the airline is liable for
    pub fn is_airline_fault(&self) -> bool {
        matches!(self, FlightStatus::LateAirline)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightStatus::Unknown => "unknown",
            FlightStatus::OnTime => "on-time",
            FlightStatus::LateAirline => "late-airline",
            FlightStatus::LateWeather => "late-weather",
            FlightStatus::LateTechnical => "late-technical",
            FlightStatus::LateOther => "late-other",
        };
        f.write_str(name)
    }
}

/// Composite flight key: (airline, flight code, scheduled timestamp)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    airline: Address,
    code: String,
    timestamp: u64,
}

impl FlightKey {
    pub fn new(airline: Address, code: &str, timestamp: u64) -> Self {
        Self {
            airline,
            code: code.to_string(),
            timestamp,
        }
    }

    pub fn airline(&self) -> &Address {
        &self.airline
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.code, self.timestamp, self.airline)
    }
}

/// A registered flight
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    key: FlightKey,
    status: FlightStatus,
    finalized: bool,
    /// Set once insured passengers have been credited
    credited: bool,
}

impl Flight {
    pub fn new(key: FlightKey) -> Self {
        Self {
            key,
            status: FlightStatus::Unknown,
            finalized: false,
            credited: false,
        }
    }

    pub fn key(&self) -> &FlightKey {
        &self.key
    }

    pub fn status(&self) -> FlightStatus {
        self.status
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn is_credited(&self) -> bool {
        self.credited
    }

    /// Fix the terminal status. Returns false if already finalized.
    pub(crate) fn finalize(&mut self, status: FlightStatus) -> bool {
        if self.finalized {
            return false;
        }
        self.status = status;
        self.finalized = true;
        true
    }

    pub(crate) fn mark_credited(&mut self) {
        self.credited = true;
    }
}
