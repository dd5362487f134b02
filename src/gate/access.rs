// AccessGate - owner-controlled pause flag and authorized calling layers

use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Ledger is not operational")]
    NotOperational,

    #[error("Caller {0} is not authorized")]
    Unauthorized(Address),

    #[error("Only the ledger owner may do this")]
    NotOwner,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGate {
    owner: Address,
    operational: bool,
    authorized: BTreeSet<Address>,
}

impl AccessGate {
    /// New gate: operational, nobody authorized
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            operational: true,
            authorized: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn is_authorized(&self, caller: &Address) -> bool {
        self.authorized.contains(caller)
    }

    pub fn authorized_callers(&self) -> impl Iterator<Item = &Address> {
        self.authorized.iter()
    }

    /// Pause or resume all mutating operations. Owner only.
    pub fn set_operational(&mut self, sender: &Address, operational: bool) -> Result<(), GateError> {
        self.require_owner(sender)?;
        self.operational = operational;
        info!(operational, "operational status changed");
        Ok(())
    }

    /// Grant or revoke a calling layer. Owner only.
    pub fn set_authorization(
        &mut self,
        sender: &Address,
        caller: Address,
        authorized: bool,
    ) -> Result<(), GateError> {
        self.require_owner(sender)?;
        if authorized {
            self.authorized.insert(caller);
        } else {
            self.authorized.remove(&caller);
        }
        info!(%caller, authorized, "caller authorization changed");
        Ok(())
    }

    pub fn require_owner(&self, sender: &Address) -> Result<(), GateError> {
        if *sender != self.owner {
            return Err(GateError::NotOwner);
        }
        Ok(())
    }

    pub fn require_operational(&self) -> Result<(), GateError> {
        if !self.operational {
            return Err(GateError::NotOperational);
        }
        Ok(())
    }

    pub fn require_authorized(&self, caller: &Address) -> Result<(), GateError> {
        if !self.is_authorized(caller) {
            return Err(GateError::Unauthorized(*caller));
        }
        Ok(())
    }

    /// Both checks, operational first
    pub fn check(&self, caller: &Address) -> Result<(), GateError> {
        self.require_operational()?;
        self.require_authorized(caller)
    }
}
