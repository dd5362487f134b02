// SuretyService - cloneable handle that serializes access to a FlightSurety
//
// Operations run one at a time under the ledger lock, which gives the single
// total order the ledger relies on. The lock is never held across an await:
// a withdrawal debits the balance under the lock, releases it, and only then
// awaits the external transfer.

use crate::app::{FlightSurety, SuretyError};
use crate::identity::Address;
use crate::insurance::{Payout, PayoutTarget};
use crate::ledger::LedgerEvent;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Receipt of a completed payout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutReceipt {
    payout: Payout,
    reference: String,
}

impl PayoutReceipt {
    pub fn payout(&self) -> &Payout {
        &self.payout
    }

    pub fn amount(&self) -> u64 {
        self.payout.amount()
    }

    /// Reference returned by the payout target
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

#[derive(Clone)]
pub struct SuretyService {
    ledger: Arc<Mutex<FlightSurety>>,
    target: Arc<dyn PayoutTarget>,
    events: broadcast::Sender<LedgerEvent>,
}

impl SuretyService {
    pub fn new(ledger: FlightSurety, target: Arc<dyn PayoutTarget>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            target,
            events,
        }
    }

    /// Subscribe to ledger events published after each operation
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, FlightSurety> {
        // A panic mid-operation cannot leave partial state: components
        // validate before they write.
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, events: Vec<LedgerEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }

    /// Run one mutating operation atomically and publish its events
    pub fn execute<R, F>(&self, op: F) -> Result<R, SuretyError>
    where
        F: FnOnce(&mut FlightSurety) -> Result<R, SuretyError>,
    {
        let (result, events) = {
            let mut ledger = self.lock();
            let result = op(&mut ledger);
            (result, ledger.poll_events())
        };
        self.publish(events);
        result
    }

    /// Read from the ledger
    pub fn query<R, F>(&self, read: F) -> R
    where
        F: FnOnce(&FlightSurety) -> R,
    {
        let ledger = self.lock();
        read(&ledger)
    }

    /// Copy of the current ledger, e.g. for persistence
    pub fn snapshot(&self) -> FlightSurety {
        self.lock().clone()
    }

    /// Withdraw the passenger's credit and transfer it out.
    ///
    /// If the transfer fails or times out the credit is put back.
    pub async fn withdraw(&self, passenger: Address) -> Result<PayoutReceipt, SuretyError> {
        let (payout, timeout_ms) = self.execute(|ledger| {
            let payout = ledger.withdraw(&passenger)?;
            Ok((payout, ledger.config().payout_timeout_ms))
        })?;

        let transfer = self.target.transfer(&payout);
        let outcome = tokio::time::timeout(Duration::from_millis(timeout_ms), transfer).await;

        let error = match outcome {
            Ok(Ok(reference)) => {
                info!(%passenger, amount = payout.amount(), %reference, "payout transferred");
                return Ok(PayoutReceipt { payout, reference });
            }
            Ok(Err(e)) => e,
            Err(_) => "Timeout".to_string(),
        };

        warn!(%passenger, amount = payout.amount(), %error, "payout failed, restoring credit");
        let events = {
            let mut ledger = self.lock();
            ledger.restore_payout(&payout);
            ledger.poll_events()
        };
        self.publish(events);

        Err(SuretyError::PayoutFailed(error))
    }
}
