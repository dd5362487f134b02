// Payout - value owed to a passenger and the external transfer seam

use crate::identity::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Credit taken out of the ledger, awaiting external transfer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    passenger: Address,
    amount: u64,
}

impl Payout {
    pub fn new(passenger: Address, amount: u64) -> Self {
        Self { passenger, amount }
    }

    pub fn passenger(&self) -> &Address {
        &self.passenger
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

/// Moves withdrawn value to the passenger (wallet, bank, chain)
#[async_trait]
pub trait PayoutTarget: Send + Sync {
    /// Returns a transfer reference on success, an error message on failure
    async fn transfer(&self, payout: &Payout) -> Result<String, String>;
}

/// Mock implementation of PayoutTarget for testing
pub struct MockPayoutTarget {
    should_succeed: bool,
    failure_message: Option<String>,
    delay_ms: u64,
    call_count: AtomicUsize,
    transferred: AtomicU64,
}

impl MockPayoutTarget {
    /// Create a new mock target (defaults to success)
    pub fn new() -> Self {
        Self {
            should_succeed: true,
            failure_message: None,
            delay_ms: 0,
            call_count: AtomicUsize::new(0),
            transferred: AtomicU64::new(0),
        }
    }

    /// Configure to always fail with a message
    pub fn with_failure(mut self, message: &str) -> Self {
        self.should_succeed = false;
        self.failure_message = Some(message.to_string());
        self
    }

    /// Add a delay before responding
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Sum of successful transfers
    pub fn total_transferred(&self) -> u64 {
        self.transferred.load(Ordering::SeqCst)
    }
}

impl Default for MockPayoutTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayoutTarget for MockPayoutTarget {
    async fn transfer(&self, payout: &Payout) -> Result<String, String> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.should_succeed {
            self.transferred.fetch_add(payout.amount(), Ordering::SeqCst);
            Ok(format!("payout-mock-{}", call_num))
        } else {
            Err(self
                .failure_message
                .clone()
                .unwrap_or_else(|| "Mock failure".to_string()))
        }
    }
}
