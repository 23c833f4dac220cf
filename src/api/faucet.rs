//! Faucet rate limiting
//!
//! Tracks the last grant per address so the faucet cannot be drained by
//! repeated requests. Owned by the API layer and injected into its state;
//! the core never sees it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Coins granted per faucet request
pub const FAUCET_AMOUNT: i64 = 50;

/// Minimum wait between grants to the same address
pub const FAUCET_INTERVAL: Duration = Duration::from_secs(60);

/// Per-address rate limiter for faucet grants
#[derive(Debug)]
pub struct FaucetLimiter {
    interval: Duration,
    last_grant: Mutex<HashMap<String, Instant>>,
}

impl FaucetLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_grant: Mutex::new(HashMap::new()),
        }
    }

    /// Try to acquire a grant for the address
    ///
    /// Returns `true` and records the grant if the address is outside its
    /// cooldown window; `false` otherwise.
    pub fn try_acquire(&self, address: &str) -> bool {
        let mut last_grant = self.last_grant.lock().expect("faucet lock poisoned");
        let now = Instant::now();
        if let Some(last) = last_grant.get(address) {
            if now.duration_since(*last) < self.interval {
                return false;
            }
        }
        last_grant.insert(address.to_string(), now);
        true
    }
}

impl Default for FaucetLimiter {
    fn default() -> Self {
        Self::new(FAUCET_INTERVAL)
    }
}
