use crate::error::Result;
use crate::ledger::Ledger;
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// What the dashboard reads on every request: the ledger plus its base balance
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub ledger: Ledger,
    pub base_balance: f64,
}

struct Slot {
    loaded_at: Instant,
    snapshot: Arc<Snapshot>,
}

/// Keeps the last snapshot read from the store for up to `ttl`.
///
/// A zero ttl makes every read go back to the store. Saves call
/// `invalidate` so the next read reloads.
pub struct LedgerCache {
    ttl: Duration,
    slot: Mutex<Option<Slot>>,
}

impl LedgerCache {
    pub fn new(ttl: Duration) -> Self {
        LedgerCache {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce() -> Result<Snapshot>,
    {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(cached) = slot.as_ref() {
            if !self.ttl.is_zero() && cached.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.snapshot));
            }
        }

        let snapshot = Arc::new(load()?);
        debug!("Reloaded ledger ({} entries)", snapshot.ledger.len());
        *slot = Some(Slot {
            loaded_at: Instant::now(),
            snapshot: Arc::clone(&snapshot),
        });
        Ok(snapshot)
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *slot = None;
    }
}
