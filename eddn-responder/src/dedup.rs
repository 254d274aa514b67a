//! Memory of the last market reported per schema.
//!
//! The journal and CAPI both report what a station sells, and usually within seconds of each
//! other. Whichever path reports a market first wins; the later report of the same market is
//! suppressed. Both paths of a schema hold the same [`DedupSlot`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Identity of a reported fact, currently a market id. `None` when the event carried none.
pub type DedupKey = Option<i64>;

#[derive(Debug, Default)]
pub struct DedupSlot {
    last_sent: Mutex<DedupKey>,
}

impl DedupSlot {
    /// Atomically compare `key` with the last sent key and remember it if it differs.
    ///
    /// Returns `false` when `key` was the last one sent. A missing key is always sent and is
    /// remembered as "no key", so it never suppresses a later report.
    pub fn check_and_set(&self, key: DedupKey) -> bool {
        let mut last_sent = self.last_sent.lock().expect("poisoned dedup lock");

        if key.is_some() && *last_sent == key {
            return false;
        }

        *last_sent = key;
        true
    }

    pub fn last_sent(&self) -> DedupKey {
        *self.last_sent.lock().expect("poisoned dedup lock")
    }
}

/// Dedup slots keyed by schema name, shared by every handler of that schema.
#[derive(Debug, Default)]
pub struct DedupStore {
    slots: Mutex<HashMap<&'static str, Arc<DedupSlot>>>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the slot for `schema`, creating it on first use.
    pub fn slot(&self, schema: &'static str) -> Arc<DedupSlot> {
        self.slots
            .lock()
            .expect("poisoned dedup store lock")
            .entry(schema)
            .or_default()
            .clone()
    }
}
