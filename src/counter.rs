use crate::store::{KvStore, KEY_COUNT};

/// The running tally. Applies signed deltas with no bounds checking (the
/// count may go negative) and persists after every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterStore {
    count: i64,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the tally from the gateway. A missing or non-numeric value
    /// reads as zero.
    pub fn load(store: &dyn KvStore) -> Self {
        let count = store
            .get(KEY_COUNT)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        Self { count }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn apply(&mut self, delta: i64, store: &mut dyn KvStore) -> i64 {
        self.count += delta;
        store.set(KEY_COUNT, &self.count.to_string());
        self.count
    }

    pub fn reset_to_zero(&mut self) -> i64 {
        // The persisted key is removed by the coordinating reset, which
        // clears the whole store in one operation.
        self.count = 0;
        self.count
    }
}
