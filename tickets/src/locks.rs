//! Striped key locks for per-ticket read-modify-write.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default number of stripes
pub const DEFAULT_STRIPES: usize = 64;

/// A fixed set of mutexes indexed by key hash.
///
/// Holding the guard for a key excludes every other operation on that key.
/// Two different keys contend only when they hash to the same stripe.
#[derive(Debug)]
pub struct KeyLocks {
    stripes: Box<[Mutex<()>]>,
}

impl KeyLocks {
    /// Create `stripes` locks (at least one)
    #[must_use]
    pub fn new(stripes: usize) -> Self {
        let stripes = (0..stripes.max(1)).map(|_| Mutex::new(())).collect();
        Self { stripes }
    }

    /// Number of stripes
    #[must_use]
    pub fn stripes(&self) -> usize {
        self.stripes.len()
    }

    /// Block until the stripe guarding `key` is free and take it.
    pub fn lock(&self, key: &str) -> MutexGuard<'_, ()> {
        // The mutex guards no data, so a poisoned stripe is still usable.
        self.stripes[self.stripe_for(key)]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[allow(clippy::cast_possible_truncation)] // reduced modulo a usize first
    fn stripe_for(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPES)
    }
}
