//! # Ticket Store Testing
//!
//! Testing utilities and helpers for the ticket store.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits (clocks, id generators)
//! - A fault-injecting storage wrapper for exercising failure paths
//! - A tracing initializer for tests that want log output
//!
//! ## Example
//!
//! ```ignore
//! use ticket_store_testing::{test_clock, SequentialIdGenerator};
//!
//! #[test]
//! fn add_then_get() {
//!     let store = TicketStore::builder()
//!         .clock(Arc::new(test_clock()))
//!         .id_generator(Arc::new(SequentialIdGenerator::new("ticket")))
//!         .build();
//!     // ...
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use ticket_store_core::environment::{Clock, IdGenerator};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, IdGenerator, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_store_testing::mocks::FixedClock;
    /// use ticket_store_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }

    /// Clock that advances by a fixed step on every reading
    ///
    /// Useful when a test needs strictly increasing timestamps, e.g. to tell
    /// `created_at` apart from `updated_at`.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_store_testing::mocks::SteppingClock;
    /// use ticket_store_core::environment::Clock;
    ///
    /// let clock = SteppingClock::seconds();
    /// let first = clock.now();
    /// assert!(clock.now() > first);
    /// ```
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// Start at `start`, advancing by `step` after each reading
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }

        /// Start at 2025-01-01 00:00:00 UTC, advancing one second per reading
        #[must_use]
        pub fn seconds() -> Self {
            Self::new(epoch(), Duration::seconds(1))
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            // A poisoned lock still holds a valid timestamp.
            let mut next = self
                .next
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let current = *next;
            *next = current + self.step;
            current
        }
    }

    /// Predictable ids: `{prefix}-0001`, `{prefix}-0002`, ...
    ///
    /// Zero-padded so that key order matches creation order.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_store_testing::mocks::SequentialIdGenerator;
    /// use ticket_store_core::environment::IdGenerator;
    ///
    /// let ids = SequentialIdGenerator::new("ticket");
    /// assert_eq!(ids.next_id(), "ticket-0001");
    /// assert_eq!(ids.next_id(), "ticket-0002");
    /// ```
    #[derive(Debug)]
    pub struct SequentialIdGenerator {
        prefix: String,
        counter: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Create a generator whose ids start with `prefix`
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                counter: AtomicU64::new(0),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> String {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            format!("{}-{n:04}", self.prefix)
        }
    }

    pub(super) fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_089)
    }
}

pub mod faults;

/// Install a `tracing` subscriber that writes to the test harness output.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_store=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use faults::FailingStore;
pub use mocks::{FixedClock, SequentialIdGenerator, SteppingClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_clock_is_new_year_2025() {
        assert_eq!(test_clock().now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_stepping_clock_advances() {
        let clock = SteppingClock::new(test_clock().now(), Duration::milliseconds(5));
        let a = clock.now();
        let b = clock.now();
        assert_eq!(b - a, Duration::milliseconds(5));
    }

    #[test]
    fn test_sequential_ids_sort_in_creation_order() {
        let ids = SequentialIdGenerator::new("t");
        let generated: Vec<String> = (0..12).map(|_| ids.next_id()).collect();
        let mut sorted = generated.clone();
        sorted.sort();
        assert_eq!(generated, sorted);
    }
}
