//! # Ticket Store Core
//!
//! Core traits and types shared by the ticket store crates.
//!
//! The ticket store follows a "functional core, imperative shell" split:
//!
//! - **Reducer**: Pure function `(Option<State>, Action, Environment) → Transition`
//! - **Transition**: Description of the write to perform (put or remove), not the write itself
//! - **Environment**: Injected dependencies via traits (clock, id generation)
//! - **Storage**: A durable ordered key-value map that the shell reads and writes
//!
//! The shell owns the storage and the locking; the reducer owns every business rule.
//!
//! ## Example
//!
//! ```ignore
//! use ticket_store_core::reducer::{Reducer, Transition};
//!
//! impl Reducer for TicketReducer {
//!     type State = Ticket;
//!     type Action = TicketAction;
//!     type Environment = TicketEnvironment;
//!     type Error = TicketError;
//!
//!     fn reduce(
//!         &self,
//!         state: Option<&Ticket>,
//!         action: TicketAction,
//!         env: &TicketEnvironment,
//!     ) -> Result<Transition<Ticket>, TicketError> {
//!         // Business rules go here
//!         Ok(Transition::Remove)
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod storage;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions over a single keyed record:
/// `(Option<State>, Action, Environment) → Result<Transition, Error>`
///
/// They contain all business logic and are deterministic and testable.
/// A reducer never touches storage; the caller applies the returned transition.
pub mod reducer {
    /// The write a reducer asks the shell to perform on one key.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Transition<S> {
        /// Replace (or create) the record under the key with this value
        Put(S),

        /// Remove the record under the key
        Remove,
    }

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The record type this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    /// - `Error`: The rejection type returned when an action is not allowed
    pub trait Reducer {
        /// The record type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// The error returned when an action is rejected
        type Error;

        /// Reduce an action against the current record into a transition
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current record (if any)
        /// 2. Returns the transition to apply, or a rejection
        ///
        /// # Arguments
        ///
        /// - `state`: The record currently stored under the action's key, if any
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when the action is not valid for the current record.
        fn reduce(
            &self,
            state: Option<&Self::State>,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Transition<Self::State>, Self::Error>;
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter. Production implementations live here;
/// deterministic ones live in `ticket-store-testing`.
pub mod environment {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use ticket_store_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of fresh record keys
    ///
    /// Implementations must never hand out the same id twice for the lifetime
    /// of the data they key, including ids of records that were deleted.
    pub trait IdGenerator: Send + Sync {
        /// Generate a new unique id
        fn next_id(&self) -> String;
    }

    /// Random v4 UUIDs drawn from the operating system's CSPRNG
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UuidGenerator;

    impl IdGenerator for UuidGenerator {
        fn next_id(&self) -> String {
            Uuid::new_v4().to_string()
        }
    }
}
