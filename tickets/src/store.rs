//! The ticket store: lifecycle operations over a keyed table.
//!
//! [`TicketStore`] is the imperative shell around [`TicketReducer`]. For every
//! mutating operation it:
//!
//! 1. Takes the lock for the ticket's key
//! 2. Loads the current record (except on creation)
//! 3. Asks the reducer for a transition
//! 4. Writes the transition back (full replace or remove)
//!
//! Steps 2–4 run under the key lock, so two buys racing on one ticket cannot
//! both succeed. Operations on different tickets do not coordinate.

use crate::config::Config;
use crate::error::{Result, TicketError};
use crate::locks::{DEFAULT_STRIPES, KeyLocks};
use crate::metrics;
use crate::reducer::{AuthPolicy, TicketAction, TicketEnvironment, TicketReducer};
use crate::storage::{self, MemoryStore, StorageError, TicketStorage};
use crate::types::{Principal, Ticket, TicketId, TicketPayload};
use std::sync::Arc;
use ticket_store_core::environment::{Clock, IdGenerator, SystemClock, UuidGenerator};
use ticket_store_core::reducer::{Reducer, Transition};

/// Persistent mapping from ticket id to ticket record
///
/// Constructed once at startup and shared by `Arc`; there is no global instance.
///
/// # Example
///
/// ```
/// use ticket_store::{Principal, TicketPayload, TicketStore};
///
/// # fn main() -> Result<(), ticket_store::TicketError> {
/// let store = TicketStore::builder().build();
/// let seller = Principal::new("alice");
///
/// let ticket = store.add_ticket(TicketPayload::new("Dune", 12), &seller)?;
/// let bought = store.buy_ticket(&ticket.id)?;
/// assert!(bought.reserved);
///
/// let revoked = store.revoke_ticket(&ticket.id, &seller)?;
/// assert!(!revoked.reserved);
/// # Ok(())
/// # }
/// ```
pub struct TicketStore {
    storage: TicketStorage,
    reducer: TicketReducer,
    env: TicketEnvironment,
    ids: Arc<dyn IdGenerator>,
    locks: KeyLocks,
}

impl TicketStore {
    /// Start building a store; every dependency has a production default
    #[must_use]
    pub fn builder() -> TicketStoreBuilder {
        TicketStoreBuilder::default()
    }

    /// Build a store from configuration, opening the configured backend
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be opened.
    pub fn from_config(config: &Config) -> std::result::Result<Self, StorageError> {
        let storage = storage::open(&config.storage)?;
        metrics::set_ticket_count(storage.len()?);

        Ok(Self::builder()
            .storage(storage)
            .auth_policy(config.auth.policy())
            .lock_stripes(config.storage.lock_stripes)
            .build())
    }

    /// The authorization rule in force
    #[must_use]
    pub const fn auth_policy(&self) -> AuthPolicy {
        self.env.auth
    }

    // ========== Queries ==========

    /// All tickets in key order; empty when the store is empty
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::StorageFailure`] if the table cannot be read.
    #[tracing::instrument(skip(self))]
    pub fn get_tickets(&self) -> Result<Vec<Ticket>> {
        let tickets = self.storage.values().inspect_err(|e| {
            tracing::error!(error = %e, "Failed to list tickets");
        })?;
        tracing::debug!(count = tickets.len(), "Listed tickets");
        Ok(tickets)
    }

    /// The ticket stored under `id`
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`] if there is no such ticket, or
    /// [`TicketError::StorageFailure`] if the table cannot be read.
    #[tracing::instrument(skip(self, id), fields(ticket_id = %id))]
    pub fn get_ticket(&self, id: &TicketId) -> Result<Ticket> {
        self.storage
            .get(id.as_str())?
            .ok_or_else(|| TicketError::NotFound { id: id.clone() })
    }

    /// Number of stored tickets
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::StorageFailure`] if the table cannot be read.
    pub fn len(&self) -> Result<usize> {
        Ok(self.storage.len()?)
    }

    /// Whether no tickets are stored
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::StorageFailure`] if the table cannot be read.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.storage.is_empty()?)
    }

    // ========== Commands ==========

    /// Create a free ticket sold by `seller`
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidPayload`] if the movie is empty or the
    /// placement is zero (nothing is inserted), or
    /// [`TicketError::StorageFailure`] if the insert fails.
    #[tracing::instrument(skip(self, payload, seller), fields(seller = %seller, movie = %payload.movie, placement = payload.placement))]
    pub fn add_ticket(&self, payload: TicketPayload, seller: &Principal) -> Result<Ticket> {
        if !payload.is_valid() {
            metrics::record_operation("add_ticket", TicketError::InvalidPayload.code());
            tracing::warn!("Rejected ticket with missing movie or placement");
            return Err(TicketError::InvalidPayload);
        }

        self.dispatch(TicketAction::CreateTicket {
            id: TicketId::new(self.ids.next_id()),
            seller: seller.clone(),
            payload,
        })
    }

    /// Reserve a free ticket
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`], [`TicketError::AlreadyReserved`], or
    /// [`TicketError::StorageFailure`].
    #[tracing::instrument(skip(self, id), fields(ticket_id = %id))]
    pub fn buy_ticket(&self, id: &TicketId) -> Result<Ticket> {
        self.dispatch(TicketAction::BuyTicket { id: id.clone() })
    }

    /// Release a reserved ticket
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`], [`TicketError::Unauthorized`] (when
    /// seller auth is required and `caller` is not the seller),
    /// [`TicketError::NotReserved`], or [`TicketError::StorageFailure`].
    #[tracing::instrument(skip(self, id, caller), fields(ticket_id = %id, caller = %caller))]
    pub fn revoke_ticket(&self, id: &TicketId, caller: &Principal) -> Result<Ticket> {
        self.dispatch(TicketAction::RevokeTicket {
            id: id.clone(),
            caller: caller.clone(),
        })
    }

    /// Remove a ticket permanently, returning its last stored value
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`], [`TicketError::Unauthorized`] (when
    /// seller auth is required and `caller` is not the seller), or
    /// [`TicketError::StorageFailure`].
    #[tracing::instrument(skip(self, id, caller), fields(ticket_id = %id, caller = %caller))]
    pub fn delete_ticket(&self, id: &TicketId, caller: &Principal) -> Result<Ticket> {
        self.dispatch(TicketAction::DeleteTicket {
            id: id.clone(),
            caller: caller.clone(),
        })
    }

    // ========== Shell ==========

    fn dispatch(&self, action: TicketAction) -> Result<Ticket> {
        let operation = action.name();
        let id = action.ticket_id().clone();

        let result = {
            let _guard = self.locks.lock(id.as_str());
            self.execute(&id, action)
        };

        match &result {
            Ok(ticket) => {
                metrics::record_operation(operation, "ok");
                tracing::info!(
                    operation,
                    ticket_id = %ticket.id,
                    reserved = ticket.reserved,
                    "Ticket operation applied"
                );
            }
            Err(err) if err.is_rejection() => {
                metrics::record_operation(operation, err.code());
                tracing::warn!(operation, ticket_id = %id, code = err.code(), error = %err, "Ticket operation rejected");
            }
            Err(err) => {
                metrics::record_operation(operation, err.code());
                tracing::error!(operation, ticket_id = %id, error = %err, "Ticket storage failed");
            }
        }

        result
    }

    /// Load, reduce, write back. Caller holds the key lock.
    fn execute(&self, id: &TicketId, action: TicketAction) -> Result<Ticket> {
        let current = if action.reads_current() {
            self.storage.get(id.as_str())?
        } else {
            None
        };

        match self.reducer.reduce(current.as_ref(), action, &self.env)? {
            Transition::Put(ticket) => {
                self.storage.insert(id.as_str().to_owned(), ticket.clone())?;
                Ok(ticket)
            }
            Transition::Remove => self
                .storage
                .remove(id.as_str())?
                .ok_or_else(|| TicketError::NotFound { id: id.clone() }),
        }
    }
}

impl std::fmt::Debug for TicketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketStore")
            .field("env", &self.env)
            .field("lock_stripes", &self.locks.stripes())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TicketStore`]
///
/// Defaults: in-memory storage, system clock, UUID v4 ids, seller-only
/// authorization, 64 lock stripes.
pub struct TicketStoreBuilder {
    storage: Option<TicketStorage>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    auth: AuthPolicy,
    lock_stripes: usize,
}

impl Default for TicketStoreBuilder {
    fn default() -> Self {
        Self {
            storage: None,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            auth: AuthPolicy::default(),
            lock_stripes: DEFAULT_STRIPES,
        }
    }
}

impl TicketStoreBuilder {
    /// Use `storage` as the ticket table
    #[must_use]
    pub fn storage(mut self, storage: TicketStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use `clock` for creation and update timestamps
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `ids` to generate ticket ids
    #[must_use]
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Set who may revoke and delete
    #[must_use]
    pub const fn auth_policy(mut self, auth: AuthPolicy) -> Self {
        self.auth = auth;
        self
    }

    /// Set the number of key lock stripes
    #[must_use]
    pub const fn lock_stripes(mut self, stripes: usize) -> Self {
        self.lock_stripes = stripes;
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> TicketStore {
        let storage: TicketStorage = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStore::<Ticket>::new()),
        };

        TicketStore {
            storage,
            reducer: TicketReducer::new(),
            env: TicketEnvironment::new(self.clock, self.auth),
            ids: self.ids,
            locks: KeyLocks::new(self.lock_stripes),
        }
    }
}
