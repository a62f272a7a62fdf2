//! Request/response façade over [`TicketStore`].
//!
//! This is the surface a host binds to its transport. Every call returns
//! either the ticket(s) or a human-readable error message; the structured
//! [`TicketError`](crate::TicketError) stays inside the process.

use crate::error::TicketError;
use crate::store::TicketStore;
use crate::types::{Principal, Ticket, TicketId, TicketPayload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-call context supplied by the host
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Identity of the caller making this request
    pub caller: Principal,
}

impl CallContext {
    /// Context for `caller`
    #[must_use]
    pub const fn new(caller: Principal) -> Self {
        Self { caller }
    }
}

/// The six ticket operations with string errors
#[derive(Clone, Debug)]
pub struct TicketService {
    store: Arc<TicketStore>,
}

impl TicketService {
    /// Wrap a shared store
    #[must_use]
    pub const fn new(store: Arc<TicketStore>) -> Self {
        Self { store }
    }

    /// List all tickets
    ///
    /// # Errors
    ///
    /// Returns the storage failure message if the table cannot be read.
    pub fn get_tickets(&self) -> Result<Vec<Ticket>, String> {
        self.store
            .get_tickets()
            .map_err(|e| message(e, "Error fetching tickets"))
    }

    /// Fetch one ticket
    ///
    /// # Errors
    ///
    /// Returns a message if the ticket does not exist or storage fails.
    pub fn get_ticket(&self, id: &str) -> Result<Ticket, String> {
        self.store
            .get_ticket(&TicketId::from(id))
            .map_err(|e| message(e, "Error fetching ticket"))
    }

    /// Create a ticket sold by the caller
    ///
    /// # Errors
    ///
    /// Returns a message if the payload is invalid or storage fails.
    pub fn add_ticket(&self, ctx: &CallContext, payload: TicketPayload) -> Result<Ticket, String> {
        self.store
            .add_ticket(payload, &ctx.caller)
            .map_err(|e| message(e, "Error inserting ticket"))
    }

    /// Reserve a ticket
    ///
    /// # Errors
    ///
    /// Returns a message if the ticket does not exist, is already reserved, or storage fails.
    pub fn buy_ticket(&self, id: &str) -> Result<Ticket, String> {
        self.store
            .buy_ticket(&TicketId::from(id))
            .map_err(|e| e.to_string())
    }

    /// Release a reserved ticket
    ///
    /// # Errors
    ///
    /// Returns a message if the ticket does not exist, the caller may not
    /// revoke it, it is free, or storage fails.
    pub fn revoke_ticket(&self, ctx: &CallContext, id: &str) -> Result<Ticket, String> {
        self.store
            .revoke_ticket(&TicketId::from(id), &ctx.caller)
            .map_err(|e| e.to_string())
    }

    /// Delete a ticket
    ///
    /// # Errors
    ///
    /// Returns a message if the ticket does not exist, the caller may not
    /// delete it, or storage fails.
    pub fn delete_ticket(&self, ctx: &CallContext, id: &str) -> Result<Ticket, String> {
        self.store
            .delete_ticket(&TicketId::from(id), &ctx.caller)
            .map_err(|e| message(e, "Error while deleting ticket"))
    }
}

/// Render an error for the caller, prefixing storage failures with what was being attempted
fn message(err: TicketError, storage_context: &str) -> String {
    match err {
        TicketError::StorageFailure(_) => format!("{storage_context}: {err}"),
        rejection => rejection.to_string(),
    }
}
