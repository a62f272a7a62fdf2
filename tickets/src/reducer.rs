//! Reducer logic for the ticket lifecycle.
//!
//! Each ticket moves through two states:
//!
//! ```text
//!            buy
//!   FREE ──────────▶ RESERVED
//!     ▲                 │
//!     └─────────────────┘
//!           revoke
//!
//!   FREE | RESERVED ──delete──▶ (absent)
//! ```
//!
//! `buy` on a reserved ticket and `revoke` on a free ticket are rejected.
//! The reducer only decides; writing the result is the store's job.

use crate::error::TicketError;
use crate::types::{Principal, Ticket, TicketId, TicketPayload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticket_store_core::environment::Clock;
use ticket_store_core::reducer::{Reducer, Transition};

// ============================================================================
// Actions
// ============================================================================

/// Commands accepted by the ticket reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketAction {
    /// Create a new free ticket under `id`
    CreateTicket {
        /// Freshly generated id
        id: TicketId,
        /// Creating caller, becomes the seller
        seller: Principal,
        /// Movie title and placement
        payload: TicketPayload,
    },

    /// Reserve a free ticket
    BuyTicket {
        /// Ticket to reserve
        id: TicketId,
    },

    /// Release a reserved ticket
    RevokeTicket {
        /// Ticket to release
        id: TicketId,
        /// Caller asking for the release
        caller: Principal,
    },

    /// Remove a ticket permanently
    DeleteTicket {
        /// Ticket to remove
        id: TicketId,
        /// Caller asking for the removal
        caller: Principal,
    },
}

impl TicketAction {
    /// The key this action reads and writes
    #[must_use]
    pub const fn ticket_id(&self) -> &TicketId {
        match self {
            Self::CreateTicket { id, .. }
            | Self::BuyTicket { id }
            | Self::RevokeTicket { id, .. }
            | Self::DeleteTicket { id, .. } => id,
        }
    }

    /// Operation name for logs and metrics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateTicket { .. } => "add_ticket",
            Self::BuyTicket { .. } => "buy_ticket",
            Self::RevokeTicket { .. } => "revoke_ticket",
            Self::DeleteTicket { .. } => "delete_ticket",
        }
    }

    /// Whether the reducer needs the currently stored record
    ///
    /// Creation uses a fresh id and does not check for collisions.
    #[must_use]
    pub const fn reads_current(&self) -> bool {
        !matches!(self, Self::CreateTicket { .. })
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Who may revoke or delete a ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPolicy {
    /// Only the seller may revoke or delete when `true`; anyone may when `false`
    pub require_seller_auth: bool,
}

impl AuthPolicy {
    /// Seller-only revoke and delete
    #[must_use]
    pub const fn seller_only() -> Self {
        Self {
            require_seller_auth: true,
        }
    }

    /// Any caller may revoke or delete
    #[must_use]
    pub const fn open() -> Self {
        Self {
            require_seller_auth: false,
        }
    }

    /// Check that `caller` may modify `ticket`
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Unauthorized`] when seller auth is required and
    /// `caller` is not the seller.
    pub fn authorize(&self, ticket: &Ticket, caller: &Principal) -> Result<(), TicketError> {
        if self.require_seller_auth && !ticket.is_sold_by(caller) {
            return Err(TicketError::Unauthorized {
                id: ticket.id.clone(),
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self::seller_only()
    }
}

/// Environment dependencies for the ticket reducer
#[derive(Clone)]
pub struct TicketEnvironment {
    /// Clock for creation and update timestamps
    pub clock: Arc<dyn Clock>,
    /// Authorization rule for revoke and delete
    pub auth: AuthPolicy,
}

impl TicketEnvironment {
    /// Creates a new `TicketEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, auth: AuthPolicy) -> Self {
        Self { clock, auth }
    }
}

impl std::fmt::Debug for TicketEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketEnvironment")
            .field("clock", &"<dyn Clock>")
            .field("auth", &self.auth)
            .finish()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for a single ticket record
#[derive(Clone, Copy, Debug, Default)]
pub struct TicketReducer;

impl TicketReducer {
    /// Creates a new `TicketReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn existing<'a>(state: Option<&'a Ticket>, id: &TicketId) -> Result<&'a Ticket, TicketError> {
        state.ok_or_else(|| TicketError::NotFound { id: id.clone() })
    }
}

impl Reducer for TicketReducer {
    type State = Ticket;
    type Action = TicketAction;
    type Environment = TicketEnvironment;
    type Error = TicketError;

    fn reduce(
        &self,
        state: Option<&Ticket>,
        action: TicketAction,
        env: &TicketEnvironment,
    ) -> Result<Transition<Ticket>, TicketError> {
        match action {
            TicketAction::CreateTicket {
                id,
                seller,
                payload,
            } => {
                if !payload.is_valid() {
                    return Err(TicketError::InvalidPayload);
                }
                Ok(Transition::Put(Ticket::new(
                    id,
                    seller,
                    payload.movie,
                    payload.placement,
                    env.clock.now(),
                )))
            }

            TicketAction::BuyTicket { id } => {
                let ticket = Self::existing(state, &id)?;
                if ticket.reserved {
                    return Err(TicketError::AlreadyReserved {
                        placement: ticket.placement,
                    });
                }
                Ok(Transition::Put(ticket.reserved_at(env.clock.now())))
            }

            TicketAction::RevokeTicket { id, caller } => {
                let ticket = Self::existing(state, &id)?;
                env.auth.authorize(ticket, &caller)?;
                if !ticket.reserved {
                    return Err(TicketError::NotReserved {
                        placement: ticket.placement,
                    });
                }
                Ok(Transition::Put(ticket.released_at(env.clock.now())))
            }

            TicketAction::DeleteTicket { id, caller } => {
                let ticket = Self::existing(state, &id)?;
                env.auth.authorize(ticket, &caller)?;
                Ok(Transition::Remove)
            }
        }
    }
}
