//! Domain types for the ticket store.
//!
//! A [`Ticket`] is one sellable seat for a movie showing. It is created free,
//! may be reserved and released any number of times, and is eventually deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a ticket
///
/// Assigned once at creation by the store's id generator and never reused.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wrap an existing id string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a storage key
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TicketId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TicketId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of a caller
///
/// The store never interprets the contents; it only compares principals for
/// equality when checking seller authorization.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wrap an identity token
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// The identity used when a caller did not authenticate
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    /// Get the raw identity token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Principal {
    fn from(identity: &str) -> Self {
        Self::new(identity)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A single ticket record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier, immutable
    pub id: TicketId,
    /// Caller that created the ticket, immutable
    pub seller: Principal,
    /// Movie title
    pub movie: String,
    /// Seat/slot designator, never zero
    pub placement: u64,
    /// Whether the ticket is currently sold/held
    pub reserved: bool,
    /// When the ticket was created
    pub created_at: DateTime<Utc>,
    /// When the ticket was last bought or revoked
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Creates a free ticket that has never been updated
    #[must_use]
    pub const fn new(
        id: TicketId,
        seller: Principal,
        movie: String,
        placement: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            seller,
            movie,
            placement,
            reserved: false,
            created_at,
            updated_at: None,
        }
    }

    /// Returns a copy of this ticket marked reserved at `at`
    #[must_use]
    pub fn reserved_at(&self, at: DateTime<Utc>) -> Self {
        Self {
            reserved: true,
            updated_at: Some(at),
            ..self.clone()
        }
    }

    /// Returns a copy of this ticket marked free at `at`
    #[must_use]
    pub fn released_at(&self, at: DateTime<Utc>) -> Self {
        Self {
            reserved: false,
            updated_at: Some(at),
            ..self.clone()
        }
    }

    /// Whether `caller` created this ticket
    #[must_use]
    pub fn is_sold_by(&self, caller: &Principal) -> bool {
        &self.seller == caller
    }
}

/// Fields a caller supplies to create a ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPayload {
    /// Movie title, must not be empty
    pub movie: String,
    /// Seat/slot designator, must not be zero
    pub placement: u64,
}

impl TicketPayload {
    /// Creates a payload
    #[must_use]
    pub fn new(movie: impl Into<String>, placement: u64) -> Self {
        Self {
            movie: movie.into(),
            placement,
        }
    }

    /// Whether both required fields carry a value
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.movie.is_empty() && self.placement != 0
    }
}
