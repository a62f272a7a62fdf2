//! Errors returned by ticket store operations.

use crate::types::{Principal, TicketId};
use thiserror::Error;
use ticket_store_core::storage::StorageError;

/// Why a ticket operation was rejected.
///
/// Every variant is returned as a value; the store is left unchanged whenever
/// one of these comes back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// Movie is empty or placement is zero.
    #[error("Invalid payload: movie and placement fields are required.")]
    InvalidPayload,

    /// No ticket is stored under the id.
    #[error("ticket with id={id} not found")]
    NotFound {
        /// The requested id
        id: TicketId,
    },

    /// Buy was attempted on a ticket that is already reserved.
    #[error("Ticket for placement {placement} already reserved")]
    AlreadyReserved {
        /// Placement of the reserved ticket
        placement: u64,
    },

    /// Revoke was attempted on a ticket that is free.
    #[error("Ticket with placement {placement} is free.")]
    NotReserved {
        /// Placement of the free ticket
        placement: u64,
    },

    /// Someone other than the seller tried to revoke or delete.
    #[error("caller {caller} is not the seller of ticket with id={id}")]
    Unauthorized {
        /// The ticket being modified
        id: TicketId,
        /// The rejected caller
        caller: Principal,
    },

    /// The underlying key-value store failed.
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StorageError),
}

impl TicketError {
    /// Stable machine-readable code, used for log fields and metric labels
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload => "invalid_payload",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyReserved { .. } => "already_reserved",
            Self::NotReserved { .. } => "not_reserved",
            Self::Unauthorized { .. } => "unauthorized",
            Self::StorageFailure(_) => "storage_failure",
        }
    }

    /// Whether this is a rejected transition rather than an infrastructure fault
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::StorageFailure(_))
    }
}

/// Result alias for ticket operations
pub type Result<T> = std::result::Result<T, TicketError>;
