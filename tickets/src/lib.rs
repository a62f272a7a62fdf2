//! Ticket Store - sale and reservation state for venue tickets
//!
//! Tickets are created free, reserved ("bought"), released ("revoked") and
//! finally deleted. Each one lives under a generated id in an ordered
//! key-value table.
//!
//! # Architecture
//!
//! ```text
//!   TicketService        string errors, CallContext { caller }
//!        │
//!        ▼
//!   TicketStore          key lock → load → reduce → write back
//!        │      ╲
//!        │       ╲
//!        ▼        ▼
//!   KeyValueStore   TicketReducer     pure lifecycle rules
//!   (memory|file)
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! FREE ──buy──▶ RESERVED ──revoke──▶ FREE
//! FREE | RESERVED ──delete──▶ (absent)
//! ```
//!
//! Buying a reserved ticket and revoking a free one are errors, not no-ops.
//! Revoke and delete are seller-only unless [`AuthPolicy::open`] is configured.
//!
//! # Usage
//!
//! See [`TicketStore`] for the operations and [`Config`] for environment variables.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod locks;
pub mod metrics;
pub mod reducer;
pub mod service;
pub mod storage;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::TicketError;
pub use reducer::{AuthPolicy, TicketAction, TicketEnvironment, TicketReducer};
pub use service::{CallContext, TicketService};
pub use store::{TicketStore, TicketStoreBuilder};
pub use types::*;
