//! Saleguard Types - Canonical domain types for sale-with-escrow agreements
//!
//! This crate contains all foundational types for Saleguard with zero
//! dependencies on other saleguard crates. It defines the complete type
//! system for:
//!
//! - Identity types (PartyId, TokenId, AgreementId)
//! - Amount type with checked fixed-point arithmetic
//! - Payment method selection (native currency vs fungible token)
//! - Agreement records, status lifecycle, and dispute modes
//! - Notification events
//! - The error taxonomy
//!
//! # Architectural Invariants
//!
//! These types support the core Saleguard invariants:
//!
//! 1. Funds never move directly between counterparties — custody is the
//!    only intermediate holder
//! 2. An agreement's status only ever advances forward through
//!    `Created → Confirmed → Delivered → Completed`
//! 3. The three party identities are fixed for an agreement's lifetime
//! 4. Failure must be explicit — every error carries enough structure
//!    to distinguish its kind programmatically

pub mod identity;
pub mod amount;
pub mod payment;
pub mod agreement;
pub mod event;
pub mod error;

pub use identity::*;
pub use amount::*;
pub use payment::*;
pub use agreement::*;
pub use event::*;
pub use error::*;

/// Version of the Saleguard types schema
pub const TYPES_VERSION: &str = "0.1.0";
