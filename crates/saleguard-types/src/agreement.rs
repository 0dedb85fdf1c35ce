//! Agreement records and lifecycle
//!
//! An agreement is one sale tracked by the escrow state machine: three
//! fixed party identities, the item terms, the payment method, and the
//! current position in the `Created → Confirmed → Delivered → Completed`
//! lifecycle. Records are never deleted — a completed agreement persists
//! as a permanent audit trail.

use crate::{Amount, PartyId, PaymentMethod};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle position of an agreement
///
/// Status only ever advances forward; no transition skips a required
/// predecessor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgreementStatus {
    /// Terms recorded, no funds moved yet
    Created,
    /// Buyer has paid; price is held in custody
    Confirmed,
    /// Buyer has acknowledged receipt of the item
    Delivered,
    /// Escrow agent has released the held funds to the seller
    Completed,
}

impl AgreementStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check if funds are custodied while in this state
    pub fn holds_funds(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Delivered)
    }
}

impl fmt::Display for AgreementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Which external process would adjudicate a disagreement
///
/// Recorded at creation and stored verbatim; no transition in the core
/// depends on it, and no mode alters who may release custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeResolution {
    /// Settle in court
    Court,
    /// Settle via a named arbitrator
    Arbitration,
    /// Settle via mediation
    Mediation,
}

/// The three roles an agreement's operations authorize against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Creator of the agreement; receives the payout
    Seller,
    /// Pays the price into custody and confirms delivery
    Buyer,
    /// Third party authorized to release custodied funds
    EscrowAgent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Seller => "seller",
            Self::Buyer => "buyer",
            Self::EscrowAgent => "escrow agent",
        };
        write!(f, "{s}")
    }
}

/// Terms supplied when creating an agreement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementTerms {
    /// Item being sold
    pub item_name: String,
    /// Free-form item description
    pub description: String,
    /// Strictly positive price in units of `payment`
    pub price: Amount,
    /// Party that will pay and confirm
    pub buyer: PartyId,
    /// Native currency or token contract
    pub payment: PaymentMethod,
    /// Expected delivery date; informational only
    pub delivery_date: DateTime<Utc>,
    /// Whether custody is used (recorded; custody is used in all observed flows)
    pub use_escrow: bool,
    /// Party authorized to release custody
    pub escrow_agent: PartyId,
    /// Whether a refund path is available (recorded only)
    pub is_refundable: bool,
    /// How a disagreement would be settled externally
    pub dispute_resolution: DisputeResolution,
}

/// One sale record tracked by the escrow state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    /// Creator; receives the payout on completion
    pub seller: PartyId,
    /// Pays the price into custody and confirms delivery
    pub buyer: PartyId,
    /// Third party authorized to release custody
    pub escrow_agent: PartyId,
    /// Item being sold
    pub item_name: String,
    /// Free-form item description
    pub description: String,
    /// Price in units of `payment`
    pub price: Amount,
    /// Native currency or token contract
    pub payment: PaymentMethod,
    /// Expected delivery date; informational only
    pub delivery_date: DateTime<Utc>,
    /// Whether custody is used (recorded)
    pub use_escrow: bool,
    /// Whether a refund path is available (recorded)
    pub is_refundable: bool,
    /// How a disagreement would be settled externally
    pub dispute_resolution: DisputeResolution,
    /// Current lifecycle position
    pub status: AgreementStatus,
    /// Value currently custodied for this agreement
    pub held: Amount,
    /// When the agreement was created
    pub created_at: DateTime<Utc>,
}

impl Agreement {
    /// The party identity a given role must match
    pub fn party_for(&self, role: Role) -> &PartyId {
        match role {
            Role::Seller => &self.seller,
            Role::Buyer => &self.buyer,
            Role::EscrowAgent => &self.escrow_agent,
        }
    }

    /// Check if `caller` holds `role` on this agreement
    pub fn is_held_by(&self, role: Role, caller: &PartyId) -> bool {
        self.party_for(role) == caller
    }
}
