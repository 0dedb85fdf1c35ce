//! Notification events
//!
//! Every committed transition that external watchers observe appends one
//! event to the engine's log. The log is append-only; events are never
//! rewritten or removed.

use crate::{AgreementId, PartyId};
use serde::{Deserialize, Serialize};

/// A notification raised by a committed state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementEvent {
    /// A new agreement was recorded
    Created {
        id: AgreementId,
        seller: PartyId,
        buyer: PartyId,
        escrow_agent: PartyId,
    },
    /// The buyer paid the price into custody
    Confirmed { id: AgreementId },
    /// The escrow agent released custody to the seller
    Completed {
        id: AgreementId,
        seller: PartyId,
        buyer: PartyId,
    },
}

impl AgreementEvent {
    /// The agreement this event belongs to
    pub fn agreement_id(&self) -> AgreementId {
        match self {
            Self::Created { id, .. } => *id,
            Self::Confirmed { id } => *id,
            Self::Completed { id, .. } => *id,
        }
    }
}
