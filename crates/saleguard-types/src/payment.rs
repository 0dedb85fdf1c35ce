//! Payment method selection
//!
//! Each agreement fixes its payment path once at creation: either the
//! chain's native currency or a fungible token identified by its contract.
//! Keeping the choice a closed variant means the two transfer paths branch
//! exactly once, in the treasury, instead of scattering native-vs-token
//! checks through the state machine.

use crate::TokenId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an agreement's price is denominated and moved
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// The chain's base unit of value, attached to the confirming call
    Native,
    /// A fungible token, pulled from the buyer's pre-authorized allowance
    Token(TokenId),
}

impl PaymentMethod {
    /// Check if this is the native-currency path
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// The token contract, if this is the token path
    pub fn token(&self) -> Option<&TokenId> {
        match self {
            Self::Native => None,
            Self::Token(token) => Some(token),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Token(token) => write!(f, "{}", token),
        }
    }
}
