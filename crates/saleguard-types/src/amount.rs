//! Amount type with checked arithmetic
//!
//! Saleguard amounts are unsigned 128-bit integers of smallest units,
//! denominated in the unit of the agreement's payment method. All
//! arithmetic is overflow-checked; balances can never go negative.

use crate::{Result, SaleguardError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A quantity of value in smallest units
///
/// The unit is determined by context: for a native-currency agreement it
/// is the chain's base unit, for a token agreement it is the token's
/// smallest unit. Amounts carry no currency tag of their own — mixing
/// units is prevented one level up, by the payment method fixed at
/// agreement creation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    /// Create an amount from smallest units
    pub fn new(units: u128) -> Self {
        Self(units)
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(0)
    }

    /// Raw value in smallest units
    pub fn units(&self) -> u128 {
        self.0
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(SaleguardError::AmountOverflow)
    }

    /// Checked subtraction; amounts never go negative
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(SaleguardError::AmountOverflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}
