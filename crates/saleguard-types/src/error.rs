//! Error types for Saleguard
//!
//! All errors are explicit. A failed operation has no effect: the state
//! transition and any value movement are rolled back before the failure
//! is surfaced, and every variant carries enough structure to distinguish
//! the kind programmatically.

use crate::{AgreementId, AgreementStatus, Amount, Role};
use thiserror::Error;

/// Result type for Saleguard operations
pub type Result<T> = std::result::Result<T, SaleguardError>;

/// Why a value transfer could not be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransferFailure {
    /// The payer's balance does not cover the amount
    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    /// The payer's allowance to the custodian does not cover the amount
    #[error("insufficient allowance: approved {approved}, required {required}")]
    InsufficientAllowance { approved: Amount, required: Amount },

    /// Custody does not cover the payout amount
    #[error("insufficient custody: available {available}, required {required}")]
    InsufficientCustody { available: Amount, required: Amount },
}

/// Saleguard error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleguardError {
    /// The identifier was never allocated by the ledger
    #[error("agreement {agreement_id} not found")]
    UnknownAgreement { agreement_id: AgreementId },

    /// The caller does not hold the role the operation requires
    #[error("caller is not the agreement's {required}")]
    Unauthorized { required: Role },

    /// The operation is not valid in the agreement's current status
    #[error("agreement {agreement_id} is {status}, operation not valid")]
    InvalidState {
        agreement_id: AgreementId,
        status: AgreementStatus,
    },

    /// Release was attempted before the buyer marked the item delivered
    #[error("agreement {agreement_id} is {status}, delivery not confirmed")]
    DeliveryNotConfirmed {
        agreement_id: AgreementId,
        status: AgreementStatus,
    },

    /// Native value was attached to a token-denominated agreement
    #[error("native value {attached} attached to a token agreement")]
    NativeTransferNotAccepted { attached: Amount },

    /// Attached native value does not equal the agreement price
    #[error("attached native value {attached} does not equal price {expected}")]
    IncorrectAmount { expected: Amount, attached: Amount },

    /// The value transfer itself failed; the enclosing transition is aborted
    #[error("transfer failed: {failure}")]
    TransferFailed { failure: TransferFailure },

    /// Creation input rejected
    #[error("invalid terms: {field} - {reason}")]
    InvalidTerms { field: String, reason: String },

    /// Checked arithmetic guard
    #[error("amount overflow during arithmetic operation")]
    AmountOverflow,
}

impl SaleguardError {
    /// Create an invalid-terms error
    pub fn invalid_terms(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTerms {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAgreement { .. } => "UNKNOWN_AGREEMENT",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::DeliveryNotConfirmed { .. } => "DELIVERY_NOT_CONFIRMED",
            Self::NativeTransferNotAccepted { .. } => "NATIVE_TRANSFER_NOT_ACCEPTED",
            Self::IncorrectAmount { .. } => "INCORRECT_AMOUNT",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::InvalidTerms { .. } => "INVALID_TERMS",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
        }
    }
}
