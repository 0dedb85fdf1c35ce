//! Saleguard Ledger - The source of truth for agreement records
//!
//! The ledger is:
//! - Keyed by a dense identifier counter (0, 1, 2, ...)
//! - Append-only (records are transitioned in place, never deleted)
//! - The exclusive owner of the identifier counter
//!
//! # Invariants
//!
//! 1. Exactly one record exists per identifier once created
//! 2. Identifiers form a gapless, monotonically increasing sequence
//! 3. No component other than the ledger allocates identifiers
//! 4. A completed agreement persists as a permanent audit trail

use std::collections::HashMap;
use std::sync::Arc;

use saleguard_types::{Agreement, AgreementId, Result, SaleguardError};
use tokio::sync::RwLock;

struct LedgerInner {
    next_id: AgreementId,
    agreements: HashMap<AgreementId, Agreement>,
}

/// Durable mapping from agreement identifier to agreement record
#[derive(Clone)]
pub struct AgreementLedger {
    inner: Arc<RwLock<LedgerInner>>,
}

impl AgreementLedger {
    /// Create an empty ledger; the first created agreement gets id 0
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(LedgerInner {
                next_id: AgreementId::FIRST,
                agreements: HashMap::new(),
            })),
        }
    }

    /// Append a new record and return its identifier
    ///
    /// Identifiers are allocated densely in creation order.
    pub async fn create(&self, agreement: Agreement) -> AgreementId {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id = id.next();
        inner.agreements.insert(id, agreement);
        id
    }

    /// Get a copy of the record for `id`
    pub async fn get(&self, id: AgreementId) -> Result<Agreement> {
        let inner = self.inner.read().await;
        inner
            .agreements
            .get(&id)
            .cloned()
            .ok_or(SaleguardError::UnknownAgreement { agreement_id: id })
    }

    /// Apply an in-place transition to the record for `id`
    ///
    /// The mutator runs under the write lock; entries are never removed.
    /// Returns the updated record.
    pub async fn update<F>(&self, id: AgreementId, mutator: F) -> Result<Agreement>
    where
        F: FnOnce(&mut Agreement),
    {
        let mut inner = self.inner.write().await;
        let agreement = inner
            .agreements
            .get_mut(&id)
            .ok_or(SaleguardError::UnknownAgreement { agreement_id: id })?;
        mutator(agreement);
        Ok(agreement.clone())
    }

    /// Number of agreements ever created
    pub async fn count(&self) -> u64 {
        self.inner.read().await.next_id.0
    }
}

impl Default for AgreementLedger {
    fn default() -> Self {
        Self::new()
    }
}
