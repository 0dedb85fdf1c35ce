//! Saleguard Escrow - The sale-with-escrow state machine
//!
//! The engine evaluates every external call against the ledger entry it
//! names: it checks the caller's role, checks the current status, delegates
//! any value movement to the treasury, and only then commits the ledger
//! mutation and appends a notification event.
//!
//! # Key Principle
//!
//! Every operation is all-or-nothing. The ordering inside each public
//! operation is fixed: authorization check → state-precondition check →
//! value transfer → ledger mutation → event emission. A failed transfer
//! aborts the operation before any ledger or event effect exists.

use std::sync::Arc;

use chrono::Utc;
use saleguard_ledger::AgreementLedger;
use saleguard_treasury::Treasury;
use saleguard_types::{
    Agreement, AgreementEvent, AgreementId, AgreementStatus, AgreementTerms, Amount, PartyId,
    Result, Role, SaleguardError,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Check that `caller` holds `required` on `agreement`
///
/// The single authorization point for every operation; callers never
/// compare identities directly.
fn authorize(agreement: &Agreement, required: Role, caller: &PartyId) -> Result<()> {
    if agreement.is_held_by(required, caller) {
        Ok(())
    } else {
        warn!("caller {} is not the agreement's {}", caller, required);
        Err(SaleguardError::Unauthorized { required })
    }
}

/// The escrow state machine over one ledger and one treasury
#[derive(Clone)]
pub struct EscrowEngine {
    ledger: AgreementLedger,
    treasury: Treasury,
    events: Arc<RwLock<Vec<AgreementEvent>>>,
}

impl EscrowEngine {
    /// Create an engine with an empty ledger and treasury
    pub fn new() -> Self {
        Self {
            ledger: AgreementLedger::new(),
            treasury: Treasury::new(),
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The treasury this engine custodies value in
    ///
    /// Exposed so the embedding environment can fund parties and grant
    /// allowances — the collaborators the core consumes, not part of the
    /// state machine itself.
    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// Record a new agreement with `caller` as seller
    ///
    /// Requires a strictly positive price and pairwise-distinct parties.
    /// The new record starts `Created` with nothing held.
    pub async fn create_agreement(
        &self,
        caller: &PartyId,
        terms: AgreementTerms,
    ) -> Result<AgreementId> {
        if terms.price.is_zero() {
            return Err(SaleguardError::invalid_terms(
                "price",
                "must be strictly positive",
            ));
        }
        if terms.buyer == *caller {
            return Err(SaleguardError::invalid_terms(
                "buyer",
                "must be distinct from the seller",
            ));
        }
        if terms.escrow_agent == *caller || terms.escrow_agent == terms.buyer {
            return Err(SaleguardError::invalid_terms(
                "escrow_agent",
                "must be distinct from both seller and buyer",
            ));
        }

        let agreement = Agreement {
            seller: caller.clone(),
            buyer: terms.buyer.clone(),
            escrow_agent: terms.escrow_agent.clone(),
            item_name: terms.item_name,
            description: terms.description,
            price: terms.price,
            payment: terms.payment,
            delivery_date: terms.delivery_date,
            use_escrow: terms.use_escrow,
            is_refundable: terms.is_refundable,
            dispute_resolution: terms.dispute_resolution,
            status: AgreementStatus::Created,
            held: Amount::zero(),
            created_at: Utc::now(),
        };

        let id = self.ledger.create(agreement).await;
        self.emit(AgreementEvent::Created {
            id,
            seller: caller.clone(),
            buyer: terms.buyer,
            escrow_agent: terms.escrow_agent,
        })
        .await;
        info!("agreement {} created by seller {}", id, caller);
        Ok(id)
    }

    /// Buyer pays the price into custody
    ///
    /// `attached` is the native value supplied with the call: it must equal
    /// the price for a native agreement and be zero for a token agreement
    /// (the token path pulls from the buyer's pre-authorized allowance).
    pub async fn confirm_agreement(
        &self,
        caller: &PartyId,
        id: AgreementId,
        attached: Amount,
    ) -> Result<()> {
        let agreement = self.ledger.get(id).await?;
        authorize(&agreement, Role::Buyer, caller)?;
        if agreement.status != AgreementStatus::Created {
            warn!("agreement {} is {}, cannot confirm", id, agreement.status);
            return Err(SaleguardError::InvalidState {
                agreement_id: id,
                status: agreement.status,
            });
        }

        self.treasury
            .collect(&agreement.buyer, &agreement.payment, agreement.price, attached)
            .await?;

        self.ledger
            .update(id, |agreement| {
                agreement.status = AgreementStatus::Confirmed;
                agreement.held = agreement.price;
            })
            .await?;
        self.emit(AgreementEvent::Confirmed { id }).await;
        info!("agreement {} confirmed, {} held in custody", id, agreement.price);
        Ok(())
    }

    /// Buyer acknowledges receipt of the item
    pub async fn mark_as_delivered(&self, caller: &PartyId, id: AgreementId) -> Result<()> {
        let agreement = self.ledger.get(id).await?;
        authorize(&agreement, Role::Buyer, caller)?;
        if agreement.status != AgreementStatus::Confirmed {
            warn!(
                "agreement {} is {}, cannot mark delivered",
                id, agreement.status
            );
            return Err(SaleguardError::InvalidState {
                agreement_id: id,
                status: agreement.status,
            });
        }

        self.ledger
            .update(id, |agreement| {
                agreement.status = AgreementStatus::Delivered;
            })
            .await?;
        info!("agreement {} marked delivered by buyer", id);
        Ok(())
    }

    /// Escrow agent releases the held funds to the seller
    ///
    /// Valid only once the buyer has marked the item delivered; skipping
    /// that step is rejected, not silently allowed. The `Completed` status
    /// and the zero-out of the held amount commit only after a successful
    /// payout.
    pub async fn release_escrow(&self, caller: &PartyId, id: AgreementId) -> Result<()> {
        let agreement = self.ledger.get(id).await?;
        authorize(&agreement, Role::EscrowAgent, caller)?;
        if agreement.status != AgreementStatus::Delivered {
            warn!(
                "agreement {} is {}, delivery not confirmed",
                id, agreement.status
            );
            return Err(SaleguardError::DeliveryNotConfirmed {
                agreement_id: id,
                status: agreement.status,
            });
        }

        self.treasury
            .payout(&agreement.seller, &agreement.payment, agreement.held)
            .await?;

        self.ledger
            .update(id, |agreement| {
                agreement.status = AgreementStatus::Completed;
                agreement.held = Amount::zero();
            })
            .await?;
        self.emit(AgreementEvent::Completed {
            id,
            seller: agreement.seller.clone(),
            buyer: agreement.buyer.clone(),
        })
        .await;
        info!(
            "agreement {} completed, {} released to seller {}",
            id, agreement.held, agreement.seller
        );
        Ok(())
    }

    /// Get a copy of the record for `id`
    pub async fn agreement(&self, id: AgreementId) -> Result<Agreement> {
        self.ledger.get(id).await
    }

    /// Number of agreements ever created
    pub async fn agreement_count(&self) -> u64 {
        self.ledger.count().await
    }

    /// The full append-only event log
    pub async fn events(&self) -> Vec<AgreementEvent> {
        self.events.read().await.clone()
    }

    /// Events belonging to one agreement
    pub async fn events_for(&self, id: AgreementId) -> Vec<AgreementEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|event| event.agreement_id() == id)
            .cloned()
            .collect()
    }

    async fn emit(&self, event: AgreementEvent) {
        self.events.write().await.push(event);
    }
}

impl Default for EscrowEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saleguard_types::{DisputeResolution, PaymentMethod, TokenId};

    fn native_terms(buyer: &PartyId, escrow_agent: &PartyId, price: u128) -> AgreementTerms {
        AgreementTerms {
            item_name: "Laptop".to_string(),
            description: "Gaming laptop".to_string(),
            price: Amount::new(price),
            buyer: buyer.clone(),
            payment: PaymentMethod::Native,
            delivery_date: Utc::now() + chrono::Duration::days(1),
            use_escrow: true,
            escrow_agent: escrow_agent.clone(),
            is_refundable: true,
            dispute_resolution: DisputeResolution::Court,
        }
    }

    #[tokio::test]
    async fn create_allocates_dense_ids_from_zero() {
        let engine = EscrowEngine::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let agent = PartyId::new();

        let first = engine
            .create_agreement(&seller, native_terms(&buyer, &agent, 1_000))
            .await
            .unwrap();
        let second = engine
            .create_agreement(&seller, native_terms(&buyer, &agent, 2_000))
            .await
            .unwrap();

        assert_eq!(first, AgreementId(0));
        assert_eq!(second, AgreementId(1));
        assert_eq!(engine.agreement_count().await, 2);

        let agreement = engine.agreement(first).await.unwrap();
        assert_eq!(agreement.status, AgreementStatus::Created);
        assert!(agreement.held.is_zero());
    }

    #[tokio::test]
    async fn create_rejects_zero_price_and_overlapping_parties() {
        let engine = EscrowEngine::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let agent = PartyId::new();

        let err = engine
            .create_agreement(&seller, native_terms(&buyer, &agent, 0))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TERMS");

        let err = engine
            .create_agreement(&seller, native_terms(&seller, &agent, 1_000))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TERMS");

        let err = engine
            .create_agreement(&seller, native_terms(&buyer, &buyer, 1_000))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TERMS");
    }

    #[tokio::test]
    async fn confirm_requires_the_buyer() {
        let engine = EscrowEngine::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let agent = PartyId::new();
        let id = engine
            .create_agreement(&seller, native_terms(&buyer, &agent, 1_000))
            .await
            .unwrap();

        let err = engine
            .confirm_agreement(&seller, id, Amount::new(1_000))
            .await
            .unwrap_err();
        assert_eq!(err, SaleguardError::Unauthorized { required: Role::Buyer });

        let agreement = engine.agreement(id).await.unwrap();
        assert_eq!(agreement.status, AgreementStatus::Created);
    }

    #[tokio::test]
    async fn confirm_rejects_wrong_native_amount() {
        let engine = EscrowEngine::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let agent = PartyId::new();
        engine
            .treasury()
            .deposit_native(&buyer, Amount::new(10_000))
            .await
            .unwrap();
        let id = engine
            .create_agreement(&seller, native_terms(&buyer, &agent, 1_000))
            .await
            .unwrap();

        let err = engine
            .confirm_agreement(&buyer, id, Amount::new(999))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INCORRECT_AMOUNT");

        // Failed confirm left everything untouched
        let agreement = engine.agreement(id).await.unwrap();
        assert_eq!(agreement.status, AgreementStatus::Created);
        assert!(agreement.held.is_zero());
        assert_eq!(
            engine.treasury().native_balance(&buyer).await,
            Amount::new(10_000)
        );
    }

    #[tokio::test]
    async fn confirm_twice_fails_with_invalid_state() {
        let engine = EscrowEngine::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let agent = PartyId::new();
        engine
            .treasury()
            .deposit_native(&buyer, Amount::new(10_000))
            .await
            .unwrap();
        let id = engine
            .create_agreement(&seller, native_terms(&buyer, &agent, 1_000))
            .await
            .unwrap();

        engine
            .confirm_agreement(&buyer, id, Amount::new(1_000))
            .await
            .unwrap();
        let err = engine
            .confirm_agreement(&buyer, id, Amount::new(1_000))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SaleguardError::InvalidState {
                agreement_id: id,
                status: AgreementStatus::Confirmed,
            }
        );
    }

    #[tokio::test]
    async fn release_before_delivery_is_rejected() {
        let engine = EscrowEngine::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let agent = PartyId::new();
        engine
            .treasury()
            .deposit_native(&buyer, Amount::new(1_000))
            .await
            .unwrap();
        let id = engine
            .create_agreement(&seller, native_terms(&buyer, &agent, 1_000))
            .await
            .unwrap();
        engine
            .confirm_agreement(&buyer, id, Amount::new(1_000))
            .await
            .unwrap();

        let err = engine.release_escrow(&agent, id).await.unwrap_err();
        assert_eq!(
            err,
            SaleguardError::DeliveryNotConfirmed {
                agreement_id: id,
                status: AgreementStatus::Confirmed,
            }
        );

        // Custody and status unchanged
        let agreement = engine.agreement(id).await.unwrap();
        assert_eq!(agreement.status, AgreementStatus::Confirmed);
        assert_eq!(agreement.held, Amount::new(1_000));
    }

    #[tokio::test]
    async fn release_requires_the_escrow_agent() {
        let engine = EscrowEngine::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let agent = PartyId::new();
        engine
            .treasury()
            .deposit_native(&buyer, Amount::new(1_000))
            .await
            .unwrap();
        let id = engine
            .create_agreement(&seller, native_terms(&buyer, &agent, 1_000))
            .await
            .unwrap();
        engine
            .confirm_agreement(&buyer, id, Amount::new(1_000))
            .await
            .unwrap();
        engine.mark_as_delivered(&buyer, id).await.unwrap();

        let err = engine.release_escrow(&buyer, id).await.unwrap_err();
        assert_eq!(
            err,
            SaleguardError::Unauthorized {
                required: Role::EscrowAgent
            }
        );
    }

    #[tokio::test]
    async fn unknown_agreement_fails_every_operation() {
        let engine = EscrowEngine::new();
        let party = PartyId::new();
        let id = AgreementId(9);

        assert_eq!(
            engine
                .confirm_agreement(&party, id, Amount::zero())
                .await
                .unwrap_err()
                .error_code(),
            "UNKNOWN_AGREEMENT"
        );
        assert_eq!(
            engine
                .mark_as_delivered(&party, id)
                .await
                .unwrap_err()
                .error_code(),
            "UNKNOWN_AGREEMENT"
        );
        assert_eq!(
            engine
                .release_escrow(&party, id)
                .await
                .unwrap_err()
                .error_code(),
            "UNKNOWN_AGREEMENT"
        );
    }

    #[tokio::test]
    async fn token_confirm_pulls_allowance_into_custody() {
        let engine = EscrowEngine::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let agent = PartyId::new();
        let token = TokenId::new();
        let method = PaymentMethod::Token(token.clone());

        let mut terms = native_terms(&buyer, &agent, 1);
        terms.payment = method.clone();

        engine
            .treasury()
            .mint_token(&token, &buyer, Amount::new(10))
            .await
            .unwrap();
        engine.treasury().approve(&buyer, &token, Amount::new(1)).await;

        let id = engine.create_agreement(&seller, terms).await.unwrap();
        engine
            .confirm_agreement(&buyer, id, Amount::zero())
            .await
            .unwrap();

        assert_eq!(engine.treasury().custody_balance(&method).await, Amount::new(1));
        assert!(engine.treasury().allowance(&token, &buyer).await.is_zero());
        assert_eq!(
            engine.events_for(id).await.last().unwrap(),
            &AgreementEvent::Confirmed { id }
        );
    }
}
