//! Saleguard Treasury - Uniform value movement over two payment paths
//!
//! The treasury hides the native-currency path and the fungible-token path
//! behind one `collect`/`payout` surface. Funds pulled from a payer land in
//! the pooled custody balance; funds paid out leave custody along the same
//! path they arrived on. All checks precede any mutation, so a failed
//! transfer has no effect.
//!
//! # Invariants
//!
//! 1. No negative balances — debits are checked before they apply
//! 2. A token pull consumes exactly the amount from both the payer's
//!    balance and their allowance to the custodian
//! 3. Custody only changes through `collect` and `payout`

use std::collections::HashMap;
use std::sync::Arc;

use saleguard_types::{
    Amount, PartyId, PaymentMethod, Result, SaleguardError, TokenId, TransferFailure,
};
use tokio::sync::RwLock;
use tracing::info;

struct TreasuryInner {
    /// Native-currency balance per party
    native: HashMap<PartyId, Amount>,
    /// Token balance per (token, holder)
    tokens: HashMap<(TokenId, PartyId), Amount>,
    /// Allowance each owner has granted the custodian, per token
    allowances: HashMap<(TokenId, PartyId), Amount>,
    /// Pooled native custody
    custody_native: Amount,
    /// Pooled token custody per token
    custody_tokens: HashMap<TokenId, Amount>,
}

impl TreasuryInner {
    fn native_balance(&self, party: &PartyId) -> Amount {
        self.native.get(party).copied().unwrap_or_default()
    }

    fn token_balance(&self, token: &TokenId, party: &PartyId) -> Amount {
        self.tokens
            .get(&(token.clone(), party.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, token: &TokenId, owner: &PartyId) -> Amount {
        self.allowances
            .get(&(token.clone(), owner.clone()))
            .copied()
            .unwrap_or_default()
    }
}

/// Moves value between parties and the pooled custody
#[derive(Clone)]
pub struct Treasury {
    inner: Arc<RwLock<TreasuryInner>>,
}

impl Treasury {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(TreasuryInner {
                native: HashMap::new(),
                tokens: HashMap::new(),
                allowances: HashMap::new(),
                custody_native: Amount::zero(),
                custody_tokens: HashMap::new(),
            })),
        }
    }

    /// Credit a party's native balance (out-of-core funding primitive)
    pub async fn deposit_native(&self, party: &PartyId, amount: Amount) -> Result<()> {
        let mut inner = self.inner.write().await;
        let balance = inner.native_balance(party).checked_add(amount)?;
        inner.native.insert(party.clone(), balance);
        Ok(())
    }

    /// Credit a party's token balance (out-of-core funding primitive)
    pub async fn mint_token(
        &self,
        token: &TokenId,
        party: &PartyId,
        amount: Amount,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let balance = inner.token_balance(token, party).checked_add(amount)?;
        inner.tokens.insert((token.clone(), party.clone()), balance);
        Ok(())
    }

    /// Set the allowance `owner` grants the custodian for `token`
    pub async fn approve(&self, owner: &PartyId, token: &TokenId, amount: Amount) {
        let mut inner = self.inner.write().await;
        inner
            .allowances
            .insert((token.clone(), owner.clone()), amount);
        info!("allowance set: {} approved {} of {}", owner, amount, token);
    }

    /// A party's native balance
    pub async fn native_balance(&self, party: &PartyId) -> Amount {
        self.inner.read().await.native_balance(party)
    }

    /// A party's balance of `token`
    pub async fn token_balance(&self, token: &TokenId, party: &PartyId) -> Amount {
        self.inner.read().await.token_balance(token, party)
    }

    /// The allowance `owner` currently grants the custodian for `token`
    pub async fn allowance(&self, token: &TokenId, owner: &PartyId) -> Amount {
        self.inner.read().await.allowance(token, owner)
    }

    /// The pooled custody balance for a payment method
    pub async fn custody_balance(&self, method: &PaymentMethod) -> Amount {
        let inner = self.inner.read().await;
        match method {
            PaymentMethod::Native => inner.custody_native,
            PaymentMethod::Token(token) => {
                inner.custody_tokens.get(token).copied().unwrap_or_default()
            }
        }
    }

    /// Pull `price` from `payer` into custody along the path `method` selects
    ///
    /// `attached` is the native value supplied with the request. The native
    /// path requires `attached == price` exactly; the token path requires
    /// `attached` to be zero and consumes the payer's pre-authorized
    /// allowance. No balance changes unless every check passes.
    pub async fn collect(
        &self,
        payer: &PartyId,
        method: &PaymentMethod,
        price: Amount,
        attached: Amount,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        match method {
            PaymentMethod::Native => {
                if attached != price {
                    return Err(SaleguardError::IncorrectAmount {
                        expected: price,
                        attached,
                    });
                }
                let available = inner.native_balance(payer);
                if available < price {
                    return Err(SaleguardError::TransferFailed {
                        failure: TransferFailure::InsufficientBalance {
                            available,
                            required: price,
                        },
                    });
                }
                let custody = inner.custody_native.checked_add(price)?;
                inner
                    .native
                    .insert(payer.clone(), available.checked_sub(price)?);
                inner.custody_native = custody;
                info!("collected {} native from {} into custody", price, payer);
            }
            PaymentMethod::Token(token) => {
                if !attached.is_zero() {
                    return Err(SaleguardError::NativeTransferNotAccepted { attached });
                }
                let approved = inner.allowance(token, payer);
                if approved < price {
                    return Err(SaleguardError::TransferFailed {
                        failure: TransferFailure::InsufficientAllowance {
                            approved,
                            required: price,
                        },
                    });
                }
                let available = inner.token_balance(token, payer);
                if available < price {
                    return Err(SaleguardError::TransferFailed {
                        failure: TransferFailure::InsufficientBalance {
                            available,
                            required: price,
                        },
                    });
                }
                let custody = inner
                    .custody_tokens
                    .get(token)
                    .copied()
                    .unwrap_or_default()
                    .checked_add(price)?;
                inner
                    .allowances
                    .insert((token.clone(), payer.clone()), approved.checked_sub(price)?);
                inner
                    .tokens
                    .insert((token.clone(), payer.clone()), available.checked_sub(price)?);
                inner.custody_tokens.insert(token.clone(), custody);
                info!("collected {} of {} from {} into custody", price, token, payer);
            }
        }
        Ok(())
    }

    /// Push `amount` from custody to `recipient` along the path `method` selects
    pub async fn payout(
        &self,
        recipient: &PartyId,
        method: &PaymentMethod,
        amount: Amount,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        match method {
            PaymentMethod::Native => {
                if inner.custody_native < amount {
                    return Err(SaleguardError::TransferFailed {
                        failure: TransferFailure::InsufficientCustody {
                            available: inner.custody_native,
                            required: amount,
                        },
                    });
                }
                let balance = inner.native_balance(recipient).checked_add(amount)?;
                inner.custody_native = inner.custody_native.checked_sub(amount)?;
                inner.native.insert(recipient.clone(), balance);
                info!("paid out {} native from custody to {}", amount, recipient);
            }
            PaymentMethod::Token(token) => {
                let custody = inner.custody_tokens.get(token).copied().unwrap_or_default();
                if custody < amount {
                    return Err(SaleguardError::TransferFailed {
                        failure: TransferFailure::InsufficientCustody {
                            available: custody,
                            required: amount,
                        },
                    });
                }
                let balance = inner.token_balance(token, recipient).checked_add(amount)?;
                inner
                    .custody_tokens
                    .insert(token.clone(), custody.checked_sub(amount)?);
                inner
                    .tokens
                    .insert((token.clone(), recipient.clone()), balance);
                info!("paid out {} of {} from custody to {}", amount, token, recipient);
            }
        }
        Ok(())
    }
}

impl Default for Treasury {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn native_collect_moves_exact_amount_into_custody() {
        let treasury = Treasury::new();
        let buyer = PartyId::new();
        treasury
            .deposit_native(&buyer, Amount::new(1_000))
            .await
            .unwrap();

        treasury
            .collect(&buyer, &PaymentMethod::Native, Amount::new(400), Amount::new(400))
            .await
            .unwrap();

        assert_eq!(treasury.native_balance(&buyer).await, Amount::new(600));
        assert_eq!(
            treasury.custody_balance(&PaymentMethod::Native).await,
            Amount::new(400)
        );
    }

    #[tokio::test]
    async fn native_collect_rejects_mismatched_attachment() {
        let treasury = Treasury::new();
        let buyer = PartyId::new();
        treasury
            .deposit_native(&buyer, Amount::new(1_000))
            .await
            .unwrap();

        let err = treasury
            .collect(&buyer, &PaymentMethod::Native, Amount::new(400), Amount::new(399))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SaleguardError::IncorrectAmount {
                expected: Amount::new(400),
                attached: Amount::new(399),
            }
        );

        // Zero attachment is just another mismatch
        let err = treasury
            .collect(&buyer, &PaymentMethod::Native, Amount::new(400), Amount::zero())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INCORRECT_AMOUNT");

        // Nothing moved
        assert_eq!(treasury.native_balance(&buyer).await, Amount::new(1_000));
        assert!(treasury
            .custody_balance(&PaymentMethod::Native)
            .await
            .is_zero());
    }

    #[tokio::test]
    async fn native_collect_fails_on_insufficient_balance() {
        let treasury = Treasury::new();
        let buyer = PartyId::new();
        treasury
            .deposit_native(&buyer, Amount::new(100))
            .await
            .unwrap();

        let err = treasury
            .collect(&buyer, &PaymentMethod::Native, Amount::new(400), Amount::new(400))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "TRANSFER_FAILED");
        assert_eq!(treasury.native_balance(&buyer).await, Amount::new(100));
    }

    #[tokio::test]
    async fn token_collect_consumes_allowance_and_balance() {
        let treasury = Treasury::new();
        let buyer = PartyId::new();
        let token = TokenId::new();
        let method = PaymentMethod::Token(token.clone());

        treasury
            .mint_token(&token, &buyer, Amount::new(500))
            .await
            .unwrap();
        treasury.approve(&buyer, &token, Amount::new(300)).await;

        treasury
            .collect(&buyer, &method, Amount::new(300), Amount::zero())
            .await
            .unwrap();

        assert_eq!(treasury.token_balance(&token, &buyer).await, Amount::new(200));
        assert!(treasury.allowance(&token, &buyer).await.is_zero());
        assert_eq!(treasury.custody_balance(&method).await, Amount::new(300));
    }

    #[tokio::test]
    async fn token_collect_rejects_attached_native_value() {
        let treasury = Treasury::new();
        let buyer = PartyId::new();
        let token = TokenId::new();
        let method = PaymentMethod::Token(token.clone());

        treasury
            .mint_token(&token, &buyer, Amount::new(500))
            .await
            .unwrap();
        treasury.approve(&buyer, &token, Amount::new(500)).await;

        let err = treasury
            .collect(&buyer, &method, Amount::new(300), Amount::new(1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SaleguardError::NativeTransferNotAccepted {
                attached: Amount::new(1)
            }
        );
        assert_eq!(treasury.token_balance(&token, &buyer).await, Amount::new(500));
    }

    #[tokio::test]
    async fn token_collect_fails_without_allowance() {
        let treasury = Treasury::new();
        let buyer = PartyId::new();
        let token = TokenId::new();
        let method = PaymentMethod::Token(token.clone());

        treasury
            .mint_token(&token, &buyer, Amount::new(500))
            .await
            .unwrap();

        let err = treasury
            .collect(&buyer, &method, Amount::new(300), Amount::zero())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SaleguardError::TransferFailed {
                failure: TransferFailure::InsufficientAllowance {
                    approved: Amount::zero(),
                    required: Amount::new(300),
                },
            }
        );
    }

    #[tokio::test]
    async fn payout_moves_custody_to_recipient() {
        let treasury = Treasury::new();
        let buyer = PartyId::new();
        let seller = PartyId::new();

        treasury
            .deposit_native(&buyer, Amount::new(1_000))
            .await
            .unwrap();
        treasury
            .collect(&buyer, &PaymentMethod::Native, Amount::new(1_000), Amount::new(1_000))
            .await
            .unwrap();
        treasury
            .payout(&seller, &PaymentMethod::Native, Amount::new(1_000))
            .await
            .unwrap();

        assert_eq!(treasury.native_balance(&seller).await, Amount::new(1_000));
        assert!(treasury
            .custody_balance(&PaymentMethod::Native)
            .await
            .is_zero());
    }

    #[tokio::test]
    async fn payout_fails_when_custody_is_short() {
        let treasury = Treasury::new();
        let seller = PartyId::new();

        let err = treasury
            .payout(&seller, &PaymentMethod::Native, Amount::new(1))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "TRANSFER_FAILED");
        assert!(treasury.native_balance(&seller).await.is_zero());
    }
}
