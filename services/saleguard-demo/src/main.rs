//! Saleguard Demo - The full sale-with-escrow interaction, end to end
//!
//! Seeds a seller, a buyer, and an escrow agent, funds the buyer, then
//! drives one agreement through its whole lifecycle:
//!
//! 1. Seller creates the agreement
//! 2. Buyer confirms it, paying the price into custody
//! 3. Buyer marks the item as delivered
//! 4. Escrow agent releases custody to the seller
//!
//! ```bash
//! # Defaults: price 1_000_000 units
//! saleguard-demo
//!
//! # Custom price
//! saleguard-demo --price 250
//! ```

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Parser;
use saleguard_escrow::EscrowEngine;
use saleguard_types::{
    AgreementTerms, Amount, DisputeResolution, PartyId, PaymentMethod,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Saleguard Demo - sale-with-escrow walkthrough
#[derive(Parser, Debug)]
#[command(
    name = "saleguard-demo",
    about = "Drive one sale-with-escrow agreement through its full lifecycle",
    version
)]
struct Args {
    /// Price of the item in smallest native units
    #[arg(long, default_value = "1000000", env = "SALEGUARD_DEMO_PRICE")]
    price: u128,

    /// Days until the expected delivery date
    #[arg(long, default_value = "7", env = "SALEGUARD_DEMO_DELIVERY_DAYS")]
    delivery_days: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let price = Amount::new(args.price);

    let engine = EscrowEngine::new();
    let seller = PartyId::new();
    let buyer = PartyId::new();
    let escrow_agent = PartyId::new();

    info!("using parties:");
    info!("  seller:       {}", seller);
    info!("  buyer:        {}", buyer);
    info!("  escrow agent: {}", escrow_agent);

    // Fund the buyer so the confirmation can attach the price
    engine.treasury().deposit_native(&buyer, price).await?;

    // Step 1: seller creates the agreement
    let id = engine
        .create_agreement(
            &seller,
            AgreementTerms {
                item_name: "Laptop".to_string(),
                description: "MacBook Pro M1".to_string(),
                price,
                buyer: buyer.clone(),
                payment: PaymentMethod::Native,
                delivery_date: Utc::now() + Duration::days(args.delivery_days),
                use_escrow: true,
                escrow_agent: escrow_agent.clone(),
                is_refundable: true,
                dispute_resolution: DisputeResolution::Court,
            },
        )
        .await?;
    info!("step 1: agreement {} created", id);

    // Step 2: buyer confirms and pays into custody
    engine.confirm_agreement(&buyer, id, price).await?;
    info!(
        "step 2: agreement confirmed, custody holds {}",
        engine.treasury().custody_balance(&PaymentMethod::Native).await
    );

    // Step 3: buyer marks the item as delivered
    engine.mark_as_delivered(&buyer, id).await?;
    info!("step 3: item marked as delivered");

    // Step 4: escrow agent releases custody to the seller
    engine.release_escrow(&escrow_agent, id).await?;
    info!(
        "step 4: escrow released, seller balance {}",
        engine.treasury().native_balance(&seller).await
    );

    let agreement = engine.agreement(id).await?;
    info!("final state: {} (held {})", agreement.status, agreement.held);

    let events = engine.events_for(id).await;
    println!("{}", serde_json::to_string_pretty(&events)?);

    Ok(())
}
