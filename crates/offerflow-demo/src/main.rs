//! OfferFlow demo - runs the whole offer lifecycle against in-memory stores
//!
//! Creates an offer, tracks joins for three users (including duplicates and
//! an under-threshold user), injects a wallet failure for one of them, then
//! runs a settlement pass and the repair sweep, printing each step.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use offerflow_progress::{ProgressStore, ProgressTracker};
use offerflow_registry::{OfferRegistry, OfferStore};
use offerflow_reconcile::StatusRepair;
use offerflow_settlement::{SettlementEngine, SettlementOutcome};
use offerflow_types::{ContestId, MatchId, MatchOfferDraft, UserId};
use offerflow_wallet::{InMemoryWallet, WalletLedger};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let offers = Arc::new(OfferStore::new());
    let progress = Arc::new(ProgressStore::new());
    let wallet = Arc::new(InMemoryWallet::new());

    let registry = OfferRegistry::new(Arc::clone(&offers));
    let tracker = ProgressTracker::new(Arc::clone(&offers), Arc::clone(&progress));
    let engine = SettlementEngine::new(
        Arc::clone(&offers),
        Arc::clone(&progress),
        wallet.clone() as Arc<dyn WalletLedger>,
    );

    let match_id = MatchId::new("M1");
    registry
        .create_match_offer(MatchOfferDraft {
            match_id: match_id.clone(),
            match_name: "IND vs AUS".to_string(),
            offer_name: "Join 3 Win Big".to_string(),
            offer_type: 1,
            required_contests: 3,
            conversion_percentage: 10.0,
        })
        .await?;

    for (user, balance) in [("U1", 500.0), ("U2", 200.0), ("U3", 800.0)] {
        wallet.set_balance(UserId::new(user), balance).await;
    }

    // U1 completes (duplicate join included), U2 completes, U3 falls short.
    for contest in ["C1", "C2", "C2", "C3"] {
        tracker
            .record_contest_join(UserId::new("U1"), match_id.clone(), ContestId::new(contest))
            .await?;
    }
    for contest in ["C1", "C4", "C5"] {
        tracker
            .record_contest_join(UserId::new("U2"), match_id.clone(), ContestId::new(contest))
            .await?;
    }
    tracker
        .record_contest_join(UserId::new("U3"), match_id.clone(), ContestId::new("C1"))
        .await?;

    // U2's wallet is down during the pass; the row stays COMPLETED.
    wallet.fail_user(UserId::new("U2")).await;

    match engine.settle_match(&match_id).await? {
        SettlementOutcome::Settled(report) => info!(
            processed = report.processed,
            failed = report.failed,
            "settlement report"
        ),
        other => info!(?other, "settlement outcome"),
    }

    for ack in wallet.conversions().await {
        info!(user = %ack.user_id, amount = ack.amount, "converted");
    }

    let repair = StatusRepair::new(Arc::clone(&offers), Arc::clone(&progress));
    let fixed = repair.repair_statuses().await?;
    info!(fixed, "repair sweep finished");

    // A second trigger is a guarded no-op.
    let again = engine.settle_match(&match_id).await?;
    info!(?again, "re-trigger outcome");

    Ok(())
}
