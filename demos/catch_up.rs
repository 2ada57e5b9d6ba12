//! Catch-up and live ticker example.
//!
//! Settles a month of missed days for a small book on a two-tier
//! schedule, first under a per-run day cap and then in full, and finally
//! renders a live balance the way a display would.

use accrual_engine::config::EngineConfig;
use accrual_engine::core::account::{Account, AccountId, EntityId};
use accrual_engine::core::money::MinorUnits;
use accrual_engine::core::tier::{Tier, TierSet};
use accrual_engine::runner::engine::AccrualRunner;
use accrual_engine::runner::memory::MemoryStore;
use accrual_engine::runner::ports::AccrualLedger;
use accrual_engine::ticker::session::TickerSession;
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  accrual-engine: Catch-up Example        ║");
    println!("╚══════════════════════════════════════════╝\n");

    let store = MemoryStore::new();
    let family = EntityId::new("FAMILY-1");

    // 2% on the first 10,000.00, 3% above it; 4% above it from mid-month
    let opening = TierSet::new(
        family.clone(),
        date(2024, 1, 1),
        vec![
            Tier::bounded(0, 1_000_000, 200),
            Tier::unbounded(1_000_000, 300),
        ],
    )
    .expect("valid tiers");
    let raised = TierSet::new(
        family.clone(),
        date(2024, 1, 15),
        vec![
            Tier::bounded(0, 1_000_000, 200),
            Tier::unbounded(1_000_000, 400),
        ],
    )
    .expect("valid tiers");
    store.upsert_tier_set(opening).expect("store");
    store.upsert_tier_set(raised).expect("store");

    for (id, balance) in [
        ("ACC-1", 500_000),
        ("ACC-2", 1_500_000),
        ("ACC-3", 25_000_000),
    ] {
        store
            .open_account(Account::new(
                AccountId::new(id),
                family.clone(),
                MinorUnits::new(balance),
                date(2024, 1, 1),
            ))
            .expect("store");
    }
    let ids = store.account_ids().expect("store");
    let today = date(2024, 2, 1);

    // --- Scenario 1: capped catch-up ---
    println!("━━━ Scenario 1: Catch-up capped at 7 days ━━━\n");
    let capped = EngineConfig {
        max_catch_up_days: Some(7),
        ..Default::default()
    };
    let summary = AccrualRunner::new(&store, &store, capped).run_all(&ids, today);
    println!("{}", summary);

    // --- Scenario 2: finish the month ---
    println!("━━━ Scenario 2: Catch-up through yesterday ━━━\n");
    let config = EngineConfig::default();
    let summary = AccrualRunner::new(&store, &store, config.clone()).run_all(&ids, today);
    println!("{}", summary);

    let rerun = AccrualRunner::new(&store, &store, config.clone()).run_all(&ids, today);
    println!("Re-run posted {} (nothing left to settle)\n", rerun.total_posted());

    // --- Scenario 3: live ticker ---
    println!("━━━ Scenario 3: Live ticker for ACC-3 ━━━\n");
    let id = AccountId::new("ACC-3");
    let stored = store.account(&id).expect("store");
    println!("Authoritative balance {} as of {}", stored.balance, stored.as_of);

    // Midday on `today`, half a day past the last settled close
    let noon_ms = today
        .and_hms_opt(12, 0, 0)
        .expect("valid time")
        .and_utc()
        .timestamp_millis();
    let mut session = TickerSession::from_config(id, &config);
    for secs in [0, 15, 30, 45, 60, 75, 90] {
        let shown = session
            .tick(&store, noon_ms + secs * 1_000)
            .expect("account has authoritative data");
        println!("  12:{:02}:{:02}  {}", secs / 60, secs % 60, shown);
    }
}
