use accrual_engine::accrual::calculator::daily_interest_micros;
use accrual_engine::accrual::carry::{settle, CarryLedger};
use accrual_engine::accrual::resolver::resolve;
use accrual_engine::accrual::slicer::slice;
use accrual_engine::config::EngineConfig;
use accrual_engine::core::account::{Account, AccountId, EntityId};
use accrual_engine::core::money::{Micros, MinorUnits, MICROS_PER_MINOR};
use accrual_engine::core::tier::{Tier, TierSet};
use accrual_engine::runner::engine::{AccrualRunner, RunStatus};
use accrual_engine::runner::memory::MemoryStore;
use accrual_engine::runner::ports::AccrualLedger;
use accrual_engine::ticker::projector::{project, TickerBase};
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Generate a valid tier schedule: contiguous widths from zero, optionally
/// capped by a bounded top tier.
fn arb_tiers() -> impl Strategy<Value = Vec<Tier>> {
    (
        prop::collection::vec((1u64..200_000u64, 0u32..2_000u32), 0..5),
        any::<bool>(),
        0u32..2_000u32,
    )
        .prop_map(|(bands, open_top, top_rate)| {
            let mut lower = 0u64;
            let mut tiers: Vec<Tier> = bands
                .into_iter()
                .map(|(width, rate)| {
                    let tier = Tier::bounded(lower, lower + width, rate);
                    lower += width;
                    tier
                })
                .collect();
            if open_top {
                tiers.push(Tier::unbounded(lower, top_rate));
            }
            tiers
        })
}

fn arb_balance() -> impl Strategy<Value = MinorUnits> {
    (0u64..5_000_000_000u64).prop_map(MinorUnits::new)
}

proptest! {
    // ===================================================================
    // INVARIANT 1: Conservation across any sequence of settlements.
    //
    // posted * 1_000_000 + final_carry == sum(daily) + initial_carry
    // ===================================================================
    #[test]
    fn carry_conserves_value(
        initial in 0u128..1_000_000u128,
        days in prop::collection::vec(0u128..50_000_000u128, 1..400),
    ) {
        let mut ledger = CarryLedger::new(Micros::new(initial)).unwrap();
        let mut posted = 0u128;
        for &d in &days {
            posted += ledger.settle_day(Micros::new(d)).unwrap().posted.get() as u128;
        }
        let accrued: u128 = days.iter().sum();
        prop_assert_eq!(posted * MICROS_PER_MINOR + ledger.carry().get(), accrued + initial);
        prop_assert!(ledger.is_conserved());
    }

    // ===================================================================
    // INVARIANT 2: Carry stays in [0, 1_000_000) after every settlement.
    // ===================================================================
    #[test]
    fn carry_stays_in_bounds(daily in 0u128..u64::MAX as u128, carry in 0u128..1_000_000u128) {
        let s = settle(Micros::new(daily), Micros::new(carry)).unwrap();
        prop_assert!(s.carry_out.get() < MICROS_PER_MINOR);
        prop_assert_eq!(
            s.posted.get() as u128 * MICROS_PER_MINOR + s.carry_out.get(),
            daily + carry
        );
    }

    // ===================================================================
    // INVARIANT 3: Slices sum to the covered part of the balance.
    // ===================================================================
    #[test]
    fn slices_sum_to_covered_balance(tiers in arb_tiers(), balance in arb_balance()) {
        let total: u128 = slice(balance, &tiers).iter().map(|s| s.amount.get() as u128).sum();
        let ceiling = match tiers.last() {
            None => 0,
            Some(top) => top.upper_bound.map(|u| u.get()).unwrap_or(u64::MAX),
        };
        prop_assert_eq!(total, balance.get().min(ceiling) as u128);
        for s in slice(balance, &tiers) {
            prop_assert!(s.amount > MinorUnits::ZERO);
        }
    }

    // ===================================================================
    // INVARIANT 4: Daily interest is non-negative, zero on zero balance,
    // and never decreases as the balance grows.
    // ===================================================================
    #[test]
    fn daily_interest_is_monotonic(tiers in arb_tiers(), a in arb_balance(), b in arb_balance()) {
        prop_assert_eq!(daily_interest_micros(MinorUnits::ZERO, &tiers), Micros::ZERO);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(daily_interest_micros(lo, &tiers) <= daily_interest_micros(hi, &tiers));
        prop_assert_eq!(daily_interest_micros(a, &tiers), daily_interest_micros(a, &tiers));
    }

    // ===================================================================
    // INVARIANT 5: The resolver never picks a set dated after the query.
    // ===================================================================
    #[test]
    fn resolver_ignores_future_sets(
        offsets in prop::collection::btree_set(0u64..365, 1..8),
        query in 0u64..400,
    ) {
        let sets: Vec<TierSet> = offsets
            .iter()
            .map(|&o| {
                let tiers = vec![Tier::unbounded(0, o as u32)];
                TierSet::new(EntityId::new("F"), epoch() + Days::new(o), tiers).unwrap()
            })
            .collect();
        let day = epoch() + Days::new(query);
        let expected = offsets.iter().filter(|&&o| o <= query).max().copied();
        let resolved = resolve(&sets, day)
            .map(|set| (set.effective_from() - epoch()).num_days() as u64);
        prop_assert_eq!(resolved, expected);
    }

    // ===================================================================
    // INVARIANT 6: A second run over the same range posts nothing, and the
    // postings conserve against the recomputed daily accruals.
    // ===================================================================
    #[test]
    fn runner_is_idempotent_and_conserving(
        tiers in arb_tiers(),
        balance in 0u64..50_000_000u64,
        days in 1u64..90,
    ) {
        let store = MemoryStore::new();
        let entity = EntityId::new("F");
        store
            .upsert_tier_set(TierSet::new(entity.clone(), epoch(), tiers.clone()).unwrap())
            .unwrap();
        let id = AccountId::new("A");
        store
            .open_account(Account::new(id.clone(), entity, MinorUnits::new(balance), epoch()))
            .unwrap();

        let today = epoch() + Days::new(days + 1);
        let config = EngineConfig {
            parallel: false,
            ..Default::default()
        };
        let runner = AccrualRunner::new(&store, &store, config);
        let first = runner.run_account(&id, today).unwrap();
        prop_assert_eq!(first.status, RunStatus::CaughtUp);
        prop_assert_eq!(first.days_committed as u64, days);

        let records = store.records(&id).unwrap();
        let mut principal = MinorUnits::new(balance);
        let mut accrued = 0u128;
        for r in &records {
            accrued += daily_interest_micros(principal, &tiers).get();
            principal = principal + r.interest_posted;
        }
        let carry = store.account(&id).unwrap().residual_carry.get();
        let posted = (principal.get() - balance) as u128;
        prop_assert_eq!(posted * MICROS_PER_MINOR + carry, accrued);

        let second = runner.run_account(&id, today).unwrap();
        prop_assert_eq!(second.status, RunStatus::UpToDate);
        prop_assert_eq!(store.records(&id).unwrap(), records);
    }

    // ===================================================================
    // INVARIANT 7: The ticker never shows less than its base and never
    // moves backwards in time.
    // ===================================================================
    #[test]
    fn ticker_is_monotonic_in_time(
        tiers in arb_tiers(),
        balance in arb_balance(),
        t1 in 0i64..86_400_000i64,
        t2 in 0i64..86_400_000i64,
    ) {
        let base = TickerBase {
            base_balance: balance,
            base_timestamp_ms: 0,
            tiers,
        };
        let (early, late) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        prop_assert!(project(early, &base) <= project(late, &base));
        prop_assert!(project(early, &base).micros() >= Micros::from_minor(balance));
    }
}
