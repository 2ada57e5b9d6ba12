//! Synthetic portfolios for demos, load tests and benchmarks.

use crate::core::account::{Account, AccountId, EntityId};
use crate::core::money::MinorUnits;
use crate::core::tier::{Tier, TierSet};
use crate::runner::memory::Snapshot;
use chrono::{Days, NaiveDate};
use rand::Rng;

/// Configuration for generating a random portfolio.
#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    /// Number of accounts.
    pub accounts: usize,
    /// Number of owning entities the accounts are spread over.
    pub entities: usize,
    /// Upper bound on each opening balance, in minor units.
    pub max_balance: u64,
    /// Tiers per generated schedule.
    pub tiers_per_set: usize,
    /// Highest annual rate a tier may carry.
    pub max_rate_bps: u32,
    /// Every account's checkpoint; schedules start before it.
    pub as_of: NaiveDate,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            accounts: 100,
            entities: 10,
            max_balance: 10_000_000,
            tiers_per_set: 3,
            max_rate_bps: 500,
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

/// Generate a random portfolio using the thread RNG.
pub fn generate_portfolio(config: &PortfolioConfig) -> Snapshot {
    generate_portfolio_with(config, &mut rand::thread_rng())
}

/// Generate a random portfolio from a caller-supplied RNG.
///
/// Each entity gets one schedule effective 30 days before `as_of` and a
/// second one dated 30 days after it, so catch-up runs cross a rate change.
pub fn generate_portfolio_with<R: Rng>(config: &PortfolioConfig, rng: &mut R) -> Snapshot {
    let entities: Vec<EntityId> = (0..config.entities.max(1))
        .map(|i| EntityId::new(format!("ENTITY-{:03}", i)))
        .collect();

    let mut tier_sets = Vec::new();
    for entity in &entities {
        for effective_from in [
            config.as_of.checked_sub_days(Days::new(30)),
            config.as_of.checked_add_days(Days::new(30)),
        ]
        .into_iter()
        .flatten()
        {
            let tiers = random_tiers(config, rng);
            if let Ok(set) = TierSet::new(entity.clone(), effective_from, tiers) {
                tier_sets.push(set);
            }
        }
    }

    let accounts = (0..config.accounts)
        .map(|i| {
            let entity = entities[rng.gen_range(0..entities.len())].clone();
            let balance = rng.gen_range(0..=config.max_balance);
            Account::new(
                AccountId::new(format!("ACC-{:05}", i)),
                entity,
                MinorUnits::new(balance),
                config.as_of,
            )
        })
        .collect();

    Snapshot {
        accounts,
        tier_sets,
        records: Vec::new(),
        transactions: Vec::new(),
    }
}

/// Contiguous tiers from zero with increasing bounds; the last is open-ended.
fn random_tiers<R: Rng>(config: &PortfolioConfig, rng: &mut R) -> Vec<Tier> {
    let count = config.tiers_per_set.max(1);
    let step_max = (config.max_balance / count as u64).max(2);
    let mut lower = 0u64;
    let mut tiers = Vec::with_capacity(count);

    for i in 0..count {
        let rate = rng.gen_range(0..=config.max_rate_bps);
        if i + 1 == count {
            tiers.push(Tier::unbounded(lower, rate));
        } else {
            let upper = lower + rng.gen_range(1..step_max);
            tiers.push(Tier::bounded(lower, upper, rate));
            lower = upper;
        }
    }
    tiers
}
