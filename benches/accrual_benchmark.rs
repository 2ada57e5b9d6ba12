use accrual_engine::accrual::calculator::daily_interest_micros;
use accrual_engine::config::EngineConfig;
use accrual_engine::core::money::MinorUnits;
use accrual_engine::core::tier::Tier;
use accrual_engine::runner::engine::AccrualRunner;
use accrual_engine::runner::memory::MemoryStore;
use accrual_engine::simulation::portfolio::{generate_portfolio_with, PortfolioConfig};
use chrono::Days;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_daily_interest(c: &mut Criterion) {
    let tiers = [
        Tier::bounded(0, 100_000, 150),
        Tier::bounded(100_000, 1_000_000, 250),
        Tier::unbounded(1_000_000, 400),
    ];
    c.bench_function("daily_interest_three_tiers", |b| {
        b.iter(|| daily_interest_micros(black_box(MinorUnits::new(7_654_321)), black_box(&tiers)))
    });
}

fn bench_catch_up(c: &mut Criterion, name: &str, accounts: usize, days: u64, parallel: bool) {
    let config = PortfolioConfig {
        accounts,
        entities: 10,
        ..Default::default()
    };
    let snapshot = generate_portfolio_with(&config, &mut StdRng::seed_from_u64(42));
    let today = config.as_of + Days::new(days + 1);

    c.bench_function(name, |b| {
        b.iter_batched(
            || MemoryStore::from_snapshot(snapshot.clone()).unwrap(),
            |store| {
                let ids = store.account_ids().unwrap();
                let runner = AccrualRunner::new(
                    &store,
                    &store,
                    EngineConfig {
                        parallel,
                        ..Default::default()
                    },
                );
                black_box(runner.run_all(&ids, today));
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_catch_up_100_accounts_30_days(c: &mut Criterion) {
    bench_catch_up(c, "catch_up_100_accounts_30_days", 100, 30, false);
}

fn bench_catch_up_1000_accounts_90_days_parallel(c: &mut Criterion) {
    bench_catch_up(c, "catch_up_1000_accounts_90_days_parallel", 1_000, 90, true);
}

criterion_group!(
    benches,
    bench_daily_interest,
    bench_catch_up_100_accounts_30_days,
    bench_catch_up_1000_accounts_90_days_parallel
);
criterion_main!(benches);
