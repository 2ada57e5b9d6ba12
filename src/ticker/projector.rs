use crate::accrual::slicer::slice;
use crate::core::money::{
    Micros, MinorUnits, BPS_DENOMINATOR, DAYS_PER_YEAR, MICROS_PER_MINOR, SECONDS_PER_DAY,
};
use crate::core::tier::Tier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Last authoritative state a display extrapolates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerBase {
    pub base_balance: MinorUnits,
    /// Milliseconds since the Unix epoch.
    pub base_timestamp_ms: i64,
    pub tiers: Vec<Tier>,
}

/// An extrapolated balance with micro-unit resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectedBalance(Micros);

impl ProjectedBalance {
    pub fn micros(self) -> Micros {
        self.0
    }

    /// Whole minor units, truncated.
    pub fn whole_minor(self) -> MinorUnits {
        MinorUnits::new(u64::try_from(self.0.get() / MICROS_PER_MINOR).unwrap_or(u64::MAX))
    }

    pub fn to_decimal(self) -> Decimal {
        self.0.to_decimal()
    }
}

impl fmt::Display for ProjectedBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// Extrapolate `base` linearly to `now_ms`.
///
/// Elapsed time is counted in whole seconds and never negative. The
/// per-second rate is the tiered annual rate on `base_balance` spread over
/// 365 * 86 400 seconds, without compounding inside the interval. The
/// result is for display only and drifts from authoritative postings until
/// the base is re-anchored.
///
/// # Examples
///
/// ```
/// use accrual_engine::core::money::MinorUnits;
/// use accrual_engine::core::tier::Tier;
/// use accrual_engine::ticker::projector::{project, TickerBase};
///
/// let base = TickerBase {
///     base_balance: MinorUnits::new(10_000),
///     base_timestamp_ms: 0,
///     tiers: vec![Tier::unbounded(0, 365)],
/// };
/// assert!(project(1_000, &base).micros().get() > 10_000_000_000);
/// assert_eq!(project(-5_000, &base).whole_minor().get(), 10_000);
/// ```
pub fn project(now_ms: i64, base: &TickerBase) -> ProjectedBalance {
    let elapsed_ms = (now_ms as i128 - base.base_timestamp_ms as i128).max(0);
    let elapsed_secs = (elapsed_ms / 1_000) as u128;

    let per_second_numerator: u128 = slice(base.base_balance, &base.tiers)
        .iter()
        .map(|s| s.amount.get() as u128 * s.rate_bps as u128 * MICROS_PER_MINOR)
        .sum();
    let denominator = BPS_DENOMINATOR * DAYS_PER_YEAR * SECONDS_PER_DAY;

    // Split to keep `numerator * elapsed` from overflowing for long gaps.
    let whole = (per_second_numerator / denominator).saturating_mul(elapsed_secs);
    let part = (per_second_numerator % denominator).saturating_mul(elapsed_secs) / denominator;
    let accrued = whole.saturating_add(part);

    ProjectedBalance(Micros::new(
        Micros::from_minor(base.base_balance).get().saturating_add(accrued),
    ))
}
