use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Micro-units in one minor unit.
pub const MICROS_PER_MINOR: u128 = 1_000_000;

/// Basis points in 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Actual/365: every calendar day accrues 1/365 of the annual rate.
pub const DAYS_PER_YEAR: u128 = 365;

pub const SECONDS_PER_DAY: u128 = 86_400;

/// An amount in the smallest standard denomination of the currency (e.g. cents).
///
/// Balances are never negative inside the engine, so the representation is
/// unsigned.
///
/// # Examples
///
/// ```
/// use accrual_engine::core::money::MinorUnits;
///
/// let a = MinorUnits::new(10_000);
/// let b = MinorUnits::new(250);
/// assert_eq!((a + b).get(), 10_250);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MinorUnits(u64);

impl MinorUnits {
    pub const ZERO: MinorUnits = MinorUnits(0);
    pub const MAX: MinorUnits = MinorUnits(u64::MAX);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: MinorUnits) -> Option<MinorUnits> {
        self.0.checked_add(other.0).map(MinorUnits)
    }

    pub fn checked_sub(self, other: MinorUnits) -> Option<MinorUnits> {
        self.0.checked_sub(other.0).map(MinorUnits)
    }
}

impl Add for MinorUnits {
    type Output = MinorUnits;

    fn add(self, rhs: MinorUnits) -> MinorUnits {
        MinorUnits(self.0 + rhs.0)
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = MinorUnits>>(iter: I) -> Self {
        iter.fold(MinorUnits::ZERO, |acc, v| acc + v)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One-millionth of a minor unit: the precision floor for accrual.
///
/// Stored as `u128` so that intermediate sums over long catch-up runs
/// never need to wrap.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Micros(u128);

impl Micros {
    pub const ZERO: Micros = Micros(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub fn from_minor(minor: MinorUnits) -> Self {
        Self(minor.0 as u128 * MICROS_PER_MINOR)
    }

    pub fn checked_add(self, other: Micros) -> Option<Micros> {
        self.0.checked_add(other.0).map(Micros)
    }

    /// Split into whole minor units and the sub-unit remainder.
    ///
    /// Returns `None` when the whole part does not fit a `MinorUnits`.
    pub fn split_minor(self) -> Option<(MinorUnits, Micros)> {
        let whole = u64::try_from(self.0 / MICROS_PER_MINOR).ok()?;
        Some((MinorUnits(whole), Micros(self.0 % MICROS_PER_MINOR)))
    }

    /// Value as a decimal number of minor units (six fractional digits).
    pub fn to_decimal(self) -> Decimal {
        // Falls back to the integer part for values beyond Decimal's 96-bit mantissa.
        i128::try_from(self.0)
            .ok()
            .and_then(|v| Decimal::try_from_i128_with_scale(v, 6).ok())
            .unwrap_or_else(|| Decimal::from((self.0 / MICROS_PER_MINOR) as u64))
    }
}

impl Add for Micros {
    type Output = Micros;

    fn add(self, rhs: Micros) -> Micros {
        Micros(self.0 + rhs.0)
    }
}

impl Sum for Micros {
    fn sum<I: Iterator<Item = Micros>>(iter: I) -> Self {
        iter.fold(Micros::ZERO, |acc, v| acc + v)
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}µ", self.0)
    }
}
