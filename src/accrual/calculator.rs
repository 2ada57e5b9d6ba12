use crate::accrual::slicer::slice;
use crate::core::money::{Micros, MinorUnits, BPS_DENOMINATOR, DAYS_PER_YEAR, MICROS_PER_MINOR};
use crate::core::tier::Tier;

/// Interest for one calendar day, in micro-units of the minor unit.
///
/// Each slice contributes `amount * rate_bps / 10_000 / 365`, truncated to a
/// whole micro-unit, and the contributions are summed. The day count is
/// Actual/365 with no leap-day adjustment: Feb 29 accrues one ordinary day.
///
/// The function is total and deterministic. Every intermediate fits in
/// `u128` for any `u64` balance and `u32` rate.
///
/// # Examples
///
/// ```
/// use accrual_engine::accrual::calculator::daily_interest_micros;
/// use accrual_engine::core::money::MinorUnits;
/// use accrual_engine::core::tier::Tier;
///
/// let micros = daily_interest_micros(MinorUnits::new(10_000), &[Tier::unbounded(0, 200)]);
/// assert_eq!(micros.get(), 547_945);
/// ```
pub fn daily_interest_micros(balance: MinorUnits, tiers: &[Tier]) -> Micros {
    slice(balance, tiers)
        .iter()
        .map(|s| {
            let numerator = s.amount.get() as u128 * s.rate_bps as u128 * MICROS_PER_MINOR;
            Micros::new(numerator / (BPS_DENOMINATOR * DAYS_PER_YEAR))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tier_reference_value() {
        // 10_000 * 0.02 / 365 * 1e6 = 547_945.205...
        let micros = daily_interest_micros(MinorUnits::new(10_000), &[Tier::unbounded(0, 200)]);
        assert_eq!(micros, Micros::new(547_945));
    }

    #[test]
    fn test_two_tiers_sum_per_tier_contributions() {
        let tiers = [Tier::bounded(0, 10_000, 200), Tier::unbounded(10_000, 300)];
        let micros = daily_interest_micros(MinorUnits::new(15_000), &tiers);
        // 547_945 from the first tier plus 410_958 from the second
        assert_eq!(micros, Micros::new(547_945 + 410_958));
    }

    #[test]
    fn test_zero_balance_zero_interest() {
        let micros = daily_interest_micros(MinorUnits::ZERO, &[Tier::unbounded(0, 500)]);
        assert_eq!(micros, Micros::ZERO);
    }

    #[test]
    fn test_no_tiers_zero_interest() {
        assert_eq!(daily_interest_micros(MinorUnits::new(1_000_000), &[]), Micros::ZERO);
    }

    #[test]
    fn test_zero_rate_tier() {
        let tiers = [Tier::bounded(0, 100, 0), Tier::unbounded(100, 365)];
        // only the 900 above the first tier earns: 900 * 365 / 10_000 / 365 = 0.09
        let micros = daily_interest_micros(MinorUnits::new(1_000), &tiers);
        assert_eq!(micros, Micros::new(90_000));
    }

    #[test]
    fn test_extreme_inputs_do_not_overflow() {
        let micros = daily_interest_micros(MinorUnits::MAX, &[Tier::unbounded(0, u32::MAX)]);
        assert!(micros > Micros::ZERO);
    }
}
