use crate::core::money::MinorUnits;
use crate::core::tier::Tier;

/// The part of a balance that falls inside one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub amount: MinorUnits,
    pub rate_bps: u32,
}

/// Partition `balance` across `tiers`.
///
/// Each tier contributes `max(0, min(balance, upper) - lower)`; open-ended
/// tiers use the representable maximum as their upper bound. Tiers that
/// contribute nothing are omitted, so a zero balance yields no slices.
///
/// # Examples
///
/// ```
/// use accrual_engine::accrual::slicer::slice;
/// use accrual_engine::core::money::MinorUnits;
/// use accrual_engine::core::tier::Tier;
///
/// let tiers = [Tier::bounded(0, 10_000, 200), Tier::unbounded(10_000, 300)];
/// let slices = slice(MinorUnits::new(15_000), &tiers);
///
/// assert_eq!(slices.len(), 2);
/// assert_eq!(slices[0].amount.get(), 10_000);
/// assert_eq!(slices[1].amount.get(), 5_000);
/// ```
pub fn slice(balance: MinorUnits, tiers: &[Tier]) -> Vec<Slice> {
    tiers
        .iter()
        .filter_map(|tier| {
            let top = balance.min(tier.upper_or_max());
            let amount = top.checked_sub(tier.lower_bound).unwrap_or(MinorUnits::ZERO);
            (!amount.is_zero()).then_some(Slice {
                amount,
                rate_bps: tier.annual_rate_bps,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tiers() -> Vec<Tier> {
        vec![Tier::bounded(0, 10_000, 200), Tier::unbounded(10_000, 300)]
    }

    #[test]
    fn test_zero_balance_is_empty() {
        assert!(slice(MinorUnits::ZERO, &two_tiers()).is_empty());
    }

    #[test]
    fn test_balance_inside_first_tier() {
        let slices = slice(MinorUnits::new(4_000), &two_tiers());
        assert_eq!(
            slices,
            vec![Slice {
                amount: MinorUnits::new(4_000),
                rate_bps: 200
            }]
        );
    }

    #[test]
    fn test_balance_on_boundary_omits_upper_tier() {
        let slices = slice(MinorUnits::new(10_000), &two_tiers());
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].amount, MinorUnits::new(10_000));
    }

    #[test]
    fn test_two_tier_split() {
        let slices = slice(MinorUnits::new(15_000), &two_tiers());
        assert_eq!(
            slices,
            vec![
                Slice {
                    amount: MinorUnits::new(10_000),
                    rate_bps: 200
                },
                Slice {
                    amount: MinorUnits::new(5_000),
                    rate_bps: 300
                },
            ]
        );
    }

    #[test]
    fn test_balance_above_bounded_ceiling_is_capped() {
        let tiers = vec![Tier::bounded(0, 1_000, 100), Tier::bounded(1_000, 3_000, 200)];
        let total: MinorUnits = slice(MinorUnits::new(50_000), &tiers)
            .iter()
            .map(|s| s.amount)
            .sum();
        assert_eq!(total, MinorUnits::new(3_000));
    }

    #[test]
    fn test_open_ended_growth() {
        let slices = slice(MinorUnits::MAX, &[Tier::unbounded(0, 100)]);
        assert_eq!(slices[0].amount, MinorUnits::MAX);
    }
}
