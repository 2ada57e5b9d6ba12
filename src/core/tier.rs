use crate::core::account::EntityId;
use crate::core::error::TierError;
use crate::core::money::MinorUnits;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A balance range `[lower_bound, upper_bound)` earning `annual_rate_bps`.
///
/// `upper_bound == None` means the tier is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub lower_bound: MinorUnits,
    #[serde(default)]
    pub upper_bound: Option<MinorUnits>,
    pub annual_rate_bps: u32,
}

impl Tier {
    pub fn bounded(lower: u64, upper: u64, annual_rate_bps: u32) -> Self {
        Self {
            lower_bound: MinorUnits::new(lower),
            upper_bound: Some(MinorUnits::new(upper)),
            annual_rate_bps,
        }
    }

    pub fn unbounded(lower: u64, annual_rate_bps: u32) -> Self {
        Self {
            lower_bound: MinorUnits::new(lower),
            upper_bound: None,
            annual_rate_bps,
        }
    }

    /// Upper bound, with open-ended tiers mapped to the representable maximum.
    pub fn upper_or_max(&self) -> MinorUnits {
        self.upper_bound.unwrap_or(MinorUnits::MAX)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper_bound {
            Some(upper) => write!(
                f,
                "[{}, {}) @ {} bps",
                self.lower_bound, upper, self.annual_rate_bps
            ),
            None => write!(f, "[{}, ∞) @ {} bps", self.lower_bound, self.annual_rate_bps),
        }
    }
}

/// The complete rate schedule for one entity, effective from a given day.
///
/// Tiers are ordered, contiguous and start at zero. A set with no tiers is
/// valid and earns nothing. Once any day has been accrued against a set it
/// must not change; stores enforce that on their write path.
///
/// # Examples
///
/// ```
/// use accrual_engine::core::account::EntityId;
/// use accrual_engine::core::tier::{Tier, TierSet};
/// use chrono::NaiveDate;
///
/// let set = TierSet::new(
///     EntityId::new("FAMILY-1"),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     vec![Tier::bounded(0, 10_000, 200), Tier::unbounded(10_000, 300)],
/// )
/// .unwrap();
/// assert_eq!(set.tiers().len(), 2);
///
/// let gap = TierSet::new(
///     EntityId::new("FAMILY-1"),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     vec![Tier::bounded(0, 10_000, 200), Tier::unbounded(12_000, 300)],
/// );
/// assert!(gap.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSet {
    entity_id: EntityId,
    effective_from: NaiveDate,
    tiers: Vec<Tier>,
}

impl TierSet {
    /// Build a tier set, rejecting gaps, overlaps and misplaced open tiers.
    pub fn new(
        entity_id: EntityId,
        effective_from: NaiveDate,
        tiers: Vec<Tier>,
    ) -> Result<Self, TierError> {
        let set = Self {
            entity_id,
            effective_from,
            tiers,
        };
        set.validate()?;
        Ok(set)
    }

    /// Check the shape invariants.
    ///
    /// Sets that arrive through deserialization bypass [`TierSet::new`], so
    /// consumers call this before accruing against them.
    pub fn validate(&self) -> Result<(), TierError> {
        let mut expected = MinorUnits::ZERO;
        let last = self.tiers.len().saturating_sub(1);

        for (index, tier) in self.tiers.iter().enumerate() {
            if index == 0 && !tier.lower_bound.is_zero() {
                return Err(TierError::FirstTierNotZero {
                    lower: tier.lower_bound,
                });
            }
            if tier.lower_bound != expected {
                return Err(TierError::NotContiguous {
                    index,
                    lower: tier.lower_bound,
                    expected,
                });
            }
            match tier.upper_bound {
                Some(upper) if upper <= tier.lower_bound => {
                    return Err(TierError::EmptyRange {
                        index,
                        lower: tier.lower_bound,
                        upper,
                    });
                }
                Some(upper) => expected = upper,
                None if index != last => return Err(TierError::UnboundedNotLast { index }),
                None => {}
            }
        }
        Ok(())
    }

    // --- Accessors ---

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn effective_from(&self) -> NaiveDate {
        self.effective_from
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl fmt::Display for TierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} from {}:", self.entity_id, self.effective_from)?;
        for tier in &self.tiers {
            writeln!(f, "  {}", tier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn build(tiers: Vec<Tier>) -> Result<TierSet, TierError> {
        TierSet::new(EntityId::new("F"), day(), tiers)
    }

    #[test]
    fn test_valid_two_tiers() {
        let set = build(vec![
            Tier::bounded(0, 10_000, 200),
            Tier::unbounded(10_000, 300),
        ])
        .unwrap();
        assert_eq!(set.tiers().len(), 2);
        assert_eq!(set.tiers()[1].upper_or_max(), MinorUnits::MAX);
    }

    #[test]
    fn test_empty_set_is_valid() {
        let set = build(vec![]).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_first_tier_must_start_at_zero() {
        let err = build(vec![Tier::unbounded(1, 100)]).unwrap_err();
        assert_eq!(err, TierError::FirstTierNotZero { lower: MinorUnits::new(1) });
    }

    #[test]
    fn test_overlap_rejected() {
        let err = build(vec![
            Tier::bounded(0, 10_000, 200),
            Tier::unbounded(9_000, 300),
        ])
        .unwrap_err();
        assert!(matches!(err, TierError::NotContiguous { index: 1, .. }));
    }

    #[test]
    fn test_empty_range_rejected() {
        let err = build(vec![Tier::bounded(0, 0, 200)]).unwrap_err();
        assert!(matches!(err, TierError::EmptyRange { index: 0, .. }));
    }

    #[test]
    fn test_unbounded_must_be_last() {
        let err = build(vec![Tier::unbounded(0, 200), Tier::unbounded(0, 300)]).unwrap_err();
        assert_eq!(err, TierError::UnboundedNotLast { index: 0 });
    }

    #[test]
    fn test_bounded_top_tier_is_valid() {
        let set = build(vec![Tier::bounded(0, 5_000, 100)]).unwrap();
        assert_eq!(set.tiers()[0].upper_or_max(), MinorUnits::new(5_000));
    }

    #[test]
    fn test_deserialized_set_can_be_validated() {
        let json = r#"{"entity_id":"F","effective_from":"2024-01-01",
            "tiers":[{"lower_bound":5,"annual_rate_bps":100}]}"#;
        let set: TierSet = serde_json::from_str(json).unwrap();
        assert!(set.validate().is_err());
    }
}
