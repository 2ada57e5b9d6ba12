use crate::core::tier::TierSet;
use chrono::NaiveDate;

/// Select the tier set effective on `date`.
///
/// Among all sets with `effective_from <= date`, the one with the latest
/// `effective_from` wins. Sets dated after `date` are ignored, so a schedule
/// change scheduled for tomorrow never affects today. Returns `None` when no
/// set is effective yet, which accrues at zero.
///
/// The input need not be sorted.
///
/// # Examples
///
/// ```
/// use accrual_engine::accrual::resolver::resolve;
/// use accrual_engine::core::account::EntityId;
/// use accrual_engine::core::tier::{Tier, TierSet};
/// use chrono::NaiveDate;
///
/// let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let mar = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let sets = vec![
///     TierSet::new(EntityId::new("F"), jan, vec![Tier::unbounded(0, 100)]).unwrap(),
///     TierSet::new(EntityId::new("F"), mar, vec![Tier::unbounded(0, 250)]).unwrap(),
/// ];
///
/// let feb = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
/// assert_eq!(resolve(&sets, feb).unwrap().effective_from(), jan);
/// assert_eq!(resolve(&sets, mar).unwrap().effective_from(), mar);
/// ```
pub fn resolve(sets: &[TierSet], date: NaiveDate) -> Option<&TierSet> {
    sets.iter()
        .filter(|set| set.effective_from() <= date)
        .max_by_key(|set| set.effective_from())
}
