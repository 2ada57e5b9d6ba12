use crate::core::account::{Account, AccountId, EntityId};
use crate::core::error::StoreError;
use crate::core::money::{Micros, MinorUnits};
use crate::core::tier::TierSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Read-only access to the configured rate schedules.
pub trait TierSetSource {
    /// All tier sets for `entity`, in any order. An entity with no schedule
    /// returns an empty list, not an error.
    fn tier_sets(&self, entity: &EntityId) -> Result<Vec<TierSet>, StoreError>;
}

/// Everything the runner needs to settle one account-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPosting {
    pub account_id: AccountId,
    pub day: NaiveDate,
    pub interest: MinorUnits,
    pub residual_after: Micros,
    pub description: String,
}

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Posting, record and checkpoint were all applied.
    Committed,
    /// The `(account_id, day)` key was already taken; nothing was applied.
    AlreadyRecorded,
}

/// Durable account state, accrual records and interest postings.
///
/// `commit_day` is all-or-nothing: it credits `interest` (skipping the
/// transaction when zero), inserts the unique `(account_id, day)` record
/// and advances `as_of` and `residual_carry`. A duplicate key is reported as
/// [`CommitOutcome::AlreadyRecorded`] rather than as an error, so racing
/// runners settle each day exactly once.
pub trait AccrualLedger {
    fn account(&self, id: &AccountId) -> Result<Account, StoreError>;

    fn has_record(&self, id: &AccountId, day: NaiveDate) -> Result<bool, StoreError>;

    fn commit_day(&self, posting: &DayPosting) -> Result<CommitOutcome, StoreError>;
}

impl<T: TierSetSource + ?Sized> TierSetSource for &T {
    fn tier_sets(&self, entity: &EntityId) -> Result<Vec<TierSet>, StoreError> {
        (**self).tier_sets(entity)
    }
}

impl<T: TierSetSource + ?Sized> TierSetSource for Arc<T> {
    fn tier_sets(&self, entity: &EntityId) -> Result<Vec<TierSet>, StoreError> {
        (**self).tier_sets(entity)
    }
}

impl<T: AccrualLedger + ?Sized> AccrualLedger for &T {
    fn account(&self, id: &AccountId) -> Result<Account, StoreError> {
        (**self).account(id)
    }

    fn has_record(&self, id: &AccountId, day: NaiveDate) -> Result<bool, StoreError> {
        (**self).has_record(id, day)
    }

    fn commit_day(&self, posting: &DayPosting) -> Result<CommitOutcome, StoreError> {
        (**self).commit_day(posting)
    }
}

impl<T: AccrualLedger + ?Sized> AccrualLedger for Arc<T> {
    fn account(&self, id: &AccountId) -> Result<Account, StoreError> {
        (**self).account(id)
    }

    fn has_record(&self, id: &AccountId, day: NaiveDate) -> Result<bool, StoreError> {
        (**self).has_record(id, day)
    }

    fn commit_day(&self, posting: &DayPosting) -> Result<CommitOutcome, StoreError> {
        (**self).commit_day(posting)
    }
}
