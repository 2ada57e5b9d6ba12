use crate::core::account::{AccountId, EntityId};
use crate::core::money::{Micros, MinorUnits};
use chrono::NaiveDate;
use thiserror::Error;

/// Shape violations in a tier schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierError {
    #[error("first tier must start at 0, starts at {lower}")]
    FirstTierNotZero { lower: MinorUnits },
    #[error("tier {index} starts at {lower} but the previous tier ends at {expected}")]
    NotContiguous {
        index: usize,
        lower: MinorUnits,
        expected: MinorUnits,
    },
    #[error("tier {index} has an empty range [{lower}, {upper})")]
    EmptyRange {
        index: usize,
        lower: MinorUnits,
        upper: MinorUnits,
    },
    #[error("tier {index} is unbounded but is not the last tier")]
    UnboundedNotLast { index: usize },
}

/// Failures reported by a storage or posting collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("no tier schedule source for entity {0}")]
    EntityUnavailable(EntityId),
    #[error("posting rejected for {account} on {day}: {reason}")]
    PostingFailed {
        account: AccountId,
        day: NaiveDate,
        reason: String,
    },
    #[error("cannot settle {day} for {account}: next unsettled day is {expected}")]
    OutOfOrder {
        account: AccountId,
        day: NaiveDate,
        expected: NaiveDate,
    },
    #[error("tier set for {entity} effective {effective_from} edits already-accrued history")]
    RetroactiveEdit {
        entity: EntityId,
        effective_from: NaiveDate,
    },
    #[error("tier set for {entity} effective {effective_from} not found")]
    TierSetNotFound {
        entity: EntityId,
        effective_from: NaiveDate,
    },
    #[error("withdrawal of {amount} exceeds balance {balance} on account {account}")]
    InsufficientBalance {
        account: AccountId,
        balance: MinorUnits,
        amount: MinorUnits,
    },
    #[error("account {0} already exists")]
    DuplicateAccount(AccountId),
    #[error("invalid tier set: {0}")]
    InvalidTierSet(#[from] TierError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that halt the catch-up of a single account.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualError {
    #[error("tier schedule for {entity} effective {effective_from} is malformed: {source}")]
    MalformedTiers {
        entity: EntityId,
        effective_from: NaiveDate,
        source: TierError,
    },
    #[error("residual carry {carry} is outside [0, 1_000_000)")]
    CarryOutOfRange { carry: Micros },
    #[error("arithmetic overflow while {0}")]
    Overflow(&'static str),
    #[error("account {0} cannot be loaded: {1}")]
    Store(AccountId, StoreError),
}
