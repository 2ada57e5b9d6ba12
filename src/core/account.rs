use crate::core::money::{Micros, MinorUnits};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an interest-bearing account.
///
/// # Examples
///
/// ```
/// use accrual_engine::core::account::AccountId;
///
/// let a = AccountId::new("ACC-001");
/// assert_eq!(a.as_str(), "ACC-001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The owning entity (family, household) whose rate schedule applies to
/// its accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Authoritative state of one account.
///
/// `as_of` is the last calendar day whose interest has been settled.
/// `residual_carry` is the sub-minor-unit remainder carried into the
/// next day, always in `[0, 1_000_000)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub entity_id: EntityId,
    pub balance: MinorUnits,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub residual_carry: Micros,
}

impl Account {
    /// A fresh account with zero carry, checkpointed at `as_of`.
    pub fn new(
        id: AccountId,
        entity_id: EntityId,
        balance: MinorUnits,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            id,
            entity_id,
            balance,
            as_of,
            residual_carry: Micros::ZERO,
        }
    }
}

/// Durable evidence that one account-day has been settled.
///
/// `(account_id, run_date)` is unique; its presence means that day is never
/// recomputed or reposted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualRecord {
    pub account_id: AccountId,
    pub run_date: NaiveDate,
    pub interest_posted: MinorUnits,
    pub residual_after: Micros,
}

/// An interest credit on the account's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestTransaction {
    pub id: Uuid,
    pub account_id: AccountId,
    pub amount: MinorUnits,
    pub description: String,
    pub date: NaiveDate,
}

impl InterestTransaction {
    pub fn new(
        account_id: AccountId,
        amount: MinorUnits,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            description: description.into(),
            date,
        }
    }
}
