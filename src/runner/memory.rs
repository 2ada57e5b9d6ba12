use crate::accrual::resolver::resolve;
use crate::core::account::{Account, AccountId, AccrualRecord, EntityId, InterestTransaction};
use crate::core::error::StoreError;
use crate::core::money::MinorUnits;
use crate::core::tier::TierSet;
use crate::runner::ports::{AccrualLedger, CommitOutcome, DayPosting, TierSetSource};
use crate::ticker::session::{SyncFeed, SyncSnapshot};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Serializable image of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub tier_sets: Vec<TierSet>,
    #[serde(default)]
    pub records: Vec<AccrualRecord>,
    #[serde(default)]
    pub transactions: Vec<InterestTransaction>,
}

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<AccountId, Account>,
    tier_sets: HashMap<EntityId, BTreeMap<NaiveDate, TierSet>>,
    records: BTreeMap<(AccountId, NaiveDate), AccrualRecord>,
    transactions: Vec<InterestTransaction>,
}

impl State {
    /// Latest settled day over all accounts of `entity`.
    fn latest_accrued(&self, entity: &EntityId) -> Option<NaiveDate> {
        self.accounts
            .values()
            .filter(|a| &a.entity_id == entity)
            .map(|a| a.as_of)
            .max()
    }

    fn guard_history(
        &self,
        entity: &EntityId,
        effective_from: NaiveDate,
    ) -> Result<(), StoreError> {
        match self.latest_accrued(entity) {
            Some(latest) if effective_from <= latest => Err(StoreError::RetroactiveEdit {
                entity: entity.clone(),
                effective_from,
            }),
            _ => Ok(()),
        }
    }

    fn account_mut(&mut self, id: &AccountId) -> Result<&mut Account, StoreError> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::AccountNotFound(id.clone()))
    }
}

/// In-process store backing every port of the engine.
///
/// A single lock covers all state, so [`AccrualLedger::commit_day`] applies
/// its posting, record and checkpoint as one unit, and the record map's key
/// doubles as the uniqueness constraint on `(account_id, run_date)`.
///
/// Also serves as the fixture data source for tests and demos: build it from
/// a [`Snapshot`] and hand it to the runner like any other store.
///
/// # Examples
///
/// ```
/// use accrual_engine::core::account::{Account, AccountId, EntityId};
/// use accrual_engine::core::money::MinorUnits;
/// use accrual_engine::runner::memory::MemoryStore;
/// use accrual_engine::runner::ports::AccrualLedger;
/// use chrono::NaiveDate;
///
/// let store = MemoryStore::new();
/// let id = AccountId::new("ACC-1");
/// store.open_account(Account::new(
///     id.clone(),
///     EntityId::new("FAMILY-1"),
///     MinorUnits::new(10_000),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
/// )).unwrap();
///
/// store.deposit(&id, MinorUnits::new(500)).unwrap();
/// assert_eq!(store.account(&id).unwrap().balance.get(), 10_500);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a snapshot, validating every tier set.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut state = State::default();
        for account in snapshot.accounts {
            if state.accounts.contains_key(&account.id) {
                return Err(StoreError::DuplicateAccount(account.id));
            }
            state.accounts.insert(account.id.clone(), account);
        }
        for set in snapshot.tier_sets {
            set.validate()?;
            state
                .tier_sets
                .entry(set.entity_id().clone())
                .or_default()
                .insert(set.effective_from(), set);
        }
        for record in snapshot.records {
            state
                .records
                .insert((record.account_id.clone(), record.run_date), record);
        }
        state.transactions = snapshot.transactions;
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    pub fn to_snapshot(&self) -> Result<Snapshot, StoreError> {
        let state = self.lock()?;
        let mut tier_sets: Vec<TierSet> = state
            .tier_sets
            .values()
            .flat_map(|sets| sets.values().cloned())
            .collect();
        tier_sets.sort_by(|a, b| {
            (a.entity_id(), a.effective_from()).cmp(&(b.entity_id(), b.effective_from()))
        });
        Ok(Snapshot {
            accounts: state.accounts.values().cloned().collect(),
            tier_sets,
            records: state.records.values().cloned().collect(),
            transactions: state.transactions.clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    // --- Account surface ---

    pub fn open_account(&self, account: Account) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.accounts.contains_key(&account.id) {
            return Err(StoreError::DuplicateAccount(account.id));
        }
        state.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    pub fn account_ids(&self) -> Result<Vec<AccountId>, StoreError> {
        Ok(self.lock()?.accounts.keys().cloned().collect())
    }

    pub fn deposit(&self, id: &AccountId, amount: MinorUnits) -> Result<MinorUnits, StoreError> {
        let mut state = self.lock()?;
        let account = state.account_mut(id)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::Unavailable(format!("balance overflow on {}", id)))?;
        Ok(account.balance)
    }

    /// Withdraw, refusing to take the balance below zero.
    pub fn withdraw(&self, id: &AccountId, amount: MinorUnits) -> Result<MinorUnits, StoreError> {
        let mut state = self.lock()?;
        let account = state.account_mut(id)?;
        let balance = account.balance;
        account.balance =
            balance
                .checked_sub(amount)
                .ok_or_else(|| StoreError::InsufficientBalance {
                    account: id.clone(),
                    balance,
                    amount,
                })?;
        Ok(account.balance)
    }

    // --- Tier configuration surface ---

    /// Create or replace the set effective on `set.effective_from()`.
    ///
    /// Rejected when any account of the entity has already accrued on or
    /// after that date.
    pub fn upsert_tier_set(&self, set: TierSet) -> Result<(), StoreError> {
        set.validate()?;
        let mut state = self.lock()?;
        state.guard_history(set.entity_id(), set.effective_from())?;
        state
            .tier_sets
            .entry(set.entity_id().clone())
            .or_default()
            .insert(set.effective_from(), set);
        Ok(())
    }

    pub fn delete_tier_set(
        &self,
        entity: &EntityId,
        effective_from: NaiveDate,
    ) -> Result<TierSet, StoreError> {
        let mut state = self.lock()?;
        state.guard_history(entity, effective_from)?;
        state
            .tier_sets
            .get_mut(entity)
            .and_then(|sets| sets.remove(&effective_from))
            .ok_or_else(|| StoreError::TierSetNotFound {
                entity: entity.clone(),
                effective_from,
            })
    }

    // --- Ledger evidence ---

    pub fn record(
        &self,
        id: &AccountId,
        day: NaiveDate,
    ) -> Result<Option<AccrualRecord>, StoreError> {
        Ok(self.lock()?.records.get(&(id.clone(), day)).cloned())
    }

    /// Records of one account in ascending date order.
    pub fn records(&self, id: &AccountId) -> Result<Vec<AccrualRecord>, StoreError> {
        Ok(self
            .lock()?
            .records
            .values()
            .filter(|r| &r.account_id == id)
            .cloned()
            .collect())
    }

    pub fn transactions(&self, id: &AccountId) -> Result<Vec<InterestTransaction>, StoreError> {
        Ok(self
            .lock()?
            .transactions
            .iter()
            .filter(|t| &t.account_id == id)
            .cloned()
            .collect())
    }
}

impl TierSetSource for MemoryStore {
    fn tier_sets(&self, entity: &EntityId) -> Result<Vec<TierSet>, StoreError> {
        Ok(self
            .lock()?
            .tier_sets
            .get(entity)
            .map(|sets| sets.values().cloned().collect())
            .unwrap_or_default())
    }
}

impl AccrualLedger for MemoryStore {
    fn account(&self, id: &AccountId) -> Result<Account, StoreError> {
        self.lock()?
            .accounts
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::AccountNotFound(id.clone()))
    }

    fn has_record(&self, id: &AccountId, day: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.lock()?.records.contains_key(&(id.clone(), day)))
    }

    fn commit_day(&self, posting: &DayPosting) -> Result<CommitOutcome, StoreError> {
        let mut state = self.lock()?;
        let key = (posting.account_id.clone(), posting.day);
        if state.records.contains_key(&key) {
            return Ok(CommitOutcome::AlreadyRecorded);
        }

        let account = state.account_mut(&posting.account_id)?;
        if posting.day <= account.as_of {
            return Ok(CommitOutcome::AlreadyRecorded);
        }
        match account.as_of.succ_opt() {
            Some(expected) if expected == posting.day => {}
            expected => {
                return Err(StoreError::OutOfOrder {
                    account: posting.account_id.clone(),
                    day: posting.day,
                    expected: expected.unwrap_or(account.as_of),
                });
            }
        }
        let balance = account.balance.checked_add(posting.interest).ok_or_else(|| {
            StoreError::PostingFailed {
                account: posting.account_id.clone(),
                day: posting.day,
                reason: "balance overflow".to_string(),
            }
        })?;
        account.balance = balance;
        account.as_of = posting.day;
        account.residual_carry = posting.residual_after;

        if !posting.interest.is_zero() {
            state.transactions.push(InterestTransaction::new(
                posting.account_id.clone(),
                posting.interest,
                posting.description.clone(),
                posting.day,
            ));
        }
        state.records.insert(
            key,
            AccrualRecord {
                account_id: posting.account_id.clone(),
                run_date: posting.day,
                interest_posted: posting.interest,
                residual_after: posting.residual_after,
            },
        );
        Ok(CommitOutcome::Committed)
    }
}

impl SyncFeed for MemoryStore {
    fn snapshot(&self, id: &AccountId, now_ms: i64) -> Result<Option<SyncSnapshot>, StoreError> {
        let state = self.lock()?;
        let Some(account) = state.accounts.get(id) else {
            return Ok(None);
        };
        let Some(today) = DateTime::from_timestamp_millis(now_ms).map(|t| t.date_naive()) else {
            return Ok(None);
        };
        // The stored balance is exact at the close of `as_of`, i.e. midnight
        // UTC starting the next day.
        let Some(anchor_ms) = account
            .as_of
            .succ_opt()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|t| t.and_utc().timestamp_millis())
        else {
            return Ok(None);
        };
        let tiers = state
            .tier_sets
            .get(&account.entity_id)
            .and_then(|sets| {
                let sets: Vec<TierSet> = sets.values().cloned().collect();
                resolve(&sets, today).map(|set| set.tiers().to_vec())
            })
            .unwrap_or_default();
        Ok(Some(SyncSnapshot {
            balance: account.balance,
            timestamp_ms: anchor_ms,
            tiers,
        }))
    }
}
