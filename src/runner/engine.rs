use crate::accrual::calculator::daily_interest_micros;
use crate::accrual::carry::CarryLedger;
use crate::accrual::resolver::resolve;
use crate::config::EngineConfig;
use crate::core::account::{Account, AccountId};
use crate::core::error::{AccrualError, StoreError};
use crate::core::money::{Micros, MinorUnits};
use crate::core::tier::{Tier, TierSet};
use crate::runner::ports::{AccrualLedger, CommitOutcome, DayPosting, TierSetSource};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a single account's run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// `as_of` was already yesterday or later; nothing to do.
    UpToDate,
    /// Every missing day through yesterday is settled.
    CaughtUp,
    /// The per-run day cap was reached; `next_day` is settled next run.
    Capped {
        next_day: NaiveDate,
    },
    /// A store operation failed on `day`; it and later days are retried
    /// next run.
    Deferred {
        day: NaiveDate,
        reason: String,
    },
}

/// Outcome of one account's catch-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub account_id: AccountId,
    pub status: RunStatus,
    /// Days this run committed (including zero-interest days).
    pub days_committed: u32,
    /// Days found already recorded, by an earlier run or a concurrent one.
    pub days_skipped: u32,
    pub interest_posted: MinorUnits,
    pub as_of: NaiveDate,
    pub residual_carry: Micros,
}

impl RunReport {
    fn start(account: &Account) -> Self {
        Self {
            account_id: account.id.clone(),
            status: RunStatus::UpToDate,
            days_committed: 0,
            days_skipped: 0,
            interest_posted: MinorUnits::ZERO,
            as_of: account.as_of,
            residual_carry: account.residual_carry,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &self.status {
            RunStatus::UpToDate => "up to date".to_string(),
            RunStatus::CaughtUp => "caught up".to_string(),
            RunStatus::Capped { next_day } => format!("capped, resumes {}", next_day),
            RunStatus::Deferred { day, reason } => format!("deferred at {}: {}", day, reason),
        };
        write!(
            f,
            "{}: {} | committed {} day(s), skipped {}, posted {} | as of {}, carry {}",
            self.account_id,
            status,
            self.days_committed,
            self.days_skipped,
            self.interest_posted,
            self.as_of,
            self.residual_carry
        )
    }
}

/// Replays missed days for accounts and posts their interest exactly once.
///
/// The runner holds no mutable state of its own; any number of runners may
/// work the same store concurrently. Each day's uniqueness is decided by
/// [`AccrualLedger::commit_day`].
pub struct AccrualRunner<L, T> {
    ledger: L,
    tiers: T,
    config: EngineConfig,
}

impl<L: AccrualLedger, T: TierSetSource> AccrualRunner<L, T> {
    pub fn new(ledger: L, tiers: T, config: EngineConfig) -> Self {
        Self {
            ledger,
            tiers,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Settle every day strictly after the account's `as_of` up to and
    /// including the day before `today`, in ascending order.
    ///
    /// Store failures defer the remaining days to the next run and are
    /// reported in the returned [`RunStatus`]. Integrity violations
    /// (malformed tiers, carry out of range, overflow) abort this account
    /// with an error.
    pub fn run_account(&self, id: &AccountId, today: NaiveDate) -> Result<RunReport, AccrualError> {
        let yesterday = today
            .pred_opt()
            .ok_or(AccrualError::Overflow("computing the day before today"))?;
        let mut account = self
            .ledger
            .account(id)
            .map_err(|e| AccrualError::Store(id.clone(), e))?;
        let mut report = RunReport::start(&account);

        if account.as_of >= yesterday {
            return Ok(report);
        }
        info!(
            "{}: catching up {} day(s) after {}",
            id,
            (yesterday - account.as_of).num_days(),
            account.as_of
        );

        let schedule = self.schedule_for(&account);
        let mut carry = CarryLedger::new(account.residual_carry)?;
        let mut committed_this_run = 0u32;
        report.status = RunStatus::CaughtUp;

        let mut day = next_day(account.as_of)?;
        while day <= yesterday {
            if let Some(cap) = self.config.max_catch_up_days {
                if committed_this_run >= cap {
                    report.status = RunStatus::Capped { next_day: day };
                    break;
                }
            }

            match self.ledger.has_record(id, day) {
                Ok(true) => {
                    debug!("{}: {} already recorded, skipping", id, day);
                    report.days_skipped += 1;
                    match self.ledger.account(id) {
                        Ok(fresh) => {
                            carry.rebase(fresh.residual_carry)?;
                            account = fresh;
                        }
                        Err(e) => {
                            report.status = defer(id, day, e);
                            break;
                        }
                    }
                    day = next_day(day.max(account.as_of))?;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    report.status = defer(id, day, e);
                    break;
                }
            }

            let tiers = tiers_on(&schedule, day)?;
            let daily = daily_interest_micros(account.balance, tiers);
            let mut next_carry = carry.clone();
            let settlement = next_carry.settle_day(daily)?;

            let posting = DayPosting {
                account_id: id.clone(),
                day,
                interest: settlement.posted,
                residual_after: settlement.carry_out,
                description: self.config.description_for(day),
            };

            match self.ledger.commit_day(&posting) {
                Ok(CommitOutcome::Committed) => {
                    debug!(
                        "{}: {} balance {} accrued {} posted {} carry {}",
                        id, day, account.balance, daily, settlement.posted, settlement.carry_out
                    );
                    account.balance = account
                        .balance
                        .checked_add(settlement.posted)
                        .ok_or(AccrualError::Overflow("crediting posted interest"))?;
                    account.as_of = day;
                    account.residual_carry = settlement.carry_out;
                    carry = next_carry;
                    committed_this_run += 1;
                    report.days_committed += 1;
                    report.interest_posted = report
                        .interest_posted
                        .checked_add(settlement.posted)
                        .ok_or(AccrualError::Overflow("summing posted interest"))?;
                }
                Ok(CommitOutcome::AlreadyRecorded) => {
                    debug!("{}: {} settled by a concurrent run", id, day);
                    report.days_skipped += 1;
                    match self.ledger.account(id) {
                        Ok(fresh) => {
                            carry.rebase(fresh.residual_carry)?;
                            account = fresh;
                        }
                        Err(e) => {
                            report.status = defer(id, day, e);
                            break;
                        }
                    }
                }
                Err(e) => {
                    report.status = defer(id, day, e);
                    break;
                }
            }
            day = next_day(day.max(account.as_of))?;
        }

        debug_assert!(carry.is_conserved());
        report.as_of = account.as_of;
        report.residual_carry = account.residual_carry;
        info!("{}", report);
        Ok(report)
    }

    /// Tier sets for the account's entity. A failing source is a data-quality
    /// signal, not a reason to stop: the days accrue at zero.
    fn schedule_for(&self, account: &Account) -> Vec<TierSet> {
        match self.tiers.tier_sets(&account.entity_id) {
            Ok(sets) => sets,
            Err(e) => {
                warn!(
                    "{}: tier schedule for {} unavailable ({}); accruing at zero",
                    account.id, account.entity_id, e
                );
                Vec::new()
            }
        }
    }
}

fn tiers_on(schedule: &[TierSet], day: NaiveDate) -> Result<&[Tier], AccrualError> {
    match resolve(schedule, day) {
        Some(set) => {
            set.validate().map_err(|source| AccrualError::MalformedTiers {
                entity: set.entity_id().clone(),
                effective_from: set.effective_from(),
                source,
            })?;
            Ok(set.tiers())
        }
        None => Ok(&[]),
    }
}

fn next_day(day: NaiveDate) -> Result<NaiveDate, AccrualError> {
    day.succ_opt()
        .ok_or(AccrualError::Overflow("advancing past the last representable day"))
}

fn defer(id: &AccountId, day: NaiveDate, e: StoreError) -> RunStatus {
    warn!("{}: deferring {} and later days: {}", id, day, e);
    RunStatus::Deferred {
        day,
        reason: e.to_string(),
    }
}
