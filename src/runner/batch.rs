use crate::core::account::AccountId;
use crate::core::error::AccrualError;
use crate::core::money::MinorUnits;
use crate::runner::engine::{AccrualRunner, RunReport, RunStatus};
use crate::runner::ports::{AccrualLedger, TierSetSource};
use chrono::NaiveDate;
use log::error;
use rayon::prelude::*;
use std::fmt;

/// Result of one account within a batch.
#[derive(Debug, Clone)]
pub struct AccountOutcome {
    pub account_id: AccountId,
    pub result: Result<RunReport, AccrualError>,
}

/// Per-account outcomes of a batch run, in input order.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub today: NaiveDate,
    pub outcomes: Vec<AccountOutcome>,
}

impl BatchSummary {
    pub fn reports(&self) -> impl Iterator<Item = &RunReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Accounts halted by an integrity violation.
    pub fn failures(&self) -> impl Iterator<Item = (&AccountId, &AccrualError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.account_id, e)))
    }

    /// Accounts with days left over for the next run.
    pub fn deferred(&self) -> impl Iterator<Item = &RunReport> {
        self.reports()
            .filter(|r| matches!(r.status, RunStatus::Deferred { .. }))
    }

    pub fn total_posted(&self) -> MinorUnits {
        self.reports().map(|r| r.interest_posted).sum()
    }

    pub fn days_committed(&self) -> u64 {
        self.reports().map(|r| r.days_committed as u64).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none() && self.deferred().next().is_none()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Accrual Run through {} ===", self.today.pred_opt().unwrap_or(self.today))?;
        writeln!(f, "Accounts:       {}", self.outcomes.len())?;
        writeln!(f, "Days committed: {}", self.days_committed())?;
        writeln!(f, "Total posted:   {}", self.total_posted())?;
        writeln!(f, "Deferred:       {}", self.deferred().count())?;
        writeln!(f, "Failed:         {}", self.failures().count())?;

        writeln!(f, "\nAccounts:")?;
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(report) => writeln!(f, "  {}", report)?,
                Err(e) => writeln!(f, "  {}: FAILED: {}", outcome.account_id, e)?,
            }
        }
        Ok(())
    }
}

impl<L, T> AccrualRunner<L, T>
where
    L: AccrualLedger + Sync,
    T: TierSetSource + Sync,
{
    /// Run every account independently. One account's failure is recorded
    /// in its outcome and never stops the others.
    pub fn run_all(&self, ids: &[AccountId], today: NaiveDate) -> BatchSummary {
        let run_one = |id: &AccountId| {
            let result = self.run_account(id, today);
            if let Err(e) = &result {
                error!("{}: accrual halted: {}", id, e);
            }
            AccountOutcome {
                account_id: id.clone(),
                result,
            }
        };

        let outcomes = if self.config().parallel {
            ids.par_iter().map(run_one).collect()
        } else {
            ids.iter().map(run_one).collect()
        };
        BatchSummary { today, outcomes }
    }
}
