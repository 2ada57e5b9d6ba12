use crate::core::error::AccrualError;
use crate::core::money::{Micros, MinorUnits, MICROS_PER_MINOR};
use serde::{Deserialize, Serialize};

/// Outcome of settling one day's accrual against the running carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub posted: MinorUnits,
    pub carry_out: Micros,
}

/// Settle `daily` micro-units plus `carry_in` into whole minor units.
///
/// `posted = floor((daily + carry_in) / 1_000_000)` and the remainder becomes
/// `carry_out`, so `posted * 1_000_000 + carry_out == daily + carry_in`
/// exactly. A `carry_in` outside `[0, 1_000_000)` is an integrity violation.
///
/// # Examples
///
/// ```
/// use accrual_engine::accrual::carry::settle;
/// use accrual_engine::core::money::Micros;
///
/// let s = settle(Micros::new(547_945), Micros::new(600_000)).unwrap();
/// assert_eq!(s.posted.get(), 1);
/// assert_eq!(s.carry_out.get(), 147_945);
/// ```
pub fn settle(daily: Micros, carry_in: Micros) -> Result<Settlement, AccrualError> {
    if carry_in.get() >= MICROS_PER_MINOR {
        return Err(AccrualError::CarryOutOfRange { carry: carry_in });
    }
    let total = daily
        .checked_add(carry_in)
        .ok_or(AccrualError::Overflow("adding carry to daily interest"))?;
    let (posted, carry_out) = total
        .split_minor()
        .ok_or(AccrualError::Overflow("converting accrued micros to minor units"))?;
    Ok(Settlement { posted, carry_out })
}

/// Running carry for one account, with totals for conservation checks.
///
/// Over any run of settlements,
/// `posted_total * 1_000_000 + carry == accrued_total + initial_carry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryLedger {
    initial_carry: Micros,
    carry: Micros,
    accrued_total: Micros,
    posted_total: Micros,
}

impl CarryLedger {
    pub fn new(initial_carry: Micros) -> Result<Self, AccrualError> {
        if initial_carry.get() >= MICROS_PER_MINOR {
            return Err(AccrualError::CarryOutOfRange {
                carry: initial_carry,
            });
        }
        Ok(Self {
            initial_carry,
            carry: initial_carry,
            accrued_total: Micros::ZERO,
            posted_total: Micros::ZERO,
        })
    }

    /// Settle one day and advance the carry.
    pub fn settle_day(&mut self, daily: Micros) -> Result<Settlement, AccrualError> {
        let settlement = settle(daily, self.carry)?;
        self.accrued_total = self
            .accrued_total
            .checked_add(daily)
            .ok_or(AccrualError::Overflow("summing accrued interest"))?;
        self.posted_total = self
            .posted_total
            .checked_add(Micros::from_minor(settlement.posted))
            .ok_or(AccrualError::Overflow("summing posted interest"))?;
        self.carry = settlement.carry_out;
        Ok(settlement)
    }

    /// Restart from a carry observed elsewhere (e.g. after another runner
    /// settled a day), keeping the conservation totals consistent.
    pub fn rebase(&mut self, carry: Micros) -> Result<(), AccrualError> {
        *self = Self::new(carry)?;
        Ok(())
    }

    pub fn carry(&self) -> Micros {
        self.carry
    }

    pub fn accrued_total(&self) -> Micros {
        self.accrued_total
    }

    pub fn posted_total(&self) -> Micros {
        self.posted_total
    }

    /// Whether no value has been created or destroyed so far.
    pub fn is_conserved(&self) -> bool {
        match (
            self.posted_total.checked_add(self.carry),
            self.accrued_total.checked_add(self.initial_carry),
        ) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}
