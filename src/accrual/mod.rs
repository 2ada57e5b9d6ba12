//! Pure accrual arithmetic: which tiers apply, how a balance splits across
//! them, one day's interest in micro-units, and the day-to-day carry.

pub mod calculator;
pub mod carry;
pub mod resolver;
pub mod slicer;
