//! # accrual-engine
//!
//! Deterministic tiered interest accrual with a live balance ticker.
//!
//! Balances are integer minor units (e.g. cents) and interest is computed in
//! integer micro-units (1e-6 of a minor unit). Sub-unit remainders are
//! carried from day to day so that no value is created or lost to rounding,
//! and every run over the same history produces identical postings.
//!
//! ## Architecture
//!
//! - **core** — Money newtypes, tiers and tier sets, accounts, records, errors
//! - **accrual** — Tier resolution, slicing, daily interest, residual carry
//! - **runner** — Idempotent day-by-day catch-up and the store ports it uses
//! - **ticker** — Display-only extrapolation between authoritative syncs
//! - **simulation** — Synthetic portfolios for demos and load tests

pub mod accrual;
pub mod config;
pub mod core;
pub mod runner;
pub mod simulation;
pub mod ticker;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::accrual::calculator::daily_interest_micros;
    pub use crate::accrual::carry::{settle, CarryLedger, Settlement};
    pub use crate::accrual::resolver::resolve;
    pub use crate::accrual::slicer::{slice, Slice};
    pub use crate::config::EngineConfig;
    pub use crate::core::account::{Account, AccountId, AccrualRecord, EntityId};
    pub use crate::core::money::{Micros, MinorUnits};
    pub use crate::core::tier::{Tier, TierSet};
    pub use crate::runner::engine::{AccrualRunner, RunReport, RunStatus};
    pub use crate::runner::memory::{MemoryStore, Snapshot};
    pub use crate::runner::ports::{AccrualLedger, TierSetSource};
    pub use crate::ticker::projector::{project, ProjectedBalance, TickerBase};
    pub use crate::ticker::session::{SyncFeed, TickerSession};
}
