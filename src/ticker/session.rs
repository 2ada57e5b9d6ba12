use crate::config::EngineConfig;
use crate::core::account::AccountId;
use crate::core::error::StoreError;
use crate::core::money::MinorUnits;
use crate::core::tier::Tier;
use crate::ticker::projector::{project, ProjectedBalance, TickerBase};
use log::debug;
use serde::{Deserialize, Serialize};

/// Authoritative `(balance, timestamp, tiers)` read from the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub balance: MinorUnits,
    pub timestamp_ms: i64,
    pub tiers: Vec<Tier>,
}

impl From<SyncSnapshot> for TickerBase {
    fn from(s: SyncSnapshot) -> Self {
        TickerBase {
            base_balance: s.balance,
            base_timestamp_ms: s.timestamp_ms,
            tiers: s.tiers,
        }
    }
}

/// Periodic source of authoritative balances for a display.
pub trait SyncFeed {
    /// Current state of `account` as seen at `now_ms`, or `None` when no
    /// authoritative data is available.
    fn snapshot(
        &self,
        account: &AccountId,
        now_ms: i64,
    ) -> Result<Option<SyncSnapshot>, StoreError>;
}

/// One display's live balance for one account.
///
/// Projects every tick from the last base and pulls a fresh base from the
/// feed once the re-sync interval has passed. When the feed is stale,
/// empty or failing, the last projection keeps running and the session
/// retries on the next interval.
///
/// # Examples
///
/// ```
/// use accrual_engine::core::account::AccountId;
/// use accrual_engine::core::money::MinorUnits;
/// use accrual_engine::core::tier::Tier;
/// use accrual_engine::ticker::projector::TickerBase;
/// use accrual_engine::ticker::session::TickerSession;
///
/// let session = TickerSession::new(AccountId::new("ACC-1"), 60_000).with_base(TickerBase {
///     base_balance: MinorUnits::new(10_000),
///     base_timestamp_ms: 0,
///     tiers: vec![Tier::unbounded(0, 365)],
/// });
/// assert!(session.display(5_000).unwrap().micros().get() > 10_000_000_000);
/// ```
#[derive(Debug, Clone)]
pub struct TickerSession {
    account_id: AccountId,
    resync_interval_ms: u64,
    base: Option<TickerBase>,
    last_attempt_ms: Option<i64>,
}

impl TickerSession {
    pub fn new(account_id: AccountId, resync_interval_ms: u64) -> Self {
        Self {
            account_id,
            resync_interval_ms,
            base: None,
            last_attempt_ms: None,
        }
    }

    /// Session re-syncing on the configured `resync_interval_ms`.
    pub fn from_config(account_id: AccountId, config: &EngineConfig) -> Self {
        Self::new(account_id, config.resync_interval_ms)
    }

    pub fn with_base(mut self, base: TickerBase) -> Self {
        self.base = Some(base);
        self
    }

    pub fn base(&self) -> Option<&TickerBase> {
        self.base.as_ref()
    }

    pub fn is_due(&self, now_ms: i64) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.resync_interval_ms as i64,
        }
    }

    /// Pull a fresh base. Returns whether the base was replaced.
    ///
    /// Snapshots older than the current base are ignored.
    pub fn resync<F: SyncFeed + ?Sized>(&mut self, feed: &F, now_ms: i64) -> bool {
        self.last_attempt_ms = Some(now_ms);
        match feed.snapshot(&self.account_id, now_ms) {
            Ok(Some(snapshot)) => {
                if let Some(current) = &self.base {
                    if snapshot.timestamp_ms < current.base_timestamp_ms {
                        debug!(
                            "{}: ignoring snapshot at {} older than base at {}",
                            self.account_id, snapshot.timestamp_ms, current.base_timestamp_ms
                        );
                        return false;
                    }
                }
                self.base = Some(snapshot.into());
                true
            }
            Ok(None) => {
                debug!("{}: no authoritative data, keeping last base", self.account_id);
                false
            }
            Err(e) => {
                debug!("{}: sync failed ({}), keeping last base", self.account_id, e);
                false
            }
        }
    }

    /// Value to show at `now_ms`, or `None` before the first successful sync.
    pub fn display(&self, now_ms: i64) -> Option<ProjectedBalance> {
        self.base.as_ref().map(|base| project(now_ms, base))
    }

    /// Re-sync if due, then project.
    pub fn tick<F: SyncFeed + ?Sized>(
        &mut self,
        feed: &F,
        now_ms: i64,
    ) -> Option<ProjectedBalance> {
        if self.is_due(now_ms) {
            self.resync(feed, now_ms);
        }
        self.display(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Feed that replays scripted responses and counts calls.
    struct ScriptedFeed {
        responses: RefCell<Vec<Result<Option<SyncSnapshot>, StoreError>>>,
        calls: Cell<u32>,
    }

    impl ScriptedFeed {
        fn new(mut responses: Vec<Result<Option<SyncSnapshot>, StoreError>>) -> Self {
            responses.reverse();
            Self {
                responses: RefCell::new(responses),
                calls: Cell::new(0),
            }
        }
    }

    impl SyncFeed for ScriptedFeed {
        fn snapshot(&self, _: &AccountId, _: i64) -> Result<Option<SyncSnapshot>, StoreError> {
            self.calls.set(self.calls.get() + 1);
            self.responses.borrow_mut().pop().unwrap_or(Ok(None))
        }
    }

    fn snap(balance: u64, ts: i64) -> SyncSnapshot {
        SyncSnapshot {
            balance: MinorUnits::new(balance),
            timestamp_ms: ts,
            tiers: vec![Tier::unbounded(0, 365)],
        }
    }

    #[test]
    fn test_nothing_to_show_before_first_sync() {
        let feed = ScriptedFeed::new(vec![Ok(None)]);
        let mut session = TickerSession::new(AccountId::new("A"), 60_000);
        assert!(session.tick(&feed, 0).is_none());
    }

    #[test]
    fn test_resyncs_only_when_due() {
        let feed = ScriptedFeed::new(vec![
            Ok(Some(snap(10_000, 0))),
            Ok(Some(snap(20_000, 60_000))),
        ]);
        let mut session = TickerSession::new(AccountId::new("A"), 60_000);

        session.tick(&feed, 0);
        session.tick(&feed, 1_000);
        session.tick(&feed, 59_999);
        assert_eq!(feed.calls.get(), 1);

        let shown = session.tick(&feed, 60_000).unwrap();
        assert_eq!(feed.calls.get(), 2);
        assert_eq!(shown.whole_minor(), MinorUnits::new(20_000));
    }

    #[test]
    fn test_from_config_uses_configured_interval() {
        let config = EngineConfig {
            resync_interval_ms: 5_000,
            ..Default::default()
        };
        let feed = ScriptedFeed::new(vec![
            Ok(Some(snap(10_000, 0))),
            Ok(Some(snap(20_000, 5_000))),
        ]);
        let mut session = TickerSession::from_config(AccountId::new("A"), &config);

        session.tick(&feed, 0);
        session.tick(&feed, 4_999);
        assert_eq!(feed.calls.get(), 1);
        assert!(session.is_due(5_000));

        let shown = session.tick(&feed, 5_000).unwrap();
        assert_eq!(feed.calls.get(), 2);
        assert_eq!(shown.whole_minor(), MinorUnits::new(20_000));
    }

    #[test]
    fn test_failing_feed_keeps_last_projection() {
        let feed = ScriptedFeed::new(vec![
            Ok(Some(snap(10_000, 0))),
            Err(StoreError::Unavailable("timeout".to_string())),
        ]);
        let mut session = TickerSession::new(AccountId::new("A"), 60_000);
        session.tick(&feed, 0);

        let before = session.display(60_000).unwrap();
        let after = session.tick(&feed, 60_000).unwrap();
        assert_eq!(before, after);
        assert_eq!(session.base().unwrap().base_timestamp_ms, 0);
    }

    #[test]
    fn test_older_snapshot_is_ignored() {
        let feed = ScriptedFeed::new(vec![
            Ok(Some(snap(10_000, 120_000))),
            Ok(Some(snap(9_000, 60_000))),
        ]);
        let mut session = TickerSession::new(AccountId::new("A"), 60_000);
        assert!(session.resync(&feed, 120_000));
        assert!(!session.resync(&feed, 180_000));
        assert_eq!(session.base().unwrap().base_balance, MinorUnits::new(10_000));
    }

    #[test]
    fn test_projection_grows_between_syncs() {
        let session =
            TickerSession::new(AccountId::new("A"), 60_000).with_base(snap(1_000_000, 0).into());
        let a = session.display(10_000).unwrap();
        let b = session.display(20_000).unwrap();
        assert!(b > a);
    }
}
