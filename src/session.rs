//! Account service reporting
//!
//! The simulation never calls the account service from inside a tick. Final
//! stats and budget reconciliation are queued in a [`ReportOutbox`] and
//! flushed by the host between ticks; failed deliveries stay queued.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::Result;
use crate::sim::economy::MicroTokens;
use crate::sim::state::FinalStats;

/// Delivery attempts before a report is given up on
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Final result of one player's session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub account: String,
    pub stats: FinalStats,
}

/// Something the account service needs to hear about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Report {
    EndSession(SessionReport),
    /// Unconsumed room budget handed back on teardown
    RestoreRoomTokens { amount: MicroTokens },
}

/// External account service
pub trait AccountService {
    fn end_session(&mut self, report: &SessionReport) -> Result<()>;

    fn restore_room_tokens(&mut self, amount: MicroTokens) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Pending {
    report: Report,
    attempts: u32,
}

/// Outcome of one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub delivered: usize,
    /// Failed this time, still queued
    pub retrying: usize,
    /// Failed too often and dropped
    pub abandoned: usize,
}

/// Reports waiting for delivery
#[derive(Debug, Clone)]
pub struct ReportOutbox {
    pending: VecDeque<Pending>,
    max_attempts: u32,
}

impl Default for ReportOutbox {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl ReportOutbox {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            pending: VecDeque::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn push(&mut self, report: Report) {
        self.pending.push_back(Pending {
            report,
            attempts: 0,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.pending.iter().map(|p| &p.report)
    }

    /// Try to deliver everything queued, in order
    pub fn flush(&mut self, service: &mut dyn AccountService) -> FlushSummary {
        let mut summary = FlushSummary::default();
        let mut still_pending = VecDeque::with_capacity(self.pending.len());

        while let Some(mut pending) = self.pending.pop_front() {
            let result = match &pending.report {
                Report::EndSession(report) => service.end_session(report),
                Report::RestoreRoomTokens { amount } => service.restore_room_tokens(*amount),
            };

            match result {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    pending.attempts += 1;
                    if pending.attempts >= self.max_attempts {
                        log::error!(
                            "Giving up on {:?} after {} attempts: {}",
                            pending.report,
                            pending.attempts,
                            e
                        );
                        summary.abandoned += 1;
                    } else {
                        log::warn!("Report delivery failed (attempt {}): {}", pending.attempts, e);
                        summary.retrying += 1;
                        still_pending.push_back(pending);
                    }
                }
            }
        }

        self.pending = still_pending;
        summary
    }
}

/// Service that only logs; used by the headless driver
#[derive(Debug, Default)]
pub struct LoggingService {
    pub sessions_ended: usize,
    pub restored: MicroTokens,
}

impl AccountService for LoggingService {
    fn end_session(&mut self, report: &SessionReport) -> Result<()> {
        log::info!(
            "Session ended: {} ({}) rank={} score={} kills={} tokens={} dropped={}",
            report.stats.nickname,
            report.account,
            report.stats.rank,
            report.stats.score,
            report.stats.kills,
            report.stats.tokens,
            report.stats.dropped
        );
        self.sessions_ended += 1;
        Ok(())
    }

    fn restore_room_tokens(&mut self, amount: MicroTokens) -> Result<()> {
        log::info!("Restoring {} tokens to the pool", amount);
        self.restored += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::sim::SnakeId;
    use crate::sim::state::DeathCause;

    /// Fails the first `failures` calls
    #[derive(Default)]
    struct FlakyService {
        failures: u32,
        ended: Vec<SnakeId>,
        restored: MicroTokens,
    }

    impl AccountService for FlakyService {
        fn end_session(&mut self, report: &SessionReport) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(SimError::Service("unavailable".into()));
            }
            self.ended.push(report.stats.snake);
            Ok(())
        }

        fn restore_room_tokens(&mut self, amount: MicroTokens) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(SimError::Service("unavailable".into()));
            }
            self.restored += amount;
            Ok(())
        }
    }

    fn report(id: u64) -> Report {
        Report::EndSession(SessionReport {
            account: format!("acct-{id}"),
            stats: FinalStats {
                snake: SnakeId(id),
                nickname: format!("p{id}"),
                score: id,
                kills: 0,
                tokens: MicroTokens::ZERO,
                dropped: MicroTokens::ZERO,
                rank: 1,
                length: 3,
                survived_ticks: 10,
                cause: DeathCause::Left,
            },
        })
    }

    #[test]
    fn test_flush_delivers_in_order() {
        let mut outbox = ReportOutbox::default();
        outbox.push(report(1));
        outbox.push(report(2));
        outbox.push(Report::RestoreRoomTokens {
            amount: MicroTokens::from_tokens(7),
        });

        let mut service = FlakyService::default();
        let summary = outbox.flush(&mut service);
        assert_eq!(summary.delivered, 3);
        assert!(outbox.is_empty());
        assert_eq!(service.ended, vec![SnakeId(1), SnakeId(2)]);
        assert_eq!(service.restored, MicroTokens::from_tokens(7));
    }

    #[test]
    fn test_failed_reports_stay_queued() {
        let mut outbox = ReportOutbox::default();
        outbox.push(report(1));
        let mut service = FlakyService {
            failures: 1,
            ..Default::default()
        };

        let summary = outbox.flush(&mut service);
        assert_eq!(summary.retrying, 1);
        assert_eq!(outbox.len(), 1);

        let summary = outbox.flush(&mut service);
        assert_eq!(summary.delivered, 1);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_report_abandoned_after_max_attempts() {
        let mut outbox = ReportOutbox::new(2);
        outbox.push(report(1));
        let mut service = FlakyService {
            failures: 10,
            ..Default::default()
        };
        assert_eq!(outbox.flush(&mut service).retrying, 1);
        assert_eq!(outbox.flush(&mut service).abandoned, 1);
        assert!(outbox.is_empty());
    }
}
