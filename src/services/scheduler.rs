//! Auto-feed scheduler: one recurring timer derived from the remote feed
//! signal.
//!
//! The scheduler trusts the reconciled `feed` subtree as ground truth. A
//! local UI toggle only takes effect once its settings save has round-tripped
//! through the store and come back as a change notification; nothing here is
//! driven by optimistic local state.

use crate::models::feeder::{FeedSignal, PortionSize};
use crate::store::StoreError;
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchedulerState {
    /// No local timer.
    Idle,
    /// A timer is running, bound to the interval it was armed with.
    Armed {
        interval_ms: u64,
        next_fire_at: DateTime<Utc>,
    },
}

pub struct AutoFeedScheduler {
    state: SchedulerState,
    timers_created: u32,
    timers_cancelled: u32,
}

impl AutoFeedScheduler {
    pub fn new() -> Self {
        AutoFeedScheduler {
            state: SchedulerState::Idle,
            timers_created: 0,
            timers_cancelled: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, SchedulerState::Armed { .. })
    }

    pub fn timers_created(&self) -> u32 {
        self.timers_created
    }

    pub fn timers_cancelled(&self) -> u32 {
        self.timers_cancelled
    }

    /// Timers currently live; anything other than 0 or 1 is a bug.
    pub fn active_timers(&self) -> u32 {
        self.timers_created - self.timers_cancelled
    }

    /// Reconcile against a store-confirmed feed signal.
    ///
    /// An interval-only change while armed leaves the running timer on its
    /// original cadence; re-arming at the new interval requires an
    /// enabled false→true cycle. That asymmetry is intentional, preserved
    /// from the device's established behavior.
    pub fn observe(&mut self, signal: &FeedSignal, now: DateTime<Utc>) {
        match self.state {
            SchedulerState::Idle if signal.enabled => {
                self.state = SchedulerState::Armed {
                    interval_ms: signal.interval,
                    next_fire_at: now + Duration::milliseconds(signal.interval as i64),
                };
                self.timers_created += 1;
                info!("auto-feed armed (interval={}ms)", signal.interval);
            }
            SchedulerState::Armed { .. } if !signal.enabled => {
                self.state = SchedulerState::Idle;
                self.timers_cancelled += 1;
                info!("auto-feed disarmed");
            }
            SchedulerState::Armed { interval_ms, .. } if interval_ms != signal.interval => {
                debug!(
                    "interval changed {}ms -> {}ms while armed; keeping current timer",
                    interval_ms, signal.interval
                );
            }
            _ => {}
        }
    }

    /// Fire the feed action if the deadline has passed. At most one fire per
    /// tick; the next deadline advances from the previous one, not from
    /// `now`, so the cadence does not drift. A zero interval fires again on
    /// every tick — that is the literal configured behavior, not guarded.
    ///
    /// The portion size is the caller's current selection at fire time; a
    /// failed feed write is logged and the cadence continues.
    pub fn tick(
        &mut self,
        now: DateTime<Utc>,
        portion: PortionSize,
        feed: &mut dyn FnMut(PortionSize) -> Result<(), StoreError>,
    ) -> bool {
        if let SchedulerState::Armed {
            interval_ms,
            next_fire_at,
        } = self.state
        {
            if now >= next_fire_at {
                if let Err(e) = feed(portion) {
                    error!("scheduled feed failed: {}", e);
                }
                self.state = SchedulerState::Armed {
                    interval_ms,
                    next_fire_at: next_fire_at + Duration::milliseconds(interval_ms as i64),
                };
                return true;
            }
        }
        false
    }

    /// Cancel any live timer. Must run at owning-scope teardown; a timer
    /// outliving its scope is a leak.
    pub fn shutdown(&mut self) {
        if self.is_armed() {
            self.state = SchedulerState::Idle;
            self.timers_cancelled += 1;
            info!("auto-feed timer cancelled at teardown");
        }
    }
}

impl Default for AutoFeedScheduler {
    fn default() -> Self {
        AutoFeedScheduler::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap()
    }

    fn signal(enabled: bool, interval: u64) -> FeedSignal {
        FeedSignal {
            enabled,
            interval,
            portion_size: PortionSize::Small,
        }
    }

    #[test]
    fn enable_cycle_creates_and_cancels_exactly_one_timer() {
        let mut s = AutoFeedScheduler::new();
        let now = at_noon();

        s.observe(&signal(false, 5000), now);
        assert!(!s.is_armed());

        s.observe(&signal(true, 5000), now);
        assert!(s.is_armed());
        assert_eq!(s.timers_created(), 1);

        s.observe(&signal(false, 5000), now);
        assert!(!s.is_armed());
        assert_eq!(s.timers_created(), 1);
        assert_eq!(s.timers_cancelled(), 1);
        assert_eq!(s.active_timers(), 0);
    }

    #[test]
    fn repeated_enabled_signal_does_not_stack_timers() {
        let mut s = AutoFeedScheduler::new();
        let now = at_noon();
        s.observe(&signal(true, 5000), now);
        s.observe(&signal(true, 5000), now + Duration::seconds(1));
        assert_eq!(s.timers_created(), 1);
    }

    #[test]
    fn interval_only_change_keeps_running_timer() {
        let mut s = AutoFeedScheduler::new();
        let now = at_noon();
        s.observe(&signal(true, 5000), now);
        let armed_at = s.state();

        s.observe(&signal(true, 9000), now + Duration::seconds(1));
        assert_eq!(s.state(), armed_at);
        assert_eq!(s.timers_created(), 1);

        // A full disable/enable cycle picks up the new interval.
        s.observe(&signal(false, 9000), now + Duration::seconds(2));
        let rearm_at = now + Duration::seconds(3);
        s.observe(&signal(true, 9000), rearm_at);
        assert_eq!(
            s.state(),
            SchedulerState::Armed {
                interval_ms: 9000,
                next_fire_at: rearm_at + Duration::milliseconds(9000),
            }
        );
    }

    #[test]
    fn fires_with_the_portion_current_at_fire_time() {
        let mut s = AutoFeedScheduler::new();
        let t0 = at_noon();
        s.observe(&signal(true, 1000), t0);

        let mut fired = Vec::new();
        for (i, portion) in [PortionSize::Small, PortionSize::Large, PortionSize::Medium]
            .iter()
            .enumerate()
        {
            let now = t0 + Duration::milliseconds(1000 * (i as i64 + 1));
            let did = s.tick(now, *portion, &mut |p| {
                fired.push(p);
                Ok(())
            });
            assert!(did);
        }
        assert_eq!(fired, vec![PortionSize::Small, PortionSize::Large, PortionSize::Medium]);
    }

    #[test]
    fn does_not_fire_before_the_deadline() {
        let mut s = AutoFeedScheduler::new();
        let t0 = at_noon();
        s.observe(&signal(true, 5000), t0);

        let mut count = 0;
        let fired = s.tick(t0 + Duration::milliseconds(4999), PortionSize::Small, &mut |_| {
            count += 1;
            Ok(())
        });
        assert!(!fired);
        assert_eq!(count, 0);
    }

    #[test]
    fn cadence_advances_from_the_deadline_not_from_now() {
        let mut s = AutoFeedScheduler::new();
        let t0 = at_noon();
        s.observe(&signal(true, 5000), t0);

        // Fire late: the next deadline is still anchored to the schedule.
        let late = t0 + Duration::milliseconds(5700);
        assert!(s.tick(late, PortionSize::Small, &mut |_| Ok(())));
        assert_eq!(
            s.state(),
            SchedulerState::Armed {
                interval_ms: 5000,
                next_fire_at: t0 + Duration::milliseconds(10000),
            }
        );
    }

    #[test]
    fn feed_failure_keeps_the_cadence() {
        let mut s = AutoFeedScheduler::new();
        let t0 = at_noon();
        s.observe(&signal(true, 1000), t0);

        let fired = s.tick(t0 + Duration::milliseconds(1000), PortionSize::Small, &mut |_| {
            Err(StoreError::Transport("down".into()))
        });
        assert!(fired);
        assert!(s.is_armed());
        // Next fire still comes due.
        assert!(s.tick(t0 + Duration::milliseconds(2000), PortionSize::Small, &mut |_| Ok(())));
    }

    #[test]
    fn zero_interval_fires_every_tick() {
        let mut s = AutoFeedScheduler::new();
        let t0 = at_noon();
        s.observe(&signal(true, 0), t0);

        let mut count = 0;
        for i in 0..3 {
            s.tick(t0 + Duration::milliseconds(i), PortionSize::Small, &mut |_| {
                count += 1;
                Ok(())
            });
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn shutdown_cancels_a_live_timer() {
        let mut s = AutoFeedScheduler::new();
        s.observe(&signal(true, 5000), at_noon());
        s.shutdown();
        assert!(!s.is_armed());
        assert_eq!(s.active_timers(), 0);

        // Idle shutdown is a no-op.
        s.shutdown();
        assert_eq!(s.timers_cancelled(), 1);
    }
}
