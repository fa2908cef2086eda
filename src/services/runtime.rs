//! Wires store, watch hub, and components into one cooperative loop.
//!
//! Everything runs on a single thread: poll the store, route change events
//! through the projector, let the scheduler reconcile and fire, advance the
//! stream supervisor, sleep the remainder of the cadence. No failure escapes
//! the loop; every component owns its own fallback.

use crate::services::commands::CommandDispatcher;
use crate::services::projector::Projector;
use crate::services::scheduler::AutoFeedScheduler;
use crate::services::stream::StreamSupervisor;
use crate::store::StoreBackend;
use crate::watch::WatchHub;
use chrono::{DateTime, Utc};
use std::thread;
use std::time::{Duration, Instant};

pub struct Runtime {
    pub hub: WatchHub,
    pub projector: Projector,
    pub scheduler: AutoFeedScheduler,
    pub dispatcher: CommandDispatcher,
    pub stream: StreamSupervisor,
}

impl Runtime {
    pub fn new() -> Self {
        let mut hub = WatchHub::new();
        let projector = Projector::new(&mut hub);
        Runtime {
            hub,
            projector,
            scheduler: AutoFeedScheduler::new(),
            dispatcher: CommandDispatcher::new(),
            stream: StreamSupervisor::new(),
        }
    }

    /// One pass of the event loop at time `now`.
    ///
    /// Events are routed in store order per subtree; nothing is assumed
    /// about ordering across subtrees. The scheduler only ever observes the
    /// reconciled feed signal coming back from the store, never local
    /// optimistic state.
    pub fn step(&mut self, store: &dyn StoreBackend, now: DateTime<Utc>) {
        for event in self.hub.poll(store) {
            if !self.projector.owns(event.handle) {
                continue;
            }
            self.projector.apply(&event, now);
            if self.projector.is_signal(event.handle) {
                self.scheduler.observe(&self.projector.view.signal, now);
            } else if self.projector.is_camera(event.handle) {
                if let Some(ip) = &self.projector.view.camera_ip {
                    self.stream.set_address(ip);
                }
            }
        }

        // Portion size is sampled at fire time, not frozen at arm time.
        let portion = self.projector.view.signal.portion_size;
        let dispatcher = &self.dispatcher;
        self.scheduler
            .tick(now, portion, &mut |p| dispatcher.record_feed(store, p, now));

        self.stream.tick(now);
    }

    /// Steady-cadence loop: each iteration takes at least `interval`
    /// regardless of how long the store round-trips took.
    pub fn run_loop(&mut self, store: &dyn StoreBackend, interval: Duration) {
        loop {
            let tick_start = Instant::now();
            self.step(store, Utc::now());

            let elapsed = tick_start.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
    }

    /// Release every subscription and cancel any live timer. Leaked handles
    /// or timers beyond this point are defects.
    pub fn teardown(&mut self) {
        self.projector.teardown(&mut self.hub);
        self.scheduler.shutdown();
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}
