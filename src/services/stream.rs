//! Supervises liveness of the live video feed.
//!
//! The stream itself is an opaque external service at `http://<cameraIp>`;
//! connectivity is re-derived from the hosting view's load/error callbacks.
//! On error the supervisor flips to disconnected and schedules exactly one
//! retry after a fixed delay, then flips back optimistically — it does not
//! verify the retry succeeded. No backoff, no retry cap: repeated failures
//! are repeated independent single-shot retries.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

pub const RETRY_DELAY_MS: i64 = 5000;

pub struct StreamSupervisor {
    url: Option<String>,
    connected: bool,
    retry_at: Option<DateTime<Utc>>,
}

impl StreamSupervisor {
    pub fn new() -> Self {
        StreamSupervisor {
            url: None,
            connected: true,
            retry_at: None,
        }
    }

    /// Target URL, available once the camera address has been projected.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn has_pending_retry(&self) -> bool {
        self.retry_at.is_some()
    }

    pub fn set_address(&mut self, camera_ip: &str) {
        self.url = Some(format!("http://{}", camera_ip));
    }

    /// Transport error from the stream view. An already pending retry is
    /// kept rather than pushed out.
    pub fn on_error(&mut self, now: DateTime<Utc>) {
        self.connected = false;
        if self.retry_at.is_none() {
            self.retry_at = Some(now + Duration::milliseconds(RETRY_DELAY_MS));
            warn!("stream error; retrying in {}ms", RETRY_DELAY_MS);
        }
    }

    /// Successful load event from the stream view.
    pub fn on_load_end(&mut self) {
        self.connected = true;
        self.retry_at = None;
    }

    /// Run the pending retry if it has come due; connectivity flips back
    /// optimistically and the next load/error event settles it.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if let Some(at) = self.retry_at {
            if now >= at {
                self.connected = true;
                self.retry_at = None;
                info!("stream retry window elapsed; reconnecting");
            }
        }
    }
}

impl Default for StreamSupervisor {
    fn default() -> Self {
        StreamSupervisor::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn address_builds_plain_http_url() {
        let mut s = StreamSupervisor::new();
        assert_eq!(s.url(), None);
        s.set_address("192.168.1.42");
        assert_eq!(s.url(), Some("http://192.168.1.42"));
    }

    #[test]
    fn error_schedules_exactly_one_retry() {
        let mut s = StreamSupervisor::new();
        let t0 = at_noon();

        s.on_error(t0);
        assert!(!s.is_connected());
        assert!(s.has_pending_retry());

        // A second error inside the window keeps the original deadline.
        s.on_error(t0 + Duration::milliseconds(1000));
        s.tick(t0 + Duration::milliseconds(4999));
        assert!(!s.is_connected());

        s.tick(t0 + Duration::milliseconds(5000));
        assert!(s.is_connected());
        assert!(!s.has_pending_retry());
    }

    #[test]
    fn load_end_confirms_and_clears_retry() {
        let mut s = StreamSupervisor::new();
        let t0 = at_noon();
        s.on_error(t0);
        s.on_load_end();
        assert!(s.is_connected());
        assert!(!s.has_pending_retry());

        // The cleared retry never fires.
        s.tick(t0 + Duration::milliseconds(6000));
        assert!(s.is_connected());
    }

    #[test]
    fn repeated_failures_are_independent_single_shots() {
        let mut s = StreamSupervisor::new();
        let t0 = at_noon();

        for round in 0..3 {
            let base = t0 + Duration::milliseconds(round * 10_000);
            s.on_error(base);
            assert!(!s.is_connected());
            s.tick(base + Duration::milliseconds(RETRY_DELAY_MS));
            assert!(s.is_connected());
        }
    }
}
