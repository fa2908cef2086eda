//! Issues idempotent, timestamped commands to the store.
//!
//! All commands are best-effort: a failed write is surfaced to the caller
//! and never retried here, and nothing is rolled back.

use crate::models::feeder::{paths, FeedSignal, ManualFeedCommand, PortionSize, UserSettings};
use crate::store::{StoreBackend, StoreError};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{debug, info};
use serde_json::{json, Value};

/// Tracks whether a manual feed command from this client instance is still
/// inside its modeled dispense window.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    in_flight_until: Option<DateTime<Utc>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        CommandDispatcher::default()
    }

    /// True while the previous manual feed's dispense window is open. The
    /// window is a local wall-clock estimate, not a device confirmation.
    pub fn is_in_flight(&self, now: DateTime<Utc>) -> bool {
        matches!(self.in_flight_until, Some(until) if now < until)
    }

    /// Write a manual feed command, unless one is already in flight — then
    /// this is a no-op returning `Ok(false)` with no store write. The
    /// command subtree is overwritten wholesale; a superseded command is not
    /// guaranteed delivery to the device.
    pub fn send_manual_feed(
        &mut self,
        store: &dyn StoreBackend,
        portion: PortionSize,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if self.is_in_flight(now) {
            debug!("manual feed suppressed: previous command still dispensing");
            return Ok(false);
        }

        let cmd = ManualFeedCommand {
            portion_size: portion,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            is_feeding: true,
        };
        store.write(paths::MANUAL_FEED, &serde_json::to_value(&cmd)?)?;
        self.in_flight_until = Some(now + Duration::milliseconds(portion.dispense_duration_ms() as i64));
        info!("manual feed issued ({} portion)", portion.label());
        Ok(true)
    }

    /// Flip the device flash. Writes only `feeder/flash`; the rest of the
    /// feeder subtree is device-owned.
    pub fn toggle_flash(&self, store: &dyn StoreBackend, current: bool) -> Result<bool, StoreError> {
        let next = !current;
        store.write(paths::FEEDER_FLASH, &Value::Bool(next))?;
        info!("flash turned {}", if next { "on" } else { "off" });
        Ok(next)
    }

    /// Persist user settings and mirror them into the feed signal.
    ///
    /// Two writes against distinct subtrees; the store exposes no multi-key
    /// transaction, so a failure after the first leaves the two subtrees
    /// inconsistent until the next successful save.
    pub fn save_settings(
        &self,
        store: &dyn StoreBackend,
        enabled: bool,
        interval_ms: u64,
        portion: PortionSize,
    ) -> Result<(), StoreError> {
        let settings = UserSettings {
            enabled,
            interval: interval_ms,
            portion_size: portion,
        };
        store.write(paths::USER_SETTINGS, &serde_json::to_value(settings)?)?;

        let signal = FeedSignal {
            enabled,
            interval: interval_ms,
            portion_size: portion,
        };
        store.merge(paths::FEED_SIGNAL, &serde_json::to_value(signal)?)?;

        info!(
            "settings saved (enabled={}, interval={}ms, portion={})",
            enabled,
            interval_ms,
            portion.label()
        );
        Ok(())
    }

    /// The feed action shared by scheduler fires and the manual flow:
    /// report the feeding on `notifications/status` and append an event
    /// entry there keyed by the current time, the same way the device does.
    ///
    /// The firmware reads `portionSize` here in string form; this is the
    /// only place the string encoding is produced.
    pub fn record_feed(
        &self,
        store: &dyn StoreBackend,
        portion: PortionSize,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        store.merge(
            paths::NOTIFICATION_STATUS,
            &json!({ "lastFed": stamp, "portionSize": portion.label() }),
        )?;
        store.write(
            &format!("{}/{}", paths::NOTIFICATION_STATUS, now.timestamp_millis()),
            &json!({ "portionSize": portion.label(), "lastFed": stamp }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryStore;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn manual_feed_writes_command_subtree() {
        let store = MemoryStore::new();
        let mut d = CommandDispatcher::new();
        assert!(d.send_manual_feed(&store, PortionSize::Medium, at_noon()).unwrap());

        let cmd = store.value_at("manual_feed");
        assert_eq!(cmd["portionSize"], 2);
        assert_eq!(cmd["isFeeding"], true);
        assert_eq!(cmd["timestamp"], "2026-01-02T12:00:00.000Z");
    }

    #[test]
    fn second_feed_inside_window_is_a_no_op() {
        let store = MemoryStore::new();
        let mut d = CommandDispatcher::new();
        let t0 = at_noon();

        assert!(d.send_manual_feed(&store, PortionSize::Medium, t0).unwrap());
        // Medium models a 4000ms dispense; 3999ms in is still in flight.
        let blocked = d
            .send_manual_feed(&store, PortionSize::Medium, t0 + Duration::milliseconds(3999))
            .unwrap();
        assert!(!blocked);
        assert_eq!(store.mutation_count("manual_feed"), 1);

        // After the window a new command goes out.
        assert!(d
            .send_manual_feed(&store, PortionSize::Medium, t0 + Duration::milliseconds(4000))
            .unwrap());
        assert_eq!(store.mutation_count("manual_feed"), 2);
    }

    #[test]
    fn dispense_window_depends_on_portion() {
        let store = MemoryStore::new();
        let mut d = CommandDispatcher::new();
        let t0 = at_noon();

        d.send_manual_feed(&store, PortionSize::Small, t0).unwrap();
        assert!(d.is_in_flight(t0 + Duration::milliseconds(1999)));
        assert!(!d.is_in_flight(t0 + Duration::milliseconds(2000)));

        let t1 = t0 + Duration::seconds(10);
        d.send_manual_feed(&store, PortionSize::Large, t1).unwrap();
        assert!(d.is_in_flight(t1 + Duration::milliseconds(5999)));
        assert!(!d.is_in_flight(t1 + Duration::milliseconds(6000)));
    }

    #[test]
    fn toggle_flash_writes_only_the_flash_field() {
        let store = MemoryStore::new();
        store.seed("feeder", serde_json::json!({ "enabled": true, "flash": false }));
        let d = CommandDispatcher::new();

        assert!(d.toggle_flash(&store, false).unwrap());
        assert_eq!(store.value_at("feeder/flash"), serde_json::json!(true));
        assert_eq!(store.value_at("feeder/enabled"), serde_json::json!(true));
    }

    #[test]
    fn save_settings_writes_both_subtrees() {
        let store = MemoryStore::new();
        let d = CommandDispatcher::new();
        d.save_settings(&store, true, 5000, PortionSize::Medium).unwrap();

        let expected = serde_json::json!({ "enabled": true, "interval": 5000, "portionSize": 2 });
        assert_eq!(store.value_at("settings/userSettings"), expected);
        assert_eq!(store.value_at("feed"), expected);
    }

    #[test]
    fn save_settings_partial_failure_leaves_first_write() {
        struct MergeFails(MemoryStore);
        impl StoreBackend for MergeFails {
            fn read(&self, path: &str) -> Result<Value, StoreError> {
                self.0.read(path)
            }
            fn write(&self, path: &str, value: &Value) -> Result<(), StoreError> {
                self.0.write(path, value)
            }
            fn merge(&self, _path: &str, _value: &Value) -> Result<(), StoreError> {
                Err(StoreError::Transport("connection reset".into()))
            }
            fn remove(&self, path: &str) -> Result<(), StoreError> {
                self.0.remove(path)
            }
        }

        let store = MergeFails(MemoryStore::new());
        let d = CommandDispatcher::new();
        let err = d.save_settings(&store, false, 1000, PortionSize::Small).unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
        // No rollback: userSettings kept its new value, feed was never touched.
        assert_eq!(store.0.value_at("settings/userSettings")["enabled"], false);
        assert_eq!(store.0.value_at("feed"), Value::Null);
    }

    #[test]
    fn record_feed_uses_string_label_at_the_hardware_boundary() {
        let store = MemoryStore::new();
        let d = CommandDispatcher::new();
        let now = at_noon();
        d.record_feed(&store, PortionSize::Medium, now).unwrap();

        let status = store.value_at("notifications/status");
        assert_eq!(status["portionSize"], "Medium");
        assert_eq!(status["lastFed"], "2026-01-02T12:00:00.000Z");

        let entry = store.value_at(&format!("notifications/status/{}", now.timestamp_millis()));
        assert_eq!(
            entry,
            serde_json::json!({ "portionSize": "Medium", "lastFed": "2026-01-02T12:00:00.000Z" })
        );
    }
}
