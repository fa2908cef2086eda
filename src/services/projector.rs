//! Projects raw store subtrees into typed, defaulted view-models.
//!
//! The projector owns one subscription handle per subtree it mirrors and
//! never errors out of a change notification: a missing subtree projects to
//! defaults, a malformed field is logged with its path and defaulted. No
//! persistence of its own; every view-model is re-derived from the store.

use crate::models::feeder::{paths, FeedSignal, FeederStatus, UserSettings};
use crate::services::notifications::{self, NotificationFeed};
use crate::watch::{ChangeEvent, WatchHandle, WatchHub};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The published view-models consumed by the UI, scheduler, and aggregator.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub feeder: FeederStatus,
    pub settings: UserSettings,
    pub signal: FeedSignal,
    pub camera_ip: Option<String>,
    /// Scalar `pet/lastfed` timestamp driving the synthetic feed line.
    pub last_fed: Option<DateTime<Utc>>,
    pub notifications: NotificationFeed,
}

pub struct Projector {
    feeder: WatchHandle,
    settings: WatchHandle,
    signal: WatchHandle,
    camera: WatchHandle,
    status: WatchHandle,
    last_fed: WatchHandle,
    /// Cached raw `notifications/status` subtree so the feed can be rebuilt
    /// when either it or `pet/lastfed` changes.
    status_snapshot: Value,
    pub view: ViewState,
}

impl Projector {
    pub fn new(hub: &mut WatchHub) -> Self {
        Projector {
            feeder: hub.subscribe(paths::FEEDER),
            settings: hub.subscribe(paths::USER_SETTINGS),
            signal: hub.subscribe(paths::FEED_SIGNAL),
            camera: hub.subscribe(paths::CAMERA_IP),
            status: hub.subscribe(paths::NOTIFICATION_STATUS),
            last_fed: hub.subscribe(paths::LAST_FED),
            status_snapshot: Value::Null,
            view: ViewState::default(),
        }
    }

    pub fn owns(&self, handle: WatchHandle) -> bool {
        [
            self.feeder,
            self.settings,
            self.signal,
            self.camera,
            self.status,
            self.last_fed,
        ]
        .contains(&handle)
    }

    /// True when the event carries the feed signal; the scheduler must
    /// re-reconcile after these.
    pub fn is_signal(&self, handle: WatchHandle) -> bool {
        handle == self.signal
    }

    /// True when the event carries the camera address.
    pub fn is_camera(&self, handle: WatchHandle) -> bool {
        handle == self.camera
    }

    pub fn apply(&mut self, event: &ChangeEvent, now: DateTime<Utc>) {
        let h = event.handle;
        if h == self.feeder {
            self.view.feeder = decode_or_default(paths::FEEDER, &event.value);
        } else if h == self.settings {
            self.view.settings = decode_or_default(paths::USER_SETTINGS, &event.value);
        } else if h == self.signal {
            self.view.signal = decode_or_default(paths::FEED_SIGNAL, &event.value);
        } else if h == self.camera {
            self.view.camera_ip = match event.value.as_str() {
                Some(ip) if !ip.is_empty() => Some(ip.to_string()),
                _ => {
                    warn!("no camera address in store");
                    None
                }
            };
        } else if h == self.status {
            self.status_snapshot = event.value.clone();
            self.rebuild_notifications(now);
        } else if h == self.last_fed {
            self.view.last_fed = match event.value.as_str() {
                Some(raw) => match raw.parse::<DateTime<Utc>>() {
                    Ok(t) => Some(t),
                    Err(e) => {
                        warn!("{}: unparseable timestamp {:?}: {}", paths::LAST_FED, raw, e);
                        None
                    }
                },
                None => None,
            };
            self.rebuild_notifications(now);
        }
    }

    fn rebuild_notifications(&mut self, now: DateTime<Utc>) {
        self.view.notifications = notifications::rebuild(&self.status_snapshot, self.view.last_fed, now);
    }

    /// Release every subscription handle. Must run at owning-scope end.
    pub fn teardown(&mut self, hub: &mut WatchHub) {
        for h in [
            self.feeder,
            self.settings,
            self.signal,
            self.camera,
            self.status,
            self.last_fed,
        ] {
            hub.unsubscribe(h);
        }
    }
}

/// Decode a subtree snapshot, substituting the typed default on a missing
/// subtree or malformed content. The failing field's path is logged so a
/// bad write by another client is diagnosable.
fn decode_or_default<T: DeserializeOwned + Default>(path: &str, value: &Value) -> T {
    if value.is_null() {
        debug!("{}: subtree missing, using defaults", path);
        return T::default();
    }
    match serde_path_to_error::deserialize(value.clone()) {
        Ok(v) => v,
        Err(e) => {
            warn!("{}: malformed value at {}: {}", path, e.path(), e.inner());
            T::default()
        }
    }
}
