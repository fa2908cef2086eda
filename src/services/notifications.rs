//! Aggregates device-reported feed events into the human-readable
//! notification feed with an unread count.

use crate::models::feeder::{paths, FeedEvent};
use crate::store::{StoreBackend, StoreError};
use crate::utils::{format_event_time, format_relative};
use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value;

/// Keys with this prefix are counted as already acknowledged. Nothing in the
/// client writes it; the device-side acknowledgment flow is only partially
/// wired, so the prefix is honored when counting and never produced here.
pub const READ_PREFIX: &str = "read_";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFeed {
    pub list: Vec<String>,
    pub unread_count: usize,
}

/// Rebuild the feed from the raw `notifications/status` subtree.
///
/// Entries are taken in store enumeration order; keys are time-derived but
/// not guaranteed strictly chronological, and no reordering is attempted.
/// Scalar children (the merged `lastFed`/`portionSize` fields themselves)
/// are skipped; only object-shaped entries describe feedings.
///
/// The trailing "Last fed" line comes from the separate `pet/lastfed`
/// scalar and is not deduplicated against entries describing the same
/// feeding, so it can visually repeat one of them.
pub fn rebuild(entries: &Value, last_fed: Option<DateTime<Utc>>, now: DateTime<Utc>) -> NotificationFeed {
    let mut list = Vec::new();
    let mut unread_count = 0;

    if let Some(map) = entries.as_object() {
        for (key, entry) in map {
            if !entry.is_object() {
                continue;
            }
            let event: FeedEvent = match serde_json::from_value(entry.clone()) {
                Ok(e) => e,
                Err(e) => {
                    warn!("notification entry {}: malformed, using defaults: {}", key, e);
                    FeedEvent::default()
                }
            };
            let when = match event.last_fed {
                Some(t) => format_event_time(t),
                None => "an unknown time".to_string(),
            };
            list.push(format!("Feeding {} portion on {}", event.portion_size.label(), when));
            if !key.starts_with(READ_PREFIX) {
                unread_count += 1;
            }
        }
    }

    if let Some(t) = last_fed {
        list.push(format!("Last fed: {}", format_relative(t, now)));
    }

    NotificationFeed { list, unread_count }
}

/// Delete the whole notification subtree in one write and reset the local
/// feed without waiting for the store's echo.
pub fn clear(store: &dyn StoreBackend, feed: &mut NotificationFeed) -> Result<(), StoreError> {
    store.remove(paths::NOTIFICATIONS)?;
    feed.list.clear();
    feed.unread_count = 0;
    Ok(())
}
