//! Typed views of the shared-store subtrees.
//!
//! Scope: types only — no store client code.
//!
//! Notes
//! - Every subtree is partially structured: fields may be missing or carry a
//!   legacy encoding, so all decoding is lenient and default-filling.
//! - `portionSize` appears on the wire both as an integer (1..3) and as a
//!   legacy string (`"Small"`/`"Medium"`/`"Large"`); it is normalized to the
//!   integer enum at the decode boundary and only re-encoded as a string at
//!   the hardware-facing write boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store subtree paths, shared between client and device firmware.
pub mod paths {
    pub const FEEDER: &str = "feeder";
    pub const FEEDER_FLASH: &str = "feeder/flash";
    pub const USER_SETTINGS: &str = "settings/userSettings";
    pub const FEED_SIGNAL: &str = "feed";
    pub const MANUAL_FEED: &str = "manual_feed";
    pub const CAMERA_IP: &str = "camera/ip";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const NOTIFICATION_STATUS: &str = "notifications/status";
    pub const LAST_FED: &str = "pet/lastfed";
}

// =====================
// Portion size
// =====================

/// Canonical portion size. Integer encoding on the wire is 1/2/3; the legacy
/// string encoding is accepted on decode and mapped `{Small→1, Medium→2,
/// Large→3, anything else→1}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum PortionSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl PortionSize {
    pub fn as_int(self) -> i64 {
        match self {
            PortionSize::Small => 1,
            PortionSize::Medium => 2,
            PortionSize::Large => 3,
        }
    }

    /// Hardware-facing string label, used only at the write boundary for
    /// subtrees the firmware reads in string form.
    pub fn label(self) -> &'static str {
        match self {
            PortionSize::Small => "Small",
            PortionSize::Medium => "Medium",
            PortionSize::Large => "Large",
        }
    }

    /// Modeled physical dispensing time. Not device-confirmed; this is the
    /// optimistic local estimate used to debounce manual feed commands.
    pub fn dispense_duration_ms(self) -> u64 {
        match self {
            PortionSize::Small => 2000,
            PortionSize::Medium => 4000,
            PortionSize::Large => 6000,
        }
    }

    fn from_int(n: i64) -> Self {
        match n {
            2 => PortionSize::Medium,
            3 => PortionSize::Large,
            _ => PortionSize::Small,
        }
    }

    fn from_label(s: &str) -> Self {
        match s {
            "Medium" => PortionSize::Medium,
            "Large" => PortionSize::Large,
            _ => PortionSize::Small,
        }
    }
}

impl Serialize for PortionSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.as_int())
    }
}

impl<'de> Deserialize<'de> for PortionSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = PortionSize;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "a portion size as integer 1..3 or string Small/Medium/Large")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(PortionSize::from_int(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(PortionSize::from_int(value as i64))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(PortionSize::from_int(value as i64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(PortionSize::from_label(value))
            }
        }
        deserializer.deserialize_any(V)
    }
}

// =====================
// Subtree entities
// =====================

/// `feeder` — device-owned status. The client writes `feeder/flash` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeederStatus {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub flash: bool,
}

/// `settings/userSettings` — the user-facing settings record. Last writer
/// wins; overwritten wholesale on every save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Auto-feed interval in milliseconds. Zero is accepted as configured.
    #[serde(default)]
    pub interval: u64,
    #[serde(default)]
    pub portion_size: PortionSize,
}

/// `feed` — the subtree that actually drives scheduled feeding. Kept
/// eventually consistent with [`UserSettings`] by the save operation; the
/// scheduler treats this subtree, not the local UI state, as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSignal {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub interval: u64,
    #[serde(default)]
    pub portion_size: PortionSize,
}

/// `manual_feed` — ephemeral, overwritten per command. The device consumes
/// it opportunistically; a superseded command is not guaranteed delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualFeedCommand {
    pub portion_size: PortionSize,
    /// ISO-8601 issue time.
    pub timestamp: String,
    pub is_feeding: bool,
}

/// Object-shaped entry under `notifications/status`, reported by the device
/// (or the feed action) after a feeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    #[serde(default)]
    pub portion_size: PortionSize,
    #[serde(default)]
    pub last_fed: Option<DateTime<Utc>>,
}
