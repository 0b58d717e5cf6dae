//! Notification preference value types.
//!
//! [`EffectiveSettings`] is the resolved view of how one recipient wants to
//! hear about one group's updates, combining frequency, channels and content
//! filter with a provenance tag saying which tier supplied the values. It is
//! computed fresh on every resolution call and snapshotted into the job
//! payload at materialization time, never cached.

use serde::{Deserialize, Serialize};

use crate::channels::DeliveryChannel;

// ---------------------------------------------------------------------------
// NotificationFrequency
// ---------------------------------------------------------------------------

/// How often a recipient wants to receive a group's updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationFrequency {
    /// Deliver every update as it is shared.
    #[serde(rename = "every_update")]
    EveryUpdate,
    /// Batch into one daily digest.
    #[serde(rename = "daily_digest")]
    DailyDigest,
    /// Batch into one weekly digest.
    #[serde(rename = "weekly_digest")]
    WeeklyDigest,
    /// Only milestone updates, delivered as they happen.
    #[serde(rename = "milestones_only")]
    MilestonesOnly,
}

impl NotificationFrequency {
    /// String code for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationFrequency::EveryUpdate => "every_update",
            NotificationFrequency::DailyDigest => "daily_digest",
            NotificationFrequency::WeeklyDigest => "weekly_digest",
            NotificationFrequency::MilestonesOnly => "milestones_only",
        }
    }

    /// Parse from a stored string, defaulting to `EveryUpdate` for unknown
    /// values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "daily_digest" => NotificationFrequency::DailyDigest,
            "weekly_digest" => NotificationFrequency::WeeklyDigest,
            "milestones_only" => NotificationFrequency::MilestonesOnly,
            _ => NotificationFrequency::EveryUpdate,
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationType
// ---------------------------------------------------------------------------

/// What kind of notification a generation pass is producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationType {
    #[default]
    #[serde(rename = "immediate")]
    Immediate,
    #[serde(rename = "digest")]
    Digest,
    #[serde(rename = "milestone")]
    Milestone,
}

impl NotificationType {
    /// String code for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Immediate => "immediate",
            NotificationType::Digest => "digest",
            NotificationType::Milestone => "milestone",
        }
    }

    /// Parse from a stored string, defaulting to `Immediate`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "digest" => NotificationType::Digest,
            "milestone" => NotificationType::Milestone,
            _ => NotificationType::Immediate,
        }
    }
}

// ---------------------------------------------------------------------------
// UrgencyLevel
// ---------------------------------------------------------------------------

/// Urgency of an update. `Urgent` can break through an active mute unless
/// the recipient opted out of that behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UrgencyLevel {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "urgent")]
    Urgent,
    #[serde(rename = "low")]
    Low,
}

impl UrgencyLevel {
    /// String code for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Normal => "normal",
            UrgencyLevel::Urgent => "urgent",
            UrgencyLevel::Low => "low",
        }
    }

    /// Parse from a stored string, defaulting to `Normal`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "urgent" => UrgencyLevel::Urgent,
            "low" => UrgencyLevel::Low,
            _ => UrgencyLevel::Normal,
        }
    }
}

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// Kinds of update content a recipient can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "photos")]
    Photos,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "milestones")]
    Milestones,
}

/// Content filter applied when a membership specifies none: everything.
pub fn default_content_types() -> Vec<ContentType> {
    vec![
        ContentType::Photos,
        ContentType::Text,
        ContentType::Milestones,
    ]
}

// ---------------------------------------------------------------------------
// EffectiveSettings
// ---------------------------------------------------------------------------

/// Which preference tier supplied the resolved values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingsSource {
    /// The membership row carried its own overrides.
    #[serde(rename = "member_override")]
    MemberOverride,
    /// The group's defaults filled in the gaps.
    #[serde(rename = "group_default")]
    GroupDefault,
    /// No membership row existed; hardcoded defaults.
    #[serde(rename = "system_default")]
    SystemDefault,
}

/// The resolved notification settings for one recipient in one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub frequency: NotificationFrequency,
    pub channels: Vec<DeliveryChannel>,
    pub content_types: Vec<ContentType>,
    pub source: SettingsSource,
}

impl EffectiveSettings {
    /// The hardcoded bottom tier, used when no membership row exists or
    /// every lookup failed.
    pub fn system_default() -> Self {
        Self {
            frequency: NotificationFrequency::EveryUpdate,
            channels: vec![DeliveryChannel::Email],
            content_types: default_content_types(),
            source: SettingsSource::SystemDefault,
        }
    }
}

// ---------------------------------------------------------------------------
// MuteSettings
// ---------------------------------------------------------------------------

/// Settings scoped to an active mute.
///
/// `preserve_urgent` defaults to `true`: urgent updates break through a
/// mute unless the recipient explicitly disabled that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteSettings {
    #[serde(default = "default_preserve_urgent")]
    pub preserve_urgent: bool,
}

impl Default for MuteSettings {
    fn default() -> Self {
        Self {
            preserve_urgent: true,
        }
    }
}

fn default_preserve_urgent() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_from_str_defaults_to_every_update() {
        assert_eq!(
            NotificationFrequency::from_str("fortnightly"),
            NotificationFrequency::EveryUpdate
        );
        assert_eq!(
            NotificationFrequency::from_str("weekly_digest"),
            NotificationFrequency::WeeklyDigest
        );
    }

    #[test]
    fn system_default_settings() {
        let settings = EffectiveSettings::system_default();
        assert_eq!(settings.frequency, NotificationFrequency::EveryUpdate);
        assert_eq!(settings.channels, vec![DeliveryChannel::Email]);
        assert_eq!(settings.content_types, default_content_types());
        assert_eq!(settings.source, SettingsSource::SystemDefault);
    }

    #[test]
    fn mute_settings_preserve_urgent_defaults_true() {
        let parsed: MuteSettings = serde_json::from_str("{}").unwrap();
        assert!(parsed.preserve_urgent);

        let parsed: MuteSettings = serde_json::from_str("{\"preserve_urgent\": false}").unwrap();
        assert!(!parsed.preserve_urgent);
    }

    #[test]
    fn effective_settings_deserializes_from_authority_payload() {
        let payload = serde_json::json!({
            "frequency": "weekly_digest",
            "channels": ["email", "sms"],
            "content_types": ["photos", "milestones"],
            "source": "member_override",
        });
        let settings: EffectiveSettings = serde_json::from_value(payload).unwrap();
        assert_eq!(settings.frequency, NotificationFrequency::WeeklyDigest);
        assert_eq!(
            settings.channels,
            vec![DeliveryChannel::Email, DeliveryChannel::Sms]
        );
        assert_eq!(settings.source, SettingsSource::MemberOverride);
    }
}
