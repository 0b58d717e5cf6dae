//! Effective-settings resolution.
//!
//! Three tiers, most specific wins: the membership's own overrides, the
//! group's defaults, then the hardcoded system default. The authority
//! computes the whole fallback server-side in one call; this module only
//! joins rows manually when that call errors or has no answer.
//! Resolution never fails and never caches, so the answer always
//! reflects membership state at the moment of use.

use std::sync::Arc;

use tribe_core::channels::DeliveryChannel;
use tribe_core::notifications::{
    default_content_types, ContentType, EffectiveSettings, NotificationFrequency, SettingsSource,
};
use tribe_core::types::DbId;
use tribe_db::models::{GroupMembership, RecipientGroup};

use crate::authority::PreferenceAuthority;
use crate::store::JobStore;

/// Resolves the effective notification settings for one membership.
pub struct SettingsResolver {
    authority: Arc<dyn PreferenceAuthority>,
    store: Arc<dyn JobStore>,
}

impl SettingsResolver {
    pub fn new(authority: Arc<dyn PreferenceAuthority>, store: Arc<dyn JobStore>) -> Self {
        Self { authority, store }
    }

    /// Resolve settings for a recipient in a group. Infallible: every
    /// failure degrades one tier further, bottoming out at the system
    /// default.
    pub async fn effective_settings(
        &self,
        recipient_id: DbId,
        group_id: DbId,
    ) -> EffectiveSettings {
        match self.authority.effective_settings(recipient_id, group_id).await {
            Ok(Some(settings)) => return settings,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    recipient_id,
                    group_id,
                    error = %e,
                    "Server-side settings resolution unavailable, joining rows manually"
                );
            }
        }
        self.resolve_from_rows(recipient_id, group_id).await
    }

    /// Manual membership + group join.
    async fn resolve_from_rows(&self, recipient_id: DbId, group_id: DbId) -> EffectiveSettings {
        let membership = match self.store.membership(recipient_id, group_id).await {
            Ok(Some(m)) if m.is_active => m,
            Ok(_) => return EffectiveSettings::system_default(),
            Err(e) => {
                tracing::warn!(
                    recipient_id,
                    group_id,
                    error = %e,
                    "Membership lookup failed, using system default settings"
                );
                return EffectiveSettings::system_default();
            }
        };

        let group = match self.store.group(group_id).await {
            Ok(group) => group,
            Err(e) => {
                tracing::warn!(group_id, error = %e, "Group lookup failed");
                None
            }
        };

        combine(&membership, group.as_ref())
    }
}

/// Merge one membership row with its group's defaults.
fn combine(membership: &GroupMembership, group: Option<&RecipientGroup>) -> EffectiveSettings {
    let member_frequency = membership
        .notification_frequency
        .as_deref()
        .map(NotificationFrequency::from_str);
    let member_channels = membership
        .preferred_channels
        .as_ref()
        .and_then(parse_channels);
    let has_override = member_frequency.is_some() || member_channels.is_some();

    let group_frequency = group.map(|g| NotificationFrequency::from_str(&g.default_frequency));
    let group_channels = group.and_then(|g| parse_channels(&g.default_channels));

    let content_types: Vec<ContentType> = membership
        .content_types
        .as_ref()
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .filter(|types: &Vec<ContentType>| !types.is_empty())
        .unwrap_or_else(default_content_types);

    let source = if has_override {
        SettingsSource::MemberOverride
    } else if group.is_some() {
        SettingsSource::GroupDefault
    } else {
        SettingsSource::SystemDefault
    };

    EffectiveSettings {
        frequency: member_frequency
            .or(group_frequency)
            .unwrap_or(NotificationFrequency::EveryUpdate),
        channels: member_channels
            .or(group_channels)
            .unwrap_or_else(|| vec![DeliveryChannel::Email]),
        content_types,
        source,
    }
}

/// Parse a jsonb channel list, ignoring unparseable or empty lists.
fn parse_channels(value: &serde_json::Value) -> Option<Vec<DeliveryChannel>> {
    serde_json::from_value::<Vec<DeliveryChannel>>(value.clone())
        .ok()
        .filter(|channels| !channels.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{membership, recipient_group, MemoryStore, StubAuthority};

    fn resolver(authority: Arc<StubAuthority>, store: Arc<MemoryStore>) -> SettingsResolver {
        SettingsResolver::new(authority, store)
    }

    #[tokio::test]
    async fn server_side_answer_wins() {
        let authority = Arc::new(StubAuthority::new());
        let store = Arc::new(MemoryStore::new());
        let settings = EffectiveSettings {
            frequency: NotificationFrequency::DailyDigest,
            channels: vec![DeliveryChannel::Sms],
            content_types: default_content_types(),
            source: SettingsSource::MemberOverride,
        };
        authority.state().settings.insert(5, settings.clone());

        let resolved = resolver(authority, store).effective_settings(5, 10).await;
        assert_eq!(resolved, settings);
    }

    #[tokio::test]
    async fn member_override_beats_group_default() {
        let authority = Arc::new(StubAuthority::new());
        let store = Arc::new(MemoryStore::new());
        {
            let mut state = store.state();
            let mut m = membership(5, 10);
            m.notification_frequency = Some("daily_digest".to_string());
            state.memberships.push(m);
            state.groups.push(recipient_group(10, "weekly_digest", &["email", "sms"]));
        }

        let resolved = resolver(authority, store).effective_settings(5, 10).await;
        assert_eq!(resolved.frequency, NotificationFrequency::DailyDigest);
        assert_eq!(resolved.source, SettingsSource::MemberOverride);
        // Channels still fall through to the group default.
        assert_eq!(
            resolved.channels,
            vec![DeliveryChannel::Email, DeliveryChannel::Sms]
        );
    }

    #[tokio::test]
    async fn group_default_fills_a_bare_membership() {
        let authority = Arc::new(StubAuthority::new());
        let store = Arc::new(MemoryStore::new());
        {
            let mut state = store.state();
            state.memberships.push(membership(5, 10));
            state.groups.push(recipient_group(10, "weekly_digest", &["email"]));
        }

        let resolved = resolver(authority, store).effective_settings(5, 10).await;
        assert_eq!(resolved.frequency, NotificationFrequency::WeeklyDigest);
        assert_eq!(resolved.source, SettingsSource::GroupDefault);
        assert_eq!(resolved.content_types, default_content_types());
    }

    #[tokio::test]
    async fn missing_membership_means_system_default() {
        let authority = Arc::new(StubAuthority::new());
        let store = Arc::new(MemoryStore::new());

        let resolved = resolver(authority, store).effective_settings(5, 10).await;
        assert_eq!(resolved, EffectiveSettings::system_default());
        assert_eq!(resolved.source, SettingsSource::SystemDefault);
    }

    #[tokio::test]
    async fn authority_error_falls_back_to_rows() {
        let authority = Arc::new(StubAuthority::new());
        authority.state().fail_settings = true;
        let store = Arc::new(MemoryStore::new());
        {
            let mut state = store.state();
            state.memberships.push(membership(5, 10));
            state.groups.push(recipient_group(10, "daily_digest", &["sms"]));
        }

        let resolved = resolver(authority, store).effective_settings(5, 10).await;
        assert_eq!(resolved.frequency, NotificationFrequency::DailyDigest);
        assert_eq!(resolved.source, SettingsSource::GroupDefault);
    }

    #[tokio::test]
    async fn every_lookup_failing_still_resolves() {
        let authority = Arc::new(StubAuthority::new());
        authority.state().fail_settings = true;
        let store = Arc::new(MemoryStore::new());
        store.state().fail_lookups = true;

        let resolved = resolver(authority, store).effective_settings(5, 10).await;
        assert_eq!(resolved, EffectiveSettings::system_default());
    }

    #[tokio::test]
    async fn inactive_membership_is_ignored() {
        let authority = Arc::new(StubAuthority::new());
        let store = Arc::new(MemoryStore::new());
        {
            let mut state = store.state();
            let mut m = membership(5, 10);
            m.is_active = false;
            m.notification_frequency = Some("weekly_digest".to_string());
            state.memberships.push(m);
        }

        let resolved = resolver(authority, store).effective_settings(5, 10).await;
        assert_eq!(resolved, EffectiveSettings::system_default());
    }
}
