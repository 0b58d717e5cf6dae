//! Degradation policy for preference-authority outages.
//!
//! Every resolution function that consults the external authority (mute
//! state, effective settings, the combined eligibility gate) takes one
//! injected [`DegradationPolicy`] value instead of hardcoding its own
//! failure bias. The engine default is [`DegradationPolicy::FailOpen`]:
//! an infrastructure blip must never silently drop a family update, at
//! the cost of an occasional unwanted one.

use serde::{Deserialize, Serialize};

/// What resolution functions assume when the authority is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DegradationPolicy {
    /// Assume deliverable: not muted, eligible, default settings.
    #[default]
    #[serde(rename = "fail_open")]
    FailOpen,
    /// Assume blocked: muted and ineligible.
    #[serde(rename = "fail_closed")]
    FailClosed,
}

impl DegradationPolicy {
    /// Mute state assumed when the mute check cannot be performed.
    pub fn assume_muted(self) -> bool {
        self == DegradationPolicy::FailClosed
    }

    /// Eligibility assumed when the delivery gate cannot be consulted.
    pub fn assume_deliverable(self) -> bool {
        self == DegradationPolicy::FailOpen
    }
}
