// ABOUTME: Environment-driven engine configuration
// ABOUTME: Fee policy, timing windows, store timeout and retry budget
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

use std::env;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lifecycle::TransitionPolicy;
use crate::money::Currency;
use crate::settlement::FeePolicy;

/// Engine configuration.
///
/// Every knob has a production-sane default so `EngineConfig::default()`
/// works in tests and `from_env()` only overrides what is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How the platform fee is computed at settlement
    pub fee_policy: FeePolicy,
    /// Currency trainer rates and prices are denominated in
    pub currency: Currency,
    /// Cancelling a confirmed booking inside this many hours before the
    /// session start is flagged late
    pub late_cancellation_cutoff_hours: i64,
    /// Disputes are accepted this many hours after completion
    pub dispute_window_hours: i64,
    /// Upper bound on any single store call
    pub store_timeout_secs: u64,
    /// Bounded retries on optimistic-concurrency conflicts before the
    /// conflict surfaces to the caller
    pub max_version_retries: u32,
    /// Broadcast buffer per event subscriber
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_policy: FeePolicy::default(),
            currency: Currency::Usd,
            late_cancellation_cutoff_hours: 24,
            dispute_window_hours: 72,
            store_timeout_secs: 5,
            max_version_retries: 3,
            event_channel_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults and warning on unparseable values.
    ///
    /// Recognized variables:
    /// - `TRAINLINK_FEE_POLICY` — JSON `FeePolicy`, e.g.
    ///   `{"type":"percentage","rate_bps":1500}`
    /// - `TRAINLINK_FEE_RATE_BPS` — shorthand for a plain percentage policy
    /// - `TRAINLINK_LATE_CANCEL_CUTOFF_HOURS`
    /// - `TRAINLINK_DISPUTE_WINDOW_HOURS`
    /// - `TRAINLINK_STORE_TIMEOUT_SECS`
    /// - `TRAINLINK_MAX_VERSION_RETRIES`
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let fee_policy = env::var("TRAINLINK_FEE_POLICY").ok().map_or_else(
            || {
                parse_var("TRAINLINK_FEE_RATE_BPS", None).map_or_else(
                    || defaults.fee_policy.clone(),
                    |rate_bps| FeePolicy::Percentage { rate_bps },
                )
            },
            |raw| match serde_json::from_str(&raw) {
                Ok(policy) => policy,
                Err(err) => {
                    warn!(error = %err, "invalid TRAINLINK_FEE_POLICY, using default");
                    defaults.fee_policy.clone()
                }
            },
        );

        Self {
            fee_policy,
            currency: defaults.currency,
            late_cancellation_cutoff_hours: parse_var(
                "TRAINLINK_LATE_CANCEL_CUTOFF_HOURS",
                Some(defaults.late_cancellation_cutoff_hours),
            )
            .unwrap_or(defaults.late_cancellation_cutoff_hours),
            dispute_window_hours: parse_var(
                "TRAINLINK_DISPUTE_WINDOW_HOURS",
                Some(defaults.dispute_window_hours),
            )
            .unwrap_or(defaults.dispute_window_hours),
            store_timeout_secs: parse_var(
                "TRAINLINK_STORE_TIMEOUT_SECS",
                Some(defaults.store_timeout_secs),
            )
            .unwrap_or(defaults.store_timeout_secs),
            max_version_retries: parse_var(
                "TRAINLINK_MAX_VERSION_RETRIES",
                Some(defaults.max_version_retries),
            )
            .unwrap_or(defaults.max_version_retries),
            event_channel_capacity: defaults.event_channel_capacity,
        }
    }

    /// Timing rules and fee policy in the form the state machine consumes
    #[must_use]
    pub fn transition_policy(&self) -> TransitionPolicy {
        TransitionPolicy {
            late_cancellation_cutoff: Duration::hours(self.late_cancellation_cutoff_hours),
            dispute_window: Duration::hours(self.dispute_window_hours),
            fee_policy: self.fee_policy.clone(),
        }
    }

    /// Store call timeout as a std duration
    #[must_use]
    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.store_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: Option<T>) -> Option<T> {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(var = name, value = %raw, "unparseable value, using default");
                default
            }
        },
        Err(_) => None,
    }
}
