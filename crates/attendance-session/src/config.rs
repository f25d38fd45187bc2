//! Session engine configuration with validation.

use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest accepted token length in bytes.
pub const MIN_TOKEN_BYTES: usize = 8;
/// Largest accepted token length in bytes.
pub const MAX_TOKEN_BYTES: usize = 32;
/// Longest accepted rotation period.
pub const MAX_ROTATION_PERIOD_SECS: u64 = 3600;

/// Tunables of the rotating-token session engine.
///
/// Lifetime policy: with `max_rotations = Some(n)` a session issues `n`
/// tokens and ends on the tick after the last one expires. With `None` it
/// rotates until explicitly ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds between token rotations; also each token's validity window.
    pub rotation_period_secs: u64,
    /// Tokens issued per session before it ends (`None` = until ended).
    pub max_rotations: Option<u32>,
    /// Require redemption locations inside the classroom geofence.
    pub geofence_enabled: bool,
    /// Geofence radius in meters.
    pub geofence_radius_m: f64,
    /// Random bytes per token (hex encoded, so twice as many characters).
    pub token_bytes: usize,
    /// Per-course event buffer before slow dashboards start lagging.
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rotation_period_secs: 10,
            max_rotations: Some(2),
            geofence_enabled: true,
            geofence_radius_m: 100.0,
            token_bytes: 32,
            event_buffer: 64,
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> SessionResult<()> {
        if self.rotation_period_secs == 0 {
            return Err(invalid("rotation_period_secs cannot be 0"));
        }

        if self.rotation_period_secs > MAX_ROTATION_PERIOD_SECS {
            return Err(invalid(format!(
                "rotation_period_secs cannot exceed {MAX_ROTATION_PERIOD_SECS}"
            )));
        }

        if self.max_rotations == Some(0) {
            return Err(invalid("max_rotations cannot be 0"));
        }

        if !self.geofence_radius_m.is_finite() || self.geofence_radius_m <= 0.0 {
            return Err(invalid("geofence_radius_m must be a positive number"));
        }

        if !(MIN_TOKEN_BYTES..=MAX_TOKEN_BYTES).contains(&self.token_bytes) {
            return Err(invalid(format!(
                "token_bytes must be between {MIN_TOKEN_BYTES} and {MAX_TOKEN_BYTES}"
            )));
        }

        if self.event_buffer == 0 {
            return Err(invalid("event_buffer cannot be 0"));
        }

        Ok(())
    }

    pub fn rotation_period(&self) -> Duration {
        Duration::from_secs(self.rotation_period_secs)
    }
}

fn invalid(reason: impl Into<String>) -> SessionError {
    SessionError::InvalidConfig {
        reason: reason.into(),
    }
}
