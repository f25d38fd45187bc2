//! # Runtime Configuration
//!
//! Session tunables plus process settings, overridable from the
//! environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `ATTEND_ROTATION_SECS` | `session.rotation_period_secs` | 10 |
//! | `ATTEND_MAX_ROTATIONS` | `session.max_rotations` (`0`/`unbounded` = none) | 2 |
//! | `ATTEND_GEOFENCE_ENABLED` | `session.geofence_enabled` | true |
//! | `ATTEND_GEOFENCE_RADIUS_M` | `session.geofence_radius_m` | 100 |
//! | `ATTEND_TOKEN_BYTES` | `session.token_bytes` | 32 |
//! | `ATTEND_EVENT_BUFFER` | `session.event_buffer` | 64 |
//! | `ATTEND_BIND` | `bind` | 0.0.0.0:5000 |
//! | `ATTEND_COURSES_FILE` | `courses_file` | unset |
//!
//! A malformed value is logged and the default kept.

use attendance_session::{SessionConfig, SessionError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ATTEND_";

/// Default listen address.
pub const DEFAULT_BIND: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 5000);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("cannot read courses file {path}: {source}")]
    CoursesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse courses file {path}: {source}")]
    CoursesParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Session engine tunables.
    pub session: SessionConfig,
    /// HTTP/WebSocket listen address.
    pub bind: SocketAddr,
    /// JSON array of courses seeding the directory.
    pub courses_file: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            bind: DEFAULT_BIND,
            courses_file: None,
        }
    }
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        override_parsed(&var, "ROTATION_SECS", &mut config.session.rotation_period_secs);
        override_parsed(&var, "GEOFENCE_ENABLED", &mut config.session.geofence_enabled);
        override_parsed(&var, "GEOFENCE_RADIUS_M", &mut config.session.geofence_radius_m);
        override_parsed(&var, "TOKEN_BYTES", &mut config.session.token_bytes);
        override_parsed(&var, "EVENT_BUFFER", &mut config.session.event_buffer);
        override_parsed(&var, "BIND", &mut config.bind);

        if let Some(raw) = var("MAX_ROTATIONS") {
            match parse_max_rotations(&raw) {
                Some(cap) => config.session.max_rotations = cap,
                None => warn!(variable = "ATTEND_MAX_ROTATIONS", value = %raw, "Ignoring malformed value"),
            }
        }

        if let Some(path) = var("COURSES_FILE").filter(|p| !p.trim().is_empty()) {
            config.courses_file = Some(PathBuf::from(path));
        }

        config.session.validate()?;

        info!(
            bind = %config.bind,
            rotation_period_secs = config.session.rotation_period_secs,
            max_rotations = ?config.session.max_rotations,
            geofence_enabled = config.session.geofence_enabled,
            geofence_radius_m = config.session.geofence_radius_m,
            "Configuration loaded"
        );

        Ok(config)
    }
}

fn override_parsed<T, F>(var: &F, name: &str, slot: &mut T)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(name) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => {
            let variable = format!("{ENV_PREFIX}{name}");
            warn!(variable = %variable, value = %raw, "Ignoring malformed value");
        }
    }
}

/// `0` and `unbounded` select the run-until-ended policy.
fn parse_max_rotations(raw: &str) -> Option<Option<u32>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("unbounded") {
        return Some(None);
    }
    match raw.parse::<u32>().ok()? {
        0 => Some(None),
        n => Some(Some(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<RuntimeConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuntimeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.bind.port(), 5000);
        assert_eq!(config.session.max_rotations, Some(2));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ATTEND_ROTATION_SECS", "15"),
            ("ATTEND_MAX_ROTATIONS", "5"),
            ("ATTEND_GEOFENCE_ENABLED", "false"),
            ("ATTEND_GEOFENCE_RADIUS_M", "250.5"),
            ("ATTEND_TOKEN_BYTES", "16"),
            ("ATTEND_BIND", "127.0.0.1:8080"),
            ("ATTEND_COURSES_FILE", "/etc/courses.json"),
        ])
        .unwrap();

        assert_eq!(config.session.rotation_period_secs, 15);
        assert_eq!(config.session.max_rotations, Some(5));
        assert!(!config.session.geofence_enabled);
        assert_eq!(config.session.geofence_radius_m, 250.5);
        assert_eq!(config.session.token_bytes, 16);
        assert_eq!(config.bind, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.courses_file, Some(PathBuf::from("/etc/courses.json")));
    }

    #[test]
    fn test_unbounded_rotations() {
        for raw in ["0", "unbounded", " Unbounded "] {
            let config = load(&[("ATTEND_MAX_ROTATIONS", raw)]).unwrap();
            assert_eq!(config.session.max_rotations, None, "value {raw:?}");
        }
    }

    #[test]
    fn test_malformed_values_keep_defaults() {
        let config = load(&[
            ("ATTEND_ROTATION_SECS", "ten"),
            ("ATTEND_MAX_ROTATIONS", "-1"),
            ("ATTEND_BIND", "localhost"),
        ])
        .unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = load(&[("ATTEND_TOKEN_BYTES", "4")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Session(SessionError::InvalidConfig { .. })
        ));
    }
}
