//! Configuration schema definitions.
//!
//! `Options` is the single settings object for the request logger. It derives
//! Serde traits so it can be read from a TOML file; every field has a default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::observability::{BackendSettings, Level};

/// RFC3339 with nanoseconds, as a chrono strftime string.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f%:z";

/// Default minimum level.
pub const DEFAULT_LEVEL: &str = "info";

/// Request logger settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Subsystem name prefixed to every line.
    pub name: String,

    /// Minimum level: trace, debug, info, warn, error, off.
    pub level: String,

    /// Emit JSON instead of human readable lines.
    pub json_format: bool,

    /// chrono strftime format for timestamps.
    pub time_format: String,

    /// Drop headers, scheme and response bodies from request logs.
    pub concise: bool,

    /// Static fields attached under `tags` to every line of the root logger,
    /// e.g. a commit hash or an environment name.
    pub tags: BTreeMap<String, String>,

    /// Headers redacted in addition to authorization, cookie and set-cookie.
    pub skip_headers: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: DEFAULT_LEVEL.to_string(),
            json_format: false,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            concise: false,
            tags: BTreeMap::new(),
            skip_headers: Vec::new(),
        }
    }
}

impl Options {
    /// Fill empty level and time format, lower-case the skipped headers.
    pub fn normalize(mut self) -> Self {
        if self.level.is_empty() {
            self.level = DEFAULT_LEVEL.to_string();
        }
        if self.time_format.is_empty() {
            self.time_format = DEFAULT_TIME_FORMAT.to_string();
        }
        for header in &mut self.skip_headers {
            *header = header.to_lowercase();
        }
        self
    }

    /// The subset of options the backend cares about.
    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            name: self.name.clone(),
            level: Level::parse_lenient(&self.level),
            time_format: self.time_format.clone(),
            json_format: self.json_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.name, "");
        assert_eq!(options.level, "info");
        assert!(!options.json_format);
        assert!(!options.concise);
        assert_eq!(options.time_format, DEFAULT_TIME_FORMAT);
        assert!(options.tags.is_empty());
        assert!(options.skip_headers.is_empty());
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let options = Options {
            level: String::new(),
            time_format: String::new(),
            skip_headers: vec!["X-Api-Key".into(), "x-secret".into()],
            ..Default::default()
        }
        .normalize();

        assert_eq!(options.level, "info");
        assert_eq!(options.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(options.skip_headers, ["x-api-key", "x-secret"]);
    }

    #[test]
    fn test_backend_settings() {
        let options = Options {
            name: "api".into(),
            level: "WARN".into(),
            json_format: true,
            ..Default::default()
        };
        let settings = options.backend_settings();
        assert_eq!(settings.name, "api");
        assert_eq!(settings.level, Level::Warn);
        assert!(settings.json_format);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let options: Options = toml::from_str(
            r#"
            concise = true
            skip_headers = ["X-Token"]

            [tags]
            env = "staging"
            "#,
        )
        .unwrap();

        assert!(options.concise);
        assert_eq!(options.level, "info");
        assert_eq!(options.tags["env"], "staging");
        assert_eq!(options.skip_headers, ["X-Token"]);
    }
}
