//! Configuration loading for anonchat-relay.
//!
//! Configuration is loaded from a TOML file (default: `anonchat.toml`),
//! then overridden by the environment variables used by hosted
//! deployments:
//!
//! | Variable             | Overrides                |
//! |----------------------|--------------------------|
//! | `BOT_TOKEN`          | `telegram.token`         |
//! | `SPECTATOR_GROUP_ID` | `surveillance.sink_id`   |
//! | `PORT`               | port of `http.bind_address` |

use chat_types::SinkId;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration for anonchat-relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Telegram Bot API configuration.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Surveillance sink configuration.
    #[serde(default)]
    pub surveillance: SurveillanceConfig,
    /// HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// Event dispatch configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Telegram Bot API configuration.
#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    #[serde(default)]
    pub token: String,
    /// Bot API base URL (default: https://api.telegram.org).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Long-poll timeout for `getUpdates` in seconds (default: 30).
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Delay before retrying after a failed poll, in seconds (default: 5).
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

// Keeps the token out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .finish()
    }
}

/// Surveillance sink configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveillanceConfig {
    /// Chat id of the moderation group (required).
    pub sink_id: Option<i64>,
    /// Forward every relayed message to the sink (default: true).
    #[serde(default = "default_mirror_messages")]
    pub mirror_messages: bool,
}

/// HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Bind address for the HTTP server (default: 0.0.0.0:5000).
    #[serde(default = "default_http_bind")]
    pub bind_address: String,
    /// Serve health and metrics endpoints (default: true).
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
}

/// Event dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Seconds a per-user lane may sit idle before it is retired (default: 300).
    #[serde(default = "default_lane_idle_secs")]
    pub lane_idle_secs: u64,
}

// Default value functions
fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_mirror_messages() -> bool {
    true
}

fn default_http_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_http_enabled() -> bool {
    true
}

fn default_lane_idle_secs() -> u64 {
    300 // 5 minutes
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base_url: default_api_base_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Default for SurveillanceConfig {
    fn default() -> Self {
        Self {
            sink_id: None,
            mirror_messages: default_mirror_messages(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_http_bind(),
            enabled: default_http_enabled(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            lane_idle_secs: default_lane_idle_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the startup configuration.
    ///
    /// Reads `path` if it exists (defaults otherwise), applies environment
    /// overrides and validates the result.
    pub fn load(path: &Path) -> crate::Result<Self> {
        Self::load_with(path, |var| std::env::var(var).ok())
    }

    /// [`load`](Self::load) with overrides looked up through `lookup`.
    pub fn load_with<F>(path: &Path, lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.telegram.token = token.trim().to_string();
        }

        if let Some(raw) = lookup("SPECTATOR_GROUP_ID") {
            let sink_id = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: "SPECTATOR_GROUP_ID",
                    value: raw.clone(),
                })?;
            self.surveillance.sink_id = Some(sink_id);
        }

        if let Some(raw) = lookup("PORT") {
            let port = raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                var: "PORT",
                value: raw.clone(),
            })?;
            let host = self
                .http
                .bind_address
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.http.bind_address = format!("{host}:{port}");
        }

        Ok(())
    }

    /// Check that everything required to run is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.token.is_empty() {
            return Err(ConfigError::Missing {
                field: "telegram.token (or BOT_TOKEN)",
            });
        }
        self.sink()?;
        if self.telegram.poll_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "telegram.poll_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.dispatch.lane_idle_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "dispatch.lane_idle_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// The surveillance sink.
    pub fn sink(&self) -> Result<SinkId, ConfigError> {
        self.surveillance
            .sink_id
            .map(SinkId::new)
            .ok_or(ConfigError::Missing {
                field: "surveillance.sink_id (or SPECTATOR_GROUP_ID)",
            })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A required setting is absent.
    #[error("missing required setting: {field}")]
    Missing {
        /// Name of the setting.
        field: &'static str,
    },
    /// A setting has an unusable value.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Name of the setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.http.bind_address, "0.0.0.0:5000");
        assert!(config.surveillance.mirror_messages);
        assert_eq!(config.dispatch.lane_idle_secs, 300);
    }

    #[test]
    fn default_config_fails_validation() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[telegram]
token = "123:abc"
poll_timeout_secs = 50

[surveillance]
sink_id = -1001234
mirror_messages = false

[http]
bind_address = "127.0.0.1:8080"

[dispatch]
lane_idle_secs = 60
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.telegram.token, "123:abc");
        assert_eq!(config.telegram.poll_timeout_secs, 50);
        assert_eq!(config.sink().unwrap(), SinkId::new(-1001234));
        assert!(!config.surveillance.mirror_messages);
        assert_eq!(config.http.bind_address, "127.0.0.1:8080");
        assert_eq!(config.dispatch.lane_idle_secs, 60);
        config.validate().unwrap();
    }

    #[test]
    fn config_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[telegram]\ntoken = \"t\"\n").unwrap();
        assert_eq!(config.telegram.retry_delay_secs, 5);
        assert!(config.http.enabled);
        assert!(config.surveillance.sink_id.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("BOT_TOKEN", " 999:zzz "),
                ("SPECTATOR_GROUP_ID", "-100555"),
                ("PORT", "10000"),
            ]))
            .unwrap();

        assert_eq!(config.telegram.token, "999:zzz");
        assert_eq!(config.surveillance.sink_id, Some(-100555));
        assert_eq!(config.http.bind_address, "0.0.0.0:10000");
        config.validate().unwrap();
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("SPECTATOR_GROUP_ID", "spectators")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: "SPECTATOR_GROUP_ID",
                ..
            }
        ));

        let err = config.apply_overrides(env(&[("PORT", "99999")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "PORT", .. }));
    }

    #[test]
    fn blank_token_override_is_ignored() {
        let mut config = Config::default();
        config.telegram.token = "from-file".to_string();
        config.apply_overrides(env(&[("BOT_TOKEN", "  ")])).unwrap();
        assert_eq!(config.telegram.token, "from-file");
    }

    #[test]
    fn zero_lane_idle_is_invalid() {
        let mut config = Config::default();
        config.telegram.token = "t".to_string();
        config.surveillance.sink_id = Some(-1);
        config.dispatch.lane_idle_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "dispatch.lane_idle_secs",
                ..
            })
        ));
    }

    #[test]
    fn from_file_reads_and_reports_parse_errors() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "[surveillance]\nsink_id = -42").unwrap();
        let config = Config::from_file(good.path()).unwrap();
        assert_eq!(config.surveillance.sink_id, Some(-42));

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[surveillance\nsink_id = ").unwrap();
        assert!(matches!(
            Config::from_file(bad.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn load_with_merges_file_and_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[telegram]\ntoken = \"from-file\"\n[http]\nbind_address = \"127.0.0.1:5000\""
        )
        .unwrap();

        let config = Config::load_with(
            file.path(),
            env(&[("SPECTATOR_GROUP_ID", "-77"), ("PORT", "8443")]),
        )
        .unwrap();
        assert_eq!(config.telegram.token, "from-file");
        assert_eq!(config.sink().unwrap(), SinkId::new(-77));
        assert_eq!(config.http.bind_address, "127.0.0.1:8443");
    }

    #[test]
    fn load_with_reports_missing_settings_as_relay_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_with(&dir.path().join("absent.toml"), env(&[])).unwrap_err();
        assert!(matches!(
            err,
            crate::error::RelayError::Config(ConfigError::Missing { .. })
        ));

        let err = Config::load_with(
            &dir.path().join("absent.toml"),
            env(&[("BOT_TOKEN", "t"), ("PORT", "http")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::RelayError::Config(ConfigError::InvalidEnv { var: "PORT", .. })
        ));
    }

    #[test]
    fn example_config_parses() {
        let config: Config = toml::from_str(include_str!("../anonchat.example.toml")).unwrap();
        assert_eq!(config.sink().unwrap(), SinkId::new(-1001234567890));
        assert_eq!(config.http.bind_address, "0.0.0.0:5000");
    }

    #[test]
    fn debug_hides_token() {
        let mut config = Config::default();
        config.telegram.token = "123:very-secret".to_string();
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
