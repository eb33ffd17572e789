//! Configuration management for registrar.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::photo::PhotoSettings;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory name.
const APP_DIR_NAME: &str = "registrar";

/// Prefix of environment variables that override the config file.
const ENV_PREFIX: &str = "REGISTRAR_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `REGISTRAR_`, sections separated
///    by `__`, e.g. `REGISTRAR_API__TOKEN`)
/// 2. TOML config file at `~/.config/registrar/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote store connection.
    pub api: ApiConfig,
    /// List view behaviour.
    pub list: ListConfig,
    /// Photo output.
    pub photo: PhotoSettings,
    /// Notification behaviour.
    pub notifications: NotificationConfig,
}

/// Remote store connection settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base resource URL; records live at `{base_url}` and `{base_url}/{id}`.
    pub base_url: Option<String>,
    /// Static access token.
    pub token: Option<String>,
    /// Header that carries the token.
    pub token_header: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// List view settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Records per page.
    pub page_size: u32,
    /// Quiet period before a typed search term triggers a fetch.
    pub search_debounce_ms: u64,
    /// Ask for one extra row to know for sure whether a next page exists.
    pub probe_next_page: bool,
}

/// Notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long a notification stays visible.
    pub auto_dismiss_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            token_header: "xc-token".to_string(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_header", &self.token_header)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            search_debounce_ms: 500,
            probe_next_page: true,
        }
    }
}

impl ListConfig {
    /// Get the search debounce delay as a Duration.
    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_ms: 5_000,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api.base_url {
            match reqwest::Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                Ok(parsed) => {
                    return Err(Error::ConfigValidation {
                        message: format!(
                            "api.base_url must use http or https, got {}",
                            parsed.scheme()
                        ),
                    });
                }
                Err(e) => {
                    return Err(Error::ConfigValidation {
                        message: format!("api.base_url is not a valid URL: {e}"),
                    });
                }
            }
        }

        if self.api.token_header.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "api.token_header must not be empty".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "api.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.list.page_size == 0 {
            return Err(Error::ConfigValidation {
                message: "list.page_size must be greater than 0".to_string(),
            });
        }

        if self.photo.output_size == 0 {
            return Err(Error::ConfigValidation {
                message: "photo.output_size must be greater than 0".to_string(),
            });
        }

        if self.photo.min_crop_box == 0 {
            return Err(Error::ConfigValidation {
                message: "photo.min_crop_box must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// The base URL, or an error explaining how to set it.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL is configured.
    pub fn require_base_url(&self) -> Result<&str> {
        self.api.base_url.as_deref().ok_or_else(|| Error::ConfigValidation {
            message: format!(
                "api.base_url is not set; add it to {} or set {ENV_PREFIX}API__BASE_URL",
                Self::default_config_path().display()
            ),
        })
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Get the notification lifetime as a Duration.
    #[must_use]
    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_millis(self.notifications.auto_dismiss_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.api.base_url.is_none());
        assert!(config.api.token.is_none());
        assert_eq!(config.api.token_header, "xc-token");
        assert_eq!(config.list.page_size, 20);
        assert_eq!(config.photo.output_size, 300);
        assert_eq!(config.photo.min_crop_box, 100);
    }

    #[test]
    fn test_validate_valid_config() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.api.base_url = Some("https://api.example.com:8444/v1/people".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_url() {
        let mut config = Config::default();
        config.api.base_url = Some("not a url".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("api.base_url"));

        config.api.base_url = Some("ftp://example.com/people".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("http or https"));
    }

    #[test]
    fn test_validate_zero_page_size() {
        let mut config = Config::default();
        config.list.page_size = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("page_size"));
    }

    #[test]
    fn test_validate_zero_output_size() {
        let mut config = Config::default();
        config.photo.output_size = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("output_size"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_empty_token_header() {
        let mut config = Config::default();
        config.api.token_header = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_base_url() {
        let mut config = Config::default();
        let err = config.require_base_url().unwrap_err().to_string();
        assert!(err.contains("API__BASE_URL"));

        config.api.base_url = Some("https://example.com/t".to_string());
        assert_eq!(config.require_base_url().unwrap(), "https://example.com/t");
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.list.search_debounce(), Duration::from_millis(500));
        assert_eq!(config.auto_dismiss(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.api.token = Some("J38b4-secret".to_string());
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("J38b4-secret"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("registrar"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://api.example.com/v1/people"
token = "abc"

[list]
page_size = 50
search_debounce_ms = 250
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(
            config.api.base_url.as_deref(),
            Some("https://api.example.com/v1/people")
        );
        assert_eq!(config.api.token.as_deref(), Some("abc"));
        assert_eq!(config.api.token_header, "xc-token");
        assert_eq!(config.list.page_size, 50);
        assert_eq!(config.list.search_debounce(), Duration::from_millis(250));
        assert!(config.list.probe_next_page);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[list]\npage_size = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_list_config_deserialize() {
        let json = r#"{"page_size": 10}"#;
        let list: ListConfig = serde_json::from_str(json).unwrap();
        assert_eq!(list.page_size, 10);
        assert_eq!(list.search_debounce_ms, 500);
    }
}
