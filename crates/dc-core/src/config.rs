//! Configuration types and loading
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. a config file (`--config`, `DOCCONSTRUCT_CONFIG`, or `./docconstruct.{toml,yaml,json}`)
//! 3. `DOCCONSTRUCT__SECTION__KEY` environment variables
//!
//! The frontend-era variables `NEXT_PUBLIC_API_BASE_URL` and
//! `NEXT_PUBLIC_API_URL` still set the base URL unless
//! `DOCCONSTRUCT__API__BASE_URL` is present.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const ENV_PREFIX: &str = "DOCCONSTRUCT";
pub const CONFIG_PATH_VAR: &str = "DOCCONSTRUCT_CONFIG";

const BASE_URL_VAR: &str = "DOCCONSTRUCT__API__BASE_URL";
const LEGACY_BASE_URL_VARS: [&str; 2] = ["NEXT_PUBLIC_API_BASE_URL", "NEXT_PUBLIC_API_URL"];

/// Main client configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub documents: DocumentsConfig,
    pub survey: SurveyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            user_agent: concat!("docconstruct-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie jar location; `None` resolves to `~/.docconstruct/session.json`
    pub path: Option<PathBuf>,
    pub cookie_lifetime_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: None,
            cookie_lifetime_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn,dc_client=info,dc_services=info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Document type whose every upload is listed, not just the newest
    pub general_document_type: String,
    /// Status sent with project document uploads
    pub default_upload_status: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            general_document_type: "כללי".to_string(),
            default_upload_status: "Uploaded".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub page_size: usize,
    pub default_threshold: f64,
    pub timeline_report_url: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            page_size: 4,
            default_threshold: 1.0,
            timeline_report_url:
                "https://lookerstudio.google.com/embed/reporting/6c1d6a51-fefc-41d0-9e80-d4d36dee5391/page/qw8ME"
                    .to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl ClientConfig {
    /// Load configuration from an explicit file (if given), the default
    /// file locations, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));

        let mut builder = Config::builder().add_source(Config::try_from(&ClientConfig::default())?);
        builder = match explicit {
            Some(file) => builder.add_source(File::from(file).required(true)),
            None => builder.add_source(File::with_name("docconstruct").required(false)),
        };
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: ClientConfig = builder.build()?.try_deserialize()?;
        config.apply_legacy_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        tracing::debug!(base_url = %config.api.base_url, "Loaded client configuration");
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Honor the frontend-era base URL variables.
    pub fn apply_legacy_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup(BASE_URL_VAR).is_some() {
            return;
        }
        if let Some(url) = LEGACY_BASE_URL_VARS
            .iter()
            .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        {
            self.api.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url".into(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "api.base_url".into(),
                message: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        if self.survey.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "survey.page_size".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.session.cookie_lifetime_days <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "session.cookie_lifetime_days".into(),
                message: "must be positive".into(),
            });
        }
        if self.survey.default_threshold.is_nan() || self.survey.default_threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "survey.default_threshold".into(),
                message: "must be a non-negative number".into(),
            });
        }
        Ok(())
    }

    /// Absolute URL for an API path such as `/project/statuses`.
    pub fn api_url(&self, path: &str) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            self.api.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url".into(),
            message: e.to_string(),
        })
    }

    /// Where the cookie jar lives on disk
    pub fn session_path(&self) -> PathBuf {
        if let Some(path) = &self.session.path {
            return path.clone();
        }
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        home.join(".docconstruct").join("session.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.session.cookie_lifetime_days, 7);
        assert_eq!(config.survey.page_size, 4);
        assert_eq!(config.survey.default_threshold, 1.0);
        assert_eq!(config.documents.general_document_type, "כללי");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_url_join() {
        let mut config = ClientConfig::default();
        config.api.base_url = "http://example.test/api/".into();
        let url = config.api_url("/project/statuses").unwrap();
        assert_eq!(url.as_str(), "http://example.test/api/project/statuses");
    }

    #[test]
    fn test_legacy_overrides() {
        let vars: HashMap<&str, &str> =
            [("NEXT_PUBLIC_API_URL", "http://127.0.0.1:5001/api")].into();
        let mut config = ClientConfig::default();
        config.apply_legacy_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api.base_url, "http://127.0.0.1:5001/api");

        let vars: HashMap<&str, &str> = [
            ("NEXT_PUBLIC_API_URL", "http://127.0.0.1:5001/api"),
            ("NEXT_PUBLIC_API_BASE_URL", "http://localhost:5000/api"),
        ]
        .into();
        let mut config = ClientConfig::default();
        config.apply_legacy_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api.base_url, "http://localhost:5000/api");

        let vars: HashMap<&str, &str> = [
            ("DOCCONSTRUCT__API__BASE_URL", "http://primary/api"),
            ("NEXT_PUBLIC_API_URL", "http://127.0.0.1:5001/api"),
        ]
        .into();
        let mut config = ClientConfig::default();
        config.apply_legacy_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://permits.example.com/api\"\n\n[survey]\npage_size = 10"
        )
        .unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.survey.page_size, 10);
        assert_eq!(config.session.cookie_lifetime_days, 7);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://files".into();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.survey.page_size = 0;
        assert!(config.validate().is_err());
    }
}
